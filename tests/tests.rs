// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

mod cast;
mod engine;
mod operators;
