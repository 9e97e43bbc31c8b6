// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

// Use README.md as crate documentation.
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

mod aggregates;
mod builtins;
mod cast;
mod datetime;
mod encoding;
mod engine;
mod equality;
mod error;
mod evaluator;
mod expr;
mod grouping;
mod lexer;
mod number;
mod options;
mod parser;
mod registry;
mod types;
mod value;

pub mod operators;

#[cfg(feature = "arc")]
pub(crate) use std::sync::Arc as Rc;

#[cfg(not(feature = "arc"))]
pub(crate) use std::rc::Rc;

pub use aggregates::{aggregate, Accumulator, AggregateFunction};
pub use cast::{can_cast, can_lossless_cast, cast, is_type};
pub use datetime::{Time, Timestamp, TimestampPrecision};
pub use engine::Engine;
pub use equality::{compare, Equivalence};
pub use error::{
    CastFailureKind, Error, ErrorCategory, ErrorCode, PermissiveBehavior, Property,
    PropertyValue, PropertyValueMap, Result,
};
pub use evaluator::{Bindings, Evaluator};
pub use expr::{CastOp, CollectionKind, Expr, NodeRef, Ref, UnaryOp};
pub use grouping::{distinct, Group, GroupBy, GroupKey};
pub use lexer::SourceLocation;
pub use number::Integer;
pub use options::{CaseSensitivity, CastMode, EvaluationOptions, TypingMode};
pub use registry::TypeRegistry;
pub use types::{AnyOf, CustomType, DecimalParams, IntWidth, StringBound, TypeDescriptor};
pub use value::{Kind, StructOrdering, StructValue, Value};

/// Items in `unstable` are likely to change.
pub mod unstable {
    pub use crate::lexer::*;
    pub use crate::parser::*;
}
