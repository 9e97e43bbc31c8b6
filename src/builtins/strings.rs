// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::builtins::utils::ensure_text;
use crate::builtins::{register as add, Builtin, UnknownPolicy};
use crate::error::Result;
use crate::value::Value;

use std::collections::HashMap;

pub fn register(m: &mut HashMap<&'static str, Builtin>) {
    add(m, "upper", (1, 1), UnknownPolicy::Propagate, upper);
    add(m, "lower", (1, 1), UnknownPolicy::Propagate, lower);
    add(m, "char_length", (1, 1), UnknownPolicy::Propagate, char_length);
    add(m, "character_length", (1, 1), UnknownPolicy::Propagate, char_length);
    add(m, "trim", (1, 1), UnknownPolicy::Propagate, trim);
}

fn upper(name: &'static str, args: &[Value]) -> Result<Value> {
    Ok(Value::String(ensure_text(name, args, 0)?.to_uppercase().into()))
}

fn lower(name: &'static str, args: &[Value]) -> Result<Value> {
    Ok(Value::String(ensure_text(name, args, 0)?.to_lowercase().into()))
}

fn char_length(name: &'static str, args: &[Value]) -> Result<Value> {
    let count = ensure_text(name, args, 0)?.chars().count();
    Ok(Value::from(u64::try_from(count).unwrap_or(u64::MAX)))
}

/// Strips leading and trailing spaces.
fn trim(name: &'static str, args: &[Value]) -> Result<Value> {
    Ok(Value::string(ensure_text(name, args, 0)?.trim_matches(' ')))
}
