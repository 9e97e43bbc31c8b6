// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::builtins::utils::incorrect_argument;
use crate::builtins::{register as add, Builtin, UnknownPolicy};
use crate::error::Result;
use crate::value::Value;

use std::collections::HashMap;

pub fn register(m: &mut HashMap<&'static str, Builtin>) {
    add(m, "coalesce", (1, usize::MAX), UnknownPolicy::PassThrough, coalesce);
    add(m, "nullif", (2, 2), UnknownPolicy::PassThrough, nullif);
    add(m, "exists", (1, 1), UnknownPolicy::PassThrough, exists);
}

/// First known argument. `MISSING` when every argument is `MISSING`, else `NULL`.
fn coalesce(_name: &'static str, args: &[Value]) -> Result<Value> {
    if let Some(v) = args.iter().find(|v| !v.is_unknown()) {
        return Ok(v.clone());
    }
    Ok(if args.iter().all(Value::is_missing) {
        Value::Missing
    } else {
        Value::NULL
    })
}

fn nullif(_name: &'static str, args: &[Value]) -> Result<Value> {
    Ok(if args[0].value_eq(&args[1]) {
        Value::NULL
    } else {
        args[0].clone()
    })
}

/// Whether a collection or struct has at least one element.
fn exists(name: &'static str, args: &[Value]) -> Result<Value> {
    let v = &args[0];
    Ok(Value::Bool(match v {
        Value::Missing | Value::Null(_) => false,
        Value::Struct(s) => !s.is_empty(),
        _ => match v.elements() {
            Some(items) => !items.is_empty(),
            None => return Err(incorrect_argument(name, 0, "LIST, SEXP, BAG or STRUCT", v)),
        },
    }))
}
