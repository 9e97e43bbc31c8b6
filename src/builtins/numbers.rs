// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::builtins::utils::ensure_numeric;
use crate::builtins::{register as add, Builtin, UnknownPolicy};
use crate::error::{Error, ErrorCode, Result};
use crate::value::Value;

use std::collections::HashMap;

pub fn register(m: &mut HashMap<&'static str, Builtin>) {
    add(m, "abs", (1, 1), UnknownPolicy::Propagate, abs);
}

fn abs(name: &'static str, args: &[Value]) -> Result<Value> {
    Ok(match ensure_numeric(name, args, 0)? {
        Value::Int(i) => Value::Int(i.checked_abs().ok_or_else(|| {
            Error::new(
                ErrorCode::EvaluatorIntegerOverflow,
                format!("abs({i}) overflows a 64-bit integer"),
            )
        })?),
        Value::Float(f) => Value::Float(f.abs()),
        Value::Decimal(d) => Value::decimal(d.abs()),
        v => return Err(Error::internal(format!("`{name}` got a non-numeric {}", v.kind()))),
    })
}
