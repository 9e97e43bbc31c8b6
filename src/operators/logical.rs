// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use super::{incompatible_operands, propagate_unknown};
use crate::error::Result;
use crate::value::Value;

fn check_operand(op: &str, v: &Value) -> Result<Option<bool>> {
    match v {
        Value::Bool(b) => Ok(Some(*b)),
        Value::Missing | Value::Null(_) => Ok(None),
        _ => Err(incompatible_operands(op, &[v])),
    }
}

/// Shared shape of `AND` and `OR`: `absorbing` decides the result on its own.
fn connective(
    op: &str,
    absorbing: bool,
    lhs: Value,
    rhs: impl FnOnce() -> Result<Value>,
) -> Result<Value> {
    if check_operand(op, &lhs)? == Some(absorbing) {
        return Ok(Value::Bool(absorbing));
    }
    let rhs = rhs()?;
    if check_operand(op, &rhs)? == Some(absorbing) {
        return Ok(Value::Bool(absorbing));
    }
    Ok(propagate_unknown([&lhs, &rhs]).unwrap_or(Value::Bool(!absorbing)))
}

/// `lhs AND rhs`. A `FALSE` left operand never evaluates `rhs`.
pub fn and(lhs: Value, rhs: impl FnOnce() -> Result<Value>) -> Result<Value> {
    connective("AND", false, lhs, rhs)
}

/// `lhs OR rhs`. A `TRUE` left operand never evaluates `rhs`.
pub fn or(lhs: Value, rhs: impl FnOnce() -> Result<Value>) -> Result<Value> {
    connective("OR", true, lhs, rhs)
}

pub fn not(v: &Value) -> Result<Value> {
    Ok(match check_operand("NOT", v)? {
        Some(b) => Value::Bool(!b),
        None => propagate_unknown([v]).unwrap_or(Value::NULL),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ErrorCode};

    fn never() -> Result<Value> {
        Err(Error::internal("right operand evaluated"))
    }

    #[test]
    fn absorbing_operands_short_circuit() {
        assert_eq!(and(Value::from(false), never).unwrap(), Value::from(false));
        assert_eq!(or(Value::from(true), never).unwrap(), Value::from(true));
        assert_eq!(and(Value::Missing, || Ok(Value::from(false))).unwrap(), Value::from(false));
        assert_eq!(or(Value::NULL, || Ok(Value::from(true))).unwrap(), Value::from(true));
    }

    #[test]
    fn unknowns_follow_the_strict_rule() {
        assert!(and(Value::from(true), || Ok(Value::NULL)).unwrap().is_null());
        assert!(and(Value::NULL, || Ok(Value::Missing)).unwrap().is_missing());
        assert!(or(Value::from(false), || Ok(Value::Missing)).unwrap().is_missing());
        assert_eq!(or(Value::from(false), || Ok(Value::from(false))).unwrap(), Value::from(false));
        assert!(not(&Value::NULL).unwrap().is_null());
        assert_eq!(not(&Value::from(true)).unwrap(), Value::from(false));
    }

    #[test]
    fn non_boolean_operands() {
        let err = and(Value::from(1), || Ok(Value::from(true))).unwrap_err();
        assert_eq!(err.code(), ErrorCode::EvaluatorIncompatibleOperands);
        let err = or(Value::from(false), || Ok(Value::string("x"))).unwrap_err();
        assert_eq!(err.code(), ErrorCode::EvaluatorIncompatibleOperands);
        assert!(not(&Value::from(1)).is_err());
    }
}
