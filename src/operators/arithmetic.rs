// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use super::{incompatible_operands, propagate_unknown};
use crate::error::{Error, ErrorCode, Result};
use crate::number::{decimal_is_zero, decimal_to_f64, Integer};
use crate::value::Value;

use core::fmt;

use bigdecimal::BigDecimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl fmt::Display for ArithOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
            ArithOp::Mod => "%",
        })
    }
}

enum Operands {
    Ints(Integer, Integer),
    Decimals(BigDecimal, BigDecimal),
    Floats(f64, f64),
}

fn to_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Int(i) => Some(i.to_f64()),
        Value::Float(f) => Some(*f),
        Value::Decimal(d) => Some(decimal_to_f64(d)),
        _ => None,
    }
}

fn to_decimal(v: &Value) -> Option<BigDecimal> {
    match v {
        Value::Int(i) => Some(i.to_decimal()),
        Value::Decimal(d) => Some((**d).clone()),
        _ => None,
    }
}

/// Promote both operands to their common numeric kind.
fn promote(op: &str, a: &Value, b: &Value) -> Result<Operands> {
    let fail = || incompatible_operands(op, &[a, b]);
    Ok(match (a, b) {
        (Value::Int(x), Value::Int(y)) => Operands::Ints(x.clone(), y.clone()),
        (Value::Float(_), _) | (_, Value::Float(_)) => {
            Operands::Floats(to_f64(a).ok_or_else(fail)?, to_f64(b).ok_or_else(fail)?)
        }
        _ => Operands::Decimals(to_decimal(a).ok_or_else(fail)?, to_decimal(b).ok_or_else(fail)?),
    })
}

fn overflow(op: ArithOp, a: &Value, b: &Value) -> Error {
    Error::new(
        ErrorCode::EvaluatorIntegerOverflow,
        format!("{a} {op} {b} overflows a 64-bit integer"),
    )
}

fn zero_divisor(op: ArithOp) -> Error {
    match op {
        ArithOp::Mod => Error::new(ErrorCode::EvaluatorModuloByZero, "modulo by zero"),
        _ => Error::new(ErrorCode::EvaluatorDivideByZero, "division by zero"),
    }
}

/// Binary `+ - * / %`.
///
/// INT with INT stays INT, anything with FLOAT is FLOAT, and the remaining
/// INT/DECIMAL mixes are DECIMAL. Integer division truncates.
pub fn arithmetic(op: ArithOp, a: &Value, b: &Value) -> Result<Value> {
    if let Some(unknown) = propagate_unknown([a, b]) {
        return Ok(unknown);
    }
    let op_name = op.to_string();
    match promote(&op_name, a, b)? {
        Operands::Ints(x, y) => {
            if matches!(op, ArithOp::Div | ArithOp::Mod) && y.is_zero() {
                return Err(zero_divisor(op));
            }
            let result = match op {
                ArithOp::Add => x.checked_add(&y),
                ArithOp::Sub => x.checked_sub(&y),
                ArithOp::Mul => x.checked_mul(&y),
                ArithOp::Div => x.checked_div(&y),
                ArithOp::Mod => x.checked_rem(&y),
            };
            result.map(Value::Int).ok_or_else(|| overflow(op, a, b))
        }
        Operands::Decimals(x, y) => {
            if matches!(op, ArithOp::Div | ArithOp::Mod) && decimal_is_zero(&y) {
                return Err(zero_divisor(op));
            }
            Ok(Value::decimal(match op {
                ArithOp::Add => x + y,
                ArithOp::Sub => x - y,
                ArithOp::Mul => x * y,
                ArithOp::Div => x / y,
                ArithOp::Mod => x % y,
            }))
        }
        Operands::Floats(x, y) => {
            if matches!(op, ArithOp::Div | ArithOp::Mod) && y == 0.0 {
                return Err(zero_divisor(op));
            }
            Ok(Value::Float(match op {
                ArithOp::Add => x + y,
                ArithOp::Sub => x - y,
                ArithOp::Mul => x * y,
                ArithOp::Div => x / y,
                ArithOp::Mod => x % y,
            }))
        }
    }
}

pub fn negate(v: &Value) -> Result<Value> {
    match v {
        Value::Missing | Value::Null(_) => Ok(propagate_unknown([v]).unwrap_or(Value::NULL)),
        Value::Int(i) => i.checked_neg().map(Value::Int).ok_or_else(|| {
            Error::new(
                ErrorCode::EvaluatorIntegerOverflow,
                format!("-({i}) overflows a 64-bit integer"),
            )
        }),
        Value::Float(f) => Ok(Value::Float(-f)),
        Value::Decimal(d) => Ok(Value::decimal(-(**d).clone())),
        _ => Err(incompatible_operands("-", &[v])),
    }
}

pub fn unary_plus(v: &Value) -> Result<Value> {
    match v {
        Value::Missing | Value::Null(_) => Ok(propagate_unknown([v]).unwrap_or(Value::NULL)),
        Value::Int(_) | Value::Float(_) | Value::Decimal(_) => Ok(v.clone()),
        _ => Err(incompatible_operands("+", &[v])),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Kind;

    fn v(text: &str) -> Value {
        Value::from_text(text).unwrap()
    }

    #[test]
    fn promotes_numeric_kinds() {
        assert_eq!(arithmetic(ArithOp::Add, &v("1"), &v("2")).unwrap(), v("3"));
        assert_eq!(arithmetic(ArithOp::Div, &v("7"), &v("2")).unwrap(), v("3"));
        assert_eq!(arithmetic(ArithOp::Div, &v("-7"), &v("2")).unwrap(), v("-3"));
        assert_eq!(arithmetic(ArithOp::Mod, &v("-7"), &v("2")).unwrap(), v("-1"));
        assert_eq!(arithmetic(ArithOp::Add, &v("1"), &v("1.5")).unwrap().kind(), Kind::Decimal);
        assert_eq!(arithmetic(ArithOp::Mul, &v("1.5"), &v("2e0")).unwrap().kind(), Kind::Float);
        assert!(arithmetic(ArithOp::Sub, &v("1.5"), &v("0.5")).unwrap().value_eq(&v("1")));
    }

    #[test]
    fn failures() {
        let max = Value::from(i64::MAX);
        assert_eq!(
            arithmetic(ArithOp::Add, &max, &v("1")).unwrap_err().code(),
            ErrorCode::EvaluatorIntegerOverflow
        );
        assert_eq!(
            arithmetic(ArithOp::Div, &v("1"), &v("0")).unwrap_err().code(),
            ErrorCode::EvaluatorDivideByZero
        );
        assert_eq!(
            arithmetic(ArithOp::Mod, &v("1.0"), &v("0.00")).unwrap_err().code(),
            ErrorCode::EvaluatorModuloByZero
        );
        assert_eq!(
            arithmetic(ArithOp::Add, &v("1"), &v("\"a\"")).unwrap_err().code(),
            ErrorCode::EvaluatorIncompatibleOperands
        );
        assert_eq!(
            negate(&Value::from(i64::MIN)).unwrap_err().code(),
            ErrorCode::EvaluatorIntegerOverflow
        );
    }

    #[test]
    fn unknowns_short_circuit_before_kind_checks() {
        assert!(arithmetic(ArithOp::Add, &v("\"a\""), &Value::NULL).unwrap().is_null());
        assert!(arithmetic(ArithOp::Div, &Value::NULL, &Value::Missing).unwrap().is_missing());
        assert!(negate(&Value::Missing).unwrap().is_missing());
        assert!(unary_plus(&Value::typed_null(Kind::Int)).unwrap().is_null());
    }
}
