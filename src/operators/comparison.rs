// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use super::propagate_unknown;
use crate::error::{Error, ErrorCode, Property, Result};
use crate::value::{Kind, Value};

use core::cmp::Ordering;
use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CmpOp::Eq => "=",
            CmpOp::Ne => "<>",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        })
    }
}

/// Kinds that can be ordered against each other fall in the same class.
fn ordering_class(kind: Kind) -> Option<u8> {
    Some(match kind {
        Kind::Bool => 0,
        Kind::Int | Kind::Float | Kind::Decimal => 1,
        Kind::Date => 2,
        Kind::Time => 3,
        Kind::Timestamp => 4,
        Kind::String | Kind::Symbol => 5,
        Kind::Clob | Kind::Blob => 6,
        _ => return None,
    })
}

pub fn compare(op: CmpOp, a: &Value, b: &Value) -> Result<Value> {
    if let Some(unknown) = propagate_unknown([a, b]) {
        return Ok(unknown);
    }
    let result = match op {
        CmpOp::Eq => a.value_eq(b),
        CmpOp::Ne => !a.value_eq(b),
        _ => {
            let comparable = matches!(
                (ordering_class(a.kind()), ordering_class(b.kind())),
                (Some(x), Some(y)) if x == y
            );
            if !comparable {
                return Err(Error::new(
                    ErrorCode::EvaluatorInvalidComparison,
                    format!("cannot compare {} {op} {}", a.kind(), b.kind()),
                )
                .with_property(
                    Property::ActualArgumentTypes,
                    format!("{}, {}", a.kind(), b.kind()),
                ));
            }
            let ord = a.total_cmp(b);
            match op {
                CmpOp::Lt => ord == Ordering::Less,
                CmpOp::Le => ord != Ordering::Greater,
                CmpOp::Gt => ord == Ordering::Greater,
                _ => ord != Ordering::Less,
            }
        }
    };
    Ok(Value::Bool(result))
}
