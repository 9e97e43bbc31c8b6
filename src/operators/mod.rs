// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Operators over runtime values and their handling of `NULL` and `MISSING`.
//!
//! Strict operators degrade to `MISSING` when any operand is `MISSING`, else to
//! `NULL` when any operand is `NULL`, before looking at operand kinds.

pub mod arithmetic;
pub mod comparison;
pub mod logical;
pub mod membership;
pub mod strings;

pub use arithmetic::{arithmetic, negate, unary_plus, ArithOp};
pub use comparison::{compare, CmpOp};
pub use logical::{and, not, or};
pub use membership::{between, in_collection, not_in_collection};
pub use strings::{concat, like, like_with, LikeMatcher};

use crate::error::{Error, ErrorCode, Property};
use crate::value::Value;

/// The unknown a strict operator yields for these operands, if any.
pub fn propagate_unknown<'a>(operands: impl IntoIterator<Item = &'a Value>) -> Option<Value> {
    let mut result = None;
    for v in operands {
        match v {
            Value::Missing => return Some(Value::Missing),
            Value::Null(_) => result = Some(Value::NULL),
            _ => {}
        }
    }
    result
}

pub(crate) fn incompatible_operands(op: &str, operands: &[&Value]) -> Error {
    let kinds = operands
        .iter()
        .map(|v| v.kind().name())
        .collect::<Vec<_>>()
        .join(", ");
    Error::new(
        ErrorCode::EvaluatorIncompatibleOperands,
        format!("`{op}` cannot be applied to {kinds}"),
    )
    .with_property(Property::ActualArgumentTypes, kinds)
}
