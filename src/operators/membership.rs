// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use super::comparison::{compare, CmpOp};
use super::logical::{and, not};
use super::{incompatible_operands, propagate_unknown};
use crate::error::Result;
use crate::value::Value;

/// `needle IN haystack`.
///
/// A value-equal element makes the result `TRUE` whatever else the collection
/// holds. Without a match, unknowns among the needle and the elements decide
/// between `NULL` and `MISSING`.
pub fn in_collection(needle: &Value, haystack: &Value) -> Result<Value> {
    if haystack.is_unknown() {
        return Ok(propagate_unknown([needle, haystack]).unwrap_or(Value::NULL));
    }
    let Some(elements) = haystack.elements() else {
        return Err(incompatible_operands("IN", &[needle, haystack]));
    };

    let unknowns = elements.iter().filter(|e| e.is_unknown());
    if needle.is_unknown() {
        return Ok(propagate_unknown(core::iter::once(needle).chain(unknowns)).unwrap_or(Value::NULL));
    }
    if elements
        .iter()
        .any(|e| !e.is_unknown() && e.value_eq(needle))
    {
        return Ok(Value::Bool(true));
    }
    Ok(propagate_unknown(unknowns).unwrap_or(Value::Bool(false)))
}

pub fn not_in_collection(needle: &Value, haystack: &Value) -> Result<Value> {
    not(&in_collection(needle, haystack)?)
}

/// `v BETWEEN low AND high`, i.e. `low <= v AND v <= high` under the strict rule.
pub fn between(v: &Value, low: &Value, high: &Value) -> Result<Value> {
    if let Some(unknown) = propagate_unknown([v, low, high]) {
        return Ok(unknown);
    }
    and(compare(CmpOp::Ge, v, low)?, || compare(CmpOp::Le, v, high))
}
