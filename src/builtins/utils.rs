// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::error::{Error, ErrorCode, Property, Result};
use crate::value::Value;

pub fn incorrect_argument(fcn: &str, pos: usize, expected: &str, actual: &Value) -> Error {
    Error::new(
        ErrorCode::EvaluatorIncorrectTypeOfArgumentsToFuncCall,
        format!("`{fcn}` expects {expected} argument. Got `{actual}` instead"),
    )
    .with_property(Property::FunctionName, fcn)
    .with_property(Property::ExpectedArgumentTypes, expected)
    .with_property(Property::ActualArgumentTypes, actual.kind().name())
    .with_property(Property::ArgumentPosition, pos + 1)
}

pub fn ensure_text<'a>(fcn: &str, args: &'a [Value], pos: usize) -> Result<&'a str> {
    let v = &args[pos];
    v.as_text()
        .ok_or_else(|| incorrect_argument(fcn, pos, "STRING or SYMBOL", v))
}

pub fn ensure_numeric<'a>(fcn: &str, args: &'a [Value], pos: usize) -> Result<&'a Value> {
    let v = &args[pos];
    if v.kind().is_number() {
        Ok(v)
    } else {
        Err(incorrect_argument(fcn, pos, "INT, FLOAT or DECIMAL", v))
    }
}
