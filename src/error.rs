// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::lexer::SourceLocation;

use core::fmt;
use std::collections::BTreeMap;

use serde::Serialize;

/// Broad classification of an [`ErrorCode`].
///
/// Lexer, parser and semantic failures are compile-time failures and are raised in
/// every typing mode. Evaluator failures happen while computing a value and may be
/// demoted to `MISSING` in permissive mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    Lexer,
    Parser,
    Semantic,
    Evaluator,
}

/// What permissive typing mode does with a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PermissiveBehavior {
    ThrowError,
    ReturnMissing,
}

/// The two failure kinds a cast may produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CastFailureKind {
    /// The source could not be converted, e.g. unparsable text or overflow.
    CastFailed,
    /// The source kind has no coercion path to the target kind.
    InvalidCast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    LexerInvalidLiteral,

    ParseUnexpectedToken,
    ParseUnexpectedEndOfInput,
    ParseExpectedTypeName,
    ParseNestingTooDeep,

    SemanticUnknownType,
    SemanticInvalidTypeParameter,
    SemanticInvalidDecimalArguments,
    SemanticUnionTypeInvalid,
    SemanticDuplicateTypeName,
    SemanticLiteralIntOverflow,
    SemanticNoSuchFunction,
    SemanticIncorrectNumberOfArgumentsToFuncCall,
    SemanticInvalidOption,

    EvaluatorCastFailed,
    EvaluatorInvalidCast,
    EvaluatorIntegerOverflow,
    EvaluatorDecimalOverflow,
    EvaluatorDivideByZero,
    EvaluatorModuloByZero,
    EvaluatorIncompatibleOperands,
    EvaluatorInvalidComparison,
    EvaluatorIncorrectTypeOfArgumentsToFuncCall,
    EvaluatorLikeInvalidInputs,
    EvaluatorLikePatternInvalidEscapeSequence,
    EvaluatorBindingDoesNotExist,
    EvaluatorInternalError,
}

impl ErrorCode {
    pub const fn category(self) -> ErrorCategory {
        use ErrorCode::*;
        match self {
            LexerInvalidLiteral => ErrorCategory::Lexer,
            ParseUnexpectedToken
            | ParseUnexpectedEndOfInput
            | ParseExpectedTypeName
            | ParseNestingTooDeep => ErrorCategory::Parser,
            SemanticUnknownType
            | SemanticInvalidTypeParameter
            | SemanticInvalidDecimalArguments
            | SemanticUnionTypeInvalid
            | SemanticDuplicateTypeName
            | SemanticLiteralIntOverflow
            | SemanticNoSuchFunction
            | SemanticIncorrectNumberOfArgumentsToFuncCall
            | SemanticInvalidOption => ErrorCategory::Semantic,
            EvaluatorCastFailed
            | EvaluatorInvalidCast
            | EvaluatorIntegerOverflow
            | EvaluatorDecimalOverflow
            | EvaluatorDivideByZero
            | EvaluatorModuloByZero
            | EvaluatorIncompatibleOperands
            | EvaluatorInvalidComparison
            | EvaluatorIncorrectTypeOfArgumentsToFuncCall
            | EvaluatorLikeInvalidInputs
            | EvaluatorLikePatternInvalidEscapeSequence
            | EvaluatorBindingDoesNotExist
            | EvaluatorInternalError => ErrorCategory::Evaluator,
        }
    }

    /// Declared behavior of this code under permissive typing mode.
    pub const fn permissive_behavior(self) -> PermissiveBehavior {
        use ErrorCode::*;
        match self {
            EvaluatorCastFailed
            | EvaluatorInvalidCast
            | EvaluatorIntegerOverflow
            | EvaluatorDecimalOverflow
            | EvaluatorDivideByZero
            | EvaluatorModuloByZero
            | EvaluatorIncompatibleOperands
            | EvaluatorInvalidComparison
            | EvaluatorIncorrectTypeOfArgumentsToFuncCall => PermissiveBehavior::ReturnMissing,
            _ => PermissiveBehavior::ThrowError,
        }
    }

    /// Cast failure kind of codes a cast can raise.
    pub const fn cast_failure_kind(self) -> Option<CastFailureKind> {
        match self {
            ErrorCode::EvaluatorCastFailed
            | ErrorCode::EvaluatorIntegerOverflow
            | ErrorCode::EvaluatorDecimalOverflow => Some(CastFailureKind::CastFailed),
            ErrorCode::EvaluatorInvalidCast => Some(CastFailureKind::InvalidCast),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        use ErrorCode::*;
        match self {
            LexerInvalidLiteral => "LEXER_INVALID_LITERAL",
            ParseUnexpectedToken => "PARSE_UNEXPECTED_TOKEN",
            ParseUnexpectedEndOfInput => "PARSE_UNEXPECTED_END_OF_INPUT",
            ParseExpectedTypeName => "PARSE_EXPECTED_TYPE_NAME",
            ParseNestingTooDeep => "PARSE_NESTING_TOO_DEEP",
            SemanticUnknownType => "SEMANTIC_UNKNOWN_TYPE",
            SemanticInvalidTypeParameter => "SEMANTIC_INVALID_TYPE_PARAMETER",
            SemanticInvalidDecimalArguments => "SEMANTIC_INVALID_DECIMAL_ARGUMENTS",
            SemanticUnionTypeInvalid => "SEMANTIC_UNION_TYPE_INVALID",
            SemanticDuplicateTypeName => "SEMANTIC_DUPLICATE_TYPE_NAME",
            SemanticLiteralIntOverflow => "SEMANTIC_LITERAL_INT_OVERFLOW",
            SemanticNoSuchFunction => "SEMANTIC_NO_SUCH_FUNCTION",
            SemanticIncorrectNumberOfArgumentsToFuncCall => {
                "SEMANTIC_INCORRECT_NUMBER_OF_ARGUMENTS_TO_FUNC_CALL"
            }
            SemanticInvalidOption => "SEMANTIC_INVALID_OPTION",
            EvaluatorCastFailed => "EVALUATOR_CAST_FAILED",
            EvaluatorInvalidCast => "EVALUATOR_INVALID_CAST",
            EvaluatorIntegerOverflow => "EVALUATOR_INTEGER_OVERFLOW",
            EvaluatorDecimalOverflow => "EVALUATOR_DECIMAL_OVERFLOW",
            EvaluatorDivideByZero => "EVALUATOR_DIVIDE_BY_ZERO",
            EvaluatorModuloByZero => "EVALUATOR_MODULO_BY_ZERO",
            EvaluatorIncompatibleOperands => "EVALUATOR_INCOMPATIBLE_OPERANDS",
            EvaluatorInvalidComparison => "EVALUATOR_INVALID_COMPARISON",
            EvaluatorIncorrectTypeOfArgumentsToFuncCall => {
                "EVALUATOR_INCORRECT_TYPE_OF_ARGUMENTS_TO_FUNC_CALL"
            }
            EvaluatorLikeInvalidInputs => "EVALUATOR_LIKE_INVALID_INPUTS",
            EvaluatorLikePatternInvalidEscapeSequence => {
                "EVALUATOR_LIKE_PATTERN_INVALID_ESCAPE_SEQUENCE"
            }
            EvaluatorBindingDoesNotExist => "EVALUATOR_BINDING_DOES_NOT_EXIST",
            EvaluatorInternalError => "EVALUATOR_INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Keys of the machine-readable error context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Property {
    LineNumber,
    ColumnNumber,
    CastFrom,
    CastTo,
    IntSizeInBytes,
    Precision,
    Scale,
    TypeName,
    FunctionName,
    ExpectedArityMin,
    ExpectedArityMax,
    ActualArity,
    ExpectedArgumentTypes,
    ActualArgumentTypes,
    ArgumentPosition,
    LikeValue,
    LikePattern,
    LikeEscape,
    BindingName,
    TokenString,
    ExpectedToken,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Integer(i64),
    Text(String),
}

impl PropertyValue {
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            PropertyValue::Integer(i) => Some(*i),
            PropertyValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            PropertyValue::Integer(_) => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Integer(i) => write!(f, "{i}"),
            PropertyValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        PropertyValue::Integer(v)
    }
}

impl From<u32> for PropertyValue {
    fn from(v: u32) -> Self {
        PropertyValue::Integer(i64::from(v))
    }
}

impl From<usize> for PropertyValue {
    fn from(v: usize) -> Self {
        PropertyValue::Integer(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::Text(v.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        PropertyValue::Text(v)
    }
}

/// Ordered map of error context properties.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PropertyValueMap {
    map: BTreeMap<Property, PropertyValue>,
}

impl PropertyValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, property: Property, value: impl Into<PropertyValue>) {
        self.map.insert(property, value.into());
    }

    pub fn get(&self, property: Property) -> Option<&PropertyValue> {
        self.map.get(&property)
    }

    pub fn contains(&self, property: Property) -> bool {
        self.map.contains_key(&property)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Property, &PropertyValue)> {
        self.map.iter()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// A failure raised anywhere in the crate.
///
/// Every error carries a stable [`ErrorCode`], a human readable message, a
/// [`PropertyValueMap`] with machine-readable context, and a flag telling apart
/// defects of the engine itself from errors caused by user input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{code}: {message}{}", location_suffix(.properties))]
pub struct Error {
    code: ErrorCode,
    message: String,
    properties: PropertyValueMap,
    internal: bool,
}

fn location_suffix(properties: &PropertyValueMap) -> String {
    match (
        properties.get(Property::LineNumber),
        properties.get(Property::ColumnNumber),
    ) {
        (Some(line), Some(col)) => format!(" (at {line}:{col})"),
        _ => String::new(),
    }
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            properties: PropertyValueMap::new(),
            internal: false,
        }
    }

    /// An engine defect rather than a user error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::EvaluatorInternalError,
            message: message.into(),
            properties: PropertyValueMap::new(),
            internal: true,
        }
    }

    pub fn with_property(mut self, property: Property, value: impl Into<PropertyValue>) -> Self {
        self.properties.set(property, value);
        self
    }

    pub fn at(self, location: SourceLocation) -> Self {
        self.with_property(Property::LineNumber, location.line)
            .with_property(Property::ColumnNumber, location.column)
    }

    /// Attach a location unless the error already knows where it happened.
    pub fn at_if_unknown(self, location: SourceLocation) -> Self {
        if self.properties.contains(Property::LineNumber) {
            self
        } else {
            self.at(location)
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn properties(&self) -> &PropertyValueMap {
        &self.properties
    }

    pub fn property(&self, property: Property) -> Option<&PropertyValue> {
        self.properties.get(property)
    }

    pub fn is_internal(&self) -> bool {
        self.internal
    }

    pub fn location(&self) -> Option<SourceLocation> {
        let line = self.property(Property::LineNumber)?.as_integer()?;
        let column = self.property(Property::ColumnNumber)?.as_integer()?;
        Some(SourceLocation {
            line: u32::try_from(line).ok()?,
            column: u32::try_from(column).ok()?,
        })
    }

    /// Whether permissive typing mode replaces this failure with `MISSING`.
    pub fn is_demotable(&self) -> bool {
        !self.internal
            && self.category() == ErrorCategory::Evaluator
            && self.code.permissive_behavior() == PermissiveBehavior::ReturnMissing
    }
}

pub type Result<T, E = Error> = core::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_time_codes_always_throw() {
        for code in [
            ErrorCode::LexerInvalidLiteral,
            ErrorCode::ParseUnexpectedToken,
            ErrorCode::SemanticInvalidDecimalArguments,
            ErrorCode::SemanticUnionTypeInvalid,
            ErrorCode::SemanticLiteralIntOverflow,
        ] {
            assert_ne!(code.category(), ErrorCategory::Evaluator);
            assert_eq!(code.permissive_behavior(), PermissiveBehavior::ThrowError);
            assert!(!Error::new(code, "x").is_demotable());
        }
    }

    #[test]
    fn like_errors_are_not_demotable() {
        assert!(!Error::new(ErrorCode::EvaluatorLikeInvalidInputs, "x").is_demotable());
        assert!(Error::new(ErrorCode::EvaluatorCastFailed, "x").is_demotable());
        assert!(!Error::internal("boom").is_demotable());
    }

    #[test]
    fn display_includes_code_and_location() {
        let e = Error::new(ErrorCode::EvaluatorDivideByZero, "/ by zero").at(SourceLocation {
            line: 3,
            column: 14,
        });
        assert_eq!(e.to_string(), "EVALUATOR_DIVIDE_BY_ZERO: / by zero (at 3:14)");
        assert_eq!(e.location(), Some(SourceLocation { line: 3, column: 14 }));

        let e = e.at_if_unknown(SourceLocation { line: 9, column: 9 });
        assert_eq!(e.location(), Some(SourceLocation { line: 3, column: 14 }));
    }

    #[test]
    fn cast_failure_kinds() {
        assert_eq!(
            ErrorCode::EvaluatorIntegerOverflow.cast_failure_kind(),
            Some(CastFailureKind::CastFailed)
        );
        assert_eq!(
            ErrorCode::EvaluatorInvalidCast.cast_failure_kind(),
            Some(CastFailureKind::InvalidCast)
        );
        assert_eq!(ErrorCode::EvaluatorDivideByZero.cast_failure_kind(), None);
    }
}
