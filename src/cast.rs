// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! `CAST`, `CAN_CAST`, `CAN_LOSSLESS_CAST` and `IS <type>`.

use crate::datetime::{parse_date, Time, Timestamp};
use crate::error::{Error, ErrorCode, Property, Result};
use crate::number::{
    decimal_digits, decimal_fits, decimal_is_zero, decimal_magnitude_digits, decimal_to_f64,
    float_equals_decimal_exactly, float_to_decimal, format_decimal, format_float, parse_decimal,
    parse_float, round_half_up, Integer,
};
use crate::options::EvaluationOptions;
use crate::types::{DecimalParams, IntWidth, StringBound, TypeDescriptor};
use crate::value::{Kind, Value};
use crate::Rc;

use core::str::FromStr;

use bigdecimal::BigDecimal;

/// Integer digits of `i64::MAX`.
const MAX_INT_DIGITS: i64 = 19;

/// Design-time classification of a coercion path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LosslessClass {
    Always,
    Never,
    /// Cast back to the source's natural type and compare.
    RoundTrip,
    /// DECIMAL to FLOAT: the decimal must be exactly representable.
    ExactFloat,
    /// TIMESTAMP to DATE: midnight with no offset or a zero offset.
    Midnight,
}

fn classify(source: Kind, target: &TypeDescriptor) -> LosslessClass {
    use LosslessClass::*;
    match (source, target) {
        (_, TypeDescriptor::Any) => Always,
        (Kind::Bool, TypeDescriptor::Int(_) | TypeDescriptor::Float | TypeDescriptor::Decimal(_)) => {
            Never
        }
        (k, TypeDescriptor::Bool) if k.is_number() => Never,
        (Kind::Decimal, TypeDescriptor::Float) => ExactFloat,
        (Kind::Timestamp, TypeDescriptor::Date) => Midnight,
        (Kind::Timestamp, TypeDescriptor::Time { .. }) => Never,
        (k, TypeDescriptor::Clob | TypeDescriptor::Blob) if k.is_lob() => Always,
        (k, TypeDescriptor::List | TypeDescriptor::Sexp | TypeDescriptor::Bag)
            if k.is_collection() =>
        {
            Always
        }
        (Kind::Struct, TypeDescriptor::Struct) => Always,
        _ => RoundTrip,
    }
}

/// The unparameterized type a value naturally has; lossless checks cast back to it.
fn natural_type(value: &Value) -> TypeDescriptor {
    match value {
        Value::Missing => TypeDescriptor::Missing,
        Value::Null(_) => TypeDescriptor::Null,
        Value::Bool(_) => TypeDescriptor::Bool,
        Value::Int(_) => TypeDescriptor::Int(IntWidth::Int8),
        Value::Float(_) => TypeDescriptor::Float,
        Value::Decimal(_) => TypeDescriptor::Decimal(None),
        Value::Date(_) => TypeDescriptor::Date,
        Value::Time(t) => TypeDescriptor::Time {
            precision: Some(t.precision()),
            with_time_zone: t.offset_minutes().is_some(),
        },
        Value::Timestamp(_) => TypeDescriptor::Timestamp,
        Value::String(_) => TypeDescriptor::String(StringBound::Unbounded),
        Value::Symbol(_) => TypeDescriptor::Symbol,
        Value::Clob(_) => TypeDescriptor::Clob,
        Value::Blob(_) => TypeDescriptor::Blob,
        Value::List(_) => TypeDescriptor::List,
        Value::Sexp(_) => TypeDescriptor::Sexp,
        Value::Struct(_) => TypeDescriptor::Struct,
        Value::Bag(_) => TypeDescriptor::Bag,
    }
}

struct Caster<'a> {
    options: &'a EvaluationOptions,
}

impl<'a> Caster<'a> {
    fn honored(&self) -> bool {
        self.options.honors_parameters()
    }

    fn cast_failed(value: &Value, target: &TypeDescriptor, why: &str) -> Error {
        Error::new(
            ErrorCode::EvaluatorCastFailed,
            format!("cannot cast {value} to {target}: {why}"),
        )
        .with_property(Property::CastFrom, value.kind().name())
        .with_property(Property::CastTo, target.to_string())
    }

    fn int_overflow(value: &Value, target: &TypeDescriptor, width: IntWidth) -> Error {
        Error::new(
            ErrorCode::EvaluatorIntegerOverflow,
            format!("{value} does not fit in {} bytes", width.size_in_bytes()),
        )
        .with_property(Property::CastFrom, value.kind().name())
        .with_property(Property::CastTo, target.to_string())
        .with_property(Property::IntSizeInBytes, width.size_in_bytes())
    }

    fn decimal_overflow(
        value: &Value,
        target: &TypeDescriptor,
        precision: u32,
        scale: u32,
    ) -> Error {
        Error::new(
            ErrorCode::EvaluatorDecimalOverflow,
            format!("{value} needs more than {precision} digits"),
        )
        .with_property(Property::CastFrom, value.kind().name())
        .with_property(Property::CastTo, target.to_string())
        .with_property(Property::Precision, precision)
        .with_property(Property::Scale, scale)
    }

    fn invalid_cast(value: &Value, target: &TypeDescriptor) -> Error {
        Error::new(
            ErrorCode::EvaluatorInvalidCast,
            format!("no coercion from {} to {target}", value.kind()),
        )
        .with_property(Property::CastFrom, value.kind().name())
        .with_property(Property::CastTo, target.to_string())
    }

    fn cast(&self, value: &Value, target: &TypeDescriptor) -> Result<Value> {
        if value.is_unknown() {
            return Ok(value.clone());
        }
        match target.resolve() {
            TypeDescriptor::Any => Ok(value.clone()),
            TypeDescriptor::Missing | TypeDescriptor::Null => {
                Err(Self::invalid_cast(value, target))
            }
            TypeDescriptor::Union(any_of) => {
                if any_of.members().iter().any(|m| self.is_type(value, m)) {
                    return Ok(value.clone());
                }
                let mut failure: Option<Error> = None;
                for member in any_of.members() {
                    match self.cast(value, member) {
                        Ok(v) => return Ok(v),
                        Err(e) => {
                            let replace = match &failure {
                                None => true,
                                Some(f) => {
                                    f.code() == ErrorCode::EvaluatorInvalidCast
                                        && e.code() != ErrorCode::EvaluatorInvalidCast
                                }
                            };
                            if replace {
                                failure = Some(e);
                            }
                        }
                    }
                }
                Err(failure.unwrap_or_else(|| Self::invalid_cast(value, target)))
            }
            TypeDescriptor::Bool => self.to_bool(value, target),
            TypeDescriptor::Int(width) => self.to_int(value, target, *width),
            TypeDescriptor::Float => self.to_float(value, target),
            TypeDescriptor::Decimal(params) => self.to_decimal(value, target, *params),
            TypeDescriptor::Date => match value {
                Value::Date(_) => Ok(value.clone()),
                Value::Timestamp(ts) => Ok(Value::Date(ts.date())),
                Value::String(s) | Value::Symbol(s) => parse_date(s)
                    .map(Value::Date)
                    .ok_or_else(|| Self::cast_failed(value, target, "not a YYYY-MM-DD date")),
                _ => Err(Self::invalid_cast(value, target)),
            },
            TypeDescriptor::Time {
                precision,
                with_time_zone,
            } => self.to_time(value, target, *precision, *with_time_zone),
            TypeDescriptor::Timestamp => match value {
                Value::Timestamp(_) => Ok(value.clone()),
                Value::String(s) | Value::Symbol(s) => Timestamp::parse(s)
                    .map(Value::Timestamp)
                    .ok_or_else(|| Self::cast_failed(value, target, "not a timestamp")),
                _ => Err(Self::invalid_cast(value, target)),
            },
            TypeDescriptor::String(bound) => {
                let text = self.to_text(value, target)?;
                let bounded = self.bound_text(text, *bound);
                Ok(match value {
                    Value::String(s) if **s == *bounded => value.clone(),
                    _ => Value::String(bounded.into()),
                })
            }
            TypeDescriptor::Symbol => match value {
                Value::Symbol(_) => Ok(value.clone()),
                Value::String(s) => Ok(Value::Symbol(s.clone())),
                _ => self.to_text(value, target).map(|t| Value::symbol(&t)),
            },
            TypeDescriptor::Clob => match value {
                Value::Clob(_) => Ok(value.clone()),
                Value::Blob(b) => Ok(Value::Clob(b.clone())),
                _ => Err(Self::invalid_cast(value, target)),
            },
            TypeDescriptor::Blob => match value {
                Value::Blob(_) => Ok(value.clone()),
                Value::Clob(b) => Ok(Value::Blob(b.clone())),
                _ => Err(Self::invalid_cast(value, target)),
            },
            TypeDescriptor::List => match value {
                Value::List(_) => Ok(value.clone()),
                Value::Sexp(items) | Value::Bag(items) => Ok(Value::List(items.clone())),
                _ => Err(Self::invalid_cast(value, target)),
            },
            TypeDescriptor::Sexp => match value {
                Value::Sexp(_) => Ok(value.clone()),
                Value::List(items) | Value::Bag(items) => Ok(Value::Sexp(items.clone())),
                _ => Err(Self::invalid_cast(value, target)),
            },
            TypeDescriptor::Bag => match value {
                Value::Bag(_) => Ok(value.clone()),
                Value::List(items) | Value::Sexp(items) => Ok(Value::Bag(items.clone())),
                _ => Err(Self::invalid_cast(value, target)),
            },
            TypeDescriptor::Struct => match value {
                Value::Struct(_) => Ok(value.clone()),
                _ => Err(Self::invalid_cast(value, target)),
            },
            TypeDescriptor::Custom(_) => Err(Error::internal("custom type did not resolve")),
        }
    }

    fn to_bool(&self, value: &Value, target: &TypeDescriptor) -> Result<Value> {
        Ok(Value::Bool(match value {
            Value::Bool(b) => *b,
            Value::Int(i) => !i.is_zero(),
            Value::Float(f) => *f != 0.0,
            Value::Decimal(d) => !decimal_is_zero(d),
            Value::String(s) | Value::Symbol(s) => {
                if s.eq_ignore_ascii_case("true") {
                    true
                } else if s.eq_ignore_ascii_case("false") {
                    false
                } else {
                    return Err(Self::cast_failed(value, target, "expected 'true' or 'false'"));
                }
            }
            _ => return Err(Self::invalid_cast(value, target)),
        }))
    }

    fn to_int(&self, value: &Value, target: &TypeDescriptor, width: IntWidth) -> Result<Value> {
        let honored = self.honored();
        let integer = match value {
            Value::Bool(b) => Integer::from(i64::from(*b)),
            Value::Int(i) => i.clone(),
            Value::Float(f) => {
                let f = if honored { f.round() } else { *f };
                Integer::from_f64_truncated(f)
                    .ok_or_else(|| Self::cast_failed(value, target, "not a finite number"))?
            }
            Value::Decimal(d) => {
                if decimal_magnitude_digits(d) > MAX_INT_DIGITS {
                    let width = if honored { width } else { IntWidth::Int8 };
                    return Err(Self::int_overflow(value, target, width));
                }
                if honored {
                    Integer::from_decimal_truncated(&round_half_up(d, 0))
                } else {
                    Integer::from_decimal_truncated(d)
                }
            }
            Value::String(s) | Value::Symbol(s) => Integer::from_str(s)
                .map_err(|_| Self::cast_failed(value, target, "not an integer"))?,
            _ => return Err(Self::invalid_cast(value, target)),
        };

        let (width, in_range) = match integer.as_i64() {
            Some(i) if honored => (width, width.contains(i)),
            Some(_) => (IntWidth::Int8, true),
            None if honored => (width, false),
            None => (IntWidth::Int8, false),
        };
        if !in_range {
            return Err(Self::int_overflow(value, target, width));
        }
        Ok(Value::Int(integer))
    }

    fn to_float(&self, value: &Value, target: &TypeDescriptor) -> Result<Value> {
        Ok(Value::Float(match value {
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Int(i) => i.to_f64(),
            Value::Float(f) => *f,
            Value::Decimal(d) => decimal_to_f64(d),
            Value::String(s) | Value::Symbol(s) => parse_float(s)
                .ok_or_else(|| Self::cast_failed(value, target, "not a float"))?,
            _ => return Err(Self::invalid_cast(value, target)),
        }))
    }

    fn to_decimal(
        &self,
        value: &Value,
        target: &TypeDescriptor,
        params: Option<DecimalParams>,
    ) -> Result<Value> {
        let decimal = match value {
            Value::Bool(b) => BigDecimal::from(i64::from(*b)),
            Value::Int(i) => i.to_decimal(),
            Value::Float(f) => float_to_decimal(*f)
                .ok_or_else(|| Self::cast_failed(value, target, "not a finite number"))?,
            Value::Decimal(d) => match params {
                Some(_) if self.honored() => (**d).clone(),
                _ => return Ok(value.clone()),
            },
            Value::String(s) | Value::Symbol(s) => parse_decimal(s)
                .ok_or_else(|| Self::cast_failed(value, target, "not a decimal"))?,
            _ => return Err(Self::invalid_cast(value, target)),
        };

        match params {
            Some(DecimalParams { precision, scale }) if self.honored() => {
                if decimal_magnitude_digits(&decimal) > i64::from(precision) - i64::from(scale) {
                    return Err(Self::decimal_overflow(value, target, precision, scale));
                }
                let rounded = round_half_up(&decimal, i64::from(scale));
                if !decimal_is_zero(&rounded) && decimal_digits(&rounded) > u64::from(precision) {
                    return Err(Self::decimal_overflow(value, target, precision, scale));
                }
                Ok(Value::decimal(rounded))
            }
            _ => Ok(Value::decimal(decimal)),
        }
    }

    fn to_time(
        &self,
        value: &Value,
        target: &TypeDescriptor,
        precision: Option<u8>,
        with_time_zone: bool,
    ) -> Result<Value> {
        let time = match value {
            Value::Time(t) => *t,
            Value::Timestamp(ts) => {
                if with_time_zone && ts.offset_minutes().is_none() {
                    return Err(Self::cast_failed(value, target, "the timestamp has no known offset"));
                }
                ts.time()
            }
            Value::String(s) | Value::Symbol(s) => Time::parse(s)
                .ok_or_else(|| Self::cast_failed(value, target, "not an HH:MM:SS time"))?,
            _ => return Err(Self::invalid_cast(value, target)),
        };

        let time = match (with_time_zone, time.offset_minutes()) {
            (true, None) => time.with_offset(Some(self.options.default_timezone_offset_minutes)),
            (true, Some(_)) => time,
            (false, _) => time.with_offset(None),
        };
        let time = match precision {
            Some(p) if self.honored() => time.with_precision(p),
            _ => time,
        };
        Ok(Value::Time(time))
    }

    fn to_text(&self, value: &Value, target: &TypeDescriptor) -> Result<Rc<str>> {
        Ok(match value {
            Value::String(s) | Value::Symbol(s) => s.clone(),
            Value::Bool(b) => if *b { "true" } else { "false" }.into(),
            Value::Int(i) => i.to_string().into(),
            Value::Float(f) => format_float(*f).into(),
            Value::Decimal(d) => format_decimal(d).into(),
            Value::Date(d) => d.format("%Y-%m-%d").to_string().into(),
            Value::Time(t) => t.to_string().into(),
            Value::Timestamp(ts) => ts.to_string().into(),
            _ => return Err(Self::invalid_cast(value, target)),
        })
    }

    fn bound_text(&self, text: Rc<str>, bound: StringBound) -> Rc<str> {
        if !self.honored() {
            return text;
        }
        let truncated = |n: u32| -> String {
            text.chars()
                .take(usize::try_from(n).unwrap_or(usize::MAX))
                .collect()
        };
        match bound {
            StringBound::Unbounded => text,
            StringBound::Varying(n) => {
                if char_count_exceeds(&text, n) {
                    truncated(n).into()
                } else {
                    text
                }
            }
            StringBound::Fixed(n) => {
                let mut s = truncated(n);
                let len = s.chars().count();
                let target = usize::try_from(n).unwrap_or(usize::MAX);
                if len == target && s.len() == text.len() {
                    return text;
                }
                s.extend(core::iter::repeat(' ').take(target.saturating_sub(len)));
                s.into()
            }
        }
    }

    fn is_type(&self, value: &Value, target: &TypeDescriptor) -> bool {
        let honored = self.honored();
        match (target.resolve(), value) {
            (TypeDescriptor::Any, _) => true,
            (TypeDescriptor::Missing, v) => v.is_missing(),
            (TypeDescriptor::Null, v) => v.is_unknown(),
            (TypeDescriptor::Union(any_of), v) => {
                any_of.members().iter().any(|m| self.is_type(v, m))
            }
            (TypeDescriptor::Bool, Value::Bool(_)) => true,
            (TypeDescriptor::Int(width), Value::Int(i)) => {
                i.as_i64().is_some_and(|i| !honored || width.contains(i))
            }
            (TypeDescriptor::Float, Value::Float(_)) => true,
            (TypeDescriptor::Decimal(params), Value::Decimal(d)) => match params {
                Some(DecimalParams { precision, scale }) if honored => {
                    decimal_fits(d, *precision, *scale)
                }
                _ => true,
            },
            (TypeDescriptor::Date, Value::Date(_)) => true,
            (
                TypeDescriptor::Time {
                    precision,
                    with_time_zone,
                },
                Value::Time(t),
            ) => {
                !honored
                    || (precision.map_or(true, |p| t.precision() <= p)
                        && *with_time_zone == t.offset_minutes().is_some())
            }
            (TypeDescriptor::Timestamp, Value::Timestamp(_)) => true,
            (TypeDescriptor::String(bound), Value::String(s)) => match bound {
                StringBound::Unbounded => true,
                StringBound::Fixed(n) => {
                    usize::try_from(*n).is_ok_and(|n| s.chars().count() == n)
                }
                StringBound::Varying(n) => !honored || !char_count_exceeds(s, *n),
            },
            (TypeDescriptor::Symbol, Value::Symbol(_))
            | (TypeDescriptor::Clob, Value::Clob(_))
            | (TypeDescriptor::Blob, Value::Blob(_))
            | (TypeDescriptor::List, Value::List(_))
            | (TypeDescriptor::Sexp, Value::Sexp(_))
            | (TypeDescriptor::Struct, Value::Struct(_))
            | (TypeDescriptor::Bag, Value::Bag(_)) => true,
            _ => false,
        }
    }

    fn is_lossless(&self, value: &Value, target: &TypeDescriptor, result: &Value) -> bool {
        let target = target.resolve();
        if let TypeDescriptor::Union(any_of) = target {
            if any_of.members().iter().any(|m| self.is_type(value, m)) {
                return true;
            }
            return any_of
                .members()
                .iter()
                .find_map(|m| self.cast(value, m).ok().map(|r| (m, r)))
                .is_some_and(|(m, r)| self.is_lossless(value, m, &r));
        }

        match classify(value.kind(), target) {
            LosslessClass::Always => true,
            LosslessClass::Never => false,
            LosslessClass::ExactFloat => match (value, result) {
                (Value::Decimal(d), Value::Float(f)) => float_equals_decimal_exactly(*f, d),
                _ => false,
            },
            LosslessClass::Midnight => match value {
                Value::Timestamp(ts) => {
                    ts.is_midnight() && matches!(ts.offset_minutes(), None | Some(0))
                }
                _ => false,
            },
            LosslessClass::RoundTrip => self
                .cast(result, &natural_type(value))
                .is_ok_and(|back| back.kind() == value.kind() && back.value_eq(value)),
        }
    }
}

fn char_count_exceeds(text: &str, n: u32) -> bool {
    let n = usize::try_from(n).unwrap_or(usize::MAX);
    text.len() > n && text.chars().nth(n).is_some()
}

/// Cast `value` to `target`.
///
/// Unknown inputs come back unchanged. Failures carry `CAST_FROM` and `CAST_TO`
/// and map to exactly one [`crate::error::CastFailureKind`].
pub fn cast(value: &Value, target: &TypeDescriptor, options: &EvaluationOptions) -> Result<Value> {
    target.validate(options)?;
    Caster { options }.cast(value, target)
}

/// Whether [`cast`] succeeds. An ill-formed target raises instead.
pub fn can_cast(value: &Value, target: &TypeDescriptor, options: &EvaluationOptions) -> Result<bool> {
    match cast(value, target, options) {
        Ok(_) => Ok(true),
        Err(e) if e.code().cast_failure_kind().is_some() => Ok(false),
        Err(e) => Err(e),
    }
}

/// Whether [`cast`] succeeds and loses no information.
pub fn can_lossless_cast(
    value: &Value,
    target: &TypeDescriptor,
    options: &EvaluationOptions,
) -> Result<bool> {
    target.validate(options)?;
    if value.is_unknown() {
        return Ok(true);
    }
    let caster = Caster { options };
    match caster.cast(value, target) {
        Ok(result) => Ok(caster.is_lossless(value, target, &result)),
        Err(e) if e.code().cast_failure_kind().is_some() => Ok(false),
        Err(e) => Err(e),
    }
}

/// `value IS target`.
///
/// Unknowns are only of type `NULL` (both) or `MISSING` (MISSING alone).
pub fn is_type(value: &Value, target: &TypeDescriptor, options: &EvaluationOptions) -> bool {
    Caster { options }.is_type(value, target)
}
