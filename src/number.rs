// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.
#![allow(clippy::as_conversions, clippy::float_cmp)]

use core::cmp::Ordering;
use core::fmt::{self, Debug, Display, Formatter};
use core::str::FromStr;

use bigdecimal::BigDecimal;
use num_bigint::BigInt as NumBigInt;
use num_traits::{One, Signed, ToPrimitive, Zero};

use serde::ser::Serializer;
use serde::Serialize;

use crate::Rc;

pub type BigInt = NumBigInt;

/// Exactly representable bound of `i64` as `f64` (2^63).
const F64_I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// An arbitrary-precision integer kept in an `i64` whenever it fits.
///
/// Values outside the `i64` range only arise from literals and decoded data.
/// Arithmetic results are always range-checked back to `i64`.
#[derive(Clone)]
pub enum Integer {
    Small(i64),
    Big(Rc<BigInt>),
}

impl Integer {
    fn from_bigint_owned(value: BigInt) -> Self {
        match value.to_i64() {
            Some(i) => Integer::Small(i),
            None => Integer::Big(Rc::new(value)),
        }
    }

    pub fn to_bigint(&self) -> BigInt {
        match self {
            Integer::Small(i) => BigInt::from(*i),
            Integer::Big(b) => (**b).clone(),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Integer::Small(i) => Some(*i),
            Integer::Big(_) => None,
        }
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Integer::Small(0))
    }

    pub fn is_negative(&self) -> bool {
        match self {
            Integer::Small(i) => *i < 0,
            Integer::Big(b) => b.is_negative(),
        }
    }

    pub fn to_f64(&self) -> f64 {
        match self {
            Integer::Small(i) => *i as f64,
            Integer::Big(b) => match b.to_f64() {
                Some(f) => f,
                None if b.is_negative() => f64::NEG_INFINITY,
                None => f64::INFINITY,
            },
        }
    }

    pub fn to_decimal(&self) -> BigDecimal {
        BigDecimal::from(self.to_bigint())
    }

    /// Truncate a finite float toward zero. `None` when NaN or infinite.
    pub fn from_f64_truncated(value: f64) -> Option<Integer> {
        if !value.is_finite() {
            return None;
        }
        let t = value.trunc();
        if (-F64_I64_BOUND..F64_I64_BOUND).contains(&t) {
            return Some(Integer::Small(t as i64));
        }
        // Integral floats beyond i64 convert exactly through the decimal form.
        BigDecimal::from_str(&format!("{t:.0}"))
            .ok()
            .map(|d| Integer::from_bigint_owned(d.as_bigint_and_exponent().0))
    }

    /// Integer part of a decimal, truncated toward zero.
    pub fn from_decimal_truncated(value: &BigDecimal) -> Integer {
        let (mantissa, scale) = value.as_bigint_and_exponent();
        // Zero, or a magnitude below one.
        if mantissa.is_zero() || scale >= decimal_digits(value) as i64 {
            Integer::Small(0)
        } else if scale <= 0 {
            Integer::from_bigint_owned(mantissa * pow10_bigint(scale.unsigned_abs()))
        } else {
            Integer::from_bigint_owned(mantissa / pow10_bigint(scale.unsigned_abs()))
        }
    }

    fn checked(
        &self,
        rhs: &Self,
        small: fn(i64, i64) -> Option<i64>,
        big: fn(BigInt, BigInt) -> BigInt,
    ) -> Option<Integer> {
        if let (Integer::Small(a), Integer::Small(b)) = (self, rhs) {
            return small(*a, *b).map(Integer::Small);
        }
        big(self.to_bigint(), rhs.to_bigint())
            .to_i64()
            .map(Integer::Small)
    }

    pub fn checked_add(&self, rhs: &Self) -> Option<Integer> {
        self.checked(rhs, i64::checked_add, |a, b| a + b)
    }

    pub fn checked_sub(&self, rhs: &Self) -> Option<Integer> {
        self.checked(rhs, i64::checked_sub, |a, b| a - b)
    }

    pub fn checked_mul(&self, rhs: &Self) -> Option<Integer> {
        self.checked(rhs, i64::checked_mul, |a, b| a * b)
    }

    /// Truncating division. The caller rules out a zero divisor.
    pub fn checked_div(&self, rhs: &Self) -> Option<Integer> {
        if rhs.is_zero() {
            return None;
        }
        self.checked(rhs, i64::checked_div, |a, b| a / b)
    }

    /// Remainder taking the sign of the dividend.
    pub fn checked_rem(&self, rhs: &Self) -> Option<Integer> {
        if rhs.is_zero() {
            return None;
        }
        self.checked(rhs, i64::checked_rem, |a, b| a % b)
    }

    pub fn checked_neg(&self) -> Option<Integer> {
        match self {
            Integer::Small(i) => i.checked_neg().map(Integer::Small),
            Integer::Big(b) => (-(**b).clone()).to_i64().map(Integer::Small),
        }
    }

    pub fn checked_abs(&self) -> Option<Integer> {
        if self.is_negative() {
            self.checked_neg()
        } else {
            self.as_i64().map(Integer::Small)
        }
    }

    /// Number of decimal digits, ignoring the sign.
    pub fn digit_count(&self) -> u64 {
        match self {
            Integer::Small(i) => i.unsigned_abs().checked_ilog10().map_or(1, |d| u64::from(d) + 1),
            Integer::Big(b) => b.magnitude().to_string().len() as u64,
        }
    }
}

impl Debug for Integer {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for Integer {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Integer::Small(i) => write!(f, "{i}"),
            Integer::Big(b) => write!(f, "{b}"),
        }
    }
}

impl Serialize for Integer {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Integer::Small(i) => serializer.serialize_i64(*i),
            Integer::Big(b) => {
                let v = serde_json::Number::from_str(&b.to_string())
                    .map_err(|_| serde::ser::Error::custom("could not serialize integer"))?;
                v.serialize(serializer)
            }
        }
    }
}

impl From<i64> for Integer {
    fn from(value: i64) -> Self {
        Integer::Small(value)
    }
}

impl From<i32> for Integer {
    fn from(value: i32) -> Self {
        Integer::Small(i64::from(value))
    }
}

impl From<u64> for Integer {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(i) => Integer::Small(i),
            Err(_) => Integer::Big(Rc::new(BigInt::from(value))),
        }
    }
}

impl From<BigInt> for Integer {
    fn from(value: BigInt) -> Self {
        Integer::from_bigint_owned(value)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParseIntegerError;

impl FromStr for Integer {
    type Err = ParseIntegerError;

    /// Lenient integer syntax: optional sign, `0x`/`0b` radix prefixes and `_`
    /// digit separators. Surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (negative, body) = if let Some(rest) = trimmed.strip_prefix('-') {
            (true, rest)
        } else if let Some(rest) = trimmed.strip_prefix('+') {
            (false, rest)
        } else {
            (false, trimmed)
        };

        let (radix, digits) = match body.get(..2) {
            Some("0x") | Some("0X") => (16, &body[2..]),
            Some("0b") | Some("0B") => (2, &body[2..]),
            _ => (10, body),
        };

        if digits.is_empty()
            || digits.starts_with('_')
            || digits.ends_with('_')
            || digits.contains("__")
        {
            return Err(ParseIntegerError);
        }
        let canonical = digits.replace('_', "");
        if !canonical.chars().all(|c| c.is_digit(radix)) {
            return Err(ParseIntegerError);
        }

        let mut value = BigInt::parse_bytes(canonical.as_bytes(), radix).ok_or(ParseIntegerError)?;
        if negative {
            value = -value;
        }
        Ok(Integer::from_bigint_owned(value))
    }
}

impl PartialEq for Integer {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Integer {}

impl Ord for Integer {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Integer::Small(a), Integer::Small(b)) => a.cmp(b),
            _ => self.to_bigint().cmp(&other.to_bigint()),
        }
    }
}

impl PartialOrd for Integer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

pub(crate) fn pow10_bigint(exp: u64) -> BigInt {
    if exp == 0 {
        return BigInt::one();
    }

    let mut result = BigInt::one();
    let mut base = BigInt::from(10u8);
    let mut e = exp;

    while e > 0 {
        if e & 1 == 1 {
            result *= &base;
        }
        if e > 1 {
            base = &base * &base;
        }
        e >>= 1;
    }

    result
}

/// Round to `scale` fractional digits, ties away from zero.
pub fn round_half_up(value: &BigDecimal, scale: i64) -> BigDecimal {
    let (mantissa, current) = value.as_bigint_and_exponent();
    if mantissa.is_zero() {
        return BigDecimal::new(mantissa, scale);
    }
    if current <= scale {
        let widened = mantissa * pow10_bigint((scale - current).unsigned_abs());
        return BigDecimal::new(widened, scale);
    }

    // Below half a unit of the target scale.
    if current - scale > decimal_digits(value) as i64 {
        return BigDecimal::new(BigInt::zero(), scale);
    }

    let divisor = pow10_bigint((current - scale).unsigned_abs());
    let mut quotient = &mantissa / &divisor;
    let remainder = &mantissa % &divisor;
    if remainder.abs() * 2 >= divisor {
        if mantissa.is_negative() {
            quotient -= 1;
        } else {
            quotient += 1;
        }
    }
    BigDecimal::new(quotient, scale)
}

/// Decimal digits of the unscaled value.
pub fn decimal_digits(value: &BigDecimal) -> u64 {
    let (mantissa, _) = value.as_bigint_and_exponent();
    if mantissa.is_zero() {
        1
    } else {
        mantissa.magnitude().to_string().len() as u64
    }
}

/// Digits left of the decimal point, as counted against a precision limit.
pub fn decimal_integer_digits(value: &BigDecimal) -> i64 {
    let (_, scale) = value.as_bigint_and_exponent();
    decimal_digits(value) as i64 - scale
}

pub fn decimal_is_zero(value: &BigDecimal) -> bool {
    value.as_bigint_and_exponent().0.is_zero()
}

/// Like `decimal_integer_digits`, but zero for any zero value whatever its exponent.
pub fn decimal_magnitude_digits(value: &BigDecimal) -> i64 {
    if decimal_is_zero(value) {
        0
    } else {
        decimal_integer_digits(value)
    }
}

/// Whether `value` fits `DECIMAL(precision, scale)` without rounding.
pub fn decimal_fits(value: &BigDecimal, precision: u32, scale: u32) -> bool {
    let (_, value_scale) = value.as_bigint_and_exponent();
    value_scale <= i64::from(scale)
        && decimal_magnitude_digits(value) <= i64::from(precision) - i64::from(scale)
}

/// Canonical text of a decimal: plain notation for non-negative scale,
/// `<digits>E+<n>` otherwise.
pub fn format_decimal(value: &BigDecimal) -> String {
    let (mantissa, scale) = value.as_bigint_and_exponent();
    if scale < 0 {
        return format!("{mantissa}E+{}", scale.unsigned_abs());
    }
    let negative = mantissa.is_negative();
    let digits = mantissa.magnitude().to_string();
    let scale = scale as usize;
    let sign = if negative { "-" } else { "" };
    if scale == 0 {
        format!("{sign}{digits}")
    } else if digits.len() > scale {
        let (int, frac) = digits.split_at(digits.len() - scale);
        format!("{sign}{int}.{frac}")
    } else {
        format!("{sign}0.{}{digits}", "0".repeat(scale - digits.len()))
    }
}

/// Parse decimal text: digits with an optional point and `e`/`d` exponent.
pub fn parse_decimal(text: &str) -> Option<BigDecimal> {
    let trimmed = text.trim();
    if trimmed.is_empty()
        || !trimmed
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E' | 'd' | 'D'))
    {
        return None;
    }
    let canonical = trimmed.replace(['d', 'D'], "e");
    let canonical = match canonical.split_once(['e', 'E']) {
        Some((m, e)) if m.ends_with('.') => format!("{}e{e}", &m[..m.len() - 1]),
        None if canonical.ends_with('.') => canonical[..canonical.len() - 1].to_string(),
        _ => canonical,
    };
    if !canonical.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    BigDecimal::from_str(&canonical).ok()
}

/// Parse float text, accepting the `nan`, `inf` spellings of either case.
pub fn parse_float(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "nan" => return Some(f64::NAN),
        "inf" | "+inf" | "infinity" | "+infinity" => return Some(f64::INFINITY),
        "-inf" | "-infinity" => return Some(f64::NEG_INFINITY),
        _ => {}
    }
    if !trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
    {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// Canonical text of a float.
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "+inf" } else { "-inf" }.to_string();
    }
    let abs = value.abs();
    if abs != 0.0 && !(1e-6..1e21).contains(&abs) {
        return format!("{value:e}");
    }
    let s = value.to_string();
    if s.contains('.') {
        s
    } else {
        format!("{s}.0")
    }
}

/// Shortest decimal that reads back as the same float.
pub fn float_to_decimal(value: f64) -> Option<BigDecimal> {
    if !value.is_finite() {
        return None;
    }
    BigDecimal::from_str(&value.to_string()).ok()
}

/// The exact binary value of a finite float.
pub fn float_to_exact_decimal(value: f64) -> Option<BigDecimal> {
    if !value.is_finite() {
        return None;
    }
    // f64 values are dyadic rationals; 1074 fractional digits represent any of them.
    BigDecimal::from_str(&format!("{value:.1074}"))
        .ok()
        .map(|d| d.normalized())
}

/// Whether a float holds exactly the given decimal.
pub fn float_equals_decimal_exactly(value: f64, decimal: &BigDecimal) -> bool {
    float_to_exact_decimal(value).is_some_and(|exact| exact == *decimal)
}

pub fn decimal_to_f64(value: &BigDecimal) -> f64 {
    value
        .to_f64()
        .or_else(|| format_decimal(value).parse::<f64>().ok())
        .unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn parses_lenient_integers() {
        assert_eq!("42".parse::<Integer>(), Ok(Integer::Small(42)));
        assert_eq!(" -0x1F ".parse::<Integer>(), Ok(Integer::Small(-31)));
        assert_eq!("0b101".parse::<Integer>(), Ok(Integer::Small(5)));
        assert_eq!("1_000".parse::<Integer>(), Ok(Integer::Small(1000)));
        assert!("1.5".parse::<Integer>().is_err());
        assert!("1__0".parse::<Integer>().is_err());
        assert!("".parse::<Integer>().is_err());
        assert!(matches!(
            "99999999999999999999".parse::<Integer>(),
            Ok(Integer::Big(_))
        ));
    }

    #[test]
    fn arithmetic_is_range_checked() {
        let max = Integer::Small(i64::MAX);
        assert!(max.checked_add(&Integer::Small(1)).is_none());
        assert!(Integer::Small(i64::MIN).checked_div(&Integer::Small(-1)).is_none());
        assert_eq!(
            Integer::Small(-7).checked_rem(&Integer::Small(3)),
            Some(Integer::Small(-1))
        );
        let big: Integer = "9223372036854775808".parse().unwrap();
        assert_eq!(
            big.checked_sub(&Integer::Small(1)),
            Some(Integer::Small(i64::MAX))
        );
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round_half_up(&dec("2.5"), 0), dec("3"));
        assert_eq!(round_half_up(&dec("-2.5"), 0), dec("-3"));
        assert_eq!(round_half_up(&dec("1.2345"), 2), dec("1.23"));
        assert_eq!(round_half_up(&dec("1.5"), 3).as_bigint_and_exponent().1, 3);
        assert_eq!(round_half_up(&dec("0.0051"), 2), dec("0.01"));
        assert_eq!(round_half_up(&dec("0.00049"), 2), dec("0.00"));
        let tiny = round_half_up(&dec("1e-400000000"), 2);
        assert!(decimal_is_zero(&tiny));
        assert_eq!(tiny.as_bigint_and_exponent().1, 2);
    }

    #[test]
    fn decimal_text() {
        assert_eq!(format_decimal(&dec("1.50")), "1.50");
        assert_eq!(format_decimal(&dec("-0.05")), "-0.05");
        assert_eq!(format_decimal(&BigDecimal::new(BigInt::from(15), -3)), "15E+3");
        assert_eq!(parse_decimal("15."), Some(dec("15")));
        assert_eq!(
            parse_decimal("15d3").map(|d| d.as_bigint_and_exponent()),
            Some((BigInt::from(15), -3))
        );
        assert!(parse_decimal("abc").is_none());
        assert!(decimal_fits(&dec("123.45"), 5, 2));
        assert!(!decimal_fits(&dec("1234.5"), 5, 2));
        assert!(!decimal_fits(&dec("1.234"), 5, 2));
    }

    #[test]
    fn float_text() {
        assert_eq!(format_float(1.5), "1.5");
        assert_eq!(format_float(2.0), "2.0");
        assert_eq!(format_float(-0.0), "-0.0");
        assert_eq!(format_float(f64::NAN), "nan");
        assert_eq!(format_float(1e300), "1e300");
        assert_eq!(parse_float("-INF"), Some(f64::NEG_INFINITY));
        assert!(parse_float("1.5x").is_none());
    }

    #[test]
    fn exact_float_decimal() {
        assert!(float_equals_decimal_exactly(0.5, &dec("0.5")));
        assert!(!float_equals_decimal_exactly(0.1, &dec("0.1")));
        assert_eq!(float_to_decimal(0.1), Some(dec("0.1")));
    }

    #[test]
    fn truncation() {
        assert_eq!(Integer::from_f64_truncated(-2.7), Some(Integer::Small(-2)));
        assert_eq!(Integer::from_f64_truncated(f64::NAN), None);
        assert!(matches!(Integer::from_f64_truncated(1e20), Some(Integer::Big(_))));
        assert_eq!(
            Integer::from_decimal_truncated(&dec("-9.99")),
            Integer::Small(-9)
        );
        assert_eq!(
            Integer::from_decimal_truncated(&dec("-1e-400000000")),
            Integer::Small(0)
        );
        assert_eq!(decimal_magnitude_digits(&dec("0e400000000")), 0);
        assert_eq!(decimal_magnitude_digits(&dec("1e400000000")), 400_000_001);
        assert_eq!(Integer::Small(-100).digit_count(), 3);
        assert_eq!(Integer::Small(0).digit_count(), 1);
    }
}
