// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Text encoding of values.
//!
//! A superset of JSON with typed nulls, symbols, s-expressions, decimals,
//! timestamps and lobs. Kinds the base format lacks travel as annotated
//! values: `$missing::null`, `$bag::[...]`, `$date::2021-01-01`,
//! `$time::{hour:12,minute:30,second:15.5}` and `$ordered::{...}`.

mod reader;
mod writer;

pub(crate) use reader::from_text;
pub(crate) use writer::to_text;

pub(crate) const MISSING_ANNOTATION: &str = "$missing";
pub(crate) const BAG_ANNOTATION: &str = "$bag";
pub(crate) const DATE_ANNOTATION: &str = "$date";
pub(crate) const TIME_ANNOTATION: &str = "$time";
pub(crate) const ORDERED_ANNOTATION: &str = "$ordered";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Kind, Value};

    fn round_trip(text: &str) {
        let v = from_text(text).unwrap_or_else(|e| panic!("{text}: {e}"));
        let written = to_text(&v);
        let back = from_text(&written).unwrap_or_else(|e| panic!("{written}: {e}"));
        assert!(v.strict_eq(&back), "{text} -> {written}");
    }

    #[test]
    fn round_trips() {
        for text in [
            "null",
            "null.int",
            "null.struct",
            "$missing::null",
            "true",
            "-42",
            "123456789012345678901234567890",
            "1.50",
            "15.",
            "15d3",
            "-0.0e0",
            "nan",
            "+inf",
            "-inf",
            "1.5e-7",
            "2007-02-23T12:14:33.079-08:00",
            "2007T",
            "$date::2021-02-28",
            "$time::{hour:23,minute:59,second:59.125}",
            "$time::{hour:1,minute:2,second:3.,timezone_hour:-5,timezone_minute:-30}",
            r#""tab\there é \"q\"""#,
            "sym",
            "'hello world'",
            "'null'",
            r#"{{"clob\x00bytes"}}"#,
            "{{aGVsbG8=}}",
            "[1, [2, (a b c)], {x: 1, 'y z': \"2\"}]",
            "$bag::[1, 1, null]",
            "$ordered::{b: 2, a: 1}",
            "{a: $missing::null}",
            "{}",
            "[]",
            "$bag::[]",
        ] {
            round_trip(text);
        }
    }

    #[test]
    fn writes_canonical_text() {
        assert_eq!(to_text(&Value::Missing), "$missing::null");
        assert_eq!(to_text(&Value::Null(Some(Kind::Decimal))), "null.decimal");
        assert_eq!(to_text(&Value::Null(Some(Kind::Bag))), "$bag::null.list");
        assert_eq!(to_text(&Value::from(1.5)), "1.5e0");
        assert_eq!(to_text(&Value::symbol("null")), "'null'");
        assert_eq!(
            to_text(&Value::bag(vec![Value::from(1), Value::string("a")])),
            "$bag::[1,\"a\"]"
        );
        assert_eq!(
            to_text(&Value::struct_from([("a b", Value::from(true))])),
            "{\"a b\":true}"
        );
    }

    #[test]
    fn reads_typed_nulls_and_annotations() {
        assert!(matches!(from_text("null.bool").unwrap(), Value::Null(Some(Kind::Bool))));
        assert!(matches!(from_text("$date::null.timestamp").unwrap(), Value::Null(Some(Kind::Date))));
        assert!(from_text("$missing::null").unwrap().is_missing());
        assert!(matches!(from_text("foo::bar::5").unwrap(), Value::Int(_)));
    }
}
