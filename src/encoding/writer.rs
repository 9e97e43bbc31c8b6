// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use super::{BAG_ANNOTATION, DATE_ANNOTATION, MISSING_ANNOTATION, ORDERED_ANNOTATION, TIME_ANNOTATION};
use crate::datetime::Time;
use crate::number::format_decimal;
use crate::value::{Kind, StructOrdering, Value};

use core::fmt::Write;

use bigdecimal::BigDecimal;

enum Piece<'a> {
    Value(&'a Value),
    Raw(&'static str),
    Name(&'a str),
}

pub(crate) fn to_text(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

/// Append the text form of `value`. Nesting is walked with an explicit stack.
fn write_value(out: &mut String, value: &Value) {
    let mut stack = vec![Piece::Value(value)];
    while let Some(piece) = stack.pop() {
        match piece {
            Piece::Raw(s) => out.push_str(s),
            Piece::Name(name) => {
                write_symbol(out, name, '"');
                out.push(':');
            }
            Piece::Value(v) => write_head(out, v, &mut stack),
        }
    }
}

fn push_items<'a>(stack: &mut Vec<Piece<'a>>, items: &'a [Value], separator: &'static str) {
    for (i, item) in items.iter().enumerate().rev() {
        stack.push(Piece::Value(item));
        if i > 0 {
            stack.push(Piece::Raw(separator));
        }
    }
}

fn write_head<'a>(out: &mut String, value: &'a Value, stack: &mut Vec<Piece<'a>>) {
    match value {
        Value::Missing => {
            let _ = write!(out, "{MISSING_ANNOTATION}::null");
        }
        Value::Null(kind) => write_null(out, *kind),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Int(i) => {
            let _ = write!(out, "{i}");
        }
        Value::Float(f) => write_float(out, *f),
        Value::Decimal(d) => write_decimal(out, d),
        Value::Date(d) => {
            let _ = write!(out, "{DATE_ANNOTATION}::{}", d.format("%Y-%m-%d"));
        }
        Value::Time(t) => write_time(out, t),
        Value::Timestamp(ts) => {
            let _ = write!(out, "{ts}");
        }
        Value::String(s) => write_quoted(out, s, '"'),
        Value::Symbol(s) => write_symbol(out, s, '\''),
        Value::Clob(bytes) => write_clob(out, bytes),
        Value::Blob(bytes) => {
            let _ = write!(out, "{{{{{}}}}}", data_encoding::BASE64.encode(bytes));
        }
        Value::List(items) => {
            out.push('[');
            stack.push(Piece::Raw("]"));
            push_items(stack, items, ",");
        }
        Value::Sexp(items) => {
            out.push('(');
            stack.push(Piece::Raw(")"));
            push_items(stack, items, " ");
        }
        Value::Bag(items) => {
            let _ = write!(out, "{BAG_ANNOTATION}::[");
            stack.push(Piece::Raw("]"));
            push_items(stack, items, ",");
        }
        Value::Struct(s) => {
            if s.ordering() == StructOrdering::Ordered {
                let _ = write!(out, "{ORDERED_ANNOTATION}::");
            }
            out.push('{');
            stack.push(Piece::Raw("}"));
            for (i, (name, v)) in s.fields().iter().enumerate().rev() {
                stack.push(Piece::Value(v));
                stack.push(Piece::Name(name));
                if i > 0 {
                    stack.push(Piece::Raw(","));
                }
            }
        }
    }
}

fn write_null(out: &mut String, kind: Option<Kind>) {
    let text = match kind {
        None | Some(Kind::Missing) | Some(Kind::Null) => "null",
        Some(Kind::Bool) => "null.bool",
        Some(Kind::Int) => "null.int",
        Some(Kind::Float) => "null.float",
        Some(Kind::Decimal) => "null.decimal",
        Some(Kind::Timestamp) => "null.timestamp",
        Some(Kind::String) => "null.string",
        Some(Kind::Symbol) => "null.symbol",
        Some(Kind::Clob) => "null.clob",
        Some(Kind::Blob) => "null.blob",
        Some(Kind::List) => "null.list",
        Some(Kind::Sexp) => "null.sexp",
        Some(Kind::Struct) => "null.struct",
        Some(Kind::Date) => {
            let _ = write!(out, "{DATE_ANNOTATION}::null.timestamp");
            return;
        }
        Some(Kind::Time) => {
            let _ = write!(out, "{TIME_ANNOTATION}::null.struct");
            return;
        }
        Some(Kind::Bag) => {
            let _ = write!(out, "{BAG_ANNOTATION}::null.list");
            return;
        }
    };
    out.push_str(text);
}

fn write_float(out: &mut String, f: f64) {
    if f.is_nan() {
        out.push_str("nan");
    } else if f.is_infinite() {
        out.push_str(if f > 0.0 { "+inf" } else { "-inf" });
    } else {
        let _ = write!(out, "{f:e}");
    }
}

fn write_decimal(out: &mut String, d: &BigDecimal) {
    let (mantissa, scale) = d.as_bigint_and_exponent();
    if scale > 0 {
        out.push_str(&format_decimal(d));
    } else if scale == 0 {
        let _ = write!(out, "{mantissa}.");
    } else {
        let _ = write!(out, "{mantissa}d{}", scale.unsigned_abs());
    }
}

fn write_time(out: &mut String, t: &Time) {
    let _ = write!(
        out,
        "{TIME_ANNOTATION}::{{hour:{},minute:{},second:{}.",
        t.hour(),
        t.minute(),
        t.second()
    );
    if t.precision() > 0 {
        let digits = format!("{:09}", t.nanosecond());
        out.push_str(&digits[..usize::from(t.precision())]);
    }
    if let Some(offset) = t.offset_minutes() {
        let _ = write!(
            out,
            ",timezone_hour:{},timezone_minute:{}",
            offset / 60,
            offset % 60
        );
    }
    out.push('}');
}

fn write_clob(out: &mut String, bytes: &[u8]) {
    out.push_str("{{\"");
    for b in bytes {
        match b {
            b'"' => out.push_str("\\\""),
            b'\\' => out.push_str("\\\\"),
            0x20..=0x7e => out.push(char::from(*b)),
            _ => {
                let _ = write!(out, "\\x{b:02x}");
            }
        }
    }
    out.push_str("\"}}");
}

pub(crate) fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        && !matches!(s, "null" | "true" | "false" | "nan")
        && !s.starts_with('$')
}

/// Symbols and field names are written bare when they are plain identifiers.
fn write_symbol(out: &mut String, s: &str, quote: char) {
    if is_identifier(s) {
        out.push_str(s);
    } else {
        write_quoted(out, s, quote);
    }
}

fn write_quoted(out: &mut String, s: &str, quote: char) {
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out.push(quote);
}
