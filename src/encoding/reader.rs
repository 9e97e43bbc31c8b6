// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use super::{BAG_ANNOTATION, DATE_ANNOTATION, MISSING_ANNOTATION, ORDERED_ANNOTATION, TIME_ANNOTATION};
use crate::datetime::{Time, Timestamp, TimestampPrecision};
use crate::error::{Error, ErrorCode, Property, Result};
use crate::lexer::{Cursor, SourceLocation};
use crate::number::{
    decimal_magnitude_digits, parse_decimal, parse_float, round_half_up, BigInt, Integer,
};
use crate::value::{Kind, StructOrdering, Value};
use crate::Rc;

use core::str::FromStr;

use num_traits::ToPrimitive;

/// Deepest container nesting accepted by the reader.
const MAX_NESTING_DEPTH: usize = 256;

const OPERATOR_CHARS: &str = "!#%&*+-./;<=>?@^`|~";

struct Reader<'source> {
    cursor: Cursor<'source>,
    depth: usize,
}

/// Parse exactly one value from `text`.
pub(crate) fn from_text(text: &str) -> Result<Value> {
    let mut reader = Reader {
        cursor: Cursor::new(text),
        depth: 0,
    };
    reader.cursor.skip_ws()?;
    let value = reader.read_value()?;
    reader.cursor.skip_ws()?;
    if !reader.cursor.at_end() {
        return Err(reader.unexpected("end of input"));
    }
    Ok(value)
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

impl<'source> Reader<'source> {
    fn error(&self, code: ErrorCode, loc: SourceLocation, msg: &str) -> Error {
        Error::new(code, msg).at(loc)
    }

    fn unexpected(&mut self, expected: &str) -> Error {
        let loc = self.cursor.location();
        if self.cursor.at_end() {
            return self
                .error(ErrorCode::ParseUnexpectedEndOfInput, loc, "unexpected end of input")
                .with_property(Property::ExpectedToken, expected);
        }
        let found = self.cursor.peek().1;
        self.error(
            ErrorCode::ParseUnexpectedToken,
            loc,
            &format!("unexpected `{found}`, expected {expected}"),
        )
        .with_property(Property::TokenString, found.to_string())
        .with_property(Property::ExpectedToken, expected)
    }

    fn expect(&mut self, ch: char) -> Result<()> {
        self.cursor.skip_ws()?;
        if self.cursor.eat(ch) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("`{ch}`")))
        }
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            let loc = self.cursor.location();
            return Err(self.error(
                ErrorCode::ParseNestingTooDeep,
                loc,
                &format!("nesting exceeds {MAX_NESTING_DEPTH} levels"),
            ));
        }
        Ok(())
    }

    fn exit(&mut self) {
        self.depth -= 1;
    }

    fn read_value(&mut self) -> Result<Value> {
        let loc = self.cursor.location();
        let annotations = self.read_annotations()?;
        let value = self.read_plain(false)?;
        self.apply_annotations(&annotations, value, loc)
    }

    /// Symbol text at the cursor, bare or quoted.
    fn read_symbol_text(&mut self) -> Result<Option<String>> {
        let ch = self.cursor.peek().1;
        if self.cursor.at_end() {
            return Ok(None);
        }
        if is_ident_start(ch) {
            return Ok(Some(self.cursor.take_while(is_ident_char).to_string()));
        }
        if ch == '\'' && !(self.cursor.peekahead(1).1 == '\'' && self.cursor.peekahead(2).1 == '\'') {
            return self.read_quoted('\'').map(Some);
        }
        Ok(None)
    }

    fn read_annotations(&mut self) -> Result<Vec<String>> {
        let mut annotations = vec![];
        loop {
            let saved = self.cursor.clone();
            match self.read_symbol_text()? {
                Some(symbol) => {
                    self.cursor.skip_ws()?;
                    if self.cursor.peek().1 == ':' && self.cursor.peekahead(1).1 == ':' {
                        self.cursor.bump();
                        self.cursor.bump();
                        self.cursor.skip_ws()?;
                        annotations.push(symbol);
                        continue;
                    }
                    self.cursor = saved;
                    return Ok(annotations);
                }
                None => {
                    self.cursor = saved;
                    return Ok(annotations);
                }
            }
        }
    }

    fn read_plain(&mut self, in_sexp: bool) -> Result<Value> {
        self.cursor.skip_ws()?;
        if self.cursor.at_end() {
            return Err(self.unexpected("a value"));
        }
        let (_, ch) = self.cursor.peek();
        let next = self.cursor.peekahead(1).1;
        match ch {
            '[' => self.read_list(),
            '(' => self.read_sexp(),
            '{' if next == '{' => self.read_lob(),
            '{' => self.read_struct(),
            '"' => Ok(Value::String(self.read_quoted('"')?.into())),
            '\'' => Ok(Value::Symbol(self.read_quoted('\'')?.into())),
            '+' | '-' if next.is_ascii_digit() || next == 'i' => self.read_numeric(),
            _ if ch.is_ascii_digit() => self.read_numeric(),
            _ if is_ident_start(ch) => self.read_keyword(),
            _ if in_sexp && OPERATOR_CHARS.contains(ch) => Ok(Value::Symbol(
                self.cursor.take_while(|c| OPERATOR_CHARS.contains(c)).into(),
            )),
            _ => Err(self.unexpected("a value")),
        }
    }

    fn read_keyword(&mut self) -> Result<Value> {
        let loc = self.cursor.location();
        let word = self.cursor.take_while(is_ident_char);
        match word {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            "nan" => Ok(Value::Float(f64::NAN)),
            "null" => {
                if self.cursor.peek().1 != '.' || self.cursor.at_end() {
                    return Ok(Value::NULL);
                }
                self.cursor.bump();
                let type_name = self.cursor.take_while(|c| c.is_ascii_alphabetic());
                let kind = match type_name {
                    "null" => None,
                    "bool" => Some(Kind::Bool),
                    "int" => Some(Kind::Int),
                    "float" => Some(Kind::Float),
                    "decimal" => Some(Kind::Decimal),
                    "timestamp" => Some(Kind::Timestamp),
                    "string" => Some(Kind::String),
                    "symbol" => Some(Kind::Symbol),
                    "clob" => Some(Kind::Clob),
                    "blob" => Some(Kind::Blob),
                    "list" => Some(Kind::List),
                    "sexp" => Some(Kind::Sexp),
                    "struct" => Some(Kind::Struct),
                    _ => {
                        return Err(self
                            .error(ErrorCode::LexerInvalidLiteral, loc, "invalid typed null")
                            .with_property(Property::TokenString, format!("null.{type_name}")))
                    }
                };
                Ok(Value::Null(kind))
            }
            _ => Ok(Value::Symbol(word.into())),
        }
    }

    fn read_numeric(&mut self) -> Result<Value> {
        let loc = self.cursor.location();
        let token = self.cursor.take_while(|c| {
            c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | ':' | '+' | '-')
        });
        let invalid = || {
            Error::new(ErrorCode::LexerInvalidLiteral, "invalid numeric or timestamp literal")
                .at(loc)
                .with_property(Property::TokenString, token)
        };

        match token {
            "+inf" => return Ok(Value::Float(f64::INFINITY)),
            "-inf" => return Ok(Value::Float(f64::NEG_INFINITY)),
            _ => {}
        }

        let bytes = token.as_bytes();
        let is_timestamp = bytes.len() >= 5
            && bytes[..4].iter().all(u8::is_ascii_digit)
            && matches!(bytes[4], b'-' | b'T');
        if is_timestamp {
            return Timestamp::parse(token).map(Value::Timestamp).ok_or_else(invalid);
        }

        let unsigned = token.trim_start_matches(['-', '+']);
        let radix_prefixed = unsigned.len() > 1
            && unsigned.starts_with('0')
            && matches!(unsigned.as_bytes()[1], b'x' | b'X' | b'b' | b'B');
        if radix_prefixed {
            return Integer::from_str(token).map(Value::Int).map_err(|_| invalid());
        }

        let plain = token.replace('_', "");
        if plain.contains(['e', 'E']) {
            return parse_float(&plain).map(Value::Float).ok_or_else(invalid);
        }
        if plain.contains(['.', 'd', 'D']) {
            return parse_decimal(&plain).map(Value::decimal).ok_or_else(invalid);
        }
        Integer::from_str(token).map(Value::Int).map_err(|_| invalid())
    }

    fn read_escape(&mut self, loc: SourceLocation) -> Result<char> {
        let invalid = |msg: &str| Error::new(ErrorCode::LexerInvalidLiteral, msg).at(loc);
        let esc = self.cursor.bump().ok_or_else(|| invalid("unterminated escape"))?;
        let hex = |reader: &mut Self, n: usize| -> Result<char> {
            let mut code = 0u32;
            for _ in 0..n {
                let digit = reader
                    .cursor
                    .bump()
                    .and_then(|c| c.to_digit(16))
                    .ok_or_else(|| invalid("invalid hex escape"))?;
                code = code * 16 + digit;
            }
            char::from_u32(code).ok_or_else(|| invalid("invalid code point"))
        };
        Ok(match esc {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '0' => '\0',
            'a' => '\x07',
            'b' => '\x08',
            'f' => '\x0c',
            'v' => '\x0b',
            '"' | '\'' | '\\' | '/' | '?' => esc,
            'x' => hex(self, 2)?,
            'u' => hex(self, 4)?,
            'U' => hex(self, 8)?,
            _ => return Err(invalid("invalid escape sequence")),
        })
    }

    fn read_quoted(&mut self, quote: char) -> Result<String> {
        let loc = self.cursor.location();
        self.cursor.bump();
        let mut text = String::new();
        loop {
            match self.cursor.bump() {
                None => {
                    return Err(self.error(
                        ErrorCode::LexerInvalidLiteral,
                        loc,
                        "unterminated quoted text",
                    ))
                }
                Some(c) if c == quote => return Ok(text),
                Some('\\') => {
                    let c = self.read_escape(loc)?;
                    text.push(c);
                }
                Some(c) => text.push(c),
            }
        }
    }

    fn read_list(&mut self) -> Result<Value> {
        self.enter()?;
        self.cursor.bump();
        let mut items = vec![];
        loop {
            self.cursor.skip_ws()?;
            if self.cursor.eat(']') {
                break;
            }
            items.push(self.read_value()?);
            self.cursor.skip_ws()?;
            if self.cursor.eat(']') {
                break;
            }
            self.expect(',')?;
        }
        self.exit();
        Ok(Value::list(items))
    }

    fn read_sexp(&mut self) -> Result<Value> {
        self.enter()?;
        self.cursor.bump();
        let mut items = vec![];
        loop {
            self.cursor.skip_ws()?;
            if self.cursor.eat(')') {
                break;
            }
            let loc = self.cursor.location();
            let annotations = self.read_annotations()?;
            let value = self.read_plain(true)?;
            items.push(self.apply_annotations(&annotations, value, loc)?);
        }
        self.exit();
        Ok(Value::sexp(items))
    }

    fn read_struct(&mut self) -> Result<Value> {
        self.enter()?;
        self.cursor.bump();
        let mut fields: Vec<(Rc<str>, Value)> = vec![];
        loop {
            self.cursor.skip_ws()?;
            if self.cursor.eat('}') {
                break;
            }
            let name = match self.cursor.peek().1 {
                '"' => self.read_quoted('"')?,
                _ => match self.read_symbol_text()? {
                    Some(name) => name,
                    None => return Err(self.unexpected("a field name")),
                },
            };
            self.expect(':')?;
            if self.cursor.peek().1 == ':' {
                return Err(self.unexpected("a field value"));
            }
            self.cursor.skip_ws()?;
            let value = self.read_value()?;
            fields.push((name.into(), value));
            self.cursor.skip_ws()?;
            if self.cursor.eat('}') {
                break;
            }
            self.expect(',')?;
        }
        self.exit();
        Ok(Value::from_struct(fields, StructOrdering::Unordered))
    }

    fn read_lob(&mut self) -> Result<Value> {
        let loc = self.cursor.location();
        self.cursor.bump();
        self.cursor.bump();
        self.cursor.skip_ws()?;
        let value = if self.cursor.peek().1 == '"' {
            let text = self.read_quoted('"')?;
            let bytes = text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).ok())
                .collect::<Option<Vec<u8>>>()
                .ok_or_else(|| {
                    self.error(ErrorCode::LexerInvalidLiteral, loc, "clob text must be 8-bit")
                })?;
            Value::Clob(bytes.into())
        } else {
            let encoded: String = self
                .cursor
                .take_while(|c| c != '}')
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect();
            let bytes = data_encoding::BASE64
                .decode(encoded.as_bytes())
                .map_err(|e| self.error(ErrorCode::LexerInvalidLiteral, loc, &format!("invalid base64: {e}")))?;
            Value::Blob(bytes.into())
        };
        self.expect('}')?;
        if !self.cursor.eat('}') {
            return Err(self.unexpected("`}}`"));
        }
        Ok(value)
    }

    fn apply_annotations(
        &self,
        annotations: &[String],
        value: Value,
        loc: SourceLocation,
    ) -> Result<Value> {
        let mismatch = |annotation: &str| {
            self.error(
                ErrorCode::ParseUnexpectedToken,
                loc,
                &format!("`{annotation}` cannot annotate {}", value.kind()),
            )
        };
        let Some(annotation) = annotations.first() else {
            return Ok(value);
        };
        match annotation.as_str() {
            MISSING_ANNOTATION => match &value {
                Value::Null(None) => Ok(Value::Missing),
                _ => Err(mismatch(MISSING_ANNOTATION)),
            },
            BAG_ANNOTATION => match &value {
                Value::List(items) => Ok(Value::Bag(items.clone())),
                Value::Null(Some(Kind::List)) => Ok(Value::Null(Some(Kind::Bag))),
                _ => Err(mismatch(BAG_ANNOTATION)),
            },
            DATE_ANNOTATION => match &value {
                Value::Timestamp(ts) if ts.precision() == TimestampPrecision::Day => {
                    Ok(Value::Date(ts.date()))
                }
                Value::Null(Some(Kind::Timestamp)) => Ok(Value::Null(Some(Kind::Date))),
                _ => Err(mismatch(DATE_ANNOTATION)),
            },
            TIME_ANNOTATION => match &value {
                Value::Struct(_) => self
                    .decode_time(&value)
                    .map(Value::Time)
                    .ok_or_else(|| mismatch(TIME_ANNOTATION)),
                Value::Null(Some(Kind::Struct)) => Ok(Value::Null(Some(Kind::Time))),
                _ => Err(mismatch(TIME_ANNOTATION)),
            },
            ORDERED_ANNOTATION => match &value {
                Value::Struct(s) => Ok(Value::from_struct(
                    s.fields().to_vec(),
                    StructOrdering::Ordered,
                )),
                _ => Err(mismatch(ORDERED_ANNOTATION)),
            },
            _ => Ok(value),
        }
    }

    fn decode_time(&self, value: &Value) -> Option<Time> {
        let s = value.as_struct()?;
        let int_field = |name: &str| -> Option<i64> {
            let (_, v) = s.fields().iter().find(|(n, _)| n.as_ref() == name)?;
            v.as_i64()
        };
        let hour = u32::try_from(int_field("hour")?).ok()?;
        let minute = u32::try_from(int_field("minute")?).ok()?;
        let (_, second) = s.fields().iter().find(|(n, _)| n.as_ref() == "second")?;
        let second = match second {
            Value::Int(i) => i.to_decimal(),
            Value::Decimal(d) => (**d).clone(),
            _ => return None,
        };
        if decimal_magnitude_digits(&second) > 2 {
            return None;
        }
        let (_, scale) = second.as_bigint_and_exponent();
        let precision = u8::try_from(scale.clamp(0, 9)).ok()?;
        let (nanos_total, _) = round_half_up(&second, 9).as_bigint_and_exponent();
        let billion = BigInt::from(1_000_000_000u32);
        let whole = (&nanos_total / &billion).to_u32()?;
        let nanos = (&nanos_total % &billion).to_u32()?;

        let offset = match (int_field("timezone_hour"), int_field("timezone_minute")) {
            (Some(h), Some(m)) => Some(i32::try_from(h * 60 + m).ok()?),
            (None, None) => None,
            _ => return None,
        };
        Time::from_hms_nano(hour, minute, whole, nanos, precision, offset)
    }
}
