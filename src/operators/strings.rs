// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use super::{incompatible_operands, propagate_unknown};
use crate::error::{Error, ErrorCode, Property, Result};
use crate::value::Value;
use crate::Rc;

use regex::Regex;

/// `a || b`. Either operand may be a STRING or SYMBOL; the result is a STRING.
pub fn concat(a: &Value, b: &Value) -> Result<Value> {
    if let Some(unknown) = propagate_unknown([a, b]) {
        return Ok(unknown);
    }
    match (a.as_text(), b.as_text()) {
        (Some(x), Some(y)) => {
            let mut s = String::with_capacity(x.len() + y.len());
            s.push_str(x);
            s.push_str(y);
            Ok(Value::String(s.into()))
        }
        _ => Err(incompatible_operands("||", &[a, b])),
    }
}

/// A compiled `LIKE` pattern with its optional escape character.
#[derive(Debug, Clone)]
pub struct LikeMatcher {
    pattern: Rc<str>,
    escape: Option<char>,
    regex: Regex,
}

fn escape_error(pattern: &str, escape: &str, msg: &str) -> Error {
    Error::new(ErrorCode::EvaluatorLikePatternInvalidEscapeSequence, msg)
        .with_property(Property::LikePattern, pattern)
        .with_property(Property::LikeEscape, escape)
}

impl LikeMatcher {
    /// Compile `pattern`. `%` matches any sequence and `_` exactly one code point.
    ///
    /// The escape must be a single code point and may only precede `%`, `_` or itself.
    pub fn new(pattern: &str, escape: Option<&str>) -> Result<Self> {
        let escape = match escape {
            None => None,
            Some(e) => {
                let mut chars = e.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(c),
                    _ => {
                        return Err(escape_error(
                            pattern,
                            e,
                            "the escape must be exactly one character",
                        ))
                    }
                }
            }
        };

        let mut re = String::with_capacity(pattern.len() + 8);
        re.push_str("(?s)^");
        let mut chars = pattern.chars();
        while let Some(c) = chars.next() {
            if Some(c) == escape {
                match chars.next() {
                    Some(next) if next == '%' || next == '_' || Some(next) == escape => {
                        re.push_str(&regex::escape(next.encode_utf8(&mut [0; 4])));
                    }
                    _ => {
                        let e = escape.map(String::from).unwrap_or_default();
                        return Err(escape_error(
                            pattern,
                            &e,
                            "the escape may only precede '%', '_' or itself",
                        ));
                    }
                }
                continue;
            }
            match c {
                '%' => re.push_str(".*"),
                '_' => re.push('.'),
                _ => re.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
            }
        }
        re.push('$');

        let regex = Regex::new(&re)
            .map_err(|e| Error::internal(format!("LIKE pattern did not compile: {e}")))?;
        Ok(Self {
            pattern: pattern.into(),
            escape,
            regex,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn escape(&self) -> Option<char> {
        self.escape
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

fn invalid_inputs(value: &Value, pattern: &Value, escape: Option<&Value>) -> Error {
    let mut err = Error::new(
        ErrorCode::EvaluatorLikeInvalidInputs,
        "LIKE needs text value, pattern and escape",
    )
    .with_property(Property::LikeValue, value.to_string())
    .with_property(Property::LikePattern, pattern.to_string());
    if let Some(e) = escape {
        err = err.with_property(Property::LikeEscape, e.to_string());
    }
    err
}

/// `value LIKE pattern [ESCAPE escape]` with the pattern compiled on each call.
pub fn like(value: &Value, pattern: &Value, escape: Option<&Value>) -> Result<Value> {
    if let Some(unknown) = propagate_unknown([value, pattern].into_iter().chain(escape)) {
        return Ok(unknown);
    }
    let (Some(text), Some(p)) = (value.as_text(), pattern.as_text()) else {
        return Err(invalid_inputs(value, pattern, escape));
    };
    let e = match escape {
        Some(e) => Some(e.as_text().ok_or_else(|| invalid_inputs(value, pattern, escape))?),
        None => None,
    };
    let matcher = LikeMatcher::new(p, e)?;
    Ok(Value::Bool(matcher.is_match(text)))
}

/// `value LIKE` a pattern compiled ahead of time.
pub fn like_with(value: &Value, matcher: &LikeMatcher) -> Result<Value> {
    if let Some(unknown) = propagate_unknown([value]) {
        return Ok(unknown);
    }
    match value.as_text() {
        Some(text) => Ok(Value::Bool(matcher.is_match(text))),
        None => Err(Error::new(
            ErrorCode::EvaluatorLikeInvalidInputs,
            "LIKE needs a text value",
        )
        .with_property(Property::LikeValue, value.to_string())
        .with_property(Property::LikePattern, matcher.pattern())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(pattern: &str, escape: Option<&str>, text: &str) -> bool {
        LikeMatcher::new(pattern, escape).unwrap().is_match(text)
    }

    #[test]
    fn wildcards() {
        assert!(matches("a%", None, "abc"));
        assert!(matches("a_c", None, "abc"));
        assert!(matches("_", None, "é"));
        assert!(!matches("a_c", None, "abbc"));
        assert!(matches("%", None, ""));
        assert!(matches("a.c", None, "a.c"));
        assert!(!matches("a.c", None, "abc"));
        assert!(matches("%x%", None, "line\nx"));
    }

    #[test]
    fn escapes() {
        assert!(matches("100\\%", Some("\\"), "100%"));
        assert!(!matches("100\\%", Some("\\"), "1000"));
        assert!(matches("a!_b!!", Some("!"), "a_b!"));
        for (pattern, escape) in [("a!b", "!"), ("a!", "!"), ("a", ""), ("a", "!!")] {
            let err = LikeMatcher::new(pattern, Some(escape)).unwrap_err();
            assert_eq!(err.code(), ErrorCode::EvaluatorLikePatternInvalidEscapeSequence);
        }
    }

    #[test]
    fn operands() {
        let abc = Value::string("abc");
        assert_eq!(like(&abc, &Value::symbol("a%"), None).unwrap(), Value::from(true));
        assert!(like(&abc, &Value::NULL, Some(&Value::Missing)).unwrap().is_missing());
        assert!(like(&Value::NULL, &Value::string("a"), None).unwrap().is_null());
        let err = like(&Value::from(1), &Value::string("1"), None).unwrap_err();
        assert_eq!(err.code(), ErrorCode::EvaluatorLikeInvalidInputs);
        let err = like(&abc, &Value::string("a"), Some(&Value::from(1))).unwrap_err();
        assert_eq!(err.code(), ErrorCode::EvaluatorLikeInvalidInputs);

        let m = LikeMatcher::new("%c", None).unwrap();
        assert_eq!(like_with(&abc, &m).unwrap(), Value::from(true));
        assert!(like_with(&Value::from(1), &m).is_err());
    }

    #[test]
    fn concatenation() {
        let out = concat(&Value::string("ab"), &Value::symbol("cd")).unwrap();
        assert_eq!(out, Value::string("abcd"));
        assert!(concat(&Value::string("ab"), &Value::NULL).unwrap().is_null());
        assert!(concat(&Value::string("ab"), &Value::from(1)).is_err());
    }
}
