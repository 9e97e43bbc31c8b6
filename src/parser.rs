// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::datetime::MAX_TIME_PRECISION;
use crate::error::{Error, ErrorCode, Property, Result};
use crate::lexer::{Lexer, Span, Token, TokenKind};
use crate::registry::TypeRegistry;
use crate::types::{DecimalParams, IntWidth, StringBound, TypeDescriptor};

/// Recursive-descent parser for type names.
#[derive(Clone)]
pub struct TypeParser<'source> {
    lexer: Lexer<'source>,
    tok: Token<'source>,
    registry: Option<&'source TypeRegistry>,
}

impl<'source> TypeParser<'source> {
    pub fn new(source: &'source str, registry: Option<&'source TypeRegistry>) -> Result<Self> {
        let mut lexer = Lexer::new(source);
        let tok = lexer.next_token()?;
        Ok(Self {
            lexer,
            tok,
            registry,
        })
    }

    fn next_token(&mut self) -> Result<()> {
        self.tok = self.lexer.next_token()?;
        Ok(())
    }

    fn is_symbol(&self, s: &str) -> bool {
        self.tok.0 == TokenKind::Symbol && self.tok.1.text == s
    }

    fn is_keyword(&self, kw: &str) -> bool {
        self.tok.0 == TokenKind::Ident && self.tok.1.text.eq_ignore_ascii_case(kw)
    }

    fn unexpected(&self, expected: &str) -> Error {
        let code = if self.tok.0 == TokenKind::Eof {
            ErrorCode::ParseUnexpectedEndOfInput
        } else {
            ErrorCode::ParseUnexpectedToken
        };
        self.tok
            .1
            .error(code, &format!("expecting {expected}"))
            .with_property(Property::ExpectedToken, expected)
    }

    fn expect_keyword(&mut self, kw: &str) -> Result<()> {
        if !self.is_keyword(kw) {
            return Err(self.unexpected(kw));
        }
        self.next_token()
    }

    fn expect_symbol(&mut self, s: &str) -> Result<()> {
        if !self.is_symbol(s) {
            return Err(self.unexpected(s));
        }
        self.next_token()
    }

    /// Parse a type and require the input to end there.
    pub fn parse_complete(mut self) -> Result<TypeDescriptor> {
        let t = self.parse_type()?;
        if self.tok.0 != TokenKind::Eof {
            return Err(self.unexpected("end of type"));
        }
        Ok(t)
    }

    fn parse_params(&mut self) -> Result<Vec<(u32, Span<'source>)>> {
        let mut params = vec![];
        if !self.is_symbol("(") {
            return Ok(params);
        }
        self.next_token()?;
        loop {
            if self.tok.0 != TokenKind::Number {
                return Err(self.unexpected("a number"));
            }
            let span = self.tok.1.clone();
            let n = span.text.parse::<u32>().map_err(|_| {
                span.error(ErrorCode::SemanticInvalidTypeParameter, "type parameter out of range")
            })?;
            params.push((n, span));
            self.next_token()?;
            if self.is_symbol(",") {
                self.next_token()?;
                continue;
            }
            self.expect_symbol(")")?;
            return Ok(params);
        }
    }

    pub fn parse_type(&mut self) -> Result<TypeDescriptor> {
        if self.tok.0 != TokenKind::Ident {
            return Err(self
                .tok
                .1
                .error(ErrorCode::ParseExpectedTypeName, "expecting a type name"));
        }
        let name_span = self.tok.1.clone();
        let mut name = name_span.text.to_ascii_uppercase();
        self.next_token()?;

        if name == "DOUBLE" {
            self.expect_keyword("PRECISION")?;
            name.push_str(" PRECISION");
        } else if name == "CHARACTER" && self.is_keyword("VARYING") {
            self.next_token()?;
            name.push_str(" VARYING");
        }

        let params = self.parse_params()?;
        let invalid_param = |span: &Span<'_>, msg: &str| {
            span.error(ErrorCode::SemanticInvalidTypeParameter, msg)
                .with_property(Property::TypeName, name.as_str())
        };
        let at_most = |n: usize| -> Result<()> {
            match params.get(n) {
                Some((_, span)) => Err(invalid_param(
                    span,
                    &format!("{name} takes at most {n} parameter(s)"),
                )),
                None => Ok(()),
            }
        };
        let positive = |i: usize| -> Result<Option<u32>> {
            match params.get(i) {
                Some((0, span)) => Err(invalid_param(span, "length must be positive")),
                Some((n, _)) => Ok(Some(*n)),
                None => Ok(None),
            }
        };

        let t = match name.as_str() {
            "ANY" => at_most(0).map(|_| TypeDescriptor::Any)?,
            "MISSING" => at_most(0).map(|_| TypeDescriptor::Missing)?,
            "NULL" => at_most(0).map(|_| TypeDescriptor::Null)?,
            "BOOL" | "BOOLEAN" => at_most(0).map(|_| TypeDescriptor::Bool)?,
            "SMALLINT" | "INT2" | "INTEGER2" => {
                at_most(0).map(|_| TypeDescriptor::Int(IntWidth::Small))?
            }
            "INT4" | "INTEGER4" => at_most(0).map(|_| TypeDescriptor::Int(IntWidth::Int4))?,
            "INT" | "INTEGER" | "BIGINT" | "INT8" | "INTEGER8" => {
                at_most(0).map(|_| TypeDescriptor::Int(IntWidth::Int8))?
            }
            "FLOAT" | "REAL" | "DOUBLE PRECISION" => at_most(0).map(|_| TypeDescriptor::Float)?,
            "DECIMAL" | "DEC" | "NUMERIC" => {
                at_most(2)?;
                match positive(0)? {
                    None => TypeDescriptor::Decimal(None),
                    Some(precision) => TypeDescriptor::Decimal(Some(DecimalParams {
                        precision,
                        scale: params.get(1).map_or(0, |(s, _)| *s),
                    })),
                }
            }
            "DATE" => at_most(0).map(|_| TypeDescriptor::Date)?,
            "TIME" => {
                at_most(1)?;
                let precision = match params.first() {
                    Some((p, span)) if *p > u32::from(MAX_TIME_PRECISION) => {
                        return Err(invalid_param(
                            span,
                            &format!("time precision must be at most {MAX_TIME_PRECISION}"),
                        ))
                    }
                    Some((p, _)) => u8::try_from(*p).ok(),
                    None => None,
                };
                let with_time_zone = if self.is_keyword("WITH") {
                    self.next_token()?;
                    self.expect_keyword("TIME")?;
                    self.expect_keyword("ZONE")?;
                    true
                } else {
                    false
                };
                TypeDescriptor::Time {
                    precision,
                    with_time_zone,
                }
            }
            "TIMESTAMP" => at_most(0).map(|_| TypeDescriptor::Timestamp)?,
            "CHAR" | "CHARACTER" => {
                at_most(1)?;
                TypeDescriptor::String(StringBound::Fixed(positive(0)?.unwrap_or(1)))
            }
            "VARCHAR" | "CHARACTER VARYING" => {
                at_most(1)?;
                match positive(0)? {
                    Some(n) => TypeDescriptor::String(StringBound::Varying(n)),
                    None => TypeDescriptor::String(StringBound::Unbounded),
                }
            }
            "STRING" => at_most(0).map(|_| TypeDescriptor::String(StringBound::Unbounded))?,
            "SYMBOL" => at_most(0).map(|_| TypeDescriptor::Symbol)?,
            "CLOB" => at_most(0).map(|_| TypeDescriptor::Clob)?,
            "BLOB" => at_most(0).map(|_| TypeDescriptor::Blob)?,
            "LIST" => at_most(0).map(|_| TypeDescriptor::List)?,
            "SEXP" => at_most(0).map(|_| TypeDescriptor::Sexp)?,
            "STRUCT" | "TUPLE" => at_most(0).map(|_| TypeDescriptor::Struct)?,
            "BAG" => at_most(0).map(|_| TypeDescriptor::Bag)?,
            _ => match self.registry.and_then(|r| r.get(&name)) {
                Some(custom) => at_most(0).map(|_| TypeDescriptor::Custom(custom))?,
                None => {
                    return Err(name_span
                        .error(ErrorCode::SemanticUnknownType, "unknown type")
                        .with_property(Property::TypeName, name.as_str()))
                }
            },
        };
        Ok(t)
    }
}
