// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::error::{Error, ErrorCode, Property, Result};

use core::fmt::{self, Debug, Formatter};
use core::iter::Peekable;
use core::str::CharIndices;

use serde::Serialize;

/// 1-based line and column of a construct in some source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl Default for SourceLocation {
    fn default() -> Self {
        Self { line: 1, column: 1 }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Character cursor shared by the type-name lexer and the value text reader.
///
/// Tracks line and column as characters are consumed.
#[derive(Clone)]
pub struct Cursor<'source> {
    source: &'source str,
    iter: Peekable<CharIndices<'source>>,
    line: u32,
    col: u32,
}

impl<'source> Cursor<'source> {
    pub fn new(source: &'source str) -> Self {
        Self {
            source,
            iter: source.char_indices().peekable(),
            line: 1,
            col: 1,
        }
    }

    pub fn source(&self) -> &'source str {
        self.source
    }

    pub fn peek(&mut self) -> (usize, char) {
        match self.iter.peek() {
            Some((index, chr)) => (*index, *chr),
            _ => (self.source.len(), '\x00'),
        }
    }

    pub fn peekahead(&mut self, n: usize) -> (usize, char) {
        match self.iter.clone().nth(n) {
            Some((index, chr)) => (index, chr),
            _ => (self.source.len(), '\x00'),
        }
    }

    pub fn at_end(&mut self) -> bool {
        self.iter.peek().is_none()
    }

    pub fn bump(&mut self) -> Option<char> {
        let (_, ch) = self.iter.next()?;
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    pub fn eat(&mut self, ch: char) -> bool {
        if !self.at_end() && self.peek().1 == ch {
            self.bump();
            true
        } else {
            false
        }
    }

    pub fn location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.col)
    }

    /// Skips whitespace as well as `//` and `/* */` comments.
    pub fn skip_ws(&mut self) -> Result<()> {
        loop {
            let ch = self.peek().1;
            if self.at_end() {
                return Ok(());
            }
            if ch.is_whitespace() {
                self.bump();
            } else if ch == '/' && self.peekahead(1).1 == '/' {
                while !self.at_end() && self.peek().1 != '\n' {
                    self.bump();
                }
            } else if ch == '/' && self.peekahead(1).1 == '*' {
                let loc = self.location();
                self.bump();
                self.bump();
                loop {
                    if self.at_end() {
                        return Err(Error::new(
                            ErrorCode::ParseUnexpectedEndOfInput,
                            "unterminated comment",
                        )
                        .at(loc));
                    }
                    if self.peek().1 == '*' && self.peekahead(1).1 == '/' {
                        self.bump();
                        self.bump();
                        break;
                    }
                    self.bump();
                }
            } else {
                return Ok(());
            }
        }
    }

    /// Consume characters while `pred` holds and return the consumed slice.
    pub fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'source str {
        let start = self.peek().0;
        while !self.at_end() && pred(self.peek().1) {
            self.bump();
        }
        let end = self.peek().0;
        &self.source[start..end]
    }
}

#[derive(Clone)]
pub struct Span<'source> {
    pub text: &'source str,
    pub line: u32,
    pub col: u32,
}

impl Span<'_> {
    pub fn location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.col)
    }

    pub fn error(&self, code: ErrorCode, msg: &str) -> Error {
        Error::new(code, msg)
            .at(self.location())
            .with_property(Property::TokenString, self.text)
    }
}

impl Debug for Span<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}, {:?}", self.line, self.col, self.text)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TokenKind {
    Ident,
    Number,
    Symbol,
    Eof,
}

#[derive(Debug, Clone)]
pub struct Token<'source>(pub TokenKind, pub Span<'source>);

/// Tokenizer for type names such as `DECIMAL(5, 2)` or `TIME WITH TIME ZONE`.
#[derive(Clone)]
pub struct Lexer<'source> {
    cursor: Cursor<'source>,
}

impl<'source> Lexer<'source> {
    pub fn new(source: &'source str) -> Self {
        Self {
            cursor: Cursor::new(source),
        }
    }

    pub fn next_token(&mut self) -> Result<Token<'source>> {
        self.cursor.skip_ws()?;
        let SourceLocation { line, column: col } = self.cursor.location();
        let (start, ch) = self.cursor.peek();

        if self.cursor.at_end() {
            return Ok(Token(
                TokenKind::Eof,
                Span {
                    text: "<eof>",
                    line,
                    col,
                },
            ));
        }

        let (kind, text) = match ch {
            '(' | ')' | ',' => {
                self.cursor.bump();
                (TokenKind::Symbol, &self.cursor.source()[start..start + 1])
            }
            _ if ch.is_ascii_digit() => (
                TokenKind::Number,
                self.cursor.take_while(|c| c.is_ascii_digit()),
            ),
            _ if ch.is_alphabetic() || ch == '_' => (
                TokenKind::Ident,
                self.cursor.take_while(|c| c.is_alphanumeric() || c == '_'),
            ),
            _ => {
                let end = start + ch.len_utf8();
                return Err(Span {
                    text: &self.cursor.source()[start..end],
                    line,
                    col,
                }
                .error(ErrorCode::LexerInvalidLiteral, "invalid character"));
            }
        };

        Ok(Token(kind, Span { text, line, col }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<(TokenKind, String)> {
        let mut lexer = Lexer::new(text);
        let mut tokens = vec![];
        loop {
            let Token(kind, span) = lexer.next_token().unwrap();
            if kind == TokenKind::Eof {
                return tokens;
            }
            tokens.push((kind, span.text.to_string()));
        }
    }

    #[test]
    fn tokenizes_parameterized_types() {
        assert_eq!(
            kinds("decimal( 5,2 )"),
            vec![
                (TokenKind::Ident, "decimal".to_string()),
                (TokenKind::Symbol, "(".to_string()),
                (TokenKind::Number, "5".to_string()),
                (TokenKind::Symbol, ",".to_string()),
                (TokenKind::Number, "2".to_string()),
                (TokenKind::Symbol, ")".to_string()),
            ]
        );
    }

    #[test]
    fn reports_location_of_bad_character() {
        let mut lexer = Lexer::new("INT\n  #");
        lexer.next_token().unwrap();
        let err = lexer.next_token().unwrap_err();
        assert_eq!(err.code(), ErrorCode::LexerInvalidLiteral);
        assert_eq!(err.location(), Some(SourceLocation::new(2, 3)));
    }

    #[test]
    fn cursor_skips_comments() {
        let mut c = Cursor::new("  // line\n /* block */ x");
        c.skip_ws().unwrap();
        assert_eq!(c.peek().1, 'x');
        assert_eq!(c.location(), SourceLocation::new(2, 14));
    }
}
