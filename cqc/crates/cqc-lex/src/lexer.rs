//! Single-pass lexer: source bytes to a finite token sequence.
//!
//! Grounded on `examples/original_source/src/lex.c`'s dispatch order: skip
//! whitespace, then try integer literal, string literal, character literal,
//! identifier/keyword, multi-character punctuation, single-character
//! punctuation — in that order, non-speculatively (spec.md §4.1).

use cqc_util::error::LexError;
use cqc_util::{FileId, Span, Symbol};

use crate::cursor::Cursor;
use crate::token::{keyword_from_ident, Token, TokenKind};

/// Identifiers and integer literals longer than this many bytes are
/// rejected (spec.md §3: "bounded name length acceptable, ≤31 bytes").
pub const MAX_TOKEN_LEN: usize = 31;

pub struct Lexer<'a> {
    cursor: Cursor<'a>,
    file_id: FileId,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, file_id: FileId) -> Self {
        Self {
            cursor: Cursor::new(source),
            file_id,
        }
    }

    /// Tokenize the whole input, ending in a single trailing `Eof` token.
    /// Non-speculative and non-restartable: the first lexical error aborts
    /// the whole pass (spec.md §4.1, §7.1).
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            self.cursor.skip_whitespace();
            let span = self.here();
            if self.cursor.is_at_end() {
                tokens.push(Token::new(TokenKind::Eof, span));
                return Ok(tokens);
            }
            tokens.push(self.next_token()?);
        }
    }

    fn here(&self) -> Span {
        Span::with_file(
            self.cursor.position(),
            self.cursor.position(),
            self.file_id,
            self.cursor.line(),
            self.cursor.column(),
        )
    }

    fn spanning(&self, start: usize, line: u32, column: u32) -> Span {
        Span::with_file(start, self.cursor.position(), self.file_id, line, column)
    }

    fn next_token(&mut self) -> Result<Token, LexError> {
        let start = self.cursor.position();
        let line = self.cursor.line();
        let column = self.cursor.column();
        let c = self.cursor.current_char();

        if c.is_ascii_digit() {
            return self.lex_int(start, line, column);
        }
        if c == '"' {
            return self.lex_string(start, line, column);
        }
        if c == '\'' {
            return self.lex_char(start, line, column);
        }
        if c.is_ascii_alphabetic() || c == '_' {
            return self.lex_ident_or_keyword(start, line, column);
        }
        self.lex_punct(start, line, column)
    }

    fn lex_int(&mut self, start: usize, line: u32, column: u32) -> Result<Token, LexError> {
        while self.cursor.current_char().is_ascii_digit() {
            self.cursor.advance();
        }
        let text = self.cursor.slice_from(start);
        let span = self.spanning(start, line, column);
        if text.len() > MAX_TOKEN_LEN {
            return Err(LexError::TokenTooLong {
                span,
                kind: "integer literal",
                max: MAX_TOKEN_LEN,
            });
        }
        // atoi-style: bounded length already rules out i64 overflow for any
        // value this lexer accepts.
        let value: i64 = text.parse().unwrap_or(i64::MAX);
        Ok(Token::new(TokenKind::IntLiteral(value), span))
    }

    /// Scan from the opening quote (already at `self.cursor`) to the
    /// matching closing quote, applying `\n \t \\ \"` escapes. Returns the
    /// unescaped bytes and the span of the whole literal including quotes.
    fn lex_quoted(&mut self, start: usize, line: u32, column: u32, quote: char) -> Result<(Vec<u8>, Span), LexError> {
        self.cursor.advance(); // opening quote
        let mut bytes = Vec::new();
        loop {
            if self.cursor.is_at_end() {
                return Err(LexError::UnterminatedLiteral {
                    span: self.spanning(start, line, column),
                });
            }
            let c = self.cursor.current_char();
            if c == quote {
                self.cursor.advance();
                break;
            }
            if c == '\n' {
                return Err(LexError::UnterminatedLiteral {
                    span: self.spanning(start, line, column),
                });
            }
            if c == '\\' {
                self.cursor.advance();
                if self.cursor.is_at_end() {
                    return Err(LexError::UnterminatedLiteral {
                        span: self.spanning(start, line, column),
                    });
                }
                let escape = self.cursor.current_char();
                let unescaped = match escape {
                    'n' => b'\n',
                    't' => b'\t',
                    '\\' => b'\\',
                    '"' => b'"',
                    '\'' => b'\'',
                    _ => {
                        return Err(LexError::UnknownEscape {
                            span: self.spanning(start, line, column),
                            escape,
                        })
                    }
                };
                bytes.push(unescaped);
                self.cursor.advance();
            } else {
                let mut buf = [0u8; 4];
                bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                self.cursor.advance();
            }
        }
        Ok((bytes, self.spanning(start, line, column)))
    }

    fn lex_string(&mut self, start: usize, line: u32, column: u32) -> Result<Token, LexError> {
        let (bytes, span) = self.lex_quoted(start, line, column, '"')?;
        let text = String::from_utf8_lossy(&bytes).into_owned();
        Ok(Token::new(TokenKind::StringLiteral(Symbol::intern(&text)), span))
    }

    fn lex_char(&mut self, start: usize, line: u32, column: u32) -> Result<Token, LexError> {
        let (bytes, span) = self.lex_quoted(start, line, column, '\'')?;
        if bytes.len() != 1 {
            return Err(LexError::InvalidCharLiteral {
                span,
                len: bytes.len(),
            });
        }
        Ok(Token::new(TokenKind::CharLiteral(bytes[0]), span))
    }

    fn lex_ident_or_keyword(&mut self, start: usize, line: u32, column: u32) -> Result<Token, LexError> {
        while {
            let c = self.cursor.current_char();
            c.is_ascii_alphanumeric() || c == '_'
        } {
            self.cursor.advance();
        }
        let text = self.cursor.slice_from(start);
        let span = self.spanning(start, line, column);
        if text.len() > MAX_TOKEN_LEN {
            return Err(LexError::TokenTooLong {
                span,
                kind: "identifier",
                max: MAX_TOKEN_LEN,
            });
        }
        let kind = keyword_from_ident(text).unwrap_or_else(|| TokenKind::Ident(Symbol::intern_known(text)));
        Ok(Token::new(kind, span))
    }

    fn lex_punct(&mut self, start: usize, line: u32, column: u32) -> Result<Token, LexError> {
        // Multi-character forms first, in the spec's listed order.
        let kind = if self.cursor.remaining().starts_with("...") {
            self.cursor.advance_n(3);
            TokenKind::Ellipsis
        } else if self.cursor.remaining().starts_with("==") {
            self.cursor.advance_n(2);
            TokenKind::EqEq
        } else if self.cursor.remaining().starts_with("!=") {
            self.cursor.advance_n(2);
            TokenKind::NotEq
        } else if self.cursor.remaining().starts_with("<=") {
            self.cursor.advance_n(2);
            TokenKind::LtEq
        } else if self.cursor.remaining().starts_with("+=") {
            self.cursor.advance_n(2);
            TokenKind::PlusEq
        } else if self.cursor.remaining().starts_with("++") {
            self.cursor.advance_n(2);
            TokenKind::PlusPlus
        } else if self.cursor.remaining().starts_with("&&") {
            self.cursor.advance_n(2);
            TokenKind::AmpAmp
        } else {
            let c = self.cursor.current_char();
            match c {
                '+' => {
                    self.cursor.advance();
                    TokenKind::Plus
                }
                '-' => {
                    self.cursor.advance();
                    TokenKind::Minus
                }
                '*' => {
                    self.cursor.advance();
                    TokenKind::Star
                }
                '/' => {
                    self.cursor.advance();
                    TokenKind::Slash
                }
                '=' => {
                    self.cursor.advance();
                    TokenKind::Assign
                }
                '<' => {
                    self.cursor.advance();
                    TokenKind::Lt
                }
                '>' => {
                    self.cursor.advance();
                    TokenKind::Gt
                }
                '&' => {
                    self.cursor.advance();
                    TokenKind::Amp
                }
                '!' => {
                    self.cursor.advance();
                    TokenKind::Bang
                }
                ';' => {
                    self.cursor.advance();
                    TokenKind::Semi
                }
                ',' => {
                    self.cursor.advance();
                    TokenKind::Comma
                }
                '(' => {
                    self.cursor.advance();
                    TokenKind::LParen
                }
                ')' => {
                    self.cursor.advance();
                    TokenKind::RParen
                }
                '{' => {
                    self.cursor.advance();
                    TokenKind::LBrace
                }
                '}' => {
                    self.cursor.advance();
                    TokenKind::RBrace
                }
                '[' => {
                    self.cursor.advance();
                    TokenKind::LBracket
                }
                ']' => {
                    self.cursor.advance();
                    TokenKind::RBracket
                }
                _ => {
                    let byte = self.cursor.current_byte().unwrap_or(0);
                    return Err(LexError::UnrecognizedByte {
                        span: self.here(),
                        byte,
                    });
                }
            }
        };
        Ok(Token::new(kind, self.spanning(start, line, column)))
    }
}

/// Tokenize `source` in one call — the entry point the parser and the
/// driver's `compile` function use.
pub fn tokenize(source: &str, file_id: FileId) -> Result<Vec<Token>, LexError> {
    Lexer::new(source, file_id).tokenize()
}
