//! The parser's token cursor.
//!
//! A `(sequence, offset)` pair, `Copy` so every rule can snapshot it before
//! attempting a match and restore it verbatim on failure — the "clone,
//! try, commit" discipline spec.md §4.2 requires of the grammar. Modeled
//! after `cqc_lex::cursor::Cursor`'s snapshot/restore shape, one level up
//! the pipeline: a `Token` slice instead of source bytes.

use cqc_lex::{Token, TokenKind};

#[derive(Clone, Copy, Debug)]
pub struct Cursor<'t> {
    tokens: &'t [Token],
    pos: usize,
}

impl<'t> Cursor<'t> {
    pub fn new(tokens: &'t [Token]) -> Self {
        debug_assert!(tokens.last().map_or(false, Token::is_eof));
        Self { tokens, pos: 0 }
    }

    /// The token at the cursor. Never advances past the trailing `Eof`
    /// sentinel every token stream is guaranteed to end with.
    pub fn peek(&self) -> &'t Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    pub fn peek_kind(&self) -> &'t TokenKind {
        &self.peek().kind
    }

    /// Look `n` tokens ahead without moving the cursor.
    pub fn peek_n(&self, n: usize) -> &'t Token {
        let idx = (self.pos + n).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    pub fn is_eof(&self) -> bool {
        self.peek().is_eof()
    }

    /// Advances past the current token and returns it. A no-op past `Eof`.
    pub fn bump(&mut self) -> &'t Token {
        let tok = self.peek();
        if !self.is_eof() {
            self.pos += 1;
        }
        tok
    }

    pub fn at(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }
}
