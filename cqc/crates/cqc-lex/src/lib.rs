//! Lexer: turns preprocessed C source bytes into a flat token sequence.
//!
//! One pass, non-speculative, no restart (spec.md §4.1). The parser clones
//! and walks a cursor over the resulting `Vec<Token>`; the lexer itself
//! never backtracks.

pub mod cursor;
pub mod lexer;
pub mod token;

pub use lexer::{tokenize, Lexer, MAX_TOKEN_LEN};
pub use token::{keyword_from_ident, Token, TokenKind};
