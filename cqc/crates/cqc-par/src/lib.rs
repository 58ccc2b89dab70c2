//! Parser: predictive recursive descent over the lexer's token sequence,
//! with bounded backtracking (spec.md §4.2).
//!
//! Every rule snapshots [`Cursor`] before attempting a match, commits by
//! writing the advanced cursor back into `self.cursor` on success, and
//! otherwise leaves `self.cursor` untouched so a caller can try an
//! alternative. The result is a single [`Ast`] arena rooted at a `file`
//! node.

pub mod ast;
pub mod cursor;
mod expr;
mod items;
mod stmt;
mod types;

use cqc_lex::{Token, TokenKind};
use cqc_util::{ParseError, Symbol};

pub use ast::{Ast, BinOp, Node, NodeId, NodeKind, Param, TypeExpr, TypeKeyword, UnaryOp};
pub use cursor::Cursor;

pub struct Parser<'t> {
    cursor: Cursor<'t>,
    ast: Ast,
}

impl<'t> Parser<'t> {
    pub fn new(tokens: &'t [Token]) -> Self {
        Self {
            cursor: Cursor::new(tokens),
            ast: Ast::new(),
        }
    }

    fn unexpected(&self, expected: impl Into<String>) -> ParseError {
        ParseError::UnexpectedToken {
            span: self.cursor.peek().span,
            expected: expected.into(),
        }
    }

    /// Consumes the current token if it matches `kind`, else fails without
    /// advancing.
    fn eat(&mut self, kind: &TokenKind) -> Result<&'t Token, ParseError> {
        if self.cursor.at(kind) {
            Ok(self.cursor.bump())
        } else {
            Err(self.unexpected(kind.describe()))
        }
    }

    fn at(&self, kind: &TokenKind) -> bool {
        self.cursor.at(kind)
    }

    fn eat_ident(&mut self) -> Result<Symbol, ParseError> {
        match self.cursor.peek_kind().clone() {
            TokenKind::Ident(s) => {
                self.cursor.bump();
                Ok(s)
            }
            _ => Err(self.unexpected("an identifier")),
        }
    }

    /// Runs `f` against a cloned cursor; only commits the advance if `f`
    /// succeeds. This is the cursor-level form of "clone, try, commit".
    fn speculate<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        let checkpoint = self.cursor;
        match f(self) {
            Ok(value) => Ok(value),
            Err(e) => {
                self.cursor = checkpoint;
                Err(e)
            }
        }
    }

    pub fn into_ast(self) -> Ast {
        self.ast
    }
}

/// Parses a full translation unit: a sequence of top-level declarations,
/// consuming the entire token stream (spec.md §4.2, §8's totality
/// invariant).
pub fn parse_translation_unit(tokens: &[Token]) -> Result<Ast, ParseError> {
    let mut parser = Parser::new(tokens);
    let start_span = parser.cursor.peek().span;
    let mut items = Vec::new();

    while !parser.cursor.is_eof() {
        let item = parser.parse_top_level_item()?;
        items.push(item);
    }

    if !parser.cursor.is_eof() {
        return Err(ParseError::TrailingTokens {
            span: parser.cursor.peek().span,
        });
    }

    let root = parser.ast.push(NodeKind::File { items }, start_span);
    parser.ast.set_root(root);
    Ok(parser.into_ast())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cqc_util::FileId;

    fn parse(src: &str) -> Result<Ast, ParseError> {
        let tokens = cqc_lex::tokenize(src, FileId::DUMMY).expect("lex failed");
        parse_translation_unit(&tokens)
    }

    #[test]
    fn empty_source_parses_to_empty_file() {
        let ast = parse("").unwrap();
        assert!(ast.check_child_ordering());
    }

    #[test]
    fn forward_decl_then_definition() {
        let ast = parse("int f(int a); int f(int a) { return a; }").unwrap();
        assert!(ast.check_child_ordering());
    }

    #[test]
    fn recursive_factorial_parses() {
        let src = "int fact(int n) { if (n <= 1) { return 1; } return n * fact(n - 1); }";
        let ast = parse(src).unwrap();
        assert!(ast.check_child_ordering());
    }

    #[test]
    fn while_loop_with_post_increment_parses() {
        let src = "int main(void) { int i; i = 0; while (i < 3) { i++; } return i; }";
        let ast = parse(src).unwrap();
        assert!(ast.check_child_ordering());
    }

    #[test]
    fn trailing_comma_in_params_is_rejected() {
        let err = parse("int f(int a,) { return a; }").unwrap_err();
        assert!(matches!(err, ParseError::TrailingComma { .. }));
    }

    #[test]
    fn garbage_after_top_level_item_is_rejected() {
        let err = parse("int f(void) { return 0; } )").unwrap_err();
        assert!(matches!(
            err,
            ParseError::TrailingTokens { .. } | ParseError::UnexpectedToken { .. }
        ));
    }

    #[test]
    fn variadic_must_be_last() {
        let err = parse("int f(..., int a) { return a; }").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { .. }));
    }
}
