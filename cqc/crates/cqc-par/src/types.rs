//! Type grammar: `[unsigned] (int|long|char|void|float) '*'*` (spec.md
//! §4.2 "Type grammar").

use cqc_lex::TokenKind;
use cqc_util::ParseError;

use crate::ast::{NodeKind, TypeExpr, TypeKeyword};
use crate::{NodeId, Parser};

impl<'t> Parser<'t> {
    /// True if the current token could begin a type (used to disambiguate
    /// a variable declaration from an expression-statement at the start of
    /// a block).
    pub(crate) fn at_type_start(&self) -> bool {
        self.cursor.peek_kind().is_type_keyword()
    }

    pub(crate) fn parse_type(&mut self) -> Result<NodeId, ParseError> {
        let start = self.cursor.peek().span;
        let is_unsigned = if self.at(&TokenKind::KwUnsigned) {
            self.cursor.bump();
            true
        } else {
            false
        };

        let keyword = match self.cursor.peek_kind() {
            TokenKind::KwInt => TypeKeyword::Int,
            TokenKind::KwLong => TypeKeyword::Long,
            TokenKind::KwChar => TypeKeyword::Char,
            TokenKind::KwVoid => TypeKeyword::Void,
            TokenKind::KwFloat => TypeKeyword::Float,
            _ => return Err(self.unexpected("a type keyword")),
        };
        self.cursor.bump();

        let mut pointer_depth = 0u32;
        while self.at(&TokenKind::Star) {
            self.cursor.bump();
            pointer_depth += 1;
        }

        Ok(self.ast.push(
            NodeKind::TypeExpr(TypeExpr {
                keyword,
                is_unsigned,
                pointer_depth,
            }),
            start,
        ))
    }
}
