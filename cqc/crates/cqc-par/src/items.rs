//! Top-level declarations: a function signature followed by either a
//! block (definition) or `;` (forward declaration) (spec.md §4.2).

use cqc_lex::TokenKind;
use cqc_util::ParseError;

use crate::ast::{NodeKind, Param};
use crate::{NodeId, Parser};

impl<'t> Parser<'t> {
    pub(crate) fn parse_top_level_item(&mut self) -> Result<NodeId, ParseError> {
        let span = self.cursor.peek().span;
        let sig = self.parse_function_signature()?;

        if self.at(&TokenKind::Semi) {
            self.cursor.bump();
            Ok(self.ast.push(NodeKind::Function { sig, body: None }, span))
        } else if self.at(&TokenKind::LBrace) {
            let body = self.parse_block()?;
            Ok(self.ast.push(
                NodeKind::Function {
                    sig,
                    body: Some(body),
                },
                span,
            ))
        } else {
            Err(ParseError::ExpectedBlock {
                span: self.cursor.peek().span,
            })
        }
    }

    /// `type identifier '(' params ')'`. A lone `void` between the parens
    /// means no parameters; a trailing `...` marks variadic and must be
    /// the last slot; a trailing comma with no following parameter is a
    /// parse error.
    fn parse_function_signature(&mut self) -> Result<NodeId, ParseError> {
        let span = self.cursor.peek().span;
        let ret_ty = self.parse_type()?;
        let name = self.eat_ident()?;
        self.eat(&TokenKind::LParen)?;

        let mut params = Vec::new();
        let mut variadic = false;

        let is_lone_void =
            self.at(&TokenKind::KwVoid) && matches!(self.cursor.peek_n(1).kind, TokenKind::RParen);

        if is_lone_void {
            self.cursor.bump();
        } else if !self.at(&TokenKind::RParen) {
            loop {
                if self.at(&TokenKind::Ellipsis) {
                    self.cursor.bump();
                    variadic = true;
                    if self.at(&TokenKind::Comma) {
                        return Err(self.unexpected("')' after the variadic parameter"));
                    }
                    break;
                }

                let pspan = self.cursor.peek().span;
                let ty = self.parse_type()?;
                let pname = self.eat_ident()?;
                params.push(Param {
                    name: pname,
                    ty,
                    span: pspan,
                });

                if self.at(&TokenKind::Comma) {
                    self.cursor.bump();
                    if self.at(&TokenKind::RParen) {
                        return Err(ParseError::TrailingComma {
                            span: self.cursor.peek().span,
                        });
                    }
                    continue;
                }
                break;
            }
        }

        self.eat(&TokenKind::RParen)?;
        Ok(self.ast.push(
            NodeKind::FunctionSignature {
                name,
                ret_ty,
                params,
                variadic,
            },
            span,
        ))
    }
}
