//! Expression grammar, layered by precedence from highest to lowest:
//! primary, postfix, multiplicative, additive, relational/equality
//! (spec.md §4.2). Assignment and `+=` are statement forms, parsed in
//! `stmt.rs`, and never reachable from here.

use cqc_lex::TokenKind;
use cqc_util::ParseError;

use crate::ast::{BinOp, NodeKind, UnaryOp};
use crate::{NodeId, Parser};

impl<'t> Parser<'t> {
    /// The root of the expression grammar: a left-associative chain of
    /// relational/equality comparisons over additive expressions.
    pub(crate) fn parse_expr(&mut self) -> Result<NodeId, ParseError> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.cursor.peek_kind() {
                TokenKind::Lt => BinOp::Lt,
                TokenKind::Gt => BinOp::Gt,
                TokenKind::LtEq => BinOp::Le,
                TokenKind::EqEq => BinOp::Eq,
                TokenKind::NotEq => BinOp::Ne,
                _ => break,
            };
            let span = self.cursor.peek().span;
            self.cursor.bump();
            let rhs = self.parse_additive()?;
            lhs = self.ast.push(NodeKind::Binary { op, lhs, rhs }, span);
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> Result<NodeId, ParseError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.cursor.peek_kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            let span = self.cursor.peek().span;
            self.cursor.bump();
            let rhs = self.parse_multiplicative()?;
            lhs = self.ast.push(NodeKind::Binary { op, lhs, rhs }, span);
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<NodeId, ParseError> {
        let mut lhs = self.parse_postfix()?;
        loop {
            let op = match self.cursor.peek_kind() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                _ => break,
            };
            let span = self.cursor.peek().span;
            self.cursor.bump();
            let rhs = self.parse_postfix()?;
            lhs = self.ast.push(NodeKind::Binary { op, lhs, rhs }, span);
        }
        Ok(lhs)
    }

    /// A primary expression followed by any mix of `(args)` calls and
    /// `[expr]` indexes, optionally trailed by one `++`.
    fn parse_postfix(&mut self) -> Result<NodeId, ParseError> {
        let mut node = self.parse_primary()?;
        loop {
            if self.at(&TokenKind::LParen) {
                let span = self.cursor.peek().span;
                self.cursor.bump();
                let mut args = Vec::new();
                if !self.at(&TokenKind::RParen) {
                    loop {
                        args.push(self.parse_expr()?);
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
                node = self.ast.push(NodeKind::Call { callee: node, args }, span);
            } else if self.at(&TokenKind::LBracket) {
                let span = self.cursor.peek().span;
                self.cursor.bump();
                let index = self.parse_expr()?;
                self.eat(&TokenKind::RBracket)?;
                node = self.ast.push(NodeKind::Index { base: node, index }, span);
            } else {
                break;
            }
        }

        if self.at(&TokenKind::PlusPlus) {
            let span = self.cursor.peek().span;
            self.cursor.bump();
            node = self.ast.push(
                NodeKind::Unary {
                    op: UnaryOp::PostInc,
                    operand: node,
                    cast_ty: None,
                },
                span,
            );
        }

        Ok(node)
    }

    fn parse_primary(&mut self) -> Result<NodeId, ParseError> {
        let span = self.cursor.peek().span;
        let kind = self.cursor.peek_kind().clone();
        match kind {
            TokenKind::IntLiteral(n) => {
                self.cursor.bump();
                Ok(self.ast.push(NodeKind::IntLiteral(n), span))
            }
            TokenKind::CharLiteral(b) => {
                self.cursor.bump();
                Ok(self.ast.push(NodeKind::CharLiteral(b), span))
            }
            TokenKind::StringLiteral(s) => {
                self.cursor.bump();
                Ok(self.ast.push(NodeKind::StringLiteral(s), span))
            }
            TokenKind::Ident(s) => {
                self.cursor.bump();
                Ok(self.ast.push(NodeKind::Identifier(s), span))
            }
            TokenKind::Star => {
                self.cursor.bump();
                let operand = self.parse_primary()?;
                Ok(self.ast.push(
                    NodeKind::Unary {
                        op: UnaryOp::Deref,
                        operand,
                        cast_ty: None,
                    },
                    span,
                ))
            }
            TokenKind::Minus => {
                self.cursor.bump();
                let operand = self.parse_primary()?;
                Ok(self.ast.push(
                    NodeKind::Unary {
                        op: UnaryOp::Neg,
                        operand,
                        cast_ty: None,
                    },
                    span,
                ))
            }
            TokenKind::Amp => {
                self.cursor.bump();
                let operand = self.parse_primary()?;
                Ok(self.ast.push(
                    NodeKind::Unary {
                        op: UnaryOp::AddrOf,
                        operand,
                        cast_ty: None,
                    },
                    span,
                ))
            }
            TokenKind::LParen => {
                // `(type) expr` is a cast; anything else in parens is a
                // grouped expression. C reserves its type keywords, so the
                // token right after `(` disambiguates without backtracking.
                if self.cursor.peek_n(1).kind.is_type_keyword() {
                    self.cursor.bump();
                    let cast_ty = self.parse_type()?;
                    self.eat(&TokenKind::RParen)?;
                    let operand = self.parse_primary()?;
                    Ok(self.ast.push(
                        NodeKind::Unary {
                            op: UnaryOp::Cast,
                            operand,
                            cast_ty: Some(cast_ty),
                        },
                        span,
                    ))
                } else {
                    self.cursor.bump();
                    let inner = self.parse_expr()?;
                    self.eat(&TokenKind::RParen)?;
                    Ok(inner)
                }
            }
            _ => Err(self.unexpected("an expression")),
        }
    }
}
