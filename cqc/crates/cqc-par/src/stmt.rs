//! Statement grammar: empty, variable declaration, `break`, `continue`,
//! `+=`, assignment, `return`, `if`/`else`, `while`, block,
//! expression-discard (spec.md §4.2).

use cqc_lex::TokenKind;
use cqc_util::ParseError;

use crate::ast::{BinOp, NodeKind, UnaryOp};
use crate::{NodeId, Parser};

impl<'t> Parser<'t> {
    pub(crate) fn parse_block(&mut self) -> Result<NodeId, ParseError> {
        let span = self.eat(&TokenKind::LBrace)?.span;
        let mut stmts = Vec::new();
        while !self.at(&TokenKind::RBrace) {
            stmts.push(self.parse_stmt()?);
        }
        self.eat(&TokenKind::RBrace)?;
        Ok(self.ast.push(NodeKind::Block { stmts }, span))
    }

    fn parse_stmt(&mut self) -> Result<NodeId, ParseError> {
        let span = self.cursor.peek().span;
        match self.cursor.peek_kind() {
            TokenKind::Semi => {
                self.cursor.bump();
                Ok(self.ast.push(NodeKind::Empty, span))
            }
            TokenKind::LBrace => self.parse_block(),
            TokenKind::KwReturn => {
                self.cursor.bump();
                let value = if self.at(&TokenKind::Semi) {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                self.eat(&TokenKind::Semi)?;
                Ok(self.ast.push(NodeKind::Return { value }, span))
            }
            TokenKind::KwBreak => {
                self.cursor.bump();
                self.eat(&TokenKind::Semi)?;
                Ok(self.ast.push(NodeKind::Break, span))
            }
            TokenKind::KwContinue => {
                self.cursor.bump();
                self.eat(&TokenKind::Semi)?;
                Ok(self.ast.push(NodeKind::Continue, span))
            }
            TokenKind::KwIf => self.parse_if(),
            TokenKind::KwWhile => self.parse_while(),
            _ if self.at_type_start() => self.parse_var_decl(),
            _ => self.parse_assign_or_discard(),
        }
    }

    fn parse_if(&mut self) -> Result<NodeId, ParseError> {
        let span = self.eat(&TokenKind::KwIf)?.span;
        self.eat(&TokenKind::LParen)?;
        let cond = self.parse_expr()?;
        self.eat(&TokenKind::RParen)?;
        let then_branch = self.parse_stmt()?;
        let else_branch = if self.at(&TokenKind::KwElse) {
            self.cursor.bump();
            Some(self.parse_stmt()?)
        } else {
            None
        };
        Ok(self.ast.push(
            NodeKind::If {
                cond,
                then_branch,
                else_branch,
            },
            span,
        ))
    }

    fn parse_while(&mut self) -> Result<NodeId, ParseError> {
        let span = self.eat(&TokenKind::KwWhile)?.span;
        self.eat(&TokenKind::LParen)?;
        let cond = self.parse_expr()?;
        self.eat(&TokenKind::RParen)?;
        let body = self.parse_stmt()?;
        Ok(self.ast.push(NodeKind::While { cond, body }, span))
    }

    /// `type identifier ('[' expr? ']')? ('=' expr)? ';'`
    fn parse_var_decl(&mut self) -> Result<NodeId, ParseError> {
        let span = self.cursor.peek().span;
        let ty = self.parse_type()?;
        let name = self.eat_ident()?;

        let mut is_array = false;
        let mut array_len = None;
        if self.at(&TokenKind::LBracket) {
            self.cursor.bump();
            is_array = true;
            if !self.at(&TokenKind::RBracket) {
                array_len = Some(self.parse_expr()?);
            }
            self.eat(&TokenKind::RBracket)?;
        }

        let init = if self.at(&TokenKind::Assign) {
            self.cursor.bump();
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.eat(&TokenKind::Semi)?;

        Ok(self.ast.push(
            NodeKind::VarDecl {
                name,
                ty,
                is_array,
                array_len,
                init,
            },
            span,
        ))
    }

    /// An expression at the start of a statement is either the left side
    /// of `=`/`+=`, or a bare expression evaluated and discarded.
    fn parse_assign_or_discard(&mut self) -> Result<NodeId, ParseError> {
        let span = self.cursor.peek().span;
        let lhs = self.parse_expr()?;

        let stmt = if self.at(&TokenKind::Assign) {
            self.cursor.bump();
            let rhs = self.parse_expr()?;
            self.ast.push(
                NodeKind::Binary {
                    op: BinOp::Assign,
                    lhs,
                    rhs,
                },
                span,
            )
        } else if self.at(&TokenKind::PlusEq) {
            self.cursor.bump();
            let rhs = self.parse_expr()?;
            self.ast.push(
                NodeKind::Binary {
                    op: BinOp::PlusEq,
                    lhs,
                    rhs,
                },
                span,
            )
        } else {
            self.ast.push(
                NodeKind::Unary {
                    op: UnaryOp::Discard,
                    operand: lhs,
                    cast_ty: None,
                },
                span,
            )
        };

        self.eat(&TokenKind::Semi)?;
        Ok(stmt)
    }
}
