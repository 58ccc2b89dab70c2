//! The AST arena.
//!
//! A single append-only store of [`Node`]s; cross-references are [`NodeId`]
//! indices rather than owned pointers. Grounded on
//! `examples/original_source/src/parse.h`'s `node_type_t`/`node_t` tagged
//! union, re-expressed as an arena of `NodeId`-indexed values via
//! `cqc_util::index_vec` instead of raw pointers into a side list.
//!
//! Invariant (spec.md §3): every node's children were pushed into the arena
//! before the node itself, so a child's `NodeId` always compares less than
//! its parent's. The parser upholds this by construction — it only ever
//! builds a node after recursively finishing all of its children.

use cqc_util::{define_idx, IndexVec, Span, Symbol};

define_idx!(NodeId);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    /// `=` — only ever constructed by the statement grammar, never reachable
    /// from expression position (spec.md §4.2, §9).
    Assign,
    /// `+=` — same restriction as `Assign`.
    PlusEq,
}

impl BinOp {
    pub fn text(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::Le => "<=",
            BinOp::Assign => "=",
            BinOp::PlusEq => "+=",
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(self, BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Gt | BinOp::Le)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    AddrOf,
    Deref,
    Neg,
    PostInc,
    /// `(type) expr` — the target type lives in `Unary::cast_ty`.
    Cast,
    /// The statement form of a bare expression (e.g. a call used for its
    /// side effect): evaluates the operand and drops the result.
    Discard,
}

/// One of `int`, `char`, `long`, `void`, `float` — the primitive keyword a
/// [`NodeKind::TypeExpr`] names, before `unsigned`/pointer-depth modifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeKeyword {
    Int,
    Long,
    Char,
    Void,
    Float,
}

/// The parsed surface syntax of a type: `[unsigned] keyword '*'*`
/// (spec.md §4.2 "Type grammar").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TypeExpr {
    pub keyword: TypeKeyword,
    pub is_unsigned: bool,
    pub pointer_depth: u32,
}

/// One parameter in a function signature.
#[derive(Clone, Debug)]
pub struct Param {
    pub name: Symbol,
    pub ty: NodeId,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub enum NodeKind {
    IntLiteral(i64),
    CharLiteral(u8),
    StringLiteral(Symbol),

    Binary {
        op: BinOp,
        lhs: NodeId,
        rhs: NodeId,
    },
    Unary {
        op: UnaryOp,
        operand: NodeId,
        /// Populated only when `op == UnaryOp::Cast`.
        cast_ty: Option<NodeId>,
    },

    VarDecl {
        name: Symbol,
        ty: NodeId,
        is_array: bool,
        /// The optional `[expr]` size; `None` for a bare `identifier[]`.
        array_len: Option<NodeId>,
        init: Option<NodeId>,
    },

    /// `body == None` marks a forward declaration (spec.md §3 invariant).
    Function {
        sig: NodeId,
        body: Option<NodeId>,
    },
    FunctionSignature {
        name: Symbol,
        ret_ty: NodeId,
        params: Vec<Param>,
        variadic: bool,
    },

    Block {
        stmts: Vec<NodeId>,
    },
    Return {
        value: Option<NodeId>,
    },
    If {
        cond: NodeId,
        then_branch: NodeId,
        else_branch: Option<NodeId>,
    },
    While {
        cond: NodeId,
        body: NodeId,
    },
    Break,
    Continue,
    Empty,

    Identifier(Symbol),
    Call {
        callee: NodeId,
        args: Vec<NodeId>,
    },
    Index {
        base: NodeId,
        index: NodeId,
    },

    TypeExpr(TypeExpr),

    /// The parse root: top-level declarations in source order.
    File {
        items: Vec<NodeId>,
    },
}

#[derive(Clone, Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
}

/// The append-only AST arena. `NodeId(0)` is reserved as a null index by
/// convention: no real node is ever pushed at index 0 without first being
/// preceded by a sentinel (see [`Ast::new`]).
#[derive(Debug, Default)]
pub struct Ast {
    nodes: IndexVec<NodeId, Node>,
    root: Option<NodeId>,
}

impl Ast {
    pub fn new() -> Self {
        let mut nodes = IndexVec::new();
        // Reserve index 0 as the sentinel "absent" node so a real NodeId is
        // never confused with a null/unset reference.
        nodes.push(Node {
            kind: NodeKind::Empty,
            span: Span::DUMMY,
        });
        Self { nodes, root: None }
    }

    pub fn push(&mut self, kind: NodeKind, span: Span) -> NodeId {
        self.nodes.push(Node { kind, span })
    }

    pub fn set_root(&mut self, id: NodeId) {
        self.root = Some(id);
    }

    /// The `file` node produced by a completed parse. Panics if called
    /// before the parse finished — every caller of `parse_translation_unit`
    /// gets a fully rooted `Ast` or an `Err`, never one without a root.
    pub fn root(&self) -> NodeId {
        self.root.expect("Ast::root called before the parse completed")
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Verifies spec.md §8's quantified invariant: every node's children
    /// have a strictly smaller index than the node itself.
    pub fn check_child_ordering(&self) -> bool {
        for (id, node) in self.nodes.iter_enumerated() {
            let ok = match &node.kind {
                NodeKind::Binary { lhs, rhs, .. } => *lhs < id && *rhs < id,
                NodeKind::Unary { operand, cast_ty, .. } => {
                    *operand < id && cast_ty.map_or(true, |t| t < id)
                }
                NodeKind::VarDecl { ty, array_len, init, .. } => {
                    *ty < id && array_len.map_or(true, |n| n < id) && init.map_or(true, |n| n < id)
                }
                NodeKind::Function { sig, body } => *sig < id && body.map_or(true, |n| n < id),
                NodeKind::FunctionSignature { ret_ty, params, .. } => {
                    *ret_ty < id && params.iter().all(|p| p.ty < id)
                }
                NodeKind::Block { stmts } => stmts.iter().all(|s| *s < id),
                NodeKind::Return { value } => value.map_or(true, |n| n < id),
                NodeKind::If { cond, then_branch, else_branch } => {
                    *cond < id && *then_branch < id && else_branch.map_or(true, |n| n < id)
                }
                NodeKind::While { cond, body } => *cond < id && *body < id,
                NodeKind::Call { callee, args } => *callee < id && args.iter().all(|a| *a < id),
                NodeKind::Index { base, index } => *base < id && *index < id,
                NodeKind::File { items } => items.iter().all(|i| *i < id),
                _ => true,
            };
            if !ok {
                return false;
            }
        }
        true
    }
}

impl std::ops::Index<NodeId> for Ast {
    type Output = Node;
    fn index(&self, id: NodeId) -> &Node {
        self.get(id)
    }
}
