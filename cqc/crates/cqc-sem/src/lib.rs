//! Type model and symbol table shared by the analyzer/codegen pass
//! (spec.md §4.3).
//!
//! This crate does not itself walk the AST — that walk is fused with QBE
//! emission in `cqc-gen`, since the front-end interleaves type checking
//! with instruction selection rather than building a separate typed IR.
//! `cqc-sem` supplies the two pieces of state that walk threads through
//! the tree: the [`Type`] model and the [`ScopeStack`] it type-checks
//! against.

pub mod scope;
pub mod types;

pub use scope::{ScopeStack, SymbolEntry};
pub use types::{FuncType, Type, TypeKind};
