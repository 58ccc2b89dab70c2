//! Core utilities shared by every phase of the compiler: an append-only
//! indexed arena, string interning, source spans, and diagnostics.
//!
//! None of these types know anything about C syntax or QBE — they are the
//! load-bearing plumbing the lexer, parser, and analyzer/codegen crates
//! build on, kept in one crate so a type defined once (a `Span`, a
//! `Symbol`) means the same thing everywhere.

pub mod index_vec;
pub mod span;
pub mod symbol;

pub mod diagnostic;
pub mod error;

pub use diagnostic::{Diagnostic, DiagnosticCode, Handler, Level};
pub use error::{CompileError, LexError, ParseError, SymbolError, TypeError, UnsupportedError};
pub use index_vec::{Idx, IndexVec};
pub use span::{FileId, SourceFile, SourceMap, Span};
pub use symbol::Symbol;

pub use rustc_hash::{FxHashMap, FxHashSet};
