//! Fused type-checking and QBE code generation (spec.md §4.3, §4.4): the
//! compiler's third and last phase, run directly over the parser's AST.

pub mod emit;
pub mod qbe;

pub use emit::compile_to_qbe;
pub use qbe::{LabelCounter, Operand, QbeType, TempCounter, Writer};
