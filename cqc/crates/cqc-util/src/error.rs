//! Error types shared across the compiler's phases.
//!
//! The five enums below (`LexError`, `ParseError`, `SymbolError`, `TypeError`,
//! `UnsupportedError`) mirror the five failure categories enumerated in the
//! front-end's error-handling design: every variant carries the source
//! location and whatever kind-specific payload is needed to build a
//! [`crate::diagnostic::Diagnostic`] (e.g. the two mismatched arities, or the
//! two conflicting signatures). `CompileError` unifies them with
//! `#[from]` conversions for the driver's `Result`.
//!
//! A handful of smaller errors (`SourceMapError`, `IndexVecError`,
//! `DiagnosticError`) cover misuse of the arena/span/diagnostic plumbing
//! itself, independent of any compiled program.

use thiserror::Error;

use crate::span::Span;

/// Failures raised while turning source bytes into a token sequence.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("{span}: unterminated string or character literal")]
    UnterminatedLiteral { span: Span },

    #[error("{span}: unknown escape sequence '\\{escape}'")]
    UnknownEscape { span: Span, escape: char },

    #[error("{span}: {kind} exceeds the {max}-byte length limit")]
    TokenTooLong {
        span: Span,
        kind: &'static str,
        max: usize,
    },

    #[error("{span}: byte 0x{byte:02x} does not begin any token")]
    UnrecognizedByte { span: Span, byte: u8 },

    #[error("{span}: character literal must contain exactly one byte, found {len}")]
    InvalidCharLiteral { span: Span, len: usize },
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            LexError::UnterminatedLiteral { span }
            | LexError::UnknownEscape { span, .. }
            | LexError::TokenTooLong { span, .. }
            | LexError::UnrecognizedByte { span, .. }
            | LexError::InvalidCharLiteral { span, .. } => *span,
        }
    }
}

/// Failures raised while building the AST from the token sequence.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("{span}: unexpected token, expected {expected}")]
    UnexpectedToken { span: Span, expected: String },

    #[error("{span}: trailing comma is not allowed here")]
    TrailingComma { span: Span },

    #[error("{span}: expected a block body, not a bare declaration")]
    ExpectedBlock { span: Span },

    #[error("{span}: unexpected tokens after the last top-level declaration")]
    TrailingTokens { span: Span },
}

impl ParseError {
    pub fn span(&self) -> Span {
        match self {
            ParseError::UnexpectedToken { span, .. }
            | ParseError::TrailingComma { span }
            | ParseError::ExpectedBlock { span }
            | ParseError::TrailingTokens { span } => *span,
        }
    }
}

/// Failures raised by the scope stack while resolving or inserting names.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SymbolError {
    #[error("{span}: use of undeclared identifier '{name}'")]
    Undeclared { span: Span, name: String },

    #[error("{span}: redeclaration of '{name}' (first declared at {first_span})")]
    Redeclared {
        span: Span,
        name: String,
        first_span: Span,
    },

    #[error("{span}: definition of '{name}' does not match its forward declaration at {first_span}")]
    SignatureMismatch {
        span: Span,
        name: String,
        first_span: Span,
    },
}

impl SymbolError {
    pub fn span(&self) -> Span {
        match self {
            SymbolError::Undeclared { span, .. }
            | SymbolError::Redeclared { span, .. }
            | SymbolError::SignatureMismatch { span, .. } => *span,
        }
    }
}

/// Failures raised by the type checker half of the fused analyzer/codegen pass.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("{span}: operand of '{op}' is not a primitive type")]
    NonPrimitiveOperand { span: Span, op: &'static str },

    #[error("{span}: '{callee}' expects {expected} argument(s), got {found}")]
    ArityMismatch {
        span: Span,
        callee: String,
        expected: usize,
        found: usize,
    },

    #[error("{span}: argument {index} of '{callee}' has the wrong type")]
    ArgumentMismatch {
        span: Span,
        callee: String,
        index: usize,
    },

    #[error("{span}: returned value does not match the function's return type")]
    ReturnMismatch { span: Span },

    #[error("{span}: cannot dereference a non-pointer value")]
    DerefNonPointer { span: Span },

    #[error("{span}: cannot assign a value of a different type")]
    AssignMismatch { span: Span },

    #[error("{span}: an lvalue is required here")]
    LvalueRequired { span: Span },

    #[error("{span}: pointer arithmetic between two pointers is not allowed")]
    PointerArithmetic { span: Span },

    #[error("{span}: called value is not a function")]
    NotCallable { span: Span },
}

impl TypeError {
    pub fn span(&self) -> Span {
        match self {
            TypeError::NonPrimitiveOperand { span, .. }
            | TypeError::ArityMismatch { span, .. }
            | TypeError::ArgumentMismatch { span, .. }
            | TypeError::ReturnMismatch { span }
            | TypeError::DerefNonPointer { span }
            | TypeError::AssignMismatch { span }
            | TypeError::LvalueRequired { span }
            | TypeError::PointerArithmetic { span }
            | TypeError::NotCallable { span } => *span,
        }
    }
}

/// A construct that is syntactically well-formed but outside this front-end's
/// supported subset (floating point beyond the type token, struct/union/enum,
/// goto/switch, typedefs, bit-fields, complex initializers).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{span}: unsupported construct: {what}")]
pub struct UnsupportedError {
    pub span: Span,
    pub what: String,
}

/// The unified error type returned by [`crate::diagnostic`]-producing phases
/// and ultimately by the driver's top-level `compile` entry point.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Symbol(#[from] SymbolError),

    #[error(transparent)]
    Type(#[from] TypeError),

    #[error(transparent)]
    Unsupported(#[from] UnsupportedError),

    /// Failure writing the emitted IR to the caller's sink. Stored as a
    /// rendered message rather than the raw `io::Error` so `CompileError`
    /// can keep deriving `Clone`/`PartialEq`/`Eq` like its four language
    /// error variants.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for CompileError {
    fn from(e: std::io::Error) -> Self {
        CompileError::Io(e.to_string())
    }
}

impl CompileError {
    /// The source location the error should be reported at. I/O failures
    /// have no source location; callers that need one should check
    /// `matches!(err, CompileError::Io(_))` first.
    pub fn span(&self) -> Span {
        match self {
            CompileError::Lex(e) => e.span(),
            CompileError::Parse(e) => e.span(),
            CompileError::Symbol(e) => e.span(),
            CompileError::Type(e) => e.span(),
            CompileError::Unsupported(e) => e.span,
            CompileError::Io(_) => Span::DUMMY,
        }
    }
}

/// Error type for source map operations.
#[derive(Debug, Error)]
pub enum SourceMapError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Invalid span: start {start} > end {end}")]
    InvalidSpan { start: usize, end: usize },

    #[error("Span out of bounds: file has {file_len} bytes, span is {span_start}..{span_end}")]
    SpanOutOfBounds {
        file_len: usize,
        span_start: usize,
        span_end: usize,
    },

    #[error("Invalid line number: {line} (file has {max_lines} lines)")]
    InvalidLineNumber { line: usize, max_lines: usize },
}

/// Error type for index vector operations.
#[derive(Debug, Error)]
pub enum IndexVecError {
    #[error("Index out of bounds: index {index}, length {length}")]
    OutOfBounds { index: usize, length: usize },

    #[error("Invalid index: {0}")]
    InvalidIndex(String),
}

/// Error type for diagnostic operations.
#[derive(Debug, Error)]
pub enum DiagnosticError {
    #[error("Failed to format diagnostic: {0}")]
    FormatFailed(String),

    #[error("Invalid diagnostic code: {0}")]
    InvalidCode(String),
}

pub type SourceMapResult<T> = std::result::Result<T, SourceMapError>;
pub type IndexVecResult<T> = std::result::Result<T, IndexVecError>;
pub type DiagnosticResult<T> = std::result::Result<T, DiagnosticError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lex_error_carries_its_span() {
        let span = Span::point(1, 4);
        let err = LexError::UnterminatedLiteral { span };
        assert_eq!(err.span(), span);
    }

    #[test]
    fn compile_error_from_conversions() {
        let span = Span::DUMMY;
        let e: CompileError = SymbolError::Undeclared {
            span,
            name: "x".into(),
        }
        .into();
        assert_eq!(e.span(), span);
        assert!(matches!(e, CompileError::Symbol(_)));
    }

    #[test]
    fn unsupported_error_display_mentions_construct() {
        let err = UnsupportedError {
            span: Span::DUMMY,
            what: "struct definitions".into(),
        };
        let rendered = format!("{}", err);
        assert!(rendered.contains("struct definitions"));
    }
}
