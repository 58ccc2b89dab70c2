//! Token kinds and the `Token` type the lexer produces.

use cqc_util::{Span, Symbol};

/// One lexical unit, tagged with the byte span of its first byte (spec.md
/// §4.1: "each emitted token carries the location of its first byte").
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    // Literals
    IntLiteral(i64),
    CharLiteral(u8),
    /// Already escape-processed; interned so repeated identical strings
    /// (the common case) share one allocation.
    StringLiteral(Symbol),
    Ident(Symbol),

    // Type keywords
    KwInt,
    KwChar,
    KwLong,
    KwVoid,
    KwFloat,
    KwUnsigned,

    // Storage / flow keywords
    KwReturn,
    KwIf,
    KwElse,
    KwWhile,
    KwFor,
    KwBreak,
    KwContinue,

    // Punctuation, multi-character forms listed before the single-character
    // forms they share a prefix with (the lexer must try them in this
    // order too).
    EqEq,
    NotEq,
    LtEq,
    PlusEq,
    PlusPlus,
    AmpAmp,
    Ellipsis,

    Plus,
    Minus,
    Star,
    Slash,
    Assign,
    Lt,
    Gt,
    Amp,
    Bang,
    Semi,
    Comma,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,

    Eof,
}

impl TokenKind {
    /// A short human name for diagnostics ("the token 'return'", "';'").
    pub fn describe(&self) -> String {
        match self {
            TokenKind::IntLiteral(n) => format!("integer literal {n}"),
            TokenKind::CharLiteral(b) => format!("character literal '{}'", *b as char),
            TokenKind::StringLiteral(_) => "string literal".to_string(),
            TokenKind::Ident(s) => format!("identifier '{s}'"),
            TokenKind::KwInt => "'int'".to_string(),
            TokenKind::KwChar => "'char'".to_string(),
            TokenKind::KwLong => "'long'".to_string(),
            TokenKind::KwVoid => "'void'".to_string(),
            TokenKind::KwFloat => "'float'".to_string(),
            TokenKind::KwUnsigned => "'unsigned'".to_string(),
            TokenKind::KwReturn => "'return'".to_string(),
            TokenKind::KwIf => "'if'".to_string(),
            TokenKind::KwElse => "'else'".to_string(),
            TokenKind::KwWhile => "'while'".to_string(),
            TokenKind::KwFor => "'for'".to_string(),
            TokenKind::KwBreak => "'break'".to_string(),
            TokenKind::KwContinue => "'continue'".to_string(),
            TokenKind::EqEq => "'=='".to_string(),
            TokenKind::NotEq => "'!='".to_string(),
            TokenKind::LtEq => "'<='".to_string(),
            TokenKind::PlusEq => "'+='".to_string(),
            TokenKind::PlusPlus => "'++'".to_string(),
            TokenKind::AmpAmp => "'&&'".to_string(),
            TokenKind::Ellipsis => "'...'".to_string(),
            TokenKind::Plus => "'+'".to_string(),
            TokenKind::Minus => "'-'".to_string(),
            TokenKind::Star => "'*'".to_string(),
            TokenKind::Slash => "'/'".to_string(),
            TokenKind::Assign => "'='".to_string(),
            TokenKind::Lt => "'<'".to_string(),
            TokenKind::Gt => "'>'".to_string(),
            TokenKind::Amp => "'&'".to_string(),
            TokenKind::Bang => "'!'".to_string(),
            TokenKind::Semi => "';'".to_string(),
            TokenKind::Comma => "','".to_string(),
            TokenKind::LParen => "'('".to_string(),
            TokenKind::RParen => "')'".to_string(),
            TokenKind::LBrace => "'{'".to_string(),
            TokenKind::RBrace => "'}'".to_string(),
            TokenKind::LBracket => "'['".to_string(),
            TokenKind::RBracket => "']'".to_string(),
            TokenKind::Eof => "end of input".to_string(),
        }
    }

    /// The canonical primitive-type keyword this token kind names, if any.
    pub fn is_type_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::KwInt
                | TokenKind::KwChar
                | TokenKind::KwLong
                | TokenKind::KwVoid
                | TokenKind::KwFloat
                | TokenKind::KwUnsigned
        )
    }
}

/// Map an identifier-shaped lexeme to its keyword token kind, or `None` if
/// it's an ordinary identifier.
pub fn keyword_from_ident(text: &str) -> Option<TokenKind> {
    Some(match text {
        "int" => TokenKind::KwInt,
        "char" => TokenKind::KwChar,
        "long" => TokenKind::KwLong,
        "void" => TokenKind::KwVoid,
        "float" => TokenKind::KwFloat,
        "unsigned" => TokenKind::KwUnsigned,
        "return" => TokenKind::KwReturn,
        "if" => TokenKind::KwIf,
        "else" => TokenKind::KwElse,
        "while" => TokenKind::KwWhile,
        "for" => TokenKind::KwFor,
        "break" => TokenKind::KwBreak,
        "continue" => TokenKind::KwContinue,
        _ => return None,
    })
}
