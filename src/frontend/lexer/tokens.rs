//! Token types

use crate::util::span::{Position, Span};

/// Lexer error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LexError {
    #[error("Unexpected character '{ch}' at {position}")]
    UnexpectedChar { ch: char, position: Position },
    #[error("Inconsistent indentation at {position}: dedent does not match any outer level")]
    InconsistentIndent { position: Position },
    #[error("Invalid number literal '{text}' at {position}")]
    InvalidNumber { text: String, position: Position },
    #[error("Unterminated string starting at {position}")]
    UnterminatedString { position: Position },
}

impl LexError {
    pub fn position(&self) -> Position {
        match self {
            LexError::UnexpectedChar { position, .. }
            | LexError::InconsistentIndent { position }
            | LexError::InvalidNumber { position, .. }
            | LexError::UnterminatedString { position } => *position,
        }
    }
}

/// Token kind
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Keywords
    KwClass,
    KwModel,
    KwProcess,
    KwData,
    KwFunc,
    KwBlock,
    KwIf,
    KwElif,
    KwElse,
    KwPass,
    KwCompile,
    KwPragma,
    KwParam,
    KwConst,
    KwAnd,
    KwOr,
    KwNot,

    // Identifiers and literals
    Identifier(String),
    Number(f64),
    Str(String),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    StarStar,
    Assign,      // '='
    ColonAssign, // ':='
    EqEq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
    Dollar,

    // Delimiters
    Dot,
    Comma,
    Colon,
    Semicolon,
    LParen,
    RParen,

    // Block structure
    Newline,
    Indent,
    Dedent,
    Eof,
}

impl TokenKind {
    /// Surface text of the token, as used by the token pretty-printer.
    /// Synthetic tokens (newline, indent, dedent, EOF) render empty.
    pub fn text(&self) -> String {
        match self {
            TokenKind::KwClass => "class".into(),
            TokenKind::KwModel => "model".into(),
            TokenKind::KwProcess => "process".into(),
            TokenKind::KwData => "data".into(),
            TokenKind::KwFunc => "func".into(),
            TokenKind::KwBlock => "block".into(),
            TokenKind::KwIf => "if".into(),
            TokenKind::KwElif => "elif".into(),
            TokenKind::KwElse => "else".into(),
            TokenKind::KwPass => "pass".into(),
            TokenKind::KwCompile => "compile".into(),
            TokenKind::KwPragma => "pragma".into(),
            TokenKind::KwParam => "param".into(),
            TokenKind::KwConst => "const".into(),
            TokenKind::KwAnd => "and".into(),
            TokenKind::KwOr => "or".into(),
            TokenKind::KwNot => "not".into(),
            TokenKind::Identifier(name) => name.clone(),
            TokenKind::Number(value) => format!("{value}"),
            TokenKind::Str(value) => format!("'{value}'"),
            TokenKind::Plus => "+".into(),
            TokenKind::Minus => "-".into(),
            TokenKind::Star => "*".into(),
            TokenKind::Slash => "/".into(),
            TokenKind::Caret => "^".into(),
            TokenKind::StarStar => "**".into(),
            TokenKind::Assign => "=".into(),
            TokenKind::ColonAssign => ":=".into(),
            TokenKind::EqEq => "==".into(),
            TokenKind::Neq => "!=".into(),
            TokenKind::Lt => "<".into(),
            TokenKind::Le => "<=".into(),
            TokenKind::Gt => ">".into(),
            TokenKind::Ge => ">=".into(),
            TokenKind::Dollar => "$".into(),
            TokenKind::Dot => ".".into(),
            TokenKind::Comma => ",".into(),
            TokenKind::Colon => ":".into(),
            TokenKind::Semicolon => ";".into(),
            TokenKind::LParen => "(".into(),
            TokenKind::RParen => ")".into(),
            TokenKind::Newline | TokenKind::Indent | TokenKind::Dedent | TokenKind::Eof => {
                String::new()
            }
        }
    }

    /// Human readable description for error messages
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Identifier(name) => format!("identifier '{name}'"),
            TokenKind::Number(value) => format!("number '{value}'"),
            TokenKind::Str(_) => "string literal".into(),
            TokenKind::Newline => "end of line".into(),
            TokenKind::Indent => "indent".into(),
            TokenKind::Dedent => "dedent".into(),
            TokenKind::Eof => "end of file".into(),
            other => format!("'{}'", other.text()),
        }
    }
}

/// Token
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}
