//! Numbered diagnostics shared by all compiler passes

use crate::frontend::lexer::LexError;
use crate::util::span::Span;
use std::fmt;
use thiserror::Error;

/// Stable, numbered error kinds.
///
/// The number ranges follow the pass structure: E01xx lexical, E02xx
/// syntax, E03xx resolution/flattening, E04xx usage checking, E09xx
/// internal compiler errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    MalformedToken,
    InconsistentIndent,
    SyntaxError,
    UnknownBaseClass,
    UnknownType,
    CyclicInheritance,
    NameCollision,
    Redefinition,
    UndefinedReference,
    IllegalBlockCall,
    IllegalWriteConst,
    IllegalWriteDifferential,
    IllegalWriteState,
    IllegalReadParam,
    MissingParamAssign,
    IllegalWriteParam,
    Internal,
}

impl ErrorCode {
    /// The numbered code printed in front of every message
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::MalformedToken => "E0101",
            ErrorCode::InconsistentIndent => "E0102",
            ErrorCode::SyntaxError => "E0201",
            ErrorCode::UnknownBaseClass => "E0301",
            ErrorCode::UnknownType => "E0302",
            ErrorCode::CyclicInheritance => "E0303",
            ErrorCode::NameCollision => "E0304",
            ErrorCode::Redefinition => "E0305",
            ErrorCode::UndefinedReference => "E0306",
            ErrorCode::IllegalBlockCall => "E0307",
            ErrorCode::IllegalWriteConst => "E0401",
            ErrorCode::IllegalWriteDifferential => "E0402",
            ErrorCode::IllegalWriteState => "E0403",
            ErrorCode::IllegalReadParam => "E0404",
            ErrorCode::MissingParamAssign => "E0405",
            ErrorCode::IllegalWriteParam => "E0406",
            ErrorCode::Internal => "E0901",
        }
    }

    /// True for conditions that indicate a compiler bug, not a user error
    pub fn is_internal(&self) -> bool {
        matches!(self, ErrorCode::Internal)
    }
}

/// One error with location and message
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub code: ErrorCode,
    pub message: String,
    pub span: Span,
    /// Parser-rule context, e.g. "data definition"
    pub context: Option<String>,
}

impl Diagnostic {
    pub fn new(code: ErrorCode, message: impl Into<String>, span: Span) -> Self {
        Self {
            code,
            message: message.into(),
            span,
            context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Internal compiler error; asks the user to file a report
    pub fn internal(message: impl Into<String>, span: Span) -> Self {
        let message = format!(
            "internal compiler error: {}. Please file a bug report.",
            message.into()
        );
        Self::new(ErrorCode::Internal, message, span)
    }
}

impl From<LexError> for Diagnostic {
    fn from(err: LexError) -> Self {
        let code = match err {
            LexError::InconsistentIndent { .. } => ErrorCode::InconsistentIndent,
            _ => ErrorCode::MalformedToken,
        };
        let pos = err.position();
        Diagnostic::new(code, err.to_string(), Span::new(pos, pos))
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.span.is_dummy() {
            write!(f, "{}: ", self.span.start)?;
        }
        write!(f, "error[{}]: {}", self.code.code(), self.message)?;
        if let Some(ctx) = &self.context {
            write!(f, " (in {})", ctx)?;
        }
        Ok(())
    }
}

fn fmt_diagnostics(diags: &[Diagnostic]) -> String {
    let lines: Vec<String> = diags.iter().map(|d| d.to_string()).collect();
    lines.join("\n")
}

/// Compilation failure.
///
/// Lexical, syntax and resolution errors are fatal and abort the module
/// compile with a single diagnostic. Usage errors are collected per
/// compiled object and reported together.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("{0}")]
    Fatal(Diagnostic),
    #[error("{}", fmt_diagnostics(.0))]
    Usage(Vec<Diagnostic>),
}

impl CompileError {
    /// All diagnostics carried by this error, in report order
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            CompileError::Fatal(d) => std::slice::from_ref(d),
            CompileError::Usage(ds) => ds,
        }
    }
}

impl From<Diagnostic> for CompileError {
    fn from(d: Diagnostic) -> Self {
        CompileError::Fatal(d)
    }
}
