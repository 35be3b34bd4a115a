//! Parser cursor over the token stream.
//!
//! Grammar rules commit once their leading keyword matched; from then on
//! every failure is a fatal `Diagnostic` propagated with `?`. Only the
//! top-level rule dispatch selects between sibling alternatives, and it
//! does so by peeking, never by backtracking.

use crate::frontend::error::{Diagnostic, ErrorCode};
use crate::frontend::lexer::{Token, TokenKind};
use crate::util::span::Span;

pub type PResult<T> = Result<T, Diagnostic>;

/// Parser state: token cursor plus error constructors
pub struct ParserState<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> ParserState<'a> {
    /// `tokens` must end with an `Eof` token (as produced by `tokenize`)
    pub fn new(tokens: &'a [Token]) -> Self {
        debug_assert!(matches!(
            tokens.last().map(|t| &t.kind),
            Some(TokenKind::Eof)
        ));
        Self { tokens, pos: 0 }
    }

    pub fn current(&self) -> &Token {
        let idx = self.pos.min(self.tokens.len().saturating_sub(1));
        &self.tokens[idx]
    }

    pub fn peek(&self) -> &Token {
        let idx = (self.pos + 1).min(self.tokens.len().saturating_sub(1));
        &self.tokens[idx]
    }

    pub fn span(&self) -> Span {
        self.current().span
    }

    pub fn at_end(&self) -> bool {
        matches!(self.current().kind, TokenKind::Eof)
    }

    pub fn bump(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    pub fn at(&self, kind: &TokenKind) -> bool {
        &self.current().kind == kind
    }

    /// Consume the token if it matches
    pub fn skip(&mut self, kind: &TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Consume a token of the given kind or fail with a fatal syntax error
    pub fn expect(&mut self, kind: &TokenKind, context: &str) -> PResult<Token> {
        if self.at(kind) {
            Ok(self.bump())
        } else {
            Err(self.unexpected(&kind.describe(), context))
        }
    }

    /// Consume an identifier, returning its name and span
    pub fn identifier(&mut self, context: &str) -> PResult<(String, Span)> {
        match &self.current().kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                let span = self.current().span;
                self.bump();
                Ok((name, span))
            }
            _ => Err(self.unexpected("identifier", context)),
        }
    }

    /// Fatal syntax error at the current token
    pub fn unexpected(&self, expected: &str, context: &str) -> Diagnostic {
        let found = self.current().kind.describe();
        Diagnostic::new(
            ErrorCode::SyntaxError,
            format!("expected {expected}, found {found}"),
            self.span(),
        )
        .with_context(context)
    }
}
