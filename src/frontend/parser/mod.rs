//! Recursive-descent parser over the token stream.
//!
//! Expressions use Pratt parsing with explicit binding powers
//! ([`pratt`]), statements and class definitions use committed
//! keyword-dispatched rules ([`statements`]). All rules return
//! `Result` and abort on the first syntax error.

pub mod ast;
pub mod pratt;
pub mod state;
pub mod statements;

use crate::frontend::error::Diagnostic;
use crate::frontend::lexer::{self, Token, TokenKind};
pub use state::{PResult, ParserState};

/// Parse a full token stream into a module AST.
pub fn parse_module(tokens: &[Token], module_name: &str) -> Result<ast::Module, Diagnostic> {
    let mut state = ParserState::new(tokens);
    let module = state.parse_module(module_name)?;
    tracing::debug!(
        module = %module.name,
        classes = module.classes.len(),
        "parsed module"
    );
    Ok(module)
}

/// Tokenize and parse a single expression. The whole input must be
/// consumed. Mainly useful for tests and diagnostics tooling.
pub fn parse_expression_str(source: &str) -> Result<ast::Expr, Diagnostic> {
    let tokens = lexer::tokenize(source).map_err(Diagnostic::from)?;
    let mut state = ParserState::new(&tokens);
    let expr = state.parse_expression(pratt::BP_LOWEST)?;
    state.skip(&TokenKind::Newline);
    if !state.at_end() {
        return Err(state.unexpected("end of input", "expression"));
    }
    Ok(expr)
}
