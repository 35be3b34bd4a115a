//! Front end: lexing and parsing of Siml source text.

pub mod error;
pub mod lexer;
pub mod parser;

use error::Diagnostic;
use parser::ast::Module;

/// Lex and parse one source file into its module AST.
pub fn parse_source(source: &str, module_name: &str) -> Result<Module, Diagnostic> {
    let tokens = lexer::tokenize(source).map_err(Diagnostic::from)?;
    parser::parse_module(&tokens, module_name)
}
