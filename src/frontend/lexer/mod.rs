//! Lexer module
//!
//! Converts Siml source text into a token stream with synthetic
//! Indent/Dedent/Newline tokens for the indentation-structured grammar.

pub mod tokenizer;
pub mod tokens;

pub use tokenizer::Lexer;
pub use tokens::{LexError, Token, TokenKind};

/// Tokenize source code. The returned stream always ends with `Eof`;
/// comments and blank lines are discarded.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = matches!(token.kind, TokenKind::Eof);
        tokens.push(token);
        if done {
            break;
        }
    }
    tracing::debug!(tokens = tokens.len(), "lexing complete");
    Ok(tokens)
}

/// Render a token stream back to source text. Indentation is
/// reconstructed from the Indent/Dedent tokens (four spaces per level);
/// re-lexing the result yields an equivalent stream, ignoring locations.
pub fn pretty_tokens(tokens: &[Token]) -> String {
    let mut out = String::new();
    let mut level = 0usize;
    let mut line_start = true;
    for token in tokens {
        match &token.kind {
            TokenKind::Newline => {
                out.push('\n');
                line_start = true;
            }
            TokenKind::Indent => level += 1,
            TokenKind::Dedent => level = level.saturating_sub(1),
            TokenKind::Eof => {}
            kind => {
                if line_start {
                    for _ in 0..level {
                        out.push_str("    ");
                    }
                    line_start = false;
                } else {
                    out.push(' ');
                }
                out.push_str(&kind.text());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_simple_line() {
        assert_eq!(
            kinds("a := 1;"),
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::ColonAssign,
                TokenKind::Number(1.0),
                TokenKind::Semicolon,
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_greedy_operators() {
        assert_eq!(
            kinds("a <= b == c != d >= e ** f"),
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::Le,
                TokenKind::Identifier("b".into()),
                TokenKind::EqEq,
                TokenKind::Identifier("c".into()),
                TokenKind::Neq,
                TokenKind::Identifier("d".into()),
                TokenKind::Ge,
                TokenKind::Identifier("e".into()),
                TokenKind::StarStar,
                TokenKind::Identifier("f".into()),
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_colon_assign_before_colon() {
        assert_eq!(
            kinds("x := y"),
            vec![
                TokenKind::Identifier("x".into()),
                TokenKind::ColonAssign,
                TokenKind::Identifier("y".into()),
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_indent_dedent() {
        let toks = kinds("class A:\n    data x: Real;\nclass B:\n    pass\n");
        let indents = toks
            .iter()
            .filter(|k| matches!(k, TokenKind::Indent))
            .count();
        let dedents = toks
            .iter()
            .filter(|k| matches!(k, TokenKind::Dedent))
            .count();
        assert_eq!(indents, 2);
        assert_eq!(dedents, 2);
    }

    #[test]
    fn test_nested_blocks() {
        let toks = kinds("class A:\n    func f():\n        pass\n");
        let expected = vec![
            TokenKind::KwClass,
            TokenKind::Identifier("A".into()),
            TokenKind::Colon,
            TokenKind::Newline,
            TokenKind::Indent,
            TokenKind::KwFunc,
            TokenKind::Identifier("f".into()),
            TokenKind::LParen,
            TokenKind::RParen,
            TokenKind::Colon,
            TokenKind::Newline,
            TokenKind::Indent,
            TokenKind::KwPass,
            TokenKind::Newline,
            TokenKind::Dedent,
            TokenKind::Dedent,
            TokenKind::Eof,
        ];
        assert_eq!(toks, expected);
    }

    #[test]
    fn test_inconsistent_dedent_is_error() {
        let err = tokenize("if a:\n        x := 1\n    y := 2\n").unwrap_err();
        assert!(matches!(err, LexError::InconsistentIndent { .. }));
    }

    #[test]
    fn test_comments_and_blank_lines_discarded() {
        let toks = kinds("# header\n\na := 1  # trailing\n\n# only a comment\nb := 2\n");
        let newlines = toks
            .iter()
            .filter(|k| matches!(k, TokenKind::Newline))
            .count();
        assert_eq!(newlines, 2);
        assert!(!toks.iter().any(|k| matches!(k, TokenKind::Indent)));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(kinds("0.05")[0], TokenKind::Number(0.05));
        assert_eq!(kinds("1.2e3")[0], TokenKind::Number(1200.0));
        assert_eq!(kinds("3E-2")[0], TokenKind::Number(0.03));
        // an exponent letter without digits is not part of the number
        assert_eq!(
            kinds("2e")[..2],
            [TokenKind::Number(2.0), TokenKind::Identifier("e".into())]
        );
    }

    #[test]
    fn test_dollar_prefix() {
        assert_eq!(
            kinds("$V := q")[..3],
            [
                TokenKind::Dollar,
                TokenKind::Identifier("V".into()),
                TokenKind::ColonAssign,
            ]
        );
    }

    #[test]
    fn test_string_literal() {
        assert_eq!(kinds("'hello'")[0], TokenKind::Str("hello".into()));
        let err = tokenize("'oops\n").unwrap_err();
        assert!(matches!(err, LexError::UnterminatedString { .. }));
    }

    #[test]
    fn test_newline_inside_parens_is_whitespace() {
        let toks = kinds("f(a,\n   b)");
        assert!(!toks[..toks.len() - 2]
            .iter()
            .any(|k| matches!(k, TokenKind::Newline | TokenKind::Indent)));
    }

    #[test]
    fn test_missing_final_newline() {
        let toks = kinds("a := 1");
        assert_eq!(
            toks[toks.len() - 2..],
            [TokenKind::Newline, TokenKind::Eof]
        );
    }

    #[test]
    fn test_pretty_roundtrip_simple() {
        let src = "class A:\n    data x: Real;\n    func init():\n        x := 1;\n";
        let toks = tokenize(src).unwrap();
        let printed = pretty_tokens(&toks);
        let again = tokenize(&printed).unwrap();
        let k1: Vec<_> = toks.into_iter().map(|t| t.kind).collect();
        let k2: Vec<_> = again.into_iter().map(|t| t.kind).collect();
        assert_eq!(k1, k2);
    }
}
