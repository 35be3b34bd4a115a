//! Property tests: lexer round-trip and expression evaluation.

use proptest::prelude::*;
use simlc::frontend::lexer::{pretty_tokens, tokenize, TokenKind};
use simlc::frontend::parser::ast::{BinOp, Expr, UnOp};
use simlc::frontend::parser::parse_expression_str;

const KEYWORDS: &[&str] = &[
    "class", "model", "process", "data", "func", "block", "if", "elif", "else", "pass", "compile",
    "pragma", "param", "const", "and", "or", "not",
];

fn identifier() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,5}".prop_filter("identifiers must not be keywords", |s| {
        !KEYWORDS.contains(&s.as_str())
    })
}

fn number() -> impl Strategy<Value = String> {
    (0u32..1000, 0u32..100).prop_map(|(a, b)| format!("{}.{:02}", a, b))
}

prop_compose! {
    fn assignment()(name in identifier(), value in number(), differential in any::<bool>())
        -> String
    {
        let sigil = if differential { "$" } else { "" };
        format!("        {}{} := {}\n", sigil, name, value)
    }
}

prop_compose! {
    fn class_def()(
        name in identifier(),
        attrs in prop::collection::vec(identifier(), 1..4),
        stmts in prop::collection::vec(assignment(), 1..5),
    ) -> String {
        let mut out = format!("class {}:\n", name);
        out.push_str(&format!("    data {}: Real\n", attrs.join(", ")));
        out.push_str("    func init():\n");
        for stmt in &stmts {
            out.push_str(stmt);
        }
        out
    }
}

fn kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source)
        .expect("lexing failed")
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

proptest! {
    /// Re-lexing the pretty-printed token stream gives the same kinds.
    #[test]
    fn lexer_round_trip(classes in prop::collection::vec(class_def(), 1..4)) {
        let source = classes.concat();
        let tokens = tokenize(&source).expect("lexing failed");
        let printed = pretty_tokens(&tokens);
        prop_assert_eq!(kinds(&source), kinds(&printed));
    }
}

/// Reference expression tree for the evaluation property
#[derive(Debug, Clone)]
enum RefExpr {
    Num(i32),
    Add(Box<RefExpr>, Box<RefExpr>),
    Sub(Box<RefExpr>, Box<RefExpr>),
    Mul(Box<RefExpr>, Box<RefExpr>),
    Pow(Box<RefExpr>, u32),
}

impl RefExpr {
    /// Fully parenthesized surface form
    fn render(&self) -> String {
        match self {
            RefExpr::Num(n) => format!("({})", n),
            RefExpr::Add(a, b) => format!("({} + {})", a.render(), b.render()),
            RefExpr::Sub(a, b) => format!("({} - {})", a.render(), b.render()),
            RefExpr::Mul(a, b) => format!("({} * {})", a.render(), b.render()),
            RefExpr::Pow(a, e) => format!("({} ^ {})", a.render(), e),
        }
    }

    fn eval(&self) -> f64 {
        match self {
            RefExpr::Num(n) => f64::from(*n),
            RefExpr::Add(a, b) => a.eval() + b.eval(),
            RefExpr::Sub(a, b) => a.eval() - b.eval(),
            RefExpr::Mul(a, b) => a.eval() * b.eval(),
            RefExpr::Pow(a, e) => a.eval().powf(f64::from(*e)),
        }
    }
}

fn ref_expr() -> impl Strategy<Value = RefExpr> {
    let leaf = (-20i32..=20).prop_map(RefExpr::Num);
    leaf.prop_recursive(3, 16, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone())
                .prop_map(|(a, b)| RefExpr::Add(Box::new(a), Box::new(b))),
            (inner.clone(), inner.clone())
                .prop_map(|(a, b)| RefExpr::Sub(Box::new(a), Box::new(b))),
            (inner.clone(), inner.clone())
                .prop_map(|(a, b)| RefExpr::Mul(Box::new(a), Box::new(b))),
            (inner, 0u32..3).prop_map(|(a, e)| RefExpr::Pow(Box::new(a), e)),
        ]
    })
}

fn eval_ast(expr: &Expr) -> f64 {
    match expr {
        Expr::Number(n, _) => *n,
        Expr::Unary {
            op: UnOp::Neg,
            operand,
            ..
        } => -eval_ast(operand),
        Expr::Unary {
            op: UnOp::Pos,
            operand,
            ..
        } => eval_ast(operand),
        Expr::Binary {
            op, left, right, ..
        } => {
            let (l, r) = (eval_ast(left), eval_ast(right));
            match op {
                BinOp::Add => l + r,
                BinOp::Sub => l - r,
                BinOp::Mul => l * r,
                BinOp::Div => l / r,
                BinOp::Pow => l.powf(r),
                other => panic!("unexpected operator {:?}", other),
            }
        }
        other => panic!("unexpected node {:?}", other),
    }
}

proptest! {
    /// Parsing a fully parenthesized arithmetic expression preserves
    /// its value.
    #[test]
    fn parsed_expression_evaluates_like_reference(expr in ref_expr()) {
        let parsed = parse_expression_str(&expr.render()).expect("parse failed");
        prop_assert_eq!(eval_ast(&parsed), expr.eval());
    }
}
