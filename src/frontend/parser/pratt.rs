//! Expression parsing with binding powers.
//!
//! Precedence, loosest binding first: `or`, `and`, `not`, comparisons
//! (non-chaining, left-associative pairwise), `+ -`, `* /`, unary sign,
//! `^`/`**` (right-associative), the time-differential prefix `$`, and
//! postfix call/member access. Exponentiation groups right before an
//! outer sign is applied: `-a^-b == -(a^(-b))`.

use super::ast::{BinOp, Expr, Path, UnOp};
use super::state::{PResult, ParserState};
use crate::frontend::lexer::TokenKind;

pub const BP_LOWEST: u8 = 0;
const BP_OR: u8 = 1;
const BP_AND: u8 = 2;
const BP_NOT: u8 = 3;
const BP_CMP: u8 = 4;
const BP_TERM: u8 = 5;
const BP_FACTOR: u8 = 6;
const BP_SIGN: u8 = 7;
const BP_POWER: u8 = 8;

/// (left binding power, operator, right-associative)
fn infix_binding(kind: &TokenKind) -> Option<(u8, BinOp, bool)> {
    match kind {
        TokenKind::KwOr => Some((BP_OR, BinOp::Or, false)),
        TokenKind::KwAnd => Some((BP_AND, BinOp::And, false)),
        TokenKind::EqEq => Some((BP_CMP, BinOp::Eq, false)),
        TokenKind::Neq => Some((BP_CMP, BinOp::Neq, false)),
        TokenKind::Lt => Some((BP_CMP, BinOp::Lt, false)),
        TokenKind::Le => Some((BP_CMP, BinOp::Le, false)),
        TokenKind::Gt => Some((BP_CMP, BinOp::Gt, false)),
        TokenKind::Ge => Some((BP_CMP, BinOp::Ge, false)),
        TokenKind::Plus => Some((BP_TERM, BinOp::Add, false)),
        TokenKind::Minus => Some((BP_TERM, BinOp::Sub, false)),
        TokenKind::Star => Some((BP_FACTOR, BinOp::Mul, false)),
        TokenKind::Slash => Some((BP_FACTOR, BinOp::Div, false)),
        TokenKind::Caret | TokenKind::StarStar => Some((BP_POWER, BinOp::Pow, true)),
        _ => None,
    }
}

impl ParserState<'_> {
    /// Parse an expression, leaving the cursor just past it
    pub fn parse_expression(&mut self, min_bp: u8) -> PResult<Expr> {
        let mut left = self.parse_prefix()?;

        loop {
            match &self.current().kind {
                // Member access binds tightest and is only valid on a
                // plain identifier/path left-hand side.
                TokenKind::Dot => {
                    self.bump();
                    let (name, span) = self.identifier("attribute access")?;
                    match &mut left {
                        Expr::Path(path) => path.push(name, span),
                        _ => return Err(self.unexpected("a name before '.'", "attribute access")),
                    }
                }
                TokenKind::LParen => {
                    let callee = match left {
                        Expr::Path(path) => path,
                        _ => {
                            return Err(
                                self.unexpected("a function name before '('", "function call")
                            )
                        }
                    };
                    self.bump();
                    let args = self.parse_call_args()?;
                    let rparen = self.expect(&TokenKind::RParen, "function call")?;
                    let span = callee.span.merge(rparen.span);
                    left = Expr::Call { callee, args, span };
                }
                kind => {
                    let Some((lbp, op, right_assoc)) = infix_binding(kind) else {
                        break;
                    };
                    if lbp < min_bp {
                        break;
                    }
                    self.bump();
                    let rhs_bp = if right_assoc { lbp } else { lbp + 1 };
                    let right = self.parse_expression(rhs_bp)?;
                    let span = left.span().merge(right.span());
                    left = Expr::Binary {
                        op,
                        left: Box::new(left),
                        right: Box::new(right),
                        span,
                    };
                }
            }
        }
        Ok(left)
    }

    fn parse_prefix(&mut self) -> PResult<Expr> {
        let token = self.current().clone();
        match token.kind {
            TokenKind::Number(value) => {
                self.bump();
                Ok(Expr::Number(value, token.span))
            }
            TokenKind::Str(value) => {
                self.bump();
                Ok(Expr::Str(value, token.span))
            }
            TokenKind::Identifier(name) => {
                self.bump();
                Ok(Expr::Path(Path::single(name, token.span)))
            }
            TokenKind::LParen => {
                self.bump();
                let inner = self.parse_expression(BP_LOWEST)?;
                self.expect(&TokenKind::RParen, "parenthesized expression")?;
                Ok(inner)
            }
            TokenKind::Minus => {
                self.bump();
                let operand = self.parse_expression(BP_SIGN)?;
                let span = token.span.merge(operand.span());
                Ok(Expr::Unary {
                    op: UnOp::Neg,
                    operand: Box::new(operand),
                    span,
                })
            }
            TokenKind::Plus => {
                self.bump();
                let operand = self.parse_expression(BP_SIGN)?;
                let span = token.span.merge(operand.span());
                Ok(Expr::Unary {
                    op: UnOp::Pos,
                    operand: Box::new(operand),
                    span,
                })
            }
            TokenKind::KwNot => {
                self.bump();
                let operand = self.parse_expression(BP_NOT)?;
                let span = token.span.merge(operand.span());
                Ok(Expr::Unary {
                    op: UnOp::Not,
                    operand: Box::new(operand),
                    span,
                })
            }
            // `$` applies only to a following identifier/member path
            TokenKind::Dollar => {
                self.bump();
                let path = self.parse_path("time differential")?;
                let span = token.span.merge(path.span);
                Ok(Expr::Unary {
                    op: UnOp::TimeDeriv,
                    operand: Box::new(Expr::Path(path)),
                    span,
                })
            }
            _ => Err(self.unexpected("expression", "expression")),
        }
    }

    /// Parse a dotted path: `a` or `a.b.c`
    pub fn parse_path(&mut self, context: &str) -> PResult<Path> {
        let (name, span) = self.identifier(context)?;
        let mut path = Path::single(name, span);
        while self.at(&TokenKind::Dot) {
            self.bump();
            let (name, span) = self.identifier(context)?;
            path.push(name, span);
        }
        Ok(path)
    }

    pub(super) fn parse_call_args(&mut self) -> PResult<Vec<Expr>> {
        let mut args = Vec::new();
        if self.at(&TokenKind::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expression(BP_LOWEST)?);
            if !self.skip(&TokenKind::Comma) {
                break;
            }
            // trailing comma
            if self.at(&TokenKind::RParen) {
                break;
            }
        }
        Ok(args)
    }
}
