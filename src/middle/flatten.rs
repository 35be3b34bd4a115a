//! Flattener: turns a resolved class into one flat simulation object.
//!
//! The inheritance chain is walked base-first; submodel members are
//! expanded recursively with their member name as a dotted prefix.
//! Function bodies are collected into a flat function namespace with
//! every path prefixed, then the special blocks of the target class are
//! assembled by inlining block calls at the call site. After inlining,
//! every remaining path must name a flat attribute.

use crate::frontend::error::{Diagnostic, ErrorCode};
use crate::frontend::parser::ast::{
    BlockKind, Expr, IfBranch, Path, Stmt, StmtKind,
};
use crate::middle::ilt::{FlatAttr, FlatFunction, FlatObject};
use crate::middle::symbols::ClassTable;
use crate::middle::types;
use crate::util::span::Span;
use indexmap::IndexMap;
use std::collections::HashMap;

/// Guard against runaway submodel nesting and recursive block calls
const MAX_NESTING_DEPTH: usize = 64;

/// Flatten `target` into one [`FlatObject`].
pub fn flatten(
    table: &ClassTable<'_>,
    target: &str,
    directive_span: Span,
) -> Result<FlatObject, Diagnostic> {
    if table.get(target).is_none() {
        return Err(Diagnostic::new(
            ErrorCode::UnknownType,
            format!("cannot compile unknown class '{}'", target),
            directive_span,
        ));
    }
    let mut flattener = Flattener {
        table,
        attrs: IndexMap::new(),
        members: HashMap::new(),
        funcs: IndexMap::new(),
    };
    flattener.collect(target, &[], 0, directive_span)?;

    let mut funcs = Vec::new();
    for kind in [BlockKind::Init, BlockKind::Dynamic, BlockKind::Final] {
        let name = block_name(kind);
        if let Some(func) = flattener.funcs.get(name) {
            let body = flattener.inline_stmts(&func.body, kind, 0)?;
            flattener.check_stmt_refs(&body)?;
            funcs.push(FlatFunction {
                name: name.to_owned(),
                kind,
                body,
                usage: Vec::new(),
            });
        }
    }
    tracing::debug!(
        object = target,
        attrs = flattener.attrs.len(),
        funcs = funcs.len(),
        "flattening complete"
    );
    Ok(FlatObject {
        name: target.to_owned(),
        attrs: flattener.attrs,
        funcs,
    })
}

fn block_name(kind: BlockKind) -> &'static str {
    match kind {
        BlockKind::Init => "init",
        BlockKind::Dynamic => "dynamic",
        BlockKind::Final => "final",
        BlockKind::User => "block",
    }
}

fn collision(flat: &str, first: Span, second: Span) -> Diagnostic {
    Diagnostic::new(
        ErrorCode::NameCollision,
        format!(
            "name collision: '{}' declared at {} and {}",
            flat, first.start, second.start
        ),
        second,
    )
}

/// A collected, path-prefixed function body awaiting inlining
struct CollectedFunc {
    kind: BlockKind,
    body: Vec<Stmt>,
    span: Span,
}

struct Flattener<'t, 'm> {
    table: &'t ClassTable<'m>,
    attrs: IndexMap<String, FlatAttr>,
    /// Flat names of expanded submodel members, for collision checks
    members: HashMap<String, Span>,
    funcs: IndexMap<String, CollectedFunc>,
}

impl Flattener<'_, '_> {
    /// Accumulate attributes and functions of `class_name` (and its
    /// bases, base-first) under `prefix`.
    fn collect(
        &mut self,
        class_name: &str,
        prefix: &[String],
        depth: usize,
        at: Span,
    ) -> Result<(), Diagnostic> {
        if depth > MAX_NESTING_DEPTH {
            return Err(Diagnostic::new(
                ErrorCode::IllegalBlockCall,
                format!(
                    "maximum submodel nesting depth exceeded while expanding '{}'",
                    class_name
                ),
                at,
            ));
        }
        for class in self.table.inheritance_chain(class_name) {
            for decl in &class.data {
                for (attr_name, attr_span) in &decl.names {
                    let flat = join(prefix, attr_name);
                    self.check_collision(&flat, *attr_span)?;
                    if self.table.is_leaf_type(&decl.type_name) {
                        self.attrs.insert(
                            flat.clone(),
                            FlatAttr {
                                name: flat,
                                role: decl.role,
                                type_name: decl.type_name.clone(),
                                origin_class: class.name.clone(),
                                span: *attr_span,
                            },
                        );
                    } else {
                        self.members.insert(flat, *attr_span);
                        let mut sub_prefix = prefix.to_vec();
                        sub_prefix.push(attr_name.clone());
                        self.collect(&decl.type_name, &sub_prefix, depth + 1, *attr_span)?;
                    }
                }
            }
            for func in &class.funcs {
                let flat = join(prefix, &func.name);
                if let Some(first_span) = self.data_def_span(&flat) {
                    return Err(collision(&flat, first_span, func.span));
                }
                let body = prefix_stmts(&func.body, prefix);
                // like-named block of a derived class overrides the
                // base's; the chain is base-first so a later insert wins
                self.funcs.insert(
                    flat,
                    CollectedFunc {
                        kind: func.kind,
                        body,
                        span: func.span,
                    },
                );
            }
        }
        Ok(())
    }

    fn data_def_span(&self, flat: &str) -> Option<Span> {
        self.attrs
            .get(flat)
            .map(|a| a.span)
            .or_else(|| self.members.get(flat).copied())
    }

    fn check_collision(&self, flat: &str, span: Span) -> Result<(), Diagnostic> {
        let first = self
            .data_def_span(flat)
            .or_else(|| self.funcs.get(flat).map(|f| f.span));
        match first {
            Some(first_span) => Err(collision(flat, first_span, span)),
            None => Ok(()),
        }
    }

    /// Replace every bare-call statement by the called function's body,
    /// recursively. Calls are only legal to user blocks or to blocks of
    /// the same special kind as the enclosing block.
    fn inline_stmts(
        &self,
        stmts: &[Stmt],
        kind: BlockKind,
        depth: usize,
    ) -> Result<Vec<Stmt>, Diagnostic> {
        let mut out = Vec::new();
        for stmt in stmts {
            match &stmt.kind {
                StmtKind::Call { callee, args } => {
                    let flat = callee.dotted();
                    let Some(func) = self.funcs.get(&flat) else {
                        return Err(Diagnostic::new(
                            ErrorCode::UndefinedReference,
                            format!("call to undefined function '{}'", flat),
                            stmt.span,
                        ));
                    };
                    if !args.is_empty() {
                        return Err(Diagnostic::new(
                            ErrorCode::IllegalBlockCall,
                            format!("function '{}' takes no arguments", flat),
                            stmt.span,
                        ));
                    }
                    if func.kind != BlockKind::User && func.kind != kind {
                        return Err(Diagnostic::new(
                            ErrorCode::IllegalBlockCall,
                            format!(
                                "illegal call to '{}' inside '{}'",
                                flat,
                                block_name(kind)
                            ),
                            stmt.span,
                        ));
                    }
                    if depth >= MAX_NESTING_DEPTH {
                        return Err(Diagnostic::new(
                            ErrorCode::IllegalBlockCall,
                            format!(
                                "maximum inlining depth exceeded at call to '{}' (recursive function?)",
                                flat
                            ),
                            stmt.span,
                        ));
                    }
                    out.extend(self.inline_stmts(&func.body, kind, depth + 1)?);
                }
                StmtKind::If {
                    branches,
                    else_body,
                } => {
                    let mut new_branches = Vec::new();
                    for branch in branches {
                        new_branches.push(IfBranch {
                            condition: branch.condition.clone(),
                            body: self.inline_stmts(&branch.body, kind, depth)?,
                        });
                    }
                    let new_else = match else_body {
                        Some(body) => Some(self.inline_stmts(body, kind, depth)?),
                        None => None,
                    };
                    out.push(Stmt {
                        kind: StmtKind::If {
                            branches: new_branches,
                            else_body: new_else,
                        },
                        span: stmt.span,
                    });
                }
                _ => out.push(stmt.clone()),
            }
        }
        Ok(out)
    }

    /// Every path in a fully inlined body must name a flat attribute;
    /// expression calls must name a known math function.
    fn check_stmt_refs(&self, stmts: &[Stmt]) -> Result<(), Diagnostic> {
        for stmt in stmts {
            match &stmt.kind {
                StmtKind::Assign { target, value, .. } => {
                    self.check_path_ref(target)?;
                    self.check_expr_refs(value)?;
                }
                StmtKind::If {
                    branches,
                    else_body,
                } => {
                    for branch in branches {
                        self.check_expr_refs(&branch.condition)?;
                        self.check_stmt_refs(&branch.body)?;
                    }
                    if let Some(body) = else_body {
                        self.check_stmt_refs(body)?;
                    }
                }
                StmtKind::Pass => {}
                StmtKind::Call { .. } => {
                    return Err(Diagnostic::internal(
                        "call statement survived inlining",
                        stmt.span,
                    ));
                }
            }
        }
        Ok(())
    }

    fn check_path_ref(&self, path: &Path) -> Result<(), Diagnostic> {
        if self.attrs.contains_key(&path.dotted()) {
            Ok(())
        } else {
            Err(Diagnostic::new(
                ErrorCode::UndefinedReference,
                format!("undefined reference '{}'", path),
                path.span,
            ))
        }
    }

    fn check_expr_refs(&self, expr: &Expr) -> Result<(), Diagnostic> {
        match expr {
            Expr::Number(..) | Expr::Str(..) => Ok(()),
            Expr::Path(path) => self.check_path_ref(path),
            Expr::Unary { operand, .. } => self.check_expr_refs(operand),
            Expr::Binary { left, right, .. } => {
                self.check_expr_refs(left)?;
                self.check_expr_refs(right)
            }
            Expr::Call { callee, args, span } => {
                let known = callee.segments.len() == 1
                    && types::is_math_function(&callee.segments[0]);
                if !known {
                    return Err(Diagnostic::new(
                        ErrorCode::UndefinedReference,
                        format!("undefined function '{}'", callee),
                        *span,
                    ));
                }
                for arg in args {
                    self.check_expr_refs(arg)?;
                }
                Ok(())
            }
        }
    }
}

fn join(prefix: &[String], name: &str) -> String {
    if prefix.is_empty() {
        name.to_owned()
    } else {
        format!("{}.{}", prefix.join("."), name)
    }
}

fn prefix_path(path: &Path, prefix: &[String]) -> Path {
    let mut segments = smallvec::SmallVec::new();
    segments.extend(prefix.iter().cloned());
    segments.extend(path.segments.iter().cloned());
    Path {
        segments,
        span: path.span,
    }
}

fn prefix_expr(expr: &Expr, prefix: &[String]) -> Expr {
    match expr {
        Expr::Number(..) | Expr::Str(..) => expr.clone(),
        Expr::Path(path) => Expr::Path(prefix_path(path, prefix)),
        Expr::Unary { op, operand, span } => Expr::Unary {
            op: *op,
            operand: Box::new(prefix_expr(operand, prefix)),
            span: *span,
        },
        Expr::Binary {
            op,
            left,
            right,
            span,
        } => Expr::Binary {
            op: *op,
            left: Box::new(prefix_expr(left, prefix)),
            right: Box::new(prefix_expr(right, prefix)),
            span: *span,
        },
        Expr::Call { callee, args, span } => {
            // math functions resolve globally and keep their name
            let callee = if callee.segments.len() == 1
                && types::is_math_function(&callee.segments[0])
            {
                callee.clone()
            } else {
                prefix_path(callee, prefix)
            };
            Expr::Call {
                callee,
                args: args.iter().map(|a| prefix_expr(a, prefix)).collect(),
                span: *span,
            }
        }
    }
}

fn prefix_stmts(stmts: &[Stmt], prefix: &[String]) -> Vec<Stmt> {
    if prefix.is_empty() {
        return stmts.to_vec();
    }
    stmts
        .iter()
        .map(|stmt| {
            let kind = match &stmt.kind {
                StmtKind::Assign {
                    target,
                    differential,
                    value,
                } => StmtKind::Assign {
                    target: prefix_path(target, prefix),
                    differential: *differential,
                    value: prefix_expr(value, prefix),
                },
                StmtKind::Call { callee, args } => StmtKind::Call {
                    callee: prefix_path(callee, prefix),
                    args: args.iter().map(|a| prefix_expr(a, prefix)).collect(),
                },
                StmtKind::If {
                    branches,
                    else_body,
                } => StmtKind::If {
                    branches: branches
                        .iter()
                        .map(|b| IfBranch {
                            condition: prefix_expr(&b.condition, prefix),
                            body: prefix_stmts(&b.body, prefix),
                        })
                        .collect(),
                    else_body: else_body.as_ref().map(|b| prefix_stmts(b, prefix)),
                },
                StmtKind::Pass => StmtKind::Pass,
            };
            Stmt {
                kind,
                span: stmt.span,
            }
        })
        .collect()
}
