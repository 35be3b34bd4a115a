//! Data-flow usage checker.
//!
//! Verifies the role-based mutability rules over the flattened blocks
//! and attaches per-statement read/write decorations. Constants get one
//! top-level assignment in `init`; parameters are written in `init`
//! only and must all be assigned there; state variables (those that
//! receive a `$` assignment anywhere) are written plainly only in
//! `init` and differentially only in `dynamic`, and the `$` operator
//! itself is illegal anywhere in `init`. Guaranteed assignment flows
//! forward through the statement list; an `if` chain guarantees a name
//! only when every branch, including `else`, assigns it. Before the
//! flow checks run, a parameter assigned in `init` is propagated to
//! like-named, unassigned parameters of its submodels.

use crate::frontend::error::{Diagnostic, ErrorCode};
use crate::frontend::parser::ast::{AttrRole, BlockKind, Expr, Path, Stmt, StmtKind, UnOp};
use crate::middle::ilt::{FlatFunction, FlatObject, StmtUsage};
use crate::util::span::Span;
use std::collections::{HashMap, HashSet};

/// Check one flattened object. Returns all usage diagnostics: the
/// first violation of each function plus every missing parameter
/// assignment. Decorations are attached to the object's functions as a
/// side effect.
pub fn check(object: &mut FlatObject) -> Vec<Diagnostic> {
    let mut errors = Vec::new();
    let mut funcs = std::mem::take(&mut object.funcs);

    let mut state_vars = HashSet::new();
    for func in &funcs {
        collect_differential_targets(&func.body, &mut state_vars);
    }

    propagate_parameters(object, &mut funcs);

    let mut init_assigned: HashSet<String> = HashSet::new();
    let mut init_ok = true;
    for func in &mut funcs {
        let mut checker = Checker {
            object,
            state_vars: &state_vars,
            kind: func.kind,
            assigned: HashSet::new(),
            consts_written: HashSet::new(),
            usage: Vec::new(),
        };
        let result = checker.flow_stmts(&func.body, true);
        if func.kind == BlockKind::Init {
            init_ok = result.is_ok();
            init_assigned = std::mem::take(&mut checker.assigned);
        }
        if let Err(diag) = result {
            errors.push(diag);
        }
        func.usage = checker.usage;
    }

    // the missing-assignment check needs a cleanly checked init
    if init_ok {
        for attr in object.attrs.values() {
            if attr.role == AttrRole::Param && !init_assigned.contains(&attr.name) {
                errors.push(Diagnostic::new(
                    ErrorCode::MissingParamAssign,
                    format!("parameter '{}' is never assigned in 'init'", attr.name),
                    attr.span,
                ));
            }
        }
    }

    object.funcs = funcs;
    if !errors.is_empty() {
        tracing::debug!(
            object = %object.name,
            errors = errors.len(),
            "usage checking found violations"
        );
    }
    errors
}

fn collect_differential_targets(stmts: &[Stmt], out: &mut HashSet<String>) {
    for stmt in stmts {
        match &stmt.kind {
            StmtKind::Assign {
                target,
                differential: true,
                ..
            } => {
                out.insert(target.dotted());
            }
            StmtKind::If {
                branches,
                else_body,
            } => {
                for branch in branches {
                    collect_differential_targets(&branch.body, out);
                }
                if let Some(body) = else_body {
                    collect_differential_targets(body, out);
                }
            }
            _ => {}
        }
    }
}

/// Parameter propagation: a parameter assigned in `init` also provides
/// the value for like-named, unassigned parameters of its submodels
/// (`mu` serves `m1.mu` and `m2.mu`). The submodel parameters are
/// deleted and every access to them is rewired to the providing
/// parameter; whatever remains unassigned afterwards is reported by
/// the missing-assignment check.
fn propagate_parameters(object: &mut FlatObject, funcs: &mut [FlatFunction]) {
    let mut assigned = HashSet::new();
    if let Some(init) = funcs.iter().find(|f| f.kind == BlockKind::Init) {
        collect_assign_targets(&init.body, &mut assigned);
    }

    let mut providers: Vec<String> = Vec::new();
    let mut unassigned: Vec<String> = Vec::new();
    for attr in object.attrs.values() {
        if attr.role != AttrRole::Param {
            continue;
        }
        if assigned.contains(&attr.name) {
            providers.push(attr.name.clone());
        } else {
            unassigned.push(attr.name.clone());
        }
    }
    // the deepest providers claim their submodel parameters first
    providers.sort_by_key(|name| std::cmp::Reverse(name.split('.').count()));

    let mut replace: HashMap<String, String> = HashMap::new();
    for provider in &providers {
        unassigned.retain(|low| {
            if can_propagate(provider, low) {
                replace.insert(low.clone(), provider.clone());
                false
            } else {
                true
            }
        });
    }
    if replace.is_empty() {
        return;
    }

    tracing::debug!(
        object = %object.name,
        count = replace.len(),
        "propagating parameters to submodels"
    );
    object.attrs.retain(|name, _| !replace.contains_key(name));
    for func in funcs {
        for stmt in &mut func.body {
            rename_stmt_paths(stmt, &replace);
        }
    }
}

/// `mu` provides `m1.mu`; `m1.l` provides `m1.sm1.l` but neither
/// `m2.l` nor `l`. The provider's name must be shorter, end in the
/// same segment, and lie on the same branch of the submodel tree.
fn can_propagate(high: &str, low: &str) -> bool {
    let high: Vec<&str> = high.split('.').collect();
    let low: Vec<&str> = low.split('.').collect();
    high.len() < low.len()
        && high.last() == low.last()
        && high[..high.len() - 1] == low[..high.len() - 1]
}

fn collect_assign_targets(stmts: &[Stmt], out: &mut HashSet<String>) {
    for stmt in stmts {
        match &stmt.kind {
            StmtKind::Assign {
                target,
                differential: false,
                ..
            } => {
                out.insert(target.dotted());
            }
            StmtKind::If {
                branches,
                else_body,
            } => {
                for branch in branches {
                    collect_assign_targets(&branch.body, out);
                }
                if let Some(body) = else_body {
                    collect_assign_targets(body, out);
                }
            }
            _ => {}
        }
    }
}

fn rename_stmt_paths(stmt: &mut Stmt, replace: &HashMap<String, String>) {
    match &mut stmt.kind {
        StmtKind::Assign { target, value, .. } => {
            rename_path(target, replace);
            rename_expr_paths(value, replace);
        }
        StmtKind::If {
            branches,
            else_body,
        } => {
            for branch in branches {
                rename_expr_paths(&mut branch.condition, replace);
                for stmt in &mut branch.body {
                    rename_stmt_paths(stmt, replace);
                }
            }
            if let Some(body) = else_body {
                for stmt in body {
                    rename_stmt_paths(stmt, replace);
                }
            }
        }
        StmtKind::Pass | StmtKind::Call { .. } => {}
    }
}

fn rename_expr_paths(expr: &mut Expr, replace: &HashMap<String, String>) {
    match expr {
        Expr::Number(..) | Expr::Str(..) => {}
        Expr::Path(path) => rename_path(path, replace),
        Expr::Unary { operand, .. } => rename_expr_paths(operand, replace),
        Expr::Binary { left, right, .. } => {
            rename_expr_paths(left, replace);
            rename_expr_paths(right, replace);
        }
        Expr::Call { args, .. } => {
            for arg in args {
                rename_expr_paths(arg, replace);
            }
        }
    }
}

fn rename_path(path: &mut Path, replace: &HashMap<String, String>) {
    if let Some(new_name) = replace.get(&path.dotted()) {
        path.segments = new_name.split('.').map(str::to_owned).collect();
    }
}

struct Checker<'o> {
    object: &'o FlatObject,
    state_vars: &'o HashSet<String>,
    kind: BlockKind,
    /// Names guaranteed to be assigned at the current flow point
    assigned: HashSet<String>,
    consts_written: HashSet<String>,
    usage: Vec<StmtUsage>,
}

impl Checker<'_> {
    fn flow_stmts(&mut self, stmts: &[Stmt], top_level: bool) -> Result<(), Diagnostic> {
        for stmt in stmts {
            self.flow_stmt(stmt, top_level)?;
        }
        Ok(())
    }

    fn flow_stmt(&mut self, stmt: &Stmt, top_level: bool) -> Result<(), Diagnostic> {
        match &stmt.kind {
            StmtKind::Assign {
                target,
                differential,
                value,
            } => {
                self.check_deriv_reads(value)?;
                let mut reads = Vec::new();
                collect_reads(value, &mut reads);
                self.check_reads(&reads, stmt)?;
                let name = target.dotted();
                self.check_write(&name, *differential, top_level, stmt)?;
                if !*differential {
                    self.assigned.insert(name.clone());
                }
                self.usage.push(StmtUsage {
                    reads,
                    writes: vec![name],
                });
                Ok(())
            }
            StmtKind::If {
                branches,
                else_body,
            } => {
                let mut cond_reads = Vec::new();
                for branch in branches {
                    self.check_deriv_reads(&branch.condition)?;
                    collect_reads(&branch.condition, &mut cond_reads);
                }
                self.check_reads(&cond_reads, stmt)?;
                let index = self.usage.len();
                self.usage.push(StmtUsage {
                    reads: cond_reads,
                    writes: Vec::new(),
                });

                let before = self.assigned.clone();
                let mut branch_sets = Vec::new();
                for branch in branches {
                    self.assigned = before.clone();
                    self.flow_stmts(&branch.body, false)?;
                    branch_sets.push(std::mem::take(&mut self.assigned));
                }
                if let Some(body) = else_body {
                    self.assigned = before.clone();
                    self.flow_stmts(body, false)?;
                    branch_sets.push(std::mem::take(&mut self.assigned));
                }

                // possibly-assigned: written on any branch
                let mut written: Vec<String> = Vec::new();
                for set in &branch_sets {
                    for name in set.difference(&before) {
                        if !written.contains(name) {
                            written.push(name.clone());
                        }
                    }
                }
                written.sort();

                self.assigned = before;
                // guaranteed only when every path assigns; without an
                // `else` the fall-through path assigns nothing
                if else_body.is_some() {
                    for name in &written {
                        if branch_sets.iter().all(|set| set.contains(name)) {
                            self.assigned.insert(name.clone());
                        }
                    }
                }
                self.usage[index].writes = written;
                Ok(())
            }
            StmtKind::Pass => {
                self.usage.push(StmtUsage::default());
                Ok(())
            }
            StmtKind::Call { .. } => Err(Diagnostic::internal(
                "call statement survived inlining",
                stmt.span,
            )),
        }
    }

    /// The `$` operator may not appear anywhere inside `init`, not
    /// even as a read of an existing derivative.
    fn check_deriv_reads(&self, expr: &Expr) -> Result<(), Diagnostic> {
        if self.kind != BlockKind::Init {
            return Ok(());
        }
        if let Some((name, span)) = find_time_deriv(expr) {
            return Err(Diagnostic::new(
                ErrorCode::IllegalWriteDifferential,
                format!("time derivative of '{}' is illegal in 'init'", name),
                span,
            ));
        }
        Ok(())
    }

    /// Inside `init`, a parameter may only be read after an assignment
    /// to it is guaranteed.
    fn check_reads(&self, reads: &[String], stmt: &Stmt) -> Result<(), Diagnostic> {
        if self.kind != BlockKind::Init {
            return Ok(());
        }
        for name in reads {
            if let Some(attr) = self.object.attr(name) {
                if attr.role == AttrRole::Param && !self.assigned.contains(name) {
                    return Err(Diagnostic::new(
                        ErrorCode::IllegalReadParam,
                        format!("parameter '{}' is read before it is assigned", name),
                        stmt.span,
                    ));
                }
            }
        }
        Ok(())
    }

    fn check_write(
        &mut self,
        name: &str,
        differential: bool,
        top_level: bool,
        stmt: &Stmt,
    ) -> Result<(), Diagnostic> {
        let Some(attr) = self.object.attr(name) else {
            return Err(Diagnostic::internal(
                format!("write to '{}' with no flat attribute", name),
                stmt.span,
            ));
        };
        match attr.role {
            AttrRole::Const => {
                if differential
                    || self.kind != BlockKind::Init
                    || !top_level
                    || self.consts_written.contains(name)
                {
                    return Err(Diagnostic::new(
                        ErrorCode::IllegalWriteConst,
                        format!("illegal write to constant '{}'", name),
                        stmt.span,
                    ));
                }
                self.consts_written.insert(name.to_owned());
            }
            AttrRole::Param => {
                if differential {
                    return Err(Diagnostic::new(
                        ErrorCode::IllegalWriteParam,
                        format!("parameter '{}' can not be a state variable", name),
                        stmt.span,
                    ));
                }
                if self.kind != BlockKind::Init {
                    return Err(Diagnostic::new(
                        ErrorCode::IllegalWriteParam,
                        format!(
                            "illegal write to parameter '{}' outside 'init'",
                            name
                        ),
                        stmt.span,
                    ));
                }
            }
            AttrRole::Variable => {
                if differential {
                    if self.kind != BlockKind::Dynamic {
                        return Err(Diagnostic::new(
                            ErrorCode::IllegalWriteDifferential,
                            format!(
                                "differential assignment to '{}' outside 'dynamic'",
                                name
                            ),
                            stmt.span,
                        ));
                    }
                } else if self.kind != BlockKind::Init && self.state_vars.contains(name) {
                    return Err(Diagnostic::new(
                        ErrorCode::IllegalWriteState,
                        format!(
                            "illegal write to state variable '{}'; use '${} := ...' in 'dynamic'",
                            name, name
                        ),
                        stmt.span,
                    ));
                }
            }
        }
        Ok(())
    }
}

fn find_time_deriv(expr: &Expr) -> Option<(String, Span)> {
    match expr {
        Expr::Number(..) | Expr::Str(..) | Expr::Path(_) => None,
        Expr::Unary { op, operand, span } => {
            if let (UnOp::TimeDeriv, Expr::Path(path)) = (op, operand.as_ref()) {
                Some((path.dotted(), *span))
            } else {
                find_time_deriv(operand)
            }
        }
        Expr::Binary { left, right, .. } => {
            find_time_deriv(left).or_else(|| find_time_deriv(right))
        }
        Expr::Call { args, .. } => args.iter().find_map(find_time_deriv),
    }
}

fn collect_reads(expr: &Expr, out: &mut Vec<String>) {
    match expr {
        Expr::Number(..) | Expr::Str(..) => {}
        Expr::Path(path) => out.push(path.dotted()),
        Expr::Unary { op, operand, .. } => {
            // `$x` in an expression reads the derivative of x
            debug_assert!(!matches!(op, UnOp::TimeDeriv) || matches!(**operand, Expr::Path(_)));
            collect_reads(operand, out);
        }
        Expr::Binary { left, right, .. } => {
            collect_reads(left, out);
            collect_reads(right, out);
        }
        Expr::Call { args, .. } => {
            for arg in args {
                collect_reads(arg, out);
            }
        }
    }
}
