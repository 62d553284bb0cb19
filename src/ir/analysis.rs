// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use crate::ir::{Context, Expr, ExprRef};
use std::collections::HashSet;

/// Returns all unique symbols contained in the expression, in first-visit order.
pub fn collect_symbols(ctx: &Context, root: ExprRef) -> Vec<ExprRef> {
    let mut out = Vec::new();
    for_each_unique_subexpr(ctx, root, |e| {
        if ctx.get(e).is_symbol() {
            out.push(e);
        }
    });
    out
}

/// Returns all unique uninterpreted function applications in the expression.
pub fn collect_applications(ctx: &Context, root: ExprRef) -> Vec<ExprRef> {
    let mut out = Vec::new();
    for_each_unique_subexpr(ctx, root, |e| {
        if matches!(ctx.get(e), Expr::Apply { .. }) {
            out.push(e);
        }
    });
    out
}

pub fn contains_application(ctx: &Context, root: ExprRef) -> bool {
    !collect_applications(ctx, root).is_empty()
}

/// Returns the boolean atoms of a formula: maximal boolean subexpressions that are
/// not built from boolean connectives. These are the building blocks of predicates.
pub fn collect_atoms(ctx: &Context, root: ExprRef) -> Vec<ExprRef> {
    let mut atoms = Vec::new();
    let mut seen = HashSet::new();
    let mut todo = vec![root];
    while let Some(e) = todo.pop() {
        if !seen.insert(e) {
            continue;
        }
        match ctx.get(e) {
            Expr::BoolLiteral(_) => {}
            Expr::Not(a) => todo.push(*a),
            Expr::And(a, b) | Expr::Or(a, b) | Expr::Implies(a, b) => {
                todo.push(*a);
                todo.push(*b);
            }
            // boolean equality is an iff, keep splitting
            Expr::Equal(a, b) if ctx.tpe(*a).is_bool() => {
                todo.push(*a);
                todo.push(*b);
            }
            Expr::Ite { cond, tru, fals } if ctx.tpe(*tru).is_bool() => {
                todo.push(*cond);
                todo.push(*tru);
                todo.push(*fals);
            }
            other => {
                debug_assert!(ctx.tpe(e).is_bool(), "formula contains a non-boolean root: {other:?}");
                atoms.push(e);
            }
        }
    }
    atoms
}

fn for_each_unique_subexpr(ctx: &Context, root: ExprRef, mut f: impl FnMut(ExprRef)) {
    let mut seen = HashSet::new();
    let mut todo = vec![root];
    let mut children = Vec::new();
    while let Some(e) = todo.pop() {
        if !seen.insert(e) {
            continue;
        }
        children.clear();
        ctx.get(e).for_each_child(|c| children.push(*c));
        // LIFO worklist: queue children in reverse to visit them in order
        while let Some(c) = children.pop() {
            todo.push(c);
        }
        f(e);
    }
}
