// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use crate::ir::{Context, Expr, ExprRef};
use std::collections::HashMap;

/// Visits expression nodes bottom up while propagating values.
pub fn bottom_up<R>(
    ctx: &Context,
    expr: ExprRef,
    mut f: impl FnMut(&Context, &Expr, &[R]) -> R,
) -> R {
    let mut todo = vec![(expr, false)];
    let mut stack = Vec::with_capacity(4);

    while let Some((e, bottom_up)) = todo.pop() {
        let expr = ctx.get(e);

        // Check if there are children that we need to compute first.
        if !bottom_up && expr.num_children() > 0 {
            todo.push((e, true));
            let mut children = Vec::with_capacity(expr.num_children());
            expr.for_each_child(|c| children.push(*c));
            // the worklist is LIFO: queue children in reverse so their values
            // land on the stack in operand order
            while let Some(c) = children.pop() {
                todo.push((c, false));
            }
            continue;
        }

        // Otherwise, all arguments are available on the stack for us to use.
        let num_children = expr.num_children();
        let values = &stack[stack.len() - num_children..];
        let result = f(ctx, expr, values);
        stack.truncate(stack.len() - num_children);
        stack.push(result);
    }

    debug_assert_eq!(stack.len(), 1);
    stack.pop().unwrap()
}

/// Rewrites an expression bottom up. The callback sees each node after its children
/// have been rewritten; returning `None` keeps the node (modulo child updates).
pub fn transform_expr(
    ctx: &mut Context,
    expr: ExprRef,
    mut f: impl FnMut(&mut Context, ExprRef, &[ExprRef]) -> Option<ExprRef>,
) -> ExprRef {
    let mut transformed: HashMap<ExprRef, ExprRef> = HashMap::new();
    let mut todo = vec![expr];
    let mut children = Vec::with_capacity(4);

    while let Some(expr_ref) = todo.pop() {
        if transformed.contains_key(&expr_ref) {
            continue;
        }

        // check to see if we rewrote all the children
        children.clear();
        let mut children_changed = false;
        let mut all_transformed = true;
        ctx.get(expr_ref).for_each_child(|c| {
            match transformed.get(c) {
                Some(new_child) => {
                    if *new_child != *c {
                        children_changed = true;
                    }
                    children.push(*new_child);
                }
                None => {
                    if all_transformed {
                        todo.push(expr_ref);
                    }
                    all_transformed = false;
                    todo.push(*c);
                }
            }
        });
        if !all_transformed {
            continue;
        }

        let new_expr_ref = match f(ctx, expr_ref, &children) {
            Some(e) => e,
            None => {
                if children_changed {
                    update_expr_children(ctx, expr_ref, &children)
                } else {
                    expr_ref
                }
            }
        };
        transformed.insert(expr_ref, new_expr_ref);
    }

    transformed[&expr]
}

fn update_expr_children(ctx: &mut Context, expr_ref: ExprRef, children: &[ExprRef]) -> ExprRef {
    let new_expr = match (ctx.get(expr_ref).clone(), children) {
        (Expr::Not(_), [e]) => return ctx.not(*e),
        (Expr::Neg(_), [e]) => Expr::Neg(*e),
        (Expr::And(..), [a, b]) => return ctx.and(*a, *b),
        (Expr::Or(..), [a, b]) => return ctx.or(*a, *b),
        (Expr::Implies(..), [a, b]) => Expr::Implies(*a, *b),
        (Expr::Equal(..), [a, b]) => return ctx.equal(*a, *b),
        (Expr::Greater(..), [a, b]) => Expr::Greater(*a, *b),
        (Expr::GreaterEqual(..), [a, b]) => Expr::GreaterEqual(*a, *b),
        (Expr::Add(..), [a, b]) => Expr::Add(*a, *b),
        (Expr::Sub(..), [a, b]) => Expr::Sub(*a, *b),
        (Expr::Mul(..), [a, b]) => Expr::Mul(*a, *b),
        (Expr::Ite { .. }, [cond, tru, fals]) => return ctx.ite(*cond, *tru, *fals),
        (Expr::Apply { func, tpe, .. }, args) => Expr::Apply {
            func,
            args: args.iter().copied().collect(),
            tpe,
        },
        (other, _) => panic!("unexpected child count while rebuilding {other:?}"),
    };
    ctx.add_expr(new_expr)
}
