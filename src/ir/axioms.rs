// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use crate::ir::analysis::collect_applications;
use crate::ir::{Context, Expr, ExprRef};
use std::collections::HashMap;

/// Functional-congruence axioms over the uninterpreted function applications that occur
/// in `roots`: for any two applications of the same function, equal arguments force
/// equal results. The SMT binding lowers applications to fresh constants, so without
/// these axioms the solver treats every application as an unrelated value.
pub fn congruence_axioms(ctx: &mut Context, roots: &[ExprRef]) -> ExprRef {
    let mut by_func: HashMap<(crate::ir::StringRef, usize), Vec<ExprRef>> = HashMap::new();
    for root in roots {
        for app in collect_applications(ctx, *root) {
            if let Expr::Apply { func, args, .. } = ctx.get(app) {
                let key = (*func, args.len());
                let apps = by_func.entry(key).or_default();
                if !apps.contains(&app) {
                    apps.push(app);
                }
            }
        }
    }

    let mut axioms = Vec::new();
    for apps in by_func.values() {
        for (i, a) in apps.iter().enumerate() {
            for b in apps.iter().skip(i + 1) {
                axioms.push(congruence_axiom(ctx, *a, *b));
            }
        }
    }
    ctx.and_many(axioms)
}

fn congruence_axiom(ctx: &mut Context, a: ExprRef, b: ExprRef) -> ExprRef {
    let (args_a, args_b) = match (ctx.get(a), ctx.get(b)) {
        (Expr::Apply { args: aa, .. }, Expr::Apply { args: ab, .. }) => (aa.clone(), ab.clone()),
        _ => unreachable!("congruence axioms are only generated for applications"),
    };
    debug_assert_eq!(args_a.len(), args_b.len());
    let arg_eqs: Vec<ExprRef> = args_a
        .iter()
        .zip(args_b.iter())
        .map(|(x, y)| ctx.equal(*x, *y))
        .collect();
    let premise = ctx.and_many(arg_eqs);
    let conclusion = ctx.equal(a, b);
    ctx.implies(premise, conclusion)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::serialize_expr;
    use smallvec::smallvec;
    use crate::ir::Type;

    #[test]
    fn axioms_for_two_applications() {
        let mut ctx = Context::default();
        let f = ctx.string("bitand".into());
        let x = ctx.int_symbol("x");
        let y = ctx.int_symbol("y");
        let one = ctx.int_lit(1);
        let fx = ctx.apply(f, smallvec![x, one], Type::Int);
        let fy = ctx.apply(f, smallvec![y, one], Type::Int);
        let root = ctx.equal(fx, fy);

        let axiom = congruence_axioms(&mut ctx, &[root]);
        assert_eq!(
            serialize_expr(&ctx, axiom),
            "((x == y) -> (bitand(x, 1) == bitand(y, 1)))"
        );
    }

    #[test]
    fn no_applications_no_axioms() {
        let mut ctx = Context::default();
        let x = ctx.int_symbol("x");
        let zero = ctx.int_lit(0);
        let root = ctx.greater(x, zero);
        let axiom = congruence_axioms(&mut ctx, &[root]);
        assert!(ctx.is_true(axiom));
    }
}
