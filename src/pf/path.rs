// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use crate::ir::{collect_symbols, transform_expr, Context, Expr, ExprRef};
use crate::pf::ssa::{name_at, split_versioned, SsaMap, FIRST_VERSION};

/// An immutable (formula, SSA map) pair describing the pre/post relation of a
/// control-flow fragment. Version 1 of every variable is its value on entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathFormula {
    pub formula: ExprRef,
    pub ssa: SsaMap,
}

impl PathFormula {
    /// The empty fragment: `true` with no assignments.
    pub fn empty(ctx: &mut Context) -> Self {
        PathFormula {
            formula: ctx.tru(),
            ssa: SsaMap::default(),
        }
    }

    /// Wraps an already versioned formula, deriving the SSA map from the highest
    /// version of each variable that occurs in it.
    pub fn new(ctx: &Context, formula: ExprRef) -> Self {
        let mut ssa = SsaMap::default();
        for sym in collect_symbols(ctx, formula) {
            if let Expr::Symbol { name, .. } = ctx.get(sym) {
                if let Some((base, version)) = split_versioned(ctx.get_str(*name)) {
                    let base = base.to_string();
                    ssa.set_at_least(&base, version);
                }
            }
        }
        PathFormula { formula, ssa }
    }
}

/// Replaces every base-named symbol with its versioned instance per `ssa`,
/// auto-extending the map (at version 1) for variables it does not know yet.
pub fn instantiate(ctx: &mut Context, formula: ExprRef, ssa: &mut SsaMap) -> ExprRef {
    transform_expr(ctx, formula, |ctx, e, _| match ctx.get(e) {
        Expr::Symbol { name, tpe } => {
            let (name, tpe) = (*name, *tpe);
            let name_str = ctx.get_str(name);
            if split_versioned(name_str).is_some() {
                return None; // already instantiated
            }
            let name_str = name_str.to_string();
            let version = ssa.version_of(&name_str);
            let versioned = ctx.string(name_at(&name_str, version).into());
            Some(ctx.symbol(versioned, tpe))
        }
        _ => None,
    })
}

/// Strips version indices, turning `x@3` back into `x`. Used to turn interpolant
/// atoms into predicates that can be instantiated at other points of the program.
pub fn uninstantiate(ctx: &mut Context, formula: ExprRef) -> ExprRef {
    transform_expr(ctx, formula, |ctx, e, _| match ctx.get(e) {
        Expr::Symbol { name, tpe } => {
            let (name, tpe) = (*name, *tpe);
            let base = match split_versioned(ctx.get_str(name)) {
                Some((base, _)) => base.to_string(),
                None => return None,
            };
            let base_ref = ctx.string(base.into());
            Some(ctx.symbol(base_ref, tpe))
        }
        _ => None,
    })
}

/// Shifts every version index so the formula continues the numbering that `prior`
/// ends with: `x@i` becomes `x@(i + hi(x) - 1)` where `hi` is `prior`'s version.
pub fn shift_after(ctx: &mut Context, formula: ExprRef, prior: &SsaMap) -> ExprRef {
    transform_expr(ctx, formula, |ctx, e, _| match ctx.get(e) {
        Expr::Symbol { name, tpe } => {
            let (name, tpe) = (*name, *tpe);
            let (base, version) = split_versioned(ctx.get_str(name))?;
            let base = base.to_string();
            let offset = prior.get(&base).unwrap_or(FIRST_VERSION) - 1;
            if offset == 0 {
                return None;
            }
            let shifted = ctx.string(name_at(&base, version + offset).into());
            Some(ctx.symbol(shifted, tpe))
        }
        _ => None,
    })
}

/// Sequential composition: shifts `second` past `first` and conjoins.
pub fn concat(ctx: &mut Context, first: &PathFormula, second: &PathFormula) -> PathFormula {
    let shifted = shift_after(ctx, second.formula, &first.ssa);
    let formula = ctx.and(first.formula, shifted);
    let mut ssa = first.ssa.clone();
    for (name, hi2) in second.ssa.iter() {
        let hi1 = first.ssa.get(name).unwrap_or(FIRST_VERSION);
        ssa.set_at_least(name, hi1 + hi2 - 1);
    }
    PathFormula { formula, ssa }
}

/// Control-flow join: the merged SSA map takes the maximum version per variable and
/// each branch is strengthened with equalities tying its final index to the merged one.
pub fn merge(ctx: &mut Context, a: &PathFormula, b: &PathFormula) -> PathFormula {
    let ssa = a.ssa.merged_with(&b.ssa);
    let adjusted_a = adjust_to(ctx, a, &ssa);
    let adjusted_b = adjust_to(ctx, b, &ssa);
    let formula = ctx.or(adjusted_a, adjusted_b);
    PathFormula { formula, ssa }
}

fn adjust_to(ctx: &mut Context, branch: &PathFormula, merged: &SsaMap) -> ExprRef {
    let mut eqs = Vec::new();
    for (name, target) in merged.iter() {
        let current = branch.ssa.get(name).unwrap_or(FIRST_VERSION);
        if current < target {
            // the merged value of the variable is whatever this branch last wrote
            let old = versioned_symbol(ctx, name, current);
            let new = versioned_symbol(ctx, name, target);
            eqs.push(ctx.equal(new, old));
        }
    }
    let eqs = ctx.and_many(eqs);
    ctx.and(branch.formula, eqs)
}

fn versioned_symbol(ctx: &mut Context, base: &str, version: u32) -> ExprRef {
    // join adjustments only apply to assignable program variables, which are integers
    let name = ctx.string(name_at(base, version).into());
    ctx.symbol(name, crate::ir::Type::Int)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::serialize_expr;

    fn simple_assign(ctx: &mut Context, var: &str, from: u32, to: u32, delta: i64) -> PathFormula {
        // var@to == var@from + delta
        let old = ctx.int_symbol(&name_at(var, from));
        let new = ctx.int_symbol(&name_at(var, to));
        let d = ctx.int_lit(delta);
        let rhs = ctx.add(old, d);
        let f = ctx.equal(new, rhs);
        PathFormula::new(ctx, f)
    }

    #[test]
    fn new_derives_ssa_map() {
        let mut ctx = Context::default();
        let pf = simple_assign(&mut ctx, "x", 1, 2, 1);
        assert_eq!(pf.ssa.get("x"), Some(2));
    }

    #[test]
    fn instantiate_auto_extends_at_one() {
        let mut ctx = Context::default();
        let x = ctx.int_symbol("x");
        let zero = ctx.int_lit(0);
        let pred = ctx.greater(x, zero);
        let mut ssa = SsaMap::default();
        ssa.set("y", 3);
        let inst = instantiate(&mut ctx, pred, &mut ssa);
        assert_eq!(serialize_expr(&ctx, inst), "(x@1 > 0)");
        assert_eq!(ssa.get("x"), Some(1));
    }

    #[test]
    fn uninstantiate_round_trip() {
        let mut ctx = Context::default();
        let x = ctx.int_symbol("x");
        let zero = ctx.int_lit(0);
        let pred = ctx.greater(x, zero);
        let mut ssa = SsaMap::default();
        ssa.set("x", 5);
        let inst = instantiate(&mut ctx, pred, &mut ssa);
        assert_eq!(uninstantiate(&mut ctx, inst), pred);
    }

    #[test]
    fn concat_shifts_second_operand() {
        let mut ctx = Context::default();
        // x@2 == x@1 + 1 followed by x@2 == x@1 + 2
        let first = simple_assign(&mut ctx, "x", 1, 2, 1);
        let second = simple_assign(&mut ctx, "x", 1, 2, 2);
        let combined = concat(&mut ctx, &first, &second);
        assert_eq!(combined.ssa.get("x"), Some(3));
        assert_eq!(
            serialize_expr(&ctx, combined.formula),
            "((x@2 == (x@1 + 1)) && (x@3 == (x@2 + 2)))"
        );
    }

    #[test]
    fn merge_ties_versions_with_equalities() {
        let mut ctx = Context::default();
        let a = simple_assign(&mut ctx, "x", 1, 2, 1); // writes x@2
        let b = PathFormula::empty(&mut ctx); // skips entirely
        let joined = merge(&mut ctx, &a, &b);
        assert_eq!(joined.ssa.get("x"), Some(2));
        assert_eq!(
            serialize_expr(&ctx, joined.formula),
            "((x@2 == (x@1 + 1)) || (x@2 == x@1))"
        );
    }
}
