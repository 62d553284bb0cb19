// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

mod common;

use common::BruteProver;
use predabs::abs::{AbstractionEngine, AbstractionKind, AbstractionOptions};
use predabs::bdd::{BddRef, FALSE, TRUE};
use predabs::ir::Context;
use predabs::pf::PathFormula;
use predabs::prec::{PredicateRef, PredicateStore};
use predabs::smt::ProverSession;
use test_log::test;

fn engine(kind: AbstractionKind) -> AbstractionEngine {
    AbstractionEngine::new(AbstractionOptions {
        kind,
        ..AbstractionOptions::default()
    })
}

/// prior `x > 0`, transition `x' = x - 1`, predicate `{x > 0}`
fn decrement_scenario(ctx: &mut Context) -> (PredicateStore, PredicateRef, PathFormula) {
    let mut store = PredicateStore::default();
    let x = ctx.int_symbol("x");
    let zero = ctx.int_lit(0);
    let atom = ctx.greater(x, zero);
    let pred = store.intern(ctx, atom);

    let x1 = ctx.int_symbol("x@1");
    let x2 = ctx.int_symbol("x@2");
    let one = ctx.int_lit(1);
    let decremented = ctx.sub(x1, one);
    let formula = ctx.equal(x2, decremented);
    let path = PathFormula::new(ctx, formula);
    (store, pred, path)
}

#[test]
fn decrement_leaves_the_predicate_unconstrained() {
    let mut ctx = Context::default();
    let (store, pred, path) = decrement_scenario(&mut ctx);

    for kind in [AbstractionKind::Boolean, AbstractionKind::Cartesian] {
        let mut engine = engine(kind);
        let mut prover = BruteProver::default();
        let prior = engine.bdd().var(pred.var());
        let result = engine
            .compute_abstraction(&mut ctx, &store, &mut prover, prior, &path, &[pred])
            .unwrap();
        // x - 1 can land on either side of zero
        assert_eq!(result, TRUE, "{kind:?}");
        assert_eq!(prover.depth(), 0, "assertion stack must be balanced");
    }
}

/// `x' == 0 || x' == 1` with the predicates `x == 0` and `x == 1`: the exact
/// abstraction keeps the exclusive-or structure, the per-predicate one cannot.
fn choice_scenario(
    ctx: &mut Context,
) -> (PredicateStore, Vec<PredicateRef>, PathFormula) {
    let mut store = PredicateStore::default();
    let x = ctx.int_symbol("x");
    let zero = ctx.int_lit(0);
    let one = ctx.int_lit(1);
    let atom0 = ctx.equal(x, zero);
    let atom1 = ctx.equal(x, one);
    let preds = vec![store.intern(ctx, atom0), store.intern(ctx, atom1)];

    let x2 = ctx.int_symbol("x@2");
    let is_zero = ctx.equal(x2, zero);
    let is_one = ctx.equal(x2, one);
    let formula = ctx.or(is_zero, is_one);
    let path = PathFormula::new(ctx, formula);
    (store, preds, path)
}

fn minterms(engine: &mut AbstractionEngine, f: BddRef, preds: &[PredicateRef]) -> Vec<Vec<bool>> {
    let vars: Vec<u32> = preds.iter().map(|p| p.var()).collect();
    let mut terms = engine.bdd().minterms(f, &vars);
    terms.sort();
    terms
}

#[test]
fn boolean_entails_cartesian() {
    let mut ctx = Context::default();
    let (store, preds, path) = choice_scenario(&mut ctx);

    let mut boolean = engine(AbstractionKind::Boolean);
    let mut prover = BruteProver::default();
    let exact = boolean
        .compute_abstraction(&mut ctx, &store, &mut prover, TRUE, &path, &preds)
        .unwrap();

    let mut cartesian = engine(AbstractionKind::Cartesian);
    let approx = cartesian
        .compute_abstraction(&mut ctx, &store, &mut prover, TRUE, &path, &preds)
        .unwrap();

    let exact_terms = minterms(&mut boolean, exact, &preds);
    let approx_terms = minterms(&mut cartesian, approx, &preds);
    assert!(
        exact_terms.iter().all(|t| approx_terms.contains(t)),
        "every exact minterm must be allowed by the approximation"
    );
    assert_eq!(exact_terms, vec![vec![false, true], vec![true, false]]);
    assert_eq!(approx, TRUE, "neither predicate is implied on its own");
}

#[test]
fn infeasible_path_gives_bottom() {
    let mut ctx = Context::default();
    let mut store = PredicateStore::default();
    let x = ctx.int_symbol("x");
    let zero = ctx.int_lit(0);
    let atom = ctx.greater(x, zero);
    let pred = store.intern(&ctx, atom);

    // x' == x && x' == x + 1
    let x1 = ctx.int_symbol("x@1");
    let x2 = ctx.int_symbol("x@2");
    let one = ctx.int_lit(1);
    let same = ctx.equal(x2, x1);
    let incremented = ctx.add(x1, one);
    let plus_one = ctx.equal(x2, incremented);
    let formula = ctx.and(same, plus_one);
    let path = PathFormula::new(&ctx, formula);

    for kind in [AbstractionKind::Boolean, AbstractionKind::Cartesian] {
        let mut engine = engine(kind);
        let mut prover = BruteProver::default();
        let result = engine
            .compute_abstraction(&mut ctx, &store, &mut prover, TRUE, &path, &[pred])
            .unwrap();
        assert_eq!(result, FALSE, "{kind:?}");
        // the early bottom exit must pop its frames too
        assert_eq!(prover.depth(), 0, "{kind:?}");
    }
}

#[test]
fn repeated_queries_hit_the_cache() {
    let mut ctx = Context::default();
    let (store, pred, path) = decrement_scenario(&mut ctx);

    for kind in [AbstractionKind::Boolean, AbstractionKind::Cartesian] {
        let mut engine = engine(kind);
        let mut prover = BruteProver::default();
        let prior = engine.bdd().var(pred.var());
        let first = engine
            .compute_abstraction(&mut ctx, &store, &mut prover, prior, &path, &[pred])
            .unwrap();
        let queries_after_first = prover.num_queries;
        assert!(queries_after_first > 0);

        let second = engine
            .compute_abstraction(&mut ctx, &store, &mut prover, prior, &path, &[pred])
            .unwrap();
        assert_eq!(first, second, "caching must not change the result");
        assert_eq!(
            prover.num_queries, queries_after_first,
            "{kind:?}: the repeated computation must be answered from the cache"
        );
    }
}

#[test]
fn model_limit_overapproximates_to_top() {
    let mut ctx = Context::default();
    let (store, preds, path) = choice_scenario(&mut ctx);

    let mut engine = engine(AbstractionKind::Boolean);
    let mut prover = BruteProver::default();
    prover.model_limit = 1;
    let result = engine
        .compute_abstraction(&mut ctx, &store, &mut prover, TRUE, &path, &preds)
        .unwrap();
    assert_eq!(result, TRUE, "exceeding the model limit must fall back to top");
    assert_eq!(prover.depth(), 0);
}

#[test]
fn prover_backed_formula_entailment() {
    let mut ctx = Context::default();
    let x = ctx.int_symbol("x@1");
    let zero = ctx.int_lit(0);
    let one = ctx.int_lit(1);
    let gt_zero = ctx.greater(x, zero);
    let geq_one = ctx.greater_or_equal(x, one);

    let mut prover = BruteProver::default();
    assert!(predabs::abs::formula_entails(&mut ctx, &mut prover, geq_one, gt_zero).unwrap());
    assert!(predabs::abs::formula_entails(&mut ctx, &mut prover, gt_zero, geq_one).unwrap());
    let geq_zero = ctx.greater_or_equal(x, zero);
    assert!(!predabs::abs::formula_entails(&mut ctx, &mut prover, geq_zero, gt_zero).unwrap());
    assert_eq!(prover.depth(), 0);
}

#[test]
fn entailment_on_abstract_formulas() {
    let mut engine = engine(AbstractionKind::Boolean);
    let bdd = engine.bdd();
    let a = bdd.var(0);
    let b = bdd.var(1);
    let both = bdd.and(a, b);
    assert!(engine.entails(both, both));
    assert!(engine.entails(both, a));
    assert!(!engine.entails(a, both));
    assert!(engine.entails(FALSE, a));
    assert!(engine.entails(a, TRUE));
}
