// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use crate::bdd::{Bdd, BddRef, FALSE, TRUE};
use crate::cache::MemoCache;
use crate::error::Result;
use crate::ir::{congruence_axioms, contains_application, Context, ExprRef};
use crate::pf::{instantiate, PathFormula, SsaMap};
use crate::prec::{PredicateRef, PredicateStore};
use crate::smt::{with_frame, AllSat, ProverSession};
use log::{debug, warn};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbstractionKind {
    /// exact abstraction via all-SAT enumeration over the predicate atoms
    Boolean,
    /// approximate abstraction via one implication check per predicate
    Cartesian,
}

#[derive(Debug, Clone, Copy)]
pub struct AbstractionOptions {
    pub kind: AbstractionKind,
    /// Strengthen abstraction queries with functional-congruence axioms over
    /// the uninterpreted applications of the formula.
    pub add_theory_axioms: bool,
    pub cache_capacity: usize,
}

impl Default for AbstractionOptions {
    fn default() -> Self {
        Self {
            kind: AbstractionKind::Boolean,
            add_theory_axioms: false,
            cache_capacity: 1 << 16,
        }
    }
}

/// Computes the strongest abstract post of a path formula on the predicate
/// lattice. Holds the BDD manager and the query caches; all caches key on
/// interned expression identity.
pub struct AbstractionEngine {
    bdd: Bdd,
    opts: AbstractionOptions,
    /// formula -> satisfiable
    feasibility_cache: MemoCache<ExprRef, bool>,
    /// (formula, instantiated atom) -> implied truth value (None = unconstrained)
    cartesian_cache: MemoCache<(ExprRef, ExprRef), Option<bool>>,
    /// (formula, predicate list) -> exact abstraction
    boolean_cache: MemoCache<(ExprRef, Vec<PredicateRef>), BddRef>,
}

impl AbstractionEngine {
    pub fn new(opts: AbstractionOptions) -> Self {
        Self {
            bdd: Bdd::default(),
            opts,
            feasibility_cache: MemoCache::new(opts.cache_capacity),
            cartesian_cache: MemoCache::new(opts.cache_capacity),
            boolean_cache: MemoCache::new(opts.cache_capacity),
        }
    }

    pub fn kind(&self) -> AbstractionKind {
        self.opts.kind
    }

    pub fn bdd(&mut self) -> &mut Bdd {
        &mut self.bdd
    }

    /// Entailment on abstract formulas, used for coverage checks.
    pub fn entails(&mut self, a: BddRef, b: BddRef) -> bool {
        self.bdd.implies(a, b)
    }

    /// Converts an abstract formula back to a concrete one over the
    /// base-named defining atoms of its predicates.
    pub fn concretize(
        &self,
        ctx: &mut Context,
        store: &PredicateStore,
        f: BddRef,
    ) -> ExprRef {
        let mut memo: HashMap<BddRef, ExprRef> = HashMap::new();
        concretize_rec(&self.bdd, ctx, store, f, &mut memo)
    }

    /// The abstract post of `path` starting from `prior`, over `preds`.
    /// `prior` is interpreted at the entry of the path (version 1), the
    /// result describes its exit state.
    pub fn compute_abstraction(
        &mut self,
        ctx: &mut Context,
        store: &PredicateStore,
        session: &mut dyn ProverSession,
        prior: BddRef,
        path: &PathFormula,
        preds: &[PredicateRef],
    ) -> Result<BddRef> {
        let depth_before = session.depth();

        let prior_expr = self.concretize(ctx, store, prior);
        let mut entry_ssa = SsaMap::default();
        let prior_inst = instantiate(ctx, prior_expr, &mut entry_ssa);
        let mut combined = ctx.and(prior_inst, path.formula);
        if self.opts.add_theory_axioms && contains_application(ctx, combined) {
            let axioms = congruence_axioms(ctx, &[combined]);
            combined = ctx.and(combined, axioms);
        }

        // predicate atoms talk about the state at the end of the path
        let mut exit_ssa = path.ssa.clone();
        let mut inst_atoms = Vec::with_capacity(preds.len());
        let mut neg_atoms = Vec::with_capacity(preds.len());
        for p in preds {
            let atom = store.atom(*p);
            let inst = instantiate(ctx, atom, &mut exit_ssa);
            inst_atoms.push(inst);
            neg_atoms.push(ctx.not(inst));
        }

        let result = match self.opts.kind {
            AbstractionKind::Boolean => {
                self.boolean_abstraction(ctx, session, combined, preds, &inst_atoms)
            }
            AbstractionKind::Cartesian => self.cartesian_abstraction(
                ctx, session, combined, preds, &inst_atoms, &neg_atoms,
            ),
        }?;

        debug_assert_eq!(session.depth(), depth_before, "unbalanced assertion stack");
        Ok(result)
    }

    fn boolean_abstraction(
        &mut self,
        ctx: &Context,
        session: &mut dyn ProverSession,
        combined: ExprRef,
        preds: &[PredicateRef],
        inst_atoms: &[ExprRef],
    ) -> Result<BddRef> {
        let key = (combined, preds.to_vec());
        if let Some(cached) = self.boolean_cache.get(&key) {
            return Ok(cached);
        }

        let bdd = &mut self.bdd;
        let mut result = FALSE;
        let mut on_model = |truth: &[bool]| {
            let cube = bdd.cube(
                preds
                    .iter()
                    .zip(truth.iter())
                    .map(|(p, positive)| (p.var(), *positive)),
            );
            result = bdd.or(result, cube);
        };
        let outcome = with_frame(session, |s| {
            s.assert_formula(ctx, combined)?;
            s.all_sat(ctx, inst_atoms, &mut on_model)
        })?;

        let result = match outcome {
            AllSat::Models(0) => FALSE,
            AllSat::Models(n) => {
                debug!("boolean abstraction: {n} models");
                result
            }
            AllSat::Unbounded => {
                warn!("boolean abstraction hit the model limit, over-approximating to true");
                TRUE
            }
        };
        self.feasibility_cache.insert(combined, result != FALSE);
        self.boolean_cache.insert(key, result);
        Ok(result)
    }

    fn cartesian_abstraction(
        &mut self,
        ctx: &Context,
        session: &mut dyn ProverSession,
        combined: ExprRef,
        preds: &[PredicateRef],
        inst_atoms: &[ExprRef],
        neg_atoms: &[ExprRef],
    ) -> Result<BddRef> {
        let feasible = match self.feasibility_cache.get(&combined) {
            Some(cached) => cached,
            None => {
                let unsat = with_frame(session, |s| {
                    s.assert_formula(ctx, combined)?;
                    s.is_unsat()
                })?;
                self.feasibility_cache.insert(combined, !unsat);
                !unsat
            }
        };
        if !feasible {
            return Ok(FALSE);
        }

        let mut result = TRUE;
        with_frame(session, |s| {
            s.assert_formula(ctx, combined)?;
            for ((pred, atom), neg_atom) in
                preds.iter().zip(inst_atoms.iter()).zip(neg_atoms.iter())
            {
                let key = (combined, *atom);
                let implied = match self.cartesian_cache.get(&key) {
                    Some(cached) => cached,
                    None => {
                        let implied = query_implied_value(ctx, s, *atom, *neg_atom)?;
                        self.cartesian_cache.insert(key, implied);
                        implied
                    }
                };
                if let Some(positive) = implied {
                    let literal = self.bdd.literal(pred.var(), positive);
                    result = self.bdd.and(result, literal);
                }
            }
            Ok(())
        })?;
        Ok(result)
    }
}

/// Checks concrete formula entailment `a |= b` with the prover, used by
/// coverage checks on path formulas. Runs inside its own frame.
pub fn formula_entails(
    ctx: &mut Context,
    session: &mut dyn ProverSession,
    a: ExprRef,
    b: ExprRef,
) -> Result<bool> {
    let not_b = ctx.not(b);
    with_frame(session, |s| {
        s.assert_formula(ctx, a)?;
        s.assert_formula(ctx, not_b)?;
        s.is_unsat()
    })
}

/// Checks whether the current assertions imply the atom, its negation, or
/// neither (unconstrained).
fn query_implied_value(
    ctx: &Context,
    session: &mut dyn ProverSession,
    atom: ExprRef,
    neg_atom: ExprRef,
) -> Result<Option<bool>> {
    // the context implies the atom iff context && !atom is unsat
    let implied_true = with_frame(session, |s| {
        s.assert_formula(ctx, neg_atom)?;
        s.is_unsat()
    })?;
    if implied_true {
        return Ok(Some(true));
    }
    let implied_false = with_frame(session, |s| {
        s.assert_formula(ctx, atom)?;
        s.is_unsat()
    })?;
    Ok(if implied_false { Some(false) } else { None })
}

fn concretize_rec(
    bdd: &Bdd,
    ctx: &mut Context,
    store: &PredicateStore,
    f: BddRef,
    memo: &mut HashMap<BddRef, ExprRef>,
) -> ExprRef {
    if let Some(cached) = memo.get(&f) {
        return *cached;
    }
    let result = match bdd.decompose(f) {
        None => {
            if bdd.is_true(f) {
                ctx.tru()
            } else {
                ctx.fals()
            }
        }
        Some((var, low, high)) => {
            let atom = store.atom_of_var(var);
            let low = concretize_rec(bdd, ctx, store, low, memo);
            let high = concretize_rec(bdd, ctx, store, high, memo);
            ctx.ite(atom, high, low)
        }
    };
    memo.insert(f, result);
    result
}
