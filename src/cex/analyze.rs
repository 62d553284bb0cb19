// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

//! Analyzes an abstract error path: either it is feasible and yields a
//! witness, or it is spurious and Craig interpolation yields new predicates
//! for every cut point.

use crate::art::PointReason;
use crate::error::{EngineError, Result};
use crate::ir::{
    collect_atoms, collect_symbols, congruence_axioms, contains_application, Context, Expr,
    ExprRef,
};
use crate::pf::{shift_after, uninstantiate, PathFormula, SsaMap, FIRST_VERSION};
use crate::prec::{PredicateRef, PredicateStore};
use crate::smt::{with_frame, Group, InterpolatingSession, ProverSession};
use log::{debug, info};
use std::collections::BTreeSet;

/// Order in which trace segments are handed to the solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Suffix,
    Zigzag,
}

#[derive(Debug, Clone, Copy)]
pub struct CexOptions {
    /// Minimize the trace to the segments actually needed for inconsistency
    /// before interpolating.
    pub shrink_trace: bool,
    pub direction: Direction,
    /// Scope interpolation partitions to the innermost open function call, so
    /// the extracted predicates avoid out-of-scope variables.
    pub well_scoped: bool,
    /// Split equality atoms into a pair of inequalities.
    pub split_equalities: bool,
    /// Strengthen the final group with functional-congruence axioms if the
    /// trace contains uninterpreted applications.
    pub add_theory_axioms: bool,
}

impl Default for CexOptions {
    fn default() -> Self {
        Self {
            shrink_trace: false,
            direction: Direction::Forward,
            well_scoped: false,
            split_equalities: false,
            add_theory_axioms: false,
        }
    }
}

/// One abstraction point of the abstract error path: the path formula of the
/// segment leading to it and why the point exists.
#[derive(Debug, Clone)]
pub struct TraceStep {
    pub path: PathFormula,
    pub reason: PointReason,
}

/// Model values of the versioned symbols along a feasible error path.
#[derive(Debug, Clone, Default)]
pub struct Witness {
    pub values: Vec<(ExprRef, ExprRef)>,
}

impl Witness {
    pub fn value_of(&self, symbol: ExprRef) -> Option<ExprRef> {
        self.values
            .iter()
            .find(|(sym, _)| *sym == symbol)
            .map(|(_, value)| *value)
    }
}

#[derive(Debug)]
pub enum TraceInfo {
    Feasible(Witness),
    /// One predicate set per trace point, index-aligned with the input trace.
    /// The first entry is always empty since there is no cut before the root.
    Spurious { new_predicates: Vec<Vec<PredicateRef>> },
}

pub fn analyze(
    ctx: &mut Context,
    trace: &[TraceStep],
    itp: &mut dyn InterpolatingSession,
    prover: &mut dyn ProverSession,
    store: &mut PredicateStore,
    opts: &CexOptions,
) -> Result<TraceInfo> {
    assert!(
        trace.len() >= 2,
        "a trace needs at least two abstraction points"
    );

    // stitch the segments onto one running SSA numbering
    let mut running = SsaMap::default();
    let mut segments = Vec::with_capacity(trace.len());
    for step in trace {
        let shifted = shift_after(ctx, step.path.formula, &running);
        let updates: Vec<(String, u32)> = step
            .path
            .ssa
            .iter()
            .map(|(name, hi)| {
                let base = running.get(name).unwrap_or(FIRST_VERSION);
                (name.to_string(), hi + base - 1)
            })
            .collect();
        for (name, version) in updates {
            running.set_at_least(&name, version);
        }
        segments.push(shifted);
    }

    if opts.add_theory_axioms && segments.iter().any(|s| contains_application(ctx, *s)) {
        let axioms = congruence_axioms(ctx, &segments);
        let last = segments.last_mut().unwrap();
        *last = ctx.and(*last, axioms);
    }

    if opts.shrink_trace {
        if let Some(necessary) = useful_blocks(ctx, prover, &segments, opts.direction)? {
            debug!("trace minimized to {} of {} segments", necessary.len(), segments.len());
            for (idx, segment) in segments.iter_mut().enumerate() {
                if !necessary.contains(&idx) {
                    *segment = ctx.tru();
                }
            }
        }
        // if the search found the full trace satisfiable we fall through and
        // report it feasible below
    }

    itp.reset()?;
    let mut group_of: Vec<Option<Group>> = vec![None; segments.len()];
    for idx in direction_order(segments.len(), opts.direction) {
        group_of[idx] = Some(itp.add_formula(ctx, segments[idx])?);
    }
    let group_of: Vec<Group> = group_of.into_iter().map(|g| g.unwrap()).collect();

    if !itp.is_unsat()? {
        let mut symbols = indexmap::IndexSet::new();
        for segment in &segments {
            symbols.extend(collect_symbols(ctx, *segment));
        }
        let symbols: Vec<ExprRef> = symbols.into_iter().collect();
        let values = itp.witness_values(ctx, &symbols)?;
        info!("abstract error path is feasible");
        return Ok(TraceInfo::Feasible(Witness { values }));
    }

    // one interpolant per cut point
    let mut new_predicates = vec![Vec::new()];
    let mut found_any = false;
    for cut in 1..trace.len() {
        let start = if opts.well_scoped {
            scope_start(trace, cut)
        } else {
            0
        };
        let a_groups = &group_of[start..cut];
        let interpolant = itp.interpolant(ctx, a_groups)?;
        let preds = predicates_from_interpolant(ctx, store, interpolant, opts.split_equalities);
        found_any |= !preds.is_empty();
        new_predicates.push(preds);
    }
    if !found_any {
        return Err(EngineError::RefinementFailed);
    }
    info!("abstract error path is spurious");
    Ok(TraceInfo::Spurious { new_predicates })
}

/// The effective partition start for a cut: the most recent function entry
/// that has not been matched by an exit yet.
fn scope_start(trace: &[TraceStep], cut: usize) -> usize {
    let mut stack = Vec::new();
    for (idx, step) in trace[..cut].iter().enumerate() {
        match step.reason {
            PointReason::FunctionEntry => stack.push(idx),
            PointReason::FunctionExit => {
                stack.pop();
            }
            _ => {}
        }
    }
    stack.last().copied().unwrap_or(0)
}

fn direction_order(len: usize, direction: Direction) -> Vec<usize> {
    match direction {
        Direction::Forward => (0..len).collect(),
        Direction::Suffix => (0..len).rev().collect(),
        Direction::Zigzag => {
            let mut out = Vec::with_capacity(len);
            let (mut lo, mut hi) = (0, len);
            let mut front = true;
            while lo < hi {
                if front {
                    out.push(lo);
                    lo += 1;
                } else {
                    hi -= 1;
                    out.push(hi);
                }
                front = !front;
            }
            out
        }
    }
}

enum BlockSearch {
    /// the necessary set is inconsistent on its own
    Done,
    /// adding this segment made the assertions inconsistent
    Necessary(usize),
    /// all segments asserted and still satisfiable
    Satisfiable,
}

/// Finds a minimal subset of segments whose conjunction is unsatisfiable, or
/// `None` if the whole trace is satisfiable. Minimal in the sense that
/// dropping any one member restores satisfiability.
pub fn useful_blocks(
    ctx: &Context,
    prover: &mut dyn ProverSession,
    segments: &[ExprRef],
    direction: Direction,
) -> Result<Option<BTreeSet<usize>>> {
    let depth_before = prover.depth();
    let mut necessary: BTreeSet<usize> = BTreeSet::new();
    loop {
        let necessary_ref = &necessary;
        let outcome = with_frame(prover, |s| {
            for idx in necessary_ref {
                s.assert_formula(ctx, segments[*idx])?;
            }
            if !necessary_ref.is_empty() && s.is_unsat()? {
                return Ok(BlockSearch::Done);
            }
            for idx in direction_order(segments.len(), direction) {
                if necessary_ref.contains(&idx) {
                    continue;
                }
                s.assert_formula(ctx, segments[idx])?;
                if s.is_unsat()? {
                    return Ok(BlockSearch::Necessary(idx));
                }
            }
            Ok(BlockSearch::Satisfiable)
        })?;
        debug_assert_eq!(prover.depth(), depth_before);
        match outcome {
            BlockSearch::Done => return Ok(Some(necessary)),
            BlockSearch::Necessary(idx) => {
                necessary.insert(idx);
            }
            BlockSearch::Satisfiable => return Ok(None),
        }
    }
}

fn predicates_from_interpolant(
    ctx: &mut Context,
    store: &mut PredicateStore,
    interpolant: ExprRef,
    split_equalities: bool,
) -> Vec<PredicateRef> {
    if ctx.is_true(interpolant) || ctx.is_false(interpolant) {
        return Vec::new();
    }
    let base = uninstantiate(ctx, interpolant);
    let mut out = Vec::new();
    for atom in collect_atoms(ctx, base) {
        if split_equalities {
            if let Expr::Equal(a, b) = ctx.get(atom) {
                let (a, b) = (*a, *b);
                if ctx.tpe(a).is_int() {
                    let geq = ctx.greater_or_equal(a, b);
                    let leq = ctx.less_or_equal(a, b);
                    out.push(store.intern(ctx, geq));
                    out.push(store.intern(ctx, leq));
                    continue;
                }
            }
        }
        out.push(store.intern(ctx, atom));
    }
    out.sort_unstable();
    out.dedup();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_orders() {
        assert_eq!(direction_order(4, Direction::Forward), vec![0, 1, 2, 3]);
        assert_eq!(direction_order(4, Direction::Suffix), vec![3, 2, 1, 0]);
        assert_eq!(direction_order(5, Direction::Zigzag), vec![0, 4, 1, 3, 2]);
    }

    #[test]
    fn scope_tracking() {
        use PointReason::*;
        let mut ctx = Context::default();
        let steps: Vec<TraceStep> = [LoopHead, FunctionEntry, LoopHead, FunctionExit, LoopHead]
            .into_iter()
            .map(|reason| TraceStep {
                path: PathFormula::empty(&mut ctx),
                reason,
            })
            .collect();
        assert_eq!(scope_start(&steps, 1), 0);
        assert_eq!(scope_start(&steps, 2), 1, "inside the call");
        assert_eq!(scope_start(&steps, 3), 1);
        assert_eq!(scope_start(&steps, 4), 0, "the call returned");
    }

    #[test]
    fn interpolant_to_predicates() {
        let mut ctx = Context::default();
        let mut store = PredicateStore::default();
        let x1 = ctx.int_symbol("x@2");
        let zero = ctx.int_lit(0);
        let gt = ctx.greater(x1, zero);
        let eq = ctx.equal(x1, zero);
        let interpolant = ctx.and(gt, eq);

        let preds = predicates_from_interpolant(&mut ctx, &mut store, interpolant, false);
        assert_eq!(preds.len(), 2);
        // atoms are uninstantiated back to base names
        let x = ctx.int_symbol("x");
        let base_gt = ctx.greater(x, zero);
        let base_eq = ctx.equal(x, zero);
        let atoms: Vec<_> = preds.iter().map(|p| store.atom(*p)).collect();
        assert!(atoms.contains(&base_gt) && atoms.contains(&base_eq));

        let tru = ctx.tru();
        assert!(predicates_from_interpolant(&mut ctx, &mut store, tru, false).is_empty());
    }

    #[test]
    fn equality_splitting() {
        let mut ctx = Context::default();
        let mut store = PredicateStore::default();
        let x1 = ctx.int_symbol("x@1");
        let one = ctx.int_lit(1);
        let interpolant = ctx.equal(x1, one);
        let preds = predicates_from_interpolant(&mut ctx, &mut store, interpolant, true);
        assert_eq!(preds.len(), 2);
        let x = ctx.int_symbol("x");
        assert_eq!(store.atom(preds[0]), ctx.greater_or_equal(x, one));
        assert_eq!(store.atom(preds[1]), ctx.greater_or_equal(one, x));
    }
}
