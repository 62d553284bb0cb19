// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

//! Reduced ordered BDDs over predicate variables. Abstract formulas of the
//! predicate lattice are nodes in here: `TRUE` is Top, `FALSE` is Bottom and
//! entailment is implication validity.

use crate::cache::MemoCache;
use log::debug;
use std::fmt::{Debug, Formatter};

#[derive(PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
pub struct BddRef(u32);

impl Debug for BddRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "BddRef({})", self.0)
    }
}

pub const FALSE: BddRef = BddRef(0);
pub const TRUE: BddRef = BddRef(1);

/// Variable index of terminal nodes, sorts after every real variable.
const TERMINAL_VAR: u32 = u32::MAX;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
struct Node {
    var: u32,
    low: BddRef,
    high: BddRef,
}

pub struct Bdd {
    // interned such that structurally equal nodes share their reference
    nodes: indexmap::IndexSet<Node>,
    ite_cache: MemoCache<(BddRef, BddRef, BddRef), BddRef>,
}

const DEFAULT_ITE_CACHE_CAPACITY: usize = 1 << 16;

impl Default for Bdd {
    fn default() -> Self {
        Self::with_cache_capacity(DEFAULT_ITE_CACHE_CAPACITY)
    }
}

impl Bdd {
    /// A BDD manager whose op cache holds at most `capacity` entries before
    /// the oldest half is evicted.
    pub fn with_cache_capacity(capacity: usize) -> Self {
        let mut nodes = indexmap::IndexSet::default();
        // terminal sentinels, allocated first so FALSE = 0 and TRUE = 1
        nodes.insert(Node {
            var: TERMINAL_VAR,
            low: FALSE,
            high: FALSE,
        });
        nodes.insert(Node {
            var: TERMINAL_VAR,
            low: TRUE,
            high: TRUE,
        });
        Bdd {
            nodes,
            ite_cache: MemoCache::new(capacity),
        }
    }

    pub fn is_true(&self, e: BddRef) -> bool {
        e == TRUE
    }

    pub fn is_false(&self, e: BddRef) -> bool {
        e == FALSE
    }

    fn is_terminal(&self, e: BddRef) -> bool {
        e == TRUE || e == FALSE
    }

    fn node(&self, e: BddRef) -> Node {
        *self.nodes.get_index(e.0 as usize).expect("Invalid BddRef!")
    }

    pub fn var_of(&self, e: BddRef) -> u32 {
        self.node(e).var
    }

    fn mk(&mut self, var: u32, low: BddRef, high: BddRef) -> BddRef {
        if low == high {
            return low;
        }
        let (index, _) = self.nodes.insert_full(Node { var, low, high });
        BddRef(index as u32)
    }

    pub fn var(&mut self, var: u32) -> BddRef {
        self.mk(var, FALSE, TRUE)
    }

    pub fn literal(&mut self, var: u32, positive: bool) -> BddRef {
        if positive {
            self.mk(var, FALSE, TRUE)
        } else {
            self.mk(var, TRUE, FALSE)
        }
    }

    fn cofactor(&self, e: BddRef, var: u32) -> (BddRef, BddRef) {
        let node = self.node(e);
        if self.is_terminal(e) || var < node.var {
            (e, e)
        } else {
            debug_assert_eq!(var, node.var);
            (node.low, node.high)
        }
    }

    /// The universal ternary operation: `ite(f, g, h) = (f ∧ g) ∨ (¬f ∧ h)`.
    pub fn ite(&mut self, f: BddRef, g: BddRef, h: BddRef) -> BddRef {
        if f == TRUE {
            return g;
        }
        if f == FALSE {
            return h;
        }
        if g == h {
            return g;
        }
        if g == TRUE && h == FALSE {
            return f;
        }
        if let Some(cached) = self.ite_cache.get(&(f, g, h)) {
            return cached;
        }

        let var = self
            .var_of(f)
            .min(self.var_of(g))
            .min(self.var_of(h));
        debug_assert_ne!(var, TERMINAL_VAR);
        let (f0, f1) = self.cofactor(f, var);
        let (g0, g1) = self.cofactor(g, var);
        let (h0, h1) = self.cofactor(h, var);
        let low = self.ite(f0, g0, h0);
        let high = self.ite(f1, g1, h1);
        let result = self.mk(var, low, high);
        self.ite_cache.insert((f, g, h), result);
        debug!("ite({f:?}, {g:?}, {h:?}) = {result:?}");
        result
    }

    pub fn not(&mut self, f: BddRef) -> BddRef {
        self.ite(f, FALSE, TRUE)
    }

    pub fn and(&mut self, f: BddRef, g: BddRef) -> BddRef {
        self.ite(f, g, FALSE)
    }

    pub fn or(&mut self, f: BddRef, g: BddRef) -> BddRef {
        self.ite(f, TRUE, g)
    }

    /// Checks entailment: does `f` imply `g` for every assignment?
    pub fn implies(&mut self, f: BddRef, g: BddRef) -> bool {
        self.ite(f, g, TRUE) == TRUE
    }

    /// Conjunction of literals, e.g. one satisfying assignment of the predicate vector.
    pub fn cube(&mut self, literals: impl IntoIterator<Item = (u32, bool)>) -> BddRef {
        let mut literals: Vec<(u32, bool)> = literals.into_iter().collect();
        literals.sort_by_key(|(v, _)| *v);
        let mut current = TRUE;
        for (var, positive) in literals.into_iter().rev() {
            current = if positive {
                self.mk(var, FALSE, current)
            } else {
                self.mk(var, current, FALSE)
            };
        }
        current
    }

    pub fn eval(&self, f: BddRef, assignment: &impl Fn(u32) -> bool) -> bool {
        let mut current = f;
        while !self.is_terminal(current) {
            let node = self.node(current);
            current = if assignment(node.var) {
                node.high
            } else {
                node.low
            };
        }
        current == TRUE
    }

    /// All satisfying assignments of `f` over the given (ascending) variable list.
    /// The variables must cover the support of `f`.
    pub fn minterms(&self, f: BddRef, vars: &[u32]) -> Vec<Vec<bool>> {
        let mut out = Vec::new();
        let mut prefix = Vec::with_capacity(vars.len());
        self.minterms_rec(f, vars, &mut prefix, &mut out);
        out
    }

    fn minterms_rec(
        &self,
        f: BddRef,
        vars: &[u32],
        prefix: &mut Vec<bool>,
        out: &mut Vec<Vec<bool>>,
    ) {
        if f == FALSE {
            return;
        }
        match vars.split_first() {
            None => {
                debug_assert_eq!(f, TRUE, "variable list does not cover the BDD support");
                out.push(prefix.clone());
            }
            Some((var, rest)) => {
                let (low, high) = if self.var_of(f) == *var {
                    let node = self.node(f);
                    (node.low, node.high)
                } else {
                    // f does not branch on var here
                    (f, f)
                };
                prefix.push(false);
                self.minterms_rec(low, rest, prefix, out);
                prefix.pop();
                prefix.push(true);
                self.minterms_rec(high, rest, prefix, out);
                prefix.pop();
            }
        }
    }

    /// Shannon decomposition `(var, low, high)`, `None` for terminals.
    pub fn decompose(&self, e: BddRef) -> Option<(u32, BddRef, BddRef)> {
        if self.is_terminal(e) {
            None
        } else {
            let node = self.node(e);
            Some((node.var, node.low, node.high))
        }
    }

    /// The variables the function actually depends on, ascending.
    pub fn support(&self, f: BddRef) -> Vec<u32> {
        let mut vars = std::collections::BTreeSet::new();
        let mut todo = vec![f];
        let mut seen = std::collections::HashSet::new();
        while let Some(e) = todo.pop() {
            if self.is_terminal(e) || !seen.insert(e) {
                continue;
            }
            let node = self.node(e);
            vars.insert(node.var);
            todo.push(node.low);
            todo.push(node.high);
        }
        vars.into_iter().collect()
    }
}
