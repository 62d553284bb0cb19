// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

//! Predicates and the precision store. A predicate is an interned boolean
//! atom; its intern index doubles as the BDD variable, so identical atoms
//! always map to the same variable.

use crate::ir::{Context, ExprRef, Type};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocationId(u32);

impl LocationId {
    pub fn new(id: u32) -> Self {
        LocationId(id)
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PredicateRef(u32);

impl PredicateRef {
    /// The BDD variable this predicate abstracts to.
    pub fn var(&self) -> u32 {
        self.0
    }
}

/// Interns predicate atoms. The atom must be a base-named (unversioned)
/// boolean expression.
#[derive(Default)]
pub struct PredicateStore {
    atoms: indexmap::IndexSet<ExprRef>,
}

impl PredicateStore {
    pub fn intern(&mut self, ctx: &Context, atom: ExprRef) -> PredicateRef {
        debug_assert_eq!(ctx.tpe(atom), Type::Bool);
        let (index, _) = self.atoms.insert_full(atom);
        PredicateRef(index as u32)
    }

    /// The defining atom of the predicate abstracted by a BDD variable.
    pub fn atom_of_var(&self, var: u32) -> ExprRef {
        self.atom(PredicateRef(var))
    }

    pub fn atom(&self, pred: PredicateRef) -> ExprRef {
        *self
            .atoms
            .get_index(pred.0 as usize)
            .expect("Invalid PredicateRef!")
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }
}

/// Tracks which predicates matter at which program location. Refinement only
/// ever adds predicates.
#[derive(Default)]
pub struct Precision {
    global: BTreeSet<PredicateRef>,
    by_location: HashMap<LocationId, BTreeSet<PredicateRef>>,
}

impl Precision {
    /// Adds predicates at a location. Returns true iff the set grew.
    pub fn update(
        &mut self,
        location: LocationId,
        preds: impl IntoIterator<Item = PredicateRef>,
    ) -> bool {
        let set = self.by_location.entry(location).or_default();
        let mut grew = false;
        for pred in preds {
            if !self.global.contains(&pred) {
                grew |= set.insert(pred);
            }
        }
        grew
    }

    pub fn add_global(&mut self, pred: PredicateRef) -> bool {
        self.global.insert(pred)
    }

    /// The predicates to track at a location, in ascending variable order.
    pub fn relevant_predicates(&self, location: LocationId) -> Vec<PredicateRef> {
        let local = self.by_location.get(&location);
        self.global
            .iter()
            .chain(local.into_iter().flatten())
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
