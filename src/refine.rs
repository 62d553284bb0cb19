// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

//! Applies the predicates discovered by counterexample analysis to the
//! precision store and invalidates the explored states that were computed
//! with the old precision.

use crate::abs::AbstractionKind;
use crate::art::{Art, PointId};
use crate::bdd::BddRef;
use crate::error::{EngineError, Result};
use crate::prec::{Precision, PredicateRef};
use log::{debug, info};
use std::collections::HashMap;

/// User visible outcome of a verification run.
#[derive(Debug)]
pub enum Verdict {
    Safe,
    Unsafe(crate::cex::Witness),
    Unknown(String),
}

#[derive(Debug, PartialEq, Eq)]
pub enum Refinement {
    /// The precision grew. Everything below `root` was discarded and `root`
    /// is re-queued for exploration under the new precision.
    Progress {
        root: PointId,
        pruned: Vec<PointId>,
    },
    /// No location gained a predicate. Tolerated, the caller re-explores.
    NoProgress,
}

/// Tracks non-progressing refinements per abstract path so that a stalled
/// analysis fails instead of looping.
#[derive(Default)]
pub struct RefinementDriver {
    stall_counts: HashMap<Vec<PointId>, u32>,
}

impl RefinementDriver {
    /// Folds the per-point predicate sets into the precision. The first point
    /// whose precision grew becomes the refinement root: its descendants are
    /// pruned and it is re-queued.
    ///
    /// `error_path` and `new_predicates` are index-aligned (as returned by
    /// counterexample analysis for the same path).
    pub fn refine(
        &mut self,
        art: &mut Art,
        error_path: &[PointId],
        new_predicates: &[Vec<PredicateRef>],
        precision: &mut Precision,
        kind: AbstractionKind,
    ) -> Result<Refinement> {
        assert_eq!(error_path.len(), new_predicates.len());

        let mut root = None;
        for (id, preds) in error_path.iter().zip(new_predicates.iter()) {
            let location = art.get(*id).location;
            let grew = precision.update(location, preds.iter().copied());
            if grew && root.is_none() {
                root = Some(*id);
            }
        }

        match root {
            Some(root) => {
                self.stall_counts.remove(&error_path.to_vec());
                let mut pruned = Vec::new();
                for child in art.children(root).to_vec() {
                    pruned.extend(art.prune(child));
                }
                art.requeue(root);
                info!(
                    "refinement root {root:?}, discarded {} explored points",
                    pruned.len()
                );
                Ok(Refinement::Progress { root, pruned })
            }
            None => {
                let count = self.stall_counts.entry(error_path.to_vec()).or_insert(0);
                *count += 1;
                debug!("refinement made no progress (occurrence {count})");
                // the exact abstraction revisits the same path legitimately,
                // the approximate one is going in circles
                if *count >= 2 && kind == AbstractionKind::Cartesian {
                    Err(EngineError::Stalled)
                } else {
                    Ok(Refinement::NoProgress)
                }
            }
        }
    }

    /// Installs a recomputed abstract formula at a point. The formula is the
    /// only field of an abstraction point that changes after creation.
    pub fn set_abstraction(&self, art: &mut Art, id: PointId, formula: BddRef) {
        art.set_formula(id, formula);
    }
}
