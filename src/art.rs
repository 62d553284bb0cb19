// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

//! Arena of explored abstraction points. The tree mirrors the unwinding of
//! the program between abstraction points; refinement prunes subtrees and
//! re-queues states whose coverage relied on them.

use crate::bdd::BddRef;
use crate::pf::PathFormula;
use crate::prec::LocationId;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointId(u32);

impl PointId {
    fn from_index(index: usize) -> Self {
        PointId(index as u32)
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Why a location is an abstraction point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointReason {
    LoopHead,
    FunctionEntry,
    FunctionExit,
    ErrorLocation,
    UserDeclared,
}

#[derive(Debug, Clone)]
pub struct AbstractionPoint {
    pub location: LocationId,
    pub reason: PointReason,
    /// abstract state at this point, only updated by the refinement driver
    pub formula: BddRef,
    /// path formula accumulated since the parent abstraction point
    pub path: PathFormula,
    pub parent: Option<PointId>,
}

#[derive(Default)]
pub struct Art {
    points: Vec<Option<AbstractionPoint>>,
    children: Vec<Vec<PointId>>,
    /// covered point -> the point covering it
    covered_by: HashMap<PointId, PointId>,
    /// uncovered or pruned-under points waiting to be explored again
    requeue: Vec<PointId>,
}

impl Art {
    pub fn add(&mut self, point: AbstractionPoint) -> PointId {
        let id = PointId::from_index(self.points.len());
        if let Some(parent) = point.parent {
            self.children[parent.index()].push(id);
        }
        self.points.push(Some(point));
        self.children.push(Vec::new());
        id
    }

    pub fn get(&self, id: PointId) -> &AbstractionPoint {
        self.points[id.index()].as_ref().expect("pruned PointId")
    }

    pub fn contains(&self, id: PointId) -> bool {
        self.points
            .get(id.index())
            .map(|p| p.is_some())
            .unwrap_or(false)
    }

    pub(crate) fn set_formula(&mut self, id: PointId, formula: BddRef) {
        self.points[id.index()]
            .as_mut()
            .expect("pruned PointId")
            .formula = formula;
    }

    pub fn children(&self, id: PointId) -> &[PointId] {
        &self.children[id.index()]
    }

    /// From `id` up to the root, inclusive.
    pub fn ancestors(&self, id: PointId) -> Vec<PointId> {
        let mut out = vec![id];
        let mut current = id;
        while let Some(parent) = self.get(current).parent {
            out.push(parent);
            current = parent;
        }
        out
    }

    /// From the root down to `id`, inclusive. This is the abstract error path
    /// handed to counterexample analysis.
    pub fn path_from_root(&self, id: PointId) -> Vec<PointId> {
        let mut path = self.ancestors(id);
        path.reverse();
        path
    }

    /// The ancestor closest to the root that sits at `location`.
    pub fn lowest_ancestor_at(&self, id: PointId, location: LocationId) -> Option<PointId> {
        self.path_from_root(id)
            .into_iter()
            .find(|p| self.get(*p).location == location)
    }

    /// All live points of the subtree rooted at `id`, in DFS order.
    pub fn subtree(&self, id: PointId) -> Vec<PointId> {
        let mut out = Vec::new();
        let mut todo = vec![id];
        while let Some(current) = todo.pop() {
            if !self.contains(current) {
                continue;
            }
            out.push(current);
            todo.extend(self.children[current.index()].iter().copied());
        }
        out
    }

    pub fn cover(&mut self, covered: PointId, covering: PointId) {
        debug_assert!(self.contains(covered) && self.contains(covering));
        self.covered_by.insert(covered, covering);
    }

    pub fn is_covered(&self, id: PointId) -> bool {
        self.covered_by.contains_key(&id)
    }

    /// Uncovers every covered point in the subtree and re-queues it.
    pub fn mark_subtree_uncovered(&mut self, id: PointId) {
        for point in self.subtree(id) {
            if self.covered_by.remove(&point).is_some() {
                self.requeue.push(point);
            }
        }
    }

    /// Removes the subtree rooted at `id`. Points that were covered by a
    /// removed point lose their coverage and get re-queued. Returns the
    /// removed ids.
    pub fn prune(&mut self, id: PointId) -> Vec<PointId> {
        let removed = self.subtree(id);
        if let Some(parent) = self.get(id).parent {
            self.children[parent.index()].retain(|c| *c != id);
        }
        for point in &removed {
            self.points[point.index()] = None;
            self.children[point.index()].clear();
            self.covered_by.remove(point);
        }
        // coverage by a removed point no longer holds
        let orphaned: Vec<PointId> = self
            .covered_by
            .iter()
            .filter(|(_, covering)| !self.contains(**covering))
            .map(|(covered, _)| *covered)
            .collect();
        for point in orphaned {
            self.covered_by.remove(&point);
            self.requeue.push(point);
        }
        log::debug!("pruned {} points under {id:?}", removed.len());
        removed
    }

    /// Schedules a live point to be explored again.
    pub fn requeue(&mut self, id: PointId) {
        debug_assert!(self.contains(id));
        self.requeue.push(id);
    }

    /// Drains the list of points that need to be explored again.
    pub fn take_requeued(&mut self) -> Vec<PointId> {
        std::mem::take(&mut self.requeue)
    }

    pub fn num_live_points(&self) -> usize {
        self.points.iter().filter(|p| p.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bdd::TRUE;
    use crate::ir::Context;

    fn point(ctx: &mut Context, loc: u32, parent: Option<PointId>) -> AbstractionPoint {
        AbstractionPoint {
            location: LocationId::new(loc),
            reason: PointReason::LoopHead,
            formula: TRUE,
            path: PathFormula::empty(ctx),
            parent,
        }
    }

    #[test]
    fn ancestor_walk() {
        let mut ctx = Context::default();
        let mut art = Art::default();
        let root = art.add(point(&mut ctx, 0, None));
        let a = art.add(point(&mut ctx, 1, Some(root)));
        let b = art.add(point(&mut ctx, 0, Some(a)));
        assert_eq!(art.path_from_root(b), vec![root, a, b]);
        assert_eq!(art.lowest_ancestor_at(b, LocationId::new(0)), Some(root));
        assert_eq!(art.lowest_ancestor_at(b, LocationId::new(7)), None);
    }

    #[test]
    fn prune_uncovers_dependents() {
        let mut ctx = Context::default();
        let mut art = Art::default();
        let root = art.add(point(&mut ctx, 0, None));
        let a = art.add(point(&mut ctx, 1, Some(root)));
        let b = art.add(point(&mut ctx, 2, Some(a)));
        // a sibling branch covered by a node inside the doomed subtree
        let other = art.add(point(&mut ctx, 1, Some(root)));
        art.cover(other, b);
        assert!(art.is_covered(other));

        let removed = art.prune(a);
        assert_eq!(removed.len(), 2);
        assert!(!art.contains(a) && !art.contains(b));
        assert!(art.contains(other));
        assert!(!art.is_covered(other));
        assert_eq!(art.take_requeued(), vec![other]);
        assert_eq!(art.children(root), &[other]);
        assert_eq!(art.num_live_points(), 2);
    }

    #[test]
    fn uncover_subtree() {
        let mut ctx = Context::default();
        let mut art = Art::default();
        let root = art.add(point(&mut ctx, 0, None));
        let a = art.add(point(&mut ctx, 1, Some(root)));
        let b = art.add(point(&mut ctx, 2, Some(a)));
        let outside = art.add(point(&mut ctx, 3, Some(root)));
        art.cover(b, outside);
        art.mark_subtree_uncovered(a);
        assert!(!art.is_covered(b));
        assert_eq!(art.take_requeued(), vec![b]);
    }
}
