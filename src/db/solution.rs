/*!
The solution map: a backtrackable mapping from terms to replacement terms.

The store is an array indexed by term id, each slot holding a `(replacement, dep)` pair
or nothing.
The contract of an entry `(e, r, d)` is that under the conjunction of the leaves of `d`
the terms `e` and `r` are equal.

Invariants:

- `e ≠ r` for every entry,
- at most one entry per left-hand side,
- the mapping is acyclic when followed through [find](SolutionMap::find).

Chains are forward-only; callers enforce acyclicity by running canonization and the
occurs check before committing an entry.

Every mutation records an inverse in a trail, and [undo_to](SolutionMap::undo_to)
replays inverses in LIFO order — the trail-plus-stamp approach keeps overhead constant
on non-popping paths.

The map also owns the canonizer's memo of computed normal forms.
The memo is hot and frequently rebuilt: it is fully invalidated on any update and on
any pop.
*/

use rustc_hash::FxHashMap;

use crate::{
    db::dependency::{DepForest, DepId},
    misc::log::targets,
    structures::term::TermId,
};

/// The backtrackable map from term to `(replacement, dep)`.
#[derive(Default)]
pub struct SolutionMap {
    slots: Vec<Option<(TermId, DepId)>>,
    trail: Vec<(TermId, Option<(TermId, DepId)>)>,
    cache: FxHashMap<TermId, (TermId, DepId)>,
}

impl SolutionMap {
    /// Writes `e ↦ (r, d)`, stacking any previous value on the trail.
    ///
    /// The caller is responsible for the occurs check: an update must not close a cycle.
    pub fn update(&mut self, e: TermId, r: TermId, d: DepId) {
        debug_assert_ne!(e, r);
        log::trace!(target: targets::SOLUTION, "{e} -> {r} under {d}");
        let slot = e as usize;
        if slot >= self.slots.len() {
            self.slots.resize(slot + 1, None);
        }
        self.trail.push((e, self.slots[slot]));
        self.slots[slot] = Some((r, d));
        self.cache.clear();
    }

    /// The immediate entry for `e`, if any.
    pub fn raw(&self, e: TermId) -> Option<(TermId, DepId)> {
        self.slots.get(e as usize).copied().flatten()
    }

    /// True if `e` has no entry.
    pub fn is_root(&self, e: TermId) -> bool {
        self.raw(e).is_none()
    }

    /// Follows the chain from `e` to its end, joining dependencies along the way.
    pub fn find(&self, e: TermId, deps: &mut DepForest) -> (TermId, DepId) {
        let mut current = e;
        let mut dep = DepForest::NONE;
        while let Some((next, d)) = self.raw(current) {
            dep = deps.join(dep, d);
            current = next;
        }
        (current, dep)
    }

    /// The cached normal form of `e`, if the memo holds one.
    pub fn cached(&self, e: TermId) -> Option<(TermId, DepId)> {
        self.cache.get(&e).copied()
    }

    /// Memoizes the normal form of `e`.
    pub fn memoize(&mut self, e: TermId, normal: TermId, dep: DepId) {
        self.cache.insert(e, (normal, dep));
    }

    /// A stamp for the current trail length.
    pub fn mark(&self) -> usize {
        self.trail.len()
    }

    /// Replays trail inverses back to the stamp and invalidates the memo.
    pub fn undo_to(&mut self, mark: usize) {
        while self.trail.len() > mark {
            let (e, prior) = self.trail.pop().unwrap();
            self.slots[e as usize] = prior;
        }
        self.cache.clear();
    }

    /// Clears the map to its initial state.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.trail.clear();
        self.cache.clear();
    }
}

#[cfg(test)]
mod solution_tests {
    use super::*;

    #[test]
    fn find_follows_chains() {
        let mut deps = DepForest::default();
        let mut map = SolutionMap::default();

        let d1 = deps.lit(crate::structures::literal::Literal::new(1, true));
        let d2 = deps.lit(crate::structures::literal::Literal::new(2, true));

        map.update(5, 6, d1);
        map.update(6, 7, d2);

        let (root, dep) = map.find(5, &mut deps);
        assert_eq!(root, 7);
        let flat = deps.linearize(dep);
        assert_eq!(flat.lits.len(), 2);

        assert!(map.is_root(7));
        assert!(!map.is_root(5));
    }

    #[test]
    fn undo_restores_stacked_writes() {
        let mut deps = DepForest::default();
        let mut map = SolutionMap::default();

        map.update(3, 4, DepForest::NONE);
        let mark = map.mark();
        map.update(3, 9, DepForest::NONE);
        assert_eq!(map.raw(3), Some((9, DepForest::NONE)));

        map.undo_to(mark);
        assert_eq!(map.raw(3), Some((4, DepForest::NONE)));

        map.undo_to(0);
        assert!(map.is_root(3));
        let (root, _) = map.find(3, &mut deps);
        assert_eq!(root, 3);
    }

    #[test]
    fn memo_cleared_on_update() {
        let mut map = SolutionMap::default();
        map.memoize(11, 12, DepForest::NONE);
        assert_eq!(map.cached(11), Some((12, DepForest::NONE)));

        map.update(1, 2, DepForest::NONE);
        assert_eq!(map.cached(11), None);
    }
}
