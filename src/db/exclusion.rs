/*!
The exclusion table: pairs of terms known to be distinct after canonicalization.

Recorded pairs cut redundant extensionality probes — once a pair has been refuted by the
rewriter there is no profit in asking the kernel to split on the pair's equality again.

Pairs are kept in a canonical order (smaller id first) and recorded insertions are
undone on pop through a trail.
*/

use rustc_hash::FxHashSet;

use crate::structures::term::TermId;

/// An unordered set of pairs known to be distinct.
#[derive(Default)]
pub struct ExclusionTable {
    pairs: FxHashSet<(TermId, TermId)>,
    trail: Vec<(TermId, TermId)>,
}

impl ExclusionTable {
    fn order(a: TermId, b: TermId) -> (TermId, TermId) {
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    /// Records the pair; true if the pair is new.
    pub fn insert(&mut self, a: TermId, b: TermId) -> bool {
        let pair = Self::order(a, b);
        if self.pairs.insert(pair) {
            self.trail.push(pair);
            true
        } else {
            false
        }
    }

    /// True if the pair is recorded, in either order.
    pub fn contains(&self, a: TermId, b: TermId) -> bool {
        self.pairs.contains(&Self::order(a, b))
    }

    /// A stamp for the current trail length.
    pub fn mark(&self) -> usize {
        self.trail.len()
    }

    /// Removes pairs recorded after the stamp.
    pub fn undo_to(&mut self, mark: usize) {
        while self.trail.len() > mark {
            let pair = self.trail.pop().unwrap();
            self.pairs.remove(&pair);
        }
    }

    /// Clears the table to its initial state.
    pub fn clear(&mut self) {
        self.pairs.clear();
        self.trail.clear();
    }
}

#[cfg(test)]
mod exclusion_tests {
    use super::*;

    #[test]
    fn unordered_membership() {
        let mut table = ExclusionTable::default();
        assert!(table.insert(9, 4));
        assert!(!table.insert(4, 9));
        assert!(table.contains(4, 9));
        assert!(table.contains(9, 4));
    }

    #[test]
    fn undo_removes_recent_pairs() {
        let mut table = ExclusionTable::default();
        table.insert(1, 2);
        let mark = table.mark();
        table.insert(3, 4);
        table.undo_to(mark);
        assert!(table.contains(1, 2));
        assert!(!table.contains(3, 4));
    }
}
