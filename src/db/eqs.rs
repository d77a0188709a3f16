/*!
The equation store: pending sequence equations, disequations, and negative containment
constraints.

All three containers are append-only within a scope and truncate to their stamps on a
pop.
Entries are not removed when resolved: the cascade re-examines every entry each round,
and an entry whose sides have become identical under the current solution map reduces
to nothing at negligible cost.
This keeps the trail for these containers trivial — restoration is truncation — while
the solution map's trail carries the state that actually changes under backtracking.

Equation ids are fresh and monotone, giving the cascade a stable processing order.
*/

use crate::{
    db::dependency::DepId,
    structures::{literal::Literal, term::TermId},
};

/// A structured equation: the concatenations of the two part-lists are equal under the
/// dependency.
#[derive(Clone, Debug)]
pub struct Equation {
    /// A fresh, monotone id for ordering.
    pub id: u32,

    /// Parts of the left side, in concatenation order.
    pub lhs: Vec<TermId>,

    /// Parts of the right side, in concatenation order.
    pub rhs: Vec<TermId>,

    /// The assumptions under which the equation holds.
    pub dep: DepId,
}

/// A disequation between two terms, from a negatively assigned equality atom.
#[derive(Clone, Debug)]
pub struct Disequation {
    /// The left term.
    pub lhs: TermId,

    /// The right term.
    pub rhs: TermId,

    /// The (negative) equality literal the disequation stems from.
    pub lit: Literal,

    /// The assumptions under which the disequation holds.
    pub dep: DepId,
}

/// A negative containment constraint, carrying the guard literal whose truth value
/// controls unfolding.
#[derive(Clone, Debug)]
pub struct NotContains {
    /// The sequence searched in.
    pub hay: TermId,

    /// The sequence searched for.
    pub needle: TermId,

    /// A literal asserting `|needle| > |hay|`; when true the constraint holds outright.
    pub len_gt: Literal,

    /// The (negative) containment literal.
    pub lit: Literal,

    /// The assumptions under which the constraint holds.
    pub dep: DepId,
}

/// Stamps for the three containers, taken together on a push.
#[derive(Clone, Copy, Debug, Default)]
pub struct EqStoreMark {
    eqs: usize,
    diseqs: usize,
    ncs: usize,
}

/// The store of pending equations, disequations, and negative containments.
#[derive(Default)]
pub struct EqStore {
    eqs: Vec<Equation>,
    diseqs: Vec<Disequation>,
    ncs: Vec<NotContains>,
    next_eq_id: u32,
}

impl EqStore {
    /// Pushes an equation between two part-lists.
    pub fn push_eq(&mut self, lhs: Vec<TermId>, rhs: Vec<TermId>, dep: DepId) {
        let id = self.next_eq_id;
        self.next_eq_id += 1;
        self.eqs.push(Equation { id, lhs, rhs, dep });
    }

    /// Pushes a disequation.
    pub fn push_diseq(&mut self, lhs: TermId, rhs: TermId, lit: Literal, dep: DepId) {
        self.diseqs.push(Disequation { lhs, rhs, lit, dep });
    }

    /// Pushes a negative containment constraint.
    pub fn push_nc(&mut self, nc: NotContains) {
        self.ncs.push(nc);
    }

    /// The pending equations.
    pub fn equations(&self) -> &[Equation] {
        &self.eqs
    }

    /// The pending disequations.
    pub fn disequations(&self) -> &[Disequation] {
        &self.diseqs
    }

    /// The pending negative containments.
    pub fn not_contains(&self) -> &[NotContains] {
        &self.ncs
    }

    /// A stamp over all three containers.
    pub fn mark(&self) -> EqStoreMark {
        EqStoreMark {
            eqs: self.eqs.len(),
            diseqs: self.diseqs.len(),
            ncs: self.ncs.len(),
        }
    }

    /// Truncates all three containers to the stamp.
    pub fn undo_to(&mut self, mark: EqStoreMark) {
        self.eqs.truncate(mark.eqs);
        self.diseqs.truncate(mark.diseqs);
        self.ncs.truncate(mark.ncs);
    }

    /// Clears the store to its initial state, retaining the id counter.
    pub fn clear(&mut self) {
        self.eqs.clear();
        self.diseqs.clear();
        self.ncs.clear();
    }
}

#[cfg(test)]
mod eqs_tests {
    use super::*;
    use crate::db::dependency::DepForest;

    #[test]
    fn equation_ids_are_monotone() {
        let mut store = EqStore::default();
        store.push_eq(vec![1], vec![2], DepForest::NONE);
        store.push_eq(vec![3], vec![4], DepForest::NONE);
        let ids = store.equations().iter().map(|e| e.id).collect::<Vec<_>>();
        assert!(ids[0] < ids[1]);
    }

    #[test]
    fn marks_roundtrip() {
        let mut store = EqStore::default();
        store.push_eq(vec![1], vec![2], DepForest::NONE);
        let mark = store.mark();
        store.push_eq(vec![3], vec![4], DepForest::NONE);
        store.push_diseq(5, 6, Literal::new(1, false), DepForest::NONE);
        store.undo_to(mark);
        assert_eq!(store.equations().len(), 1);
        assert!(store.disequations().is_empty());
    }
}
