/*!
A union-find over terms with per-edge justifications.

Each parent edge carries the dependency under which the joined terms are equal, so the
equality of any two members of a class is explained by joining the dependencies along
their paths to the shared root.
The explanation over-approximates — edges above the divergence point contribute — which
is sound: a dependency is a set of assumptions, and a superset weakens the clause a
consumer emits without invalidating it.

No congruence closure is performed here: structural equality flows through the
[canonizer](crate::canonize) instead, which replaces sub-terms through the solution
map.
*/

use rustc_hash::FxHashMap;

use crate::{
    db::dependency::{DepForest, DepId},
    structures::term::TermId,
};

/// The union-find, with a trail for scope pops.
#[derive(Default)]
pub struct EGraph {
    parents: FxHashMap<TermId, (TermId, DepId)>,
    trail: Vec<TermId>,
}

impl EGraph {
    /// The root of `t`'s class, with the joined dependency of the path.
    pub fn find(&self, t: TermId, deps: &mut DepForest) -> (TermId, DepId) {
        let mut current = t;
        let mut dep = DepForest::NONE;
        while let Some(&(parent, edge)) = self.parents.get(&current) {
            dep = deps.join(dep, edge);
            current = parent;
        }
        (current, dep)
    }

    /// The root of `t`'s class.
    pub fn root(&self, t: TermId) -> TermId {
        let mut current = t;
        while let Some(&(parent, _)) = self.parents.get(&current) {
            current = parent;
        }
        current
    }

    /// Merges the classes of `a` and `b`, which are equal under `dep`.
    ///
    /// Returns true if the classes were distinct.
    pub fn union(&mut self, a: TermId, b: TermId, dep: DepId, deps: &mut DepForest) -> bool {
        let (ra, da) = self.find(a, deps);
        let (rb, db) = self.find(b, deps);
        if ra == rb {
            return false;
        }
        let inner = deps.join(db, dep);
        let edge = deps.join(da, inner);
        self.parents.insert(ra, (rb, edge));
        self.trail.push(ra);
        true
    }

    /// The dependency under which `a` and `b` are equal, if they share a class.
    pub fn explain(&self, a: TermId, b: TermId, deps: &mut DepForest) -> Option<DepId> {
        let (ra, da) = self.find(a, deps);
        let (rb, db) = self.find(b, deps);
        if ra == rb {
            Some(deps.join(da, db))
        } else {
            None
        }
    }

    /// True if `a` and `b` share a class.
    pub fn are_eq(&self, a: TermId, b: TermId) -> bool {
        self.root(a) == self.root(b)
    }

    /// A stamp for the current trail length.
    pub fn mark(&self) -> usize {
        self.trail.len()
    }

    /// Unlinks classes merged after the stamp.
    pub fn undo_to(&mut self, mark: usize) {
        while self.trail.len() > mark {
            let key = self.trail.pop().expect("a trail entry");
            self.parents.remove(&key);
        }
    }

    /// Clears the union-find to its initial state.
    pub fn clear(&mut self) {
        self.parents.clear();
        self.trail.clear();
    }
}

#[cfg(test)]
mod egraph_tests {
    use super::*;
    use crate::structures::literal::Literal;

    #[test]
    fn union_find_explain() {
        let mut deps = DepForest::default();
        let mut graph = EGraph::default();

        let d1 = deps.lit(Literal::new(1, true));
        let d2 = deps.lit(Literal::new(2, true));

        assert!(graph.union(10, 11, d1, &mut deps));
        assert!(graph.union(11, 12, d2, &mut deps));
        assert!(!graph.union(10, 12, DepForest::NONE, &mut deps));

        assert!(graph.are_eq(10, 12));
        assert!(!graph.are_eq(10, 13));

        let dep = graph.explain(10, 12, &mut deps).expect("an explanation");
        let flat = deps.linearize(dep);
        assert!(flat.lits.contains(&Literal::new(1, true)));
        assert!(flat.lits.contains(&Literal::new(2, true)));
    }

    #[test]
    fn undo_unlinks() {
        let mut deps = DepForest::default();
        let mut graph = EGraph::default();

        graph.union(1, 2, DepForest::NONE, &mut deps);
        let mark = graph.mark();
        graph.union(2, 3, DepForest::NONE, &mut deps);
        assert!(graph.are_eq(1, 3));

        graph.undo_to(mark);
        assert!(graph.are_eq(1, 2));
        assert!(!graph.are_eq(1, 3));
    }
}
