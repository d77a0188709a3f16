/*!
The dependency manager: justification sets, built by join, flattened on demand.

A dependency is a DAG whose leaves are assumptions — a boolean [literal](Literal)
currently true, or a pair of terms known equal — and whose internal nodes are binary
joins.
A dependency is equivalent in information content to its set of leaves; [linearize]
(DepForest::linearize) yields that set.

Dependencies are threaded through every inference so that a conflict clause or a
propagated literal cites exactly the subset of current assumptions it relies on.

Nodes are held in an arena and referenced by [DepId]; [DepId::NONE](DepForest::NONE) is
the identity of join.
The arena is scoped: nodes created after a stamp are dropped when the stamp is popped,
which is sound as every container holding a [DepId] is popped in tandem.
*/

use rustc_hash::FxHashSet;

use crate::structures::{literal::Literal, term::TermId};

/// The index of a dependency node in the forest.
pub type DepId = u32;

/// An atomic justification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Assumption {
    /// A boolean literal, currently assigned true.
    Lit(Literal),

    /// A pair of terms known equal in the equality graph.
    Eq(TermId, TermId),
}

#[derive(Clone, Copy, Debug)]
enum DepNode {
    Leaf(Assumption),
    Join(DepId, DepId),
}

/// The flattened leaves of a dependency.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Linearized {
    /// Literal leaves, each currently assigned true.
    pub lits: Vec<Literal>,

    /// Term-pair leaves, each currently equal in the equality graph.
    pub eqs: Vec<(TermId, TermId)>,
}

/// The arena of dependency nodes.
pub struct DepForest {
    nodes: Vec<DepNode>,
}

impl Default for DepForest {
    fn default() -> Self {
        // Slot zero backs the NONE sentinel and is never read.
        DepForest {
            nodes: vec![DepNode::Join(0, 0)],
        }
    }
}

impl DepForest {
    /// The empty dependency, the identity of [join](DepForest::join).
    pub const NONE: DepId = 0;

    /// A new leaf from an assumption.
    pub fn leaf(&mut self, assumption: Assumption) -> DepId {
        let id = self.nodes.len() as DepId;
        self.nodes.push(DepNode::Leaf(assumption));
        id
    }

    /// A new leaf from a literal.
    pub fn lit(&mut self, literal: Literal) -> DepId {
        self.leaf(Assumption::Lit(literal))
    }

    /// The union of two dependencies.
    pub fn join(&mut self, a: DepId, b: DepId) -> DepId {
        if a == Self::NONE || a == b {
            return b;
        }
        if b == Self::NONE {
            return a;
        }
        let id = self.nodes.len() as DepId;
        self.nodes.push(DepNode::Join(a, b));
        id
    }

    /// The flat leaf set of a dependency, deduplicated.
    pub fn linearize(&self, dep: DepId) -> Linearized {
        let mut out = Linearized::default();
        if dep == Self::NONE {
            return out;
        }
        let mut seen = FxHashSet::default();
        let mut stack = vec![dep];
        while let Some(id) = stack.pop() {
            if id == Self::NONE || !seen.insert(id) {
                continue;
            }
            match self.nodes[id as usize] {
                DepNode::Leaf(Assumption::Lit(l)) => {
                    if !out.lits.contains(&l) {
                        out.lits.push(l);
                    }
                }
                DepNode::Leaf(Assumption::Eq(a, b)) => {
                    if !out.eqs.contains(&(a, b)) {
                        out.eqs.push((a, b));
                    }
                }
                DepNode::Join(a, b) => {
                    stack.push(a);
                    stack.push(b);
                }
            }
        }
        out
    }

    /// A stamp for the current size of the arena.
    pub fn mark(&self) -> usize {
        self.nodes.len()
    }

    /// Drops nodes created after the stamp.
    pub fn truncate(&mut self, mark: usize) {
        self.nodes.truncate(mark);
    }

    /// Clears the forest to its initial state.
    pub fn clear(&mut self) {
        self.nodes.truncate(1);
    }
}

#[cfg(test)]
mod dependency_tests {
    use super::*;

    #[test]
    fn join_identity() {
        let mut forest = DepForest::default();
        let l = forest.lit(Literal::new(1, true));
        assert_eq!(forest.join(DepForest::NONE, l), l);
        assert_eq!(forest.join(l, DepForest::NONE), l);
        assert_eq!(forest.join(l, l), l);
    }

    #[test]
    fn linearize_deduplicates() {
        let mut forest = DepForest::default();
        let p = forest.lit(Literal::new(1, true));
        let q = forest.lit(Literal::new(2, false));
        let pq = forest.join(p, q);
        let pqp = forest.join(pq, p);
        let flat = forest.linearize(pqp);
        assert_eq!(flat.lits.len(), 2);
        assert!(flat.lits.contains(&Literal::new(1, true)));
        assert!(flat.lits.contains(&Literal::new(2, false)));
        assert!(flat.eqs.is_empty());
    }

    #[test]
    fn linearize_collects_term_pairs() {
        let mut forest = DepForest::default();
        let e = forest.leaf(Assumption::Eq(4, 7));
        let l = forest.lit(Literal::new(3, true));
        let joined = forest.join(e, l);
        let flat = forest.linearize(joined);
        assert_eq!(flat.lits, vec![Literal::new(3, true)]);
        assert_eq!(flat.eqs, vec![(4, 7)]);
    }

    #[test]
    fn truncation_restores_size() {
        let mut forest = DepForest::default();
        let mark = forest.mark();
        forest.lit(Literal::new(1, true));
        forest.truncate(mark);
        assert_eq!(forest.mark(), mark);
    }
}
