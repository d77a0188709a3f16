/*!
A DPLL engine over boolean atoms.

Every atom stands for a boolean-sorted term, and the map between the two lives here.
Clauses are permanent: the theory only ever emits valid clauses (axiom instances,
propagation explanations, and conflict explanations are all tautologies of the theory),
so nothing is removed on backtracking — only assignments are undone.

Propagation scans the clause database to fixpoint rather than maintaining watch lists;
the scale of the problems the theory core is exercised on keeps this comfortably cheap,
and the scan is immune to the usual watch-list corruption hazards.

Conflict analysis resolves a falsified clause backwards through assignment antecedents
until only decision and assumption literals remain.
The learned clause is added to the database, and its assumption literals are the
unsat-core seeds the outer driver inspects when deciding whether to raise an unfolding
budget.
*/

use rustc_hash::{FxHashMap, FxHashSet};

use crate::{
    misc::log::targets,
    structures::{
        literal::{Atom, Literal},
        term::TermId,
    },
};

/// The source of an assignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssignmentSource {
    /// A free decision.
    Decision,

    /// An assumption, retractable only by the outer driver.
    Assumption,

    /// Forced by the noted clause.
    Clause(u32),
}

/// The result of a propagation pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PropagationResult {
    /// A fixpoint was reached without conflict.
    Quiet,

    /// The noted clause is falsified.
    Conflict(u32),
}

/// The DPLL engine.
#[derive(Default)]
pub struct SatCore {
    // Atom-indexed, with a dummy at index zero.
    values: Vec<Option<bool>>,
    levels: Vec<u32>,
    sources: Vec<AssignmentSource>,
    phase: Vec<bool>,
    atom_terms: Vec<TermId>,

    term_atoms: FxHashMap<TermId, Atom>,

    clauses: Vec<Box<[Literal]>>,

    /// Assignments in order, with the start index of each decision level.
    trail: Vec<Literal>,
    level_starts: Vec<usize>,

    /// True once an empty clause has been added; permanent.
    empty_clause: bool,
}

impl SatCore {
    /// The atom standing for the given boolean term, created on first request.
    pub fn atom_of(&mut self, t: TermId) -> Atom {
        if let Some(atom) = self.term_atoms.get(&t) {
            return *atom;
        }
        if self.values.is_empty() {
            // The dummy slot.
            self.values.push(None);
            self.levels.push(0);
            self.sources.push(AssignmentSource::Decision);
            self.phase.push(false);
            self.atom_terms.push(0);
        }
        let atom = self.values.len() as Atom;
        self.values.push(None);
        self.levels.push(0);
        self.sources.push(AssignmentSource::Decision);
        self.phase.push(false);
        self.atom_terms.push(t);
        self.term_atoms.insert(t, atom);
        atom
    }

    /// The atom standing for the term, if one exists.
    pub fn existing_atom(&self, t: TermId) -> Option<Atom> {
        self.term_atoms.get(&t).copied()
    }

    /// The term an atom stands for.
    pub fn term_of(&self, atom: Atom) -> TermId {
        self.atom_terms[atom as usize]
    }

    /// A count of atoms, excluding the dummy.
    pub fn atom_count(&self) -> usize {
        self.values.len().saturating_sub(1)
    }

    /// The value of an atom.
    pub fn value_of(&self, atom: Atom) -> Option<bool> {
        self.values.get(atom as usize).copied().flatten()
    }

    /// The value of a literal.
    pub fn value_of_lit(&self, literal: Literal) -> Option<bool> {
        self.value_of(literal.atom())
            .map(|v| v == literal.polarity())
    }

    /// The value of the atom standing for a term, if the atom exists.
    pub fn value_of_term(&self, t: TermId) -> Option<bool> {
        self.existing_atom(t).and_then(|a| self.value_of(a))
    }

    /// The decision level of an assigned atom.
    pub fn level_of(&self, atom: Atom) -> u32 {
        self.levels[atom as usize]
    }

    /// The assignment source of an assigned atom.
    pub fn source_of(&self, atom: Atom) -> AssignmentSource {
        self.sources[atom as usize]
    }

    /// The preferred polarity for a free decision on the atom.
    pub fn phase_of(&self, atom: Atom) -> bool {
        self.phase[atom as usize]
    }

    /// Sets the preferred polarity for free decisions on the atom.
    pub fn set_phase(&mut self, atom: Atom, polarity: bool) {
        self.phase[atom as usize] = polarity;
    }

    /// The current decision level.
    pub fn level(&self) -> u32 {
        self.level_starts.len() as u32
    }

    /// The assignment trail, in order.
    pub fn trail(&self) -> &[Literal] {
        &self.trail
    }

    /// True once an empty clause has been added.
    pub fn has_empty_clause(&self) -> bool {
        self.empty_clause
    }

    /// Adds a clause; duplicate literals are merged and tautologies dropped.
    pub fn add_clause(&mut self, mut lits: Vec<Literal>) {
        // Sort by atom so complementary literals are adjacent.
        lits.sort_unstable_by_key(|l| (l.atom(), l.polarity()));
        lits.dedup();
        for window in lits.windows(2) {
            if window[0].atom() == window[1].atom() {
                // p ∨ ¬p.
                return;
            }
        }
        if lits.is_empty() {
            log::trace!(target: targets::KERNEL, "Empty clause added");
            self.empty_clause = true;
            return;
        }
        self.clauses.push(lits.into_boxed_slice());
    }

    /// A count of stored clauses.
    pub fn clause_count(&self) -> usize {
        self.clauses.len()
    }

    /// Records an assignment.
    ///
    /// # Soundness
    /// The atom must be unassigned.
    fn assign(&mut self, literal: Literal, source: AssignmentSource) {
        let atom = literal.atom() as usize;
        debug_assert!(self.values[atom].is_none());
        self.values[atom] = Some(literal.polarity());
        self.levels[atom] = self.level();
        self.sources[atom] = source;
        self.phase[atom] = literal.polarity();
        self.trail.push(literal);
    }

    /// Opens a fresh decision level with the given decision.
    pub fn decide(&mut self, literal: Literal) {
        self.level_starts.push(self.trail.len());
        log::trace!(target: targets::KERNEL, "Decision {literal} at level {}", self.level());
        self.assign(literal, AssignmentSource::Decision);
    }

    /// Asserts an assumption at the current level.
    ///
    /// Returns false if the assumption is already false on the current assignment.
    pub fn assume(&mut self, literal: Literal) -> bool {
        match self.value_of_lit(literal) {
            Some(true) => true,
            Some(false) => false,
            None => {
                self.assign(literal, AssignmentSource::Assumption);
                true
            }
        }
    }

    /// Enqueues a forced assignment with a clause antecedent.
    ///
    /// Returns false if the literal is already false.
    pub fn force(&mut self, literal: Literal, antecedent: u32) -> bool {
        match self.value_of_lit(literal) {
            Some(true) => true,
            Some(false) => false,
            None => {
                self.assign(literal, AssignmentSource::Clause(antecedent));
                true
            }
        }
    }

    /// Propagates to fixpoint by scanning the clause database.
    pub fn propagate(&mut self) -> PropagationResult {
        if self.empty_clause {
            return PropagationResult::Conflict(u32::MAX);
        }
        'scan: loop {
            for ci in 0..self.clauses.len() {
                let mut unassigned: Option<Literal> = None;
                let mut satisfied = false;
                let mut open = 0_usize;
                for &lit in self.clauses[ci].iter() {
                    match self.value_of_lit(lit) {
                        Some(true) => {
                            satisfied = true;
                            break;
                        }
                        Some(false) => {}
                        None => {
                            open += 1;
                            unassigned = Some(lit);
                        }
                    }
                }
                if satisfied {
                    continue;
                }
                match open {
                    0 => {
                        log::trace!(target: targets::KERNEL, "Conflict in clause {ci}");
                        return PropagationResult::Conflict(ci as u32);
                    }
                    1 => {
                        let lit = unassigned.expect("an open literal");
                        self.assign(lit, AssignmentSource::Clause(ci as u32));
                        continue 'scan;
                    }
                    _ => {}
                }
            }
            return PropagationResult::Quiet;
        }
    }

    /// Resolves falsified literals backwards through antecedents until only decision
    /// and assumption literals remain.
    ///
    /// Every returned literal is false on the current assignment; the returned set is a
    /// valid clause.
    pub fn analyze_lits(&self, falsified: &[Literal]) -> Vec<Literal> {
        let mut seen: FxHashSet<Atom> = FxHashSet::default();
        let mut learned: Vec<Literal> = Vec::default();
        let mut stack: Vec<Literal> = falsified.to_vec();
        while let Some(lit) = stack.pop() {
            let atom = lit.atom();
            if !seen.insert(atom) {
                continue;
            }
            debug_assert_eq!(self.value_of_lit(lit), Some(false));
            match self.sources[atom as usize] {
                AssignmentSource::Clause(ci) => {
                    for &other in self.clauses[ci as usize].iter() {
                        if other.atom() != atom {
                            stack.push(other);
                        }
                    }
                }
                AssignmentSource::Decision | AssignmentSource::Assumption => {
                    learned.push(lit);
                }
            }
        }
        learned
    }

    /// Analysis of a falsified clause.
    pub fn analyze(&self, conflict: u32) -> Vec<Literal> {
        if conflict == u32::MAX {
            return Vec::default();
        }
        let falsified = self.clauses[conflict as usize].to_vec();
        self.analyze_lits(&falsified)
    }

    /// True if every literal in the clause stems from an assumption.
    pub fn all_assumptions(&self, lits: &[Literal]) -> bool {
        lits.iter()
            .all(|l| self.sources[l.atom() as usize] == AssignmentSource::Assumption)
    }

    /// The level to backjump to for a learned clause: the second-greatest level among
    /// its literals, or zero.
    pub fn backjump_level(&self, lits: &[Literal]) -> u32 {
        let mut max = 0;
        let mut second = 0;
        for lit in lits {
            let level = self.levels[lit.atom() as usize];
            if level > max {
                second = max;
                max = level;
            } else if level > second && level < max {
                second = level;
            }
        }
        second
    }

    /// Removes all levels above the given level.
    pub fn pop_to(&mut self, level: u32) {
        while self.level() > level {
            let start = self.level_starts.pop().expect("a level start");
            while self.trail.len() > start {
                let lit = self.trail.pop().expect("a trail entry");
                self.values[lit.atom() as usize] = None;
            }
        }
    }

    /// The first unassigned atom, in index order.
    pub fn first_unassigned(&self) -> Option<Atom> {
        (1..self.values.len())
            .find(|&ix| self.values[ix].is_none())
            .map(|ix| ix as Atom)
    }

    /// The unassigned atoms, in index order.
    pub fn unassigned_atoms(&self) -> Vec<Atom> {
        (1..self.values.len())
            .filter(|&ix| self.values[ix].is_none())
            .map(|ix| ix as Atom)
            .collect()
    }

    /// Clears every assignment, retaining atoms, clauses, and phases.
    pub fn reset_assignments(&mut self) {
        for v in self.values.iter_mut() {
            *v = None;
        }
        self.trail.clear();
        self.level_starts.clear();
    }
}

#[cfg(test)]
mod sat_tests {
    use super::*;

    fn lit(a: Atom, p: bool) -> Literal {
        Literal::new(a, p)
    }

    #[test]
    fn unit_propagation_chains() {
        let mut sat = SatCore::default();
        let (p, q, r) = (sat.atom_of(10), sat.atom_of(11), sat.atom_of(12));

        sat.add_clause(vec![lit(p, true)]);
        sat.add_clause(vec![lit(p, false), lit(q, true)]);
        sat.add_clause(vec![lit(q, false), lit(r, true)]);

        assert_eq!(sat.propagate(), PropagationResult::Quiet);
        assert_eq!(sat.value_of(p), Some(true));
        assert_eq!(sat.value_of(q), Some(true));
        assert_eq!(sat.value_of(r), Some(true));
    }

    #[test]
    fn conflict_and_analysis_to_decisions() {
        let mut sat = SatCore::default();
        let (p, q) = (sat.atom_of(10), sat.atom_of(11));

        sat.add_clause(vec![lit(p, false), lit(q, true)]);
        sat.add_clause(vec![lit(p, false), lit(q, false)]);

        sat.decide(lit(p, true));
        let PropagationResult::Conflict(ci) = sat.propagate() else {
            panic!("expected a conflict");
        };

        let learned = sat.analyze(ci);
        assert_eq!(learned, vec![lit(p, false)]);
        assert_eq!(sat.backjump_level(&learned), 0);

        sat.pop_to(0);
        sat.add_clause(learned);
        assert_eq!(sat.propagate(), PropagationResult::Quiet);
        assert_eq!(sat.value_of(p), Some(false));
    }

    #[test]
    fn assumptions_surface_in_analysis() {
        let mut sat = SatCore::default();
        let (a, p) = (sat.atom_of(10), sat.atom_of(11));

        sat.add_clause(vec![lit(a, false), lit(p, true)]);
        sat.add_clause(vec![lit(a, false), lit(p, false)]);

        assert!(sat.assume(lit(a, true)));
        let PropagationResult::Conflict(ci) = sat.propagate() else {
            panic!("expected a conflict");
        };
        let learned = sat.analyze(ci);
        assert_eq!(learned, vec![lit(a, false)]);
        assert!(sat.all_assumptions(&learned));
    }

    #[test]
    fn tautologies_are_dropped() {
        let mut sat = SatCore::default();
        let p = sat.atom_of(10);
        sat.add_clause(vec![lit(p, true), lit(p, false)]);
        assert_eq!(sat.clause_count(), 0);
    }

    #[test]
    fn pop_restores_assignments() {
        let mut sat = SatCore::default();
        let (p, q) = (sat.atom_of(10), sat.atom_of(11));
        sat.add_clause(vec![lit(p, false), lit(q, true)]);

        sat.decide(lit(p, true));
        assert_eq!(sat.propagate(), PropagationResult::Quiet);
        assert_eq!(sat.value_of(q), Some(true));

        sat.pop_to(0);
        assert_eq!(sat.value_of(p), None);
        assert_eq!(sat.value_of(q), None);
        assert_eq!(sat.level(), 0);
    }
}
