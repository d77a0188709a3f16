use std::time::Duration;

/// Counts for various things which count, roughly.
#[derive(Clone, Debug, Default)]
pub struct Counters {
    /// Branch clauses emitted by any splitting rule.
    pub num_splits: usize,

    /// Structured equation reductions performed by the rewriter.
    pub num_reductions: usize,

    /// Rounds in which length coherence fired.
    pub check_length_coherence: usize,

    /// Rounds in which general variable branching fired.
    pub branch_variable: usize,

    /// Rounds in which disequation splitting fired.
    pub solve_nqs: usize,

    /// Rounds in which equation solving fired.
    pub solve_eqs: usize,

    /// Rounds in which disequation branching fired.
    pub branch_nqs: usize,

    /// Theory axioms emitted.
    pub add_axiom: usize,

    /// Extensionality probes proposed.
    pub extensionality: usize,

    /// Rounds in which a collapsed length bound fixed a sequence.
    pub fixed_length: usize,

    /// Rounds in which the int↔string bridge fired.
    pub int_string: usize,

    /// Automaton accept/step propagations.
    pub propagate_automata: usize,

    /// A count of all kernel decisions made.
    pub total_decisions: usize,

    /// A count of every kernel conflict seen during a solve.
    pub total_conflicts: usize,

    /// A count of final-check rounds.
    pub final_checks: usize,

    /// A count of budget raises by the outer driver.
    pub restarts: usize,

    /// The time taken during a solve.
    pub time: Duration,
}
