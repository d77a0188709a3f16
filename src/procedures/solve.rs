/*!
The outer solve driver.

A solve is a sequence of searches, each bounded by the unfolding budgets:

```none
          +-----------------+
  +-------| raise budgets   |
  |       +-----------------+
  |               ⌃
  |               | if the unsat core seeds a budget literal
  |               |
  ⌄   +--------+  |            +-----> satisfiable, when a final check concludes Done
------| search |--+------------+-----> unsatisfiable, when the core is budget-free
      +--------+               +-----> unknown, when the cascade gives up or a limit hits
```

Within a search the kernel loop runs: propagate to fixpoint, analyze and learn from
conflicts, honor the budget assumptions, relay fresh assignments to the theory stores,
decide a free atom, and call the final-check cascade once the assignment is complete.

Budgets are raised on unsat cores seeded by budget literals: `length_limit(s, k)`
doubles `k`, and `max_unfolding(d)` moves to `(1 + 3d) / 2`, after which all search
state is reset (terms, atoms, and the clause database persist — every clause is a
theory tautology) and the search reruns.
*/

use crate::{
    config::ArithKind,
    context::{ContextState, GenericContext},
    kernel::sat::PropagationResult,
    misc::log::targets,
    procedures::final_check::FinalCheckOutcome,
    reports::Report,
    structures::{
        literal::Literal,
        term::{SkolemKind, Sort, TermId, TermKind},
    },
    types::err::{self, ErrorKind},
};

/// The conclusion of one bounded search.
enum SearchOutcome {
    /// A model was found.
    Sat,

    /// The constraints are unsatisfiable under the noted budget literals; with none,
    /// unconditionally.
    Unsat { budget_core: Vec<TermId> },

    /// A limit was hit, or the cascade gave up.
    Unknown,
}

/// What honoring the assumptions did.
enum AssumeOutcome {
    /// All assumptions already hold.
    Steady,

    /// An assumption was asserted or the trail was rewound; re-propagate.
    Changed,

    /// An assumption is refuted without any decision; the budget core is attached.
    Failed(Vec<TermId>),
}

impl<R: rand::Rng + std::default::Default> GenericContext<R> {
    /// Determines the satisfiability of the asserted constraints.
    pub fn solve(&mut self) -> Result<Report, ErrorKind> {
        match self.state {
            ContextState::Satisfiable | ContextState::Unsatisfiable => {
                return Ok(self.report());
            }
            _ => {}
        }
        if self.config.arith_engine.value == ArithKind::Disabled {
            return Err(err::BuildError::IncompatibleArithTheory.into());
        }

        let timer = std::time::Instant::now();
        self.state = ContextState::Solving;

        'driver: loop {
            match self.search()? {
                SearchOutcome::Sat => {
                    self.state = ContextState::Satisfiable;
                    break 'driver;
                }
                SearchOutcome::Unsat { budget_core } if budget_core.is_empty() => {
                    self.state = ContextState::Unsatisfiable;
                    break 'driver;
                }
                SearchOutcome::Unsat { budget_core } => {
                    self.counters.restarts += 1;
                    if self.counters.restarts > 32 {
                        self.state = ContextState::Unknown;
                        break 'driver;
                    }
                    self.raise_budgets(&budget_core);
                    self.reset_search();
                    continue 'driver;
                }
                SearchOutcome::Unknown => {
                    self.state = ContextState::Unknown;
                    break 'driver;
                }
            }
        }

        self.counters.time = timer.elapsed();
        Ok(self.report())
    }

    /// One search under the current budgets.
    fn search(&mut self) -> Result<SearchOutcome, ErrorKind> {
        let mut rounds = 0_usize;

        'search: loop {
            rounds += 1;
            if rounds > self.config.final_check_limit.value * 8 {
                return Ok(SearchOutcome::Unknown);
            }

            // Propagate to fixpoint, learning from conflicts.
            match self.sat.propagate() {
                PropagationResult::Conflict(ci) => {
                    self.counters.total_conflicts += 1;
                    if self.counters.total_conflicts > self.config.conflict_limit.value {
                        return Ok(SearchOutcome::Unknown);
                    }
                    let learned = self.sat.analyze(ci);
                    if learned.is_empty() {
                        return Ok(SearchOutcome::Unsat {
                            budget_core: Vec::default(),
                        });
                    }
                    if self.sat.all_assumptions(&learned) {
                        let core = self.budget_core(&learned);
                        return Ok(SearchOutcome::Unsat { budget_core: core });
                    }
                    let level = self.sat.backjump_level(&learned);
                    let pops = (self.sat.level() - level) as usize;
                    self.sat.pop_to(level);
                    self.pop_scopes(pops);
                    self.sat.add_clause(learned);
                    continue 'search;
                }
                PropagationResult::Quiet => {}
            }

            // Honor the budget assumptions.
            match self.ensure_assumptions() {
                AssumeOutcome::Steady => {}
                AssumeOutcome::Changed => continue 'search,
                AssumeOutcome::Failed(core) => {
                    return Ok(SearchOutcome::Unsat { budget_core: core });
                }
            }

            // Relay fresh assignments into the theory stores.
            let clauses_before = self.sat.clause_count();
            self.relay_assignments()?;
            if self.sat.clause_count() != clauses_before {
                continue 'search;
            }

            // Decide a free atom, if any.
            if let Some(atom) = self.choose_atom() {
                let polarity = self.choose_polarity(atom);
                self.counters.total_decisions += 1;
                self.push_scope();
                self.sat.decide(Literal::new(atom, polarity));
                continue 'search;
            }

            // The assignment is complete: final check.
            if self.counters.final_checks > self.config.final_check_limit.value {
                return Ok(SearchOutcome::Unknown);
            }
            match self.final_check()? {
                FinalCheckOutcome::Continue => continue 'search,
                FinalCheckOutcome::Done => return Ok(SearchOutcome::Sat),
                FinalCheckOutcome::GiveUp => return Ok(SearchOutcome::Unknown),
            }
        }
    }

    /// The atom to decide next: index order, or a random pick under the configured
    /// bias.
    fn choose_atom(&mut self) -> Option<crate::structures::literal::Atom> {
        use rand::Rng;
        let bias = self.config.random_decision_bias.value;
        if bias > 0.0 && self.rng.gen_bool(bias) {
            let open = self.sat.unassigned_atoms();
            if !open.is_empty() {
                let ix = self.rng.gen_range(0..open.len());
                return Some(open[ix]);
            }
        }
        self.sat.first_unassigned()
    }

    /// The polarity for a decision: the saved phase, or a random lean.
    fn choose_polarity(&mut self, atom: crate::structures::literal::Atom) -> bool {
        use rand::Rng;
        let lean = self.config.polarity_lean.value;
        if lean > 0.0 && self.rng.gen_bool(lean) {
            return true;
        }
        self.sat.phase_of(atom)
    }

    /// The budget literals among a learned all-assumption clause.
    fn budget_core(&self, learned: &[Literal]) -> Vec<TermId> {
        let mut core = Vec::default();
        for lit in learned {
            let term = self.sat.term_of(lit.atom());
            if let TermKind::Skolem(kind, _) = self.terms.kind(term) {
                if matches!(kind, SkolemKind::MaxUnfolding | SkolemKind::LengthLimit) {
                    core.push(term);
                }
            }
        }
        core
    }

    /// Raises the budgets seeded in a core: `k ← 2k` for length limits,
    /// `d ← (1 + 3d) / 2` for the unfolding depth.
    fn raise_budgets(&mut self, core: &[TermId]) {
        for &term in core {
            match self.terms.kind(term).clone() {
                TermKind::Skolem(SkolemKind::MaxUnfolding, _) => {
                    let d = self.max_unfolding_depth;
                    self.max_unfolding_depth = (1 + 3 * d) / 2;
                    log::info!(
                        target: targets::SOLVER,
                        "Raised unfolding depth to {}",
                        self.max_unfolding_depth,
                    );
                }
                TermKind::Skolem(SkolemKind::LengthLimit, args) => {
                    let s = args[0];
                    let entry = self.length_limits.entry(s).or_insert(1);
                    *entry *= 2;
                    log::info!(
                        target: targets::SOLVER,
                        "Raised length limit of {} to {}",
                        self.terms.display(s),
                        self.length_limits[&s],
                    );
                }
                _ => {}
            }
        }
    }

    /// Asserts any registered assumption not currently true.
    fn ensure_assumptions(&mut self) -> AssumeOutcome {
        let assumptions = self.assumptions.clone();
        let mut changed = false;
        for lit in assumptions {
            match self.sat.value_of_lit(lit) {
                Some(true) => {}
                None => {
                    self.sat.assume(lit);
                    changed = true;
                }
                Some(false) => {
                    // The assumption is refuted on this branch.
                    let fringe = self.sat.analyze_lits(&[lit]);
                    let decision_levels = fringe
                        .iter()
                        .filter(|l| {
                            self.sat.source_of(l.atom())
                                == crate::kernel::sat::AssignmentSource::Decision
                        })
                        .map(|l| self.sat.level_of(l.atom()))
                        .collect::<Vec<_>>();

                    if decision_levels.is_empty() {
                        // Refuted from assumptions alone: a genuine core.
                        let mut core = self.budget_core(&fringe);
                        let term = self.sat.term_of(lit.atom());
                        if !core.contains(&term) {
                            core.push(term);
                        }
                        return AssumeOutcome::Failed(core);
                    }

                    // Rewind below the latest contributing decision and re-assert.
                    let target = decision_levels.iter().max().copied().unwrap_or(1) - 1;
                    let pops = (self.sat.level() - target) as usize;
                    self.sat.pop_to(target);
                    self.pop_scopes(pops);
                    self.sat.assume(lit);
                    return AssumeOutcome::Changed;
                }
            }
        }
        if changed {
            AssumeOutcome::Changed
        } else {
            AssumeOutcome::Steady
        }
    }

    /// Relays kernel assignments made since the last relay into the theory stores.
    pub(crate) fn relay_assignments(&mut self) -> Result<(), ErrorKind> {
        while self.relay_head < self.sat.trail().len() {
            let lit = self.sat.trail()[self.relay_head];
            self.relay_head += 1;

            let term = self.sat.term_of(lit.atom());
            self.register_term(term);

            match self.terms.kind(term).clone() {
                TermKind::Eq(a, b) => self.relay_eq(a, b, lit),

                TermKind::InRe(s, re) => {
                    if lit.polarity() {
                        self.add_membership(s, re, lit)?;
                    } else {
                        let comp = self.terms.re_comp(re);
                        self.add_membership(s, comp, lit)?;
                    }
                }

                TermKind::Contains(hay, needle) => {
                    if lit.polarity() {
                        self.add_contains_decomposition(hay, needle);
                    } else {
                        let len_hay = self.terms.length(hay);
                        let len_needle = self.terms.length(needle);
                        let gt = self.terms.int_lt(len_hay, len_needle);
                        let len_gt = self.lit_of(gt, true);
                        let dep = self.deps.lit(lit);
                        self.eqs.push_nc(crate::db::eqs::NotContains {
                            hay,
                            needle,
                            len_gt,
                            lit,
                            dep,
                        });
                    }
                }

                TermKind::PrefixOf(p, f) => {
                    if lit.polarity() {
                        self.add_prefix_decomposition(p, f);
                    }
                }

                TermKind::SuffixOf(s, f) => {
                    if lit.polarity() {
                        self.add_suffix_decomposition(s, f);
                    }
                }

                TermKind::Skolem(SkolemKind::Accept, _) => {
                    if lit.polarity() {
                        self.propagate_accept(term, lit);
                    }
                }

                TermKind::Skolem(SkolemKind::Step, _) => {
                    if lit.polarity() {
                        self.propagate_step(term, lit);
                    }
                }

                _ => {}
            }
        }
        Ok(())
    }

    /// Relays an equality atom assignment.
    fn relay_eq(&mut self, a: TermId, b: TermId, lit: Literal) {
        let dep = self.deps.lit(lit);
        if !lit.polarity() {
            self.eqs.push_diseq(a, b, lit, dep);
            return;
        }

        if self.terms.sort(a) == Sort::Seq {
            // A variable equated with its own decomposition commits directly: the
            // occurs check would refuse it, yet the chain stays finite because `find`
            // never descends into the expansion's elements.
            if self.try_commit_decomposition(a, b, dep) || self.try_commit_decomposition(b, a, dep)
            {
                self.egraph.union(a, b, dep, &mut self.deps);
                return;
            }
            let lp = self.terms.seq_parts(a);
            let rp = self.terms.seq_parts(b);
            self.eqs.push_eq(lp, rp, dep);
        }
        self.egraph.union(a, b, dep, &mut self.deps);
    }

    /// Commits `var ↦ decomposition` when every part of the decomposition is an
    /// element or piece of `var` itself.
    fn try_commit_decomposition(&mut self, var: TermId, shaped: TermId, dep: crate::db::dependency::DepId) -> bool {
        if !self.terms.is_solvable_var(var) || !self.solution.is_root(var) {
            return false;
        }
        let parts = self.terms.seq_parts(shaped);
        if parts.is_empty() {
            return false;
        }
        for part in &parts {
            if !self.is_piece_of(var, *part) {
                return false;
            }
        }
        log::debug!(
            target: targets::SOLUTION,
            "Decomposed {} = {}",
            self.terms.display(var),
            self.terms.display(shaped),
        );
        self.solution.update(var, shaped, dep);
        true
    }

    /// True if the part is an element or piece of `var`: `unit(nth(var, _))`,
    /// `unit(seq_first(var))`, or a `pre`/`post`/`tail` of `var`.
    fn is_piece_of(&self, var: TermId, part: TermId) -> bool {
        match self.terms.kind(part) {
            TermKind::Unit(e) => match self.terms.kind(*e) {
                TermKind::Nth(s, _) => *s == var,
                TermKind::Skolem(SkolemKind::SeqFirst, args) => args[0] == var,
                _ => false,
            },
            TermKind::Skolem(kind, args) => {
                matches!(kind, SkolemKind::Pre | SkolemKind::Post | SkolemKind::Tail)
                    && args[0] == var
            }
            _ => false,
        }
    }
}
