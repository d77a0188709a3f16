/*!
The regular-language engine: automata, tracked memberships, and the `accept`/`step`
unfolding.

A regex term is compiled to an [automaton](nfa::Nfa) lazily and memoized per term.
Membership `s ∈ R` is handled by:

1. Rewriting to closed form where possible (the [rewriter](crate::rewriter) handles the
   degenerate regexes; a constant sequence is simulated directly).
2. Intersecting against any existing active membership for the same equivalence class —
   the replacement entry carries the prior literals in its dependency, and an empty
   intersection is an immediate conflict.
3. Emitting the initial-state axiom `s ∈ R → accept(s, 0, R, q₀)` over the compiled
   (ε-free) automaton.

An `accept` predicate assigned true unfolds one transition layer through `step`
predicates; each `step` asserts its guard on `nth(s, i)`, a strict length lower bound,
the successor `accept`, and the element-wise decomposition of `s` at position `i`.

Unfolding is bounded: an `accept` beyond the current depth budget forces the negation
of the `max_unfolding` assumption instead of unfolding, which surfaces in an unsat core
and prompts the outer driver to raise the budget and research.
*/

pub mod nfa;

use rustc_hash::FxHashMap;

use crate::{
    context::GenericContext,
    db::dependency::DepId,
    misc::log::targets,
    skolem,
    structures::{
        literal::Literal,
        term::{PredId, TermId},
    },
    types::err::ErrorKind,
};

use nfa::{CharPred, Nfa};

/// An active membership of a sequence in a regular language.
#[derive(Clone, Copy, Debug)]
pub struct Membership {
    /// The constrained sequence.
    pub seq: TermId,

    /// The regex term, after any intersection with prior memberships.
    pub re: TermId,

    /// The literal (or conjunction representative) the membership stems from.
    pub lit: Literal,

    /// The assumptions under which the membership holds.
    pub dep: DepId,
}

/// The automaton table, predicate interner, and active memberships.
#[derive(Default)]
pub struct RegexEngine {
    automata: FxHashMap<TermId, Nfa>,
    preds: Vec<CharPred>,
    pred_ids: FxHashMap<CharPred, PredId>,
    memberships: Vec<Membership>,
}

impl RegexEngine {
    /// Interns a character predicate.
    pub fn intern_pred(&mut self, pred: CharPred) -> PredId {
        if let Some(id) = self.pred_ids.get(&pred) {
            return *id;
        }
        let id = self.preds.len() as PredId;
        self.preds.push(pred.clone());
        self.pred_ids.insert(pred, id);
        id
    }

    /// The interned predicate.
    pub fn pred(&self, id: PredId) -> &CharPred {
        &self.preds[id as usize]
    }

    /// The compiled automaton for a regex term, if one exists.
    pub fn automaton(&self, re: TermId) -> Option<&Nfa> {
        self.automata.get(&re)
    }

    /// Memoizes a compiled automaton.
    pub fn memoize(&mut self, re: TermId, nfa: Nfa) {
        self.automata.insert(re, nfa);
    }

    /// Every tracked membership, oldest first.
    pub fn memberships(&self) -> &[Membership] {
        &self.memberships
    }

    /// The active membership for the sequence: the latest entry, as an intersection
    /// entry supersedes those it merged.
    pub fn active_for(&self, seq: TermId) -> Option<Membership> {
        self.memberships.iter().rev().find(|m| m.seq == seq).copied()
    }

    fn push_membership(&mut self, membership: Membership) {
        self.memberships.push(membership);
    }

    /// A stamp for the membership container.
    pub fn mark(&self) -> usize {
        self.memberships.len()
    }

    /// Truncates the membership container to the stamp.
    ///
    /// Automata and predicates are term-keyed memos and survive pops.
    pub fn undo_to(&mut self, mark: usize) {
        self.memberships.truncate(mark);
    }

    /// Clears search state, retaining the automaton and predicate memos.
    pub fn reset(&mut self) {
        self.memberships.clear();
    }
}

// Dedup tags for emissions from this module.
pub(crate) const TAG_INITIAL: u16 = 20;
pub(crate) const TAG_ACCEPT: u16 = 21;
pub(crate) const TAG_STEP: u16 = 22;
pub(crate) const TAG_MEMBER_EVAL: u16 = 23;

impl<R: rand::Rng + std::default::Default> GenericContext<R> {
    /// Compiles (and memoizes) the automaton for a regex term.
    pub fn ensure_automaton(&mut self, re: TermId) -> Result<(), ErrorKind> {
        if self.regexes.automaton(re).is_some() {
            return Ok(());
        }
        let nfa = nfa::compile(&self.terms, re)?;
        log::debug!(
            target: targets::AUTOMATA,
            "Compiled {} with {} states",
            self.terms.display(re),
            nfa.state_count(),
        );
        self.regexes.memoize(re, nfa);
        Ok(())
    }

    /// Tracks a membership `s ∈ R` stemming from the given literal.
    ///
    /// Fails with [ErrorKind::Regex] if the regex cannot be compiled.
    pub fn add_membership(&mut self, s: TermId, re: TermId, lit: Literal) -> Result<(), ErrorKind> {
        self.ensure_automaton(re)?;

        if self
            .regexes
            .automaton(re)
            .expect("just compiled")
            .is_empty_language()
        {
            // s ∈ ∅ is false outright.
            self.add_axiom(vec![!lit]);
            return Ok(());
        }

        // Intersect against an active membership for the same class.
        let mut support = vec![lit];
        let mut effective = re;
        if let Some(prior) = self.regexes.active_for(s) {
            if prior.re != re {
                let inter = self.terms.re_inter(prior.re, re);
                self.ensure_automaton(inter)?;
                support.push(prior.lit);
                effective = inter;
                if self
                    .regexes
                    .automaton(inter)
                    .expect("just compiled")
                    .is_empty_language()
                {
                    // The memberships are jointly unsatisfiable.
                    let clause = support.iter().map(|l| !*l).collect();
                    self.add_axiom(clause);
                    return Ok(());
                }
            } else {
                // The same membership is already tracked.
                return Ok(());
            }
        }

        let dep = self.deps.lit(lit);
        self.regexes.push_membership(Membership {
            seq: s,
            re: effective,
            lit,
            dep,
        });

        // The initial-state axiom, over the single ε-free start state.
        if self.mark_emitted((TAG_INITIAL, s, effective, 0)) {
            let start = self
                .regexes
                .automaton(effective)
                .expect("compiled above")
                .start();
            let initial = skolem::accept(&mut self.terms, s, 0, effective, start);
            let accept_lit = self.lit_of(initial, true);
            let mut clause: Vec<Literal> = support.iter().map(|l| !*l).collect();
            clause.push(accept_lit);
            self.add_axiom(clause);
        }

        // Track the sequence for length reasoning, bounded by a length budget.
        self.register_term(s);
        self.ensure_length_limit(s);
        Ok(())
    }

    /// Unfolds an `accept` predicate assigned true.
    pub fn propagate_accept(&mut self, accept_term: TermId, lit: Literal) {
        let Some((s, i, re, q)) = skolem::accept_parts(&self.terms, accept_term) else {
            return;
        };
        // The depth keys the emission: an accept refused under a lower budget unfolds
        // afresh once the driver raises it.
        if !self.mark_emitted((TAG_ACCEPT, accept_term, 0, self.max_unfolding_depth)) {
            return;
        }
        self.counters.propagate_automata += 1;

        let Some(nfa) = self.regexes.automaton(re) else {
            return;
        };

        if !nfa.is_live(q) {
            // A sink: no accepting run leaves q.
            self.add_axiom(vec![!lit]);
            return;
        }

        if i > self.max_unfolding_depth {
            // Refuse to unfold past the budget; the core will surface the budget
            // literal and the driver may raise it.
            let mu = self.ensure_max_unfolding();
            self.add_axiom(vec![!lit, !mu]);
            return;
        }

        let is_final = nfa.is_final(q);
        let transitions = nfa.transitions(q);

        let len_s = self.terms.length(s);
        let i_term = self.terms.int(i);

        let mut step_lits = Vec::with_capacity(transitions.len());
        for (q2, _) in &transitions {
            let step = skolem::step(&mut self.terms, s, i, re, q, *q2);
            step_lits.push(self.lit_of(step, true));
        }

        if is_final {
            // accept → |s| ≥ i ∧ (|s| ≤ i ∨ ⋁ step).
            let ge = self.terms.int_le(i_term, len_s);
            let ge_lit = self.lit_of(ge, true);
            self.add_axiom(vec![!lit, ge_lit]);

            let le = self.terms.int_le(len_s, i_term);
            let le_lit = self.lit_of(le, true);
            let mut clause = vec![!lit, le_lit];
            clause.extend(step_lits);
            self.add_axiom(clause);
        } else {
            // accept → |s| > i ∧ ⋁ step.
            let gt = self.terms.int_lt(i_term, len_s);
            let gt_lit = self.lit_of(gt, true);
            self.add_axiom(vec![!lit, gt_lit]);

            let mut clause = vec![!lit];
            clause.extend(step_lits);
            self.add_axiom(clause);
        }
    }

    /// Asserts the consequences of a `step` predicate assigned true.
    pub fn propagate_step(&mut self, step_term: TermId, lit: Literal) {
        let Some((s, i, re, q, q2)) = skolem::step_parts(&self.terms, step_term) else {
            return;
        };
        if !self.mark_emitted((TAG_STEP, step_term, 0, 0)) {
            return;
        }
        self.counters.propagate_automata += 1;

        let Some(nfa) = self.regexes.automaton(re) else {
            return;
        };
        let Some((_, pred)) = nfa.transitions(q).into_iter().find(|(to, _)| *to == q2) else {
            return;
        };

        // step → the guard holds at position i.
        let pred_id = self.regexes.intern_pred(pred);
        let nth = self.terms.nth_i(s, i);
        let guard = self.terms.char_in(nth, pred_id);
        let guard_lit = self.lit_of(guard, true);
        self.add_axiom(vec![!lit, guard_lit]);

        // step → |s| > i.
        let len_s = self.terms.length(s);
        let i_term = self.terms.int(i);
        let gt = self.terms.int_lt(i_term, len_s);
        let gt_lit = self.lit_of(gt, true);
        self.add_axiom(vec![!lit, gt_lit]);

        // step → accept(s, i+1, R, q').
        let next = skolem::accept(&mut self.terms, s, i + 1, re, q2);
        let next_lit = self.lit_of(next, true);
        self.add_axiom(vec![!lit, next_lit]);

        // step → s = pre(s, i) ++ unit(nth(s, i)) ++ tail(s, i), with the length facts
        // that make the decomposition usable.
        self.ensure_nth(lit, s, i);
    }

    /// Asserts `s = pre(s, i) ++ unit(nth(s, i)) ++ tail(s, i)` under the guard
    /// literal, with the lengths of the pieces.
    pub fn ensure_nth(&mut self, guard: Literal, s: TermId, i: i64) {
        let i_term = self.terms.int(i);
        let pre = skolem::pre(&mut self.terms, s, i_term);
        let nth = self.terms.nth_i(s, i);
        let unit = self.terms.unit(nth);
        let tail = skolem::tail(&mut self.terms, s, i);

        let decomposition = self.terms.concat(&[pre, unit, tail]);
        let eq = self.terms.eq(s, decomposition);
        let eq_lit = self.lit_of(eq, true);
        self.add_axiom(vec![!guard, eq_lit]);

        let len_pre = self.terms.length(pre);
        let pre_eq = self.terms.eq(len_pre, i_term);
        let pre_lit = self.lit_of(pre_eq, true);
        self.add_axiom(vec![!guard, pre_lit]);

        let len_s = self.terms.length(s);
        let len_tail = self.terms.length(tail);
        let minus_i = self.terms.int(-(i + 1));
        let expected = self.terms.add(&[len_s, minus_i]);
        let tail_eq = self.terms.eq(len_tail, expected);
        let tail_lit = self.lit_of(tail_eq, true);
        self.add_axiom(vec![!guard, tail_lit]);
    }

    /// Evaluates memberships whose sequence has become concrete, emitting a conflict
    /// clause on mismatch with the kernel assignment.
    pub fn check_memberships(&mut self) -> bool {
        let memberships = self.regexes.memberships().to_vec();
        let mut fired = false;
        for m in memberships {
            let (normal, dep) = self.canonize(m.seq);
            let Some(word) = self.terms.as_const(normal).map(|w| w.to_vec()) else {
                continue;
            };
            let key = (TAG_MEMBER_EVAL, m.seq, m.re, normal as i64);
            if !self.mark_emitted(key) {
                continue;
            }
            let accepted = match self.regexes.automaton(m.re) {
                Some(nfa) => nfa.accepts(&word),
                None => continue,
            };
            if !accepted {
                // The membership fails on the canonized word.
                let mut clause = vec![!m.lit];
                clause.extend(self.clause_tail_from_dep(dep));
                self.add_axiom(clause);
                fired = true;
            }
        }
        fired
    }

    /// The `max_unfolding` assumption for the current depth budget.
    pub fn ensure_max_unfolding(&mut self) -> Literal {
        let term = skolem::max_unfolding(&mut self.terms, self.max_unfolding_depth);
        let lit = self.lit_of(term, true);
        if !self.assumptions.contains(&lit) {
            self.assumptions.push(lit);
        }
        lit
    }

    /// The `length_limit` assumption for the sequence, with its bounding axiom.
    pub fn ensure_length_limit(&mut self, s: TermId) -> Literal {
        let k = *self
            .length_limits
            .entry(s)
            .or_insert(self.config.length_limit_init.value);
        let term = skolem::length_limit(&mut self.terms, s, k);
        let lit = self.lit_of(term, true);
        if !self.assumptions.contains(&lit) {
            self.assumptions.push(lit);
            let len_s = self.terms.length(s);
            let k_term = self.terms.int(k);
            let le = self.terms.int_le(len_s, k_term);
            let le_lit = self.lit_of(le, true);
            self.add_axiom(vec![!lit, le_lit]);
        }
        lit
    }
}
