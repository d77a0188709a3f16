/*!
The final-check cascade: a fixed, ordered pipeline of solving, splitting, and
axiom-instantiation rules.

The cascade returns [Continue](FinalCheckOutcome::Continue) as soon as any rule fires —
the order is the tie-break that keeps the search from diverging — and only when every
rule is saturated does it conclude [Done](FinalCheckOutcome::Done) or give up.

Rule order:

 1. `simplify_and_solve_eqs` — iterate until quiescent.
 2. `check_lts` — transitivity over the order literals, once per scope.
 3. `solve_nqs` — split disequations into implied sub-equations.
 4. `check_contains` — advance the negative containments.
 5. `fixed_length` (zero), then `fixed_length` (general).
 6. `len_based_split` — config-gated boundary splitting.
 7. `check_int_string` — the int↔string bridge.
 8. `reduce_length_eq` — peel equal-length prefixes.
 9. `branch_unit_variable`.
10. `branch_binary_variable`.
11. `branch_variable`.
12. `check_length_coherence`.
13. `check_extensionality`.
14. `branch_nqs`.
15. `is_solved` — success iff nothing outstanding remains.
*/

use crate::{
    context::GenericContext,
    misc::log::targets,
    rewriter::{self, EqVerdict, NeReduction},
    structures::term::{TermId, TermKind},
    types::err::ErrorKind,
};

/// The conclusion of one cascade round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FinalCheckOutcome {
    /// Some rule fired; the kernel should absorb the new clauses and return.
    Continue,

    /// Nothing is outstanding: the assignment extends to a model.
    Done,

    /// The cascade exhausted without progress or a conclusion.
    GiveUp,
}

impl<R: rand::Rng + std::default::Default> GenericContext<R> {
    /// Runs one cascade round.
    pub fn final_check(&mut self) -> Result<FinalCheckOutcome, ErrorKind> {
        self.counters.final_checks += 1;
        log::debug!(target: targets::CASCADE, "Final check {}", self.counters.final_checks);

        macro_rules! rule {
            ($call:expr) => {
                if $call? {
                    return Ok(FinalCheckOutcome::Continue);
                }
            };
        }

        rule!(self.simplify_and_solve_eqs());
        rule!(self.check_lts());
        rule!(self.solve_nqs());
        rule!(self.check_contains());
        rule!(self.fixed_length(true));
        rule!(self.fixed_length(false));
        rule!(self.len_based_split());
        rule!(self.check_int_string());
        rule!(self.reduce_length_eq());
        rule!(self.branch_unit_variable());
        rule!(self.branch_binary_variable());
        rule!(self.branch_variable());
        rule!(self.check_length_coherence());
        rule!(self.check_extensionality());
        rule!(self.branch_nqs());

        if self.is_solved() {
            Ok(FinalCheckOutcome::Done)
        } else {
            log::debug!(target: targets::CASCADE, "Give up");
            Ok(FinalCheckOutcome::GiveUp)
        }
    }

    /// True when nothing outstanding remains: every equation is discharged, every
    /// disequation refuted, every negative containment resolved, and every tracked
    /// regex compiled.
    pub fn is_solved(&mut self) -> bool {
        // Equations.
        let equations = self.eqs.equations().to_vec();
        for eq in equations {
            let mut lhs = Vec::with_capacity(eq.lhs.len());
            for part in &eq.lhs {
                let (c, _) = self.canonize(*part);
                lhs.push(c);
            }
            let mut rhs = Vec::with_capacity(eq.rhs.len());
            for part in &eq.rhs {
                let (c, _) = self.canonize(*part);
                rhs.push(c);
            }
            let reduction = rewriter::reduce_eq(&mut self.terms, &lhs, &rhs);
            match reduction.verdict {
                EqVerdict::Contradiction => return false,
                EqVerdict::Solved => {
                    for (a, b) in reduction.subeqs {
                        if !self.pair_established(a, b) {
                            return false;
                        }
                    }
                }
                EqVerdict::Open => {
                    if !self.itos_discharged(&reduction.lhs, &reduction.rhs)
                        && !self.itos_discharged(&reduction.rhs, &reduction.lhs)
                    {
                        return false;
                    }
                }
            }
        }

        // Disequations.
        let diseqs = self.eqs.disequations().to_vec();
        for dq in diseqs {
            let (l, _) = self.canonize(dq.lhs);
            let (r, _) = self.canonize(dq.rhs);
            match crate::procedures::eqs::reduce_diseq(self, l, r) {
                NeReduction::Distinct => {}
                NeReduction::Equal => return false,
                NeReduction::Split(pairs) => {
                    let refuted = pairs.iter().any(|(a, b)| self.pair_refuted(*a, *b));
                    if !refuted {
                        return false;
                    }
                }
                NeReduction::Opaque => {
                    if self.terms.sort(l) != crate::structures::term::Sort::Seq {
                        // Integer disequations discharge through evaluation.
                        let (va, vb) = (self.int_value(l), self.int_value(r));
                        match (va, vb) {
                            (Some((x, _)), Some((y, _))) if x != y => continue,
                            _ => return false,
                        }
                    }
                    return false;
                }
            }
        }

        // Negative containments.
        let entries = self.eqs.not_contains().to_vec();
        for nc in entries {
            if self.sat.value_of_lit(nc.len_gt) == Some(true) {
                continue;
            }
            let (hay, _) = self.canonize(nc.hay);
            let (needle, _) = self.canonize(nc.needle);
            let contains = self.terms.contains(hay, needle);
            let evaluated = rewriter::rewrite(&mut self.terms, contains);
            match self.terms.kind(evaluated) {
                TermKind::False => continue,
                TermKind::True => return false,
                _ => {
                    // Resolved only if the unfolding has been emitted.
                    let key = (crate::procedures::contains::TAG_NC_UNROLL, nc.hay, nc.needle, 0);
                    if !self.emitted.contains(&key) {
                        return false;
                    }
                }
            }
        }

        // Memberships: compiled at assertion; a concrete mismatch was caught by the
        // evaluation pass.
        true
    }

    /// True if a peeled pair is established on the current state.
    fn pair_established(&mut self, a: TermId, b: TermId) -> bool {
        if a == b || self.egraph.are_eq(a, b) {
            return true;
        }
        let eq = self.terms.eq(a, b);
        let eq = rewriter::rewrite(&mut self.terms, eq);
        match self.terms.kind(eq) {
            TermKind::True => true,
            TermKind::False => false,
            _ => self.sat.value_of_term(eq) == Some(true),
        }
    }

    /// True if a peeled pair is refuted on the current state.
    fn pair_refuted(&mut self, a: TermId, b: TermId) -> bool {
        let eq = self.terms.eq(a, b);
        let eq = rewriter::rewrite(&mut self.terms, eq);
        match self.terms.kind(eq) {
            TermKind::False => true,
            TermKind::True => false,
            _ => self.sat.value_of_term(eq) == Some(false),
        }
    }

    /// True if an open `itos(i) = digits` equation is discharged by the bound value
    /// of `i`.
    fn itos_discharged(&mut self, lhs: &[TermId], rhs: &[TermId]) -> bool {
        let [itos] = lhs else {
            return false;
        };
        let TermKind::Itos(i) = self.terms.kind(*itos).clone() else {
            return false;
        };
        let [w] = rhs else {
            return false;
        };
        let Some(word) = self.terms.as_const(*w).map(|w| w.to_vec()) else {
            return false;
        };
        let Some(expected) = rewriter::eval_digits(&word) else {
            return false;
        };
        match self.int_value(i) {
            Some((value, _)) => value == expected,
            None => false,
        }
    }
}
