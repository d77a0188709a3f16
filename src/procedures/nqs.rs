/*!
Disequation handling: splitting into implied sub-equations, and last-resort branching.

`solve_nqs` canonizes each pending disequation and reduces the underlying equality:

- sides proven equal violate the disequation — a conflict over the disequation's
  dependency and the canonization's,
- sides proven distinct discharge it,
- a reduction to simultaneous pairs emits the completeness clause
  `pairs ∧ deps → whole`, so the kernel must refute at least one pair while the
  disequation stands.

`branch_nqs` takes the disequations no reduction applies to and splits through a
Skolem index: distinct sequences differ in length or at some position, and `diseq_idx`
names the position.
*/

use crate::{
    context::GenericContext,
    misc::log::targets,
    rewriter::NeReduction,
    skolem,
    structures::term::Sort,
    types::err::ErrorKind,
};

const TAG_NQ_SPLIT: u16 = 45;
const TAG_NQ_CONFLICT: u16 = 46;
const TAG_NQ_BRANCH: u16 = 47;

impl<R: rand::Rng + std::default::Default> GenericContext<R> {
    /// Splits each pending disequation into implied sub-equations.
    pub fn solve_nqs(&mut self) -> Result<bool, ErrorKind> {
        let diseqs = self.eqs.disequations().to_vec();
        let mut fired = false;

        for dq in diseqs {
            let (l, l_dep) = self.canonize(dq.lhs);
            let (r, r_dep) = self.canonize(dq.rhs);
            let sides_dep = self.deps.join(l_dep, r_dep);
            let dep = self.deps.join(dq.dep, sides_dep);

            // Element and integer classes refute directly through the graph.
            if self.terms.sort(l) != Sort::Seq {
                if self.egraph.are_eq(l, r) {
                    if self.mark_emitted((TAG_NQ_CONFLICT, l, r, 0)) {
                        if let Some(explained) = self.egraph.explain(l, r, &mut self.deps) {
                            let joined = self.deps.join(dep, explained);
                            self.set_conflict(joined);
                            fired = true;
                        }
                    }
                }
                continue;
            }

            match crate::procedures::eqs::reduce_diseq(self, l, r) {
                NeReduction::Equal => {
                    if self.mark_emitted((TAG_NQ_CONFLICT, l, r, 1)) {
                        log::debug!(
                            target: targets::CASCADE,
                            "Disequation violated: {} = {}",
                            self.terms.display(l),
                            self.terms.display(r),
                        );
                        self.set_conflict(dep);
                        fired = true;
                    }
                }

                NeReduction::Distinct => {}

                NeReduction::Split(pairs) => {
                    // pairs ∧ side-deps → whole equality; the kernel refutes a pair.
                    let whole = self.terms.eq(dq.lhs, dq.rhs);
                    if whole == self.terms.tt() {
                        continue;
                    }
                    let key_mark = pairs.len() as i64;
                    if !self.mark_emitted((TAG_NQ_SPLIT, l, r, key_mark)) {
                        continue;
                    }
                    let whole_lit = self.lit_of(whole, true);
                    let mut clause = vec![whole_lit];
                    for (a, b) in pairs {
                        let pair_eq = self.terms.eq(a, b);
                        if pair_eq == self.terms.tt() {
                            continue;
                        }
                        let pair_lit = self.lit_of(pair_eq, true);
                        clause.push(!pair_lit);
                    }
                    clause.extend(self.clause_tail_from_dep(sides_dep));
                    self.add_axiom(clause);
                    self.counters.solve_nqs += 1;
                    fired = true;
                }

                NeReduction::Opaque => {}
            }
        }
        Ok(fired)
    }

    /// Splits a remaining opaque disequation through a Skolem index.
    pub fn branch_nqs(&mut self) -> Result<bool, ErrorKind> {
        let diseqs = self.eqs.disequations().to_vec();

        for dq in diseqs {
            let (l, _) = self.canonize(dq.lhs);
            let (r, _) = self.canonize(dq.rhs);
            if self.terms.sort(l) != Sort::Seq {
                continue;
            }
            match crate::procedures::eqs::reduce_diseq(self, l, r) {
                NeReduction::Opaque => {}
                _ => continue,
            }
            if !self.mark_emitted((TAG_NQ_BRANCH, dq.lhs, dq.rhs, 0)) {
                continue;
            }

            // l ≠ r → |l| ≠ |r| ∨ (0 ≤ d < |l| ∧ nth(l, d) ≠ nth(r, d)).
            let whole = self.terms.eq(dq.lhs, dq.rhs);
            let whole_lit = self.lit_of(whole, true);

            let len_l = self.terms.length(dq.lhs);
            let len_r = self.terms.length(dq.rhs);
            let len_eq = self.terms.eq(len_l, len_r);
            let len_lit = self.lit_of(len_eq, true);

            let d = skolem::diseq_index(&mut self.terms, dq.lhs, dq.rhs);
            let zero = self.terms.int(0);

            let lo = self.terms.int_le(zero, d);
            let lo_lit = self.lit_of(lo, true);
            self.add_axiom(vec![whole_lit, !len_lit, lo_lit]);

            let hi = self.terms.int_lt(d, len_l);
            let hi_lit = self.lit_of(hi, true);
            self.add_axiom(vec![whole_lit, !len_lit, hi_lit]);

            let nth_l = self.terms.nth(dq.lhs, d);
            let nth_r = self.terms.nth(dq.rhs, d);
            let nth_eq = self.terms.eq(nth_l, nth_r);
            let nth_lit = self.lit_of(nth_eq, true);
            self.add_axiom(vec![whole_lit, !len_lit, !nth_lit]);

            self.counters.branch_nqs += 1;
            // One split per round.
            return Ok(true);
        }
        Ok(false)
    }
}
