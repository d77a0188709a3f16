/*!
Resolution of negative containment constraints.

A `¬contains(hay, needle)` constraint carries a guard literal `|hay| < |needle|` whose
truth value controls unfolding:

- guard **true** — the needle is longer than the hay, the constraint holds outright;
  the lengths of both sides are seeded into the length trackers and the entry rests.
- guard **undecided** — the guard is marked relevant with a positive phase and the
  entry defers to the kernel.
- guard **false** — the hay is at least as long as the needle, and the constraint
  unfolds one step: a match would either start at position zero (`prefixof`) or lie in
  the tail, so two valid clauses are emitted,
  `prefixof(needle, hay) → contains(hay, needle)` and
  `contains(tail(hay, 0), needle) → contains(hay, needle)`.
  With the containment asserted false both antecedents propagate to false, and the
  fresh negative containment recurses on the strictly shorter tail.
*/

use crate::{
    context::GenericContext,
    misc::log::targets,
    rewriter,
    structures::term::TermKind,
    types::err::ErrorKind,
};

pub(crate) const TAG_NC_UNROLL: u16 = 40;
const TAG_NC_PHASE: u16 = 41;

impl<R: rand::Rng + std::default::Default> GenericContext<R> {
    /// Advances every pending negative containment; true if any entry fired.
    pub fn check_contains(&mut self) -> Result<bool, ErrorKind> {
        let entries = self.eqs.not_contains().to_vec();
        let mut fired = false;

        for nc in entries {
            // The constraint may have become decidable outright.
            let (hay, hay_dep) = self.canonize(nc.hay);
            let (needle, needle_dep) = self.canonize(nc.needle);
            let contains = self.terms.contains(hay, needle);
            let evaluated = rewriter::rewrite(&mut self.terms, contains);
            match self.terms.kind(evaluated) {
                TermKind::True => {
                    // The hay demonstrably contains the needle.
                    let with_hay = self.deps.join(nc.dep, hay_dep);
                    let dep = self.deps.join(with_hay, needle_dep);
                    if self.mark_emitted((TAG_NC_UNROLL, hay, needle, 1)) {
                        self.set_conflict(dep);
                        fired = true;
                    }
                    continue;
                }
                TermKind::False => continue,
                _ => {}
            }

            match self.sat.value_of_lit(nc.len_gt) {
                Some(true) => {
                    // The needle is longer: satisfied outright; seed the lengths.
                    self.register_term(nc.hay);
                    self.register_term(nc.needle);
                }

                None => {
                    // Mark the guard relevant and defer.
                    if self.mark_emitted((TAG_NC_PHASE, nc.hay, nc.needle, 0)) {
                        self.sat.set_phase(nc.len_gt.atom(), true);
                        fired = true;
                    }
                }

                Some(false) => {
                    // |hay| ≥ |needle|: unfold one position.
                    if !self.mark_emitted((TAG_NC_UNROLL, nc.hay, nc.needle, 0)) {
                        continue;
                    }
                    log::debug!(
                        target: targets::CASCADE,
                        "Unrolling ¬contains({}, {})",
                        self.terms.display(nc.hay),
                        self.terms.display(nc.needle),
                    );

                    let whole = self.terms.contains(nc.hay, nc.needle);
                    let whole_lit = self.lit_of(whole, true);

                    // prefixof(needle, hay) → contains(hay, needle).
                    let prefix = self.terms.prefix_of(nc.needle, nc.hay);
                    let prefix_lit = self.lit_of(prefix, true);
                    self.add_axiom(vec![!prefix_lit, whole_lit]);

                    // contains(tail(hay, 0), needle) → contains(hay, needle).
                    let tail = crate::skolem::tail(&mut self.terms, nc.hay, 0);
                    let tail = rewriter::rewrite(&mut self.terms, tail);
                    let in_tail = self.terms.contains(tail, nc.needle);
                    let in_tail_lit = self.lit_of(in_tail, true);
                    self.add_axiom(vec![!in_tail_lit, whole_lit]);

                    // hay ≠ ε → |tail| = |hay| - 1, so the recursion is grounded in
                    // the length trackers for a symbolic hay.
                    if self.terms.as_const(tail).is_none() {
                        self.register_term(tail);
                        let e = self.terms.empty();
                        let hay_empty = self.terms.eq(nc.hay, e);
                        let hay_empty_lit = self.lit_of(hay_empty, true);
                        let len_tail = self.terms.length(tail);
                        let len_hay = self.terms.length(nc.hay);
                        let minus_one = self.terms.int(-1);
                        let shorter = self.terms.add(&[len_hay, minus_one]);
                        let len_eq = self.terms.eq(len_tail, shorter);
                        let len_lit = self.lit_of(len_eq, true);
                        self.add_axiom(vec![hay_empty_lit, len_lit]);
                    }

                    // Budget the hay so the unfolding cannot recurse unboundedly.
                    self.ensure_length_limit(nc.hay);
                    fired = true;
                }
            }
        }
        Ok(fired)
    }
}
