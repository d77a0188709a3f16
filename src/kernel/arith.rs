/*!
Interval bounds on integer terms, derived from the asserted atoms.

The engine is query-driven: `lower`, `upper`, and `value` canonize the term and walk
its sum/product structure, bottoming out at atomic integer terms (lengths, variables,
integer-valued Skolems) whose bounds are scanned from the kernel trail — every assigned
`≤`/`<`/`=` atom with the term on one side and a constant on the other contributes.

Under the [Relational](crate::config::ArithKind::Relational) engine a failed direct
query additionally walks the equality graph for a constant in the term's class.

Every returned bound carries the dependency it rests on, so consumers can justify the
inferences they build from it.
*/

use crate::{
    config::ArithKind,
    context::GenericContext,
    db::dependency::{DepForest, DepId},
    structures::term::{TermId, TermKind},
};

impl<R: rand::Rng + std::default::Default> GenericContext<R> {
    /// The greatest known lower bound of an integer term, with its justification.
    pub fn int_lower(&mut self, t: TermId) -> Option<(i64, DepId)> {
        let (n, dep) = self.canonize(t);
        let (bound, bound_dep) = self.bound_of(n, true)?;
        Some((bound, self.deps.join(dep, bound_dep)))
    }

    /// The least known upper bound of an integer term, with its justification.
    pub fn int_upper(&mut self, t: TermId) -> Option<(i64, DepId)> {
        let (n, dep) = self.canonize(t);
        let (bound, bound_dep) = self.bound_of(n, false)?;
        Some((bound, self.deps.join(dep, bound_dep)))
    }

    /// The known value of an integer term: coinciding bounds, or a constant in the
    /// term's equivalence class.
    pub fn int_value(&mut self, t: TermId) -> Option<(i64, DepId)> {
        let (lo, lo_dep) = self.int_lower(t)?;
        let (hi, hi_dep) = self.int_upper(t)?;
        if lo == hi {
            Some((lo, self.deps.join(lo_dep, hi_dep)))
        } else {
            None
        }
    }

    /// A bound of a canonized term, by structure and then by trail scan.
    fn bound_of(&mut self, n: TermId, want_lower: bool) -> Option<(i64, DepId)> {
        match self.terms.kind(n).clone() {
            TermKind::IntConst(k) => Some((k, DepForest::NONE)),

            TermKind::Add(parts) => {
                let mut total = 0_i64;
                let mut dep = DepForest::NONE;
                for part in parts.iter() {
                    let (b, d) = self.bound_of(*part, want_lower)?;
                    total = total.checked_add(b)?;
                    dep = self.deps.join(dep, d);
                }
                Some((total, dep))
            }

            TermKind::Mul(a, b) => {
                let scale = self
                    .terms
                    .as_int_const(a)
                    .map(|k| (k, b))
                    .or_else(|| self.terms.as_int_const(b).map(|k| (k, a)))?;
                let (k, other) = scale;
                // A negative scale flips the bound sought.
                let flip = k < 0;
                let (inner, dep) = self.bound_of(other, want_lower != flip)?;
                Some((k.checked_mul(inner)?, dep))
            }

            _ => self.atomic_bound(n, want_lower),
        }
    }

    /// Isolates `n` in a canonized side: the side is `n` plus a constant offset, or
    /// nothing.
    fn isolate(&self, side: TermId, n: TermId) -> Option<i64> {
        if side == n {
            return Some(0);
        }
        let TermKind::Add(parts) = self.terms.kind(side) else {
            return None;
        };
        let mut offset = 0_i64;
        let mut seen = false;
        for part in parts.iter() {
            if *part == n {
                if seen {
                    return None;
                }
                seen = true;
            } else if let Some(k) = self.terms.as_int_const(*part) {
                offset += k;
            } else {
                return None;
            }
        }
        if seen {
            Some(offset)
        } else {
            None
        }
    }

    /// Scans the kernel trail for bounds on an atomic integer term.
    ///
    /// Both a bare occurrence and a linear occurrence (`n` plus a constant offset, as
    /// canonization leaves behind) contribute.
    fn atomic_bound(&mut self, n: TermId, want_lower: bool) -> Option<(i64, DepId)> {
        let mut best: Option<(i64, DepId)> = None;
        let mut consider = |candidate: i64, dep: DepId, best: &mut Option<(i64, DepId)>| {
            let better = match best {
                None => true,
                Some((current, _)) => {
                    if want_lower {
                        candidate > *current
                    } else {
                        candidate < *current
                    }
                }
            };
            if better {
                *best = Some((candidate, dep));
            }
        };

        let trail = self.sat.trail().to_vec();
        for lit in trail {
            let term = self.sat.term_of(lit.atom());
            let kind = self.terms.kind(term).clone();
            let (a, b, strict) = match kind {
                TermKind::IntLe(a, b) => (a, b, false),
                TermKind::IntLt(a, b) => (a, b, true),
                TermKind::Eq(a, b) => {
                    if !lit.polarity() {
                        continue;
                    }
                    // An equality with a constant side bounds in both directions.
                    let (ca, da) = self.canonize(a);
                    let (cb, db) = self.canonize(b);
                    let isolated = match (
                        self.terms.as_int_const(ca),
                        self.terms.as_int_const(cb),
                    ) {
                        (Some(k), None) => self.isolate(cb, n).map(|o| k - o),
                        (None, Some(k)) => self.isolate(ca, n).map(|o| k - o),
                        _ => None,
                    };
                    if let Some(value) = isolated {
                        let lit_dep = self.deps.lit(lit);
                        let sides_dep = self.deps.join(da, db);
                        let dep = self.deps.join(lit_dep, sides_dep);
                        consider(value, dep, &mut best);
                    }
                    continue;
                }
                _ => continue,
            };

            let (ca, da) = self.canonize(a);
            let (cb, db) = self.canonize(b);
            let lit_dep = self.deps.lit(lit);
            let sides_dep = self.deps.join(da, db);
            let dep = self.deps.join(lit_dep, sides_dep);

            let left_const = self.terms.as_int_const(ca);
            let right_const = self.terms.as_int_const(cb);

            match (lit.polarity(), left_const, right_const) {
                // k ◁ n + o gives a lower bound.
                (true, Some(k), None) if want_lower => {
                    if let Some(o) = self.isolate(cb, n) {
                        consider(if strict { k - o + 1 } else { k - o }, dep, &mut best);
                    }
                }
                // n + o ◁ k gives an upper bound.
                (true, None, Some(k)) if !want_lower => {
                    if let Some(o) = self.isolate(ca, n) {
                        consider(if strict { k - o - 1 } else { k - o }, dep, &mut best);
                    }
                }
                // ¬(k ◁ n + o) gives an upper bound: n + o ◁' k.
                (false, Some(k), None) if !want_lower => {
                    if let Some(o) = self.isolate(cb, n) {
                        consider(if strict { k - o } else { k - o - 1 }, dep, &mut best);
                    }
                }
                // ¬(n + o ◁ k) gives a lower bound: k ◁' n + o.
                (false, None, Some(k)) if want_lower => {
                    if let Some(o) = self.isolate(ca, n) {
                        consider(if strict { k - o } else { k - o + 1 }, dep, &mut best);
                    }
                }
                _ => {}
            }
        }

        if best.is_none() && self.config.arith_engine.value == ArithKind::Relational {
            // The direct query failed: walk the equivalence class for a constant.
            for candidate in 0..self.terms.count() as TermId {
                if let TermKind::IntConst(k) = self.terms.kind(candidate) {
                    let k = *k;
                    if self.egraph.are_eq(n, candidate) {
                        if let Some(dep) = self.egraph.explain(n, candidate, &mut self.deps) {
                            best = Some((k, dep));
                            break;
                        }
                    }
                }
            }
        }

        best
    }

    /// Checks every assigned integer atom against the known bounds, emitting a
    /// conflict clause on refutation; true if one fired.
    pub fn check_int_atoms(&mut self) -> bool {
        let trail = self.sat.trail().to_vec();
        let mut fired = false;
        for lit in trail {
            let term = self.sat.term_of(lit.atom());
            let kind = self.terms.kind(term).clone();

            let refutation = match kind {
                TermKind::IntLe(a, b) | TermKind::IntLt(a, b) => {
                    let strict = matches!(self.terms.kind(term), TermKind::IntLt(_, _));
                    if lit.polarity() {
                        // a ◁ b refuted when the bounds force a beyond b.
                        let (Some((lo_a, da)), Some((hi_b, db))) =
                            (self.int_lower(a), self.int_upper(b))
                        else {
                            continue;
                        };
                        let refuted = if strict { lo_a >= hi_b } else { lo_a > hi_b };
                        refuted.then_some((da, db, lo_a))
                    } else {
                        // ¬(a ◁ b), i.e. b ◁' a, refuted when a cannot exceed b.
                        let (Some((hi_a, da)), Some((lo_b, db))) =
                            (self.int_upper(a), self.int_lower(b))
                        else {
                            continue;
                        };
                        let refuted = if strict { hi_a < lo_b } else { hi_a <= lo_b };
                        refuted.then_some((da, db, hi_a))
                    }
                }

                TermKind::Eq(a, b)
                    if self.terms.sort(a) == crate::structures::term::Sort::Int =>
                {
                    if lit.polarity() {
                        // a = b refuted when the intervals are disjoint.
                        let disjoint_low = match (self.int_lower(a), self.int_upper(b)) {
                            (Some((lo_a, da)), Some((hi_b, db))) if lo_a > hi_b => {
                                Some((da, db, lo_a))
                            }
                            _ => None,
                        };
                        let disjoint_high = match (self.int_upper(a), self.int_lower(b)) {
                            (Some((hi_a, da)), Some((lo_b, db))) if hi_a < lo_b => {
                                Some((da, db, hi_a))
                            }
                            _ => None,
                        };
                        match disjoint_low.or(disjoint_high) {
                            Some(witness) => Some(witness),
                            None => continue,
                        }
                    } else {
                        // a ≠ b refuted only by coinciding values.
                        let (Some((va, da)), Some((vb, db))) =
                            (self.int_value(a), self.int_value(b))
                        else {
                            continue;
                        };
                        (va == vb).then_some((da, db, va))
                    }
                }

                _ => continue,
            };

            if let Some((da, db, witness)) = refutation {
                let lit_dep = self.deps.lit(lit);
                let sides_dep = self.deps.join(da, db);
                let dep = self.deps.join(lit_dep, sides_dep);
                let key = (crate::axioms::TAG_PROPAGATION, term, lit.atom(), witness);
                if self.mark_emitted(key) {
                    self.set_conflict(dep);
                    fired = true;
                }
            }
        }
        fired
    }
}
