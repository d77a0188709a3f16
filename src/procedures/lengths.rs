/*!
Length-driven rules: fixing sequences whose length bounds collapse, peeling equations
on shared boundary lengths, splitting on length information, length coherence, and the
int↔string bridge.

`fixed_length` runs in two passes — zero first, then general — so an emptied sequence
commits before any element-wise expansion is attempted.
The expansion of a sequence `e` with `|e| = n` is
`unit(nth(e, 0)) ++ … ++ unit(nth(e, n - 1))`, which the assignment relay recognizes
as a self-decomposition and commits into the solution map directly.

`check_length_coherence` asserts the three coherence clauses for a tracked sequence
with bounds `lo ≤ |e| ≤ hi`: the element-wise expansion up to `lo` with a `post` tail,
the emptiness of the tail at the lower bound, and the bound `|tail| ≤ hi - lo`.
*/

use crate::{
    context::GenericContext,
    misc::log::targets,
    skolem,
    structures::term::{TermId, TermKind},
    types::err::ErrorKind,
};

const TAG_FIXED: u16 = 55;
const TAG_COHERENCE: u16 = 56;
const TAG_REDUCE_LEN: u16 = 57;
const TAG_LEN_SPLIT: u16 = 58;
const TAG_INT_STRING: u16 = 59;

impl<R: rand::Rng + std::default::Default> GenericContext<R> {
    /// The element-wise expansion of `e` to exactly `n` positions.
    pub(crate) fn expansion_of(&mut self, e: TermId, n: i64) -> TermId {
        let mut parts = Vec::with_capacity(n as usize);
        for at in 0..n {
            let nth = self.terms.nth_i(e, at);
            let unit = self.terms.unit(nth);
            parts.push(unit);
        }
        self.terms.concat(&parts)
    }

    /// Fixes tracked sequences whose length bounds coincide.
    ///
    /// The `zero_only` pass handles collapses to `ε`; the general pass expands to
    /// elements.
    pub fn fixed_length(&mut self, zero_only: bool) -> Result<bool, ErrorKind> {
        let tracked = self.tracked_seqs.clone();
        let mut fired = false;

        for t in tracked {
            let (n, _) = self.canonize(t);
            if !self.terms.is_solvable_var(n) || !self.solution.is_root(n) {
                continue;
            }
            let len = self.terms.length(n);
            let Some((lo, lo_dep)) = self.int_lower(len) else {
                continue;
            };
            let Some((hi, hi_dep)) = self.int_upper(len) else {
                continue;
            };
            if lo != hi || lo < 0 {
                continue;
            }
            if zero_only != (lo == 0) {
                continue;
            }
            if !self.mark_emitted((TAG_FIXED, n, 0, lo)) {
                continue;
            }
            let dep = self.deps.join(lo_dep, hi_dep);
            log::debug!(
                target: targets::CASCADE,
                "Fixed |{}| = {lo}",
                self.terms.display(n),
            );

            if lo == 0 {
                let e = self.terms.empty();
                if self.propagate_eq_fired(n, e, dep) {
                    self.counters.fixed_length += 1;
                    fired = true;
                }
            } else {
                let expansion = self.expansion_of(n, lo);
                if self.propagate_eq_fired(n, expansion, dep) {
                    self.counters.fixed_length += 1;
                    fired = true;
                }
            }
        }
        Ok(fired)
    }

    /// Peels matching prefixes of equated concatenations whose head lengths are known
    /// equal.
    pub fn reduce_length_eq(&mut self) -> Result<bool, ErrorKind> {
        let equations = self.eqs.equations().to_vec();
        let mut fired = false;

        for eq in equations {
            let mut dep = eq.dep;
            let mut lhs = Vec::with_capacity(eq.lhs.len());
            for part in &eq.lhs {
                let (c, d) = self.canonize(*part);
                dep = self.deps.join(dep, d);
                lhs.push(c);
            }
            let mut rhs = Vec::with_capacity(eq.rhs.len());
            for part in &eq.rhs {
                let (c, d) = self.canonize(*part);
                dep = self.deps.join(dep, d);
                rhs.push(c);
            }
            let lhs = crate::rewriter::norm_parts(&mut self.terms, &lhs);
            let rhs = crate::rewriter::norm_parts(&mut self.terms, &rhs);
            if lhs.len() < 2 && rhs.len() < 2 {
                continue;
            }
            let (Some(&l0), Some(&r0)) = (lhs.first(), rhs.first()) else {
                continue;
            };
            if l0 == r0 {
                continue;
            }
            let len_l = self.terms.length(l0);
            let len_r = self.terms.length(r0);
            let Some((vl, dl)) = self.int_value(len_l) else {
                continue;
            };
            let Some((vr, dr)) = self.int_value(len_r) else {
                continue;
            };
            if vl != vr {
                continue;
            }
            if !self.mark_emitted((TAG_REDUCE_LEN, l0, r0, vl)) {
                continue;
            }
            // Equal-length heads of an equal concatenation are equal, and so are the
            // residues.
            let with_l = self.deps.join(dep, dl);
            let full_dep = self.deps.join(with_l, dr);
            let mut any = self.propagate_eq_fired(l0, r0, full_dep);
            let rest_l = self.terms.concat(&lhs[1..]);
            let rest_r = self.terms.concat(&rhs[1..]);
            any |= self.propagate_eq_fired(rest_l, rest_r, full_dep);
            if any {
                self.counters.num_reductions += 1;
                fired = true;
            }
        }
        Ok(fired)
    }

    /// Splits equated concatenations on shared boundary length information: a head
    /// strictly shorter than the opposing head is peeled out of it.
    pub fn len_based_split(&mut self) -> Result<bool, ErrorKind> {
        if !self.config.split_with_length.value {
            return Ok(false);
        }
        let equations = self.eqs.equations().to_vec();

        for eq in equations {
            let mut dep = eq.dep;
            let mut lhs = Vec::with_capacity(eq.lhs.len());
            for part in &eq.lhs {
                let (c, d) = self.canonize(*part);
                dep = self.deps.join(dep, d);
                lhs.push(c);
            }
            let mut rhs = Vec::with_capacity(eq.rhs.len());
            for part in &eq.rhs {
                let (c, d) = self.canonize(*part);
                dep = self.deps.join(dep, d);
                rhs.push(c);
            }
            let lhs = crate::rewriter::norm_parts(&mut self.terms, &lhs);
            let rhs = crate::rewriter::norm_parts(&mut self.terms, &rhs);
            let (Some(&l0), Some(&r0)) = (lhs.first(), rhs.first()) else {
                continue;
            };
            if l0 == r0 || rhs.len() < 2 {
                continue;
            }

            let len_l = self.terms.length(l0);
            let len_r = self.terms.length(r0);
            let (Some((vl, dl)), Some((vr, dr))) =
                (self.int_value(len_l), self.int_value(len_r))
            else {
                continue;
            };
            if vl <= vr {
                continue;
            }
            if !self.mark_emitted((TAG_LEN_SPLIT, l0, r0, vl)) {
                continue;
            }
            // |l0| > |r0|: the longer head splits at the boundary.
            let boundary = self.terms.int(vr);
            let pre = skolem::pre(&mut self.terms, l0, boundary);
            let post = skolem::post(&mut self.terms, l0, boundary);
            let split = self.terms.concat(&[pre, post]);
            let with_l = self.deps.join(dep, dl);
            let full_dep = self.deps.join(with_l, dr);
            let mut any = self.propagate_eq_fired(l0, split, full_dep);

            let len_pre = self.terms.length(pre);
            any |= self.propagate_eq_fired(len_pre, boundary, full_dep);

            if any {
                self.counters.num_splits += 1;
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Ensures each tracked `itos`/`stoi` has its length registered against the
    /// integer side.
    pub fn check_int_string(&mut self) -> Result<bool, ErrorKind> {
        let count = self.terms.count() as TermId;
        let mut fired = false;
        for t in 0..count {
            if !self.registered.contains(&t) {
                continue;
            }
            match self.terms.kind(t).clone() {
                TermKind::Itos(i) => {
                    if !self.mark_emitted((TAG_INT_STRING, t, 0, 0)) {
                        continue;
                    }
                    // 0 ≤ i → stoi(itos(i)) = i, registering the bridge both ways.
                    let zero = self.terms.int(0);
                    let nonneg = self.terms.int_le(zero, i);
                    let nonneg_lit = self.lit_of(nonneg, true);
                    let back = self.terms.stoi(t);
                    let round = self.terms.eq(back, i);
                    let round_lit = self.lit_of(round, true);
                    self.add_axiom(vec![!nonneg_lit, round_lit]);
                    self.counters.int_string += 1;
                    fired = true;
                }
                TermKind::Stoi(s) => {
                    if !self.mark_emitted((TAG_INT_STRING, t, 1, 0)) {
                        continue;
                    }
                    self.register_term(s);
                    self.counters.int_string += 1;
                    fired = true;
                }
                _ => {}
            }
        }
        Ok(fired)
    }

    /// Asserts the coherence clauses for every tracked sequence with active bounds.
    pub fn check_length_coherence(&mut self) -> Result<bool, ErrorKind> {
        let tracked = self.tracked_seqs.clone();
        let mut fired = false;

        for t in tracked {
            let (n, _) = self.canonize(t);
            if !self.terms.is_solvable_var(n) || !self.solution.is_root(n) {
                continue;
            }
            let len = self.terms.length(n);
            let Some((lo, _)) = self.int_lower(len) else {
                continue;
            };
            if lo <= 0 {
                continue;
            }
            let hi = self.int_upper(len).map(|(h, _)| h);

            let hi_key = hi.unwrap_or(-1);
            if !self.mark_emitted((TAG_COHERENCE, n, lo as u32, hi_key)) {
                continue;
            }

            let lo_term = self.terms.int(lo);
            let post = skolem::post(&mut self.terms, n, lo_term);

            // |e| ≥ lo → e = unit(nth(e, 0)) ++ … ++ unit(nth(e, lo - 1)) ++ post.
            let ge = self.terms.int_le(lo_term, len);
            let ge_lit = self.lit_of(ge, true);
            let expansion = self.expansion_of(n, lo);
            let shaped = self.terms.concat(&[expansion, post]);
            let shaped_eq = self.terms.eq(n, shaped);
            let shaped_lit = self.lit_of(shaped_eq, true);
            self.add_axiom(vec![!ge_lit, shaped_lit]);

            // |e| ≤ lo → post = ε.
            let le = self.terms.int_le(len, lo_term);
            let le_lit = self.lit_of(le, true);
            let e = self.terms.empty();
            let post_empty = self.terms.eq(post, e);
            let post_empty_lit = self.lit_of(post_empty, true);
            self.add_axiom(vec![!le_lit, post_empty_lit]);

            // |e| ≤ hi → |post| ≤ hi - lo.
            if let Some(hi) = hi {
                let hi_term = self.terms.int(hi);
                let le_hi = self.terms.int_le(len, hi_term);
                let le_hi_lit = self.lit_of(le_hi, true);
                let len_post = self.terms.length(post);
                let slack = self.terms.int(hi - lo);
                let bounded = self.terms.int_le(len_post, slack);
                let bounded_lit = self.lit_of(bounded, true);
                self.add_axiom(vec![!le_hi_lit, bounded_lit]);
            }

            self.counters.check_length_coherence += 1;
            fired = true;
        }
        Ok(fired)
    }
}
