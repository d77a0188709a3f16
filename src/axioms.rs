/*!
Emission of defining clauses for the sequence operators, and the clause-level plumbing
every inference flows through.

Every clause emitted here is a tautology of the theory: axiom instances are guarded by
the literals they depend on, propagations carry their justification as negated
dependency literals, and conflicts are the negations of the assumptions they refute.
As a consequence the kernel's clause database is monotone — nothing is retracted on
backtracking — and every emission site deduplicates through a tagged key so the cascade
can recognize quiescence.

The operator axioms pin down the Skolem families of [crate::skolem]: `extract`
decomposes through `pre`/`post`, `contains`/`replace`/`indexof` through
`indexof_left`/`indexof_right`, `prefixof`/`suffixof` through their witness inverses.
Minimality of `indexof` (the first match rather than any match) is not enforced — the
procedure is sound and incomplete, and the model constructor picks the witnesses it is
given.
*/

use crate::{
    context::{EmitKey, GenericContext},
    db::dependency::DepId,
    misc::log::targets,
    skolem,
    structures::{
        literal::Literal,
        term::{Sort, TermId, TermKind},
    },
};

// Dedup tags for emissions from this module.
const TAG_EXTRACT: u16 = 1;
const TAG_AT: u16 = 2;
const TAG_REPLACE: u16 = 3;
const TAG_INDEXOF: u16 = 4;
const TAG_ITOS: u16 = 5;
const TAG_STOI: u16 = 6;
const TAG_CONTAINS_POS: u16 = 7;
const TAG_PREFIX_POS: u16 = 8;
const TAG_SUFFIX_POS: u16 = 9;
const TAG_LENGTH: u16 = 10;
pub(crate) const TAG_PROPAGATION: u16 = 11;

impl<R: rand::Rng + std::default::Default> GenericContext<R> {
    /// Emits a theory axiom: a clause valid in every model of the theory.
    pub fn add_axiom(&mut self, lits: Vec<Literal>) {
        self.counters.add_axiom += 1;
        log::trace!(target: targets::AXIOMS, "Axiom over {} literals", lits.len());
        self.sat.add_clause(lits);
    }

    /// Records an emission key; true if the key is new.
    pub(crate) fn mark_emitted(&mut self, key: EmitKey) -> bool {
        self.emitted.insert(key)
    }

    /// The literal leaves of a dependency, with term-pair leaves resolved through the
    /// equality graph.
    pub(crate) fn lits_from_dep(&mut self, dep: DepId) -> Vec<Literal> {
        let mut out: Vec<Literal> = Vec::default();
        let mut resolved: rustc_hash::FxHashSet<(TermId, TermId)> = rustc_hash::FxHashSet::default();
        let mut pending = vec![dep];
        while let Some(d) = pending.pop() {
            let flat = self.deps.linearize(d);
            for lit in flat.lits {
                if !out.contains(&lit) {
                    out.push(lit);
                }
            }
            for (a, b) in flat.eqs {
                if !resolved.insert((a, b)) {
                    continue;
                }
                if let Some(explained) = self.egraph.explain(a, b, &mut self.deps) {
                    pending.push(explained);
                }
            }
        }
        out
    }

    /// The negated dependency literals, ready to head a clause.
    pub(crate) fn clause_tail_from_dep(&mut self, dep: DepId) -> Vec<Literal> {
        self.lits_from_dep(dep).into_iter().map(|l| !l).collect()
    }

    /// Reports a conflict: the conjunction of the dependency's leaves is refuted.
    pub fn set_conflict(&mut self, dep: DepId) {
        let clause = self.clause_tail_from_dep(dep);
        log::debug!(target: targets::CASCADE, "Conflict over {} assumptions", clause.len());
        self.add_axiom(clause);
    }

    /// Propagates a literal under a justification.
    pub fn propagate_lit(&mut self, lit: Literal, dep: DepId) {
        let mut clause = self.clause_tail_from_dep(dep);
        clause.push(lit);
        self.add_axiom(clause);
    }

    /// Propagates an equality between terms under a justification.
    pub fn propagate_eq(&mut self, a: TermId, b: TermId, dep: DepId) {
        let eq = self.terms.eq(a, b);
        if eq == self.terms.tt() {
            return;
        }
        let lit = self.lit_of(eq, true);
        if self.mark_emitted((TAG_PROPAGATION, eq, 0, 0)) {
            self.propagate_lit(lit, dep);
        }
    }

    /// Registers a term and its sub-terms: operator axioms are emitted once per
    /// occurrence, and sequence-sorted terms are tracked for length reasoning.
    pub fn register_term(&mut self, t: TermId) {
        let mut stack = vec![t];
        while let Some(at) = stack.pop() {
            if !self.registered.insert(at) {
                continue;
            }
            // Children first in effect; order of emission is immaterial.
            stack.extend(term_children(self.terms.kind(at)));

            if self.terms.sort(at) == Sort::Seq {
                self.register_seq(at);
            }

            match self.terms.kind(at).clone() {
                TermKind::Extract(s, i, l) => self.add_extract_axiom(at, s, i, l),
                TermKind::At(s, i) => self.add_at_axiom(at, s, i),
                TermKind::Replace(s, p, r) => self.add_replace_axiom(at, s, p, r),
                TermKind::Indexof(s, p, i) => self.add_indexof_axiom(at, s, p, i),
                TermKind::Itos(i) => self.add_itos_axiom(at, i),
                TermKind::Stoi(s) => self.add_stoi_axiom(at, s),
                _ => {}
            }
        }
    }

    /// Tracks a sequence term: a non-negative length, and the structural length
    /// identity where the shape determines one.
    fn register_seq(&mut self, t: TermId) {
        if matches!(self.terms.kind(t), TermKind::Empty | TermKind::Const(_)) {
            return;
        }
        if !self.mark_emitted((TAG_LENGTH, t, 0, 0)) {
            return;
        }
        self.tracked_seqs.push(t);

        let len = self.terms.length(t);
        let zero = self.terms.int(0);
        let nonneg = self.terms.int_le(zero, len);
        let nonneg_lit = self.lit_of(nonneg, true);
        self.add_axiom(vec![nonneg_lit]);

        let structural = crate::rewriter::rewrite(&mut self.terms, len);
        if structural != len {
            let eq = self.terms.eq(len, structural);
            if eq != self.terms.tt() {
                let lit = self.lit_of(eq, true);
                self.add_axiom(vec![lit]);
            }
        }
    }

    fn add_extract_axiom(&mut self, t: TermId, s: TermId, i: TermId, l: TermId) {
        if !self.mark_emitted((TAG_EXTRACT, t, 0, 0)) {
            return;
        }
        let e = self.terms.empty();
        let zero = self.terms.int(0);
        let len_s = self.terms.length(s);
        let il = self.terms.add(&[i, l]);

        // i < 0 → t = ε.
        let neg = self.terms.int_lt(i, zero);
        let neg_lit = self.lit_of(neg, true);
        let t_empty = self.terms.eq(t, e);
        let t_empty_lit = self.lit_of(t_empty, true);
        self.add_axiom(vec![!neg_lit, t_empty_lit]);

        // |s| ≤ i → t = ε.
        let past = self.terms.int_le(len_s, i);
        let past_lit = self.lit_of(past, true);
        self.add_axiom(vec![!past_lit, t_empty_lit]);

        // l ≤ 0 → t = ε.
        let short = self.terms.int_le(l, zero);
        let short_lit = self.lit_of(short, true);
        self.add_axiom(vec![!short_lit, t_empty_lit]);

        // 0 ≤ i ∧ i + l ≤ |s| ∧ 0 < l → s = pre(s, i) ++ t ++ post(s, i + l) ∧ |t| = l.
        let lo = self.terms.int_le(zero, i);
        let lo_lit = self.lit_of(lo, true);
        let hi = self.terms.int_le(il, len_s);
        let hi_lit = self.lit_of(hi, true);
        let pos = self.terms.int_lt(zero, l);
        let pos_lit = self.lit_of(pos, true);

        let pre = skolem::pre(&mut self.terms, s, i);
        let post = skolem::post(&mut self.terms, s, il);
        let decomposition = self.terms.concat(&[pre, t, post]);
        let whole = self.terms.eq(s, decomposition);
        let whole_lit = self.lit_of(whole, true);
        self.add_axiom(vec![!lo_lit, !hi_lit, !pos_lit, whole_lit]);

        let len_t = self.terms.length(t);
        let len_eq = self.terms.eq(len_t, l);
        let len_lit = self.lit_of(len_eq, true);
        self.add_axiom(vec![!lo_lit, !hi_lit, !pos_lit, len_lit]);

        // 0 ≤ i < |s| ∧ 0 < l ∧ |s| < i + l → t = post(s, i)  (a truncated tail).
        let within = self.terms.int_lt(i, len_s);
        let within_lit = self.lit_of(within, true);
        let over = self.terms.int_lt(len_s, il);
        let over_lit = self.lit_of(over, true);
        let post_i = skolem::post(&mut self.terms, s, i);
        let tail_eq = self.terms.eq(t, post_i);
        let tail_lit = self.lit_of(tail_eq, true);
        self.add_axiom(vec![!lo_lit, !within_lit, !pos_lit, !over_lit, tail_lit]);
    }

    fn add_at_axiom(&mut self, t: TermId, s: TermId, i: TermId) {
        if !self.mark_emitted((TAG_AT, t, 0, 0)) {
            return;
        }
        let e = self.terms.empty();
        let zero = self.terms.int(0);
        let len_s = self.terms.length(s);

        let neg = self.terms.int_lt(i, zero);
        let neg_lit = self.lit_of(neg, true);
        let t_empty = self.terms.eq(t, e);
        let t_empty_lit = self.lit_of(t_empty, true);
        self.add_axiom(vec![!neg_lit, t_empty_lit]);

        let past = self.terms.int_le(len_s, i);
        let past_lit = self.lit_of(past, true);
        self.add_axiom(vec![!past_lit, t_empty_lit]);

        let lo = self.terms.int_le(zero, i);
        let lo_lit = self.lit_of(lo, true);
        let within = self.terms.int_lt(i, len_s);
        let within_lit = self.lit_of(within, true);
        let nth = self.terms.nth(s, i);
        let unit = self.terms.unit(nth);
        let unit_eq = self.terms.eq(t, unit);
        let unit_lit = self.lit_of(unit_eq, true);
        self.add_axiom(vec![!lo_lit, !within_lit, unit_lit]);
    }

    fn add_replace_axiom(&mut self, t: TermId, s: TermId, p: TermId, r: TermId) {
        if !self.mark_emitted((TAG_REPLACE, t, 0, 0)) {
            return;
        }
        let contains = self.terms.contains(s, p);
        let c_lit = self.lit_of(contains, true);

        let iol = skolem::indexof_left(&mut self.terms, s, p);
        let ior = skolem::indexof_right(&mut self.terms, s, p);

        let original = self.terms.concat(&[iol, p, ior]);
        let split = self.terms.eq(s, original);
        let split_lit = self.lit_of(split, true);
        self.add_axiom(vec![!c_lit, split_lit]);

        let replaced = self.terms.concat(&[iol, r, ior]);
        let result = self.terms.eq(t, replaced);
        let result_lit = self.lit_of(result, true);
        self.add_axiom(vec![!c_lit, result_lit]);

        let unchanged = self.terms.eq(t, s);
        let unchanged_lit = self.lit_of(unchanged, true);
        self.add_axiom(vec![c_lit, unchanged_lit]);
    }

    fn add_indexof_axiom(&mut self, t: TermId, s: TermId, p: TermId, i: TermId) {
        if !self.mark_emitted((TAG_INDEXOF, t, 0, 0)) {
            return;
        }
        // indexof ≥ -1, unconditionally.
        let floor = self.terms.int(-1);
        let ge = self.terms.int_le(floor, t);
        let ge_lit = self.lit_of(ge, true);
        self.add_axiom(vec![ge_lit]);

        if self.terms.as_int_const(i) != Some(0) {
            return;
        }

        let contains = self.terms.contains(s, p);
        let c_lit = self.lit_of(contains, true);

        // ¬contains(s, p) → t = -1.
        let miss = self.terms.eq(t, floor);
        let miss_lit = self.lit_of(miss, true);
        self.add_axiom(vec![c_lit, miss_lit]);

        // contains(s, p) → s = iol ++ p ++ ior ∧ t = |iol|.
        let iol = skolem::indexof_left(&mut self.terms, s, p);
        let ior = skolem::indexof_right(&mut self.terms, s, p);
        let split = self.terms.concat(&[iol, p, ior]);
        let split_eq = self.terms.eq(s, split);
        let split_lit = self.lit_of(split_eq, true);
        self.add_axiom(vec![!c_lit, split_lit]);

        let len_iol = self.terms.length(iol);
        let hit = self.terms.eq(t, len_iol);
        let hit_lit = self.lit_of(hit, true);
        self.add_axiom(vec![!c_lit, hit_lit]);
    }

    fn add_itos_axiom(&mut self, t: TermId, i: TermId) {
        if !self.mark_emitted((TAG_ITOS, t, 0, 0)) {
            return;
        }
        let e = self.terms.empty();
        let zero = self.terms.int(0);

        // i < 0 → itos(i) = ε.
        let neg = self.terms.int_lt(i, zero);
        let neg_lit = self.lit_of(neg, true);
        let empty_eq = self.terms.eq(t, e);
        let empty_lit = self.lit_of(empty_eq, true);
        self.add_axiom(vec![!neg_lit, empty_lit]);

        // 0 ≤ i → |itos(i)| ≥ 1.
        let nonneg = self.terms.int_le(zero, i);
        let nonneg_lit = self.lit_of(nonneg, true);
        let one = self.terms.int(1);
        let len = self.terms.length(t);
        let ge = self.terms.int_le(one, len);
        let ge_lit = self.lit_of(ge, true);
        self.add_axiom(vec![!nonneg_lit, ge_lit]);
    }

    fn add_stoi_axiom(&mut self, t: TermId, s: TermId) {
        if !self.mark_emitted((TAG_STOI, t, 0, 0)) {
            return;
        }
        let e = self.terms.empty();
        let minus_one = self.terms.int(-1);

        // stoi ≥ -1.
        let ge = self.terms.int_le(minus_one, t);
        let ge_lit = self.lit_of(ge, true);
        self.add_axiom(vec![ge_lit]);

        // s = ε → stoi(s) = -1.
        let s_empty = self.terms.eq(s, e);
        let s_empty_lit = self.lit_of(s_empty, true);
        let fails = self.terms.eq(t, minus_one);
        let fails_lit = self.lit_of(fails, true);
        self.add_axiom(vec![!s_empty_lit, fails_lit]);
    }

    /// The positive decomposition of a containment: `contains(hay, needle)` splits
    /// `hay` around a match.
    pub fn add_contains_decomposition(&mut self, hay: TermId, needle: TermId) {
        if !self.mark_emitted((TAG_CONTAINS_POS, hay, needle, 0)) {
            return;
        }
        let contains = self.terms.contains(hay, needle);
        let c_lit = self.lit_of(contains, true);
        let iol = skolem::indexof_left(&mut self.terms, hay, needle);
        let ior = skolem::indexof_right(&mut self.terms, hay, needle);
        let split = self.terms.concat(&[iol, needle, ior]);
        let eq = self.terms.eq(hay, split);
        let eq_lit = self.lit_of(eq, true);
        self.add_axiom(vec![!c_lit, eq_lit]);
        self.register_term(split);
    }

    /// The witness axiom of a positive prefix: `prefixof(p, f)` continues `p` to `f`.
    pub fn add_prefix_decomposition(&mut self, p: TermId, f: TermId) {
        if !self.mark_emitted((TAG_PREFIX_POS, p, f, 0)) {
            return;
        }
        let prefix = self.terms.prefix_of(p, f);
        let p_lit = self.lit_of(prefix, true);
        let inv = skolem::prefix_inv(&mut self.terms, p, f);
        let whole = self.terms.concat(&[p, inv]);
        let eq = self.terms.eq(f, whole);
        let eq_lit = self.lit_of(eq, true);
        self.add_axiom(vec![!p_lit, eq_lit]);
        self.register_term(whole);
    }

    /// The witness axiom of a positive suffix: `suffixof(s, f)` prolongs `s` to `f`.
    pub fn add_suffix_decomposition(&mut self, s: TermId, f: TermId) {
        if !self.mark_emitted((TAG_SUFFIX_POS, s, f, 0)) {
            return;
        }
        let suffix = self.terms.suffix_of(s, f);
        let s_lit = self.lit_of(suffix, true);
        let inv = skolem::suffix_inv(&mut self.terms, s, f);
        let whole = self.terms.concat(&[inv, s]);
        let eq = self.terms.eq(f, whole);
        let eq_lit = self.lit_of(eq, true);
        self.add_axiom(vec![!s_lit, eq_lit]);
        self.register_term(whole);
    }
}

/// The immediate children of a term kind.
fn term_children(kind: &TermKind) -> Vec<TermId> {
    use TermKind::*;
    match kind {
        True | False | Var { .. } | Empty | Const(_) | Char(_) | IntConst(_) | ReEmpty
        | ReEpsilon | ReLiteral(_) | ReRange(_, _) | ReAny => Vec::default(),

        Unit(a) | Itos(a) | Stoi(a) | Length(a) | ReComp(a) | ReStar(a) | RePlus(a)
        | ReOpt(a) => vec![*a],

        Eq(a, b) | InRe(a, b) | Contains(a, b) | PrefixOf(a, b) | SuffixOf(a, b)
        | LexLt(a, b) | LexLe(a, b) | IntLe(a, b) | IntLt(a, b) | Mul(a, b) | Nth(a, b)
        | At(a, b) | ReUnion(a, b) | ReConcat(a, b) | ReInter(a, b) => vec![*a, *b],

        CharIn(a, _) => vec![*a],

        Extract(a, b, c) | Replace(a, b, c) | Indexof(a, b, c) | Ite(a, b, c) => {
            vec![*a, *b, *c]
        }

        Concat(parts) | Add(parts) | Skolem(_, parts) => parts.to_vec(),
    }
}
