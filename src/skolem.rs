/*!
Construction and recognition of the named Skolem functions.

Each family is a distinct symbol; the [axiom module](crate::axioms) pins down the
semantics.
Recognition supports the inverse queries the cascade relies on — "is this term a
`pre`/`post`/`tail`?" — together with extraction of the arguments.

The automaton predicates ([accept](accept) and [step](step)) are not safe to copy
across contexts: they depend on the automaton instantiated at creation.
*/

use crate::structures::term::{SkolemKind, TermId, TermTable};

/// `tail(s, i)` — the suffix of `s` starting at position `i + 1`.
pub fn tail(table: &mut TermTable, s: TermId, i: i64) -> TermId {
    let i = table.int(i);
    table.skolem(SkolemKind::Tail, &[s, i])
}

/// `pre(s, i)` — the prefix of `s` of length `i`.
pub fn pre(table: &mut TermTable, s: TermId, i: TermId) -> TermId {
    table.skolem(SkolemKind::Pre, &[s, i])
}

/// `post(s, i)` — the suffix of `s` starting at position `i`.
pub fn post(table: &mut TermTable, s: TermId, i: TermId) -> TermId {
    table.skolem(SkolemKind::Post, &[s, i])
}

/// `indexof_left(s, t)` — the prefix of `s` before the first match of `t`.
pub fn indexof_left(table: &mut TermTable, s: TermId, t: TermId) -> TermId {
    table.skolem(SkolemKind::IndexofLeft, &[s, t])
}

/// `indexof_right(s, t)` — the suffix of `s` after the first match of `t`.
pub fn indexof_right(table: &mut TermTable, s: TermId, t: TermId) -> TermId {
    table.skolem(SkolemKind::IndexofRight, &[s, t])
}

/// `prefix_inv(a, b)` — the continuation making `a` a prefix of `b`.
pub fn prefix_inv(table: &mut TermTable, a: TermId, b: TermId) -> TermId {
    table.skolem(SkolemKind::PrefixInv, &[a, b])
}

/// `suffix_inv(a, b)` — the prolongation making `a` a suffix of `b`.
pub fn suffix_inv(table: &mut TermTable, a: TermId, b: TermId) -> TermId {
    table.skolem(SkolemKind::SuffixInv, &[a, b])
}

/// `seq_first(s)` — the first element of a non-empty `s`.
pub fn seq_first(table: &mut TermTable, s: TermId) -> TermId {
    table.skolem(SkolemKind::SeqFirst, &[s])
}

/// `digit2int(c)` — the numeric value of a decimal digit element.
pub fn digit2int(table: &mut TermTable, c: TermId) -> TermId {
    table.skolem(SkolemKind::Digit2Int, &[c])
}

/// `diseq_idx(a, b)` — a position at which `a` and `b` differ, if they do.
pub fn diseq_index(table: &mut TermTable, a: TermId, b: TermId) -> TermId {
    let (a, b) = if a < b { (a, b) } else { (b, a) };
    table.skolem(SkolemKind::DiseqIndex, &[a, b])
}

/// `accept(s, i, R, q)` — acceptance from state `q` at position `i`.
pub fn accept(table: &mut TermTable, s: TermId, i: i64, re: TermId, q: u32) -> TermId {
    let i = table.int(i);
    let q = table.int(q as i64);
    table.skolem(SkolemKind::Accept, &[s, i, re, q])
}

/// `step(s, i, R, q, q')` — one automaton transition.
pub fn step(table: &mut TermTable, s: TermId, i: i64, re: TermId, q: u32, q2: u32) -> TermId {
    let i = table.int(i);
    let q = table.int(q as i64);
    let q2 = table.int(q2 as i64);
    table.skolem(SkolemKind::Step, &[s, i, re, q, q2])
}

/// `max_unfolding(d)` — the budget literal at unfolding depth `d`.
pub fn max_unfolding(table: &mut TermTable, d: i64) -> TermId {
    let d = table.int(d);
    table.skolem(SkolemKind::MaxUnfolding, &[d])
}

/// `length_limit(s, k)` — the budget literal bounding `|s| ≤ k`.
pub fn length_limit(table: &mut TermTable, s: TermId, k: i64) -> TermId {
    let k = table.int(k);
    table.skolem(SkolemKind::LengthLimit, &[s, k])
}

/// The arguments of an application of the noted family, if the term is one.
pub fn args_of(table: &TermTable, t: TermId, kind: SkolemKind) -> Option<&[TermId]> {
    match table.kind(t) {
        crate::structures::term::TermKind::Skolem(k, args) if *k == kind => Some(args),
        _ => None,
    }
}

/// The `(s, i, R, q)` arguments of an accept predicate.
pub fn accept_parts(table: &TermTable, t: TermId) -> Option<(TermId, i64, TermId, u32)> {
    let args = args_of(table, t, SkolemKind::Accept)?;
    let (s, i, re, q) = (args[0], args[1], args[2], args[3]);
    let i = table.as_int_const(i)?;
    let q = table.as_int_const(q)? as u32;
    Some((s, i, re, q))
}

/// The `(s, i, R, q, q')` arguments of a step predicate.
pub fn step_parts(table: &TermTable, t: TermId) -> Option<(TermId, i64, TermId, u32, u32)> {
    let args = args_of(table, t, SkolemKind::Step)?;
    let (s, i, re, q, q2) = (args[0], args[1], args[2], args[3], args[4]);
    let i = table.as_int_const(i)?;
    let q = table.as_int_const(q)? as u32;
    let q2 = table.as_int_const(q2)? as u32;
    Some((s, i, re, q, q2))
}

#[cfg(test)]
mod skolem_tests {
    use super::*;
    use crate::structures::term::Sort;

    #[test]
    fn recognition_roundtrip() {
        let mut table = TermTable::default();
        let s = table.var("s", Sort::Seq);
        let t = tail(&mut table, s, 0);
        let args = args_of(&table, t, SkolemKind::Tail).expect("a tail");
        assert_eq!(args[0], s);
        assert_eq!(table.as_int_const(args[1]), Some(0));
        assert!(args_of(&table, t, SkolemKind::Pre).is_none());
    }

    #[test]
    fn accept_parts_roundtrip() {
        let mut table = TermTable::default();
        let s = table.var("s", Sort::Seq);
        let re = table.re_any();
        let a = accept(&mut table, s, 2, re, 5);
        assert_eq!(accept_parts(&table, a), Some((s, 2, re, 5)));
    }
}
