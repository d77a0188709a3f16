/*!
Algebraic simplification of sequence and integer terms.

The rewriter is pure over the [term table](crate::structures::term::TermTable): it
holds no solver state, and is called by the [canonizer](crate::canonize) on nodes whose
children are already in normal form, and by the cascade for structured equation
reduction.

Three entry points matter:

- [rewrite] — normalize a single node (children assumed normal),
- [reduce_eq] — reduce an equation between two part-lists to peeled element equations
  plus a residual, or a contradiction,
- [reduce_bool] — evaluate a boolean-sorted term to a constant or a conjunction of
  equations, where its arguments are concrete enough.

Word semantics follow the boundary behaviors of the theory: `substr(s, i, l)` is `ε`
whenever `i < 0`, `i ≥ |s|`, or `l ≤ 0`; `stoi` of a non-digit word is `-1`; `itos` of
a negative integer is `ε`.
`itos` of a non-negative integer is left symbolic — the equation solver binds it to a
digit word by evaluation, which deliberately admits leading zeros.
*/

use crate::structures::term::{SkolemKind, Sort, TermId, TermKind, TermTable};

/// The result of reducing an equation between part-lists.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EqVerdict {
    /// The equation reduced away; only the peeled sub-equations remain.
    Solved,

    /// The equation cannot hold.
    Contradiction,

    /// A residual equation remains.
    Open,
}

/// A reduced equation: peeled sub-equations plus a residual.
#[derive(Clone, Debug)]
pub struct EqReduction {
    /// The overall verdict.
    pub verdict: EqVerdict,

    /// Peeled pairs which must hold for the original equation to hold.
    pub subeqs: Vec<(TermId, TermId)>,

    /// The residual left side, empty unless the verdict is [EqVerdict::Open].
    pub lhs: Vec<TermId>,

    /// The residual right side, empty unless the verdict is [EqVerdict::Open].
    pub rhs: Vec<TermId>,
}

/// The result of reducing a disequation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NeReduction {
    /// The sides are equal: the disequation is violated.
    Equal,

    /// The sides are distinct: the disequation holds.
    Distinct,

    /// The disequation is violated iff every pair holds simultaneously.
    Split(Vec<(TermId, TermId)>),

    /// No reduction applies.
    Opaque,
}

/// The result of evaluating a boolean-sorted term.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BoolReduction {
    /// The term evaluates to a constant.
    Value(bool),

    /// The term holds iff every listed boolean term holds.
    Conj(Vec<TermId>),

    /// No evaluation applies.
    Open,
}

/// The numeric value of a decimal digit.
pub fn digit_val(c: char) -> Option<i64> {
    c.to_digit(10).map(|d| d as i64)
}

/// The base-10 evaluation of a word, provided every element is a digit and the word is
/// non-empty.
pub fn eval_digits(word: &[char]) -> Option<i64> {
    if word.is_empty() {
        return None;
    }
    let mut value = 0_i64;
    for c in word {
        value = value.checked_mul(10)?.checked_add(digit_val(*c)?)?;
    }
    Some(value)
}

/// The fixed length of a sequence term, where one is determined by its shape.
pub fn fixed_len_of(table: &TermTable, t: TermId) -> Option<i64> {
    match table.kind(t) {
        TermKind::Empty => Some(0),
        TermKind::Unit(_) => Some(1),
        TermKind::Const(w) => Some(w.len() as i64),
        TermKind::Concat(parts) => {
            let parts = parts.clone();
            let mut total = 0;
            for part in parts.iter() {
                total += fixed_len_of(table, *part)?;
            }
            Some(total)
        }
        _ => None,
    }
}

/// True if the concatenation of the parts has a positive lower length bound by shape.
fn shape_is_nonempty(table: &TermTable, parts: &[TermId]) -> bool {
    parts.iter().any(|p| match table.kind(*p) {
        TermKind::Unit(_) | TermKind::Const(_) => true,
        _ => false,
    })
}

/// Normalizes a part-list: flattens nested concatenations, drops `ε`, and fuses
/// adjacent constants and unit-lifted character constants into words.
pub fn norm_parts(table: &mut TermTable, parts: &[TermId]) -> Vec<TermId> {
    let mut flat = Vec::with_capacity(parts.len());
    for part in parts {
        match table.kind(*part) {
            TermKind::Empty => {}
            TermKind::Concat(inner) => {
                let inner = inner.clone();
                for p in inner.iter() {
                    match table.kind(*p) {
                        TermKind::Empty => {}
                        _ => flat.push(*p),
                    }
                }
            }
            _ => flat.push(*part),
        }
    }

    // Fuse constant runs.
    let mut fused: Vec<TermId> = Vec::with_capacity(flat.len());
    let mut run: Vec<char> = Vec::default();
    for part in flat {
        let as_chars = match table.kind(part) {
            TermKind::Const(w) => Some(w.to_vec()),
            TermKind::Unit(e) => table.as_char(*e).map(|c| vec![c]),
            _ => None,
        };
        match as_chars {
            Some(mut chars) => run.append(&mut chars),
            None => {
                if !run.is_empty() {
                    let w = table.const_word(&run);
                    fused.push(w);
                    run.clear();
                }
                fused.push(part);
            }
        }
    }
    if !run.is_empty() {
        let w = table.const_word(&run);
        fused.push(w);
    }
    fused
}

/// The element term at a fixed position of a part-list, where the prefix up to and
/// including the position is determined by shape.
pub fn elem_at_fixed(table: &mut TermTable, parts: &[TermId], at: i64) -> Option<TermId> {
    let mut offset = 0_i64;
    for part in parts {
        match table.kind(*part).clone() {
            TermKind::Unit(e) => {
                if at == offset {
                    return Some(e);
                }
                offset += 1;
            }
            TermKind::Const(w) => {
                let len = w.len() as i64;
                if at < offset + len {
                    return Some(table.chr(w[(at - offset) as usize]));
                }
                offset += len;
            }
            _ => return None,
        }
    }
    None
}

/// Rewrites the top node of `t`, assuming the children are in normal form.
pub fn rewrite(table: &mut TermTable, t: TermId) -> TermId {
    let kind = table.kind(t).clone();
    match kind {
        TermKind::Concat(parts) => {
            let parts = norm_parts(table, &parts);
            table.concat(&parts)
        }

        TermKind::Length(s) => rewrite_length(table, s, t),

        TermKind::Extract(s, i, l) => rewrite_extract(table, s, i, l, t),

        TermKind::At(s, i) => {
            let (Some(w), Some(i)) = (
                table.as_const(s).map(|w| w.to_vec()),
                table.as_int_const(i),
            ) else {
                return t;
            };
            if i < 0 || i >= w.len() as i64 {
                table.empty()
            } else {
                let c = table.chr(w[i as usize]);
                table.unit(c)
            }
        }

        TermKind::Nth(s, i) => {
            let Some(i) = table.as_int_const(i) else {
                return t;
            };
            if i < 0 {
                return t;
            }
            let parts = table.seq_parts(s);
            match elem_at_fixed(table, &parts, i) {
                Some(e) => e,
                None => t,
            }
        }

        TermKind::Itos(i) => match table.as_int_const(i) {
            Some(k) if k < 0 => table.empty(),
            _ => t,
        },

        TermKind::Stoi(s) => match table.as_const(s) {
            Some(w) => {
                let value = eval_digits(&w.to_vec()).unwrap_or(-1);
                table.int(value)
            }
            None => t,
        },

        TermKind::Replace(s, pat, r) => rewrite_replace(table, s, pat, r, t),

        TermKind::Indexof(s, pat, i) => rewrite_indexof(table, s, pat, i, t),

        TermKind::Add(parts) => table.add(&parts),

        TermKind::Mul(a, b) => table.mul(a, b),

        TermKind::Eq(a, b) => rewrite_eq(table, a, b, t),

        TermKind::IntLe(a, b) => {
            if a == b {
                return table.tt();
            }
            match (table.as_int_const(a), table.as_int_const(b)) {
                (Some(x), Some(y)) => {
                    if x <= y {
                        table.tt()
                    } else {
                        table.ff()
                    }
                }
                _ => t,
            }
        }

        TermKind::IntLt(a, b) => {
            if a == b {
                return table.ff();
            }
            match (table.as_int_const(a), table.as_int_const(b)) {
                (Some(x), Some(y)) => {
                    if x < y {
                        table.tt()
                    } else {
                        table.ff()
                    }
                }
                _ => t,
            }
        }

        TermKind::LexLt(a, b) => {
            if a == b {
                return table.ff();
            }
            match (table.as_const(a), table.as_const(b)) {
                (Some(x), Some(y)) => {
                    if x < y {
                        table.tt()
                    } else {
                        table.ff()
                    }
                }
                _ => t,
            }
        }

        TermKind::LexLe(a, b) => {
            if a == b {
                return table.tt();
            }
            match (table.as_const(a), table.as_const(b)) {
                (Some(x), Some(y)) => {
                    if x <= y {
                        table.tt()
                    } else {
                        table.ff()
                    }
                }
                _ => t,
            }
        }

        TermKind::Contains(h, n) => rewrite_contains(table, h, n, t),

        TermKind::PrefixOf(p, full) => match reduce_bool_prefix(table, p, full) {
            BoolReduction::Value(true) => table.tt(),
            BoolReduction::Value(false) => table.ff(),
            _ => t,
        },

        TermKind::SuffixOf(suf, full) => match reduce_bool_suffix(table, suf, full) {
            BoolReduction::Value(true) => table.tt(),
            BoolReduction::Value(false) => table.ff(),
            _ => t,
        },

        TermKind::InRe(s, re) => match table.kind(re) {
            TermKind::ReEmpty => table.ff(),
            TermKind::ReEpsilon => {
                let e = table.empty();
                table.eq(s, e)
            }
            TermKind::ReLiteral(w) => {
                let w = w.to_vec();
                let c = table.const_word(&w);
                table.eq(s, c)
            }
            _ => t,
        },

        TermKind::Ite(c, then, els) => {
            if then == els {
                return then;
            }
            match table.kind(c) {
                TermKind::True => then,
                TermKind::False => els,
                _ => t,
            }
        }

        TermKind::Skolem(SkolemKind::Pre, args) => {
            let (s, i) = (args[0], args[1]);
            if table.as_int_const(i) == Some(0) {
                return table.empty();
            }
            let Some(i) = table.as_int_const(i) else {
                return t;
            };
            if let Some(w) = table.as_const(s).map(|w| w.to_vec()) {
                let end = i.clamp(0, w.len() as i64) as usize;
                return table.const_word(&w[..end]);
            }
            rewrite_take(table, s, i, t)
        }

        TermKind::Skolem(SkolemKind::Post, args) => {
            let (s, i) = (args[0], args[1]);
            if table.as_int_const(i) == Some(0) {
                return s;
            }
            rewrite_drop(table, s, i, 0, t)
        }

        TermKind::Skolem(SkolemKind::Tail, args) => {
            let (s, i) = (args[0], args[1]);
            rewrite_drop(table, s, i, 1, t)
        }

        TermKind::Skolem(SkolemKind::SeqFirst, args) => {
            let parts = table.seq_parts(args[0]);
            match elem_at_fixed(table, &parts, 0) {
                Some(e) => e,
                None => t,
            }
        }

        TermKind::Skolem(SkolemKind::Digit2Int, args) => {
            match table.as_char(args[0]).and_then(digit_val) {
                Some(v) => table.int(v),
                None => t,
            }
        }

        _ => t,
    }
}

/// Takes the first `i` elements of `s`, where the covering prefix is determined by
/// shape.
fn rewrite_take(table: &mut TermTable, s: TermId, i: i64, original: TermId) -> TermId {
    if i < 0 {
        return table.empty();
    }
    let parts = table.seq_parts(s);
    let mut remaining = i;
    let mut taken: Vec<TermId> = Vec::default();
    for part in parts {
        if remaining == 0 {
            break;
        }
        match table.kind(part).clone() {
            TermKind::Unit(_) => {
                taken.push(part);
                remaining -= 1;
            }
            TermKind::Const(w) => {
                let len = w.len() as i64;
                if len <= remaining {
                    taken.push(part);
                    remaining -= len;
                } else {
                    let keep = table.const_word(&w[..remaining as usize]);
                    taken.push(keep);
                    remaining = 0;
                }
            }
            _ => return original,
        }
    }
    if remaining > 0 {
        // The shaped parts were exhausted: taking past the end yields the whole.
        return if taken.len() == table.seq_parts(s).len() { s } else { original };
    }
    table.concat(&taken)
}

/// Drops the first `i + extra` elements of `s`, where the dropped prefix is determined
/// by shape; the shared tail of `post` (`extra = 0`) and `tail` (`extra = 1`).
fn rewrite_drop(table: &mut TermTable, s: TermId, i: TermId, extra: i64, original: TermId) -> TermId {
    let Some(i) = table.as_int_const(i) else {
        return original;
    };
    let drop = i + extra;
    if drop < 0 {
        return original;
    }
    if let Some(w) = table.as_const(s).map(|w| w.to_vec()) {
        let start = drop.clamp(0, w.len() as i64) as usize;
        return table.const_word(&w[start..]);
    }
    // A shaped prefix: peel units and constants covering exactly `drop` elements.
    let parts = table.seq_parts(s);
    let mut remaining = drop;
    let mut rest: Vec<TermId> = Vec::default();
    for (ix, part) in parts.iter().enumerate() {
        if remaining == 0 {
            rest.extend_from_slice(&parts[ix..]);
            break;
        }
        match table.kind(*part).clone() {
            TermKind::Unit(_) => remaining -= 1,
            TermKind::Const(w) => {
                let len = w.len() as i64;
                if len <= remaining {
                    remaining -= len;
                } else {
                    let keep = table.const_word(&w[remaining as usize..]);
                    rest.push(keep);
                    remaining = 0;
                }
            }
            _ => return original,
        }
    }
    if remaining > 0 {
        // The shaped parts were exhausted: dropping past the end yields ε.
        return if rest.is_empty() { table.empty() } else { original };
    }
    table.concat(&rest)
}

fn rewrite_length(table: &mut TermTable, s: TermId, original: TermId) -> TermId {
    match table.kind(s).clone() {
        TermKind::Empty => table.int(0),
        TermKind::Unit(_) => table.int(1),
        TermKind::Const(w) => table.int(w.len() as i64),
        TermKind::Concat(parts) => {
            let mut lengths = Vec::with_capacity(parts.len());
            for part in parts.iter() {
                let l = table.length(*part);
                let l = rewrite(table, l);
                lengths.push(l);
            }
            table.add(&lengths)
        }
        _ => original,
    }
}

fn rewrite_extract(
    table: &mut TermTable,
    s: TermId,
    i: TermId,
    l: TermId,
    original: TermId,
) -> TermId {
    // substr(s, 0, |s|) is s.
    if table.as_int_const(i) == Some(0) && *table.kind(l) == TermKind::Length(s) {
        return s;
    }
    match (table.as_int_const(i), table.as_int_const(l)) {
        (Some(i), Some(l)) if i < 0 || l <= 0 => table.empty(),
        (Some(i), Some(l)) => {
            let Some(w) = table.as_const(s).map(|w| w.to_vec()) else {
                return original;
            };
            if i >= w.len() as i64 {
                return table.empty();
            }
            let start = i as usize;
            let end = (i + l).clamp(0, w.len() as i64) as usize;
            table.const_word(&w[start..end])
        }
        _ => original,
    }
}

fn rewrite_replace(
    table: &mut TermTable,
    s: TermId,
    pat: TermId,
    r: TermId,
    original: TermId,
) -> TermId {
    let (Some(sw), Some(pw)) = (
        table.as_const(s).map(|w| w.to_vec()),
        table.as_const(pat).map(|w| w.to_vec()),
    ) else {
        return original;
    };
    match find_word(&sw, &pw, 0) {
        None => s,
        Some(at) => {
            let prefix = table.const_word(&sw[..at]);
            let suffix = table.const_word(&sw[at + pw.len()..]);
            table.concat(&[prefix, r, suffix])
        }
    }
}

fn rewrite_indexof(
    table: &mut TermTable,
    s: TermId,
    pat: TermId,
    i: TermId,
    original: TermId,
) -> TermId {
    let (Some(sw), Some(pw), Some(from)) = (
        table.as_const(s).map(|w| w.to_vec()),
        table.as_const(pat).map(|w| w.to_vec()),
        table.as_int_const(i),
    ) else {
        return original;
    };
    if from < 0 || from > sw.len() as i64 {
        return table.int(-1);
    }
    match find_word(&sw, &pw, from as usize) {
        Some(at) => table.int(at as i64),
        None => table.int(-1),
    }
}

/// The first match position of `pat` in `s` at or after `from`.
fn find_word(s: &[char], pat: &[char], from: usize) -> Option<usize> {
    if pat.is_empty() {
        return if from <= s.len() { Some(from) } else { None };
    }
    if pat.len() > s.len() {
        return None;
    }
    (from..=s.len() - pat.len()).find(|&at| s[at..at + pat.len()] == *pat)
}

fn rewrite_contains(table: &mut TermTable, h: TermId, n: TermId, original: TermId) -> TermId {
    if h == n {
        return table.tt();
    }
    if let Some(nw) = table.as_const(n) {
        if nw.is_empty() {
            return table.tt();
        }
    }
    if let TermKind::Empty = table.kind(h) {
        // contains(ε, n) iff n = ε.
        let e = table.empty();
        return table.eq(n, e);
    }
    let (Some(hw), Some(nw)) = (
        table.as_const(h).map(|w| w.to_vec()),
        table.as_const(n).map(|w| w.to_vec()),
    ) else {
        return original;
    };
    match find_word(&hw, &nw, 0) {
        Some(_) => table.tt(),
        None => table.ff(),
    }
}

fn rewrite_eq(table: &mut TermTable, a: TermId, b: TermId, original: TermId) -> TermId {
    if a == b {
        return table.tt();
    }
    match table.sort(a) {
        Sort::Seq => {
            let la = table.seq_parts(a);
            let ra = table.seq_parts(b);
            let reduction = reduce_eq(table, &la, &ra);
            match reduction.verdict {
                EqVerdict::Contradiction => table.ff(),
                EqVerdict::Solved if reduction.subeqs.is_empty() => table.tt(),
                _ => original,
            }
        }
        Sort::Elem => match (table.as_char(a), table.as_char(b)) {
            (Some(x), Some(y)) => {
                if x == y {
                    table.tt()
                } else {
                    table.ff()
                }
            }
            _ => original,
        },
        Sort::Int => match (table.as_int_const(a), table.as_int_const(b)) {
            (Some(x), Some(y)) => {
                if x == y {
                    table.tt()
                } else {
                    table.ff()
                }
            }
            _ => original,
        },
        _ => original,
    }
}

/// Reduces an equation between two part-lists.
///
/// Shared prefixes and suffixes are cancelled, units against constants peel to element
/// equations, and incompatible fixed lengths or mismatched constants report a
/// contradiction.
pub fn reduce_eq(table: &mut TermTable, lhs: &[TermId], rhs: &[TermId]) -> EqReduction {
    let mut lhs = norm_parts(table, lhs);
    let mut rhs = norm_parts(table, rhs);
    let mut subeqs: Vec<(TermId, TermId)> = Vec::default();

    // Peel matching heads.
    loop {
        let (Some(&l), Some(&r)) = (lhs.first(), rhs.first()) else {
            break;
        };
        if l == r {
            lhs.remove(0);
            rhs.remove(0);
            continue;
        }
        match peel_front(table, l, r, &mut subeqs) {
            Peel::Consumed(new_l, new_r) => {
                replace_front(table, &mut lhs, new_l);
                replace_front(table, &mut rhs, new_r);
            }
            Peel::Mismatch => {
                return EqReduction {
                    verdict: EqVerdict::Contradiction,
                    subeqs,
                    lhs: Vec::default(),
                    rhs: Vec::default(),
                };
            }
            Peel::Stuck => break,
        }
    }

    // Peel matching tails.
    loop {
        let (Some(&l), Some(&r)) = (lhs.last(), rhs.last()) else {
            break;
        };
        if l == r {
            lhs.pop();
            rhs.pop();
            continue;
        }
        match peel_back(table, l, r, &mut subeqs) {
            Peel::Consumed(new_l, new_r) => {
                replace_back(table, &mut lhs, new_l);
                replace_back(table, &mut rhs, new_r);
            }
            Peel::Mismatch => {
                return EqReduction {
                    verdict: EqVerdict::Contradiction,
                    subeqs,
                    lhs: Vec::default(),
                    rhs: Vec::default(),
                };
            }
            Peel::Stuck => break,
        }
    }

    // Residual verdicts.
    if lhs.is_empty() && rhs.is_empty() {
        return EqReduction {
            verdict: EqVerdict::Solved,
            subeqs,
            lhs,
            rhs,
        };
    }

    if lhs.is_empty() || rhs.is_empty() {
        let remainder = if lhs.is_empty() { &rhs } else { &lhs };
        if shape_is_nonempty(table, remainder) {
            return EqReduction {
                verdict: EqVerdict::Contradiction,
                subeqs,
                lhs: Vec::default(),
                rhs: Vec::default(),
            };
        }
        // Every remaining part must be ε.
        let e = table.empty();
        for part in remainder.iter() {
            subeqs.push((*part, e));
        }
        return EqReduction {
            verdict: EqVerdict::Solved,
            subeqs,
            lhs: Vec::default(),
            rhs: Vec::default(),
        };
    }

    // Both residuals non-empty: a fixed-length mismatch is a contradiction.
    let total = |table: &TermTable, parts: &[TermId]| -> Option<i64> {
        let mut sum = 0;
        for part in parts {
            sum += fixed_len_of(table, *part)?;
        }
        Some(sum)
    };
    if let (Some(x), Some(y)) = (total(table, &lhs), total(table, &rhs)) {
        if x != y {
            return EqReduction {
                verdict: EqVerdict::Contradiction,
                subeqs,
                lhs: Vec::default(),
                rhs: Vec::default(),
            };
        }
    }

    EqReduction {
        verdict: EqVerdict::Open,
        subeqs,
        lhs,
        rhs,
    }
}

enum Peel {
    /// The heads (or tails) interacted; each side's part is replaced by the given term
    /// (`ε` when consumed).
    Consumed(TermId, TermId),

    /// The heads (or tails) are incompatible constants.
    Mismatch,

    /// No interaction applies.
    Stuck,
}

fn replace_front(table: &mut TermTable, parts: &mut Vec<TermId>, with: TermId) {
    if let TermKind::Empty = table.kind(with) {
        parts.remove(0);
    } else {
        parts[0] = with;
    }
}

fn replace_back(table: &mut TermTable, parts: &mut Vec<TermId>, with: TermId) {
    if let TermKind::Empty = table.kind(with) {
        parts.pop();
    } else {
        let at = parts.len() - 1;
        parts[at] = with;
    }
}

fn peel_front(table: &mut TermTable, l: TermId, r: TermId, subeqs: &mut Vec<(TermId, TermId)>) -> Peel {
    let lk = table.kind(l).clone();
    let rk = table.kind(r).clone();
    match (lk, rk) {
        (TermKind::Const(x), TermKind::Const(y)) => {
            if x[0] != y[0] {
                return Peel::Mismatch;
            }
            let common = x.iter().zip(y.iter()).take_while(|(a, b)| a == b).count();
            let lx = table.const_word(&x[common..]);
            let rx = table.const_word(&y[common..]);
            Peel::Consumed(lx, rx)
        }
        (TermKind::Unit(e), TermKind::Const(w)) => {
            let c = table.chr(w[0]);
            subeqs.push((e, c));
            let e2 = table.empty();
            let rest = table.const_word(&w[1..]);
            Peel::Consumed(e2, rest)
        }
        (TermKind::Const(w), TermKind::Unit(e)) => {
            let c = table.chr(w[0]);
            subeqs.push((c, e));
            let rest = table.const_word(&w[1..]);
            let e2 = table.empty();
            Peel::Consumed(rest, e2)
        }
        (TermKind::Unit(a), TermKind::Unit(b)) => {
            subeqs.push((a, b));
            let e = table.empty();
            Peel::Consumed(e, e)
        }
        _ => Peel::Stuck,
    }
}

fn peel_back(table: &mut TermTable, l: TermId, r: TermId, subeqs: &mut Vec<(TermId, TermId)>) -> Peel {
    let lk = table.kind(l).clone();
    let rk = table.kind(r).clone();
    match (lk, rk) {
        (TermKind::Const(x), TermKind::Const(y)) => {
            if x[x.len() - 1] != y[y.len() - 1] {
                return Peel::Mismatch;
            }
            let common = x
                .iter()
                .rev()
                .zip(y.iter().rev())
                .take_while(|(a, b)| a == b)
                .count();
            let lx = table.const_word(&x[..x.len() - common]);
            let rx = table.const_word(&y[..y.len() - common]);
            Peel::Consumed(lx, rx)
        }
        (TermKind::Unit(e), TermKind::Const(w)) => {
            let c = table.chr(w[w.len() - 1]);
            subeqs.push((e, c));
            let e2 = table.empty();
            let rest = table.const_word(&w[..w.len() - 1]);
            Peel::Consumed(e2, rest)
        }
        (TermKind::Const(w), TermKind::Unit(e)) => {
            let c = table.chr(w[w.len() - 1]);
            subeqs.push((c, e));
            let rest = table.const_word(&w[..w.len() - 1]);
            let e2 = table.empty();
            Peel::Consumed(rest, e2)
        }
        (TermKind::Unit(a), TermKind::Unit(b)) => {
            subeqs.push((a, b));
            let e = table.empty();
            Peel::Consumed(e, e)
        }
        _ => Peel::Stuck,
    }
}

/// Reduces a disequation between two terms.
pub fn reduce_ne(table: &mut TermTable, l: TermId, r: TermId) -> NeReduction {
    if l == r {
        return NeReduction::Equal;
    }
    match table.sort(l) {
        Sort::Seq => {
            let lp = table.seq_parts(l);
            let rp = table.seq_parts(r);
            let reduction = reduce_eq(table, &lp, &rp);
            match reduction.verdict {
                EqVerdict::Contradiction => NeReduction::Distinct,
                EqVerdict::Solved => {
                    if reduction.subeqs.is_empty() {
                        NeReduction::Equal
                    } else {
                        NeReduction::Split(reduction.subeqs)
                    }
                }
                EqVerdict::Open => NeReduction::Opaque,
            }
        }
        Sort::Elem => match (table.as_char(l), table.as_char(r)) {
            (Some(x), Some(y)) if x == y => NeReduction::Equal,
            (Some(_), Some(_)) => NeReduction::Distinct,
            _ => NeReduction::Split(vec![(l, r)]),
        },
        Sort::Int => match (table.as_int_const(l), table.as_int_const(r)) {
            (Some(x), Some(y)) if x == y => NeReduction::Equal,
            (Some(_), Some(_)) => NeReduction::Distinct,
            _ => NeReduction::Opaque,
        },
        _ => NeReduction::Opaque,
    }
}

fn reduce_bool_prefix(table: &mut TermTable, p: TermId, full: TermId) -> BoolReduction {
    if let TermKind::Empty = table.kind(p) {
        return BoolReduction::Value(true);
    }
    if p == full {
        return BoolReduction::Value(true);
    }
    let pp = table.seq_parts(p);
    let fp = table.seq_parts(full);
    let (Some(plen), flen) = (
        pp.iter().try_fold(0_i64, |acc, t| Some(acc + fixed_len_of(table, *t)?)),
        fp.iter().try_fold(0_i64, |acc, t| Some(acc + fixed_len_of(table, *t)?)),
    ) else {
        return BoolReduction::Open;
    };
    match flen {
        Some(flen) if plen > flen => return BoolReduction::Value(false),
        Some(_) => {}
        None => return BoolReduction::Open,
    }
    let mut conj = Vec::with_capacity(plen as usize);
    for at in 0..plen {
        let (Some(pe), Some(fe)) = (
            elem_at_fixed(table, &pp, at),
            elem_at_fixed(table, &fp, at),
        ) else {
            return BoolReduction::Open;
        };
        let eq = table.eq(pe, fe);
        match table.kind(eq) {
            TermKind::True => {}
            _ => {
                let eq = rewrite(table, eq);
                match table.kind(eq) {
                    TermKind::True => {}
                    TermKind::False => return BoolReduction::Value(false),
                    _ => conj.push(eq),
                }
            }
        }
    }
    if conj.is_empty() {
        BoolReduction::Value(true)
    } else {
        BoolReduction::Conj(conj)
    }
}

fn reduce_bool_suffix(table: &mut TermTable, suf: TermId, full: TermId) -> BoolReduction {
    if let TermKind::Empty = table.kind(suf) {
        return BoolReduction::Value(true);
    }
    if suf == full {
        return BoolReduction::Value(true);
    }
    let sp = table.seq_parts(suf);
    let fp = table.seq_parts(full);
    let (Some(slen), Some(flen)) = (
        sp.iter().try_fold(0_i64, |acc, t| Some(acc + fixed_len_of(table, *t)?)),
        fp.iter().try_fold(0_i64, |acc, t| Some(acc + fixed_len_of(table, *t)?)),
    ) else {
        return BoolReduction::Open;
    };
    if slen > flen {
        return BoolReduction::Value(false);
    }
    let mut conj = Vec::with_capacity(slen as usize);
    for at in 0..slen {
        let (Some(se), Some(fe)) = (
            elem_at_fixed(table, &sp, at),
            elem_at_fixed(table, &fp, flen - slen + at),
        ) else {
            return BoolReduction::Open;
        };
        let eq = table.eq(se, fe);
        let eq = rewrite(table, eq);
        match table.kind(eq) {
            TermKind::True => {}
            TermKind::False => return BoolReduction::Value(false),
            _ => conj.push(eq),
        }
    }
    if conj.is_empty() {
        BoolReduction::Value(true)
    } else {
        BoolReduction::Conj(conj)
    }
}

/// Evaluates a boolean-sorted term whose arguments are concrete enough, to a constant
/// or a conjunction of equations.
pub fn reduce_bool(table: &mut TermTable, t: TermId) -> BoolReduction {
    let kind = table.kind(t).clone();
    match kind {
        TermKind::True => BoolReduction::Value(true),
        TermKind::False => BoolReduction::Value(false),

        TermKind::Eq(a, b) => {
            if table.sort(a) == Sort::Seq {
                let lp = table.seq_parts(a);
                let rp = table.seq_parts(b);
                let reduction = reduce_eq(table, &lp, &rp);
                match reduction.verdict {
                    EqVerdict::Contradiction => BoolReduction::Value(false),
                    EqVerdict::Solved => {
                        if reduction.subeqs.is_empty() {
                            BoolReduction::Value(true)
                        } else {
                            let mut conj = Vec::with_capacity(reduction.subeqs.len());
                            for (x, y) in reduction.subeqs {
                                let eq = table.eq(x, y);
                                let eq = rewrite(table, eq);
                                match table.kind(eq) {
                                    TermKind::True => {}
                                    TermKind::False => return BoolReduction::Value(false),
                                    _ => conj.push(eq),
                                }
                            }
                            if conj.is_empty() {
                                BoolReduction::Value(true)
                            } else {
                                BoolReduction::Conj(conj)
                            }
                        }
                    }
                    EqVerdict::Open => BoolReduction::Open,
                }
            } else {
                let eq = rewrite(table, t);
                match table.kind(eq) {
                    TermKind::True => BoolReduction::Value(true),
                    TermKind::False => BoolReduction::Value(false),
                    _ => BoolReduction::Open,
                }
            }
        }

        TermKind::PrefixOf(p, full) => reduce_bool_prefix(table, p, full),
        TermKind::SuffixOf(suf, full) => reduce_bool_suffix(table, suf, full),

        TermKind::Contains(h, n) => {
            let r = rewrite_contains(table, h, n, t);
            match table.kind(r) {
                TermKind::True => BoolReduction::Value(true),
                TermKind::False => BoolReduction::Value(false),
                TermKind::Eq(_, _) if r != t => BoolReduction::Conj(vec![r]),
                _ => BoolReduction::Open,
            }
        }

        TermKind::LexLt(_, _) | TermKind::LexLe(_, _) | TermKind::IntLe(_, _)
        | TermKind::IntLt(_, _) => {
            let r = rewrite(table, t);
            match table.kind(r) {
                TermKind::True => BoolReduction::Value(true),
                TermKind::False => BoolReduction::Value(false),
                _ => BoolReduction::Open,
            }
        }

        _ => BoolReduction::Open,
    }
}

/// True if `v` occurs in `t`, looking through sequence structure but treating the
/// element accessors `nth` and `seq_first` as atomic.
///
/// The restriction is what lets a variable be solved by its own element-wise
/// expansion: `x ↦ unit(nth(x, 0)) ++ … ` closes no chain, as `find` never descends
/// into the expansion's elements.
pub fn occurs_in(table: &TermTable, v: TermId, t: TermId) -> bool {
    if v == t {
        return true;
    }
    use TermKind::*;
    match table.kind(t) {
        Nth(_, _) | Skolem(SkolemKind::SeqFirst, _) => false,

        Unit(a) | Itos(a) | Stoi(a) | Length(a) | ReComp(a) | ReStar(a) | RePlus(a)
        | ReOpt(a) => occurs_in(table, v, *a),

        Eq(a, b) | InRe(a, b) | Contains(a, b) | PrefixOf(a, b) | SuffixOf(a, b)
        | LexLt(a, b) | LexLe(a, b) | IntLe(a, b) | IntLt(a, b) | Mul(a, b)
        | ReUnion(a, b) | ReConcat(a, b) | ReInter(a, b) => {
            occurs_in(table, v, *a) || occurs_in(table, v, *b)
        }

        CharIn(a, _) => occurs_in(table, v, *a),

        Extract(a, b, c) | Replace(a, b, c) | Indexof(a, b, c) | Ite(a, b, c) => {
            occurs_in(table, v, *a) || occurs_in(table, v, *b) || occurs_in(table, v, *c)
        }

        Concat(parts) | Add(parts) | Skolem(_, parts) => {
            parts.iter().any(|p| occurs_in(table, v, *p))
        }

        _ => false,
    }
}

#[cfg(test)]
mod rewriter_tests {
    use super::*;
    use crate::structures::term::Sort;

    fn table() -> TermTable {
        TermTable::default()
    }

    #[test]
    fn lengths_of_shapes() {
        let mut t = table();
        let ab = t.const_str("ab");
        let x = t.var("x", Sort::Seq);
        let xab = t.concat(&[x, ab]);

        let l = t.length(ab);
        assert_eq!(rewrite(&mut t, l), t.int(2));

        let l = t.length(xab);
        let r = rewrite(&mut t, l);
        let expected_x = t.length(x);
        let two = t.int(2);
        let expected = t.add(&[two, expected_x]);
        assert_eq!(r, expected);
    }

    #[test]
    fn extract_boundaries() {
        let mut t = table();
        let abc = t.const_str("abc");

        let (zero, one, three, minus) = (t.int(0), t.int(1), t.int(3), t.int(-1));

        let e = t.extract(abc, minus, one);
        assert_eq!(rewrite(&mut t, e), t.empty());

        let e = t.extract(abc, three, one);
        assert_eq!(rewrite(&mut t, e), t.empty());

        let e = t.extract(abc, zero, zero);
        assert_eq!(rewrite(&mut t, e), t.empty());

        let e = t.extract(abc, one, three);
        assert_eq!(rewrite(&mut t, e), t.const_str("bc"));
    }

    #[test]
    fn stoi_and_digits() {
        let mut t = table();
        let w = t.const_str("042");
        let s = t.stoi(w);
        assert_eq!(rewrite(&mut t, s), t.int(42));

        let w = t.const_str("a2");
        let s = t.stoi(w);
        assert_eq!(rewrite(&mut t, s), t.int(-1));

        assert_eq!(eval_digits(&['0', '4', '2']), Some(42));
        assert_eq!(eval_digits(&['x']), None);
    }

    #[test]
    fn reduce_eq_peels_shared_suffix() {
        let mut t = table();
        let x = t.var("x", Sort::Seq);
        let ab = t.const_str("ab");
        let cab = t.const_str("cab");

        let reduction = reduce_eq(&mut t, &[x, ab], &[cab]);
        assert_eq!(reduction.verdict, EqVerdict::Open);
        assert_eq!(reduction.lhs, vec![x]);
        assert_eq!(reduction.rhs, vec![t.const_str("c")]);
        assert!(reduction.subeqs.is_empty());
    }

    #[test]
    fn reduce_eq_contradiction_on_mismatch() {
        let mut t = table();
        let ab = t.const_str("ab");
        let cb = t.const_str("cb");
        let reduction = reduce_eq(&mut t, &[ab], &[cb]);
        assert_eq!(reduction.verdict, EqVerdict::Contradiction);
    }

    #[test]
    fn reduce_eq_unit_against_const() {
        let mut t = table();
        let e1 = t.var("e1", Sort::Elem);
        let e2 = t.var("e2", Sort::Elem);
        let u1 = t.unit(e1);
        let u2 = t.unit(e2);
        let ab = t.const_str("ab");

        let reduction = reduce_eq(&mut t, &[u1, u2], &[ab]);
        assert_eq!(reduction.verdict, EqVerdict::Solved);
        let a = t.chr('a');
        let b = t.chr('b');
        assert_eq!(reduction.subeqs, vec![(e1, a), (e2, b)]);
    }

    #[test]
    fn reduce_eq_length_mismatch() {
        let mut t = table();
        let e1 = t.var("e1", Sort::Elem);
        let u1 = t.unit(e1);
        let ab = t.const_str("ab");
        // unit(e1) = "ab" differs in length.
        let reduction = reduce_eq(&mut t, &[u1], &[ab]);
        assert_eq!(reduction.verdict, EqVerdict::Contradiction);
    }

    #[test]
    fn reduce_eq_empties_remainder() {
        let mut t = table();
        let x = t.var("x", Sort::Seq);
        let y = t.var("y", Sort::Seq);
        let reduction = reduce_eq(&mut t, &[x, y], &[]);
        assert_eq!(reduction.verdict, EqVerdict::Solved);
        let e = t.empty();
        assert_eq!(reduction.subeqs, vec![(x, e), (y, e)]);
    }

    #[test]
    fn occurs_skips_nth() {
        let mut t = table();
        let x = t.var("x", Sort::Seq);
        let y = t.var("y", Sort::Seq);
        let n = t.nth_i(x, 0);
        let u = t.unit(n);
        let tail = crate::skolem::tail(&mut t, x, 0);
        let expansion = t.concat(&[u, tail]);

        // x occurs in its decomposition through the tail, but not through nth alone.
        assert!(occurs_in(&t, x, expansion));
        assert!(!occurs_in(&t, x, u));
        assert!(!occurs_in(&t, y, expansion));

        let xy = t.concat(&[x, y]);
        assert!(occurs_in(&t, y, xy));
    }

    #[test]
    fn prefix_reduction_to_elements() {
        let mut t = table();
        let x = t.var("x", Sort::Seq);
        let n0 = t.nth_i(x, 0);
        let n1 = t.nth_i(x, 1);
        let u0 = t.unit(n0);
        let u1 = t.unit(n1);
        let px = t.concat(&[u0, u1]);
        let abab = t.const_str("abab");

        match reduce_bool_prefix(&mut t, px, abab) {
            BoolReduction::Conj(conj) => {
                let a = t.chr('a');
                let b = t.chr('b');
                let e0 = t.eq(n0, a);
                let e1 = t.eq(n1, b);
                assert_eq!(conj, vec![e0, e1]);
            }
            other => panic!("expected a conjunction, got {other:?}"),
        }
    }

    #[test]
    fn tail_of_constant() {
        let mut t = table();
        let abab = t.const_str("abab");
        let tl = crate::skolem::tail(&mut t, abab, 0);
        assert_eq!(rewrite(&mut t, tl), t.const_str("bab"));
    }
}
