/*!
Terms of the sequence signature, shared by identity in a hash-consing table.

A [TermId] indexes the [TermTable] owning every term created during a session.
Creation is monotone: terms are never freed within a search, so ids held by any store
remain valid for the lifetime of the table.

The enumeration of operators is closed at compile time: [TermKind] is a tagged variant
with a match in every traversal.
Adding an operator requires coordinated edits in the [canonizer](crate::canonize), the
[axiom module](crate::axioms), the [rewriter](crate::rewriter), and the
[model constructor](crate::model).

Terms span five sorts:

- `Seq` — finite sequences of alphabet elements,
- `Elem` — alphabet elements (Unicode scalar values),
- `Int` — mathematical integers (lengths, indices, int↔string),
- `Bool` — the atoms handed to the kernel,
- `Regex` — regular expressions over the alphabet.
*/

use rustc_hash::FxHashMap;

/// The index of a term in the [TermTable].
pub type TermId = u32;

/// The index of an interned character predicate (see [crate::regexes]).
pub type PredId = u32;

/// The sort of a term.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Sort {
    /// Finite sequences.
    Seq,

    /// Alphabet elements.
    Elem,

    /// Mathematical integers.
    Int,

    /// Booleans.
    Bool,

    /// Regular expressions.
    Regex,
}

/// The family of a Skolem application.
///
/// Each family is a distinct symbol whose semantics the [axiom module](crate::axioms)
/// pins down.
/// Skolem predicates about automata ([Accept](SkolemKind::Accept) and
/// [Step](SkolemKind::Step)) are not safe to copy across contexts: they depend on the
/// automaton instantiated at creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SkolemKind {
    /// `tail(s, i)` — the suffix of `s` starting at position `i + 1`.
    Tail,

    /// `pre(s, i)` — the prefix of `s` of length `i`.
    Pre,

    /// `post(s, i)` — the suffix of `s` starting at position `i`.
    Post,

    /// `indexof_left(s, t)` — the prefix of `s` before the first match of `t`.
    IndexofLeft,

    /// `indexof_right(s, t)` — the suffix of `s` after the first match of `t`.
    IndexofRight,

    /// `prefix_inv(a, b)` — the continuation making `a` a prefix of `b`.
    PrefixInv,

    /// `suffix_inv(a, b)` — the prolongation making `a` a suffix of `b`.
    SuffixInv,

    /// `seq_first(s)` — the first element of a non-empty `s`.
    SeqFirst,

    /// `digit2int(c)` — the numeric value of a decimal digit element.
    Digit2Int,

    /// `diseq_idx(a, b)` — a position at which `a` and `b` differ, if they do.
    DiseqIndex,

    /// `accept(s, i, R, q)` — `s` is accepted by the automaton for `R` from state `q`,
    /// starting at position `i`.
    Accept,

    /// `step(s, i, R, q, q')` — the automaton for `R` takes the transition `q → q'` on
    /// the element at position `i` of `s`.
    Step,

    /// `max_unfolding(d)` — the budget literal at unfolding depth `d`.
    MaxUnfolding,

    /// `length_limit(s, k)` — the budget literal bounding `|s| ≤ k`.
    LengthLimit,
}

/// A ground expression in the sequence signature.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TermKind {
    // Booleans.
    /// The true constant.
    True,

    /// The false constant.
    False,

    /// Polymorphic equality; arguments are kept in id order.
    Eq(TermId, TermId),

    /// Membership of a sequence in a regular language.
    InRe(TermId, TermId),

    /// `contains(hay, needle)`.
    Contains(TermId, TermId),

    /// `prefixof(pre, full)`.
    PrefixOf(TermId, TermId),

    /// `suffixof(suf, full)`.
    SuffixOf(TermId, TermId),

    /// Strict lexicographic order.
    LexLt(TermId, TermId),

    /// Reflexive lexicographic order.
    LexLe(TermId, TermId),

    /// Integer `≤`.
    IntLe(TermId, TermId),

    /// Integer `<`.
    IntLt(TermId, TermId),

    /// The element satisfies the interned character predicate.
    CharIn(TermId, PredId),

    // Sequences.
    /// A variable of the noted sort (`Seq`, `Elem`, or `Int`).
    Var {
        /// Index into the table's name registry.
        name: u32,
        /// The sort of the variable.
        sort: Sort,
    },

    /// The empty sequence `ε`.
    Empty,

    /// The unit lift of an alphabet element.
    Unit(TermId),

    /// A word constant.
    Const(Box<[char]>),

    /// Concatenation, flattened at creation.
    Concat(Box<[TermId]>),

    /// `substr(s, i, l)`.
    Extract(TermId, TermId, TermId),

    /// `at(s, i)` — the unit at position `i`, or `ε` out of range.
    At(TermId, TermId),

    /// `replace(s, t, r)` — `s` with the first match of `t` replaced by `r`.
    Replace(TermId, TermId, TermId),

    /// `itos(i)` — a decimal rendering of a non-negative `i`, `ε` otherwise.
    Itos(TermId),

    // Elements.
    /// An alphabet element constant.
    Char(char),

    /// `nth(s, i)` — the element at position `i`; unconstrained out of range.
    Nth(TermId, TermId),

    // Integers.
    /// An integer constant.
    IntConst(i64),

    /// `|s|`.
    Length(TermId),

    /// A flattened sum.
    Add(Box<[TermId]>),

    /// A product.
    Mul(TermId, TermId),

    /// `indexof(s, t, i)` — the first match position of `t` in `s` at or after `i`.
    Indexof(TermId, TermId, TermId),

    /// `stoi(s)` — the decimal value of `s`, or `-1`.
    Stoi(TermId),

    // Regexes.
    /// The empty language.
    ReEmpty,

    /// The language of the empty sequence.
    ReEpsilon,

    /// The language of exactly one word.
    ReLiteral(Box<[char]>),

    /// A character class by inclusive range.
    ReRange(char, char),

    /// Any single character.
    ReAny,

    /// Union of languages.
    ReUnion(TermId, TermId),

    /// Concatenation of languages.
    ReConcat(TermId, TermId),

    /// Intersection of languages.
    ReInter(TermId, TermId),

    /// Complement of a language.
    ReComp(TermId),

    /// Kleene star.
    ReStar(TermId),

    /// Kleene plus.
    RePlus(TermId),

    /// Zero or one.
    ReOpt(TermId),

    /// If-then-else over a non-boolean sort.
    Ite(TermId, TermId, TermId),

    /// A Skolem application.
    Skolem(SkolemKind, Box<[TermId]>),
}

/// The hash-consing arena owning every term of a session.
pub struct TermTable {
    kinds: Vec<TermKind>,
    ids: FxHashMap<TermKind, TermId>,
    names: Vec<Box<str>>,
    name_ids: FxHashMap<Box<str>, u32>,
    fresh: u32,
}

impl Default for TermTable {
    fn default() -> Self {
        let mut table = TermTable {
            kinds: Vec::default(),
            ids: FxHashMap::default(),
            names: Vec::default(),
            name_ids: FxHashMap::default(),
            fresh: 0,
        };
        // Fix the ids of the boolean and sequence constants.
        table.intern(TermKind::True);
        table.intern(TermKind::False);
        table.intern(TermKind::Empty);
        table
    }
}

impl TermTable {
    /// The id of the noted kind, creating the term if required.
    pub fn intern(&mut self, kind: TermKind) -> TermId {
        if let Some(id) = self.ids.get(&kind) {
            return *id;
        }
        let id = self.kinds.len() as TermId;
        self.kinds.push(kind.clone());
        self.ids.insert(kind, id);
        id
    }

    /// The kind of a term.
    pub fn kind(&self, t: TermId) -> &TermKind {
        &self.kinds[t as usize]
    }

    /// A count of all terms created.
    pub fn count(&self) -> usize {
        self.kinds.len()
    }

    /// The sort of a term.
    pub fn sort(&self, t: TermId) -> Sort {
        use TermKind::*;
        match self.kind(t) {
            True | False | Eq(_, _) | InRe(_, _) | Contains(_, _) | PrefixOf(_, _)
            | SuffixOf(_, _) | LexLt(_, _) | LexLe(_, _) | IntLe(_, _) | IntLt(_, _)
            | CharIn(_, _) => Sort::Bool,

            Var { sort, .. } => *sort,

            Empty | Unit(_) | Const(_) | Concat(_) | Extract(_, _, _) | At(_, _)
            | Replace(_, _, _) | Itos(_) => Sort::Seq,

            Char(_) | Nth(_, _) => Sort::Elem,

            IntConst(_) | Length(_) | Add(_) | Mul(_, _) | Indexof(_, _, _) | Stoi(_) => Sort::Int,

            ReEmpty | ReEpsilon | ReLiteral(_) | ReRange(_, _) | ReAny | ReUnion(_, _)
            | ReConcat(_, _) | ReInter(_, _) | ReComp(_) | ReStar(_) | RePlus(_) | ReOpt(_) => {
                Sort::Regex
            }

            Ite(_, then, _) => self.sort(*then),

            Skolem(kind, _) => match kind {
                SkolemKind::Tail
                | SkolemKind::Pre
                | SkolemKind::Post
                | SkolemKind::IndexofLeft
                | SkolemKind::IndexofRight
                | SkolemKind::PrefixInv
                | SkolemKind::SuffixInv => Sort::Seq,

                SkolemKind::SeqFirst => Sort::Elem,

                SkolemKind::Digit2Int | SkolemKind::DiseqIndex => Sort::Int,

                SkolemKind::Accept
                | SkolemKind::Step
                | SkolemKind::MaxUnfolding
                | SkolemKind::LengthLimit => Sort::Bool,
            },
        }
    }

    // Constants.

    /// The true constant.
    pub fn tt(&self) -> TermId {
        0
    }

    /// The false constant.
    pub fn ff(&self) -> TermId {
        1
    }

    /// The empty sequence.
    pub fn empty(&self) -> TermId {
        2
    }

    // Variables.

    /// The variable with the given name and sort.
    pub fn var(&mut self, name: &str, sort: Sort) -> TermId {
        let name_id = match self.name_ids.get(name) {
            Some(id) => *id,
            None => {
                let id = self.names.len() as u32;
                self.names.push(Box::from(name));
                self.name_ids.insert(Box::from(name), id);
                id
            }
        };
        self.intern(TermKind::Var { name: name_id, sort })
    }

    /// A variable with a name fresh for the session.
    pub fn fresh_var(&mut self, prefix: &str, sort: Sort) -> TermId {
        let name = format!("{prefix}!{}", self.fresh);
        self.fresh += 1;
        self.var(&name, sort)
    }

    /// The registered name of a variable, if the term is one.
    pub fn var_name(&self, t: TermId) -> Option<&str> {
        match self.kind(t) {
            TermKind::Var { name, .. } => Some(&self.names[*name as usize]),
            _ => None,
        }
    }

    // Sequence builders.

    /// The unit lift of an element term.
    pub fn unit(&mut self, e: TermId) -> TermId {
        self.intern(TermKind::Unit(e))
    }

    /// The word constant over the given elements; `ε` when empty.
    pub fn const_word(&mut self, word: &[char]) -> TermId {
        if word.is_empty() {
            return self.empty();
        }
        self.intern(TermKind::Const(word.into()))
    }

    /// The word constant spelled by a string.
    pub fn const_str(&mut self, word: &str) -> TermId {
        let chars = word.chars().collect::<Vec<_>>();
        self.const_word(&chars)
    }

    /// Concatenation, flattened, with `ε` parts dropped.
    pub fn concat(&mut self, parts: &[TermId]) -> TermId {
        let mut flat = Vec::with_capacity(parts.len());
        for part in parts {
            match self.kind(*part) {
                TermKind::Empty => {}
                TermKind::Concat(inner) => flat.extend_from_slice(inner),
                _ => flat.push(*part),
            }
        }
        match flat.len() {
            0 => self.empty(),
            1 => flat[0],
            _ => self.intern(TermKind::Concat(flat.into())),
        }
    }

    /// `substr(s, i, l)`.
    pub fn extract(&mut self, s: TermId, i: TermId, l: TermId) -> TermId {
        self.intern(TermKind::Extract(s, i, l))
    }

    /// `at(s, i)`.
    pub fn at(&mut self, s: TermId, i: TermId) -> TermId {
        self.intern(TermKind::At(s, i))
    }

    /// `replace(s, t, r)`.
    pub fn replace(&mut self, s: TermId, t: TermId, r: TermId) -> TermId {
        self.intern(TermKind::Replace(s, t, r))
    }

    /// `itos(i)`.
    pub fn itos(&mut self, i: TermId) -> TermId {
        self.intern(TermKind::Itos(i))
    }

    // Element builders.

    /// An element constant.
    pub fn chr(&mut self, c: char) -> TermId {
        self.intern(TermKind::Char(c))
    }

    /// `nth(s, i)`.
    pub fn nth(&mut self, s: TermId, i: TermId) -> TermId {
        self.intern(TermKind::Nth(s, i))
    }

    /// `nth(s, i)` for a concrete position.
    pub fn nth_i(&mut self, s: TermId, i: i64) -> TermId {
        let i = self.int(i);
        self.nth(s, i)
    }

    // Integer builders.

    /// An integer constant.
    pub fn int(&mut self, i: i64) -> TermId {
        self.intern(TermKind::IntConst(i))
    }

    /// `|s|`.
    pub fn length(&mut self, s: TermId) -> TermId {
        self.intern(TermKind::Length(s))
    }

    /// A sum, flattened, with constants folded.
    pub fn add(&mut self, parts: &[TermId]) -> TermId {
        let mut flat = Vec::with_capacity(parts.len());
        let mut constant = 0_i64;
        for part in parts {
            match self.kind(*part) {
                TermKind::IntConst(k) => constant += k,
                TermKind::Add(inner) => {
                    // Inner sums are flat and carry at most one leading constant.
                    for inner_part in inner.iter() {
                        match self.kind(*inner_part) {
                            TermKind::IntConst(k) => constant += k,
                            _ => flat.push(*inner_part),
                        }
                    }
                }
                _ => flat.push(*part),
            }
        }
        if constant != 0 || flat.is_empty() {
            let k = self.int(constant);
            flat.insert(0, k);
        }
        match flat.len() {
            1 => flat[0],
            _ => self.intern(TermKind::Add(flat.into())),
        }
    }

    /// A product.
    pub fn mul(&mut self, a: TermId, b: TermId) -> TermId {
        if let (TermKind::IntConst(x), TermKind::IntConst(y)) = (self.kind(a), self.kind(b)) {
            let k = x * y;
            return self.int(k);
        }
        self.intern(TermKind::Mul(a, b))
    }

    /// `a - b`.
    pub fn minus(&mut self, a: TermId, b: TermId) -> TermId {
        let minus_one = self.int(-1);
        let neg_b = self.mul(minus_one, b);
        self.add(&[a, neg_b])
    }

    /// `indexof(s, t, i)`.
    pub fn indexof(&mut self, s: TermId, t: TermId, i: TermId) -> TermId {
        self.intern(TermKind::Indexof(s, t, i))
    }

    /// `stoi(s)`.
    pub fn stoi(&mut self, s: TermId) -> TermId {
        self.intern(TermKind::Stoi(s))
    }

    // Boolean builders.

    /// Equality, with arguments in id order; `a = a` collapses to the true constant.
    pub fn eq(&mut self, a: TermId, b: TermId) -> TermId {
        if a == b {
            return self.tt();
        }
        let (a, b) = if a < b { (a, b) } else { (b, a) };
        self.intern(TermKind::Eq(a, b))
    }

    /// `s ∈ R`.
    pub fn in_re(&mut self, s: TermId, re: TermId) -> TermId {
        self.intern(TermKind::InRe(s, re))
    }

    /// `contains(hay, needle)`.
    pub fn contains(&mut self, hay: TermId, needle: TermId) -> TermId {
        self.intern(TermKind::Contains(hay, needle))
    }

    /// `prefixof(pre, full)`.
    pub fn prefix_of(&mut self, pre: TermId, full: TermId) -> TermId {
        self.intern(TermKind::PrefixOf(pre, full))
    }

    /// `suffixof(suf, full)`.
    pub fn suffix_of(&mut self, suf: TermId, full: TermId) -> TermId {
        self.intern(TermKind::SuffixOf(suf, full))
    }

    /// Strict lexicographic order.
    pub fn lex_lt(&mut self, a: TermId, b: TermId) -> TermId {
        self.intern(TermKind::LexLt(a, b))
    }

    /// Reflexive lexicographic order.
    pub fn lex_le(&mut self, a: TermId, b: TermId) -> TermId {
        self.intern(TermKind::LexLe(a, b))
    }

    /// Integer `≤`.
    pub fn int_le(&mut self, a: TermId, b: TermId) -> TermId {
        self.intern(TermKind::IntLe(a, b))
    }

    /// Integer `<`.
    pub fn int_lt(&mut self, a: TermId, b: TermId) -> TermId {
        self.intern(TermKind::IntLt(a, b))
    }

    /// The element satisfies the interned character predicate.
    pub fn char_in(&mut self, e: TermId, pred: PredId) -> TermId {
        self.intern(TermKind::CharIn(e, pred))
    }

    /// If-then-else.
    pub fn ite(&mut self, c: TermId, then: TermId, els: TermId) -> TermId {
        if then == els {
            return then;
        }
        self.intern(TermKind::Ite(c, then, els))
    }

    // Regex builders.

    /// The empty language.
    pub fn re_empty(&mut self) -> TermId {
        self.intern(TermKind::ReEmpty)
    }

    /// The language of the empty sequence.
    pub fn re_epsilon(&mut self) -> TermId {
        self.intern(TermKind::ReEpsilon)
    }

    /// The language of exactly one word.
    pub fn re_literal(&mut self, word: &str) -> TermId {
        if word.is_empty() {
            return self.re_epsilon();
        }
        let chars = word.chars().collect::<Vec<_>>();
        self.intern(TermKind::ReLiteral(chars.into()))
    }

    /// A character class by inclusive range.
    pub fn re_range(&mut self, lo: char, hi: char) -> TermId {
        self.intern(TermKind::ReRange(lo, hi))
    }

    /// Any single character.
    pub fn re_any(&mut self) -> TermId {
        self.intern(TermKind::ReAny)
    }

    /// Union of languages.
    pub fn re_union(&mut self, a: TermId, b: TermId) -> TermId {
        self.intern(TermKind::ReUnion(a, b))
    }

    /// Concatenation of languages.
    pub fn re_concat(&mut self, a: TermId, b: TermId) -> TermId {
        self.intern(TermKind::ReConcat(a, b))
    }

    /// Intersection of languages.
    pub fn re_inter(&mut self, a: TermId, b: TermId) -> TermId {
        self.intern(TermKind::ReInter(a, b))
    }

    /// Complement of a language.
    pub fn re_comp(&mut self, a: TermId) -> TermId {
        self.intern(TermKind::ReComp(a))
    }

    /// Kleene star.
    pub fn re_star(&mut self, a: TermId) -> TermId {
        self.intern(TermKind::ReStar(a))
    }

    /// Kleene plus.
    pub fn re_plus(&mut self, a: TermId) -> TermId {
        self.intern(TermKind::RePlus(a))
    }

    /// Zero or one.
    pub fn re_opt(&mut self, a: TermId) -> TermId {
        self.intern(TermKind::ReOpt(a))
    }

    /// A Skolem application.
    pub fn skolem(&mut self, kind: SkolemKind, args: &[TermId]) -> TermId {
        self.intern(TermKind::Skolem(kind, args.into()))
    }

    // Inspection helpers.

    /// The spelled word, if the term is a word constant (including `ε`).
    pub fn as_const(&self, t: TermId) -> Option<&[char]> {
        match self.kind(t) {
            TermKind::Const(w) => Some(w),
            TermKind::Empty => Some(&[]),
            _ => None,
        }
    }

    /// The integer value, if the term is an integer constant.
    pub fn as_int_const(&self, t: TermId) -> Option<i64> {
        match self.kind(t) {
            TermKind::IntConst(k) => Some(*k),
            _ => None,
        }
    }

    /// The element value, if the term is an element constant.
    pub fn as_char(&self, t: TermId) -> Option<char> {
        match self.kind(t) {
            TermKind::Char(c) => Some(*c),
            _ => None,
        }
    }

    /// The parts of a sequence term viewed as a concatenation.
    pub fn seq_parts(&self, t: TermId) -> Vec<TermId> {
        match self.kind(t) {
            TermKind::Concat(parts) => parts.to_vec(),
            TermKind::Empty => Vec::default(),
            _ => vec![t],
        }
    }

    /// True if the term may be solved for: a sequence variable, or one of the
    /// sequence-valued Skolem families (which are fresh by construction).
    pub fn is_solvable_var(&self, t: TermId) -> bool {
        match self.kind(t) {
            TermKind::Var { sort: Sort::Seq, .. } => true,
            TermKind::Skolem(kind, _) => matches!(
                kind,
                SkolemKind::Tail
                    | SkolemKind::Pre
                    | SkolemKind::Post
                    | SkolemKind::IndexofLeft
                    | SkolemKind::IndexofRight
                    | SkolemKind::PrefixInv
                    | SkolemKind::SuffixInv
            ),
            _ => false,
        }
    }

    /// An adapter to display the term.
    pub fn display(&self, t: TermId) -> TermDisplay<'_> {
        TermDisplay { table: self, term: t }
    }

    fn fmt_term(&self, t: TermId, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use TermKind::*;
        match self.kind(t) {
            True => write!(f, "true"),
            False => write!(f, "false"),
            Eq(a, b) => self.fmt_binary(f, "=", *a, *b),
            InRe(s, re) => self.fmt_binary(f, "in", *s, *re),
            Contains(a, b) => self.fmt_app(f, "contains", &[*a, *b]),
            PrefixOf(a, b) => self.fmt_app(f, "prefixof", &[*a, *b]),
            SuffixOf(a, b) => self.fmt_app(f, "suffixof", &[*a, *b]),
            LexLt(a, b) => self.fmt_binary(f, "<", *a, *b),
            LexLe(a, b) => self.fmt_binary(f, "<=", *a, *b),
            IntLe(a, b) => self.fmt_binary(f, "<=", *a, *b),
            IntLt(a, b) => self.fmt_binary(f, "<", *a, *b),
            CharIn(e, p) => {
                write!(f, "(")?;
                self.fmt_term(*e, f)?;
                write!(f, " in p{p})")
            }

            Var { name, .. } => write!(f, "{}", self.names[*name as usize]),
            Empty => write!(f, "\"\""),
            Unit(e) => self.fmt_app(f, "unit", &[*e]),
            Const(w) => {
                write!(f, "\"")?;
                for c in w.iter() {
                    write!(f, "{c}")?;
                }
                write!(f, "\"")
            }
            Concat(parts) => {
                write!(f, "(")?;
                for (ix, part) in parts.iter().enumerate() {
                    if ix > 0 {
                        write!(f, " ++ ")?;
                    }
                    self.fmt_term(*part, f)?;
                }
                write!(f, ")")
            }
            Extract(s, i, l) => self.fmt_app(f, "substr", &[*s, *i, *l]),
            At(s, i) => self.fmt_app(f, "at", &[*s, *i]),
            Replace(s, t2, r) => self.fmt_app(f, "replace", &[*s, *t2, *r]),
            Itos(i) => self.fmt_app(f, "itos", &[*i]),

            Char(c) => write!(f, "'{c}'"),
            Nth(s, i) => self.fmt_app(f, "nth", &[*s, *i]),

            IntConst(k) => write!(f, "{k}"),
            Length(s) => {
                write!(f, "|")?;
                self.fmt_term(*s, f)?;
                write!(f, "|")
            }
            Add(parts) => {
                write!(f, "(")?;
                for (ix, part) in parts.iter().enumerate() {
                    if ix > 0 {
                        write!(f, " + ")?;
                    }
                    self.fmt_term(*part, f)?;
                }
                write!(f, ")")
            }
            Mul(a, b) => self.fmt_binary(f, "*", *a, *b),
            Indexof(s, t2, i) => self.fmt_app(f, "indexof", &[*s, *t2, *i]),
            Stoi(s) => self.fmt_app(f, "stoi", &[*s]),

            ReEmpty => write!(f, "re.none"),
            ReEpsilon => write!(f, "re.eps"),
            ReLiteral(w) => {
                write!(f, "re\"")?;
                for c in w.iter() {
                    write!(f, "{c}")?;
                }
                write!(f, "\"")
            }
            ReRange(lo, hi) => write!(f, "['{lo}'-'{hi}']"),
            ReAny => write!(f, "re.allchar"),
            ReUnion(a, b) => self.fmt_binary(f, "|", *a, *b),
            ReConcat(a, b) => self.fmt_binary(f, "·", *a, *b),
            ReInter(a, b) => self.fmt_binary(f, "&", *a, *b),
            ReComp(a) => self.fmt_app(f, "comp", &[*a]),
            ReStar(a) => {
                self.fmt_term(*a, f)?;
                write!(f, "*")
            }
            RePlus(a) => {
                self.fmt_term(*a, f)?;
                write!(f, "+")
            }
            ReOpt(a) => {
                self.fmt_term(*a, f)?;
                write!(f, "?")
            }

            Ite(c, then, els) => self.fmt_app(f, "ite", &[*c, *then, *els]),

            Skolem(kind, args) => {
                let name = match kind {
                    SkolemKind::Tail => "tail",
                    SkolemKind::Pre => "pre",
                    SkolemKind::Post => "post",
                    SkolemKind::IndexofLeft => "indexof_left",
                    SkolemKind::IndexofRight => "indexof_right",
                    SkolemKind::PrefixInv => "prefix_inv",
                    SkolemKind::SuffixInv => "suffix_inv",
                    SkolemKind::SeqFirst => "seq_first",
                    SkolemKind::Digit2Int => "digit2int",
                    SkolemKind::DiseqIndex => "diseq_idx",
                    SkolemKind::Accept => "accept",
                    SkolemKind::Step => "step",
                    SkolemKind::MaxUnfolding => "max_unfolding",
                    SkolemKind::LengthLimit => "length_limit",
                };
                self.fmt_app(f, name, args)
            }
        }
    }

    fn fmt_app(
        &self,
        f: &mut std::fmt::Formatter<'_>,
        name: &str,
        args: &[TermId],
    ) -> std::fmt::Result {
        write!(f, "{name}(")?;
        for (ix, arg) in args.iter().enumerate() {
            if ix > 0 {
                write!(f, ", ")?;
            }
            self.fmt_term(*arg, f)?;
        }
        write!(f, ")")
    }

    fn fmt_binary(
        &self,
        f: &mut std::fmt::Formatter<'_>,
        op: &str,
        a: TermId,
        b: TermId,
    ) -> std::fmt::Result {
        write!(f, "(")?;
        self.fmt_term(a, f)?;
        write!(f, " {op} ")?;
        self.fmt_term(b, f)?;
        write!(f, ")")
    }
}

/// Displays a term against its table.
pub struct TermDisplay<'t> {
    table: &'t TermTable,
    term: TermId,
}

impl std::fmt::Display for TermDisplay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.table.fmt_term(self.term, f)
    }
}

#[cfg(test)]
mod term_tests {
    use super::*;

    #[test]
    fn consing_is_by_identity() {
        let mut table = TermTable::default();
        let a = table.const_str("ab");
        let b = table.const_str("ab");
        assert_eq!(a, b);

        let x = table.var("x", Sort::Seq);
        let c1 = table.concat(&[x, a]);
        let c2 = table.concat(&[x, b]);
        assert_eq!(c1, c2);
    }

    #[test]
    fn concat_flattens_and_drops_empty() {
        let mut table = TermTable::default();
        let x = table.var("x", Sort::Seq);
        let y = table.var("y", Sort::Seq);
        let e = table.empty();
        let xy = table.concat(&[x, y]);
        let nested = table.concat(&[e, xy, e]);
        assert_eq!(nested, xy);

        let single = table.concat(&[e, x]);
        assert_eq!(single, x);
    }

    #[test]
    fn add_folds_constants() {
        let mut table = TermTable::default();
        let two = table.int(2);
        let three = table.int(3);
        let five = table.add(&[two, three]);
        assert_eq!(table.as_int_const(five), Some(5));

        let n = table.var("n", Sort::Int);
        let sum = table.add(&[n, two, three]);
        let TermKind::Add(parts) = table.kind(sum) else {
            panic!("expected a sum");
        };
        assert_eq!(parts.len(), 2);
    }

    #[test]
    fn eq_orders_and_collapses() {
        let mut table = TermTable::default();
        let x = table.var("x", Sort::Seq);
        let y = table.var("y", Sort::Seq);
        assert_eq!(table.eq(x, y), table.eq(y, x));
        assert_eq!(table.eq(x, x), table.tt());
    }

    #[test]
    fn empty_word_is_epsilon() {
        let mut table = TermTable::default();
        let e = table.const_str("");
        assert_eq!(e, table.empty());
        assert_eq!(table.as_const(e), Some(&[] as &[char]));
    }
}
