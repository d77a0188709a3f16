/*!
Compilation of regex terms to nondeterministic finite automata.

Construction is Thompson-style over a scratch graph with ε-transitions, followed by
ε-elimination, pruning to the states reachable from the start, and merging of parallel
edges.
Intersection is a product construction, and complement determinizes through subset
construction with predicate mintermization — both bounded, failing with
[RegexError::Unsupported] past the caps rather than diverging.

Transition labels are [character predicates](CharPred): unions of inclusive scalar
ranges, closed under union, intersection, and complement.

The compiled automaton is ε-free with a single start state; states from which no final
state is reachable are marked dead ("sink" states), which the membership engine turns
into immediate conflicts.
*/

use petgraph::{
    graph::{DiGraph, NodeIndex},
    visit::EdgeRef,
};
use rustc_hash::FxHashMap;

use crate::{
    structures::term::{TermId, TermKind, TermTable},
    types::err::RegexError,
};

/// The greatest scalar value of the alphabet.
const MAX_SCALAR: u32 = 0x10FFFF;

/// The cap on distinct predicates leaving one subset state during determinization.
const MAX_MINTERM_PREDS: usize = 8;

/// The cap on subset states during determinization.
const MAX_DFA_STATES: usize = 256;

/// A boolean combination over the alphabet, normalized to a union of disjoint,
/// non-adjacent, inclusive scalar ranges.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CharPred {
    ranges: Vec<(u32, u32)>,
}

impl CharPred {
    /// The empty predicate.
    pub fn none() -> Self {
        CharPred { ranges: Vec::default() }
    }

    /// The predicate holding of every element.
    pub fn any() -> Self {
        CharPred { ranges: vec![(0, MAX_SCALAR)] }
    }

    /// The predicate holding of exactly one element.
    pub fn single(c: char) -> Self {
        CharPred { ranges: vec![(c as u32, c as u32)] }
    }

    /// The predicate of an inclusive range; empty when the bounds cross.
    pub fn range(lo: char, hi: char) -> Self {
        if lo > hi {
            Self::none()
        } else {
            CharPred { ranges: vec![(lo as u32, hi as u32)] }
        }
    }

    fn normalize(mut ranges: Vec<(u32, u32)>) -> Self {
        ranges.retain(|(lo, hi)| lo <= hi);
        ranges.sort_unstable();
        let mut merged: Vec<(u32, u32)> = Vec::with_capacity(ranges.len());
        for (lo, hi) in ranges {
            match merged.last_mut() {
                Some((_, last_hi)) if lo <= last_hi.saturating_add(1) => {
                    *last_hi = (*last_hi).max(hi);
                }
                _ => merged.push((lo, hi)),
            }
        }
        CharPred { ranges: merged }
    }

    /// The union of two predicates.
    pub fn union(&self, other: &Self) -> Self {
        let mut ranges = self.ranges.clone();
        ranges.extend_from_slice(&other.ranges);
        Self::normalize(ranges)
    }

    /// The intersection of two predicates.
    pub fn inter(&self, other: &Self) -> Self {
        let mut out = Vec::default();
        for &(alo, ahi) in &self.ranges {
            for &(blo, bhi) in &other.ranges {
                let lo = alo.max(blo);
                let hi = ahi.min(bhi);
                if lo <= hi {
                    out.push((lo, hi));
                }
            }
        }
        Self::normalize(out)
    }

    /// The complement of the predicate.
    pub fn complement(&self) -> Self {
        let mut out = Vec::default();
        let mut next = 0_u32;
        for &(lo, hi) in &self.ranges {
            if lo > next {
                out.push((next, lo - 1));
            }
            next = hi.saturating_add(1);
        }
        if next <= MAX_SCALAR {
            out.push((next, MAX_SCALAR));
        }
        Self::normalize(out)
    }

    /// True if the predicate holds of the element.
    pub fn contains(&self, c: char) -> bool {
        let v = c as u32;
        self.ranges.iter().any(|&(lo, hi)| lo <= v && v <= hi)
    }

    /// True if the predicate holds of nothing.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// The least element satisfying the predicate, if any.
    pub fn example(&self) -> Option<char> {
        for &(lo, hi) in &self.ranges {
            for v in lo..=hi {
                if let Some(c) = char::from_u32(v) {
                    return Some(c);
                }
            }
        }
        None
    }

    /// An element satisfying the predicate and avoiding the banned set, preferring
    /// the ASCII letters.
    pub fn pick(&self, banned: &[char]) -> Option<char> {
        for c in 'a'..='z' {
            if self.contains(c) && !banned.contains(&c) {
                return Some(c);
            }
        }
        for &(lo, hi) in &self.ranges {
            for v in lo..=hi {
                if let Some(c) = char::from_u32(v) {
                    if !banned.contains(&c) {
                        return Some(c);
                    }
                }
            }
        }
        None
    }
}

/// A compiled, ε-free automaton.
///
/// Node weights record finality; edge weights are character predicates, merged so that
/// each ordered state pair carries at most one edge.
pub struct Nfa {
    graph: DiGraph<bool, CharPred>,
    start: NodeIndex,
    live: Vec<bool>,
}

impl Nfa {
    /// The start state.
    pub fn start(&self) -> u32 {
        self.start.index() as u32
    }

    /// A count of states.
    pub fn state_count(&self) -> usize {
        self.graph.node_count()
    }

    /// True if the state is accepting.
    pub fn is_final(&self, q: u32) -> bool {
        *self
            .graph
            .node_weight(NodeIndex::new(q as usize))
            .unwrap_or(&false)
    }

    /// True if some accepting run leaves the state; false marks a sink.
    pub fn is_live(&self, q: u32) -> bool {
        self.live.get(q as usize).copied().unwrap_or(false)
    }

    /// The outgoing transitions of the state.
    pub fn transitions(&self, q: u32) -> Vec<(u32, CharPred)> {
        self.graph
            .edges(NodeIndex::new(q as usize))
            .map(|e| (e.target().index() as u32, e.weight().clone()))
            .collect()
    }

    /// True if the automaton accepts no word at all.
    pub fn is_empty_language(&self) -> bool {
        !self.is_live(self.start())
    }

    /// Simulates the automaton on a word.
    pub fn accepts(&self, word: &[char]) -> bool {
        let mut states = vec![self.start()];
        for &c in word {
            let mut next: Vec<u32> = Vec::default();
            for &q in &states {
                for (target, pred) in self.transitions(q) {
                    if pred.contains(c) && !next.contains(&target) {
                        next.push(target);
                    }
                }
            }
            if next.is_empty() {
                return false;
            }
            states = next;
        }
        states.iter().any(|&q| self.is_final(q))
    }

    /// Builds the automaton from a graph, computing liveness by reverse reachability
    /// from the final states.
    fn from_graph(graph: DiGraph<bool, CharPred>, start: NodeIndex) -> Self {
        let n = graph.node_count();
        let mut live = vec![false; n];
        let mut queue: Vec<usize> = Vec::default();
        for ix in graph.node_indices() {
            if graph[ix] {
                live[ix.index()] = true;
                queue.push(ix.index());
            }
        }
        // Reverse adjacency over the edge list.
        let mut incoming: Vec<Vec<usize>> = vec![Vec::default(); n];
        for e in graph.edge_references() {
            incoming[e.target().index()].push(e.source().index());
        }
        while let Some(ix) = queue.pop() {
            for &from in &incoming[ix] {
                if !live[from] {
                    live[from] = true;
                    queue.push(from);
                }
            }
        }
        Nfa { graph, start, live }
    }
}

/// Compiles a regex term to an automaton.
pub fn compile(table: &TermTable, re: TermId) -> Result<Nfa, RegexError> {
    match table.kind(re) {
        TermKind::ReInter(a, b) => {
            let (a, b) = (*a, *b);
            let left = compile(table, a)?;
            let right = compile(table, b)?;
            Ok(product(&left, &right))
        }
        TermKind::ReComp(a) => {
            let inner = compile(table, *a)?;
            let dfa = determinize(&inner, re)?;
            Ok(complement(dfa))
        }
        _ => {
            let mut builder = Builder::default();
            let (start, end) = builder.fragment(table, re)?;
            builder.graph[end] = true;
            Ok(eliminate_epsilon(&builder.graph, start))
        }
    }
}

/// The scratch ε-NFA during Thompson construction: `None` edges are ε.
#[derive(Default)]
struct Builder {
    graph: DiGraph<bool, Option<CharPred>>,
}

impl Builder {
    fn state(&mut self) -> NodeIndex {
        self.graph.add_node(false)
    }

    fn eps(&mut self, a: NodeIndex, b: NodeIndex) {
        self.graph.add_edge(a, b, None);
    }

    fn pred(&mut self, a: NodeIndex, b: NodeIndex, p: CharPred) {
        if !p.is_empty() {
            self.graph.add_edge(a, b, Some(p));
        }
    }

    /// A fragment for the regex: a start and an end state, the end not yet final.
    fn fragment(&mut self, table: &TermTable, re: TermId) -> Result<(NodeIndex, NodeIndex), RegexError> {
        let kind = table.kind(re).clone();
        let start = self.state();
        let end = self.state();
        match kind {
            TermKind::ReEmpty => {}

            TermKind::ReEpsilon => self.eps(start, end),

            TermKind::ReLiteral(w) => {
                let mut at = start;
                for c in w.iter() {
                    let next = self.state();
                    self.pred(at, next, CharPred::single(*c));
                    at = next;
                }
                self.eps(at, end);
            }

            TermKind::ReRange(lo, hi) => self.pred(start, end, CharPred::range(lo, hi)),

            TermKind::ReAny => self.pred(start, end, CharPred::any()),

            TermKind::ReUnion(a, b) => {
                let (sa, ea) = self.fragment(table, a)?;
                let (sb, eb) = self.fragment(table, b)?;
                self.eps(start, sa);
                self.eps(start, sb);
                self.eps(ea, end);
                self.eps(eb, end);
            }

            TermKind::ReConcat(a, b) => {
                let (sa, ea) = self.fragment(table, a)?;
                let (sb, eb) = self.fragment(table, b)?;
                self.eps(start, sa);
                self.eps(ea, sb);
                self.eps(eb, end);
            }

            TermKind::ReStar(a) => {
                let (sa, ea) = self.fragment(table, a)?;
                self.eps(start, sa);
                self.eps(ea, sa);
                self.eps(ea, end);
                self.eps(start, end);
            }

            TermKind::RePlus(a) => {
                let (sa, ea) = self.fragment(table, a)?;
                self.eps(start, sa);
                self.eps(ea, sa);
                self.eps(ea, end);
            }

            TermKind::ReOpt(a) => {
                let (sa, ea) = self.fragment(table, a)?;
                self.eps(start, sa);
                self.eps(ea, end);
                self.eps(start, end);
            }

            TermKind::ReInter(_, _) | TermKind::ReComp(_) => {
                // Compile the sub-language in full and embed it.
                let sub = compile(table, re)?;
                let offset = self.graph.node_count();
                for q in 0..sub.state_count() {
                    let node = self.state();
                    debug_assert_eq!(node.index(), offset + q);
                }
                for q in 0..sub.state_count() as u32 {
                    let from = NodeIndex::new(offset + q as usize);
                    for (target, p) in sub.transitions(q) {
                        let to = NodeIndex::new(offset + target as usize);
                        self.pred(from, to, p);
                    }
                    if sub.is_final(q) {
                        self.eps(NodeIndex::new(offset + q as usize), end);
                    }
                }
                self.eps(start, NodeIndex::new(offset + sub.start() as usize));
            }

            _ => return Err(RegexError::Unsupported(re)),
        }
        Ok((start, end))
    }
}

/// Eliminates ε-transitions, prunes to the states reachable from the start, and merges
/// parallel edges.
fn eliminate_epsilon(graph: &DiGraph<bool, Option<CharPred>>, start: NodeIndex) -> Nfa {
    let n = graph.node_count();

    // ε-closures.
    let mut closure: Vec<Vec<usize>> = Vec::with_capacity(n);
    for ix in 0..n {
        let mut seen = vec![false; n];
        let mut stack = vec![ix];
        seen[ix] = true;
        while let Some(at) = stack.pop() {
            for e in graph.edges(NodeIndex::new(at)) {
                if e.weight().is_none() && !seen[e.target().index()] {
                    seen[e.target().index()] = true;
                    stack.push(e.target().index());
                }
            }
        }
        closure.push((0..n).filter(|&q| seen[q]).collect());
    }

    // Reachability from the start over closure-expanded edges.
    let mut reachable = vec![false; n];
    let mut stack = vec![start.index()];
    reachable[start.index()] = true;
    while let Some(at) = stack.pop() {
        for &p in &closure[at] {
            for e in graph.edges(NodeIndex::new(p)) {
                if e.weight().is_some() && !reachable[e.target().index()] {
                    reachable[e.target().index()] = true;
                    stack.push(e.target().index());
                }
            }
        }
    }

    // Renumber the reachable states.
    let mut rename: Vec<Option<NodeIndex>> = vec![None; n];
    let mut out: DiGraph<bool, CharPred> = DiGraph::default();
    for ix in 0..n {
        if reachable[ix] {
            let is_final = closure[ix].iter().any(|&q| graph[NodeIndex::new(q)]);
            rename[ix] = Some(out.add_node(is_final));
        }
    }

    for ix in 0..n {
        let Some(from) = rename[ix] else { continue };
        let mut merged: FxHashMap<NodeIndex, CharPred> = FxHashMap::default();
        for &p in &closure[ix] {
            for e in graph.edges(NodeIndex::new(p)) {
                if let Some(pred) = e.weight() {
                    let Some(to) = rename[e.target().index()] else {
                        continue;
                    };
                    let entry = merged.entry(to).or_insert_with(CharPred::none);
                    *entry = entry.union(pred);
                }
            }
        }
        let mut targets = merged.into_iter().collect::<Vec<_>>();
        targets.sort_unstable_by_key(|(to, _)| to.index());
        for (to, pred) in targets {
            out.add_edge(from, to, pred);
        }
    }

    let start = rename[start.index()].expect("the start is reachable");
    Nfa::from_graph(out, start)
}

/// The product automaton, accepting the intersection of the languages.
fn product(a: &Nfa, b: &Nfa) -> Nfa {
    let mut out: DiGraph<bool, CharPred> = DiGraph::default();
    let mut index: FxHashMap<(u32, u32), NodeIndex> = FxHashMap::default();
    let mut queue: Vec<(u32, u32)> = Vec::default();

    let start_pair = (a.start(), b.start());
    let start = out.add_node(a.is_final(start_pair.0) && b.is_final(start_pair.1));
    index.insert(start_pair, start);
    queue.push(start_pair);

    while let Some((qa, qb)) = queue.pop() {
        let from = index[&(qa, qb)];
        for (ta, pa) in a.transitions(qa) {
            for (tb, pb) in b.transitions(qb) {
                let pred = pa.inter(&pb);
                if pred.is_empty() {
                    continue;
                }
                let to_pair = (ta, tb);
                let to = match index.get(&to_pair) {
                    Some(ix) => *ix,
                    None => {
                        let ix = out.add_node(a.is_final(ta) && b.is_final(tb));
                        index.insert(to_pair, ix);
                        queue.push(to_pair);
                        ix
                    }
                };
                // Merge parallel edges.
                match out.find_edge(from, to) {
                    Some(e) => {
                        let existing = out[e].clone();
                        out[e] = existing.union(&pred);
                    }
                    None => {
                        out.add_edge(from, to, pred);
                    }
                }
            }
        }
    }

    Nfa::from_graph(out, start)
}

/// Subset construction with predicate mintermization; the result is deterministic and
/// complete.
fn determinize(nfa: &Nfa, re: TermId) -> Result<Nfa, RegexError> {
    let mut out: DiGraph<bool, CharPred> = DiGraph::default();
    let mut index: FxHashMap<Vec<u32>, NodeIndex> = FxHashMap::default();
    let mut queue: Vec<Vec<u32>> = Vec::default();

    let start_set = vec![nfa.start()];
    let start = out.add_node(nfa.is_final(nfa.start()));
    index.insert(start_set.clone(), start);
    queue.push(start_set);

    while let Some(set) = queue.pop() {
        let from = index[&set];

        // Collect the outgoing predicates of the subset.
        let mut arrows: Vec<(u32, CharPred)> = Vec::default();
        for &q in &set {
            arrows.extend(nfa.transitions(q));
        }
        let mut preds: Vec<CharPred> = Vec::default();
        for (_, p) in &arrows {
            if !preds.contains(p) {
                preds.push(p.clone());
            }
        }
        if preds.len() > MAX_MINTERM_PREDS {
            return Err(RegexError::Unsupported(re));
        }

        // Each boolean combination of the predicates is an atomic label.
        for mask in 0..(1_u32 << preds.len()) {
            let mut minterm = CharPred::any();
            for (ix, p) in preds.iter().enumerate() {
                let part = if mask & (1 << ix) != 0 {
                    p.clone()
                } else {
                    p.complement()
                };
                minterm = minterm.inter(&part);
                if minterm.is_empty() {
                    break;
                }
            }
            if minterm.is_empty() {
                continue;
            }

            let mut target: Vec<u32> = Vec::default();
            for (to, p) in &arrows {
                if !p.inter(&minterm).is_empty() && !target.contains(to) {
                    target.push(*to);
                }
            }
            target.sort_unstable();

            let to = match index.get(&target) {
                Some(ix) => *ix,
                None => {
                    if index.len() >= MAX_DFA_STATES {
                        return Err(RegexError::Unsupported(re));
                    }
                    let is_final = target.iter().any(|&q| nfa.is_final(q));
                    let ix = out.add_node(is_final);
                    index.insert(target.clone(), ix);
                    queue.push(target.clone());
                    ix
                }
            };
            match out.find_edge(from, to) {
                Some(e) => {
                    let existing = out[e].clone();
                    out[e] = existing.union(&minterm);
                }
                None => {
                    out.add_edge(from, to, minterm);
                }
            }
        }
    }

    Ok(Nfa::from_graph(out, start))
}

/// Flips the finality of every state of a complete, deterministic automaton.
fn complement(mut dfa: Nfa) -> Nfa {
    for ix in dfa.graph.node_indices() {
        let flipped = !dfa.graph[ix];
        dfa.graph[ix] = flipped;
    }
    Nfa::from_graph(dfa.graph, dfa.start)
}

#[cfg(test)]
mod nfa_tests {
    use super::*;
    use crate::structures::term::TermTable;

    fn word(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn pred_algebra() {
        let ab = CharPred::range('a', 'b');
        let bc = CharPred::range('b', 'c');

        let union = ab.union(&bc);
        assert!(union.contains('a') && union.contains('c'));

        let inter = ab.inter(&bc);
        assert!(inter.contains('b'));
        assert!(!inter.contains('a'));

        let comp = ab.complement();
        assert!(!comp.contains('a'));
        assert!(comp.contains('z'));
        assert!(comp.inter(&ab).is_empty());

        assert_eq!(CharPred::range('b', 'a').example(), None);
        assert_eq!(CharPred::single('q').example(), Some('q'));
    }

    #[test]
    fn star_concat_literal() {
        // (ab)*c
        let mut t = TermTable::default();
        let ab = t.re_literal("ab");
        let star = t.re_star(ab);
        let c = t.re_literal("c");
        let re = t.re_concat(star, c);

        let nfa = compile(&t, re).expect("compiles");
        assert!(nfa.accepts(&word("c")));
        assert!(nfa.accepts(&word("abc")));
        assert!(nfa.accepts(&word("ababc")));
        assert!(!nfa.accepts(&word("ac")));
        assert!(!nfa.accepts(&word("ab")));
        assert!(!nfa.accepts(&word("")));
    }

    #[test]
    fn union_and_ranges() {
        // (a|b)*c
        let mut t = TermTable::default();
        let a = t.re_literal("a");
        let b = t.re_literal("b");
        let u = t.re_union(a, b);
        let star = t.re_star(u);
        let c = t.re_literal("c");
        let re = t.re_concat(star, c);

        let nfa = compile(&t, re).expect("compiles");
        assert!(nfa.accepts(&word("ac")));
        assert!(nfa.accepts(&word("babc")));
        assert!(!nfa.accepts(&word("cc")));
    }

    #[test]
    fn intersection_by_product() {
        // a* ∩ (aa)* — words of a's of even length.
        let mut t = TermTable::default();
        let a = t.re_literal("a");
        let astar = t.re_star(a);
        let aa = t.re_literal("aa");
        let aastar = t.re_star(aa);
        let re = t.re_inter(astar, aastar);

        let nfa = compile(&t, re).expect("compiles");
        assert!(nfa.accepts(&word("")));
        assert!(!nfa.accepts(&word("a")));
        assert!(nfa.accepts(&word("aa")));
        assert!(!nfa.accepts(&word("aaa")));
        assert!(nfa.accepts(&word("aaaa")));
    }

    #[test]
    fn complement_by_determinization() {
        // comp(a*) — anything containing a non-a, i.e. not all a's.
        let mut t = TermTable::default();
        let a = t.re_literal("a");
        let astar = t.re_star(a);
        let re = t.re_comp(astar);

        let nfa = compile(&t, re).expect("compiles");
        assert!(!nfa.accepts(&word("")));
        assert!(!nfa.accepts(&word("aaa")));
        assert!(nfa.accepts(&word("ab")));
        assert!(nfa.accepts(&word("b")));
    }

    #[test]
    fn empty_language_detection() {
        // a & b is empty.
        let mut t = TermTable::default();
        let a = t.re_literal("a");
        let b = t.re_literal("b");
        let re = t.re_inter(a, b);
        let nfa = compile(&t, re).expect("compiles");
        assert!(nfa.is_empty_language());
    }

    #[test]
    fn sink_states_are_dead() {
        let mut t = TermTable::default();
        let ab = t.re_literal("ab");
        let nfa = compile(&t, ab).expect("compiles");
        assert!(!nfa.is_empty_language());
        // Every live automaton has a start that can reach a final.
        assert!(nfa.is_live(nfa.start()));
    }

    #[test]
    fn unsupported_kind() {
        let mut t = TermTable::default();
        let x = t.var("x", crate::structures::term::Sort::Seq);
        assert!(matches!(
            compile(&t, x),
            Err(RegexError::Unsupported(_))
        ));
    }
}
