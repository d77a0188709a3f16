/*!
Witness construction from a satisfiable state.

Values are composed from the equivalence classes, respecting the solution map: a term
is canonized, constants read off directly, concatenations concretized part-wise, and
the leftover element unknowns picked to honor the character predicates asserted on them
and to avoid every element constant their class was separated from.

A sequence unknown with a pinned length concretizes element-wise through `nth`; with no
length information it concretizes to its length lower bound of default elements (`ε`
when unbounded).
*/

use rustc_hash::FxHashSet;

use crate::{
    context::{ContextState, GenericContext},
    misc::log::targets,
    regexes::nfa::CharPred,
    structures::term::{Sort, TermId, TermKind},
};

impl<R: rand::Rng + std::default::Default> GenericContext<R> {
    /// The witness value of a sequence term, valid in a satisfiable state.
    pub fn seq_value(&mut self, t: TermId) -> Option<String> {
        if self.state != ContextState::Satisfiable {
            return None;
        }
        let mut guard = FxHashSet::default();
        let word = self.concretize_seq(t, &mut guard)?;
        Some(word.into_iter().collect())
    }

    /// The witness value of an integer term, valid in a satisfiable state.
    pub fn int_witness(&mut self, t: TermId) -> Option<i64> {
        if self.state != ContextState::Satisfiable {
            return None;
        }
        if let Some((value, _)) = self.int_value(t) {
            return Some(value);
        }
        if let Some((lo, _)) = self.int_lower(t) {
            return Some(lo);
        }
        Some(0)
    }

    fn concretize_seq(
        &mut self,
        t: TermId,
        guard: &mut FxHashSet<TermId>,
    ) -> Option<Vec<char>> {
        let (n, _) = self.canonize(t);
        if !guard.insert(n) {
            // A cycle through unknowns: default to ε.
            return Some(Vec::default());
        }
        let out = match self.terms.kind(n).clone() {
            TermKind::Empty => Some(Vec::default()),
            TermKind::Const(w) => Some(w.to_vec()),
            TermKind::Unit(e) => Some(vec![self.elem_value(e)]),
            TermKind::Concat(parts) => {
                let mut word = Vec::default();
                for part in parts.iter() {
                    word.extend(self.concretize_seq(*part, guard)?);
                }
                Some(word)
            }
            _ => {
                // An unconstrained unknown: concretize to its known length.
                let len = self.terms.length(n);
                let pinned = self
                    .int_value(len)
                    .or_else(|| self.int_lower(len))
                    .map(|(v, _)| v)
                    .unwrap_or(0);
                let mut word = Vec::default();
                for at in 0..pinned.max(0) {
                    let nth = self.terms.nth_i(n, at);
                    word.push(self.elem_value(nth));
                }
                Some(word)
            }
        };
        guard.remove(&n);
        log::trace!(
            target: targets::MODEL,
            "Value of {} has length {}",
            self.terms.display(n),
            out.as_ref().map(|w| w.len()).unwrap_or(0),
        );
        out
    }

    /// The witness value of an element term.
    pub fn elem_value(&mut self, e: TermId) -> char {
        let (n, _) = self.canonize(e);
        if let Some(c) = self.terms.as_char(n) {
            return c;
        }

        // A constant merged into the class decides the value.
        let count = self.terms.count() as TermId;
        for candidate in 0..count {
            if let TermKind::Char(c) = self.terms.kind(candidate) {
                let c = *c;
                if self.egraph.are_eq(n, candidate) {
                    return c;
                }
            }
        }

        // Otherwise honor the asserted character predicates and separations.
        let mut allowed = CharPred::any();
        let mut banned: Vec<char> = Vec::default();
        let trail = self.sat.trail().to_vec();
        for lit in trail {
            let term = self.sat.term_of(lit.atom());
            match self.terms.kind(term).clone() {
                TermKind::CharIn(elem, pred_id) => {
                    let (elem, _) = self.canonize(elem);
                    if elem != n && !self.egraph.are_eq(elem, n) {
                        continue;
                    }
                    let pred = self.regexes.pred(pred_id).clone();
                    let pred = if lit.polarity() { pred } else { pred.complement() };
                    allowed = allowed.inter(&pred);
                }
                TermKind::Eq(a, b) if self.terms.sort(a) == Sort::Elem => {
                    if lit.polarity() {
                        continue;
                    }
                    let (ca, _) = self.canonize(a);
                    let (cb, _) = self.canonize(b);
                    let other = if ca == n || self.egraph.are_eq(ca, n) {
                        cb
                    } else if cb == n || self.egraph.are_eq(cb, n) {
                        ca
                    } else {
                        continue;
                    };
                    if let Some(c) = self.terms.as_char(other) {
                        banned.push(c);
                    } else if self.egraph.root(other) < self.egraph.root(n) {
                        // Separated classes concretize in root order: the later class
                        // avoids the value the earlier one settled on.
                        let c = self.elem_value(other);
                        banned.push(c);
                    }
                }
                _ => {}
            }
        }

        allowed.pick(&banned).unwrap_or('a')
    }
}
