/*!
Transitivity closure over the active lexicographic order literals.

For every pair of true `<`/`≤` literals `a ◁ b` and `c ◁ d` with `b` and `c` in one
equivalence class, the transitivity instance `a ◁ d` is emitted, strict when either
premise is strict.

The check runs once per scope — a scoped flag memoizes it — as the instance set only
changes when new order literals or merges arrive, both of which open fresh scopes.
*/

use crate::{
    context::GenericContext,
    structures::term::{TermId, TermKind},
    types::err::ErrorKind,
};

const TAG_LTS: u16 = 50;

impl<R: rand::Rng + std::default::Default> GenericContext<R> {
    /// Instantiates transitivity over the active order literals; once per scope.
    pub fn check_lts(&mut self) -> Result<bool, ErrorKind> {
        if self.lts_checked {
            return Ok(false);
        }
        self.lts_checked = true;

        // Collect the true order literals.
        let trail = self.sat.trail().to_vec();
        let mut orders: Vec<(TermId, TermId, bool, crate::structures::literal::Literal)> =
            Vec::default();
        for lit in trail {
            if !lit.polarity() {
                continue;
            }
            let term = self.sat.term_of(lit.atom());
            match self.terms.kind(term) {
                TermKind::LexLt(a, b) => orders.push((*a, *b, true, lit)),
                TermKind::LexLe(a, b) => orders.push((*a, *b, false, lit)),
                _ => {}
            }
        }

        let mut fired = false;
        for &(a, b, strict1, lit1) in &orders {
            for &(c, d, strict2, lit2) in &orders {
                if lit1 == lit2 {
                    continue;
                }
                if b != c && !self.egraph.are_eq(b, c) {
                    continue;
                }
                // a ◁ a is kept: the rewriter refutes the strict instance, which is
                // exactly the cycle conflict.
                let strict = strict1 || strict2;
                let conclusion = if strict {
                    self.terms.lex_lt(a, d)
                } else {
                    self.terms.lex_le(a, d)
                };
                if !self.mark_emitted((TAG_LTS, conclusion, 0, 0)) {
                    continue;
                }
                let conclusion_lit = self.lit_of(conclusion, true);
                let mut clause = vec![!lit1, !lit2, conclusion_lit];
                if b != c {
                    if let Some(explained) = self.egraph.explain(b, c, &mut self.deps) {
                        clause.extend(self.clause_tail_from_dep(explained));
                    }
                }
                self.add_axiom(clause);
                fired = true;
            }
        }
        Ok(fired)
    }
}
