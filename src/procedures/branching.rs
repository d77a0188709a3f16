/*!
Branching rules, in increasing order of generality.

`branch_unit_variable` applies when a variable heads a side equated against a constant
word: the variable must be one of the word's prefixes, a finite disjunction the kernel
splits on (or a direct commitment when the variable's length is already pinned).

`branch_binary_variable` handles `x ++ … = W ++ y ++ …` shapes: `x` is a prefix of the
constant word `W`, or extends it through a fresh variable.

`branch_variable` is the general fallback: a variable heading an unsolved equation is
either empty or decomposes into its first element and tail.
Each variable decomposes at most once per search, and picks up a length budget so the
decomposition chain is bounded; the heuristic choice is the lowest-id equation with an
eligible head.
No branch reintroduces an equation already solved: every emitted disjunct is guarded
by the emission keys, and a solved variable is no longer a branch candidate.
*/

use crate::{
    context::GenericContext,
    misc::log::targets,
    skolem,
    structures::term::{Sort, TermId},
    types::err::ErrorKind,
};

const TAG_BRANCH_UNIT: u16 = 60;
const TAG_BRANCH_BINARY: u16 = 61;
const TAG_BRANCH_VAR: u16 = 62;

impl<R: rand::Rng + std::default::Default> GenericContext<R> {
    /// The canonized residuals of the pending equations — the equations still open
    /// after reduction, so no branch revisits a solved equation.
    fn canonized_equations(&mut self) -> Vec<(Vec<TermId>, Vec<TermId>, crate::db::dependency::DepId)> {
        let equations = self.eqs.equations().to_vec();
        let mut out = Vec::with_capacity(equations.len());
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
            let reduction = crate::rewriter::reduce_eq(&mut self.terms, &lhs, &rhs);
            if reduction.verdict == crate::rewriter::EqVerdict::Open {
                out.push((reduction.lhs, reduction.rhs, dep));
            }
        }
        out
    }

    /// Branches a variable equated (as a head) against a constant word.
    pub fn branch_unit_variable(&mut self) -> Result<bool, ErrorKind> {
        let equations = self.canonized_equations();

        for (lhs, rhs, dep) in equations {
            for (vars, word) in [(&lhs, &rhs), (&rhs, &lhs)] {
                let Some(&x) = vars.first() else { continue };
                if !self.terms.is_solvable_var(x) || !self.solution.is_root(x) {
                    continue;
                }
                // The opposing side must be a single constant word.
                let [w] = word.as_slice() else { continue };
                let Some(word_chars) = self.terms.as_const(*w).map(|w| w.to_vec()) else {
                    continue;
                };

                // A pinned length commits the prefix outright.
                let len_x = self.terms.length(x);
                if let Some((n, len_dep)) = self.int_value(len_x) {
                    if n < 0 || n > word_chars.len() as i64 {
                        let joined = self.deps.join(dep, len_dep);
                        self.set_conflict(joined);
                        return Ok(true);
                    }
                    let prefix = self.terms.const_word(&word_chars[..n as usize]);
                    let joined = self.deps.join(dep, len_dep);
                    if self.propagate_eq_fired(x, prefix, joined) {
                        self.counters.num_splits += 1;
                        return Ok(true);
                    }
                    continue;
                }

                // Otherwise x is one of the word's prefixes.
                if !self.mark_emitted((TAG_BRANCH_UNIT, x, *w, 0)) {
                    continue;
                }
                log::debug!(
                    target: targets::CASCADE,
                    "Branching {} over prefixes of {}",
                    self.terms.display(x),
                    self.terms.display(*w),
                );
                let mut clause = self.clause_tail_from_dep(dep);
                for end in 0..=word_chars.len() {
                    let prefix = self.terms.const_word(&word_chars[..end]);
                    let eq = self.terms.eq(x, prefix);
                    let eq_lit = self.lit_of(eq, true);
                    clause.push(eq_lit);
                }
                self.add_axiom(clause);
                self.counters.num_splits += 1;
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Branches `x ++ … = W ++ rest` where `W` is a constant word and `rest` is
    /// non-empty: `x` is a prefix of `W` or extends it.
    pub fn branch_binary_variable(&mut self) -> Result<bool, ErrorKind> {
        let equations = self.canonized_equations();

        for (lhs, rhs, dep) in equations {
            for (vars, other) in [(&lhs, &rhs), (&rhs, &lhs)] {
                let Some(&x) = vars.first() else { continue };
                if !self.terms.is_solvable_var(x) || !self.solution.is_root(x) {
                    continue;
                }
                if other.len() < 2 {
                    continue;
                }
                let w = other[0];
                let Some(word_chars) = self.terms.as_const(w).map(|w| w.to_vec()) else {
                    continue;
                };
                if !self.mark_emitted((TAG_BRANCH_BINARY, x, w, other.len() as i64)) {
                    continue;
                }

                let mut clause = self.clause_tail_from_dep(dep);
                for end in 0..=word_chars.len() {
                    let prefix = self.terms.const_word(&word_chars[..end]);
                    let eq = self.terms.eq(x, prefix);
                    let eq_lit = self.lit_of(eq, true);
                    clause.push(eq_lit);
                }
                // Or x runs past W into a fresh continuation.
                let continuation = self.terms.fresh_var("seq", Sort::Seq);
                let extended = self.terms.concat(&[w, continuation]);
                let eq = self.terms.eq(x, extended);
                let eq_lit = self.lit_of(eq, true);
                clause.push(eq_lit);
                self.add_axiom(clause);
                self.register_term(continuation);
                // The extension branch can chain; budget the variable so it cannot
                // chain unboundedly.
                self.ensure_length_limit(x);
                self.counters.num_splits += 1;
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// The general fallback: decompose a variable heading an unsolved equation into
    /// empty or first-plus-tail.
    pub fn branch_variable(&mut self) -> Result<bool, ErrorKind> {
        let equations = self.canonized_equations();

        for (lhs, rhs, _) in equations {
            if lhs.is_empty() && rhs.is_empty() {
                continue;
            }
            for side in [&lhs, &rhs] {
                let Some(&x) = side.first() else { continue };
                if !self.terms.is_solvable_var(x) || !self.solution.is_root(x) {
                    continue;
                }
                if !self.mark_emitted((TAG_BRANCH_VAR, x, 0, 0)) {
                    continue;
                }
                log::debug!(
                    target: targets::CASCADE,
                    "Decomposing {}",
                    self.terms.display(x),
                );

                // x = ε ∨ x = unit(seq_first(x)) ++ tail(x, 0), unconditionally.
                let e = self.terms.empty();
                let empty_eq = self.terms.eq(x, e);
                let empty_lit = self.lit_of(empty_eq, true);

                let first = skolem::seq_first(&mut self.terms, x);
                let unit = self.terms.unit(first);
                let tail = skolem::tail(&mut self.terms, x, 0);
                let shaped = self.terms.concat(&[unit, tail]);
                let shaped_eq = self.terms.eq(x, shaped);
                let shaped_lit = self.lit_of(shaped_eq, true);
                self.add_axiom(vec![empty_lit, shaped_lit]);

                // x ≠ ε → |tail| = |x| - 1, grounding the decomposition.
                let len_tail = self.terms.length(tail);
                let len_x = self.terms.length(x);
                let minus_one = self.terms.int(-1);
                let shorter = self.terms.add(&[len_x, minus_one]);
                let len_eq = self.terms.eq(len_tail, shorter);
                let len_lit = self.lit_of(len_eq, true);
                self.add_axiom(vec![empty_lit, len_lit]);

                self.register_term(tail);
                self.ensure_length_limit(x);
                self.counters.branch_variable += 1;
                self.counters.num_splits += 1;
                return Ok(true);
            }
        }
        Ok(false)
    }
}
