/*!
Equation simplification and solving — step one of the cascade, iterated to quiescence.

Each round canonizes every pending equation, reduces it through the rewriter, and
dispatches the results:

- **lift_ite** happens inside canonization: a singleton if-then-else with a decided
  condition is replaced by the selected branch.
- **simplify_eq** is the rewriter's [reduce_eq](crate::rewriter::reduce_eq): shared
  prefixes and suffixes cancel, units peel against constants, and contradictions
  surface as conflict clauses.
- **solve_unit_eq** commits `x ↦ t` for a bare variable not occurring in `t`.
- **solve_binary_eq** derives the element equality of `x ++ unit(a) = unit(b) ++ x`.
- **solve_nth_eq** recognizes an element-wise expansion of `x` equated with `x`'s
  class and commits it once the length is pinned.
- **solve_itos** evaluates `itos(i)` against a digit word, binding `i` to the base-10
  evaluation of the digits (leading zeros deliberately admitted).

The same pass evaluates every assigned theory literal against its canonical form,
intersects the character predicates asserted on each element, and checks constants that
have been merged into one equivalence class.
*/

use rustc_hash::FxHashMap;

use crate::{
    context::GenericContext,
    db::{
        dependency::{DepForest, DepId},
        eqs::Equation,
    },
    misc::log::targets,
    rewriter::{self, BoolReduction, EqVerdict, NeReduction},
    structures::term::{Sort, TermId, TermKind},
    types::err::ErrorKind,
};

const TAG_EQ_CONFLICT: u16 = 30;
const TAG_LIT_EVAL: u16 = 31;
const TAG_CONJ_POS: u16 = 32;
const TAG_CONJ_NEG: u16 = 33;
const TAG_ITOS_DIGITS: u16 = 34;
const TAG_CHAR_SET: u16 = 35;
const TAG_CLASH: u16 = 36;

impl<R: rand::Rng + std::default::Default> GenericContext<R> {
    /// Iterates simplification and solving until quiescent; true if anything fired.
    pub fn simplify_and_solve_eqs(&mut self) -> Result<bool, ErrorKind> {
        let mut fired = false;
        loop {
            let mut round = false;
            round |= self.check_const_clashes();
            round |= self.check_assigned_literals();
            round |= self.check_char_sets();
            round |= self.check_memberships();
            round |= self.check_int_atoms();
            round |= self.process_equations()?;
            if !round {
                break;
            }
            fired = true;
        }
        if fired {
            self.counters.solve_eqs += 1;
        }
        Ok(fired)
    }

    /// Processes every pending equation once.
    fn process_equations(&mut self) -> Result<bool, ErrorKind> {
        let equations = self.eqs.equations().to_vec();
        let mut fired = false;
        for eq in equations {
            fired |= self.process_equation(&eq)?;
        }
        Ok(fired)
    }

    fn process_equation(&mut self, eq: &Equation) -> Result<bool, ErrorKind> {
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
        self.handle_eq_parts(lhs, rhs, dep)
    }

    /// Reduces an equation between canonized part-lists and dispatches the pieces.
    pub(crate) fn handle_eq_parts(
        &mut self,
        lhs: Vec<TermId>,
        rhs: Vec<TermId>,
        dep: DepId,
    ) -> Result<bool, ErrorKind> {
        let reduction = rewriter::reduce_eq(&mut self.terms, &lhs, &rhs);
        self.counters.num_reductions += 1;
        let mut fired = false;

        match reduction.verdict {
            EqVerdict::Contradiction => {
                let cl = self.terms.concat(&lhs);
                let cr = self.terms.concat(&rhs);
                if self.mark_emitted((TAG_EQ_CONFLICT, cl, cr, 0)) {
                    log::debug!(
                        target: targets::CASCADE,
                        "Equation contradiction: {} = {}",
                        self.terms.display(cl),
                        self.terms.display(cr),
                    );
                    self.set_conflict(dep);
                    fired = true;
                }
            }

            EqVerdict::Solved => {
                for (a, b) in reduction.subeqs {
                    fired |= self.solve_pair(a, b, dep)?;
                }
            }

            EqVerdict::Open => {
                for (a, b) in reduction.subeqs {
                    fired |= self.solve_pair(a, b, dep)?;
                }
                let lhs = reduction.lhs;
                let rhs = reduction.rhs;
                if self.solve_unit_eq(&lhs, &rhs, dep)
                    || self.solve_unit_eq(&rhs, &lhs, dep)
                    || self.solve_binary_eq(&lhs, &rhs, dep)
                    || self.solve_nth_eq(&lhs, &rhs, dep)
                    || self.solve_nth_eq(&rhs, &lhs, dep)
                    || self.solve_itos(&lhs, &rhs, dep)?
                    || self.solve_itos(&rhs, &lhs, dep)?
                {
                    fired = true;
                }
            }
        }
        Ok(fired)
    }

    /// Dispatches a peeled pair by sort.
    fn solve_pair(&mut self, a: TermId, b: TermId, dep: DepId) -> Result<bool, ErrorKind> {
        if a == b {
            return Ok(false);
        }
        match self.terms.sort(a) {
            Sort::Seq => {
                // Pairs from reduction are a part against ε or small residues.
                if self.terms.is_solvable_var(a) && self.solution.is_root(a) {
                    if !rewriter::occurs_in(&self.terms, a, b) {
                        self.solution.update(a, b, dep);
                        return Ok(true);
                    }
                }
                if self.terms.is_solvable_var(b) && self.solution.is_root(b) {
                    if !rewriter::occurs_in(&self.terms, b, a) {
                        self.solution.update(b, a, dep);
                        return Ok(true);
                    }
                }
                let lp = self.terms.seq_parts(a);
                let rp = self.terms.seq_parts(b);
                if lp.len() <= 1 && rp.len() <= 1 {
                    // An atomic pair: reduction would only hand the pair back, so go
                    // straight to the solvers.
                    return Ok(self.solve_itos(&lp, &rp, dep)?
                        || self.solve_itos(&rp, &lp, dep)?);
                }
                self.handle_eq_parts(lp, rp, dep)
            }
            _ => {
                if self.egraph.are_eq(a, b) {
                    return Ok(false);
                }
                let eq = self.terms.eq(a, b);
                let eq = rewriter::rewrite(&mut self.terms, eq);
                match self.terms.kind(eq) {
                    TermKind::True => Ok(false),
                    TermKind::False => {
                        let cl = a.min(b);
                        let cr = a.max(b);
                        if self.mark_emitted((TAG_EQ_CONFLICT, cl, cr, 1)) {
                            self.set_conflict(dep);
                            Ok(true)
                        } else {
                            Ok(false)
                        }
                    }
                    _ => Ok(self.propagate_eq_fired(a, b, dep)),
                }
            }
        }
    }

    /// Propagates an equality, reporting whether the supporting clause is new.
    pub(crate) fn propagate_eq_fired(&mut self, a: TermId, b: TermId, dep: DepId) -> bool {
        let eq = self.terms.eq(a, b);
        if eq == self.terms.tt() {
            return false;
        }
        let key = (crate::axioms::TAG_PROPAGATION, eq, 0, 0);
        if !self.mark_emitted(key) {
            return false;
        }
        let lit = self.lit_of(eq, true);
        self.propagate_lit(lit, dep);
        true
    }

    /// `x = t` for a bare solvable variable not occurring in `t`.
    fn solve_unit_eq(&mut self, lhs: &[TermId], rhs: &[TermId], dep: DepId) -> bool {
        let [v] = lhs else {
            return false;
        };
        let v = *v;
        if !self.terms.is_solvable_var(v) || !self.solution.is_root(v) {
            return false;
        }
        if rhs.iter().any(|t| rewriter::occurs_in(&self.terms, v, *t)) {
            return false;
        }
        let t = self.terms.concat(rhs);
        if t == v {
            return false;
        }
        log::debug!(
            target: targets::SOLUTION,
            "Solved {} = {}",
            self.terms.display(v),
            self.terms.display(t),
        );
        self.solution.update(v, t, dep);
        true
    }

    /// `x ++ unit(a) = unit(b) ++ x` derives `a = b`.
    fn solve_binary_eq(&mut self, lhs: &[TermId], rhs: &[TermId], dep: DepId) -> bool {
        let ([x1, ua], [ub, x2]) = (lhs, rhs) else {
            return false;
        };
        if x1 != x2 || !self.terms.is_solvable_var(*x1) {
            return false;
        }
        let (TermKind::Unit(a), TermKind::Unit(b)) =
            (self.terms.kind(*ua).clone(), self.terms.kind(*ub).clone())
        else {
            return false;
        };
        self.propagate_eq_fired(a, b, dep)
    }

    /// `unit(nth(x, 0)) ++ … ++ unit(nth(x, n-1)) = x`-shaped equations commit once
    /// `|x| = n` is pinned.
    fn solve_nth_eq(&mut self, lhs: &[TermId], rhs: &[TermId], dep: DepId) -> bool {
        let [x] = rhs else {
            return false;
        };
        let x = *x;
        if !self.terms.is_solvable_var(x) || !self.solution.is_root(x) {
            return false;
        }
        if lhs.is_empty() {
            return false;
        }
        for (at, part) in lhs.iter().enumerate() {
            let TermKind::Unit(e) = self.terms.kind(*part) else {
                return false;
            };
            let TermKind::Nth(s, i) = self.terms.kind(*e) else {
                return false;
            };
            if *s != x || self.terms.as_int_const(*i) != Some(at as i64) {
                return false;
            }
        }
        let n = lhs.len() as i64;
        let len_x = self.terms.length(x);
        let Some((value, len_dep)) = self.int_value(len_x) else {
            return false;
        };
        if value != n {
            return false;
        }
        let expansion = self.terms.concat(lhs);
        let dep = self.deps.join(dep, len_dep);
        self.solution.update(x, expansion, dep);
        true
    }

    /// `itos(i)` against a digit word: bind `i` by evaluation, or refuse non-digits.
    fn solve_itos(
        &mut self,
        lhs: &[TermId],
        rhs: &[TermId],
        dep: DepId,
    ) -> Result<bool, ErrorKind> {
        let [itos] = lhs else {
            return Ok(false);
        };
        let TermKind::Itos(i) = self.terms.kind(*itos).clone() else {
            return Ok(false);
        };

        if rhs.is_empty() {
            // itos(i) = ε forces i < 0.
            let zero = self.terms.int(0);
            let neg = self.terms.int_lt(i, zero);
            let key = (TAG_ITOS_DIGITS, *itos, self.terms.empty(), 0);
            if !self.mark_emitted(key) {
                return Ok(false);
            }
            let lit = self.lit_of(neg, true);
            self.propagate_lit(lit, dep);
            self.counters.int_string += 1;
            return Ok(true);
        }

        let [w] = rhs else {
            return Ok(false);
        };
        let Some(word) = self.terms.as_const(*w).map(|w| w.to_vec()) else {
            return Ok(false);
        };
        let key = (TAG_ITOS_DIGITS, *itos, *w, 0);
        if !self.mark_emitted(key) {
            return Ok(false);
        }
        self.counters.int_string += 1;
        match rewriter::eval_digits(&word) {
            Some(value) => {
                let v = self.terms.int(value);
                self.propagate_eq(i, v, dep);
            }
            None => {
                // A non-digit in the image of itos.
                self.set_conflict(dep);
            }
        }
        Ok(true)
    }

    /// Evaluates every assigned theory literal against its canonical form.
    pub(crate) fn check_assigned_literals(&mut self) -> bool {
        let trail = self.sat.trail().to_vec();
        let mut fired = false;
        for lit in trail {
            let term = self.sat.term_of(lit.atom());
            if !is_theory_literal(self.terms.kind(term)) {
                continue;
            }
            let (normal, dep) = self.canonize(term);

            // A decided constant refutes or confirms the assignment outright.
            match self.terms.kind(normal) {
                TermKind::True => {
                    if !lit.polarity() && self.mark_emitted((TAG_LIT_EVAL, term, normal, 0)) {
                        let lit_dep = self.deps.lit(lit);
                        let joined = self.deps.join(lit_dep, dep);
                        self.set_conflict(joined);
                        fired = true;
                    }
                    continue;
                }
                TermKind::False => {
                    if lit.polarity() && self.mark_emitted((TAG_LIT_EVAL, term, normal, 0)) {
                        let lit_dep = self.deps.lit(lit);
                        let joined = self.deps.join(lit_dep, dep);
                        self.set_conflict(joined);
                        fired = true;
                    }
                    continue;
                }
                _ => {}
            }

            match rewriter::reduce_bool(&mut self.terms, normal) {
                BoolReduction::Value(v) => {
                    if v != lit.polarity() && self.mark_emitted((TAG_LIT_EVAL, term, normal, 1)) {
                        let lit_dep = self.deps.lit(lit);
                        let joined = self.deps.join(lit_dep, dep);
                        self.set_conflict(joined);
                        fired = true;
                    }
                }
                BoolReduction::Conj(parts) => {
                    let dep_lits = self.clause_tail_from_dep(dep);
                    if lit.polarity() {
                        // term ∧ deps → each part.
                        for part in parts {
                            if !self.mark_emitted((TAG_CONJ_POS, term, part, 0)) {
                                continue;
                            }
                            let part_lit = self.lit_of(part, true);
                            let mut clause = vec![!lit, part_lit];
                            clause.extend(dep_lits.iter().copied());
                            self.add_axiom(clause);
                            fired = true;
                        }
                    } else {
                        // deps ∧ all parts → term; with ¬term asserted, some part fails.
                        let first = *parts.first().expect("a non-empty conjunction");
                        if self.mark_emitted((TAG_CONJ_NEG, term, first, parts.len() as i64)) {
                            // The positive occurrence of the term closes the implication.
                            let mut clause = vec![!lit];
                            for part in &parts {
                                let part_lit = self.lit_of(*part, true);
                                clause.push(!part_lit);
                            }
                            clause.extend(dep_lits.iter().copied());
                            self.add_axiom(clause);
                            fired = true;
                        }
                    }
                }
                BoolReduction::Open => {}
            }
        }
        fired
    }

    /// Intersects the character predicates asserted on each element; an empty
    /// intersection is a conflict.
    pub(crate) fn check_char_sets(&mut self) -> bool {
        use crate::regexes::nfa::CharPred;

        let trail = self.sat.trail().to_vec();
        let mut sets: FxHashMap<TermId, (CharPred, DepId)> = FxHashMap::default();
        let mut fired = false;

        for lit in trail {
            let term = self.sat.term_of(lit.atom());
            let TermKind::CharIn(e, pred_id) = self.terms.kind(term).clone() else {
                continue;
            };
            let (elem, edep) = self.canonize(e);
            let pred = self.regexes.pred(pred_id).clone();
            let pred = if lit.polarity() { pred } else { pred.complement() };

            // A constant element evaluates directly.
            if let Some(c) = self.terms.as_char(elem) {
                if !pred.contains(c) && self.mark_emitted((TAG_CHAR_SET, term, elem, 0)) {
                    let lit_dep = self.deps.lit(lit);
                    let joined = self.deps.join(lit_dep, edep);
                    self.set_conflict(joined);
                    fired = true;
                }
                continue;
            }

            let lit_dep = self.deps.lit(lit);
            let entry = sets.entry(elem).or_insert((CharPred::any(), DepForest::NONE));
            let narrowed = entry.0.inter(&pred);
            let combined_dep = {
                let with_lit = self.deps.join(entry.1, lit_dep);
                self.deps.join(with_lit, edep)
            };
            *entry = (narrowed, combined_dep);
        }

        for (elem, (pred, dep)) in sets {
            if pred.is_empty() && self.mark_emitted((TAG_CHAR_SET, elem, 0, 1)) {
                self.set_conflict(dep);
                fired = true;
            }
        }
        fired
    }

    /// Distinct constants merged into one equivalence class are a conflict.
    pub(crate) fn check_const_clashes(&mut self) -> bool {
        let mut by_root: FxHashMap<TermId, TermId> = FxHashMap::default();
        let mut fired = false;
        let count = self.terms.count() as TermId;
        for t in 0..count {
            let is_const = matches!(
                self.terms.kind(t),
                TermKind::Char(_) | TermKind::IntConst(_) | TermKind::Const(_) | TermKind::Empty
            );
            if !is_const {
                continue;
            }
            let root = self.egraph.root(t);
            if root == t && !by_root.contains_key(&root) {
                // A lone constant in its own class.
                by_root.insert(root, t);
                continue;
            }
            match by_root.get(&root) {
                None => {
                    by_root.insert(root, t);
                }
                Some(&prior) if prior != t => {
                    if self.mark_emitted((TAG_CLASH, prior, t, 0)) {
                        if let Some(dep) = self.egraph.explain(prior, t, &mut self.deps) {
                            self.set_conflict(dep);
                            fired = true;
                        }
                    }
                }
                Some(_) => {}
            }
        }
        fired
    }
}

/// True for the boolean kinds the evaluation pass re-examines.
fn is_theory_literal(kind: &TermKind) -> bool {
    matches!(
        kind,
        TermKind::Eq(_, _)
            | TermKind::Contains(_, _)
            | TermKind::PrefixOf(_, _)
            | TermKind::SuffixOf(_, _)
            | TermKind::LexLt(_, _)
            | TermKind::LexLe(_, _)
    )
}

/// Reduce a disequation's canonized sides, shared by the nqs rules.
pub(crate) fn reduce_diseq<R: rand::Rng + std::default::Default>(
    ctx: &mut GenericContext<R>,
    l: TermId,
    r: TermId,
) -> NeReduction {
    rewriter::reduce_ne(&mut ctx.terms, l, r)
}
