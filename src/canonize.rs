/*!
The canonizer/expander: recursive replacement through the solution map, followed by
rewriting, with the accumulated dependency tracked throughout.

`canonize(e)` returns `(e', dep)` such that `e = e'` under the leaves of `dep`:

1. A cached result is returned as-is (the memo lives in the [solution
   map](crate::db::solution) and is invalidated on every update and pop).
2. A term with a solution entry chases the chain and canonizes the result.
3. Otherwise the node is rebuilt with canonized children and handed to the
   [rewriter](crate::rewriter).
4. An `if-then-else` consults the kernel's truth value for the condition: a decided
   condition selects a branch (taking the condition literal into the dependency), an
   undecided one leaves the node in place for the kernel to decide.

Skolem applications split by family: the witness families (`prefix_inv`, `suffix_inv`,
`indexof_left`, `indexof_right`, `diseq_idx`) and the automaton predicates are nominal
— their identity is their arguments at creation, and canonizing underneath would
detach them from their defining axioms — while `tail`, `pre`, `post`, `seq_first`, and
`digit2int` denote functions of their arguments and canonize through.

Canonize is idempotent: the output of a canonization canonizes to itself.
*/

use crate::{
    context::GenericContext,
    db::dependency::{DepForest, DepId},
    rewriter,
    structures::term::{SkolemKind, TermId, TermKind},
};

impl<R: rand::Rng + std::default::Default> GenericContext<R> {
    /// The normal form of `e` under the current solution map, with the dependency the
    /// normalization rests on.
    pub fn canonize(&mut self, e: TermId) -> (TermId, DepId) {
        if let Some(hit) = self.solution.cached(e) {
            return hit;
        }

        let (found, found_dep) = self.solution.find(e, &mut self.deps);
        if found != e {
            let (normal, chased_dep) = self.canonize(found);
            let dep = self.deps.join(found_dep, chased_dep);
            self.solution.memoize(e, normal, dep);
            return (normal, dep);
        }

        let (rebuilt, child_dep) = self.canonize_children(e);
        let normal = rewriter::rewrite(&mut self.terms, rebuilt);

        // The rewrite may expose a term with its own solution entry.
        let (normal, post_dep) = if normal != e && normal != rebuilt {
            let (chased, d) = self.solution.find(normal, &mut self.deps);
            if chased != normal {
                let (n, d2) = self.canonize(chased);
                (n, self.deps.join(d, d2))
            } else {
                (normal, DepForest::NONE)
            }
        } else {
            (normal, DepForest::NONE)
        };

        let dep = self.deps.join(child_dep, post_dep);
        self.solution.memoize(e, normal, dep);
        (normal, dep)
    }

    /// Rebuilds `e` with canonized children.
    fn canonize_children(&mut self, e: TermId) -> (TermId, DepId) {
        use TermKind::*;
        let kind = self.terms.kind(e).clone();
        let mut dep = DepForest::NONE;

        macro_rules! canon {
            ($child:expr) => {{
                let (c, d) = self.canonize($child);
                dep = self.deps.join(dep, d);
                c
            }};
        }

        let rebuilt = match kind {
            // Leaves.
            True | False | Var { .. } | Empty | Const(_) | Char(_) | IntConst(_) | ReEmpty
            | ReEpsilon | ReLiteral(_) | ReRange(_, _) | ReAny | ReUnion(_, _)
            | ReConcat(_, _) | ReInter(_, _) | ReComp(_) | ReStar(_) | RePlus(_) | ReOpt(_) => {
                return (e, DepForest::NONE);
            }

            Unit(c) => {
                let c = canon!(c);
                self.terms.unit(c)
            }

            Concat(parts) => {
                let parts = parts.iter().map(|p| canon!(*p)).collect::<Vec<_>>();
                self.terms.concat(&parts)
            }

            Extract(s, i, l) => {
                let (s, i, l) = (canon!(s), canon!(i), canon!(l));
                self.terms.extract(s, i, l)
            }

            At(s, i) => {
                let (s, i) = (canon!(s), canon!(i));
                self.terms.at(s, i)
            }

            Replace(s, t, r) => {
                let (s, t, r) = (canon!(s), canon!(t), canon!(r));
                self.terms.replace(s, t, r)
            }

            Itos(i) => {
                let i = canon!(i);
                self.terms.itos(i)
            }

            Nth(s, i) => {
                let (s, i) = (canon!(s), canon!(i));
                self.terms.nth(s, i)
            }

            Length(s) => {
                let s = canon!(s);
                self.terms.length(s)
            }

            Add(parts) => {
                let parts = parts.iter().map(|p| canon!(*p)).collect::<Vec<_>>();
                self.terms.add(&parts)
            }

            Mul(a, b) => {
                let (a, b) = (canon!(a), canon!(b));
                self.terms.mul(a, b)
            }

            Indexof(s, t, i) => {
                let (s, t, i) = (canon!(s), canon!(t), canon!(i));
                self.terms.indexof(s, t, i)
            }

            Stoi(s) => {
                let s = canon!(s);
                self.terms.stoi(s)
            }

            Eq(a, b) => {
                let (a, b) = (canon!(a), canon!(b));
                self.terms.eq(a, b)
            }

            InRe(s, re) => {
                let s = canon!(s);
                self.terms.in_re(s, re)
            }

            Contains(h, n) => {
                let (h, n) = (canon!(h), canon!(n));
                self.terms.contains(h, n)
            }

            PrefixOf(p, f) => {
                let (p, f) = (canon!(p), canon!(f));
                self.terms.prefix_of(p, f)
            }

            SuffixOf(s, f) => {
                let (s, f) = (canon!(s), canon!(f));
                self.terms.suffix_of(s, f)
            }

            LexLt(a, b) => {
                let (a, b) = (canon!(a), canon!(b));
                self.terms.lex_lt(a, b)
            }

            LexLe(a, b) => {
                let (a, b) = (canon!(a), canon!(b));
                self.terms.lex_le(a, b)
            }

            IntLe(a, b) => {
                let (a, b) = (canon!(a), canon!(b));
                self.terms.int_le(a, b)
            }

            IntLt(a, b) => {
                let (a, b) = (canon!(a), canon!(b));
                self.terms.int_lt(a, b)
            }

            CharIn(c, p) => {
                let c = canon!(c);
                self.terms.char_in(c, p)
            }

            Ite(cond, then, els) => match self.sat.value_of_term(cond) {
                Some(true) => {
                    let lit = self.lit_of(cond, true);
                    let lit_dep = self.deps.lit(lit);
                    let (branch, branch_dep) = self.canonize(then);
                    let joined = self.deps.join(lit_dep, branch_dep);
                    return (branch, joined);
                }
                Some(false) => {
                    let lit = self.lit_of(cond, false);
                    let lit_dep = self.deps.lit(lit);
                    let (branch, branch_dep) = self.canonize(els);
                    let joined = self.deps.join(lit_dep, branch_dep);
                    return (branch, joined);
                }
                None => {
                    // Undecided: leave the node for the kernel to make progress on.
                    let (then, els) = (canon!(then), canon!(els));
                    self.terms.ite(cond, then, els)
                }
            },

            Skolem(kind, args) => match kind {
                // Function-like families canonize through their arguments.
                SkolemKind::Tail
                | SkolemKind::Pre
                | SkolemKind::Post
                | SkolemKind::SeqFirst
                | SkolemKind::Digit2Int => {
                    let args = args.iter().map(|a| canon!(*a)).collect::<Vec<_>>();
                    self.terms.skolem(kind, &args)
                }

                // Witness and automaton families are nominal.
                SkolemKind::IndexofLeft
                | SkolemKind::IndexofRight
                | SkolemKind::PrefixInv
                | SkolemKind::SuffixInv
                | SkolemKind::DiseqIndex
                | SkolemKind::Accept
                | SkolemKind::Step
                | SkolemKind::MaxUnfolding
                | SkolemKind::LengthLimit => return (e, DepForest::NONE),
            },
        };

        (rebuilt, dep)
    }
}

#[cfg(test)]
mod canonize_tests {
    use super::*;
    use crate::{config::Config, context::Context};

    #[test]
    fn canonize_substitutes_and_rewrites() {
        let mut ctx = Context::from_config(Config::default());
        let x = ctx.seq_var("x");
        let c = ctx.terms.const_str("c");
        ctx.solution.update(x, c, DepForest::NONE);

        let ab = ctx.terms.const_str("ab");
        let xab = ctx.terms.concat(&[x, ab]);
        let (normal, _) = ctx.canonize(xab);
        assert_eq!(normal, ctx.terms.const_str("cab"));
    }

    #[test]
    fn canonize_is_idempotent() {
        let mut ctx = Context::from_config(Config::default());
        let x = ctx.seq_var("x");
        let y = ctx.seq_var("y");
        ctx.solution.update(x, y, DepForest::NONE);

        let ab = ctx.terms.const_str("ab");
        let e = ctx.terms.concat(&[x, ab, y]);
        let (once, _) = ctx.canonize(e);
        let (twice, _) = ctx.canonize(once);
        assert_eq!(once, twice);
    }

    #[test]
    fn canonize_length_through_solution() {
        let mut ctx = Context::from_config(Config::default());
        let x = ctx.seq_var("x");
        let ab = ctx.terms.const_str("ab");
        ctx.solution.update(x, ab, DepForest::NONE);

        let len = ctx.terms.length(x);
        let (normal, _) = ctx.canonize(len);
        assert_eq!(normal, ctx.terms.int(2));
    }

    #[test]
    fn canonize_tracks_dependencies() {
        let mut ctx = Context::from_config(Config::default());
        let x = ctx.seq_var("x");
        let c = ctx.terms.const_str("c");
        let lit = crate::structures::literal::Literal::new(7, true);
        let dep = ctx.deps.lit(lit);
        ctx.solution.update(x, c, dep);

        let (normal, out_dep) = ctx.canonize(x);
        assert_eq!(normal, c);
        let flat = ctx.deps.linearize(out_dep);
        assert_eq!(flat.lits, vec![lit]);
    }
}
