/*!
Extensionality probes over the tracked sequence variables.

For every pair of sequence variables in different equivalence classes whose canonical
forms the rewriter cannot tell apart, an equality atom is proposed to the kernel with a
positive phase — the kernel splits, and if the equality is refutable the refutation
arrives as an ordinary conflict on the atom's branch.
A pair the rewriter *can* tell apart is recorded in the exclusion table, cutting the
probe on every later round.
*/

use crate::{
    context::GenericContext,
    misc::log::targets,
    rewriter::NeReduction,
    structures::term::{Sort, TermKind},
    types::err::ErrorKind,
};

const TAG_EXT: u16 = 65;

impl<R: rand::Rng + std::default::Default> GenericContext<R> {
    /// Proposes one extensionality split, or records exclusions; true if one was
    /// proposed.
    pub fn check_extensionality(&mut self) -> Result<bool, ErrorKind> {
        let tracked = self.tracked_seqs.clone();
        let vars = tracked
            .into_iter()
            .filter(|t| matches!(self.terms.kind(*t), TermKind::Var { sort: Sort::Seq, .. }))
            .collect::<Vec<_>>();

        for (ix, &a) in vars.iter().enumerate() {
            for &b in &vars[ix + 1..] {
                if self.egraph.are_eq(a, b) {
                    continue;
                }
                if self.exclusions.contains(a, b) {
                    continue;
                }
                let (ca, _) = self.canonize(a);
                let (cb, _) = self.canonize(b);
                if ca == cb {
                    continue;
                }
                match crate::procedures::eqs::reduce_diseq(self, ca, cb) {
                    NeReduction::Distinct => {
                        // The rewriter refutes the pair: cut future probes.
                        self.exclusions.insert(a, b);
                        continue;
                    }
                    NeReduction::Equal => continue,
                    NeReduction::Split(_) | NeReduction::Opaque => {}
                }
                if !self.mark_emitted((TAG_EXT, a, b, 0)) {
                    continue;
                }
                // Propose the equality; the kernel splits, preferring equal.
                log::debug!(
                    target: targets::CASCADE,
                    "Extensionality probe {} = {}",
                    self.terms.display(a),
                    self.terms.display(b),
                );
                let eq = self.terms.eq(a, b);
                let atom = self.sat.atom_of(eq);
                self.sat.set_phase(atom, true);
                self.counters.extensionality += 1;
                return Ok(true);
            }
        }
        Ok(false)
    }
}
