/*!
The internal kernel: the external collaborators of the sequence core, in miniature.

The core of the library is the theory of sequences; the kernel exists so the theory can
be driven end-to-end.
It bundles:

- [sat] — a DPLL engine over boolean atoms: clause storage, unit propagation with a
  trail, decision levels, conflict analysis to decision and assumption literals, and
  unsat-core seeds for the unfolding budgets.
- [egraph] — a union-find over terms with per-edge justifications, explaining any
  derived equality as a join of the assumptions along the connecting paths.
- [arith] — interval bounds on integer terms derived from asserted atoms with a
  constant side, with interval evaluation of sums and scaled terms.

None of the three is a contribution: each is deliberately simple, scanning where a
production engine would index, and correct over the scale the theory exercises.
*/

pub mod arith;
pub mod egraph;
pub mod sat;
