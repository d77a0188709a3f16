/*!
A library for deciding the satisfiability of constraints over finite sequences (strings).

strand implements the core of a DPLL(T) style decision procedure for the theory of
finite sequences: equalities, disequalities, length constraints, membership in regular
languages, and the usual string functions (concatenation, length, extract, contains,
index-of, prefix/suffix, at, nth, replace, lexicographic comparison, int↔string).

The hard part — and the focus of the library — is the equation-solving engine together
with its axiomatic companions:

- a backtrackable [solution map](db::solution) mapping terms to replacement terms with
  dependency annotations,
- a [final-check cascade](procedures) which at every round applies a fixed, ordered
  pipeline of solving, splitting, and axiom-instantiation rules to the current set of
  sequence (dis)equations, and
- a [regular-language engine](regexes) compiling regular expressions to nondeterministic
  finite automata and unfolding membership through Skolemized `accept`/`step` predicates.

The procedure is sound and incomplete: a `Satisfiable` or `Unsatisfiable` report is
trustworthy, while an exhausted cascade yields `Unknown`.

# Orientation

The library is designed around the core structure of a [context](context::Context).

Constraints are built as [terms](structures::term) through the context's term table and
asserted with a polarity. Internally, and at a high level, a solve is viewed in terms of
a handful of cooperating stores:

- asserted sequence equations, disequations, and negative containment constraints live
  in the [equation store](db::eqs),
- committed solutions live in the [solution map](db::solution), each entry carrying the
  [dependency](db::dependency) under which it holds,
- boolean structure lives in a small internal [DPLL kernel](kernel), which drives the
  theory through final checks.

Useful starting points:

- The [solve driver](procedures::solve) for the outer loop and the unfolding budgets.
- The [cascade](procedures::final_check) for the rule order at a final check.
- The [rewriter] for the algebraic simplifications the cascade leans on.

# Example

```rust
use strand::{config::Config, context::Context, reports::Report};

let mut ctx = Context::from_config(Config::default());

// x ++ "ab" = "cab"
let x = ctx.seq_var("x");
let ab = ctx.terms.const_str("ab");
let cab = ctx.terms.const_str("cab");
let lhs = ctx.terms.concat(&[x, ab]);
let eq = ctx.terms.eq(lhs, cab);
ctx.assert_term(eq, true);

assert_eq!(ctx.solve(), Ok(Report::Satisfiable));
assert_eq!(ctx.seq_value(x).as_deref(), Some("c"));
```

# Logs

To help diagnose issues, detailed calls to [log!](log) are made throughout, under the
targets listed in [misc::log]. No log implementation is provided; see [log].
*/

#![allow(clippy::collapsible_else_if)]
#![allow(clippy::single_match)]
#![allow(clippy::too_many_arguments)]

pub mod config;
pub mod context;

pub mod structures;
pub mod types;

pub mod db;

pub mod axioms;
pub mod canonize;
pub mod rewriter;
pub mod skolem;

pub mod kernel;
pub mod procedures;
pub mod regexes;

pub mod model;
pub mod reports;

pub mod generic;
pub mod misc;
