/*!
The context --- to which constraints are asserted and within which solves take place.

Strictly, a [GenericContext] and a [Context].

The generic context is parameterised to the source of randomness used by the kernel's
decision heuristics; [from_config](Context::from_config) is implemented for the
canonical [Context] so supplying a source alongside a config is not required.

# Example

```rust
use strand::{config::Config, context::Context, reports::Report};

let mut ctx = Context::from_config(Config::default());

// |x| = 3 and x = "ab" cannot both hold.
let x = ctx.seq_var("x");
let len_x = ctx.terms.length(x);
let three = ctx.terms.int(3);
let ab = ctx.terms.const_str("ab");

let len_is_three = ctx.terms.eq(len_x, three);
let x_is_ab = ctx.terms.eq(x, ab);
ctx.assert_term(len_is_three, true);
ctx.assert_term(x_is_ab, true);

assert_eq!(ctx.solve(), Ok(Report::Unsatisfiable));
```
*/

use rustc_hash::{FxHashMap, FxHashSet};

use crate::{
    config::Config,
    db::{
        dependency::DepForest,
        eqs::{EqStore, EqStoreMark},
        exclusion::ExclusionTable,
        solution::SolutionMap,
    },
    generic::split_mix::SplitMix64,
    kernel::{egraph::EGraph, sat::SatCore},
    misc::log::targets,
    regexes::RegexEngine,
    reports::Report,
    structures::{
        literal::Literal,
        term::{Sort, TermId, TermTable},
    },
};

mod counters;
pub use counters::Counters;

/// The state of a context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContextState {
    /// The context allows for configuration.
    Configuration,

    /// The context allows input.
    Input,

    /// The constraints are known to be satisfiable, with a witness available.
    Satisfiable,

    /// The constraints are known to be unsatisfiable.
    Unsatisfiable,

    /// The consistency of the constraints is unknown.
    Solving,

    /// The search exhausted without a conclusion.
    Unknown,
}

impl std::fmt::Display for ContextState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration => write!(f, "Configuration"),
            Self::Input => write!(f, "Input"),
            Self::Satisfiable => write!(f, "Satisfiable"),
            Self::Unsatisfiable => write!(f, "Unsatisfiable"),
            Self::Solving => write!(f, "Solving"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// A key deduplicating an axiom or propagation emission: a tag with up to three
/// distinguishing arguments.
pub(crate) type EmitKey = (u16, TermId, TermId, i64);

/// Stamps over every scoped container, taken together on a push.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ScopeFrame {
    pub deps: usize,
    pub solution: usize,
    pub exclusions: usize,
    pub eqs: EqStoreMark,
    pub egraph: usize,
    pub regexes: usize,
    pub relay_head: usize,
    pub lts_checked: bool,
}

/// A generic context, parameterised to a source of randomness.
pub struct GenericContext<R: rand::Rng + std::default::Default> {
    /// The configuration of the context.
    pub config: Config,

    /// Counters related to a context/solve.
    pub counters: Counters,

    /// The term table.
    pub terms: TermTable,

    /// The dependency manager.
    pub deps: DepForest,

    /// The solution map.
    pub solution: SolutionMap,

    /// The exclusion table.
    pub exclusions: ExclusionTable,

    /// Pending equations, disequations, and negative containments.
    pub eqs: EqStore,

    /// The regular-language engine.
    pub regexes: RegexEngine,

    /// The DPLL kernel.
    pub sat: SatCore,

    /// The equality graph.
    pub egraph: EGraph,

    /// The state of the context.
    pub state: ContextState,

    /// The source of rng.
    pub rng: R,

    /// The cursor into the kernel trail up to which assignments have been relayed to
    /// the theory stores.
    pub(crate) relay_head: usize,

    /// Deduplication of axiom and propagation emissions; monotone, as every emission
    /// is a valid clause.
    pub(crate) emitted: FxHashSet<EmitKey>,

    /// Terms whose operator axioms and length registration have been performed.
    pub(crate) registered: FxHashSet<TermId>,

    /// Sequence terms tracked for length reasoning, in registration order.
    pub(crate) tracked_seqs: Vec<TermId>,

    /// The budget assumption literals currently registered.
    pub(crate) assumptions: Vec<Literal>,

    /// The current automaton unfolding depth budget.
    pub(crate) max_unfolding_depth: i64,

    /// The current per-sequence length budgets.
    pub(crate) length_limits: FxHashMap<TermId, i64>,

    /// Scope frames, one per kernel decision level.
    pub(crate) scopes: Vec<ScopeFrame>,

    /// Whether the lexicographic transitivity check has run at this scope.
    pub(crate) lts_checked: bool,
}

/// The canonical context.
pub type Context = GenericContext<SplitMix64>;

impl Context {
    /// A context from a config, with the canonical source of randomness.
    pub fn from_config(config: Config) -> Self {
        let max_unfolding_depth = config.max_unfolding_init.value;
        GenericContext {
            config,
            counters: Counters::default(),
            terms: TermTable::default(),
            deps: DepForest::default(),
            solution: SolutionMap::default(),
            exclusions: ExclusionTable::default(),
            eqs: EqStore::default(),
            regexes: RegexEngine::default(),
            sat: SatCore::default(),
            egraph: EGraph::default(),
            state: ContextState::Configuration,
            rng: SplitMix64::default(),
            relay_head: 0,
            emitted: FxHashSet::default(),
            registered: FxHashSet::default(),
            tracked_seqs: Vec::default(),
            assumptions: Vec::default(),
            max_unfolding_depth,
            length_limits: FxHashMap::default(),
            scopes: Vec::default(),
            lts_checked: false,
        }
    }
}

impl<R: rand::Rng + std::default::Default> GenericContext<R> {
    /// A fresh sequence variable with the given name.
    pub fn seq_var(&mut self, name: &str) -> TermId {
        self.terms.var(name, Sort::Seq)
    }

    /// A fresh integer variable with the given name.
    pub fn int_var(&mut self, name: &str) -> TermId {
        self.terms.var(name, Sort::Int)
    }

    /// A fresh element variable with the given name.
    pub fn elem_var(&mut self, name: &str) -> TermId {
        self.terms.var(name, Sort::Elem)
    }

    /// The kernel literal standing for the boolean term with the given polarity.
    pub fn lit_of(&mut self, t: TermId, polarity: bool) -> Literal {
        let atom = self.sat.atom_of(t);
        Literal::new(atom, polarity)
    }

    /// Asserts a boolean term with the given polarity.
    pub fn assert_term(&mut self, t: TermId, polarity: bool) {
        debug_assert_eq!(self.terms.sort(t), Sort::Bool);
        let lit = self.lit_of(t, polarity);
        self.sat.add_clause(vec![lit]);
        // Fresh input invalidates any concluded report.
        self.state = ContextState::Input;
    }

    /// The report corresponding to the state of the context.
    pub fn report(&self) -> Report {
        match self.state {
            ContextState::Satisfiable => Report::Satisfiable,
            ContextState::Unsatisfiable => Report::Unsatisfiable,
            _ => Report::Unknown,
        }
    }

    /// Stamps every scoped container; called when the kernel opens a decision level.
    pub fn push_scope(&mut self) {
        log::trace!(target: targets::SCOPES, "Push to {}", self.scopes.len() + 1);
        let frame = ScopeFrame {
            deps: self.deps.mark(),
            solution: self.solution.mark(),
            exclusions: self.exclusions.mark(),
            eqs: self.eqs.mark(),
            egraph: self.egraph.mark(),
            regexes: self.regexes.mark(),
            relay_head: self.relay_head,
            lts_checked: self.lts_checked,
        };
        self.scopes.push(frame);
    }

    /// Truncates every scoped container back `k` frames; called when the kernel pops
    /// decision levels.
    pub fn pop_scopes(&mut self, k: usize) {
        if k == 0 {
            return;
        }
        let target = self.scopes.len().saturating_sub(k);
        let frame = self.scopes[target];
        self.scopes.truncate(target);
        self.deps.truncate(frame.deps);
        self.solution.undo_to(frame.solution);
        self.exclusions.undo_to(frame.exclusions);
        self.eqs.undo_to(frame.eqs);
        self.egraph.undo_to(frame.egraph);
        self.regexes.undo_to(frame.regexes);
        self.relay_head = frame.relay_head;
        self.lts_checked = frame.lts_checked;
        log::trace!(target: targets::SCOPES, "Popped {k} to {}", self.scopes.len());
    }

    /// Clears all search state — theory stores and kernel assignments — retaining
    /// terms, atoms, and clauses.
    ///
    /// Used by the outer driver when a budget is raised, and between solves.
    pub fn reset_search(&mut self) {
        self.deps.clear();
        self.solution.clear();
        self.exclusions.clear();
        self.eqs.clear();
        self.egraph.clear();
        self.regexes.reset();
        self.sat.reset_assignments();
        self.scopes.clear();
        self.relay_head = 0;
        self.lts_checked = false;
        self.assumptions.clear();
    }
}
