/*!
Configuration of a context.

All configuration for a context is contained within the context.
Options are fixed before a solve; a handful (the unfolding budgets) evolve as the outer
driver raises them on budget-seeded cores.
*/

use std::str::FromStr;

use crate::context::ContextState;

mod config_option;
pub use config_option::ConfigOption;

/// The probability of assigning positive polarity when freely deciding an atom.
pub type PolarityLean = f64;

/// The probability of deciding an atom at random rather than in index order.
pub type RandomDecisionBias = f64;

/// Variant arithmetic engines for length reasoning.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ArithKind {
    /// Interval bounds derived from asserted atoms with a constant side.
    Bounds = 0,

    /// The bounds engine, additionally walking equivalence classes for values.
    Relational,

    /// No arithmetic engine; a solve cannot be initialized in this state.
    Disabled,
}

impl ArithKind {
    /// The minimum ArithKind type.
    pub const MIN: ArithKind = ArithKind::Bounds;

    /// The maximum ArithKind type.
    pub const MAX: ArithKind = ArithKind::Disabled;
}

impl std::fmt::Display for ArithKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bounds => write!(f, "Bounds"),
            Self::Relational => write!(f, "Relational"),
            Self::Disabled => write!(f, "Disabled"),
        }
    }
}

impl FromStr for ArithKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Bounds" => Ok(Self::Bounds),
            "Relational" => Ok(Self::Relational),
            "Disabled" => Ok(Self::Disabled),
            _unknown_string => Err(()),
        }
    }
}

/// The primary configuration structure.
#[derive(Clone)]
pub struct Config {
    /// Which arithmetic engine backs length reasoning.
    pub arith_engine: ConfigOption<ArithKind>,

    /// Permit splitting equated concatenations on shared boundary length information.
    pub split_with_length: ConfigOption<bool>,

    /// The initial automaton unfolding depth budget.
    pub max_unfolding_init: ConfigOption<i64>,

    /// The initial per-sequence length budget.
    pub length_limit_init: ConfigOption<i64>,

    /// The probability of assigning positive polarity when freely deciding an atom.
    pub polarity_lean: ConfigOption<PolarityLean>,

    /// The probability of deciding an atom at random rather than in index order.
    pub random_decision_bias: ConfigOption<RandomDecisionBias>,

    /// A cap on final-check rounds before reporting unknown; cancellation is observed
    /// only at this granularity.
    pub final_check_limit: ConfigOption<usize>,

    /// A cap on kernel conflicts before reporting unknown.
    pub conflict_limit: ConfigOption<usize>,
}

impl Default for Config {
    /// The default configuration is set to give quick, deterministic results on a
    /// library of tests.
    fn default() -> Self {
        Config {
            arith_engine: ConfigOption {
                name: "arith_engine",
                min: ArithKind::MIN,
                max: ArithKind::MAX,
                max_state: ContextState::Configuration,
                value: ArithKind::Relational,
            },

            split_with_length: ConfigOption {
                name: "split_with_length",
                min: false,
                max: true,
                max_state: ContextState::Configuration,
                value: true,
            },

            max_unfolding_init: ConfigOption {
                name: "max_unfolding_init",
                min: 1,
                max: i64::MAX,
                max_state: ContextState::Configuration,
                value: 1,
            },

            length_limit_init: ConfigOption {
                name: "length_limit_init",
                min: 1,
                max: i64::MAX,
                max_state: ContextState::Configuration,
                value: 4,
            },

            polarity_lean: ConfigOption {
                name: "polarity_lean",
                min: 0.0,
                max: 1.0,
                max_state: ContextState::Configuration,
                value: 0.0,
            },

            random_decision_bias: ConfigOption {
                name: "random_decision_bias",
                min: 0.0,
                max: 1.0,
                max_state: ContextState::Configuration,
                value: 0.0,
            },

            final_check_limit: ConfigOption {
                name: "final_check_limit",
                min: 1,
                max: usize::MAX,
                max_state: ContextState::Configuration,
                value: 5_000,
            },

            conflict_limit: ConfigOption {
                name: "conflict_limit",
                min: 1,
                max: usize::MAX,
                max_state: ContextState::Configuration,
                value: 50_000,
            },
        }
    }
}
