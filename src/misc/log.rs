/*!
Miscellaneous items related to [logging](log).

Calls to the log macro are made throughout the library.
These are intended to provide useful information for extending the library and/or fixing issues.

Note, no log implementation is provided.
For more details, see [log].
*/

/// Targets to be used within a [log]! macro.
pub mod targets {
    /// Logs related to the [solve driver](crate::procedures::solve).
    pub const SOLVER: &str = "solver";

    /// Logs related to the [final-check cascade](crate::procedures::final_check).
    pub const CASCADE: &str = "cascade";

    /// Logs related to the [solution map](crate::db::solution).
    pub const SOLUTION: &str = "solution";

    /// Logs related to the [regular-language engine](crate::regexes).
    pub const AUTOMATA: &str = "automata";

    /// Logs related to [axiom](crate::axioms) instantiation.
    pub const AXIOMS: &str = "axioms";

    /// Logs related to scope pushes and pops.
    pub const SCOPES: &str = "scopes";

    /// Logs related to [model](crate::model) construction.
    pub const MODEL: &str = "model";

    /// Logs related to the internal [kernel](crate::kernel).
    pub const KERNEL: &str = "kernel";
}
