//! Reports from a solve.

/// A report on the satisfiability of the asserted constraints.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Report {
    /// The constraints are satisfiable, and a witness may be read from the context.
    Satisfiable,

    /// The constraints are unsatisfiable.
    Unsatisfiable,

    /// The cascade exhausted without a conclusion, or a resource limit was hit.
    Unknown,
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Satisfiable => write!(f, "Satisfiable"),
            Self::Unsatisfiable => write!(f, "Unsatisfiable"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}
