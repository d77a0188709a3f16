/*!
Error types used in the library.

- Most of these are very unlikely to occur during use.
- None are used for normal control flow: contradictions are reported as kernel conflicts
  and an exhausted cascade is reported as [Report::Unknown](crate::reports::Report), so
  an error from a solve signals a genuine failure to set up or continue the search.

Names of the error enums --- for the most part --- overlap with corresponding structs.
*/

use crate::structures::term::TermId;

/// A union of varied error kinds.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// An error when initializing a search.
    Build(BuildError),

    /// An error from the regular-language engine.
    Regex(RegexError),

    /// An error from the internal kernel.
    Kernel(KernelError),

    /// The attempted action could not be completed given the state of the context.
    InvalidState,
}

/// Noted errors when initializing a search.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildError {
    /// Neither arithmetic engine is configured, and the procedure cannot run without
    /// length reasoning.
    IncompatibleArithTheory,
}

impl From<BuildError> for ErrorKind {
    fn from(e: BuildError) -> Self {
        ErrorKind::Build(e)
    }
}

/// Errors from the regular-language engine.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RegexError {
    /// The noted regex expression cannot be compiled to a finite automaton.
    ///
    /// Raised, e.g., when determinization for a complement exceeds the state limit.
    Unsupported(TermId),
}

impl From<RegexError> for ErrorKind {
    fn from(e: RegexError) -> Self {
        ErrorKind::Regex(e)
    }
}

/// Errors from the internal kernel.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum KernelError {
    /// There are no more fresh atoms.
    AtomsExhausted,
}

impl From<KernelError> for ErrorKind {
    fn from(e: KernelError) -> Self {
        ErrorKind::Kernel(e)
    }
}
