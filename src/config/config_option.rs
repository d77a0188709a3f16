use crate::context::ContextState;

/// A configuration option, with bounds on its value and on the context states at which
/// the option may be set.
#[derive(Clone)]
pub struct ConfigOption<T> {
    /// The name of the option.
    pub name: &'static str,

    /// The minimum permitted value.
    pub min: T,

    /// The maximum permitted value.
    pub max: T,

    /// The most advanced context state at which the option may be set.
    pub max_state: ContextState,

    /// The current value.
    pub value: T,
}
