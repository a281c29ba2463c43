//! Graph-specific error types.

use thiserror::Error;

pub type GraphResult<T> = Result<T, GraphError>;

/// Connection graph construction and ordering errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Two systems were registered under the same name.
    #[error("System '{name}' is registered more than once")]
    DuplicateSystem { name: String },

    /// A connection names a system that was never registered.
    #[error("Connection {connection} references unknown {role} system '{name}'")]
    UnknownSystem {
        name: String,
        role: &'static str,
        connection: String,
    },

    /// An input is driven by more than one connection.
    #[error("Input '{system}.{parameter}' is driven by more than one connection")]
    DuplicateDriver { system: String, parameter: String },

    /// The scheduler could not place every system.
    #[error("Evaluation order could not be computed: {scheduled} of {total} systems scheduled")]
    Cyclic { scheduled: usize, total: usize },
}
