//! Error types for simulation operations.

use cs_core::ValueKind;
use cs_graph::GraphError;
use thiserror::Error;

pub type EntityResult<T> = Result<T, EntityError>;

/// Errors reported by a simulation entity.
///
/// Entities do not know the name they are registered under; the simulator
/// attaches it when converting into [`SimError`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EntityError {
    #[error("Unknown parameter '{name}'")]
    UnknownParameter { name: String },

    #[error("Parameter '{name}' expects a {expected} value, got {found}")]
    TypeMismatch {
        name: String,
        expected: ValueKind,
        found: ValueKind,
    },

    #[error("Step failed: {message}")]
    StepFailure { message: String },

    #[error("Backend error: {message}")]
    Backend { message: String },
}

impl EntityError {
    pub fn unknown(name: impl Into<String>) -> Self {
        Self::UnknownParameter { name: name.into() }
    }

    pub fn step_failure(message: impl Into<String>) -> Self {
        Self::StepFailure {
            message: message.into(),
        }
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}

pub type SimResult<T> = Result<T, SimError>;

/// Errors surfaced by the simulator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Invalid configuration: {what}")]
    InvalidConfig { what: String },

    #[error("Unknown reference: {what}")]
    UnknownReference { what: String },

    #[error("System '{system}' has no parameter '{parameter}'")]
    UnknownParameter { system: String, parameter: String },

    #[error("Parameter '{system}.{parameter}' expects a {expected} value, got {found}")]
    TypeMismatch {
        system: String,
        parameter: String,
        expected: ValueKind,
        found: ValueKind,
    },

    #[error("Evaluation order could not be computed: {what}")]
    CyclicGraph { what: String },

    #[error("System '{system}' failed to step at t={time}: {message}")]
    StepFailure {
        system: String,
        time: f64,
        message: String,
    },

    #[error("System '{system}': {message}")]
    Entity { system: String, message: String },

    #[error("Invalid simulator state: {what}")]
    InvalidState { what: &'static str },
}

impl SimError {
    pub(crate) fn invalid_config(what: impl Into<String>) -> Self {
        Self::InvalidConfig { what: what.into() }
    }

    pub(crate) fn unknown_reference(what: impl Into<String>) -> Self {
        Self::UnknownReference { what: what.into() }
    }

    /// Attach the system name (and step time, for step failures) to an entity error.
    pub(crate) fn from_entity(system: &str, time: Option<f64>, err: EntityError) -> Self {
        let system = system.to_string();
        match err {
            EntityError::UnknownParameter { name } => Self::UnknownParameter {
                system,
                parameter: name,
            },
            EntityError::TypeMismatch {
                name,
                expected,
                found,
            } => Self::TypeMismatch {
                system,
                parameter: name,
                expected,
                found,
            },
            EntityError::StepFailure { message } | EntityError::Backend { message } => {
                match time {
                    Some(time) => Self::StepFailure {
                        system,
                        time,
                        message,
                    },
                    None => Self::Entity { system, message },
                }
            }
        }
    }
}

impl From<GraphError> for SimError {
    fn from(e: GraphError) -> Self {
        match e {
            GraphError::UnknownSystem { .. } => SimError::UnknownReference {
                what: e.to_string(),
            },
            GraphError::Cyclic { .. } => SimError::CyclicGraph {
                what: e.to_string(),
            },
            GraphError::DuplicateSystem { .. } | GraphError::DuplicateDriver { .. } => {
                SimError::InvalidConfig {
                    what: e.to_string(),
                }
            }
        }
    }
}

impl From<cs_core::CoreError> for SimError {
    fn from(e: cs_core::CoreError) -> Self {
        SimError::InvalidConfig {
            what: e.to_string(),
        }
    }
}
