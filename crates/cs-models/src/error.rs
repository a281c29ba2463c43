//! Error types for model construction and configuration.

use cs_sim::EntityError;
use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error(transparent)]
    Entity(#[from] EntityError),
}

impl From<ModelError> for EntityError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Entity(inner) => inner,
            other => EntityError::backend(other.to_string()),
        }
    }
}
