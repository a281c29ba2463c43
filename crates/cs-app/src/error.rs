//! Error types for the cs-app service layer.

use std::path::PathBuf;

/// Unified error for CLI front ends.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Project error: {0}")]
    Project(String),

    #[error("Failed to build system '{system}': {message}")]
    Build { system: String, message: String },

    #[error("Simulation error: {0}")]
    Simulation(String),

    #[error("Failed to write results to {path}")]
    Export {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<cs_project::ProjectError> for AppError {
    fn from(err: cs_project::ProjectError) -> Self {
        AppError::Project(err.to_string())
    }
}

impl From<cs_project::ValidationError> for AppError {
    fn from(err: cs_project::ValidationError) -> Self {
        AppError::Project(err.to_string())
    }
}

impl From<cs_sim::SimError> for AppError {
    fn from(err: cs_sim::SimError) -> Self {
        AppError::Simulation(err.to_string())
    }
}

impl From<cs_graph::GraphError> for AppError {
    fn from(err: cs_graph::GraphError) -> Self {
        AppError::Project(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}
