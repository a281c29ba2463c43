//! Application service layer for cosim.
//!
//! Turns a run configuration into a running simulator: instantiates models
//! through the registry, runs with progress reporting, and exports results.

pub mod error;
pub mod export;
pub mod progress;
pub mod registry;
pub mod run_service;

pub use error::{AppError, AppResult};
pub use export::{ExportFormat, write_csv, write_json};
pub use progress::{RunProgressEvent, RunStage};
pub use run_service::{
    OrderReport, RunOutcome, build_simulator, evaluation_order, run_config,
    run_config_with_progress, sim_options,
};
