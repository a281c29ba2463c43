//! Result export.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use cs_sim::SimulationResults;

use crate::error::{AppError, AppResult};

/// Output format for exported results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    /// Guess from a file extension; CSV unless the path ends in `.json`.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => ExportFormat::Json,
            _ => ExportFormat::Csv,
        }
    }
}

pub fn write_csv(path: &Path, results: &SimulationResults) -> AppResult<()> {
    let wrap = |source| AppError::Export {
        path: path.to_path_buf(),
        source,
    };
    let mut out = BufWriter::new(File::create(path).map_err(wrap)?);
    results.write_csv(&mut out).map_err(wrap)?;
    out.flush().map_err(wrap)
}

pub fn to_json(results: &SimulationResults) -> AppResult<String> {
    Ok(serde_json::to_string_pretty(results)?)
}

pub fn write_json(path: &Path, results: &SimulationResults) -> AppResult<()> {
    let content = to_json(results)?;
    std::fs::write(path, content).map_err(|source| AppError::Export {
        path: path.to_path_buf(),
        source,
    })
}

pub fn write(path: &Path, results: &SimulationResults, format: ExportFormat) -> AppResult<()> {
    match format {
        ExportFormat::Csv => write_csv(path, results),
        ExportFormat::Json => write_json(path, results),
    }
}
