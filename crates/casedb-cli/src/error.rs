//! CLI error type.

use thiserror::Error;

/// Errors surfaced to the command line.
#[derive(Debug, Error)]
pub enum CliError {
    /// Engine or storage failure.
    #[error(transparent)]
    Core(#[from] casedb_core::Error),

    /// File could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Input or config file was not valid JSON.
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
}
