use thiserror::Error;

use crate::models::ReportLine;

/// Run-level failures. Per-row lookup problems never surface here; they end up
/// as `NotFound` / `ApiError` tiers in the report instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("BOM is missing the required column '{column}'")]
    Schema { column: String },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("failed to read BOM: {0}")]
    Read(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to write report: {0}")]
    Report(String),

    #[error("run cancelled after {} of {total} rows", .completed.len())]
    Cancelled {
        completed: Vec<ReportLine>,
        total: usize,
    },
}

impl Error {
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration(message.into())
    }

    pub fn report(message: impl Into<String>) -> Self {
        Error::Report(message.into())
    }
}
