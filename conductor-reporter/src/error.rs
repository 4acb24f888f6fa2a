//! Error types for conductor-reporter.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    /// JSON serialization error while building the machine-readable summary.
    #[error("summary serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
