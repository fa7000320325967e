//! Error type for the analysis pipeline.

use tangency_data::DataError;
use tangency_output::{ExportError, ReportError};
use tangency_risk::RiskError;
use thiserror::Error;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Errors surfaced by configuration loading and `analyze`.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Engine error
    #[error(transparent)]
    Risk(#[from] RiskError),

    /// Price loading error
    #[error(transparent)]
    Data(#[from] DataError),

    /// Report generation error
    #[error(transparent)]
    Report(#[from] ReportError),

    /// Export error
    #[error(transparent)]
    Export(#[from] ExportError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Configuration file could not be parsed
    #[error("Configuration parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AnalysisError {
    /// Whether the failure means there was not enough data to analyze.
    pub const fn is_insufficient_data(&self) -> bool {
        match self {
            Self::Risk(err) => err.is_insufficient_data(),
            Self::Data(err) => err.is_insufficient_data(),
            _ => false,
        }
    }
}
