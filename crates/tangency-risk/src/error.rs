//! Error types for the risk engine.

use crate::optimizer::OptimizerStatus;
use thiserror::Error;

/// Result type for risk engine operations.
pub type Result<T> = std::result::Result<T, RiskError>;

/// Errors raised by the return, statistics, optimizer and VaR components.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RiskError {
    /// Fewer observations (or assets) than the operation needs
    #[error("Insufficient data: need at least {required} {unit}, got {actual}")]
    InsufficientData {
        /// What was counted ("observations", "assets", ...)
        unit: &'static str,
        /// Required count
        required: usize,
        /// Actual count
        actual: usize,
    },

    /// Vector or matrix length does not match the asset axis
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },

    /// Out-of-range or malformed parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The optimizer stopped without converging
    #[error("Optimization failed ({status}): {message}")]
    OptimizationFailed {
        /// Terminal solver status
        status: OptimizerStatus,
        /// Human readable detail
        message: String,
        /// Iterate the solver held when it stopped
        last_iterate: Vec<f64>,
        /// Completed iterations
        iterations: usize,
    },
}

impl RiskError {
    /// Shorthand for a missing-observations error.
    pub const fn insufficient_observations(required: usize, actual: usize) -> Self {
        Self::InsufficientData {
            unit: "observations",
            required,
            actual,
        }
    }

    /// Shorthand for an empty asset axis.
    pub const fn no_assets() -> Self {
        Self::InsufficientData {
            unit: "assets",
            required: 1,
            actual: 0,
        }
    }

    /// Whether this is an [`RiskError::InsufficientData`] error.
    pub const fn is_insufficient_data(&self) -> bool {
        matches!(self, Self::InsufficientData { .. })
    }

    /// Last iterate carried by an optimization failure, if any.
    pub fn last_iterate(&self) -> Option<&[f64]> {
        match self {
            Self::OptimizationFailed { last_iterate, .. } => Some(last_iterate),
            _ => None,
        }
    }
}
