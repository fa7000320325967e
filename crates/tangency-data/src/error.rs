//! Error types for data operations.

use tangency_risk::RiskError;
use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while loading price histories.
#[derive(Debug, Error)]
pub enum DataError {
    /// Yahoo Finance API error
    #[error("Yahoo Finance API error: {0}")]
    YahooApi(String),

    /// A symbol returned no usable prices
    #[error("Insufficient data for {symbol}: {source}")]
    InsufficientData {
        /// Symbol that was queried
        symbol: String,
        /// Underlying engine error
        #[source]
        source: RiskError,
    },

    /// Series construction failed
    #[error(transparent)]
    Series(#[from] RiskError),

    /// Data parsing error
    #[error("Data parsing error: {0}")]
    Parse(String),

    /// Invalid date range
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange {
        /// Start date of the range
        start: String,
        /// End date of the range
        end: String,
    },

    /// Time conversion error
    #[error("Time conversion error: {0}")]
    TimeConversion(String),

    /// Invalid or unknown symbol
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DataError {
    /// An empty or unusable history for one symbol.
    pub fn empty_history(symbol: &str, actual: usize) -> Self {
        Self::InsufficientData {
            symbol: symbol.to_string(),
            source: RiskError::insufficient_observations(2, actual),
        }
    }

    /// Whether the failure means there was not enough data to analyze.
    pub const fn is_insufficient_data(&self) -> bool {
        match self {
            Self::InsufficientData { .. } => true,
            Self::Series(err) => err.is_insufficient_data(),
            _ => false,
        }
    }
}

impl From<yahoo_finance_api::YahooError> for DataError {
    fn from(err: yahoo_finance_api::YahooError) -> Self {
        Self::YahooApi(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_history_is_insufficient() {
        let err = DataError::empty_history("AAPL", 0);
        assert!(err.is_insufficient_data());
        assert!(err.to_string().contains("AAPL"));
    }

    #[test]
    fn test_series_errors_pass_through() {
        let err = DataError::from(RiskError::no_assets());
        assert!(err.is_insufficient_data());
        assert!(!DataError::Parse("bad".to_string()).is_insufficient_data());
    }
}
