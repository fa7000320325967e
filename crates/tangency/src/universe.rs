//! Asset universes to analyze.

use serde::{Deserialize, Serialize};

/// Trait for asset universes.
pub trait Universe {
    /// Get all symbols in the universe.
    fn symbols(&self) -> Vec<String>;

    /// Check if a symbol is in the universe.
    fn contains(&self, symbol: &str) -> bool {
        self.symbols().iter().any(|s| s == symbol)
    }

    /// Get the number of constituents.
    fn size(&self) -> usize {
        self.symbols().len()
    }
}

/// Large-cap US technology basket analyzed when no tickers are given.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultUniverse;

impl DefaultUniverse {
    /// Ticker symbols, in column order
    pub const SYMBOLS: [&'static str; 5] = ["AAPL", "MSFT", "GOOGL", "AMZN", "TSLA"];
}

impl Universe for DefaultUniverse {
    fn symbols(&self) -> Vec<String> {
        Self::SYMBOLS.iter().map(|s| s.to_string()).collect()
    }
}
