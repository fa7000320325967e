//! Price source abstraction and date alignment.

use crate::error::{DataError, Result};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::future::Future;
use tangency_risk::{PriceSeries, RiskError};
use tracing::debug;

/// Symbols and closed date range to load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceRequest {
    symbols: Vec<String>,
    start: NaiveDate,
    end: NaiveDate,
}

impl PriceRequest {
    /// Create a validated request.
    ///
    /// # Errors
    /// * `Series(InsufficientData)` when `symbols` is empty
    /// * `InvalidSymbol` for blank or duplicate symbols
    /// * `InvalidDateRange` when `start` is after `end`
    pub fn new(symbols: Vec<String>, start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if symbols.is_empty() {
            return Err(RiskError::no_assets().into());
        }

        let mut seen = HashSet::with_capacity(symbols.len());
        for symbol in &symbols {
            if symbol.trim().is_empty() {
                return Err(DataError::InvalidSymbol("Empty symbol".to_string()));
            }
            if !seen.insert(symbol.as_str()) {
                return Err(DataError::InvalidSymbol(format!("duplicate symbol {symbol}")));
            }
        }

        if start > end {
            return Err(DataError::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }

        Ok(Self {
            symbols,
            start,
            end,
        })
    }

    /// Requested symbols, in output column order
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// First date (inclusive)
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last date (inclusive)
    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    /// Whether a date falls inside the range
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Dated prices for a single symbol
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolHistory {
    /// Ticker symbol
    pub symbol: String,
    /// Prices keyed by date
    pub prices: BTreeMap<NaiveDate, f64>,
}

impl SymbolHistory {
    /// Build a history, later duplicates of a date overwrite earlier ones.
    pub fn new(symbol: impl Into<String>, observations: impl IntoIterator<Item = (NaiveDate, f64)>) -> Self {
        Self {
            symbol: symbol.into(),
            prices: observations.into_iter().collect(),
        }
    }

    /// Number of dated prices
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    /// Whether no prices were loaded
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

/// A provider of aligned historical prices.
pub trait PriceSource {
    /// Load prices for every requested symbol over the requested range.
    ///
    /// Columns follow the request's symbol order. Missing or empty results
    /// are reported as insufficient data.
    fn fetch_prices(
        &self,
        request: &PriceRequest,
    ) -> impl Future<Output = Result<PriceSeries>> + Send;
}

/// Join per-symbol histories on the union of their dates.
///
/// A date absent from one symbol's history becomes a missing cell for that
/// symbol; nothing is forward-filled.
///
/// # Errors
/// * `InsufficientData` when a symbol has no prices
/// * `Series(InsufficientData)` with fewer than 2 dates overall
pub fn align_histories(histories: &[SymbolHistory]) -> Result<PriceSeries> {
    if histories.is_empty() {
        return Err(RiskError::no_assets().into());
    }

    if let Some(empty) = histories.iter().find(|h| h.is_empty()) {
        return Err(DataError::empty_history(&empty.symbol, 0));
    }

    let dates: Vec<NaiveDate> = histories
        .iter()
        .flat_map(|h| h.prices.keys().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    if dates.len() < 2 {
        return Err(RiskError::insufficient_observations(2, dates.len()).into());
    }

    let row_of: HashMap<NaiveDate, usize> =
        dates.iter().enumerate().map(|(i, d)| (*d, i)).collect();

    let columns: Vec<Vec<f64>> = histories
        .iter()
        .map(|history| {
            let mut column = vec![f64::NAN; dates.len()];
            for (date, price) in &history.prices {
                column[row_of[date]] = *price;
            }
            let gaps = dates.len() - history.len();
            if gaps > 0 {
                debug!(symbol = %history.symbol, gaps, "history has dates missing from other symbols");
            }
            column
        })
        .collect();

    let symbols = histories.iter().map(|h| h.symbol.clone()).collect();
    Ok(PriceSeries::from_columns(symbols, dates, &columns)?)
}
