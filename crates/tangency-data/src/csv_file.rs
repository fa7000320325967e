//! Wide CSV price files.
//!
//! The first column holds ISO dates (`%Y-%m-%d`), each following column one
//! symbol's prices:
//!
//! ```text
//! date,AAPL,MSFT
//! 2020-01-02,75.09,160.62
//! 2020-01-03,74.36,
//! ```
//!
//! Empty cells, `NaN` and `null` are missing prices.

use crate::error::{DataError, Result};
use crate::source::{PriceRequest, PriceSource};
use chrono::NaiveDate;
use std::future::Future;
use std::io::Read;
use std::path::{Path, PathBuf};
use tangency_risk::{PriceSeries, RiskError};
use tracing::{debug, info};

/// Date format of the first column
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Price source reading a wide CSV file.
#[derive(Debug, Clone)]
pub struct CsvPriceSource {
    path: PathBuf,
}

impl CsvPriceSource {
    /// Create a source for the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PriceSource for CsvPriceSource {
    fn fetch_prices(
        &self,
        request: &PriceRequest,
    ) -> impl Future<Output = Result<PriceSeries>> + Send {
        async move {
            let bytes = tokio::fs::read(&self.path).await?;
            info!(path = %self.path.display(), bytes = bytes.len(), "loaded price file");
            read_prices(bytes.as_slice(), request)
        }
    }
}

/// Parse a wide CSV and select the requested symbols and dates.
///
/// # Errors
/// * `InvalidSymbol` when a requested symbol has no column
/// * `Parse` for malformed dates, prices or duplicate dates
/// * `InsufficientData` when a requested column has no prices in range
pub fn read_prices<R: Read>(reader: R, request: &PriceRequest) -> Result<PriceSeries> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let column_of = |symbol: &str| {
        headers
            .iter()
            .skip(1)
            .position(|h| h == symbol)
            .map(|i| i + 1)
            .ok_or_else(|| DataError::InvalidSymbol(format!("{symbol} not found in price file")))
    };
    let columns = request
        .symbols()
        .iter()
        .map(|s| column_of(s))
        .collect::<Result<Vec<usize>>>()?;

    let mut dates: Vec<NaiveDate> = Vec::new();
    let mut values: Vec<Vec<f64>> = vec![Vec::new(); columns.len()];

    for (line, record) in csv_reader.records().enumerate() {
        let record = record?;
        let raw_date = record.get(0).unwrap_or_default();
        let date = NaiveDate::parse_from_str(raw_date, DATE_FORMAT)
            .map_err(|e| DataError::Parse(format!("row {}: date {raw_date:?}: {e}", line + 2)))?;

        if !request.contains(date) {
            continue;
        }

        for (value, &col) in values.iter_mut().zip(&columns) {
            value.push(parse_price(record.get(col).unwrap_or_default(), line + 2)?);
        }
        dates.push(date);
    }

    // Files may be written newest first
    let mut order: Vec<usize> = (0..dates.len()).collect();
    order.sort_by_key(|&i| dates[i]);
    if let Some(pair) = order.windows(2).find(|w| dates[w[0]] == dates[w[1]]) {
        return Err(DataError::Parse(format!("duplicate date {}", dates[pair[0]])));
    }
    let dates: Vec<NaiveDate> = order.iter().map(|&i| dates[i]).collect();
    let values: Vec<Vec<f64>> = values
        .into_iter()
        .map(|column| order.iter().map(|&i| column[i]).collect())
        .collect();

    for (symbol, column) in request.symbols().iter().zip(&values) {
        let present = column.iter().filter(|p| p.is_finite()).count();
        if present == 0 {
            return Err(DataError::empty_history(symbol, 0));
        }
        debug!(symbol = %symbol, present, rows = column.len(), "parsed price column");
    }

    if dates.len() < 2 {
        return Err(RiskError::insufficient_observations(2, dates.len()).into());
    }

    Ok(PriceSeries::from_columns(
        request.symbols().to_vec(),
        dates,
        &values,
    )?)
}

fn parse_price(cell: &str, row: usize) -> Result<f64> {
    if cell.is_empty() || cell.eq_ignore_ascii_case("nan") || cell.eq_ignore_ascii_case("null") {
        return Ok(f64::NAN);
    }
    cell.parse::<f64>()
        .map_err(|e| DataError::Parse(format!("row {row}: price {cell:?}: {e}")))
}
