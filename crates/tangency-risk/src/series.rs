//! Aligned price and return tables
//!
//! Both tables share the same layout: one row per trading date, one column per
//! asset. A price cell that is not finite marks a missing observation. Return
//! tables never contain missing values: any date whose return is undefined for
//! at least one asset is removed for every asset.
//!
//! The simple return for asset i at date t is:
//! r_{t,i} = (p_{t,i} - p_{t-1,i}) / p_{t-1,i}

use crate::error::{Result, RiskError};
use chrono::NaiveDate;
use ndarray::{Array2, ArrayView1, Axis};
use std::collections::HashSet;
use tracing::debug;

/// Historical prices, dates x assets, missing cells are non-finite
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    assets: Vec<String>,
    dates: Vec<NaiveDate>,
    prices: Array2<f64>,
}

/// Period-over-period simple returns, dates x assets, every cell finite
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnSeries {
    assets: Vec<String>,
    dates: Vec<NaiveDate>,
    values: Array2<f64>,
}

impl PriceSeries {
    /// Create a price series from a (dates x assets) matrix.
    ///
    /// Use `f64::NAN` for a missing price.
    ///
    /// # Errors
    /// * `InsufficientData` when `assets` is empty
    /// * `DimensionMismatch` when the matrix shape disagrees with the axes
    /// * `InvalidParameter` for duplicate assets or unordered dates
    pub fn new(assets: Vec<String>, dates: Vec<NaiveDate>, prices: Array2<f64>) -> Result<Self> {
        validate_axes(&assets, &dates, prices.dim())?;
        Ok(Self {
            assets,
            dates,
            prices,
        })
    }

    /// Create a price series from one price column per asset.
    pub fn from_columns(
        assets: Vec<String>,
        dates: Vec<NaiveDate>,
        columns: &[Vec<f64>],
    ) -> Result<Self> {
        if columns.len() != assets.len() {
            return Err(RiskError::DimensionMismatch {
                expected: assets.len(),
                actual: columns.len(),
            });
        }

        let n_dates = dates.len();
        let mut prices = Array2::<f64>::from_elem((n_dates, assets.len()), f64::NAN);
        for (j, column) in columns.iter().enumerate() {
            if column.len() != n_dates {
                return Err(RiskError::DimensionMismatch {
                    expected: n_dates,
                    actual: column.len(),
                });
            }
            for (t, &price) in column.iter().enumerate() {
                prices[[t, j]] = price;
            }
        }

        Self::new(assets, dates, prices)
    }

    /// Asset identifiers, in column order
    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    /// Trading dates, in row order
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Raw price matrix
    pub const fn prices(&self) -> &Array2<f64> {
        &self.prices
    }

    /// Number of assets
    pub const fn n_assets(&self) -> usize {
        self.assets.len()
    }

    /// Number of dates
    pub const fn n_dates(&self) -> usize {
        self.dates.len()
    }

    /// Number of missing price cells
    pub fn missing_count(&self) -> usize {
        self.prices.iter().filter(|p| !p.is_finite()).count()
    }
}

impl ReturnSeries {
    /// Create a return series directly from a (dates x assets) matrix.
    ///
    /// # Errors
    /// * `InsufficientData` when there are no assets or no rows
    /// * `DimensionMismatch` when the matrix shape disagrees with the axes
    /// * `InvalidParameter` for non-finite values, duplicate assets or unordered dates
    pub fn new(assets: Vec<String>, dates: Vec<NaiveDate>, values: Array2<f64>) -> Result<Self> {
        validate_axes(&assets, &dates, values.dim())?;

        if dates.is_empty() {
            return Err(RiskError::insufficient_observations(1, 0));
        }

        if let Some(((t, j), v)) = values.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(RiskError::InvalidParameter(format!(
                "return for {} on {} is not finite ({v})",
                assets[j], dates[t]
            )));
        }

        Ok(Self {
            assets,
            dates,
            values,
        })
    }

    /// Asset identifiers, in column order
    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    /// Dates of the retained observations
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Return matrix (T x N)
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Number of assets
    pub const fn n_assets(&self) -> usize {
        self.assets.len()
    }

    /// Number of observations (rows)
    pub fn n_observations(&self) -> usize {
        self.values.nrows()
    }

    /// Return column for one asset
    pub fn column(&self, asset: usize) -> ArrayView1<'_, f64> {
        self.values.column(asset)
    }

    /// Column index of an asset identifier
    pub fn asset_index(&self, asset: &str) -> Option<usize> {
        self.assets.iter().position(|a| a == asset)
    }
}

/// Compute simple period returns from a price series.
///
/// The first date is consumed as the base price. A date is dropped for all
/// assets when any asset has a missing current or prior price, or a zero prior
/// price.
///
/// # Errors
/// * `InsufficientData` with fewer than 2 dates, or when every date is dropped
pub fn compute_returns(prices: &PriceSeries) -> Result<ReturnSeries> {
    let n_dates = prices.n_dates();
    if n_dates < 2 {
        return Err(RiskError::insufficient_observations(2, n_dates));
    }

    let matrix = prices.prices();
    let n_assets = prices.n_assets();
    let mut kept_dates = Vec::with_capacity(n_dates - 1);
    let mut data = Vec::with_capacity((n_dates - 1) * n_assets);

    for t in 1..n_dates {
        let prev = matrix.row(t - 1);
        let curr = matrix.row(t);
        let row: Option<Vec<f64>> = prev
            .iter()
            .zip(curr.iter())
            .map(|(&p0, &p1)| simple_return(p0, p1))
            .collect();

        if let Some(row) = row {
            kept_dates.push(prices.dates()[t]);
            data.extend(row);
        }
    }

    let dropped = (n_dates - 1) - kept_dates.len();
    if dropped > 0 {
        debug!(dropped, kept = kept_dates.len(), "dropped return rows with undefined values");
    }

    if kept_dates.is_empty() {
        return Err(RiskError::insufficient_observations(1, 0));
    }

    let values = Array2::from_shape_vec((kept_dates.len(), n_assets), data)
        .map_err(|e| RiskError::InvalidParameter(e.to_string()))?;

    ReturnSeries::new(prices.assets().to_vec(), kept_dates, values)
}

fn simple_return(prev: f64, curr: f64) -> Option<f64> {
    if !prev.is_finite() || !curr.is_finite() || prev == 0.0 {
        return None;
    }
    let r = (curr - prev) / prev;
    r.is_finite().then_some(r)
}

fn validate_axes(assets: &[String], dates: &[NaiveDate], dim: (usize, usize)) -> Result<()> {
    if assets.is_empty() {
        return Err(RiskError::no_assets());
    }

    let (rows, cols) = dim;
    if cols != assets.len() {
        return Err(RiskError::DimensionMismatch {
            expected: assets.len(),
            actual: cols,
        });
    }
    if rows != dates.len() {
        return Err(RiskError::DimensionMismatch {
            expected: dates.len(),
            actual: rows,
        });
    }

    let mut seen = HashSet::with_capacity(assets.len());
    for asset in assets {
        if !seen.insert(asset.as_str()) {
            return Err(RiskError::InvalidParameter(format!(
                "duplicate asset identifier: {asset}"
            )));
        }
    }

    if let Some(pair) = dates.windows(2).find(|w| w[0] >= w[1]) {
        return Err(RiskError::InvalidParameter(format!(
            "dates must be strictly increasing ({} then {})",
            pair[0], pair[1]
        )));
    }

    Ok(())
}

/// Column means of a return matrix.
pub(crate) fn column_means(values: &Array2<f64>) -> ndarray::Array1<f64> {
    values
        .mean_axis(Axis(0))
        .unwrap_or_else(|| ndarray::Array1::zeros(values.ncols()))
}
