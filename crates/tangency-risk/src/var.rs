//! Historical Value-at-Risk
//!
//! VaR at level α is the empirical α-quantile of the return distribution, a
//! return (typically negative) that is undercut in only α of the historical
//! periods. Quantiles use linear interpolation between order statistics: for a
//! sample sorted ascending, x_(0) <= ... <= x_(n-1), the quantile sits at
//! position h = α * (n - 1) and equals
//!
//! x_(⌊h⌋) + (h - ⌊h⌋) * (x_(⌊h⌋+1) - x_(⌊h⌋))

use crate::error::{Result, RiskError};
use crate::series::ReturnSeries;
use crate::weights::WeightVector;
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

/// Default VaR level (95% confidence)
pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.05;

/// Per-asset historical VaR
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarVector {
    /// Quantile level used for every asset
    pub confidence_level: f64,
    /// Asset identifiers, aligned with `values`
    pub assets: Vec<String>,
    /// One quantile per asset
    pub values: Array1<f64>,
}

impl VarVector {
    /// VaR of one asset by identifier
    pub fn get(&self, asset: &str) -> Option<f64> {
        self.assets
            .iter()
            .position(|a| a == asset)
            .map(|i| self.values[i])
    }

    /// Iterate (asset, VaR) pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.assets
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

/// Check that a VaR level lies strictly between 0 and 1.
pub fn validate_confidence_level(confidence_level: f64) -> Result<()> {
    if confidence_level > 0.0 && confidence_level < 1.0 {
        Ok(())
    } else {
        Err(RiskError::InvalidParameter(format!(
            "confidence level must be in (0, 1), got {confidence_level}"
        )))
    }
}

/// Empirical quantile with linear interpolation.
///
/// # Errors
/// * `InsufficientData` for an empty sample
/// * `InvalidParameter` when `level` is outside `[0, 1]` or the sample holds NaN
pub fn quantile(sample: ArrayView1<'_, f64>, level: f64) -> Result<f64> {
    if sample.is_empty() {
        return Err(RiskError::insufficient_observations(1, 0));
    }
    if !(0.0..=1.0).contains(&level) {
        return Err(RiskError::InvalidParameter(format!(
            "quantile level must be in [0, 1], got {level}"
        )));
    }
    if sample.iter().any(|x| x.is_nan()) {
        return Err(RiskError::InvalidParameter(
            "quantile sample contains NaN".to_string(),
        ));
    }

    let mut sorted = sample.to_vec();
    sorted.sort_by(f64::total_cmp);

    let position = level * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = (lower + 1).min(sorted.len() - 1);
    let fraction = position - lower as f64;

    Ok(sorted[lower] + fraction * (sorted[upper] - sorted[lower]))
}

/// Per-asset historical VaR of a return series.
///
/// # Errors
/// * `InvalidParameter` when `confidence_level` is outside (0, 1)
pub fn historical_var(returns: &ReturnSeries, confidence_level: f64) -> Result<VarVector> {
    validate_confidence_level(confidence_level)?;

    let values = (0..returns.n_assets())
        .map(|i| quantile(returns.column(i), confidence_level))
        .collect::<Result<Vec<f64>>>()?;

    Ok(VarVector {
        confidence_level,
        assets: returns.assets().to_vec(),
        values: Array1::from_vec(values),
    })
}

/// Historical VaR of the weighted portfolio return series.
///
/// Unlike an average of per-asset quantiles, this accounts for
/// diversification across the assets.
///
/// # Errors
/// * `DimensionMismatch` when the weights do not match the asset count
/// * `InvalidParameter` when `confidence_level` is outside (0, 1)
pub fn portfolio_historical_var(
    returns: &ReturnSeries,
    weights: &WeightVector,
    confidence_level: f64,
) -> Result<f64> {
    validate_confidence_level(confidence_level)?;
    let portfolio = crate::stats::portfolio_returns(weights, returns)?;
    quantile(portfolio.view(), confidence_level)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::tests::{names, trading_days};
    use approx::assert_abs_diff_eq;
    use ndarray::{Array2, array};
    use rstest::rstest;

    fn sample_returns() -> ReturnSeries {
        ReturnSeries::new(
            names(2),
            trading_days(5),
            array![
                [0.01, 0.00],
                [-0.02, 0.01],
                [0.03, -0.01],
                [0.01, 0.02],
                [-0.01, 0.00]
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_linear_interpolation() {
        let sample = array![4.0, 1.0, 3.0, 2.0];
        // position 0.05 * 3 = 0.15 between 1 and 2
        assert_abs_diff_eq!(quantile(sample.view(), 0.05).unwrap(), 1.15, epsilon = 1e-12);
        assert_abs_diff_eq!(quantile(sample.view(), 0.5).unwrap(), 2.5, epsilon = 1e-12);
        assert_abs_diff_eq!(quantile(sample.view(), 1.0).unwrap(), 4.0);
        assert_abs_diff_eq!(quantile(sample.view(), 0.0).unwrap(), 1.0);
    }

    #[test]
    fn test_single_observation() {
        assert_abs_diff_eq!(quantile(array![-0.03].view(), 0.05).unwrap(), -0.03);
    }

    #[test]
    fn test_historical_var_per_asset() {
        let var = historical_var(&sample_returns(), 0.05).unwrap();
        // A sorted: -0.02, -0.01, 0.01, 0.01, 0.03 -> position 0.2
        assert_abs_diff_eq!(var.values[0], -0.018, epsilon = 1e-12);
        // B sorted: -0.01, 0.00, 0.00, 0.01, 0.02 -> position 0.2
        assert_abs_diff_eq!(var.values[1], -0.008, epsilon = 1e-12);
        assert_eq!(var.get("A1"), Some(var.values[1]));
        assert_eq!(var.iter().count(), 2);
    }

    #[rstest]
    #[case(0.0)]
    #[case(1.0)]
    #[case(-0.05)]
    #[case(1.5)]
    #[case(f64::NAN)]
    fn test_rejects_confidence_outside_unit_interval(#[case] level: f64) {
        assert!(matches!(
            historical_var(&sample_returns(), level),
            Err(RiskError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_var_is_monotone_in_level() {
        let values = Array2::from_shape_fn((50, 1), |(t, _)| ((t * 37) % 50) as f64 / 100.0 - 0.25);
        let returns = ReturnSeries::new(names(1), trading_days(50), values).unwrap();

        let levels = [0.01, 0.05, 0.10];
        let vars: Vec<f64> = levels
            .iter()
            .map(|&l| historical_var(&returns, l).unwrap().values[0])
            .collect();
        assert!(vars[0] <= vars[1] && vars[1] <= vars[2]);
    }

    #[test]
    fn test_portfolio_var_diversifies() {
        let returns = sample_returns();
        let weights = WeightVector::uniform(2).unwrap();
        let joint = portfolio_historical_var(&returns, &weights, 0.05).unwrap();
        let per_asset = historical_var(&returns, 0.05).unwrap();
        let average = per_asset.values.mean().unwrap();
        assert!(joint >= average);
    }
}
