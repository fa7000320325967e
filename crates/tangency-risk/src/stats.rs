//! Mean-variance portfolio statistics
//!
//! Expected return and volatility are annualized by a periods-per-year factor:
//!
//! μ_p = Σ_i w_i * mean(r_i) * A
//! σ_p = sqrt(w^T * (S * A) * w)
//!
//! where S is the sample covariance of the return columns (N-1 denominator)
//! and A is the annualization factor (252 trading days by default).

use crate::error::{Result, RiskError};
use crate::series::{ReturnSeries, column_means};
use crate::weights::WeightVector;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

/// Trading days per year, the default annualization factor
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Annualized return and volatility of a portfolio
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioStats {
    /// Annualized expected return
    pub annualized_return: f64,
    /// Annualized volatility (never negative)
    pub annualized_volatility: f64,
}

impl PortfolioStats {
    /// Sharpe ratio against a risk-free rate, with the zero-volatility guard.
    pub fn sharpe_ratio(&self, risk_free_rate: f64) -> f64 {
        guarded_ratio(
            self.annualized_return - risk_free_rate,
            self.annualized_volatility,
        )
    }
}

/// Divide an excess return by a volatility without faulting on zero risk.
///
/// With zero volatility the ratio is `+inf` for a positive excess return,
/// `-inf` for a negative one and `0` when the excess return is zero.
pub fn guarded_ratio(excess: f64, volatility: f64) -> f64 {
    if volatility > 0.0 {
        excess / volatility
    } else if excess > 0.0 {
        f64::INFINITY
    } else if excess < 0.0 {
        f64::NEG_INFINITY
    } else {
        0.0
    }
}

/// Sample covariance matrix of the columns of a (T x N) matrix.
///
/// # Errors
/// * `InsufficientData` with fewer than 2 rows
pub fn sample_covariance(values: &Array2<f64>) -> Result<Array2<f64>> {
    let n_obs = values.nrows();
    if n_obs < 2 {
        return Err(RiskError::insufficient_observations(2, n_obs));
    }

    let means = column_means(values);
    let centered = values - &means.insert_axis(Axis(0));
    Ok(centered.t().dot(&centered) / (n_obs - 1) as f64)
}

/// Annualized mean vector and covariance matrix of a return series
#[derive(Debug, Clone, PartialEq)]
pub struct AnnualizedMoments {
    mean: Array1<f64>,
    covariance: Array2<f64>,
}

impl AnnualizedMoments {
    /// Annualized mean return per asset
    pub const fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    /// Annualized covariance matrix
    pub const fn covariance(&self) -> &Array2<f64> {
        &self.covariance
    }

    /// Number of assets
    pub fn n_assets(&self) -> usize {
        self.mean.len()
    }

    /// Annualized volatility of each asset on its own
    pub fn asset_volatilities(&self) -> Array1<f64> {
        self.covariance.diag().mapv(|v| v.max(0.0).sqrt())
    }

    /// Portfolio statistics for an arbitrary weight array.
    ///
    /// # Errors
    /// * `DimensionMismatch` when the weights do not cover every asset
    pub fn stats_for(&self, weights: ArrayView1<'_, f64>) -> Result<PortfolioStats> {
        if weights.len() != self.n_assets() {
            return Err(RiskError::DimensionMismatch {
                expected: self.n_assets(),
                actual: weights.len(),
            });
        }
        Ok(self.stats_unchecked(weights))
    }

    pub(crate) fn stats_unchecked(&self, weights: ArrayView1<'_, f64>) -> PortfolioStats {
        PortfolioStats {
            annualized_return: weights.dot(&self.mean),
            annualized_volatility: self.variance(weights).sqrt(),
        }
    }

    /// w^T Σ w, clamped at zero against rounding
    pub(crate) fn variance(&self, weights: ArrayView1<'_, f64>) -> f64 {
        weights.dot(&self.covariance.dot(&weights)).max(0.0)
    }
}

/// Evaluates annualized portfolio statistics from a return series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortfolioEvaluator {
    annualization_factor: f64,
}

impl Default for PortfolioEvaluator {
    fn default() -> Self {
        Self {
            annualization_factor: TRADING_DAYS_PER_YEAR,
        }
    }
}

impl PortfolioEvaluator {
    /// Create an evaluator with a custom periods-per-year factor.
    ///
    /// # Errors
    /// * `InvalidParameter` when the factor is not finite and positive
    pub fn new(annualization_factor: f64) -> Result<Self> {
        if !annualization_factor.is_finite() || annualization_factor <= 0.0 {
            return Err(RiskError::InvalidParameter(format!(
                "annualization factor must be positive and finite, got {annualization_factor}"
            )));
        }
        Ok(Self {
            annualization_factor,
        })
    }

    /// Periods per year
    pub const fn annualization_factor(&self) -> f64 {
        self.annualization_factor
    }

    /// Annualized mean and covariance of a return series.
    ///
    /// # Errors
    /// * `InsufficientData` with fewer than 2 observations
    pub fn moments(&self, returns: &ReturnSeries) -> Result<AnnualizedMoments> {
        let values = returns.values();
        let covariance = sample_covariance(values)? * self.annualization_factor;
        let mean = column_means(values) * self.annualization_factor;
        Ok(AnnualizedMoments { mean, covariance })
    }

    /// Annualized return and volatility of a weighted portfolio.
    ///
    /// # Errors
    /// * `DimensionMismatch` when the weights do not match the asset count
    /// * `InsufficientData` with fewer than 2 observations
    pub fn evaluate(&self, weights: &WeightVector, returns: &ReturnSeries) -> Result<PortfolioStats> {
        check_dimension(weights, returns)?;
        self.moments(returns)?.stats_for(weights.as_array().view())
    }
}

/// Evaluate with the default 252-day annualization.
pub fn evaluate(weights: &WeightVector, returns: &ReturnSeries) -> Result<PortfolioStats> {
    PortfolioEvaluator::default().evaluate(weights, returns)
}

/// Per-period portfolio return: r_p[t] = Σ_i w_i * r[t, i].
///
/// # Errors
/// * `DimensionMismatch` when the weights do not match the asset count
pub fn portfolio_returns(weights: &WeightVector, returns: &ReturnSeries) -> Result<Array1<f64>> {
    check_dimension(weights, returns)?;
    Ok(returns.values().dot(weights.as_array()))
}

/// Growth of one unit invested: c[t] = Π_{s<=t} (1 + r_p[s]).
pub fn cumulative_returns(portfolio_returns: &Array1<f64>) -> Array1<f64> {
    let mut growth = 1.0;
    portfolio_returns
        .iter()
        .map(|r| {
            growth *= 1.0 + r;
            growth
        })
        .collect()
}

fn check_dimension(weights: &WeightVector, returns: &ReturnSeries) -> Result<()> {
    if weights.len() != returns.n_assets() {
        return Err(RiskError::DimensionMismatch {
            expected: returns.n_assets(),
            actual: weights.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::tests::{names, trading_days};
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn two_assets() -> ReturnSeries {
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
    fn test_sample_covariance() {
        let values = array![[1.0, 2.0], [3.0, 6.0], [5.0, 10.0]];
        let cov = sample_covariance(&values).unwrap();
        // var(x) = 4, var(y) = 16, cov = 8 with N-1
        assert_abs_diff_eq!(cov[[0, 0]], 4.0, epsilon = 1e-12);
        assert_abs_diff_eq!(cov[[1, 1]], 16.0, epsilon = 1e-12);
        assert_abs_diff_eq!(cov[[0, 1]], 8.0, epsilon = 1e-12);
        assert_abs_diff_eq!(cov[[1, 0]], 8.0, epsilon = 1e-12);
    }

    #[test]
    fn test_covariance_needs_two_rows() {
        let err = sample_covariance(&array![[0.1, 0.2]]).unwrap_err();
        assert!(err.is_insufficient_data());
    }

    #[test]
    fn test_evaluate_single_asset_weights() {
        let returns = two_assets();
        let w = WeightVector::new(array![1.0, 0.0]).unwrap();
        let stats = evaluate(&w, &returns).unwrap();

        let mean = 0.02 / 5.0;
        let var = [0.01, -0.02, 0.03, 0.01, -0.01]
            .iter()
            .map(|r| (r - mean) * (r - mean))
            .sum::<f64>()
            / 4.0;

        assert_abs_diff_eq!(stats.annualized_return, mean * 252.0, epsilon = 1e-12);
        assert_abs_diff_eq!(
            stats.annualized_volatility,
            (var * 252.0).sqrt(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_evaluate_is_deterministic() {
        let returns = two_assets();
        let w = WeightVector::new(array![0.3, 0.7]).unwrap();
        let a = evaluate(&w, &returns).unwrap();
        let b = evaluate(&w, &returns).unwrap();
        assert_eq!(a.annualized_return.to_bits(), b.annualized_return.to_bits());
        assert_eq!(
            a.annualized_volatility.to_bits(),
            b.annualized_volatility.to_bits()
        );
    }

    #[test]
    fn test_dimension_mismatch() {
        let returns = two_assets();
        let w = WeightVector::uniform(3).unwrap();
        assert_eq!(
            evaluate(&w, &returns).unwrap_err(),
            RiskError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        );
        assert!(portfolio_returns(&w, &returns).is_err());
    }

    #[test]
    fn test_custom_annualization() {
        let returns = two_assets();
        let w = WeightVector::uniform(2).unwrap();
        let daily = PortfolioEvaluator::new(1.0).unwrap().evaluate(&w, &returns).unwrap();
        let yearly = evaluate(&w, &returns).unwrap();
        assert_abs_diff_eq!(
            yearly.annualized_return,
            daily.annualized_return * 252.0,
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(
            yearly.annualized_volatility,
            daily.annualized_volatility * 252.0_f64.sqrt(),
            epsilon = 1e-12
        );
        assert!(PortfolioEvaluator::new(-252.0).is_err());
        assert!(PortfolioEvaluator::new(f64::NAN).is_err());
    }

    #[test]
    fn test_guarded_ratio() {
        assert_eq!(guarded_ratio(0.1, 0.0), f64::INFINITY);
        assert_eq!(guarded_ratio(-0.1, 0.0), f64::NEG_INFINITY);
        assert_eq!(guarded_ratio(0.0, 0.0), 0.0);
        assert_abs_diff_eq!(guarded_ratio(0.1, 0.2), 0.5);
    }

    #[test]
    fn test_sharpe_decreases_with_risk_free_rate() {
        let stats = PortfolioStats {
            annualized_return: 0.12,
            annualized_volatility: 0.2,
        };
        let mut previous = f64::INFINITY;
        for rf in [0.0, 0.01, 0.02, 0.05] {
            let sharpe = stats.sharpe_ratio(rf);
            assert!(sharpe < previous);
            previous = sharpe;
        }
    }

    #[test]
    fn test_cumulative_returns() {
        let returns = two_assets();
        let w = WeightVector::new(array![0.5, 0.5]).unwrap();
        let port = portfolio_returns(&w, &returns).unwrap();
        assert_abs_diff_eq!(port[0], 0.005, epsilon = 1e-15);
        assert_abs_diff_eq!(port[1], -0.005, epsilon = 1e-15);

        let curve = cumulative_returns(&port);
        assert_abs_diff_eq!(curve[0], 1.005, epsilon = 1e-15);
        assert_abs_diff_eq!(curve[1], 1.005 * 0.995, epsilon = 1e-15);
        assert_eq!(curve.len(), returns.n_observations());
    }
}
