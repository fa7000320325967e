//! Risk-free rate sensitivity
//!
//! Two views of how the risk-free rate moves the Sharpe ratio:
//! - fixed weights: the optimal portfolio is held and only the excess return changes
//! - re-optimized: the optimizer runs again at every rate, in parallel

use crate::error::{Result, RiskError};
use crate::optimizer::{OptimizationResult, SharpeOptimizer, validate_risk_free_rate};
use crate::stats::{AnnualizedMoments, PortfolioStats};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Largest number of rates a grid may produce
pub const MAX_GRID_POINTS: usize = 10_000;

/// Evenly spaced risk-free rates, as decimals
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateGrid {
    /// First rate
    pub start: f64,
    /// Last rate (inclusive)
    pub end: f64,
    /// Spacing between rates
    pub step: f64,
}

impl Default for RateGrid {
    /// 0% to 5% in 0.1% increments
    fn default() -> Self {
        Self {
            start: 0.0,
            end: 0.05,
            step: 0.001,
        }
    }
}

impl RateGrid {
    /// Materialize the grid.
    ///
    /// # Errors
    /// * `InvalidParameter` for a non-positive step, non-finite bounds, `start > end`
    ///   or more than [`MAX_GRID_POINTS`] rates
    pub fn rates(&self) -> Result<Vec<f64>> {
        if !(self.step.is_finite() && self.step > 0.0) {
            return Err(RiskError::InvalidParameter(format!(
                "rate grid step must be positive, got {}",
                self.step
            )));
        }
        if !self.start.is_finite() || !self.end.is_finite() || self.start > self.end {
            return Err(RiskError::InvalidParameter(format!(
                "invalid rate grid bounds [{}, {}]",
                self.start, self.end
            )));
        }

        // Index-based to avoid accumulating rounding error
        let intervals = ((self.end - self.start) / self.step + 1e-9).floor();
        if intervals >= MAX_GRID_POINTS as f64 {
            return Err(RiskError::InvalidParameter(format!(
                "rate grid [{}, {}] with step {} exceeds {MAX_GRID_POINTS} points",
                self.start, self.end, self.step
            )));
        }
        let count = intervals as usize + 1;
        Ok((0..count)
            .map(|i| self.start + i as f64 * self.step)
            .collect())
    }
}

/// Sharpe ratio of a fixed portfolio at one risk-free rate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensitivityPoint {
    /// Risk-free rate
    pub risk_free_rate: f64,
    /// Sharpe ratio at that rate
    pub sharpe_ratio: f64,
}

/// Sharpe ratio of fixed portfolio statistics across risk-free rates.
///
/// # Errors
/// * `InvalidParameter` when any rate is not finite
pub fn fixed_weight_sensitivity(
    stats: &PortfolioStats,
    rates: &[f64],
) -> Result<Vec<SensitivityPoint>> {
    rates
        .iter()
        .map(|&rate| {
            validate_risk_free_rate(rate)?;
            Ok(SensitivityPoint {
                risk_free_rate: rate,
                sharpe_ratio: stats.sharpe_ratio(rate),
            })
        })
        .collect()
}

/// Outcome of re-optimizing at one risk-free rate
#[derive(Debug, Clone)]
pub struct ReoptimizedPoint {
    /// Risk-free rate
    pub risk_free_rate: f64,
    /// Optimization outcome at that rate
    pub result: Result<OptimizationResult>,
}

/// Re-run the optimizer at each rate on the rayon pool.
///
/// Scenarios share only immutable inputs. Each rate keeps its own result, so
/// one failed scenario does not hide the others. Output order matches `rates`.
pub fn reoptimized_sensitivity(
    moments: &AnnualizedMoments,
    optimizer: &SharpeOptimizer,
    rates: &[f64],
) -> Vec<ReoptimizedPoint> {
    rates
        .par_iter()
        .map(|&rate| ReoptimizedPoint {
            risk_free_rate: rate,
            result: optimizer.optimize(moments, rate),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::ReturnSeries;
    use crate::series::tests::{names, trading_days};
    use crate::stats::PortfolioEvaluator;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_default_grid_matches_slider() {
        let rates = RateGrid::default().rates().unwrap();
        assert_eq!(rates.len(), 51);
        assert_eq!(rates[0], 0.0);
        assert_abs_diff_eq!(rates[10], 0.01, epsilon = 1e-12);
        assert_abs_diff_eq!(*rates.last().unwrap(), 0.05, epsilon = 1e-12);
    }

    #[test]
    fn test_invalid_grid() {
        let grid = RateGrid {
            start: 0.05,
            end: 0.0,
            step: 0.01,
        };
        assert!(grid.rates().is_err());
        let grid = RateGrid {
            step: 0.0,
            ..Default::default()
        };
        assert!(grid.rates().is_err());
    }

    #[test]
    fn test_oversized_grid_is_rejected() {
        let huge = RateGrid {
            start: 0.0,
            end: 1e300,
            step: 1e-300,
        };
        assert!(matches!(huge.rates(), Err(RiskError::InvalidParameter(_))));

        let dense = RateGrid {
            step: 1e-12,
            ..Default::default()
        };
        assert!(matches!(dense.rates(), Err(RiskError::InvalidParameter(_))));

        let at_cap = RateGrid {
            start: 0.0,
            end: (MAX_GRID_POINTS - 1) as f64,
            step: 1.0,
        };
        assert_eq!(at_cap.rates().unwrap().len(), MAX_GRID_POINTS);
    }

    #[test]
    fn test_fixed_weight_sensitivity_is_decreasing() {
        let stats = PortfolioStats {
            annualized_return: 0.15,
            annualized_volatility: 0.25,
        };
        let points = fixed_weight_sensitivity(&stats, &RateGrid::default().rates().unwrap())
            .unwrap();
        assert!(
            points
                .windows(2)
                .all(|w| w[1].sharpe_ratio < w[0].sharpe_ratio)
        );
        assert_abs_diff_eq!(points[0].sharpe_ratio, 0.6, epsilon = 1e-12);
        assert!(fixed_weight_sensitivity(&stats, &[f64::INFINITY]).is_err());
    }

    #[test]
    fn test_reoptimized_sensitivity_keeps_order() {
        let returns = ReturnSeries::new(
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
        .unwrap();
        let moments = PortfolioEvaluator::default().moments(&returns).unwrap();
        let rates = [0.0, 0.02, 0.04, f64::NAN];

        let points = reoptimized_sensitivity(&moments, &SharpeOptimizer::default(), &rates);

        assert_eq!(points.len(), 4);
        for (point, rate) in points.iter().take(3).zip(rates) {
            assert_eq!(point.risk_free_rate, rate);
            let result = point.result.as_ref().unwrap();
            assert_abs_diff_eq!(result.weights.as_array().sum(), 1.0, epsilon = 1e-9);
        }
        assert!(points[3].result.is_err());
    }
}
