//! Maximum Sharpe ratio optimizer
//!
//! Solves
//!
//! min_w  -(μ^T w - r_f) / sqrt(w^T Σ w)
//! s.t.   Σ_i w_i = 1,  0 <= w_i <= 1
//!
//! by projected gradient descent on the probability simplex. Each iteration
//! takes a step against the analytic gradient, projects back onto the simplex
//! and backtracks until the Armijo condition holds. The accepted step length
//! is doubled for the next iteration so the search adapts to the scale of the
//! problem.
//!
//! With S = (μ^T w - r_f) / σ and σ = sqrt(w^T Σ w) the gradient is
//!
//! ∇S = μ / σ - (μ^T w - r_f) * Σ w / σ^3
//!
//! At a zero-volatility iterate the ratio follows the ±inf/0 convention of
//! [`guarded_ratio`](crate::stats::guarded_ratio) and the search direction
//! falls back to the excess-return gradient μ.

mod simplex;

use crate::error::{Result, RiskError};
use crate::series::ReturnSeries;
use crate::stats::{AnnualizedMoments, PortfolioEvaluator, PortfolioStats, guarded_ratio};
use crate::weights::WeightVector;
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};
use simplex::{max_abs_diff, project_onto_simplex};
use std::fmt;
use tracing::{debug, trace};

/// Default risk-free rate used by [`maximize_sharpe`]
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.01;

/// Upper bound on the adaptive step length
const MAX_STEP: f64 = 1e6;

/// Optimizer configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Hard cap on iterations (default: 1000)
    pub max_iterations: usize,

    /// Convergence tolerance on the stationarity measure, the iterate change
    /// and the relative objective change (default: 1e-9)
    pub tolerance: f64,

    /// First trial step length (default: 1.0)
    pub initial_step: f64,

    /// Maximum halvings per line search (default: 60)
    pub max_backtracks: usize,

    /// Sufficient decrease constant of the Armijo rule (default: 1e-4)
    pub armijo: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            tolerance: 1e-9,
            initial_step: 1.0,
            max_backtracks: 60,
            armijo: 1e-4,
        }
    }
}

/// Terminal state of an optimization run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerStatus {
    /// Stationarity, step or objective tolerance reached
    Converged,
    /// No descent left along the projected gradient at a near-stationary point
    Stalled,
    /// Iteration cap exhausted
    IterationLimit,
    /// Line search failed far from a stationary point
    LineSearchFailed,
    /// Objective or gradient became NaN or infinite
    NonFinite,
}

impl OptimizerStatus {
    /// Whether the status yields a usable weight vector
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Converged | Self::Stalled)
    }

    /// Numeric code, stable across releases
    pub const fn code(self) -> i32 {
        match self {
            Self::Converged => 0,
            Self::Stalled => 1,
            Self::IterationLimit => 2,
            Self::LineSearchFailed => 3,
            Self::NonFinite => 4,
        }
    }
}

impl fmt::Display for OptimizerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Converged => "converged",
            Self::Stalled => "stalled",
            Self::IterationLimit => "iteration limit",
            Self::LineSearchFailed => "line search failed",
            Self::NonFinite => "non-finite objective",
        };
        write!(f, "{name} (code {})", self.code())
    }
}

/// Outcome of a successful optimization
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationResult {
    /// Optimal weights, renormalized to sum to one
    pub weights: WeightVector,
    /// Annualized statistics at the optimum
    pub stats: PortfolioStats,
    /// Sharpe ratio at the optimum
    pub sharpe_ratio: f64,
    /// Iterations performed
    pub iterations: usize,
    /// Terminal status (always a success status)
    pub status: OptimizerStatus,
}

/// Long-only maximum Sharpe ratio optimizer
#[derive(Debug, Clone, Default)]
pub struct SharpeOptimizer {
    config: OptimizerConfig,
}

struct SharpeObjective<'a> {
    moments: &'a AnnualizedMoments,
    risk_free_rate: f64,
}

impl SharpeObjective<'_> {
    /// Negative Sharpe ratio
    fn value(&self, weights: ArrayView1<'_, f64>) -> f64 {
        let stats = self.moments.stats_unchecked(weights);
        -guarded_ratio(
            stats.annualized_return - self.risk_free_rate,
            stats.annualized_volatility,
        )
    }

    /// Gradient of the negative Sharpe ratio
    fn gradient(&self, weights: ArrayView1<'_, f64>) -> Array1<f64> {
        let mean = self.moments.mean();
        let sigma_w = self.moments.covariance().dot(&weights);
        let variance = weights.dot(&sigma_w).max(0.0);

        if variance > 0.0 {
            let volatility = variance.sqrt();
            let excess = weights.dot(mean) - self.risk_free_rate;
            sigma_w * (excess / (variance * volatility)) - mean / volatility
        } else {
            -mean
        }
    }
}

impl SharpeOptimizer {
    /// Create an optimizer with a validated configuration.
    ///
    /// # Errors
    /// * `InvalidParameter` for a zero iteration cap, a non-positive tolerance,
    ///   step, or Armijo constant outside (0, 1)
    pub fn new(config: OptimizerConfig) -> Result<Self> {
        if config.max_iterations == 0 {
            return Err(RiskError::InvalidParameter(
                "optimizer iteration cap must be at least 1".to_string(),
            ));
        }
        if !(config.tolerance.is_finite() && config.tolerance > 0.0) {
            return Err(RiskError::InvalidParameter(format!(
                "optimizer tolerance must be positive, got {}",
                config.tolerance
            )));
        }
        if !(config.initial_step.is_finite() && config.initial_step > 0.0) {
            return Err(RiskError::InvalidParameter(format!(
                "initial step must be positive, got {}",
                config.initial_step
            )));
        }
        if !(config.armijo > 0.0 && config.armijo < 1.0) {
            return Err(RiskError::InvalidParameter(format!(
                "Armijo constant must be in (0, 1), got {}",
                config.armijo
            )));
        }
        Ok(Self { config })
    }

    /// Optimizer configuration
    pub const fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Maximize the Sharpe ratio over a return series.
    ///
    /// # Errors
    /// * `InsufficientData` with fewer than 2 observations
    /// * `InvalidParameter` for a non-finite risk-free rate
    /// * `OptimizationFailed` when the solver does not converge
    pub fn maximize_sharpe(
        &self,
        returns: &ReturnSeries,
        evaluator: &PortfolioEvaluator,
        risk_free_rate: f64,
    ) -> Result<OptimizationResult> {
        let moments = evaluator.moments(returns)?;
        self.optimize(&moments, risk_free_rate)
    }

    /// Maximize the Sharpe ratio given precomputed annualized moments.
    pub fn optimize(
        &self,
        moments: &AnnualizedMoments,
        risk_free_rate: f64,
    ) -> Result<OptimizationResult> {
        validate_risk_free_rate(risk_free_rate)?;

        let n = moments.n_assets();
        if n == 0 {
            return Err(RiskError::no_assets());
        }

        let objective = SharpeObjective {
            moments,
            risk_free_rate,
        };

        let mut weights = Array1::from_elem(n, 1.0 / n as f64);
        if n == 1 {
            return self.finish(&objective, weights, OptimizerStatus::Converged, 0);
        }

        let tolerance = self.config.tolerance;
        let mut value = objective.value(weights.view());
        let mut step = self.config.initial_step;

        for iteration in 1..=self.config.max_iterations {
            // Unbounded Sharpe ratio, nothing can beat it
            if value == f64::NEG_INFINITY {
                return self.finish(&objective, weights, OptimizerStatus::Converged, iteration - 1);
            }

            let gradient = objective.gradient(weights.view());
            if value.is_nan() || gradient.iter().any(|g| !g.is_finite()) {
                return Err(failure(
                    OptimizerStatus::NonFinite,
                    format!("objective or gradient not finite at iteration {iteration}"),
                    &weights,
                    iteration - 1,
                ));
            }

            let stationarity =
                max_abs_diff(&project_onto_simplex(&(&weights - &gradient)), &weights);
            if stationarity <= tolerance {
                return self.finish(&objective, weights, OptimizerStatus::Converged, iteration - 1);
            }

            let Some((candidate, candidate_value, accepted_step)) =
                self.line_search(&objective, &weights, value, &gradient, step)
            else {
                if stationarity <= tolerance.sqrt() {
                    debug!(iteration, stationarity, "line search stalled near optimum");
                    return self.finish(&objective, weights, OptimizerStatus::Stalled, iteration - 1);
                }
                return Err(failure(
                    OptimizerStatus::LineSearchFailed,
                    format!("no descent found at iteration {iteration} (stationarity {stationarity:.3e})"),
                    &weights,
                    iteration - 1,
                ));
            };

            let moved = max_abs_diff(&candidate, &weights);
            let improvement = value - candidate_value;
            weights = candidate;
            value = candidate_value;
            step = (accepted_step * 2.0).min(MAX_STEP);

            trace!(iteration, objective = value, step = accepted_step, moved, "projected gradient step");

            let flat = improvement.is_finite() && improvement.abs() <= tolerance * value.abs().max(1.0);
            if moved <= tolerance || flat {
                return self.finish(&objective, weights, OptimizerStatus::Converged, iteration);
            }
        }

        Err(failure(
            OptimizerStatus::IterationLimit,
            format!(
                "no convergence within {} iterations",
                self.config.max_iterations
            ),
            &weights,
            self.config.max_iterations,
        ))
    }

    /// Backtrack from `initial_step` until the Armijo condition holds
    fn line_search(
        &self,
        objective: &SharpeObjective<'_>,
        weights: &Array1<f64>,
        value: f64,
        gradient: &Array1<f64>,
        initial_step: f64,
    ) -> Option<(Array1<f64>, f64, f64)> {
        let mut step = initial_step;
        for _ in 0..self.config.max_backtracks {
            let candidate = project_onto_simplex(&(weights - &(gradient * step)));
            let predicted = gradient.dot(&(&candidate - weights));
            let candidate_value = objective.value(candidate.view());

            if candidate_value <= value + self.config.armijo * predicted {
                return Some((candidate, candidate_value, step));
            }
            step *= 0.5;
        }
        None
    }

    fn finish(
        &self,
        objective: &SharpeObjective<'_>,
        weights: Array1<f64>,
        status: OptimizerStatus,
        iterations: usize,
    ) -> Result<OptimizationResult> {
        let weights = WeightVector::normalized(weights)?;
        let stats = objective.moments.stats_unchecked(weights.as_array().view());
        let sharpe_ratio = stats.sharpe_ratio(objective.risk_free_rate);

        debug!(
            iterations,
            %status,
            sharpe_ratio,
            annualized_return = stats.annualized_return,
            annualized_volatility = stats.annualized_volatility,
            "sharpe optimization finished"
        );

        Ok(OptimizationResult {
            weights,
            stats,
            sharpe_ratio,
            iterations,
            status,
        })
    }
}

fn failure(
    status: OptimizerStatus,
    message: String,
    weights: &Array1<f64>,
    iterations: usize,
) -> RiskError {
    RiskError::OptimizationFailed {
        status,
        message,
        last_iterate: weights.to_vec(),
        iterations,
    }
}

/// Reject NaN and infinite risk-free rates.
///
/// # Errors
/// * `InvalidParameter` when the rate is not finite
pub fn validate_risk_free_rate(risk_free_rate: f64) -> Result<()> {
    if risk_free_rate.is_finite() {
        Ok(())
    } else {
        Err(RiskError::InvalidParameter(format!(
            "risk-free rate must be finite, got {risk_free_rate}"
        )))
    }
}

/// Maximize the Sharpe ratio with the default optimizer and 252-day annualization.
///
/// # Errors
/// See [`SharpeOptimizer::maximize_sharpe`].
pub fn maximize_sharpe(returns: &ReturnSeries, risk_free_rate: f64) -> Result<WeightVector> {
    SharpeOptimizer::default()
        .maximize_sharpe(returns, &PortfolioEvaluator::default(), risk_free_rate)
        .map(|result| result.weights)
}
