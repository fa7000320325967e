//! End-to-end analysis: prices in, optimal portfolio and risk figures out.

use crate::config::{AnalysisConfig, EngineConfig};
use crate::error::{AnalysisError, Result};
use ndarray::Array1;
use tangency_data::PriceSource;
use tangency_output::{OptimizerDiagnostics, ReportBuilder};
use tangency_risk::{
    AnnualizedMoments, PortfolioStats, PriceSeries, ReoptimizedPoint, ReturnSeries, RiskError,
    SensitivityPoint, SharpeOptimizer, VarVector, WeightVector, compute_returns,
    cumulative_returns, fixed_weight_sensitivity, historical_var, portfolio_historical_var,
    portfolio_returns, reoptimized_sensitivity,
};
use tracing::{info, warn};

/// Everything computed for one set of prices
#[derive(Debug, Clone)]
pub struct PortfolioAnalysis {
    /// Aligned simple returns
    pub returns: ReturnSeries,
    /// Annualized mean and covariance of the returns
    pub moments: AnnualizedMoments,
    /// Optimal (or fallback) weights
    pub weights: WeightVector,
    /// Annualized statistics of the weighted portfolio
    pub stats: PortfolioStats,
    /// Risk-free rate the Sharpe ratio uses
    pub risk_free_rate: f64,
    /// Sharpe ratio at `risk_free_rate`
    pub sharpe_ratio: f64,
    /// Per-asset historical VaR
    pub asset_var: VarVector,
    /// Historical VaR of the portfolio return series
    pub portfolio_var: f64,
    /// Daily portfolio returns
    pub portfolio_returns: Array1<f64>,
    /// Growth of one unit invested at the first return date
    pub cumulative: Array1<f64>,
    /// How the weights were obtained
    pub diagnostics: OptimizerDiagnostics,
}

impl PortfolioAnalysis {
    /// Whether uniform weights replaced a failed optimization
    pub const fn used_fallback(&self) -> bool {
        self.diagnostics.fallback_uniform
    }

    /// Report builder pre-filled with this analysis.
    pub fn report(&self) -> ReportBuilder {
        let dates = self.returns.dates();
        let mut builder = ReportBuilder::new()
            .title(self.returns.assets().join(", "))
            .holdings(self.returns.assets(), &self.weights)
            .stats(self.stats, self.risk_free_rate)
            .asset_var(self.asset_var.clone())
            .portfolio_var(self.portfolio_var)
            .cumulative(dates, self.cumulative.iter().copied())
            .optimizer(self.diagnostics);

        if let (Some(&start), Some(&end)) = (dates.first(), dates.last()) {
            builder = builder.period(start, end);
        }
        builder
    }

    /// Sharpe ratio of the chosen weights across risk-free rates.
    ///
    /// # Errors
    /// * `Risk(InvalidParameter)` when any rate is not finite
    pub fn sensitivity(&self, rates: &[f64]) -> Result<Vec<SensitivityPoint>> {
        Ok(fixed_weight_sensitivity(&self.stats, rates)?)
    }

    /// Sharpe ratio of the chosen weights at a single adjusted rate.
    ///
    /// # Errors
    /// * `Risk(InvalidParameter)` when the rate is not finite
    pub fn adjusted(&self, risk_free_rate: f64) -> Result<SensitivityPoint> {
        self.sensitivity(&[risk_free_rate])?
            .pop()
            .ok_or_else(|| AnalysisError::Config("empty sensitivity result".to_string()))
    }

    /// Re-optimize at each rate in parallel.
    pub fn reoptimized(&self, optimizer: &SharpeOptimizer, rates: &[f64]) -> Vec<ReoptimizedPoint> {
        reoptimized_sensitivity(&self.moments, optimizer, rates)
    }
}

/// Run the full analysis on aligned prices.
///
/// Returns are computed first, then the maximum Sharpe weights, their
/// statistics, VaR and cumulative performance.
///
/// # Errors
/// * `Risk(InvalidParameter)` for an invalid configuration
/// * `Risk(InsufficientData)` with fewer than 2 usable return rows
/// * `Risk(OptimizationFailed)` when the optimizer fails and the uniform
///   fallback is disabled
pub fn analyze(prices: &PriceSeries, config: &AnalysisConfig) -> Result<PortfolioAnalysis> {
    config.validate()?;

    let returns = compute_returns(prices)?;
    let evaluator = config.evaluator()?;
    let optimizer = config.sharpe_optimizer()?;
    let moments = evaluator.moments(&returns)?;
    let risk_free_rate = config.risk_free_rate;

    let (weights, diagnostics) = match optimizer.optimize(&moments, risk_free_rate) {
        Ok(result) => (
            result.weights,
            OptimizerDiagnostics::new(result.status, result.iterations, false),
        ),
        Err(RiskError::OptimizationFailed {
            status,
            message,
            iterations,
            ..
        }) if config.fallback_uniform => {
            warn!(%status, %message, "optimization failed, using uniform weights");
            (
                WeightVector::uniform(returns.n_assets())?,
                OptimizerDiagnostics::new(status, iterations, true),
            )
        }
        Err(err) => return Err(err.into()),
    };

    let stats = moments.stats_for(weights.as_array().view())?;
    let sharpe_ratio = stats.sharpe_ratio(risk_free_rate);
    let asset_var = historical_var(&returns, config.confidence_level)?;
    let portfolio_var = portfolio_historical_var(&returns, &weights, config.confidence_level)?;
    let daily = portfolio_returns(&weights, &returns)?;
    let cumulative = cumulative_returns(&daily);

    info!(
        assets = returns.n_assets(),
        observations = returns.n_observations(),
        annualized_return = stats.annualized_return,
        annualized_volatility = stats.annualized_volatility,
        sharpe_ratio,
        portfolio_var,
        "analysis complete"
    );

    Ok(PortfolioAnalysis {
        returns,
        moments,
        weights,
        stats,
        risk_free_rate,
        sharpe_ratio,
        asset_var,
        portfolio_var,
        portfolio_returns: daily,
        cumulative,
        diagnostics,
    })
}

/// Fetch prices for the configured assets and analyze them.
///
/// # Errors
/// * `Data` when prices cannot be loaded
/// * see [`analyze`]
pub async fn load_and_analyze<S: PriceSource>(
    source: &S,
    config: &EngineConfig,
) -> Result<PortfolioAnalysis> {
    let request = config.request()?;
    let prices = source.fetch_prices(&request).await?;
    info!(
        assets = prices.n_assets(),
        dates = prices.n_dates(),
        missing = prices.missing_count(),
        "prices loaded"
    );
    analyze(&prices, &config.analysis)
}

/// Whether a status came from a successful optimization
pub const fn is_optimal(diagnostics: &OptimizerDiagnostics) -> bool {
    !diagnostics.fallback_uniform && diagnostics.status.is_success()
}
