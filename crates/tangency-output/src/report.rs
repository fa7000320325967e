//! Report generation for Tangency analyses.

use crate::assessment::{
    Assessment, assess_allocation, assess_metrics, assess_performance, assess_sensitivity,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tangency_risk::{
    OptimizerStatus, PortfolioStats, ReoptimizedPoint, SensitivityPoint, VarVector, WeightVector,
};
use thiserror::Error;

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A required section was never provided.
    #[error("Report is missing {0}")]
    Missing(&'static str),

    /// Sections disagree on shape.
    #[error("Report sections disagree: {0}")]
    Inconsistent(String),
}

/// Analysis period covered by the price data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPeriod {
    /// First price date
    pub start: NaiveDate,
    /// Last price date
    pub end: NaiveDate,
}

/// A single optimal holding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    /// Security symbol.
    pub symbol: String,
    /// Weight in the portfolio (0.0 to 1.0).
    pub weight: f64,
}

/// Historical VaR of one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetVar {
    /// Security symbol.
    pub symbol: String,
    /// Daily return quantile, a loss when negative.
    pub var: f64,
}

/// One point of the cumulative performance curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    /// Return date.
    pub date: NaiveDate,
    /// Growth of one unit invested at the start.
    pub value: f64,
}

/// Sharpe ratio at one risk-free rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityRow {
    /// Risk-free rate, as a decimal.
    pub risk_free_rate: f64,
    /// Sharpe ratio at that rate, absent when re-optimizing failed.
    #[serde(with = "crate::ratio", default = "nan")]
    pub sharpe_ratio: f64,
    /// Re-optimized weights, absent for the fixed-weight view.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights: Option<Vec<f64>>,
    /// Why re-optimizing failed at this rate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

const fn nan() -> f64 {
    f64::NAN
}

impl From<&SensitivityPoint> for SensitivityRow {
    fn from(point: &SensitivityPoint) -> Self {
        Self {
            risk_free_rate: point.risk_free_rate,
            sharpe_ratio: point.sharpe_ratio,
            weights: None,
            error: None,
        }
    }
}

impl From<&ReoptimizedPoint> for SensitivityRow {
    fn from(point: &ReoptimizedPoint) -> Self {
        match &point.result {
            Ok(result) => Self {
                risk_free_rate: point.risk_free_rate,
                sharpe_ratio: result.sharpe_ratio,
                weights: Some(result.weights.to_vec()),
                error: None,
            },
            Err(err) => Self {
                risk_free_rate: point.risk_free_rate,
                sharpe_ratio: f64::NAN,
                weights: None,
                error: Some(err.to_string()),
            },
        }
    }
}

/// How the weights were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizerDiagnostics {
    /// Final optimizer status.
    pub status: OptimizerStatus,
    /// Numeric status code.
    pub code: i32,
    /// Iterations performed.
    pub iterations: usize,
    /// Whether uniform weights replaced a failed optimization.
    pub fallback_uniform: bool,
}

impl OptimizerDiagnostics {
    /// Diagnostics for a finished optimization.
    pub const fn new(status: OptimizerStatus, iterations: usize, fallback_uniform: bool) -> Self {
        Self {
            status,
            code: status.code(),
            iterations,
            fallback_uniform,
        }
    }
}

/// Full result of a portfolio analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioReport {
    /// Report title.
    pub title: String,

    /// Report generation timestamp.
    pub generated_at: DateTime<Utc>,

    /// Dates covered by the returns.
    pub period: Option<ReportPeriod>,

    /// Risk-free rate used for the Sharpe ratio.
    pub risk_free_rate: f64,

    /// Optimal weights, one per asset.
    pub holdings: Vec<Holding>,

    /// Annualized expected return.
    pub annualized_return: f64,

    /// Annualized volatility.
    pub annualized_volatility: f64,

    /// Sharpe ratio at `risk_free_rate`.
    #[serde(with = "crate::ratio")]
    pub sharpe_ratio: f64,

    /// Lower-tail probability of the VaR figures.
    pub confidence_level: f64,

    /// Per-asset historical VaR.
    pub asset_var: Vec<AssetVar>,

    /// Simple average of the per-asset VaR values.
    pub average_asset_var: f64,

    /// Historical VaR of the weighted portfolio return series.
    pub portfolio_var: Option<f64>,

    /// Cumulative performance curve.
    pub cumulative: Vec<CurvePoint>,

    /// Sharpe ratio across risk-free rates.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sensitivity: Vec<SensitivityRow>,

    /// Sharpe ratio of the optimal weights at an adjusted risk-free rate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adjusted: Option<SensitivityRow>,

    /// Qualitative verdicts.
    pub assessment: Assessment,

    /// Optimizer diagnostics.
    pub optimizer: Option<OptimizerDiagnostics>,
}

impl PortfolioReport {
    /// Growth of one unit over the whole period, 1.0 with no returns.
    pub fn final_cumulative(&self) -> f64 {
        self.cumulative.last().map_or(1.0, |p| p.value)
    }

    /// Convert report to JSON string.
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Render the report as a fixed-width text table.
    pub fn to_ascii_table(&self) -> String {
        let mut output = String::new();
        let rule = |c: &str| format!("{}\n", c.repeat(80));

        output.push_str(&format!("\nPortfolio Report: {}\n", self.title));
        if let Some(period) = self.period {
            output.push_str(&format!("Period: {} to {}\n", period.start, period.end));
        }
        output.push_str(&rule("="));

        output.push_str("\nOptimal Allocation:\n");
        output.push_str(&rule("-"));
        output.push_str(&format!("{:<20} {:>12}\n", "Symbol", "Weight"));
        for holding in &self.holdings {
            output.push_str(&format!(
                "{:<20} {:>11.2}%\n",
                holding.symbol,
                holding.weight * 100.0
            ));
        }

        output.push_str("\nPerformance Metrics:\n");
        output.push_str(&rule("-"));
        output.push_str(&format!(
            "  Expected Annual Return:   {:.2}%\n",
            self.annualized_return * 100.0
        ));
        output.push_str(&format!(
            "  Annual Volatility:        {:.2}%\n",
            self.annualized_volatility * 100.0
        ));
        output.push_str(&format!(
            "  Sharpe Ratio:             {:.4} (risk-free {:.2}%)\n",
            self.sharpe_ratio,
            self.risk_free_rate * 100.0
        ));
        output.push_str(&format!(
            "  Cumulative Return:        {:.2}%\n",
            (self.final_cumulative() - 1.0) * 100.0
        ));

        output.push_str(&format!(
            "\nDaily Value at Risk ({:.0}% confidence):\n",
            (1.0 - self.confidence_level) * 100.0
        ));
        output.push_str(&rule("-"));
        for entry in &self.asset_var {
            output.push_str(&format!("{:<20} {:>11.2}%\n", entry.symbol, entry.var * 100.0));
        }
        output.push_str(&format!(
            "{:<20} {:>11.2}%\n",
            "Average of assets",
            self.average_asset_var * 100.0
        ));
        if let Some(var) = self.portfolio_var {
            output.push_str(&format!("{:<20} {:>11.2}%\n", "Portfolio", var * 100.0));
        }

        if let Some(adjusted) = &self.adjusted {
            output.push_str(&format!(
                "\nAdjusted Sharpe Ratio:    {:.4} (risk-free {:.2}%)\n",
                adjusted.sharpe_ratio,
                adjusted.risk_free_rate * 100.0
            ));
        }

        if !self.sensitivity.is_empty() {
            output.push_str("\nRisk-Free Rate Sensitivity:\n");
            output.push_str(&rule("-"));
            output.push_str(&format!("{:>12} {:>12}  {}\n", "Rate", "Sharpe", "Note"));
            for row in &self.sensitivity {
                let sharpe = match &row.error {
                    Some(_) => "-".to_string(),
                    None => format!("{:.4}", row.sharpe_ratio),
                };
                output.push_str(&format!(
                    "{:>11.2}% {:>12}  {}\n",
                    row.risk_free_rate * 100.0,
                    sharpe,
                    row.error.as_deref().unwrap_or_default()
                ));
            }
        }

        output.push_str("\nAssessment:\n");
        output.push_str(&rule("-"));
        for line in self.assessment.messages() {
            output.push_str(&format!("  {line}\n"));
        }

        if let Some(diag) = &self.optimizer {
            output.push_str(&format!(
                "\nOptimizer: {} after {} iterations{}\n",
                diag.status,
                diag.iterations,
                if diag.fallback_uniform {
                    ", uniform weights used"
                } else {
                    ""
                }
            ));
        }

        output
    }
}

/// Builder for creating reports.
#[derive(Debug, Default)]
pub struct ReportBuilder {
    title: Option<String>,
    period: Option<ReportPeriod>,
    holdings: Option<Vec<Holding>>,
    stats: Option<(PortfolioStats, f64)>,
    var: Option<VarVector>,
    portfolio_var: Option<f64>,
    cumulative: Vec<CurvePoint>,
    sensitivity: Vec<SensitivityRow>,
    adjusted: Option<SensitivityRow>,
    optimizer: Option<OptimizerDiagnostics>,
}

impl ReportBuilder {
    /// Create a new report builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the analysis period.
    pub const fn period(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.period = Some(ReportPeriod { start, end });
        self
    }

    /// Set the optimal weights, in asset order.
    pub fn holdings(mut self, assets: &[String], weights: &WeightVector) -> Self {
        self.holdings = Some(
            assets
                .iter()
                .zip(weights.iter())
                .map(|(symbol, &weight)| Holding {
                    symbol: symbol.clone(),
                    weight,
                })
                .collect(),
        );
        self
    }

    /// Set the portfolio statistics and the rate their Sharpe ratio uses.
    pub const fn stats(mut self, stats: PortfolioStats, risk_free_rate: f64) -> Self {
        self.stats = Some((stats, risk_free_rate));
        self
    }

    /// Set the per-asset VaR.
    pub fn asset_var(mut self, var: VarVector) -> Self {
        self.var = Some(var);
        self
    }

    /// Set the joint portfolio VaR.
    pub const fn portfolio_var(mut self, var: f64) -> Self {
        self.portfolio_var = Some(var);
        self
    }

    /// Set the cumulative curve, one value per return date.
    pub fn cumulative(mut self, dates: &[NaiveDate], values: impl IntoIterator<Item = f64>) -> Self {
        self.cumulative = dates
            .iter()
            .zip(values)
            .map(|(&date, value)| CurvePoint { date, value })
            .collect();
        self
    }

    /// Set the sensitivity table.
    pub fn sensitivity<'a, P>(mut self, points: impl IntoIterator<Item = &'a P>) -> Self
    where
        P: 'a,
        &'a P: Into<SensitivityRow>,
    {
        self.sensitivity = points.into_iter().map(Into::into).collect();
        self
    }

    /// Set the Sharpe ratio at an adjusted risk-free rate.
    pub fn adjusted(mut self, point: &SensitivityPoint) -> Self {
        self.adjusted = Some(point.into());
        self
    }

    /// Set the optimizer diagnostics.
    pub const fn optimizer(mut self, diagnostics: OptimizerDiagnostics) -> Self {
        self.optimizer = Some(diagnostics);
        self
    }

    /// Build the report and its assessment.
    ///
    /// # Errors
    /// * `Missing` without holdings, statistics or VaR
    /// * `Inconsistent` when the VaR assets differ from the holdings
    pub fn build(self) -> Result<PortfolioReport, ReportError> {
        let holdings = self.holdings.ok_or(ReportError::Missing("holdings"))?;
        let (stats, risk_free_rate) = self.stats.ok_or(ReportError::Missing("statistics"))?;
        let var = self.var.ok_or(ReportError::Missing("value at risk"))?;

        if var.assets.len() != holdings.len()
            || var.assets.iter().zip(&holdings).any(|(a, h)| *a != h.symbol)
        {
            return Err(ReportError::Inconsistent(format!(
                "VaR covers {:?}, holdings cover {:?}",
                var.assets,
                holdings.iter().map(|h| h.symbol.as_str()).collect::<Vec<_>>()
            )));
        }

        let sharpe_ratio = stats.sharpe_ratio(risk_free_rate);
        let average_asset_var = var.values.mean().unwrap_or(f64::NAN);
        let final_cumulative = self.cumulative.last().map_or(1.0, |p| p.value);
        let weights: Vec<f64> = holdings.iter().map(|h| h.weight).collect();

        let assessment = Assessment {
            performance: assess_performance(final_cumulative),
            metrics: assess_metrics(stats.annualized_return, sharpe_ratio),
            allocation: assess_allocation(&weights),
            sensitivity: self.adjusted.as_ref().map(|row| assess_sensitivity(row.sharpe_ratio)),
        };

        Ok(PortfolioReport {
            title: self.title.unwrap_or_else(|| "Sharpe-optimal portfolio".to_string()),
            generated_at: Utc::now(),
            period: self.period,
            risk_free_rate,
            holdings,
            annualized_return: stats.annualized_return,
            annualized_volatility: stats.annualized_volatility,
            sharpe_ratio,
            confidence_level: var.confidence_level,
            asset_var: var
                .iter()
                .map(|(symbol, var)| AssetVar {
                    symbol: symbol.to_string(),
                    var,
                })
                .collect(),
            average_asset_var,
            portfolio_var: self.portfolio_var,
            cumulative: self.cumulative,
            sensitivity: self.sensitivity,
            adjusted: self.adjusted,
            assessment,
            optimizer: self.optimizer,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::assessment::Verdict;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    pub(crate) fn sample_report() -> PortfolioReport {
        let assets = vec!["AAPL".to_string(), "MSFT".to_string()];
        let d = |day| NaiveDate::from_ymd_opt(2021, 3, day).unwrap();
        ReportBuilder::new()
            .title("Test")
            .period(d(1), d(4))
            .holdings(&assets, &WeightVector::new(array![0.25, 0.75]).unwrap())
            .stats(
                PortfolioStats {
                    annualized_return: 0.12,
                    annualized_volatility: 0.2,
                },
                0.02,
            )
            .asset_var(VarVector {
                confidence_level: 0.05,
                assets,
                values: array![-0.03, -0.01],
            })
            .portfolio_var(-0.015)
            .cumulative(&[d(2), d(3), d(4)], [1.01, 0.99, 1.05])
            .optimizer(OptimizerDiagnostics::new(OptimizerStatus::Converged, 12, false))
            .build()
            .unwrap()
    }

    #[test]
    fn test_report_builder() {
        let report = sample_report();
        assert_eq!(report.title, "Test");
        assert_eq!(report.holdings.len(), 2);
        assert_abs_diff_eq!(report.sharpe_ratio, 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(report.average_asset_var, -0.02, epsilon = 1e-12);
        assert_abs_diff_eq!(report.final_cumulative(), 1.05);
        assert_eq!(report.assessment.performance, Verdict::Positive);
        assert_eq!(report.assessment.metrics, Verdict::Positive);
        assert_eq!(report.assessment.sensitivity, None);
    }

    #[test]
    fn test_builder_requires_sections() {
        assert!(matches!(
            ReportBuilder::new().build(),
            Err(ReportError::Missing("holdings"))
        ));
    }

    #[test]
    fn test_builder_rejects_mismatched_var() {
        let result = ReportBuilder::new()
            .holdings(&["A".to_string()], &WeightVector::uniform(1).unwrap())
            .stats(
                PortfolioStats {
                    annualized_return: 0.1,
                    annualized_volatility: 0.1,
                },
                0.0,
            )
            .asset_var(VarVector {
                confidence_level: 0.05,
                assets: vec!["B".to_string()],
                values: array![-0.02],
            })
            .build();
        assert!(matches!(result, Err(ReportError::Inconsistent(_))));
    }

    #[test]
    fn test_infinite_sharpe_json() {
        let mut report = sample_report();
        report.sharpe_ratio = f64::INFINITY;
        let json = report.to_json().unwrap();
        assert!(json.contains("\"sharpe_ratio\": \"inf\""));

        let back: PortfolioReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.sharpe_ratio, f64::INFINITY);
        assert_eq!(back.holdings, report.holdings);
    }

    #[test]
    fn test_ascii_table_sections() {
        let table = sample_report().to_ascii_table();
        assert!(table.contains("Optimal Allocation"));
        assert!(table.contains("AAPL"));
        assert!(table.contains("25.00%"));
        assert!(table.contains("95% confidence"));
        assert!(table.contains("Average of assets"));
        assert!(table.contains("converged (code 0)"));
    }

    #[test]
    fn test_sensitivity_rows() {
        let points = [
            SensitivityPoint {
                risk_free_rate: 0.0,
                sharpe_ratio: 0.6,
            },
            SensitivityPoint {
                risk_free_rate: 0.01,
                sharpe_ratio: 0.55,
            },
        ];
        let mut report = sample_report();
        report.sensitivity = points.iter().map(SensitivityRow::from).collect();
        assert_eq!(report.sensitivity[1].risk_free_rate, 0.01);
        assert!(report.to_ascii_table().contains("Risk-Free Rate Sensitivity"));
    }

    #[test]
    fn test_failed_reoptimization_row_has_no_sharpe() {
        let point = ReoptimizedPoint {
            risk_free_rate: 0.03,
            result: Err(tangency_risk::RiskError::InvalidParameter(
                "risk-free rate must be finite".to_string(),
            )),
        };
        let mut report = sample_report();
        report.sensitivity = vec![SensitivityRow::from(&point)];

        let table = report.to_ascii_table();
        let row = table
            .lines()
            .find(|line| line.contains("risk-free rate must be finite"))
            .unwrap();
        assert!(row.trim_start().starts_with("3.00%"));
        assert!(row.contains(" -  "));
        assert!(!table.contains("NaN"));
    }
}
