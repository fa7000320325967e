//! Engine configuration.
//!
//! Every field has a default, so a JSON file only needs the values it
//! overrides:
//!
//! ```json
//! { "assets": ["SPY", "TLT"], "analysis": { "risk_free_rate": 0.03 } }
//! ```

use crate::error::Result;
use crate::universe::{DefaultUniverse, Universe};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tangency_data::PriceRequest;
use tangency_risk::var::validate_confidence_level;
use tangency_risk::{
    DEFAULT_CONFIDENCE_LEVEL, DEFAULT_RISK_FREE_RATE, OptimizerConfig, PortfolioEvaluator,
    RateGrid, SharpeOptimizer, TRADING_DAYS_PER_YEAR, validate_risk_free_rate,
};

/// Parameters of a single analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Periods per year used to annualize daily moments (default: 252)
    pub annualization_factor: f64,

    /// Annual risk-free rate as a decimal (default: 0.01)
    pub risk_free_rate: f64,

    /// Lower-tail probability for VaR (default: 0.05)
    pub confidence_level: f64,

    /// Optimizer settings
    pub optimizer: OptimizerConfig,

    /// Fall back to uniform weights when the optimizer fails
    pub fallback_uniform: bool,

    /// Rates swept by the sensitivity analysis
    pub sensitivity: RateGrid,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            annualization_factor: TRADING_DAYS_PER_YEAR,
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            confidence_level: DEFAULT_CONFIDENCE_LEVEL,
            optimizer: OptimizerConfig::default(),
            fallback_uniform: false,
            sensitivity: RateGrid::default(),
        }
    }
}

impl AnalysisConfig {
    /// Check every parameter.
    ///
    /// # Errors
    /// * `Risk(InvalidParameter)` naming the first invalid parameter
    pub fn validate(&self) -> Result<()> {
        self.evaluator()?;
        self.sharpe_optimizer()?;
        validate_confidence_level(self.confidence_level)?;
        validate_risk_free_rate(self.risk_free_rate)?;
        self.sensitivity.rates()?;
        Ok(())
    }

    /// Evaluator using the configured annualization factor.
    ///
    /// # Errors
    /// * `Risk(InvalidParameter)` for a non-positive or non-finite factor
    pub fn evaluator(&self) -> Result<PortfolioEvaluator> {
        Ok(PortfolioEvaluator::new(self.annualization_factor)?)
    }

    /// Optimizer using the configured settings.
    ///
    /// # Errors
    /// * `Risk(InvalidParameter)` for invalid optimizer settings
    pub fn sharpe_optimizer(&self) -> Result<SharpeOptimizer> {
        Ok(SharpeOptimizer::new(self.optimizer.clone())?)
    }
}

/// What to analyze and how
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Ticker symbols, in column order
    pub assets: Vec<String>,

    /// First price date (inclusive)
    pub start: NaiveDate,

    /// Last price date (inclusive)
    pub end: NaiveDate,

    /// Wide CSV price file; Yahoo Finance is used when absent
    pub prices: Option<PathBuf>,

    /// Analysis parameters
    pub analysis: AnalysisConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            assets: DefaultUniverse.symbols(),
            start: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default(),
            prices: None,
            analysis: AnalysisConfig::default(),
        }
    }
}

impl Universe for EngineConfig {
    fn symbols(&self) -> Vec<String> {
        self.assets.clone()
    }
}

impl EngineConfig {
    /// Parse a JSON configuration, missing fields take their defaults.
    ///
    /// # Errors
    /// * `Json` for malformed input
    /// * see [`EngineConfig::validate`]
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file.
    ///
    /// # Errors
    /// * `Io` if the file cannot be read
    /// * see [`EngineConfig::from_json_str`]
    pub fn from_json_file(path: &Path) -> Result<Self> {
        Self::from_json_str(&std::fs::read_to_string(path)?)
    }

    /// Check the asset list, date range and analysis parameters.
    ///
    /// # Errors
    /// * `Data` for an empty or duplicated asset list or an inverted range
    /// * see [`AnalysisConfig::validate`]
    pub fn validate(&self) -> Result<()> {
        self.request()?;
        self.analysis.validate()
    }

    /// Price request covering the configured assets and dates.
    ///
    /// # Errors
    /// * `Data` for an empty or duplicated asset list or an inverted range
    pub fn request(&self) -> Result<PriceRequest> {
        Ok(PriceRequest::new(self.assets.clone(), self.start, self.end)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;
    use rstest::rstest;
    use tangency_data::DataError;
    use tangency_risk::RiskError;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.assets, vec!["AAPL", "MSFT", "GOOGL", "AMZN", "TSLA"]);
        assert_eq!(config.start.to_string(), "2020-01-01");
        assert_eq!(config.end.to_string(), "2023-01-01");
        assert_eq!(config.analysis.annualization_factor, 252.0);
        assert_eq!(config.analysis.risk_free_rate, 0.01);
        assert_eq!(config.analysis.confidence_level, 0.05);
        assert_eq!(config.analysis.optimizer.max_iterations, 1000);
        assert!(!config.analysis.fallback_uniform);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_overrides() {
        let config = EngineConfig::from_json_str(
            r#"{"assets": ["SPY", "TLT"], "analysis": {"risk_free_rate": 0.03, "optimizer": {"max_iterations": 50}}}"#,
        )
        .unwrap();
        assert_eq!(config.size(), 2);
        assert_eq!(config.analysis.risk_free_rate, 0.03);
        assert_eq!(config.analysis.optimizer.max_iterations, 50);
        assert_eq!(config.analysis.confidence_level, 0.05);
        assert_eq!(config.start, EngineConfig::default().start);
    }

    #[rstest]
    #[case(r#"{"analysis": {"confidence_level": 1.0}}"#)]
    #[case(r#"{"analysis": {"annualization_factor": 0.0}}"#)]
    #[case(r#"{"analysis": {"optimizer": {"max_iterations": 0}}}"#)]
    #[case(r#"{"analysis": {"sensitivity": {"start": 0.0, "end": 0.05, "step": 1e-12}}}"#)]
    fn test_invalid_parameters(#[case] json: &str) {
        assert!(matches!(
            EngineConfig::from_json_str(json),
            Err(AnalysisError::Risk(RiskError::InvalidParameter(_)))
        ));
    }

    #[rstest]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn test_non_finite_risk_free_rate(#[case] rate: f64) {
        let config = AnalysisConfig {
            risk_free_rate: rate,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AnalysisError::Risk(RiskError::InvalidParameter(_)))
        ));
    }

    #[test]
    fn test_inverted_range() {
        assert!(matches!(
            EngineConfig::from_json_str(r#"{"start": "2023-01-01", "end": "2022-01-01"}"#),
            Err(AnalysisError::Data(DataError::InvalidDateRange { .. }))
        ));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            EngineConfig::from_json_str("{"),
            Err(AnalysisError::Json(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tangency.json");
        std::fs::write(&path, r#"{"analysis": {"fallback_uniform": true}}"#).unwrap();
        let config = EngineConfig::from_json_file(&path).unwrap();
        assert!(config.analysis.fallback_uniform);
    }
}
