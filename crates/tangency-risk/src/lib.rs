#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/tangency/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod optimizer;
pub mod sensitivity;
pub mod series;
pub mod stats;
pub mod var;
pub mod weights;

// Re-export main types
pub use error::{Result, RiskError};
pub use optimizer::{
    DEFAULT_RISK_FREE_RATE, OptimizationResult, OptimizerConfig, OptimizerStatus,
    SharpeOptimizer, maximize_sharpe, validate_risk_free_rate,
};
pub use sensitivity::{
    MAX_GRID_POINTS, RateGrid, ReoptimizedPoint, SensitivityPoint, fixed_weight_sensitivity,
    reoptimized_sensitivity,
};
pub use series::{PriceSeries, ReturnSeries, compute_returns};
pub use stats::{
    AnnualizedMoments, PortfolioEvaluator, PortfolioStats, TRADING_DAYS_PER_YEAR,
    cumulative_returns, evaluate, guarded_ratio, portfolio_returns, sample_covariance,
};
pub use var::{
    DEFAULT_CONFIDENCE_LEVEL, VarVector, historical_var, portfolio_historical_var, quantile,
};
pub use weights::WeightVector;
