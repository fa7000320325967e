#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/tangency/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod pipeline;
pub mod universe;

// Re-export main types from sub-crates
pub use tangency_data as data;
pub use tangency_output as output;
pub use tangency_risk as risk;

pub use config::{AnalysisConfig, EngineConfig};
pub use error::{AnalysisError, Result};
pub use pipeline::{PortfolioAnalysis, analyze, is_optimal, load_and_analyze};
pub use universe::{DefaultUniverse, Universe};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
