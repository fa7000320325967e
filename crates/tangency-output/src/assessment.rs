//! Qualitative verdicts on an analysis.

use serde::{Deserialize, Serialize};
use tangency_risk::weights::WEIGHT_TOLERANCE;

/// Outcome of a single check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// The check passed
    Positive,
    /// The check failed
    Negative,
    /// Neither clearly good nor bad
    Neutral,
    /// Something looks off and should be reviewed
    Warning,
}

impl Verdict {
    /// Short marker for text output
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Positive => "[+]",
            Self::Negative => "[-]",
            Self::Neutral => "[=]",
            Self::Warning => "[!]",
        }
    }
}

/// Growth when the cumulative curve ends above its starting value of 1.
pub fn assess_performance(final_cumulative: f64) -> Verdict {
    if final_cumulative > 1.0 {
        Verdict::Positive
    } else {
        Verdict::Negative
    }
}

/// Positive when both annualized return and Sharpe ratio are positive,
/// negative when either is negative.
pub fn assess_metrics(annualized_return: f64, sharpe_ratio: f64) -> Verdict {
    if annualized_return > 0.0 && sharpe_ratio > 0.0 {
        Verdict::Positive
    } else if annualized_return < 0.0 || sharpe_ratio < 0.0 {
        Verdict::Negative
    } else {
        Verdict::Neutral
    }
}

/// Warning when any weight is negative beyond the weight tolerance.
pub fn assess_allocation(weights: &[f64]) -> Verdict {
    if weights.iter().any(|w| *w < -WEIGHT_TOLERANCE) {
        Verdict::Warning
    } else {
        Verdict::Positive
    }
}

/// Positive when the Sharpe ratio at the adjusted risk-free rate is above zero.
pub fn assess_sensitivity(adjusted_sharpe: f64) -> Verdict {
    if adjusted_sharpe > 0.0 {
        Verdict::Positive
    } else {
        Verdict::Negative
    }
}

/// All verdicts for one report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assessment {
    /// Cumulative performance over the period
    pub performance: Verdict,
    /// Annualized return and Sharpe ratio
    pub metrics: Verdict,
    /// Weight distribution
    pub allocation: Verdict,
    /// Sharpe ratio at an adjusted risk-free rate, when one was requested
    pub sensitivity: Option<Verdict>,
}

impl Assessment {
    /// One line per verdict.
    pub fn messages(&self) -> Vec<String> {
        let mut lines = vec![
            format!(
                "{} Performance: {}",
                self.performance.symbol(),
                match self.performance {
                    Verdict::Positive => "the portfolio grew over the period",
                    _ => "the portfolio lost value over the period",
                }
            ),
            format!(
                "{} Metrics: {}",
                self.metrics.symbol(),
                match self.metrics {
                    Verdict::Positive => "return and Sharpe ratio are both positive",
                    Verdict::Negative => "return or Sharpe ratio is negative",
                    _ => "return and Sharpe ratio are flat",
                }
            ),
            format!(
                "{} Allocation: {}",
                self.allocation.symbol(),
                match self.allocation {
                    Verdict::Warning => "some assets carry negative weight",
                    _ => "weights are long-only and fully invested",
                }
            ),
        ];

        if let Some(verdict) = self.sensitivity {
            lines.push(format!(
                "{} Sensitivity: {}",
                verdict.symbol(),
                match verdict {
                    Verdict::Positive => "the Sharpe ratio stays positive at the adjusted rate",
                    _ => "the Sharpe ratio is not positive at the adjusted rate",
                }
            ));
        }

        lines
    }
}
