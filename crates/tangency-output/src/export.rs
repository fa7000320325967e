//! Export functionality for Tangency reports.
//!
//! The report, holdings, the cumulative curve and per-asset VaR can be
//! written as CSV or JSON, either one table at a time or as a bundle of files.

use crate::report::{AssetVar, CurvePoint, Holding, PortfolioReport};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "pretty-json" | "pretty_json" => Ok(Self::PrettyJson),
            other => Err(ExportError::InvalidFormat(other.to_string())),
        }
    }
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

fn records_to_string<T: Serialize>(
    records: &[T],
    format: ExportFormat,
) -> Result<String, ExportError> {
    match format {
        ExportFormat::Csv => csv_string(records),
        ExportFormat::Json => Ok(serde_json::to_string(records)?),
        ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(records)?),
    }
}

fn csv_string<T: Serialize>(records: &[T]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for record in records {
        wtr.serialize(record)?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes).map_err(|e| ExportError::InvalidFormat(e.to_string()))
}

impl Exporter for Vec<Holding> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        records_to_string(self, format)
    }
}

impl Exporter for Vec<CurvePoint> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        records_to_string(self, format)
    }
}

impl Exporter for Vec<AssetVar> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        records_to_string(self, format)
    }
}

impl Exporter for PortfolioReport {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let mut output = String::new();

                // Write header information as comments
                output.push_str(&format!("# Portfolio: {}\n", self.title));
                if let Some(period) = self.period {
                    output.push_str(&format!("# Period: {} to {}\n", period.start, period.end));
                }
                output.push_str(&format!("# Sharpe Ratio: {}\n", self.sharpe_ratio));
                output.push_str(&format!(
                    "# Total Weight: {}\n",
                    self.holdings.iter().map(|h| h.weight).sum::<f64>()
                ));

                output.push_str(&csv_string(&self.holdings)?);
                Ok(output)
            }
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

/// Write the `report` summary and the `holdings`, `cumulative` and `var`
/// tables into `dir`.
///
/// Returns the written paths.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or any file fails.
pub fn export_report_files(
    report: &PortfolioReport,
    dir: &Path,
    format: ExportFormat,
) -> Result<Vec<PathBuf>, ExportError> {
    std::fs::create_dir_all(dir)?;
    let ext = format.extension();

    let tables: [(&str, &dyn Exporter); 4] = [
        ("report", report),
        ("holdings", &report.holdings),
        ("cumulative", &report.cumulative),
        ("var", &report.asset_var),
    ];

    tables
        .into_iter()
        .map(|(name, table)| {
            let path = dir.join(format!("{name}.{ext}"));
            table.export_to_file(&path, format)?;
            Ok(path)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::sample_report;
    use rstest::rstest;

    #[test]
    fn test_holdings_csv() {
        let csv = sample_report().holdings.export_to_string(ExportFormat::Csv).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("symbol,weight"));
        assert_eq!(lines.next(), Some("AAPL,0.25"));
        assert_eq!(lines.next(), Some("MSFT,0.75"));
    }

    #[test]
    fn test_curve_json() {
        let json = sample_report()
            .cumulative
            .export_to_string(ExportFormat::Json)
            .unwrap();
        assert!(json.starts_with('['));
        assert!(json.contains("\"date\":\"2021-03-02\""));
        assert!(json.contains("1.05"));
    }

    #[test]
    fn test_var_pretty_json() {
        let json = sample_report()
            .asset_var
            .export_to_string(ExportFormat::PrettyJson)
            .unwrap();
        assert!(json.contains("\"symbol\": \"MSFT\""));
        assert!(json.contains("  ")); // Indentation indicates pretty format
    }

    #[test]
    fn test_report_csv_has_comment_header() {
        let csv = sample_report().export_to_string(ExportFormat::Csv).unwrap();
        assert!(csv.starts_with("# Portfolio: Test\n"));
        assert!(csv.contains("# Total Weight: 1"));
        assert!(csv.contains("symbol,weight"));
    }

    #[rstest]
    #[case("csv", ExportFormat::Csv)]
    #[case("JSON", ExportFormat::Json)]
    #[case("pretty-json", ExportFormat::PrettyJson)]
    fn test_format_parse(#[case] text: &str, #[case] expected: ExportFormat) {
        assert_eq!(text.parse::<ExportFormat>().unwrap(), expected);
    }

    #[test]
    fn test_format_parse_rejects_unknown() {
        assert!(matches!(
            "xml".parse::<ExportFormat>(),
            Err(ExportError::InvalidFormat(_))
        ));
    }
}
