#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/tangency/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod assessment;
pub mod export;
pub mod report;

mod ratio;

pub use assessment::{
    Assessment, Verdict, assess_allocation, assess_metrics, assess_performance,
    assess_sensitivity,
};
pub use export::{ExportError, ExportFormat, Exporter, export_report_files};
pub use report::{
    AssetVar, CurvePoint, Holding, OptimizerDiagnostics, PortfolioReport, ReportBuilder,
    ReportError, ReportPeriod, SensitivityRow,
};
