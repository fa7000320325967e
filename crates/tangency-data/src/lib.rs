#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/tangency/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod csv_file;
pub mod error;
pub mod source;
pub mod yahoo;

pub use csv_file::{CsvPriceSource, read_prices};
pub use error::{DataError, Result};
pub use source::{PriceRequest, PriceSource, SymbolHistory, align_histories};
pub use yahoo::YahooPriceSource;
