//! ATR Stop Calibration
//!
//! Calibrates a per-instrument stop-loss distance, expressed as a multiple of
//! the average true range, so that sizing positions for a fixed risk needs a
//! target amount of buying power. With the stop fixed, it measures how many
//! bars price takes to reach take-profit levels at several reward/risk
//! multiples of that stop.
//!
//! ```no_run
//! use stop_calibrator::{analysis, Config};
//! use std::path::Path;
//!
//! let config = Config::default();
//! match analysis::analyze_file(Path::new("data/ABC.txt"), &config) {
//!     Ok(report) => println!("{}: coef {:.4}", report.instrument, report.coefficient),
//!     Err(reason) => println!("skipped: {}", reason),
//! }
//! ```

pub mod analysis;
pub mod calibration;
pub mod config;
pub mod data;
pub mod indicators;
pub mod report;
pub mod sampling;
pub mod simulation;
pub mod types;

pub use config::{Config, ConfigError};
pub use report::ResultTable;
pub use types::*;
