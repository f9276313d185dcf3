//! Configuration management
//!
//! Handles loading and parsing of JSON configuration files with environment
//! variable overrides for input and output locations. Every field has a
//! default, so a file only needs to name what it changes.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Invalid configuration, reported before any instrument is read
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),

    #[error("bp_min ({min}) must be <= bp_max ({max})")]
    BuyingPowerRange { min: f64, max: f64 },

    #[error("min_price ({min}) must be <= max_price ({max})")]
    PriceBand { min: f64, max: f64 },

    #[error("take_profit_ratios must not be empty")]
    NoRatios,

    #[error("take-profit ratio {0} must be positive")]
    InvalidRatio(f64),

    #[error("reference_ratio {0} is not one of take_profit_ratios")]
    UnknownReferenceRatio(f64),
}

/// Calibration run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding one delimited file per instrument
    pub data_dir: String,
    /// File extension of instrument files (without the dot)
    pub extension: String,
    /// Where the result table is written
    pub output_path: String,

    /// ATR rolling window
    pub atr_period: usize,
    /// Bars ahead used for adverse-excursion estimation
    pub horizon: usize,
    pub samples_per_instrument: usize,
    /// Fixed amount risked per trade when sizing positions
    pub risk_per_trade: f64,
    /// Target range for the average buying power
    pub bp_min: f64,
    pub bp_max: f64,

    pub take_profit_ratios: Vec<f64>,
    /// Ratio whose average duration orders the result table
    pub reference_ratio: f64,

    /// Close-price eligibility band (inclusive)
    pub min_price: f64,
    pub max_price: f64,
    pub min_valid_indices: usize,
    pub min_candidates: usize,

    pub distribution_seed: u64,
    pub evaluation_seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: "data".to_string(),
            extension: "txt".to_string(),
            output_path: "results/atr_calibration.csv".to_string(),
            atr_period: 50,
            horizon: 20,
            samples_per_instrument: 500,
            risk_per_trade: 100.0,
            bp_min: 1200.0,
            bp_max: 1500.0,
            take_profit_ratios: vec![1.0, 1.5, 2.0],
            reference_ratio: 2.0,
            min_price: 1.0,
            max_price: 20.0,
            min_valid_indices: 10,
            min_candidates: 10,
            distribution_seed: 42,
            evaluation_seed: 7,
        }
    }
}

impl Config {
    /// Load configuration from JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref()).context("Failed to read config file")?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config JSON")?;
        Ok(config)
    }

    /// Load from an optional file, then apply environment overrides
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p).with_context(|| format!("Config: {}", p))?,
            None => Config::default(),
        };

        if let Ok(dir) = std::env::var("CALIBRATION_DATA_DIR") {
            config.data_dir = dir;
        }
        if let Ok(output) = std::env::var("CALIBRATION_OUTPUT") {
            config.output_path = output;
        }

        Ok(config)
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.atr_period == 0 {
            return Err(ConfigError::NotPositive("atr_period"));
        }
        if self.horizon == 0 {
            return Err(ConfigError::NotPositive("horizon"));
        }
        if self.samples_per_instrument == 0 {
            return Err(ConfigError::NotPositive("samples_per_instrument"));
        }
        if !(self.risk_per_trade > 0.0) {
            return Err(ConfigError::NotPositive("risk_per_trade"));
        }
        if !(self.bp_min <= self.bp_max) {
            return Err(ConfigError::BuyingPowerRange {
                min: self.bp_min,
                max: self.bp_max,
            });
        }
        if !(self.min_price <= self.max_price) {
            return Err(ConfigError::PriceBand {
                min: self.min_price,
                max: self.max_price,
            });
        }
        if self.take_profit_ratios.is_empty() {
            return Err(ConfigError::NoRatios);
        }
        if let Some(&bad) = self.take_profit_ratios.iter().find(|r| !(**r > 0.0)) {
            return Err(ConfigError::InvalidRatio(bad));
        }
        if !self
            .take_profit_ratios
            .iter()
            .any(|r| (r - self.reference_ratio).abs() < f64::EPSILON)
        {
            return Err(ConfigError::UnknownReferenceRatio(self.reference_ratio));
        }
        Ok(())
    }
}
