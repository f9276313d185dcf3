//! Core data types used across the calibration pipeline

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for bar data
#[derive(Debug, Error)]
pub enum BarValidationError {
    #[error("high ({high}) must be >= low ({low})")]
    HighLessThanLow { high: f64, low: f64 },

    #[error("prices must be finite: open={open}, high={high}, low={low}, close={close}")]
    NonFinitePrice {
        open: f64,
        high: f64,
        low: f64,
        close: f64,
    },
}

/// OHLC bar keyed by the combined Date + Time of the source row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub datetime: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Bar {
    /// Create a new bar with validation
    pub fn new(
        datetime: NaiveDateTime,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
    ) -> Result<Self, BarValidationError> {
        let bar = Self {
            datetime,
            open,
            high,
            low,
            close,
        };
        bar.validate()?;
        Ok(bar)
    }

    /// Validate the bar data
    pub fn validate(&self) -> Result<(), BarValidationError> {
        if !(self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite())
        {
            return Err(BarValidationError::NonFinitePrice {
                open: self.open,
                high: self.high,
                low: self.low,
                close: self.close,
            });
        }

        if self.high < self.low {
            return Err(BarValidationError::HighLessThanLow {
                high: self.high,
                low: self.low,
            });
        }

        Ok(())
    }
}

/// Sampled entry reused unchanged from calibration into barrier simulation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Entry {
    pub index: usize,
    pub price: f64,
    pub atr: f64,
}

/// How the stop coefficient was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selection {
    /// First ascending candidate whose mean buying power lies in the target range
    InRange,
    /// No candidate in range; closest mean buying power to the range midpoint
    ClosestToMidpoint,
}

impl std::fmt::Display for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Selection::InRange => write!(f, "in range"),
            Selection::ClosestToMidpoint => write!(f, "closest to midpoint"),
        }
    }
}

/// Average time-to-touch for one take-profit ratio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioSummary {
    pub ratio: f64,
    /// Take-profit distance in ATR units (ratio x stop coefficient)
    pub take_profit: f64,
    pub avg_duration: f64,
}

/// Per-instrument result record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentReport {
    pub instrument: String,
    pub coefficient: f64,
    pub avg_buying_power: f64,
    pub selection: Selection,
    pub bars: usize,
    pub valid_indices: usize,
    pub candidates: usize,
    pub pool_size: usize,
    pub entries: usize,
    pub ratios: Vec<RatioSummary>,
}

impl InstrumentReport {
    /// Average duration recorded for `ratio`, if it was simulated
    pub fn avg_duration_for(&self, ratio: f64) -> Option<f64> {
        self.ratios
            .iter()
            .find(|r| (r.ratio - ratio).abs() < f64::EPSILON)
            .map(|r| r.avg_duration)
    }
}

/// Why an instrument was left out of the result table
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SkipReason {
    #[error("insufficient data: {valid} valid indices (need {required})")]
    InsufficientData { valid: usize, required: usize },

    #[error("insufficient candidates: {candidates} in price band (need {required})")]
    InsufficientCandidates { candidates: usize, required: usize },

    #[error("no positive stop coefficients generated")]
    NoStopCoefficients,

    #[error("no valid stop coefficient found")]
    NoValidCoefficient,

    #[error("error: {0}")]
    Load(String),
}

/// Outcome of processing one instrument file
#[derive(Debug, Clone)]
pub enum InstrumentOutcome {
    Analyzed(InstrumentReport),
    Skipped { instrument: String, reason: SkipReason },
}

impl InstrumentOutcome {
    pub fn instrument(&self) -> &str {
        match self {
            InstrumentOutcome::Analyzed(report) => &report.instrument,
            InstrumentOutcome::Skipped { instrument, .. } => instrument,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_bar_rejects_inverted_range() {
        let err = Bar::new(ts(), 10.0, 9.0, 11.0, 10.0).unwrap_err();
        assert!(matches!(err, BarValidationError::HighLessThanLow { .. }));
    }

    #[test]
    fn test_bar_rejects_nan() {
        let err = Bar::new(ts(), 10.0, f64::NAN, 9.0, 10.0).unwrap_err();
        assert!(matches!(err, BarValidationError::NonFinitePrice { .. }));
    }

    #[test]
    fn test_skip_reason_messages_are_distinct() {
        let reasons = [
            SkipReason::InsufficientData {
                valid: 3,
                required: 10,
            }
            .to_string(),
            SkipReason::InsufficientCandidates {
                candidates: 2,
                required: 10,
            }
            .to_string(),
            SkipReason::NoStopCoefficients.to_string(),
            SkipReason::NoValidCoefficient.to_string(),
            SkipReason::Load("bad row".into()).to_string(),
        ];
        for (i, a) in reasons.iter().enumerate() {
            for b in reasons.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }
}
