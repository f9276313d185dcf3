//! Per-instrument driver
//!
//! Turns one instrument's bars into an [`InstrumentReport`] or a
//! [`SkipReason`]. Every intermediate (candidates, coefficient pool, entries)
//! is derived here from the instrument's own series and dropped on return.

use std::path::Path;
use tracing::{debug, info};

use crate::calibration::{self, BuyingPowerTarget};
use crate::data;
use crate::indicators;
use crate::sampling;
use crate::simulation;
use crate::{Bar, Config, InstrumentOutcome, InstrumentReport, RatioSummary, SkipReason};

/// Calibrate and simulate one instrument
///
/// Bars are sorted by timestamp before anything else, so callers may pass them
/// in file order.
pub fn analyze_instrument(
    instrument: &str,
    mut bars: Vec<Bar>,
    config: &Config,
) -> Result<InstrumentReport, SkipReason> {
    data::sort_bars(&mut bars);

    let atr = indicators::atr_for_bars(&bars, config.atr_period);

    let valid = sampling::valid_indices(bars.len(), config.atr_period, config.horizon);
    if valid.len() < config.min_valid_indices {
        return Err(SkipReason::InsufficientData {
            valid: valid.len(),
            required: config.min_valid_indices,
        });
    }
    let valid_count = valid.len();

    let candidates =
        sampling::eligible_candidates(&bars, valid, config.min_price, config.max_price);
    if candidates.len() < config.min_candidates {
        return Err(SkipReason::InsufficientCandidates {
            candidates: candidates.len(),
            required: config.min_candidates,
        });
    }

    let distribution_sample = sampling::sample_candidates(
        &candidates,
        config.samples_per_instrument,
        config.distribution_seed,
    );
    let evaluation_sample = sampling::sample_candidates(
        &candidates,
        config.samples_per_instrument,
        config.evaluation_seed,
    );
    debug!(
        "{}: {} bars, {} valid, {} candidates, samples {}/{}",
        instrument,
        bars.len(),
        valid_count,
        candidates.len(),
        distribution_sample.len(),
        evaluation_sample.len()
    );

    let calibration = calibration::calibrate(
        &bars,
        &atr,
        &distribution_sample,
        &evaluation_sample,
        config.horizon,
        BuyingPowerTarget::from(config),
    )?;

    let durations = simulation::simulate_durations(
        &bars,
        &calibration.entries,
        calibration.coefficient,
        &config.take_profit_ratios,
    );

    let ratios = config
        .take_profit_ratios
        .iter()
        .zip(durations.iter())
        .map(|(&ratio, d)| RatioSummary {
            ratio,
            take_profit: ratio * calibration.coefficient,
            avg_duration: simulation::average_duration(d),
        })
        .collect();

    Ok(InstrumentReport {
        instrument: instrument.to_string(),
        coefficient: calibration.coefficient,
        avg_buying_power: calibration.bp_mean,
        selection: calibration.selection,
        bars: bars.len(),
        valid_indices: valid_count,
        candidates: candidates.len(),
        pool_size: calibration.pool_size,
        entries: calibration.entries.len(),
        ratios,
    })
}

/// Load and analyze one instrument file
pub fn analyze_file(path: &Path, config: &Config) -> Result<InstrumentReport, SkipReason> {
    analyze_named_file(&data::instrument_name(path), path, config)
}

fn analyze_named_file(
    instrument: &str,
    path: &Path,
    config: &Config,
) -> Result<InstrumentReport, SkipReason> {
    let bars = data::load_bars(path).map_err(|e| SkipReason::Load(format!("{:#}", e)))?;
    info!("Loaded {} bars for {}", bars.len(), instrument);
    analyze_instrument(instrument, bars, config)
}

/// Analyze one file and wrap the result as an outcome
pub fn process_file(path: &Path, config: &Config) -> InstrumentOutcome {
    let instrument = data::instrument_name(path);
    match analyze_named_file(&instrument, path, config) {
        Ok(report) => InstrumentOutcome::Analyzed(report),
        Err(reason) => InstrumentOutcome::Skipped { instrument, reason },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn constant_bars(n: usize, close: f64) -> Vec<Bar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        (0..n)
            .map(|i| Bar {
                datetime: start + chrono::Duration::minutes(i as i64),
                open: close,
                high: close + 0.1,
                low: close - 0.1,
                close,
            })
            .collect()
    }

    #[test]
    fn test_short_series_is_insufficient_data() {
        let config = Config::default();
        let bars = constant_bars(config.atr_period + config.horizon, 10.0);
        let err = analyze_instrument("SHORT", bars, &config).unwrap_err();
        assert_eq!(
            err,
            SkipReason::InsufficientData {
                valid: 0,
                required: 10
            }
        );
    }

    #[test]
    fn test_out_of_band_prices_are_insufficient_candidates() {
        let config = Config::default();
        let bars = constant_bars(300, 150.0);
        let err = analyze_instrument("PRICEY", bars, &config).unwrap_err();
        assert!(matches!(err, SkipReason::InsufficientCandidates { candidates: 0, .. }));
    }

    #[test]
    fn test_flat_series_has_no_stop_coefficients() {
        // lows sit at the close, so there is never an adverse excursion
        let config = Config::default();
        let bars: Vec<Bar> = constant_bars(300, 10.0)
            .into_iter()
            .map(|mut b| {
                b.low = b.close;
                b
            })
            .collect();
        let err = analyze_instrument("FLAT", bars, &config).unwrap_err();
        assert_eq!(err, SkipReason::NoStopCoefficients);
    }

    #[test]
    fn test_unsorted_input_is_sorted_first() {
        let config = Config {
            atr_period: 5,
            horizon: 5,
            ..Config::default()
        };
        let mut bars = constant_bars(120, 10.0);
        let sorted = analyze_instrument("A", bars.clone(), &config).unwrap();
        bars.reverse();
        let reversed = analyze_instrument("A", bars, &config).unwrap();
        assert_eq!(sorted, reversed);
    }

    #[test]
    fn test_process_file_names_outcome_after_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();

        let missing = process_file(&dir.path().join("GONE.txt"), &config);
        assert_eq!(missing.instrument(), "GONE");
        assert!(matches!(
            missing,
            InstrumentOutcome::Skipped {
                reason: SkipReason::Load(_),
                ..
            }
        ));

        let path = dir.path().join("TINY.txt");
        std::fs::write(
            &path,
            "Date,Time,High,Low,Close\n2024-01-01,09:30,10.1,9.9,10\n",
        )
        .unwrap();
        let tiny = process_file(&path, &config);
        assert_eq!(tiny.instrument(), "TINY");
        assert!(matches!(
            tiny,
            InstrumentOutcome::Skipped {
                reason: SkipReason::InsufficientData { .. },
                ..
            }
        ));
    }
}
