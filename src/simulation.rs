//! Barrier-touch simulation
//!
//! Each entry gets a stop below and one take-profit above per ratio. The scan
//! walks forward from the bar after entry to the end of the series and stops
//! at the first bar whose low reaches the stop or whose high reaches the
//! target. Which barrier fired is not distinguished.

use crate::{Bar, Entry};

/// Bars from entry until the first touch of `stop` or `target`
///
/// Returns the 1-based offset of the touching bar, the number of remaining bars
/// if nothing is touched, and 0 when the entry is the last bar.
pub fn bars_to_touch(bars: &[Bar], entry_index: usize, stop: f64, target: f64) -> usize {
    let remaining = bars.get(entry_index + 1..).unwrap_or(&[]);

    remaining
        .iter()
        .position(|b| b.low <= stop || b.high >= target)
        .map(|offset| offset + 1)
        .unwrap_or(remaining.len())
}

/// Durations per ratio across all entries
///
/// The outer vector is aligned with `ratios`; each inner vector holds one
/// duration per entry, in entry order.
pub fn simulate_durations(
    bars: &[Bar],
    entries: &[Entry],
    coefficient: f64,
    ratios: &[f64],
) -> Vec<Vec<usize>> {
    let mut durations: Vec<Vec<usize>> = ratios
        .iter()
        .map(|_| Vec::with_capacity(entries.len()))
        .collect();

    for entry in entries {
        let risk = coefficient * entry.atr;
        let stop = entry.price - risk;

        for (ratio, out) in ratios.iter().zip(durations.iter_mut()) {
            let target = entry.price + ratio * risk;
            out.push(bars_to_touch(bars, entry.index, stop, target));
        }
    }

    durations
}

/// Arithmetic mean of durations, 0 for an empty list
pub fn average_duration(durations: &[usize]) -> f64 {
    if durations.is_empty() {
        return 0.0;
    }
    durations.iter().sum::<usize>() as f64 / durations.len() as f64
}
