//! Stop-coefficient calibration
//!
//! Candidates come from the empirical worst adverse excursion of sampled
//! entries, measured in ATR units over the horizon. Each candidate sizes a
//! position that risks a fixed amount; the mean buying power of those
//! positions over a second, independent sample decides which candidate wins.
//!
//! Buying power is `price * risk / (c * atr)`, which falls as `c` grows, so the
//! first ascending candidate inside the target range is also the smallest
//! in-range candidate of a full scan.

use ordered_float::OrderedFloat;
use statrs::statistics::Statistics;
use tracing::debug;

use crate::{Bar, Entry, Selection, SkipReason};

/// Target window for the mean buying power at a fixed per-trade risk
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuyingPowerTarget {
    pub min: f64,
    pub max: f64,
    pub risk_per_trade: f64,
}

impl BuyingPowerTarget {
    pub fn contains(&self, bp: f64) -> bool {
        self.min <= bp && bp <= self.max
    }

    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }
}

impl From<&crate::Config> for BuyingPowerTarget {
    fn from(config: &crate::Config) -> Self {
        BuyingPowerTarget {
            min: config.bp_min,
            max: config.bp_max,
            risk_per_trade: config.risk_per_trade,
        }
    }
}

/// Selected coefficient and the entries its buying power was measured on
#[derive(Debug, Clone, PartialEq)]
pub struct Calibration {
    pub coefficient: f64,
    pub bp_mean: f64,
    pub selection: Selection,
    pub pool_size: usize,
    pub entries: Vec<Entry>,
}

/// Ascending pool of adverse-excursion coefficients
///
/// For each sampled index: `(close - lowest low over the next horizon bars) / atr`.
/// Indices without ATR, with zero ATR, or with a non-positive excursion are
/// dropped.
pub fn stop_coefficient_pool(
    bars: &[Bar],
    atr: &[Option<f64>],
    sample: &[usize],
    horizon: usize,
) -> Vec<f64> {
    let mut pool: Vec<f64> = sample
        .iter()
        .filter_map(|&idx| {
            let atr_val = atr.get(idx).copied().flatten()?;
            if atr_val == 0.0 || atr_val.is_nan() {
                return None;
            }

            let end = (idx + horizon).min(bars.len().saturating_sub(1));
            if end <= idx {
                return None;
            }
            let min_low = bars[idx + 1..=end]
                .iter()
                .map(|b| b.low)
                .fold(f64::INFINITY, f64::min);

            let coef = (bars[idx].close - min_low) / atr_val;
            (coef > 0.0 && coef.is_finite()).then_some(coef)
        })
        .collect();

    pool.sort_by_key(|&c| OrderedFloat(c));
    pool
}

/// Sampled indices with a positive ATR, as `(index, close, atr)` entries
pub fn evaluation_entries(bars: &[Bar], atr: &[Option<f64>], sample: &[usize]) -> Vec<Entry> {
    sample
        .iter()
        .filter_map(|&idx| {
            let atr_val = atr.get(idx).copied().flatten()?;
            (atr_val > 0.0).then(|| Entry {
                index: idx,
                price: bars[idx].close,
                atr: atr_val,
            })
        })
        .collect()
}

/// Mean buying power needed to risk `risk_per_trade` with stop `coefficient * atr`
///
/// `None` when no entry yields a positive stop distance.
pub fn mean_buying_power(coefficient: f64, entries: &[Entry], risk_per_trade: f64) -> Option<f64> {
    let bps: Vec<f64> = entries
        .iter()
        .filter_map(|e| {
            let distance = coefficient * e.atr;
            if distance > 0.0 {
                let shares = risk_per_trade / distance;
                Some(e.price * shares)
            } else {
                None
            }
        })
        .collect();

    if bps.is_empty() {
        None
    } else {
        Some(bps.iter().mean())
    }
}

/// `(coefficient, mean buying power)` for every candidate that has one
pub fn bp_curve(pool: &[f64], entries: &[Entry], risk_per_trade: f64) -> Vec<(f64, f64)> {
    pool.iter()
        .filter(|&&c| c > 0.0)
        .filter_map(|&c| mean_buying_power(c, entries, risk_per_trade).map(|bp| (c, bp)))
        .collect()
}

/// Pick a coefficient from an ascending pool
///
/// Returns the first candidate whose mean buying power is in range. Failing
/// that, the candidate closest to the range midpoint, ties going to the
/// earliest. Evaluations from the first pass are reused for the fallback.
pub fn select_coefficient(
    pool: &[f64],
    entries: &[Entry],
    target: BuyingPowerTarget,
) -> Option<(f64, f64, Selection)> {
    let mut evaluated: Vec<(f64, f64)> = Vec::with_capacity(pool.len());

    for &c in pool {
        if c <= 0.0 {
            continue;
        }
        let Some(bp) = mean_buying_power(c, entries, target.risk_per_trade) else {
            continue;
        };
        if target.contains(bp) {
            return Some((c, bp, Selection::InRange));
        }
        evaluated.push((c, bp));
    }

    let midpoint = target.midpoint();
    let mut best: Option<(f64, f64, f64)> = None;
    for (c, bp) in evaluated {
        let dist = (bp - midpoint).abs();
        if best.is_none_or(|(_, _, best_dist)| dist < best_dist) {
            best = Some((c, bp, dist));
        }
    }

    best.map(|(c, bp, _)| (c, bp, Selection::ClosestToMidpoint))
}

/// Run both calibration phases for one instrument
pub fn calibrate(
    bars: &[Bar],
    atr: &[Option<f64>],
    distribution_sample: &[usize],
    evaluation_sample: &[usize],
    horizon: usize,
    target: BuyingPowerTarget,
) -> Result<Calibration, SkipReason> {
    let pool = stop_coefficient_pool(bars, atr, distribution_sample, horizon);
    if pool.is_empty() {
        return Err(SkipReason::NoStopCoefficients);
    }
    debug!(
        "Coefficient pool: {} values, range {:.4}..{:.4}",
        pool.len(),
        pool[0],
        pool[pool.len() - 1]
    );

    let entries = evaluation_entries(bars, atr, evaluation_sample);
    let (coefficient, bp_mean, selection) =
        select_coefficient(&pool, &entries, target).ok_or(SkipReason::NoValidCoefficient)?;

    let entries = entries
        .into_iter()
        .filter(|e| coefficient * e.atr > 0.0)
        .collect();

    Ok(Calibration {
        coefficient,
        bp_mean,
        selection,
        pool_size: pool.len(),
        entries,
    })
}
