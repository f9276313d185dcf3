//! Entry-candidate selection and seeded sampling
//!
//! Valid indices have a completed ATR window behind them and a full horizon
//! ahead. Candidates are the valid indices whose close sits inside the price
//! band. Sampling draws without replacement from a `StdRng` seeded per draw,
//! so the same input and seed always produce the same indices.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::ops::Range;

use crate::Bar;

/// Indices `atr_period .. len - horizon`; empty when the series is too short
pub fn valid_indices(len: usize, atr_period: usize, horizon: usize) -> Range<usize> {
    let end = len.saturating_sub(horizon);
    if end <= atr_period {
        return 0..0;
    }
    atr_period..end
}

/// Valid indices whose close lies in `[min_price, max_price]`
pub fn eligible_candidates(
    bars: &[Bar],
    valid: Range<usize>,
    min_price: f64,
    max_price: f64,
) -> Vec<usize> {
    valid
        .filter(|&i| {
            let close = bars[i].close;
            min_price <= close && close <= max_price
        })
        .collect()
}

/// Draw up to `size` distinct candidates
///
/// When there are no more candidates than `size`, all of them are returned in
/// their original order.
pub fn sample_candidates(candidates: &[usize], size: usize, seed: u64) -> Vec<usize> {
    if candidates.len() <= size {
        return candidates.to_vec();
    }

    let mut rng = StdRng::seed_from_u64(seed);
    candidates.choose_multiple(&mut rng, size).copied().collect()
}
