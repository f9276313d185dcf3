//! Volatility indicators
//!
//! True range and a simple rolling ATR. The moving average is the `ta`
//! crate's `SimpleMovingAverage`; no exponential or Wilder smoothing is
//! applied, so the ATR at index `i` depends only on the true ranges of
//! `[i - period + 1, i]`.

use ta::indicators::SimpleMovingAverage;
use ta::Next;

/// Calculate Simple Moving Average
pub fn sma(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if values.is_empty() || period == 0 {
        return vec![];
    }

    let mut indicator = match SimpleMovingAverage::new(period) {
        Ok(i) => i,
        Err(_) => return vec![None; values.len()],
    };

    let mut result = Vec::with_capacity(values.len());

    for (i, &value) in values.iter().enumerate() {
        let sma_val = indicator.next(value);
        if i + 1 >= period {
            result.push(Some(sma_val));
        } else {
            result.push(None);
        }
    }

    result
}

/// Calculate True Range
///
/// The first bar has no previous close, so its true range is `high - low`.
pub fn true_range(high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
    let mut tr = Vec::with_capacity(high.len());

    for i in 0..high.len() {
        let tr_value = if i == 0 {
            high[i] - low[i]
        } else {
            let hl = high[i] - low[i];
            let hc = (high[i] - close[i - 1]).abs();
            let lc = (low[i] - close[i - 1]).abs();
            hl.max(hc).max(lc)
        };
        tr.push(tr_value);
    }

    tr
}

/// Calculate Average True Range as a simple rolling mean of true range
pub fn atr(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Vec<Option<f64>> {
    if high.is_empty() || period == 0 || high.len() != low.len() || high.len() != close.len() {
        return vec![];
    }

    sma(&true_range(high, low, close), period)
}

/// ATR over a bar series
pub fn atr_for_bars(bars: &[crate::Bar], period: usize) -> Vec<Option<f64>> {
    let high: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let low: Vec<f64> = bars.iter().map(|b| b.low).collect();
    let close: Vec<f64> = bars.iter().map(|b| b.close).collect();
    atr(&high, &low, &close, period)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sma() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = sma(&values, 3);

        assert_eq!(result[0], None);
        assert_eq!(result[1], None);
        assert_relative_eq!(result[2].unwrap(), 2.0, epsilon = 1e-12);
        assert_relative_eq!(result[3].unwrap(), 3.0, epsilon = 1e-12);
        assert_relative_eq!(result[4].unwrap(), 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_true_range_uses_previous_close() {
        let high = vec![10.0, 12.0, 11.0];
        let low = vec![9.0, 11.5, 7.0];
        let close = vec![9.5, 11.8, 8.0];
        let tr = true_range(&high, &low, &close);

        assert_eq!(tr[0], 1.0);
        // gap up: |12 - 9.5| dominates
        assert_eq!(tr[1], 2.5);
        // gap down from 11.8: |7 - 11.8| dominates
        assert_relative_eq!(tr[2], 4.8, epsilon = 1e-12);
    }

    #[test]
    fn test_true_range_wide_bar_uses_high_low() {
        let high = vec![10.0, 13.0];
        let low = vec![9.0, 8.0];
        let close = vec![10.0, 12.0];
        let tr = true_range(&high, &low, &close);

        // 13 - 8 beats |13 - 10| and |8 - 10|
        assert_eq!(tr[1], 5.0);
    }

    #[test]
    fn test_atr_undefined_before_window() {
        let n = 30;
        let high: Vec<f64> = (0..n).map(|i| 101.0 + (i % 3) as f64).collect();
        let low: Vec<f64> = (0..n).map(|i| 99.0 - (i % 2) as f64).collect();
        let close: Vec<f64> = (0..n).map(|_| 100.0).collect();
        let period = 7;

        let values = atr(&high, &low, &close, period);
        assert_eq!(values.len(), n);
        assert!(values[..period - 1].iter().all(|v| v.is_none()));
        assert!(values[period - 1..].iter().all(|v| v.is_some()));
    }

    #[test]
    fn test_atr_matches_windowed_mean() {
        let n = 40;
        let high: Vec<f64> = (0..n).map(|i| 50.0 + ((i * 7) % 5) as f64).collect();
        let low: Vec<f64> = (0..n).map(|i| 45.0 - ((i * 3) % 4) as f64).collect();
        let close: Vec<f64> = (0..n).map(|i| 47.0 + ((i * 5) % 3) as f64).collect();
        let period = 5;

        let tr = true_range(&high, &low, &close);
        let values = atr(&high, &low, &close, period);

        for i in period - 1..n {
            let expected: f64 = tr[i + 1 - period..=i].iter().sum::<f64>() / period as f64;
            assert_relative_eq!(values[i].unwrap(), expected, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_atr_depends_only_on_window() {
        let n = 25;
        let period = 5;
        let high: Vec<f64> = vec![11.0; n];
        let low: Vec<f64> = vec![9.0; n];
        let close: Vec<f64> = vec![10.0; n];

        let base = atr(&high, &low, &close, period);

        // Widen one early bar; values whose window excludes it stay unchanged
        let mut high2 = high.clone();
        high2[3] = 30.0;
        let changed = atr(&high2, &low, &close, period);

        for i in period - 1..n {
            if i >= 3 + period {
                assert_relative_eq!(changed[i].unwrap(), base[i].unwrap(), epsilon = 1e-9);
            }
        }
        assert!(changed[3 + period - 1].unwrap() > base[3 + period - 1].unwrap());
    }

    #[test]
    fn test_atr_mismatched_lengths() {
        assert!(atr(&[1.0, 2.0], &[0.5], &[1.0, 1.5], 1).is_empty());
        assert!(atr(&[1.0], &[0.5], &[1.0], 0).is_empty());
    }
}
