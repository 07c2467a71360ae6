//! Technical indicator library.
//!
//! Indicators are pure functions: bar history in, numeric series out, one
//! value per bar. Leading warmup values are `f64::NAN` ("no value") and are
//! never defaulted to zero here; callers pick their own fallback.
//!
//! All indicators are causal: the value at bar t reads nothing after t, so a
//! series can be precomputed once over full history and indexed by date.

pub mod adx;
pub mod atr;
pub mod obv;
pub mod roc;
pub mod rsi;
pub mod series;
pub mod slope;
pub mod sma;
pub mod volume;

pub use adx::Adx;
pub use atr::{true_range, Atr};
pub use obv::Obv;
pub use roc::Roc;
pub use rsi::Rsi;
pub use series::{IndicatorSeries, IndicatorSnapshot};
pub use slope::Slope;
pub use sma::Sma;
pub use volume::{VolumeMa, VolumeRatio};

use crate::domain::Bar;

/// Trait for indicators.
///
/// `compute` returns a `Vec<f64>` of the same length as `bars`; the first
/// `lookback()` entries are NaN. When the series is too short the whole
/// output is NaN.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_20", "atr_14").
    fn name(&self) -> &str;

    /// Number of leading bars without a value.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;

    /// Compute, distinguishing a usable series from a too-short history.
    fn evaluate(&self, bars: &[Bar]) -> IndicatorResult {
        if bars.len() <= self.lookback() {
            IndicatorResult::InsufficientHistory {
                required: self.lookback() + 1,
                available: bars.len(),
            }
        } else {
            IndicatorResult::Ready(self.compute(bars))
        }
    }
}

/// Typed outcome of an indicator evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorResult {
    Ready(Vec<f64>),
    InsufficientHistory { required: usize, available: usize },
}

impl IndicatorResult {
    pub fn is_ready(&self) -> bool {
        matches!(self, IndicatorResult::Ready(_))
    }

    pub fn series(&self) -> Option<&[f64]> {
        match self {
            IndicatorResult::Ready(values) => Some(values),
            IndicatorResult::InsufficientHistory { .. } => None,
        }
    }

    /// Latest defined value, if the final bar has one.
    pub fn latest(&self) -> Option<f64> {
        self.series().and_then(|v| v.last().copied()).and_then(defined)
    }
}

/// `Some(v)` for finite values, `None` for NaN/inf.
pub fn defined(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Value at `index` if present and defined.
pub fn value_at(series: &[f64], index: usize) -> Option<f64> {
    series.get(index).copied().and_then(defined)
}

/// Trailing-window arithmetic mean. NaN anywhere in the window yields NaN.
///
/// Each window is summed directly so an all-zero window is exactly zero.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    let mut out = rolling_sum(values, window);
    for v in out.iter_mut().filter(|v| !v.is_nan()) {
        *v /= window as f64;
    }
    out
}

/// Trailing-window sum. NaN anywhere in the window yields NaN.
pub fn rolling_sum(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    if window == 0 || n < window {
        return out;
    }
    for i in (window - 1)..n {
        let slice = &values[(i + 1 - window)..=i];
        if slice.iter().any(|v| v.is_nan()) {
            continue;
        }
        out[i] = slice.iter().sum();
    }
    out
}

/// Create synthetic bars from close prices for testing.
///
/// open = prev_close (or close for first bar), high = max(open,close) + 1.0,
/// low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000,
            }
        })
        .collect()
}

/// Create bars from explicit (open, high, low, close) tuples for testing.
#[cfg(test)]
pub fn make_ohlc_bars(data: &[(f64, f64, f64, f64)]) -> Vec<Bar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| Bar {
            date: base_date + chrono::Duration::days(i as i64),
            open,
            high,
            low,
            close,
            volume: 1000,
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rolling_mean_basic() {
        let out = rolling_mean(&[1.0, 2.0, 3.0, 4.0], 2);
        assert!(out[0].is_nan());
        assert_approx(out[1], 1.5, DEFAULT_EPSILON);
        assert_approx(out[3], 3.5, DEFAULT_EPSILON);
    }

    #[test]
    fn rolling_sum_nan_window() {
        let out = rolling_sum(&[1.0, f64::NAN, 3.0, 4.0], 2);
        assert!(out[1].is_nan());
        assert!(out[2].is_nan());
        assert_approx(out[3], 7.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rolling_zero_window_is_exact() {
        let out = rolling_mean(&[0.3, 0.0, 0.0, 0.0], 3);
        assert_eq!(out[3], 0.0);
    }

    #[test]
    fn evaluate_reports_insufficient_history() {
        let bars = make_bars(&[10.0, 11.0]);
        let result = Sma::new(5).evaluate(&bars);
        assert_eq!(
            result,
            IndicatorResult::InsufficientHistory {
                required: 5,
                available: 2
            }
        );
        assert_eq!(result.latest(), None);
    }

    #[test]
    fn evaluate_ready_latest() {
        let bars = make_bars(&[10.0, 11.0, 12.0]);
        let result = Sma::new(3).evaluate(&bars);
        assert!(result.is_ready());
        assert_approx(result.latest().unwrap(), 11.0, DEFAULT_EPSILON);
    }
}
