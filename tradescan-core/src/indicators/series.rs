//! Per-instrument indicator bundle, aligned 1:1 with a bar series.
//!
//! Computed once over full history. Because every indicator is causal,
//! `at(i)` equals what a fresh computation over `bars[..=i]` would report.

use serde::Serialize;

use super::{value_at, Adx, Atr, Indicator, Obv, Roc, Rsi, Slope, Sma, VolumeMa, VolumeRatio};
use crate::domain::Bar;

/// Full indicator series for one instrument or the benchmark.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IndicatorSeries {
    pub ma5: Vec<f64>,
    pub ma20: Vec<f64>,
    pub ma60: Vec<f64>,
    pub slope: Vec<f64>,
    pub atr14: Vec<f64>,
    pub adx14: Vec<f64>,
    pub rsi14: Vec<f64>,
    pub obv: Vec<f64>,
    pub volume_ma20: Vec<f64>,
    pub volume_ratio: Vec<f64>,
    pub return20: Vec<f64>,
}

/// Indicator values at one bar. `None` means the value is undefined there.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IndicatorSnapshot {
    pub close: f64,
    pub ma5: Option<f64>,
    pub prev_ma5: Option<f64>,
    pub ma20: Option<f64>,
    pub prev_ma20: Option<f64>,
    pub ma60: Option<f64>,
    pub slope: Option<f64>,
    pub atr14: Option<f64>,
    pub adx14: Option<f64>,
    pub rsi14: Option<f64>,
    pub obv: Option<f64>,
    pub volume_ratio: Option<f64>,
    pub return20: Option<f64>,
}

impl IndicatorSeries {
    pub fn compute(bars: &[Bar]) -> Self {
        Self {
            ma5: Sma::new(5).compute(bars),
            ma20: Sma::new(20).compute(bars),
            ma60: Sma::new(60).compute(bars),
            slope: Slope::default_params().compute(bars),
            atr14: Atr::new(14).compute(bars),
            adx14: Adx::new(14).compute(bars),
            rsi14: Rsi::new(14).compute(bars),
            obv: Obv::new().compute(bars),
            volume_ma20: VolumeMa::new(20).compute(bars),
            volume_ratio: VolumeRatio::new(20).compute(bars),
            return20: Roc::new(20).compute(bars),
        }
    }

    pub fn len(&self) -> usize {
        self.ma20.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ma20.is_empty()
    }

    /// Snapshot at bar `index`. `close` must be the close of that bar.
    pub fn at(&self, index: usize, close: f64) -> IndicatorSnapshot {
        let prev = |series: &[f64]| index.checked_sub(1).and_then(|p| value_at(series, p));
        IndicatorSnapshot {
            close,
            ma5: value_at(&self.ma5, index),
            prev_ma5: prev(&self.ma5),
            ma20: value_at(&self.ma20, index),
            prev_ma20: prev(&self.ma20),
            ma60: value_at(&self.ma60, index),
            slope: value_at(&self.slope, index),
            atr14: value_at(&self.atr14, index),
            adx14: value_at(&self.adx14, index),
            rsi14: value_at(&self.rsi14, index),
            obv: value_at(&self.obv, index),
            volume_ratio: value_at(&self.volume_ratio, index),
            return20: value_at(&self.return20, index),
        }
    }

    /// Snapshot at the final bar, or `None` for an empty series.
    pub fn latest(&self, bars: &[Bar]) -> Option<IndicatorSnapshot> {
        let last = bars.last()?;
        Some(self.at(bars.len() - 1, last.close))
    }
}
