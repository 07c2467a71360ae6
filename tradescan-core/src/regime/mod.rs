//! Market regime classification from benchmark indicators.
//!
//! Precedence is fixed: TREND, then RANGE, then VOLATILE. Missing or
//! undefined inputs fail closed to RANGE, which drives the smallest sizing
//! and tightest stops downstream.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::{Bar, Regime};
use crate::indicators::{IndicatorSeries, IndicatorSnapshot};

/// Classification thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegimeThresholds {
    /// ADX must exceed this (with MA20 > MA60) for TREND.
    pub adx_trend: f64,
    /// ATR/close below this is RANGE.
    pub atr_fraction_range: f64,
}

impl Default for RegimeThresholds {
    fn default() -> Self {
        Self {
            adx_trend: 25.0,
            atr_fraction_range: 0.012,
        }
    }
}

/// The four benchmark values the classifier reads, plus close.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RegimeInputs {
    pub ma20: Option<f64>,
    pub ma60: Option<f64>,
    pub adx14: Option<f64>,
    pub atr14: Option<f64>,
    pub close: Option<f64>,
}

impl RegimeInputs {
    pub fn new(ma20: f64, ma60: f64, adx14: f64, atr14: f64, close: f64) -> Self {
        Self {
            ma20: Some(ma20),
            ma60: Some(ma60),
            adx14: Some(adx14),
            atr14: Some(atr14),
            close: Some(close),
        }
    }

    pub fn from_snapshot(snapshot: &IndicatorSnapshot) -> Self {
        Self {
            ma20: snapshot.ma20,
            ma60: snapshot.ma60,
            adx14: snapshot.adx14,
            atr14: snapshot.atr14,
            close: Some(snapshot.close).filter(|c| c.is_finite()),
        }
    }
}

/// Pure classification of already-computed benchmark values.
///
/// Returns `None` when any input is undefined or close is not positive.
pub fn try_classify(inputs: &RegimeInputs, thresholds: &RegimeThresholds) -> Option<Regime> {
    let ma20 = inputs.ma20?;
    let ma60 = inputs.ma60?;
    let adx = inputs.adx14?;
    let atr = inputs.atr14?;
    let close = inputs.close.filter(|c| *c > 0.0)?;

    let regime = if ma20 > ma60 && adx > thresholds.adx_trend {
        Regime::Trend
    } else if atr / close < thresholds.atr_fraction_range {
        Regime::Range
    } else {
        Regime::Volatile
    };
    Some(regime)
}

/// Classification that fails closed to RANGE.
pub fn classify(inputs: &RegimeInputs, thresholds: &RegimeThresholds) -> Regime {
    try_classify(inputs, thresholds).unwrap_or(Regime::Range)
}

/// Classify the benchmark at bar `index` of a precomputed series.
pub fn classify_at(
    series: &IndicatorSeries,
    bars: &[Bar],
    index: usize,
    thresholds: &RegimeThresholds,
) -> Regime {
    match bars.get(index) {
        Some(bar) if index < series.len() => {
            classify(&RegimeInputs::from_snapshot(&series.at(index, bar.close)), thresholds)
        }
        _ => Regime::Range,
    }
}

/// Classify the benchmark's latest bar, computing indicators from scratch.
pub fn classify_benchmark(bars: &[Bar], thresholds: &RegimeThresholds) -> Regime {
    if bars.is_empty() {
        warn!("benchmark series is empty, regime fails closed to RANGE");
        return Regime::Range;
    }
    let series = IndicatorSeries::compute(bars);
    let inputs = series
        .latest(bars)
        .map(|s| RegimeInputs::from_snapshot(&s))
        .unwrap_or_default();
    try_classify(&inputs, thresholds).unwrap_or_else(|| {
        warn!(bars = bars.len(), "benchmark history too short, regime fails closed to RANGE");
        Regime::Range
    })
}

/// Operating guidance attached to each regime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegimeProfile {
    pub regime: Regime,
    /// Maximum concurrent positions recommended.
    pub max_positions: usize,
    pub headline: &'static str,
    pub guidance: &'static str,
}

impl RegimeProfile {
    pub fn for_regime(regime: Regime) -> Self {
        match regime {
            Regime::Trend => Self {
                regime,
                max_positions: 2,
                headline: "Market: trending, suitable for new entries",
                guidance: "Trade with the trend.",
            },
            Regime::Range => Self {
                regime,
                max_positions: 1,
                headline: "Market: range-bound, prefer to wait",
                guidance: "Beginners stay flat; experienced traders work the range.",
            },
            Regime::Volatile => Self {
                regime,
                max_positions: 0,
                headline: "Market: volatile, no new entries",
                guidance: "Strict risk control; open no new positions.",
            },
        }
    }

    pub fn commentary(&self) -> String {
        let quota = if self.max_positions == 0 {
            "no new positions".to_string()
        } else {
            format!("at most {}", self.max_positions)
        };
        format!("{}\nStrategy: {}\nQuota: {}.", self.headline, self.guidance, quota)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    fn th() -> RegimeThresholds {
        RegimeThresholds::default()
    }

    #[test]
    fn trend_when_ma_stacked_and_adx_strong() {
        let inputs = RegimeInputs::new(110.0, 100.0, 30.0, 1.0, 110.0);
        assert_eq!(classify(&inputs, &th()), Regime::Trend);
    }

    #[test]
    fn trend_takes_precedence_over_range() {
        // ATR fraction is tiny, but TREND is checked first
        let inputs = RegimeInputs::new(110.0, 100.0, 26.0, 0.1, 110.0);
        assert_eq!(classify(&inputs, &th()), Regime::Trend);
    }

    #[test]
    fn range_when_quiet() {
        let inputs = RegimeInputs::new(100.0, 105.0, 30.0, 1.0, 100.0);
        assert_eq!(classify(&inputs, &th()), Regime::Range);
    }

    #[test]
    fn adx_at_threshold_is_not_trend() {
        let inputs = RegimeInputs::new(110.0, 100.0, 25.0, 3.0, 100.0);
        assert_eq!(classify(&inputs, &th()), Regime::Volatile);
    }

    #[test]
    fn volatile_otherwise() {
        let inputs = RegimeInputs::new(100.0, 105.0, 15.0, 2.0, 100.0);
        assert_eq!(classify(&inputs, &th()), Regime::Volatile);
    }

    #[test]
    fn undefined_input_fails_closed() {
        let mut inputs = RegimeInputs::new(100.0, 105.0, 15.0, 2.0, 100.0);
        inputs.adx14 = None;
        assert_eq!(try_classify(&inputs, &th()), None);
        assert_eq!(classify(&inputs, &th()), Regime::Range);
    }

    #[test]
    fn empty_benchmark_is_range() {
        assert_eq!(classify_benchmark(&[], &th()), Regime::Range);
    }

    #[test]
    fn short_benchmark_is_range() {
        let bars = make_bars(&[100.0; 30]);
        assert_eq!(classify_benchmark(&bars, &th()), Regime::Range);
    }

    #[test]
    fn classify_at_out_of_bounds_is_range() {
        let bars = make_bars(&[100.0; 5]);
        let series = IndicatorSeries::compute(&bars);
        assert_eq!(classify_at(&series, &bars, 10, &th()), Regime::Range);
    }

    #[test]
    fn profile_quotas() {
        assert_eq!(RegimeProfile::for_regime(Regime::Trend).max_positions, 2);
        assert_eq!(RegimeProfile::for_regime(Regime::Range).max_positions, 1);
        assert_eq!(RegimeProfile::for_regime(Regime::Volatile).max_positions, 0);
        assert!(RegimeProfile::for_regime(Regime::Volatile)
            .commentary()
            .contains("no new positions"));
    }
}
