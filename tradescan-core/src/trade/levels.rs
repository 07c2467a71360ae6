//! Stop and target levels.
//!
//! The ATR stop may be tightened up to MA20 in an uptrend, never loosened.

use serde::Serialize;

use super::params::TradeParams;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TradeLevels {
    pub stop: f64,
    pub target: f64,
}

/// Uptrend test used for stop tightening: stacked averages and rising MA20.
pub fn is_uptrend(ma20: f64, ma60: f64, slope: f64) -> bool {
    ma20 > ma60 && slope > 0.0
}

pub fn atr_stop(price: f64, atr: f64, multiple: f64) -> f64 {
    price - atr * multiple
}

pub fn atr_target(price: f64, atr: f64, multiple: f64) -> f64 {
    price + atr * multiple
}

/// Raise `stop` to MA20 when in an uptrend with `stop < ma20 < price`.
pub fn tighten_to_ma20(stop: f64, ma20: Option<f64>, price: f64, uptrend: bool) -> f64 {
    match ma20 {
        Some(ma) if uptrend && ma > stop && ma < price => stop.max(ma),
        _ => stop,
    }
}

/// Levels from regime parameters.
pub fn trade_levels(
    price: f64,
    atr: f64,
    params: &TradeParams,
    ma20: Option<f64>,
    uptrend: bool,
) -> TradeLevels {
    let stop = atr_stop(price, atr, params.stop_multiple);
    TradeLevels {
        stop: tighten_to_ma20(stop, ma20, price, uptrend),
        target: atr_target(price, atr, params.target_multiple),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::assert_approx;

    const TREND: TradeParams = TradeParams::new(1.5, 3.5, 30);

    #[test]
    fn price_below_ma20_keeps_atr_stop() {
        let levels = trade_levels(100.0, 3.0, &TREND, Some(105.0), true);
        assert_approx(levels.stop, 95.5, 1e-12);
        assert_approx(levels.target, 110.5, 1e-12);
    }

    #[test]
    fn uptrend_tightens_to_ma20() {
        let levels = trade_levels(100.0, 3.0, &TREND, Some(97.0), true);
        assert_eq!(levels.stop, 97.0);
    }

    #[test]
    fn no_tightening_outside_uptrend() {
        let levels = trade_levels(100.0, 3.0, &TREND, Some(97.0), false);
        assert_approx(levels.stop, 95.5, 1e-12);
    }

    #[test]
    fn ma20_below_stop_never_loosens() {
        let levels = trade_levels(100.0, 3.0, &TREND, Some(90.0), true);
        assert_approx(levels.stop, 95.5, 1e-12);
    }

    #[test]
    fn uptrend_test() {
        assert!(is_uptrend(101.0, 100.0, 0.1));
        assert!(!is_uptrend(101.0, 100.0, 0.0));
        assert!(!is_uptrend(99.0, 100.0, 1.0));
    }
}
