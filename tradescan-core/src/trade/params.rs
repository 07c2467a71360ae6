//! Regime → stop/target multiples and holding period.

use serde::{Deserialize, Serialize};

use crate::domain::Regime;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeParams {
    /// Stop distance in ATRs below entry.
    pub stop_multiple: f64,
    /// Target distance in ATRs above entry.
    pub target_multiple: f64,
    /// Trading days before a time exit.
    pub max_holding_days: usize,
}

impl TradeParams {
    pub const fn new(stop_multiple: f64, target_multiple: f64, max_holding_days: usize) -> Self {
        Self {
            stop_multiple,
            target_multiple,
            max_holding_days,
        }
    }
}

/// Exhaustive per-regime trade parameter table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegimeTradeTable {
    pub trend: TradeParams,
    pub range: TradeParams,
    pub volatile: TradeParams,
}

impl RegimeTradeTable {
    pub fn for_regime(&self, regime: Regime) -> TradeParams {
        match regime {
            Regime::Trend => self.trend,
            Regime::Range => self.range,
            Regime::Volatile => self.volatile,
        }
    }
}

impl Default for RegimeTradeTable {
    fn default() -> Self {
        Self {
            trend: TradeParams::new(1.5, 3.5, 30),
            range: TradeParams::new(1.0, 1.5, 10),
            volatile: TradeParams::new(2.0, 2.0, 5),
        }
    }
}

/// Trade style label shown with each pick.
pub fn trade_style(regime: Regime) -> &'static str {
    match regime {
        Regime::Trend => "trend continuation",
        Regime::Range => "range breakout",
        Regime::Volatile => "volatility rebound",
    }
}
