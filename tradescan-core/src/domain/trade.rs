//! Simulated trade record produced by the backtest replay.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Regime;

/// Why a simulated trade was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitReason {
    Stop,
    Target,
    Time,
}

/// One replayed selection, immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedTrade {
    pub symbol: String,
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub regime: Regime,
    pub score: f64,
    pub exit_date: NaiveDate,
    pub exit_price: f64,
    pub exit_reason: ExitReason,
    /// `(exit_price - entry_price) / entry_price`.
    pub return_fraction: f64,
    /// Position-size multiple applied for equity aggregation.
    pub position_size: f64,
}

impl SimulatedTrade {
    /// Return scaled by the position-size multiple.
    pub fn weighted_return(&self) -> f64 {
        self.return_fraction * self.position_size
    }

    pub fn is_win(&self) -> bool {
        self.weighted_return() > 0.0
    }
}
