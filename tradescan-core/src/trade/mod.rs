//! Trade parameterization: levels, sizing and the entry gate.

pub mod gate;
pub mod levels;
pub mod params;
pub mod sizing;

pub use gate::{bias_pct, EntryGate, GateDecision};
pub use levels::{is_uptrend, trade_levels, TradeLevels};
pub use params::{trade_style, RegimeTradeTable, TradeParams};
pub use sizing::{position_size, PositionTier, SizingMode};
