//! Domain types for the signal engine.

pub mod bar;
pub mod regime;
pub mod trade;

pub use bar::{Bar, BarError, BarSeries};
pub use regime::Regime;
pub use trade::{ExitReason, SimulatedTrade};

/// Symbol type alias
pub type Symbol = String;
