//! Market regime label.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse market condition derived from the benchmark, recomputed per date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Regime {
    Trend,
    Range,
    Volatile,
}

impl Regime {
    pub const ALL: [Regime; 3] = [Regime::Trend, Regime::Range, Regime::Volatile];

    pub fn as_str(&self) -> &'static str {
        match self {
            Regime::Trend => "TREND",
            Regime::Range => "RANGE",
            Regime::Volatile => "VOLATILE",
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
