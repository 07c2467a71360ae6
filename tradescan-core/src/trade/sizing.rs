//! Score → position size multiplier.

use serde::{Deserialize, Serialize};

/// Discrete tiers of the live signal path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PositionTier {
    Aggressive,
    Standard,
    Light,
    Flat,
}

impl PositionTier {
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            PositionTier::Aggressive
        } else if score >= 80.0 {
            PositionTier::Standard
        } else if score >= 70.0 {
            PositionTier::Light
        } else {
            PositionTier::Flat
        }
    }

    pub fn multiplier(self) -> f64 {
        match self {
            PositionTier::Aggressive => 1.5,
            PositionTier::Standard => 1.0,
            PositionTier::Light => 0.5,
            PositionTier::Flat => 0.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PositionTier::Aggressive => "aggressive (1.5x)",
            PositionTier::Standard => "standard (1.0x)",
            PositionTier::Light => "light (0.5x)",
            PositionTier::Flat => "stand aside (0x)",
        }
    }
}

/// How a score maps to a size multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizingMode {
    /// Step tiers at 70/80/90.
    #[default]
    Tiered,
    /// `0.5 + (score - 60) / 40` rounded to cents, zero below 60.
    Linear,
}

pub fn position_size(score: f64, mode: SizingMode) -> f64 {
    match mode {
        SizingMode::Tiered => PositionTier::from_score(score).multiplier(),
        SizingMode::Linear => {
            if score < 60.0 {
                0.0
            } else {
                ((0.5 + (score - 60.0) / 40.0) * 100.0).round() / 100.0
            }
        }
    }
}
