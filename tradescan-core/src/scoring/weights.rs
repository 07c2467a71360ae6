//! Regime-dependent factor weights.

use serde::{Deserialize, Serialize};

use crate::domain::Regime;
use crate::strategy::ConfigError;

/// Maximum distance of the weight sum from 1.0.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Trend/momentum/risk weight triple. Components are finite, non-negative
/// and sum to 1.0 (within [`WEIGHT_SUM_TOLERANCE`]).
///
/// Construction and deserialization both validate; there is no way to hold
/// an unnormalized triple.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawWeights")]
pub struct FactorWeights {
    trend: f64,
    momentum: f64,
    risk: f64,
}

#[derive(Deserialize)]
struct RawWeights {
    trend: f64,
    momentum: f64,
    risk: f64,
}

impl TryFrom<RawWeights> for FactorWeights {
    type Error = ConfigError;

    fn try_from(raw: RawWeights) -> Result<Self, Self::Error> {
        FactorWeights::new(raw.trend, raw.momentum, raw.risk)
    }
}

impl FactorWeights {
    pub fn new(trend: f64, momentum: f64, risk: f64) -> Result<Self, ConfigError> {
        for (name, value) in [("trend", trend), ("momentum", momentum), ("risk", risk)] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidWeight {
                    component: name,
                    value,
                });
            }
        }
        let sum = trend + momentum + risk;
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::WeightSum { sum });
        }
        Ok(Self {
            trend,
            momentum,
            risk,
        })
    }

    pub fn trend(&self) -> f64 {
        self.trend
    }

    pub fn momentum(&self) -> f64 {
        self.momentum
    }

    pub fn risk(&self) -> f64 {
        self.risk
    }
}

/// One weight triple per regime, looked up exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegimeWeights {
    pub trend: FactorWeights,
    pub range: FactorWeights,
    pub volatile: FactorWeights,
}

impl RegimeWeights {
    /// Same triple for every regime (used by the weight sweep).
    pub fn uniform(weights: FactorWeights) -> Self {
        Self {
            trend: weights,
            range: weights,
            volatile: weights,
        }
    }

    pub fn for_regime(&self, regime: Regime) -> FactorWeights {
        match regime {
            Regime::Trend => self.trend,
            Regime::Range => self.range,
            Regime::Volatile => self.volatile,
        }
    }
}

impl Default for RegimeWeights {
    /// Trend-heavy in TREND, risk-heavy in RANGE, momentum-heavy in VOLATILE.
    fn default() -> Self {
        Self {
            trend: FactorWeights {
                trend: 0.6,
                momentum: 0.3,
                risk: 0.1,
            },
            range: FactorWeights {
                trend: 0.4,
                momentum: 0.2,
                risk: 0.4,
            },
            volatile: FactorWeights {
                trend: 0.3,
                momentum: 0.4,
                risk: 0.3,
            },
        }
    }
}
