//! Entry gate: an independent veto evaluated after scoring.

use serde::{Deserialize, Serialize};

/// Gate verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GateDecision {
    /// Enter.
    Pass,
    /// Extended from MA20; wait for a pullback.
    Wait,
    /// Overheated; drop from ranked output.
    Ban,
}

impl GateDecision {
    pub fn as_str(self) -> &'static str {
        match self {
            GateDecision::Pass => "PASS",
            GateDecision::Wait => "WAIT",
            GateDecision::Ban => "BAN",
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            GateDecision::Pass => "within limits",
            GateDecision::Wait => "price stretched too far above MA20",
            GateDecision::Ban => "momentum overheated",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryGate {
    /// Bias (% above MA20) beyond which entry waits.
    pub max_bias_pct: f64,
    /// RSI beyond which entry is banned.
    pub max_rsi: f64,
}

impl Default for EntryGate {
    fn default() -> Self {
        Self {
            max_bias_pct: 12.0,
            max_rsi: 85.0,
        }
    }
}

/// Percent distance of price from a moving average. `None` when the
/// average is undefined or zero.
pub fn bias_pct(price: f64, ma: Option<f64>) -> Option<f64> {
    let ma = ma.filter(|m| m.is_finite() && *m != 0.0)?;
    Some((price - ma) / ma * 100.0)
}

impl EntryGate {
    /// Bias is checked before RSI; a missing bias skips that check.
    pub fn decide(&self, bias: Option<f64>, rsi: f64) -> GateDecision {
        if bias.is_some_and(|b| b > self.max_bias_pct) {
            GateDecision::Wait
        } else if rsi > self.max_rsi {
            GateDecision::Ban
        } else {
            GateDecision::Pass
        }
    }

    pub fn decide_for(&self, price: f64, ma20: Option<f64>, rsi: f64) -> GateDecision {
        self.decide(bias_pct(price, ma20), rsi)
    }
}
