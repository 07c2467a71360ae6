//! Multi-factor scoring: trend, momentum and risk sub-scores blended by a
//! regime-selected weight triple, plus the conjunctive A+ bonus.

use serde::Serialize;

use super::snapshot::CandidateSnapshot;
use super::weights::FactorWeights;

/// ATR-to-price ratio the risk factor rewards.
pub const TARGET_ATR_FRACTION: f64 = 0.03;
/// Volume ratio at the peak of the momentum bell curve.
pub const VOLUME_SWEET_SPOT: f64 = 2.0;
/// Points added for an exceptional setup (before the 100 clip).
pub const EXCEPTIONAL_BONUS: f64 = 15.0;

const EXCEPTIONAL_MIN_RS_RANK: f64 = 0.85;
const EXCEPTIONAL_VOLUME_BAND: (f64, f64) = (1.5, 2.5);
const EXCEPTIONAL_MIN_RISK: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Score {
    pub trend: f64,
    pub momentum: f64,
    pub risk: f64,
    /// Weighted blend plus bonus, clipped to [0, 100].
    pub total: f64,
    pub is_exceptional: bool,
}

fn clip(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

pub fn trend_subscore(rs_rank: f64, ma20: f64, ma60: f64) -> f64 {
    let stacked = if ma20 > ma60 { 100.0 } else { 0.0 };
    clip(0.7 * (rs_rank * 100.0) + 0.3 * stacked)
}

/// Positive slope only, as a fraction of price, scaled by 1000.
pub fn slope_component(slope: f64, price: f64) -> f64 {
    let slope_pct = if price > 0.0 { slope / price } else { 0.0 };
    if slope_pct > 0.0 {
        (slope_pct * 1000.0).min(100.0)
    } else {
        0.0
    }
}

/// Bell curve centred on a 2x volume surge.
pub fn volume_component(volume_ratio: f64) -> f64 {
    100.0 * (-((volume_ratio - VOLUME_SWEET_SPOT).powi(2)) / 2.0).exp()
}

pub fn momentum_subscore(slope: f64, price: f64, volume_ratio: f64) -> f64 {
    clip(0.4 * slope_component(slope, price) + 0.6 * volume_component(volume_ratio))
}

pub fn risk_subscore(atr: f64, price: f64) -> f64 {
    let atr_pct = if price > 0.0 { atr / price } else { TARGET_ATR_FRACTION };
    clip(100.0 - 2000.0 * (atr_pct - TARGET_ATR_FRACTION).abs())
}

/// All five A+ conditions at once.
pub fn is_exceptional(candidate: &CandidateSnapshot, risk: f64) -> bool {
    let (vol_lo, vol_hi) = EXCEPTIONAL_VOLUME_BAND;
    candidate.rs_rank >= EXCEPTIONAL_MIN_RS_RANK
        && candidate.ma20 > candidate.ma60
        && candidate.slope > 0.0
        && (vol_lo..=vol_hi).contains(&candidate.volume_ratio)
        && risk > EXCEPTIONAL_MIN_RISK
}

pub fn score_candidate(candidate: &CandidateSnapshot, weights: &FactorWeights) -> Score {
    let trend = trend_subscore(candidate.rs_rank, candidate.ma20, candidate.ma60);
    let momentum = momentum_subscore(candidate.slope, candidate.price, candidate.volume_ratio);
    let risk = risk_subscore(candidate.atr, candidate.price);

    let weighted =
        clip(trend * weights.trend() + momentum * weights.momentum() + risk * weights.risk());
    let exceptional = is_exceptional(candidate, risk);
    let total = if exceptional {
        clip(weighted + EXCEPTIONAL_BONUS)
    } else {
        weighted
    };

    Score {
        trend,
        momentum,
        risk,
        total,
        is_exceptional: exceptional,
    }
}
