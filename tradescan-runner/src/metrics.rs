//! Performance metrics: pure functions over a list of simulated trades.
//!
//! The equity curve is additive, `1 + cumsum(weighted returns)` in exit
//! order, matching a single position sized by the score multiple.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use tradescan_core::domain::{ExitReason, SimulatedTrade};

/// Score buckets: label and half-open score range.
pub const SCORE_BUCKETS: [(&str, f64, f64); 5] = [
    ("<60", f64::NEG_INFINITY, 60.0),
    ("60-70", 60.0, 70.0),
    ("70-80", 70.0, 80.0),
    ("80-90", 80.0, 90.0),
    ("90+", 90.0, f64::INFINITY),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitCounts {
    pub stop: usize,
    pub target: usize,
    pub time: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBucket {
    pub label: String,
    pub trades: usize,
    /// Mean raw return of the bucket's trades, `None` when empty.
    pub mean_return: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
    /// Distance below the running peak as a negative fraction.
    pub drawdown: f64,
}

/// Aggregate performance of one replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub trade_count: usize,
    pub win_rate: f64,
    pub mean_return: f64,
    pub mean_weighted_return: f64,
    /// `mean_weighted_return * win_rate`, the optimizer objective.
    pub fitness: f64,
    pub final_equity: f64,
    pub max_drawdown: f64,
    pub exits: ExitCounts,
    pub score_buckets: Vec<ScoreBucket>,
}

impl PerformanceMetrics {
    pub fn compute(trades: &[SimulatedTrade]) -> Self {
        let curve = equity_curve(trades);
        let equity: Vec<f64> = curve.iter().map(|p| p.equity).collect();
        let win_rate = win_rate(trades);
        let mean_weighted_return = mean(trades.iter().map(SimulatedTrade::weighted_return));
        Self {
            trade_count: trades.len(),
            win_rate,
            mean_return: mean(trades.iter().map(|t| t.return_fraction)),
            mean_weighted_return,
            fitness: mean_weighted_return * win_rate,
            final_equity: equity.last().copied().unwrap_or(1.0),
            max_drawdown: max_drawdown(&equity),
            exits: exit_counts(trades),
            score_buckets: score_buckets(trades),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Arithmetic mean, 0.0 for an empty input.
pub fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

/// Fraction of trades with a positive weighted return.
pub fn win_rate(trades: &[SimulatedTrade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().filter(|t| t.is_win()).count() as f64 / trades.len() as f64
}

/// Additive equity by exit date; trades closing the same day keep entry order.
pub fn equity_curve(trades: &[SimulatedTrade]) -> Vec<EquityPoint> {
    let mut ordered: Vec<&SimulatedTrade> = trades.iter().collect();
    ordered.sort_by_key(|t| t.exit_date);

    let mut equity = 1.0;
    let mut peak = 1.0_f64;
    ordered
        .into_iter()
        .map(|t| {
            equity += t.weighted_return();
            peak = peak.max(equity);
            EquityPoint {
                date: t.exit_date,
                equity,
                drawdown: drawdown(equity, peak),
            }
        })
        .collect()
}

fn drawdown(equity: f64, peak: f64) -> f64 {
    if peak > 0.0 {
        (equity - peak) / peak
    } else {
        0.0
    }
}

/// Maximum drawdown as a negative fraction (e.g., -0.15 = 15% drawdown).
///
/// The starting equity of 1.0 counts as the first peak.
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    let mut peak = 1.0_f64;
    let mut max_dd = 0.0_f64;
    for &eq in equity_curve {
        peak = peak.max(eq);
        max_dd = max_dd.min(drawdown(eq, peak));
    }
    max_dd
}

pub fn exit_counts(trades: &[SimulatedTrade]) -> ExitCounts {
    trades.iter().fold(ExitCounts::default(), |mut c, t| {
        match t.exit_reason {
            ExitReason::Stop => c.stop += 1,
            ExitReason::Target => c.target += 1,
            ExitReason::Time => c.time += 1,
        }
        c
    })
}

pub fn score_buckets(trades: &[SimulatedTrade]) -> Vec<ScoreBucket> {
    SCORE_BUCKETS
        .iter()
        .map(|&(label, lo, hi)| {
            let returns: Vec<f64> = trades
                .iter()
                .filter(|t| t.score >= lo && t.score < hi)
                .map(|t| t.return_fraction)
                .collect();
            ScoreBucket {
                label: label.to_string(),
                trades: returns.len(),
                mean_return: (!returns.is_empty()).then(|| mean(returns.iter().copied())),
            }
        })
        .collect()
}
