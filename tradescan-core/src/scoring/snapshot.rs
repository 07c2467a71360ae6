//! Candidate snapshots and the cross-sectional relative-strength rank.

use serde::Serialize;

use crate::domain::Symbol;

/// Scalar inputs for scoring one instrument on one date.
///
/// Fallbacks for undefined indicators are applied by whoever builds the
/// snapshot; every field here is a concrete number.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateSnapshot {
    pub symbol: Symbol,
    pub price: f64,
    pub ma20: f64,
    pub ma60: f64,
    pub slope: f64,
    pub atr: f64,
    pub volume_ratio: f64,
    /// Raw relative strength versus the benchmark.
    pub rs_raw: f64,
    /// Percentile rank of `rs_raw` within the day's candidate set, in (0, 1].
    pub rs_rank: f64,
    pub rsi: f64,
}

/// `(1 + r_instrument) / (1 + r_benchmark)` over the same window.
///
/// Undefined when either return is missing or the benchmark factor is not
/// positive. Undefined candidates are excluded from ranking, never
/// defaulted to a neutral 1.0.
pub fn relative_strength(instrument_return: Option<f64>, benchmark_return: Option<f64>) -> Option<f64> {
    let r_inst = instrument_return.filter(|r| r.is_finite())?;
    let r_bench = benchmark_return.filter(|r| r.is_finite())?;
    let denom = 1.0 + r_bench;
    if denom <= 0.0 {
        return None;
    }
    Some((1.0 + r_inst) / denom).filter(|rs| rs.is_finite())
}

/// Percentile ranks in (0, 1]: average 1-based rank of ties divided by n.
pub fn percentile_ranks(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; n];
    let mut start = 0;
    while start < n {
        let mut end = start;
        while end + 1 < n && values[order[end + 1]] == values[order[start]] {
            end += 1;
        }
        // 1-based positions start+1 ..= end+1
        let avg_rank = (start + end + 2) as f64 / 2.0;
        for &idx in &order[start..=end] {
            ranks[idx] = avg_rank / n as f64;
        }
        start = end + 1;
    }
    ranks
}

/// Fill `rs_rank` for the whole candidate set. This is the synchronization
/// point of a scan: it needs every candidate's `rs_raw`.
pub fn assign_rs_ranks(candidates: &mut [CandidateSnapshot]) {
    let raw: Vec<f64> = candidates.iter().map(|c| c.rs_raw).collect();
    for (candidate, rank) in candidates.iter_mut().zip(percentile_ranks(&raw)) {
        candidate.rs_rank = rank;
    }
}
