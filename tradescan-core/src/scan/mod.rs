//! Live scan: regime once, per-instrument snapshots in parallel, then the
//! cross-sectional rank barrier, scoring, gating and trade levels.

pub mod diagnosis;

use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::data::MarketDataProvider;
use crate::domain::{Bar, Regime, Symbol};
use crate::indicators::{IndicatorSeries, IndicatorSnapshot};
use crate::regime::{try_classify, RegimeInputs, RegimeProfile};
use crate::scoring::{assign_rs_ranks, relative_strength, score_candidate, CandidateSnapshot, FactorWeights, Score};
use crate::strategy::Strategy;
use crate::trade::{
    is_uptrend, trade_levels, trade_style, GateDecision, PositionTier, TradeLevels,
};

pub use diagnosis::{diagnose, Advice, Diagnosis, DiagnosisOutcome, TrendDirection, TrendQuality};

/// ATR fallback as a fraction of price when ATR is undefined or not positive.
pub const ATR_FALLBACK_FRACTION: f64 = 0.02;
/// RSI fallback when undefined.
pub const RSI_FALLBACK: f64 = 50.0;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to build scan worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanConfig {
    /// Calendar days of history requested per instrument.
    pub lookback_days: usize,
    /// Bars required before an instrument is considered.
    pub min_history: usize,
    pub max_picks: usize,
    pub max_price: Option<f64>,
    /// Worker threads for per-instrument work; 0 uses rayon's default.
    pub workers: usize,
    /// Return `Halted` instead of scanning in a VOLATILE market.
    pub halt_in_volatile: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            lookback_days: 400,
            min_history: 60,
            max_picks: 6,
            max_price: None,
            workers: 10,
            halt_in_volatile: true,
        }
    }
}

/// Pre-filter limits for a single candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateFilter {
    pub min_history: usize,
    pub max_price: Option<f64>,
}

/// Build a candidate at bar `index`, or `None` if it does not qualify.
///
/// Qualifying requires enough history, price within `max_price`, stacked
/// averages (MA20 > MA60), a rising MA20 and a defined relative strength.
pub fn build_candidate(
    symbol: &str,
    bars: &[Bar],
    series: &IndicatorSeries,
    index: usize,
    benchmark_return: Option<f64>,
    filter: &CandidateFilter,
) -> Option<CandidateSnapshot> {
    let bar = bars.get(index)?;
    if index + 1 < filter.min_history || index >= series.len() {
        return None;
    }
    let price = bar.close;
    if filter.max_price.is_some_and(|max| price > max) {
        return None;
    }
    let snap: IndicatorSnapshot = series.at(index, price);
    let (ma20, ma60, slope) = (snap.ma20?, snap.ma60?, snap.slope?);
    if !(ma20 > ma60 && slope > 0.0) {
        return None;
    }
    let rs_raw = relative_strength(snap.return20, benchmark_return)?;

    Some(CandidateSnapshot {
        symbol: symbol.to_string(),
        price,
        ma20,
        ma60,
        slope,
        atr: snap
            .atr14
            .filter(|a| *a > 0.0)
            .unwrap_or(price * ATR_FALLBACK_FRACTION),
        volume_ratio: snap.volume_ratio.unwrap_or(0.0),
        rs_raw,
        rs_rank: 0.0,
        rsi: snap.rsi14.unwrap_or(RSI_FALLBACK),
    })
}

/// Rank barrier plus scoring. Highest total first; equal totals keep
/// input order.
pub fn rank_candidates(
    mut candidates: Vec<CandidateSnapshot>,
    weights: &FactorWeights,
) -> Vec<(CandidateSnapshot, Score)> {
    assign_rs_ranks(&mut candidates);
    let mut scored: Vec<(CandidateSnapshot, Score)> = candidates
        .into_iter()
        .map(|c| {
            let score = score_candidate(&c, weights);
            (c, score)
        })
        .collect();
    scored.sort_by(|a, b| b.1.total.total_cmp(&a.1.total));
    scored
}

/// One pick of a live scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedSignal {
    /// 1-based position in the output.
    pub rank: usize,
    pub candidate: CandidateSnapshot,
    pub score: Score,
    pub levels: TradeLevels,
    pub tier: PositionTier,
    pub gate: GateDecision,
}

/// Context shared by every outcome of a scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanContext {
    pub regime: Regime,
    /// Regime could not be computed and defaulted to RANGE.
    pub regime_failed_closed: bool,
    pub profile: RegimeProfile,
    pub trade_style: &'static str,
    /// Instruments requested.
    pub universe: usize,
    /// Instruments passing the pre-filter.
    pub qualified: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ScanOutcome {
    Picks {
        context: ScanContext,
        picks: Vec<RankedSignal>,
    },
    /// Nothing met the selection threshold (or every survivor was banned).
    NoCandidates { context: ScanContext },
    /// VOLATILE market with the circuit breaker enabled.
    Halted { context: ScanContext },
}

impl ScanOutcome {
    pub fn context(&self) -> &ScanContext {
        match self {
            ScanOutcome::Picks { context, .. }
            | ScanOutcome::NoCandidates { context }
            | ScanOutcome::Halted { context } => context,
        }
    }

    pub fn picks(&self) -> &[RankedSignal] {
        match self {
            ScanOutcome::Picks { picks, .. } => picks,
            _ => &[],
        }
    }
}

/// Live scanner bound to one provider and strategy.
pub struct Scanner<'a, P: MarketDataProvider> {
    provider: &'a P,
    strategy: &'a Strategy,
    config: ScanConfig,
    pool: rayon::ThreadPool,
}

impl<'a, P: MarketDataProvider> Scanner<'a, P> {
    pub fn new(provider: &'a P, strategy: &'a Strategy, config: ScanConfig) -> Result<Self, ScanError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .build()?;
        Ok(Self {
            provider,
            strategy,
            config,
            pool,
        })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn scan(&self, universe: &[Symbol]) -> ScanOutcome {
        let benchmark = self.provider.get_benchmark(self.config.lookback_days);
        let bench_series = IndicatorSeries::compute(benchmark.bars());
        let bench_snap = bench_series.latest(benchmark.bars());

        let classified = bench_snap
            .as_ref()
            .and_then(|s| try_classify(&RegimeInputs::from_snapshot(s), &self.strategy.regime));
        let regime = classified.unwrap_or(Regime::Range);
        if classified.is_none() {
            warn!(bars = benchmark.len(), "benchmark unavailable, regime fails closed to RANGE");
        }
        let benchmark_return = bench_snap.and_then(|s| s.return20);

        let mut context = ScanContext {
            regime,
            regime_failed_closed: classified.is_none(),
            profile: RegimeProfile::for_regime(regime),
            trade_style: trade_style(regime),
            universe: universe.len(),
            qualified: 0,
        };
        info!(%regime, universe = universe.len(), "scan started");

        if regime == Regime::Volatile && self.config.halt_in_volatile {
            info!("VOLATILE regime, scan halted");
            return ScanOutcome::Halted { context };
        }

        let filter = CandidateFilter {
            min_history: self.config.min_history,
            max_price: self.config.max_price,
        };
        // Workers join here before the rank barrier
        let candidates: Vec<CandidateSnapshot> = self.pool.install(|| {
            universe
                .par_iter()
                .filter_map(|symbol| {
                    let series = self.provider.get_bars(symbol, self.config.lookback_days);
                    if series.is_empty() {
                        debug!(%symbol, "no data, skipped");
                        return None;
                    }
                    let bars = series.bars();
                    let indicators = IndicatorSeries::compute(bars);
                    let candidate =
                        build_candidate(symbol, bars, &indicators, bars.len() - 1, benchmark_return, &filter);
                    if candidate.is_none() {
                        debug!(%symbol, bars = bars.len(), "did not qualify");
                    }
                    candidate
                })
                .collect()
        });
        context.qualified = candidates.len();

        let weights = self.strategy.weights.for_regime(regime);
        let threshold = self.strategy.selection.for_regime(regime);
        let params = self.strategy.trade_params.for_regime(regime);

        let picks: Vec<RankedSignal> = rank_candidates(candidates, &weights)
            .into_iter()
            .filter(|(_, score)| score.total >= threshold)
            .filter_map(|(candidate, score)| {
                let gate = self
                    .strategy
                    .gate
                    .decide_for(candidate.price, Some(candidate.ma20), candidate.rsi);
                if gate == GateDecision::Ban {
                    debug!(symbol = %candidate.symbol, rsi = candidate.rsi, "banned by entry gate");
                    return None;
                }
                let uptrend = is_uptrend(candidate.ma20, candidate.ma60, candidate.slope);
                let levels = trade_levels(candidate.price, candidate.atr, &params, Some(candidate.ma20), uptrend);
                Some(RankedSignal {
                    rank: 0,
                    tier: PositionTier::from_score(score.total),
                    candidate,
                    score,
                    levels,
                    gate,
                })
            })
            .take(self.config.max_picks)
            .enumerate()
            .map(|(i, mut pick)| {
                pick.rank = i + 1;
                pick
            })
            .collect();

        info!(
            %regime,
            qualified = context.qualified,
            picks = picks.len(),
            threshold,
            "scan finished"
        );
        if picks.is_empty() {
            ScanOutcome::NoCandidates { context }
        } else {
            ScanOutcome::Picks { context, picks }
        }
    }
}
