//! Date-by-date replay of the live selection model over history.
//!
//! Indicators are computed once per instrument over full history and
//! indexed by date; causality makes that identical to recomputing on the
//! truncated history every day. Each evaluation date classifies the
//! benchmark once, ranks the day's candidates, keeps the top pick above the
//! regime threshold and simulates it forward.

use std::collections::HashMap;
use std::ops::Range;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use tradescan_core::domain::{BarSeries, Regime, SimulatedTrade, Symbol};
use tradescan_core::indicators::{value_at, IndicatorSeries};
use tradescan_core::regime::classify_at;
use tradescan_core::scan::{build_candidate, rank_candidates, CandidateFilter};
use tradescan_core::trade::{is_uptrend, position_size, trade_levels, GateDecision};
use tradescan_core::Strategy;

use crate::config::BacktestConfig;
use crate::data_loader::MarketData;
use crate::runner::RunError;
use crate::simulate::simulate_trade;

/// A bar series with its indicator bundle.
#[derive(Debug, Clone)]
pub struct PreparedSeries {
    pub bars: BarSeries,
    pub indicators: IndicatorSeries,
}

impl PreparedSeries {
    pub fn new(bars: BarSeries) -> Self {
        let indicators = IndicatorSeries::compute(bars.bars());
        Self { bars, indicators }
    }
}

/// Market data with indicators precomputed, shared read-only across replays.
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub benchmark: PreparedSeries,
    pub instruments: Vec<PreparedSeries>,
    by_symbol: HashMap<Symbol, usize>,
}

impl PreparedData {
    pub fn new(data: &MarketData) -> Self {
        let instruments: Vec<PreparedSeries> = data
            .instruments
            .par_iter()
            .map(|s| PreparedSeries::new(s.clone()))
            .collect();
        let by_symbol = instruments
            .iter()
            .enumerate()
            .map(|(i, s)| (s.bars.symbol().to_string(), i))
            .collect();
        Self {
            benchmark: PreparedSeries::new(data.benchmark.clone()),
            instruments,
            by_symbol,
        }
    }

    pub fn instrument(&self, symbol: &str) -> Option<&PreparedSeries> {
        self.by_symbol.get(symbol).map(|&i| &self.instruments[i])
    }

    /// Benchmark bar indices evaluated by a replay.
    pub fn evaluation_range(&self, config: &BacktestConfig) -> Result<Range<usize>, RunError> {
        let bars = self.benchmark.bars.len();
        let end = bars.saturating_sub(config.reserve_bars);
        if config.warmup_bars >= end {
            return Err(RunError::InvalidWindow {
                bars,
                warmup: config.warmup_bars,
                reserve: config.reserve_bars,
            });
        }
        Ok(config.warmup_bars..end)
    }
}

/// What happened on one evaluation date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayOutcome {
    /// No instrument passed the pre-filter.
    NoCandidates,
    /// The best candidate scored under the regime threshold.
    BelowThreshold,
    /// Every candidate above the threshold was banned by the entry gate.
    Banned,
    /// The top pick was gated to WAIT.
    Deferred,
    /// The sizing mode gave the top pick no position.
    ZeroSize,
    /// The top pick had no bar after the entry date.
    NoFutureBars,
    Traded,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegimeCounts {
    pub trend: usize,
    pub range: usize,
    pub volatile: usize,
}

/// Per-outcome day counts for one replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayStats {
    pub days: usize,
    pub traded: usize,
    pub no_candidates: usize,
    pub below_threshold: usize,
    pub banned: usize,
    pub deferred: usize,
    pub zero_size: usize,
    pub no_future_bars: usize,
    pub regimes: RegimeCounts,
}

impl ReplayStats {
    pub fn record(&mut self, regime: Regime, outcome: DayOutcome) {
        self.days += 1;
        match regime {
            Regime::Trend => self.regimes.trend += 1,
            Regime::Range => self.regimes.range += 1,
            Regime::Volatile => self.regimes.volatile += 1,
        }
        let counter = match outcome {
            DayOutcome::NoCandidates => &mut self.no_candidates,
            DayOutcome::BelowThreshold => &mut self.below_threshold,
            DayOutcome::Banned => &mut self.banned,
            DayOutcome::Deferred => &mut self.deferred,
            DayOutcome::ZeroSize => &mut self.zero_size,
            DayOutcome::NoFutureBars => &mut self.no_future_bars,
            DayOutcome::Traded => &mut self.traded,
        };
        *counter += 1;
    }
}

/// Trades of one replay, in entry order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Replay {
    pub trades: Vec<SimulatedTrade>,
    pub stats: ReplayStats,
}

/// Evaluate benchmark bar `index`.
pub fn replay_day(
    data: &PreparedData,
    strategy: &Strategy,
    config: &BacktestConfig,
    index: usize,
) -> (Regime, DayOutcome, Option<SimulatedTrade>) {
    let bench = &data.benchmark;
    let bench_bars = bench.bars.bars();
    let regime = classify_at(&bench.indicators, bench_bars, index, &strategy.regime);
    let Some(date) = bench_bars.get(index).map(|b| b.date) else {
        return (regime, DayOutcome::NoCandidates, None);
    };
    let benchmark_return = value_at(&bench.indicators.return20, index);

    let filter = CandidateFilter {
        min_history: config.min_history,
        max_price: None,
    };
    // Instruments without a bar on this date are not candidates
    let candidates: Vec<_> = data
        .instruments
        .iter()
        .filter_map(|inst| {
            let i = inst.bars.index_of(date)?;
            build_candidate(
                inst.bars.symbol(),
                inst.bars.bars(),
                &inst.indicators,
                i,
                benchmark_return,
                &filter,
            )
        })
        .collect();
    if candidates.is_empty() {
        return (regime, DayOutcome::NoCandidates, None);
    }

    let threshold = strategy.selection.for_regime(regime);
    let mut above = rank_candidates(candidates, &strategy.weights.for_regime(regime))
        .into_iter()
        .filter(|(_, score)| score.total >= threshold)
        .peekable();
    if above.peek().is_none() {
        return (regime, DayOutcome::BelowThreshold, None);
    }

    let pick = if config.apply_entry_gate {
        above
            .map(|(c, s)| {
                let gate = strategy.gate.decide_for(c.price, Some(c.ma20), c.rsi);
                (c, s, gate)
            })
            .find(|(_, _, gate)| *gate != GateDecision::Ban)
    } else {
        above.next().map(|(c, s)| (c, s, GateDecision::Pass))
    };
    let Some((candidate, score, gate)) = pick else {
        return (regime, DayOutcome::Banned, None);
    };
    if gate == GateDecision::Wait {
        debug!(%date, symbol = %candidate.symbol, "top pick deferred by entry gate");
        return (regime, DayOutcome::Deferred, None);
    }

    let size = position_size(score.total, config.sizing);
    if size <= 0.0 {
        return (regime, DayOutcome::ZeroSize, None);
    }

    let Some(inst) = data.instrument(&candidate.symbol) else {
        return (regime, DayOutcome::NoFutureBars, None);
    };
    let bars = inst.bars.bars();
    let entry = inst.bars.index_of(date).unwrap_or(bars.len());
    let start = (entry + 1).min(bars.len());
    let future = &bars[start..(start + config.forward_bars).min(bars.len())];

    let params = strategy.trade_params.for_regime(regime);
    let uptrend = is_uptrend(candidate.ma20, candidate.ma60, candidate.slope);
    let levels = trade_levels(candidate.price, candidate.atr, &params, Some(candidate.ma20), uptrend);
    let Some(exit) = simulate_trade(candidate.price, &levels, future, params.max_holding_days) else {
        return (regime, DayOutcome::NoFutureBars, None);
    };

    debug!(
        %date,
        symbol = %candidate.symbol,
        score = score.total,
        reason = ?exit.reason,
        ret = exit.return_fraction,
        "simulated trade"
    );
    let trade = SimulatedTrade {
        symbol: candidate.symbol,
        entry_date: date,
        entry_price: candidate.price,
        regime,
        score: score.total,
        exit_date: exit.date,
        exit_price: exit.price,
        exit_reason: exit.reason,
        return_fraction: exit.return_fraction,
        position_size: size,
    };
    (regime, DayOutcome::Traded, Some(trade))
}

/// Replay every evaluation date in order.
pub fn run_replay(
    data: &PreparedData,
    strategy: &Strategy,
    config: &BacktestConfig,
) -> Result<Replay, RunError> {
    let range = data.evaluation_range(config)?;
    let mut replay = Replay::default();
    for index in range {
        let (regime, outcome, trade) = replay_day(data, strategy, config, index);
        replay.stats.record(regime, outcome);
        replay.trades.extend(trade);
    }
    info!(
        strategy = %strategy.name,
        days = replay.stats.days,
        trades = replay.trades.len(),
        "replay finished"
    );
    Ok(replay)
}
