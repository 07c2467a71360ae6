//! Backtest runner: wires replay, metrics and provenance into one result.
//!
//! Two entry points:
//! - `run_backtest()`: takes loaded market data. Used by the CLI.
//! - `run_backtest_prepared()`: takes precomputed indicators. Used by the
//!   optimizer so each weight triple reuses the same indicator pass.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tradescan_core::domain::SimulatedTrade;
use tradescan_core::Strategy;

use crate::config::{BacktestConfig, ConfigError, RunId};
use crate::data_loader::{LoadError, MarketData};
use crate::metrics::{equity_curve, EquityPoint, PerformanceMetrics};
use crate::replay::{run_replay, PreparedData, ReplayStats};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("strategy error: {0}")]
    Strategy(#[from] tradescan_core::ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error(
        "benchmark has {bars} bars, not enough for {warmup} warm-up and {reserve} reserved bars"
    )]
    InvalidWindow {
        bars: usize,
        warmup: usize,
        reserve: usize,
    },
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub strategy: Strategy,
    pub config: BacktestConfig,
    pub metrics: PerformanceMetrics,
    pub stats: ReplayStats,
    pub trades: Vec<SimulatedTrade>,
    pub equity_curve: Vec<EquityPoint>,
    pub start_date: String,
    pub end_date: String,
    pub dataset_hash: String,
    pub has_synthetic: bool,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

pub fn run_backtest(
    data: &MarketData,
    strategy: &Strategy,
    config: &BacktestConfig,
) -> Result<BacktestResult, RunError> {
    let prepared = PreparedData::new(data);
    run_backtest_prepared(&prepared, strategy, config, &data.dataset_hash, data.has_synthetic)
}

/// Run against precomputed indicators. No I/O.
pub fn run_backtest_prepared(
    data: &PreparedData,
    strategy: &Strategy,
    config: &BacktestConfig,
    dataset_hash: &str,
    has_synthetic: bool,
) -> Result<BacktestResult, RunError> {
    strategy.validate()?;
    config.validate()?;
    let range = data.evaluation_range(config)?;
    let replay = run_replay(data, strategy, config)?;

    let bench = data.benchmark.bars.bars();
    let date_at = |i: usize| bench.get(i).map(|b| b.date.to_string()).unwrap_or_default();

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        run_id: config.run_id(strategy),
        strategy: strategy.clone(),
        config: config.clone(),
        metrics: PerformanceMetrics::compute(&replay.trades),
        stats: replay.stats,
        equity_curve: equity_curve(&replay.trades),
        trades: replay.trades,
        start_date: date_at(range.start),
        end_date: date_at(range.end - 1),
        dataset_hash: dataset_hash.to_string(),
        has_synthetic,
    })
}
