//! TradeScan Runner: historical replay of the signal engine.
//!
//! This crate builds on `tradescan-core` to provide:
//! - CSV directory loading and a CSV-backed market data provider
//! - Date-by-date replay with forward trade simulation
//! - Performance metrics over simulated trades
//! - Weight-grid optimizer
//! - JSON, CSV and Markdown export

pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod optimizer;
pub mod replay;
pub mod runner;
pub mod simulate;

pub use config::{BacktestConfig, ConfigError, UniverseSubset};
pub use data_loader::{
    discover_symbols, load_market_data, load_series, synthetic_market, CsvProvider, LoadError,
    MarketData,
};
pub use metrics::{EquityPoint, PerformanceMetrics};
pub use optimizer::{Optimizer, SweepEntry, SweepResults, WeightGrid};
pub use replay::{run_replay, DayOutcome, PreparedData, Replay, ReplayStats};
pub use runner::{run_backtest, run_backtest_prepared, BacktestResult, RunError};
pub use simulate::{simulate_trade, TradeExit};
