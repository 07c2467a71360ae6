//! TradeScan Core: the trading signal engine.
//!
//! - Domain types (bars, regimes, simulated trades)
//! - Causal indicator library with explicit "no value" warmup
//! - Benchmark regime classifier (fails closed to RANGE)
//! - Candlestick pattern cascade
//! - Regime-weighted multi-factor scoring with the A+ bonus
//! - Trade levels, position sizing and the entry gate
//! - Versioned strategy table, data boundary, live scan and diagnosis

pub mod data;
pub mod domain;
pub mod indicators;
pub mod pattern;
pub mod regime;
pub mod report;
pub mod rng;
pub mod scan;
pub mod scoring;
pub mod strategy;
pub mod trade;

pub use strategy::{ConfigError, Strategy};
