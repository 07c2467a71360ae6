//! Market data boundary.
//!
//! "No data" is an empty series, never an error: unknown symbols and
//! failed fetches both come back empty and the caller skips them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::{BarSeries, Symbol};

/// Fundamental ratios for one instrument.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Fundamentals {
    /// Trailing price/earnings ratio, if the provider has one.
    pub pe_ratio: Option<f64>,
}

impl Fundamentals {
    pub fn with_pe(pe_ratio: f64) -> Self {
        Self {
            pe_ratio: Some(pe_ratio),
        }
    }

    pub fn is_unavailable(&self) -> bool {
        self.pe_ratio.is_none()
    }

    /// Earnings per share implied by `price / pe`. `None` unless P/E is positive.
    pub fn eps_from_price(&self, price: f64) -> Option<f64> {
        self.pe_ratio
            .filter(|pe| pe.is_finite() && *pe > 0.0)
            .map(|pe| price / pe)
    }
}

/// Source of bar history and fundamentals.
///
/// `lookback_days` is in calendar days counted back from the latest bar.
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    fn get_bars(&self, symbol: &str, lookback_days: usize) -> BarSeries;

    fn get_benchmark(&self, lookback_days: usize) -> BarSeries;

    fn get_fundamentals(&self, symbol: &str) -> Fundamentals;
}

/// Provider over preloaded series.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    benchmark: BarSeries,
    series: HashMap<Symbol, BarSeries>,
    fundamentals: HashMap<Symbol, Fundamentals>,
}

impl InMemoryProvider {
    pub fn new(benchmark: BarSeries) -> Self {
        Self {
            benchmark,
            ..Self::default()
        }
    }

    pub fn with_series(mut self, series: BarSeries) -> Self {
        self.insert(series);
        self
    }

    pub fn with_fundamentals(mut self, symbol: impl Into<Symbol>, fundamentals: Fundamentals) -> Self {
        self.fundamentals.insert(symbol.into(), fundamentals);
        self
    }

    pub fn insert(&mut self, series: BarSeries) {
        self.series.insert(series.symbol().to_string(), series);
    }

    /// Known symbols, sorted.
    pub fn symbols(&self) -> Vec<Symbol> {
        let mut symbols: Vec<Symbol> = self.series.keys().cloned().collect();
        symbols.sort();
        symbols
    }

    pub fn benchmark(&self) -> &BarSeries {
        &self.benchmark
    }

    pub fn series(&self, symbol: &str) -> Option<&BarSeries> {
        self.series.get(symbol)
    }
}

impl MarketDataProvider for InMemoryProvider {
    fn name(&self) -> &str {
        "in_memory"
    }

    fn get_bars(&self, symbol: &str, lookback_days: usize) -> BarSeries {
        self.series
            .get(symbol)
            .map(|s| s.trailing_days(lookback_days))
            .unwrap_or_else(|| BarSeries::empty(symbol))
    }

    fn get_benchmark(&self, lookback_days: usize) -> BarSeries {
        self.benchmark.trailing_days(lookback_days)
    }

    fn get_fundamentals(&self, symbol: &str) -> Fundamentals {
        self.fundamentals.get(symbol).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    fn series(symbol: &str, n: usize) -> BarSeries {
        BarSeries::new(symbol, make_bars(&vec![10.0; n])).unwrap()
    }

    #[test]
    fn unknown_symbol_is_empty() {
        let provider = InMemoryProvider::new(series("BENCH", 10));
        let bars = provider.get_bars("NOPE", 100);
        assert!(bars.is_empty());
        assert_eq!(bars.symbol(), "NOPE");
    }

    #[test]
    fn lookback_trims_history() {
        let provider = InMemoryProvider::new(series("BENCH", 30)).with_series(series("AAA", 30));
        assert_eq!(provider.get_bars("AAA", 9).len(), 10);
        assert_eq!(provider.get_benchmark(400).len(), 30);
        assert_eq!(provider.symbols(), vec!["AAA".to_string()]);
    }

    #[test]
    fn fundamentals_default_unavailable() {
        let provider = InMemoryProvider::new(BarSeries::empty("BENCH"))
            .with_fundamentals("AAA", Fundamentals::with_pe(20.0));
        assert!(provider.get_fundamentals("BBB").is_unavailable());
        let f = provider.get_fundamentals("AAA");
        assert_eq!(f.eps_from_price(100.0), Some(5.0));
    }

    #[test]
    fn eps_requires_positive_pe() {
        assert_eq!(Fundamentals::with_pe(-3.0).eps_from_price(100.0), None);
        assert_eq!(Fundamentals::default().eps_from_price(100.0), None);
    }
}
