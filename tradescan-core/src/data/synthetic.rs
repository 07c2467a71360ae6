//! Seeded random-walk bars for demos and tests.

use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::{Bar, BarError, BarSeries};

/// Shape of a generated walk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkParams {
    pub start_price: f64,
    /// Mean daily return.
    pub drift: f64,
    /// Half-width of the uniform daily return band.
    pub volatility: f64,
}

impl Default for WalkParams {
    fn default() -> Self {
        Self {
            start_price: 100.0,
            drift: 0.0005,
            volatility: 0.03,
        }
    }
}

/// `n` weekday bars starting at `start`, deterministic for a given seed.
pub fn random_walk(
    symbol: &str,
    start: NaiveDate,
    n: usize,
    seed: u64,
    params: WalkParams,
) -> Result<BarSeries, BarError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut bars = Vec::with_capacity(n);
    let mut price = params.start_price;
    let mut current = start;

    while bars.len() < n {
        let weekday = current.weekday();
        if weekday == Weekday::Sat || weekday == Weekday::Sun {
            current += chrono::Duration::days(1);
            continue;
        }

        let daily_return: f64 =
            params.drift + rng.gen_range(-params.volatility..=params.volatility);
        let open = price;
        // Floor keeps the walk strictly positive
        let close = (price * (1.0 + daily_return)).max(0.01);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        let volume = rng.gen_range(500_000..5_000_000u64);

        bars.push(Bar {
            date: current,
            open,
            high,
            low,
            close,
            volume,
        });

        price = close;
        current += chrono::Duration::days(1);
    }

    BarSeries::new(symbol, bars)
}

/// Seed for a symbol derived from a master seed, stable across runs.
pub fn symbol_seed(master_seed: u64, symbol: &str) -> u64 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&master_seed.to_le_bytes());
    hasher.update(symbol.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&hasher.finalize().as_bytes()[..8]);
    u64::from_le_bytes(head)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    #[test]
    fn walk_is_deterministic() {
        let a = random_walk("AAA", start(), 100, 42, WalkParams::default()).unwrap();
        let b = random_walk("AAA", start(), 100, 42, WalkParams::default()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 100);
    }

    #[test]
    fn walk_skips_weekends_and_is_sane() {
        let s = random_walk("AAA", start(), 60, 7, WalkParams::default()).unwrap();
        for bar in s.bars() {
            assert!(!matches!(bar.date.weekday(), Weekday::Sat | Weekday::Sun));
            assert!(bar.is_sane(), "insane bar {bar:?}");
        }
    }

    #[test]
    fn symbol_seeds_differ() {
        assert_ne!(symbol_seed(1, "AAA"), symbol_seed(1, "BBB"));
        assert_eq!(symbol_seed(1, "AAA"), symbol_seed(1, "AAA"));
    }
}
