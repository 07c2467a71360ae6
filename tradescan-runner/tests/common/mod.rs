//! Shared deterministic market fixtures.

#![allow(dead_code)]

use chrono::NaiveDate;
use tradescan_core::domain::{Bar, BarSeries};
use tradescan_runner::MarketData;

/// Odd bars gain `up`, even bars lose `down`; a negative `down` makes a
/// straight ramp.
pub fn zigzag(symbol: &str, n: usize, start: f64, up: f64, down: f64) -> BarSeries {
    let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let mut bars = Vec::with_capacity(n);
    let mut prev = start;
    for i in 0..n {
        let close = match i {
            0 => start,
            i if i % 2 == 1 => prev + up,
            _ => prev - down,
        };
        bars.push(Bar {
            date: base + chrono::Duration::days(i as i64),
            open: prev,
            high: prev.max(close) + 0.5,
            low: prev.min(close) - 0.5,
            close,
            volume: 1_000,
        });
        prev = close;
    }
    BarSeries::new(symbol, bars).unwrap()
}

/// Trending benchmark with two steadily rising instruments and one faller.
pub fn trending_market(n: usize) -> MarketData {
    MarketData::new(
        zigzag("BENCH", n, 100.0, 1.0, 0.5),
        vec![
            zigzag("FAST", n, 50.0, 2.0, 1.0),
            zigzag("SLOW", n, 50.0, 1.2, 1.0),
            zigzag("DOWN", n, 80.0, 1.0, 1.5),
        ],
        false,
    )
}

pub fn csv_body(series: &BarSeries) -> String {
    let mut out = String::from("date,open,high,low,close,volume\n");
    for b in series.bars() {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.date, b.open, b.high, b.low, b.close, b.volume
        ));
    }
    out
}
