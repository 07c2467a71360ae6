//! Forward trade simulation against bars after the entry date.
//!
//! Each day the stop is checked before the target, so a bar touching both
//! exits at the stop. Gaps through a level still fill at the level.

use chrono::NaiveDate;
use serde::Serialize;

use tradescan_core::domain::{Bar, ExitReason};
use tradescan_core::trade::TradeLevels;

/// How and when a simulated position closed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TradeExit {
    pub date: NaiveDate,
    pub price: f64,
    pub reason: ExitReason,
    /// `(price - entry) / entry`.
    pub return_fraction: f64,
    /// Bars walked, including the exit bar.
    pub bars_held: usize,
}

/// Walk at most `max_holding_days` of `future`.
///
/// Returns `None` when there is no future bar to walk.
pub fn simulate_trade(
    entry_price: f64,
    levels: &TradeLevels,
    future: &[Bar],
    max_holding_days: usize,
) -> Option<TradeExit> {
    let window = &future[..future.len().min(max_holding_days)];
    let exit = |bar: &Bar, price: f64, reason: ExitReason, held: usize| TradeExit {
        date: bar.date,
        price,
        reason,
        return_fraction: (price - entry_price) / entry_price,
        bars_held: held,
    };

    for (i, bar) in window.iter().enumerate() {
        if bar.low <= levels.stop {
            return Some(exit(bar, levels.stop, ExitReason::Stop, i + 1));
        }
        if bar.high >= levels.target {
            return Some(exit(bar, levels.target, ExitReason::Target, i + 1));
        }
    }
    let last = window.last()?;
    Some(exit(last, last.close, ExitReason::Time, window.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(day: u32, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            open: close,
            high,
            low,
            close,
            volume: 1,
        }
    }

    const LEVELS: TradeLevels = TradeLevels {
        stop: 95.0,
        target: 110.0,
    };

    #[test]
    fn stop_touched_before_target() {
        let future = [
            bar(1, 105.0, 97.0, 101.0),
            bar(2, 108.0, 96.0, 99.0),
            bar(3, 104.0, 95.0, 96.0),
            bar(4, 112.0, 100.0, 111.0),
        ];
        let exit = simulate_trade(100.0, &LEVELS, &future, 30).unwrap();
        assert_eq!(exit.reason, ExitReason::Stop);
        assert_eq!(exit.date, future[2].date);
        assert!((exit.return_fraction - (-0.05)).abs() < 1e-12);
        assert_eq!(exit.bars_held, 3);
    }

    #[test]
    fn bar_touching_both_levels_stops_out() {
        let future = [bar(1, 111.0, 94.0, 100.0)];
        let exit = simulate_trade(100.0, &LEVELS, &future, 30).unwrap();
        assert_eq!(exit.reason, ExitReason::Stop);
    }

    #[test]
    fn target_fills_at_target() {
        let future = [bar(1, 104.0, 99.0, 103.0), bar(2, 115.0, 102.0, 114.0)];
        let exit = simulate_trade(100.0, &LEVELS, &future, 30).unwrap();
        assert_eq!(exit.reason, ExitReason::Target);
        assert_eq!(exit.price, 110.0);
        assert!((exit.return_fraction - 0.1).abs() < 1e-12);
    }

    #[test]
    fn time_exit_at_last_close_of_holding_window() {
        let future = [
            bar(1, 104.0, 99.0, 101.0),
            bar(2, 105.0, 99.0, 102.0),
            bar(3, 112.0, 99.0, 111.0),
        ];
        let exit = simulate_trade(100.0, &LEVELS, &future, 2).unwrap();
        assert_eq!(exit.reason, ExitReason::Time);
        assert_eq!(exit.price, 102.0);
        assert_eq!(exit.date, future[1].date);
        assert_eq!(exit.bars_held, 2);
    }

    #[test]
    fn no_future_bars_means_no_trade() {
        assert!(simulate_trade(100.0, &LEVELS, &[], 30).is_none());
        assert!(simulate_trade(100.0, &LEVELS, &[bar(1, 101.0, 99.0, 100.0)], 0).is_none());
    }
}
