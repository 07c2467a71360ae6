//! Property tests for performance metrics over arbitrary trade lists.

use chrono::NaiveDate;
use proptest::prelude::*;
use tradescan_core::domain::{ExitReason, Regime, SimulatedTrade};
use tradescan_runner::metrics::equity_curve;
use tradescan_runner::PerformanceMetrics;

fn arb_trade() -> impl Strategy<Value = SimulatedTrade> {
    (
        0u32..200,
        1u32..30,
        -0.3f64..0.3,
        prop_oneof![Just(0.5), Just(1.0), Just(1.5)],
        0.0f64..100.0,
        prop_oneof![Just(ExitReason::Stop), Just(ExitReason::Target), Just(ExitReason::Time)],
    )
        .prop_map(|(entry, held, ret, size, score, reason)| {
            let base = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
            let entry_date = base + chrono::Duration::days(entry as i64);
            SimulatedTrade {
                symbol: "X".into(),
                entry_date,
                entry_price: 100.0,
                regime: Regime::Trend,
                score,
                exit_date: entry_date + chrono::Duration::days(held as i64),
                exit_price: 100.0 * (1.0 + ret),
                exit_reason: reason,
                return_fraction: ret,
                position_size: size,
            }
        })
}

proptest! {
    #[test]
    fn metrics_are_consistent(trades in prop::collection::vec(arb_trade(), 0..60)) {
        let m = PerformanceMetrics::compute(&trades);
        prop_assert_eq!(m.trade_count, trades.len());
        prop_assert!((0.0..=1.0).contains(&m.win_rate));
        prop_assert!(m.max_drawdown <= 0.0);
        prop_assert_eq!(m.exits.stop + m.exits.target + m.exits.time, trades.len());
        prop_assert_eq!(m.score_buckets.iter().map(|b| b.trades).sum::<usize>(), trades.len());
        prop_assert!((m.fitness - m.mean_weighted_return * m.win_rate).abs() < 1e-12);

        let weighted: f64 = trades.iter().map(|t| t.weighted_return()).sum();
        prop_assert!((m.final_equity - (1.0 + weighted)).abs() < 1e-9);
    }

    #[test]
    fn equity_curve_is_exit_ordered(trades in prop::collection::vec(arb_trade(), 1..60)) {
        let curve = equity_curve(&trades);
        prop_assert_eq!(curve.len(), trades.len());
        for pair in curve.windows(2) {
            prop_assert!(pair[0].date <= pair[1].date);
        }
        for p in &curve {
            prop_assert!(p.drawdown <= 0.0);
        }
    }
}
