//! Weight-grid sweeps over a fixed market.

mod common;

use common::trending_market;
use tradescan_core::Strategy;
use tradescan_runner::{BacktestConfig, Optimizer, PreparedData, WeightGrid};

fn config() -> BacktestConfig {
    BacktestConfig {
        benchmark: "BENCH".into(),
        ..BacktestConfig::default()
    }
}

#[test]
fn sweep_covers_grid_sorted_by_fitness() {
    let market = trending_market(150);
    let data = PreparedData::new(&market);
    let results = Optimizer::new(&data, &market.dataset_hash, false)
        .sweep(&WeightGrid::default(), &Strategy::default(), &config())
        .unwrap();

    assert_eq!(results.len(), 9);
    for pair in results.all().windows(2) {
        assert!(pair[0].fitness() >= pair[1].fitness());
        if pair[0].fitness() == pair[1].fitness() {
            assert!(pair[0].grid_index < pair[1].grid_index);
        }
    }
    let best = results.best().unwrap();
    assert!(best.result.metrics.trade_count > 0);
    assert_eq!(best.result.strategy.weights.trend, best.weights);
    assert_eq!(best.result.strategy.weights.range, best.weights);
    assert_eq!(results.top_n(3).len(), 3);
}

#[test]
fn parallel_and_sequential_sweeps_agree() {
    let market = trending_market(150);
    let data = PreparedData::new(&market);
    let grid = WeightGrid::default();
    let strategy = Strategy::default();

    let par = Optimizer::new(&data, &market.dataset_hash, false)
        .sweep(&grid, &strategy, &config())
        .unwrap();
    let seq = Optimizer::new(&data, &market.dataset_hash, false)
        .with_parallelism(false)
        .sweep(&grid, &strategy, &config())
        .unwrap();

    let key = |r: &tradescan_runner::SweepResults| {
        r.all()
            .iter()
            .map(|e| (e.grid_index, e.result.trades.clone()))
            .collect::<Vec<_>>()
    };
    assert_eq!(key(&par), key(&seq));
}

#[test]
fn sweep_without_trades_has_no_best() {
    let market = tradescan_runner::MarketData::new(
        common::zigzag("BENCH", 150, 100.0, 1.0, 0.5),
        vec![common::zigzag("DOWN", 150, 80.0, 1.0, 1.5)],
        false,
    );
    let data = PreparedData::new(&market);
    let results = Optimizer::new(&data, &market.dataset_hash, false)
        .sweep(&WeightGrid::default(), &Strategy::default(), &config())
        .unwrap();
    assert_eq!(results.len(), 9);
    assert!(results.best().is_none());
}

#[test]
fn fine_grid_keeps_exact_remainder() {
    let grid = WeightGrid {
        trend: vec![0.45, 0.5, 0.55],
        momentum: vec![0.2, 0.25, 0.3],
        min_risk: 0.1,
    };
    let triples = grid.triples().unwrap();
    assert_eq!(triples.len(), 9);
    for w in &triples {
        assert!((w.trend() + w.momentum() + w.risk() - 1.0).abs() < 1e-9);
    }
    assert!((triples[0].risk() - 0.35).abs() < 1e-9);
    assert!((triples[8].risk() - 0.15).abs() < 1e-9);

    let market = trending_market(150);
    let data = PreparedData::new(&market);
    let results = Optimizer::new(&data, &market.dataset_hash, false)
        .sweep(&grid, &Strategy::default(), &config())
        .unwrap();
    assert_eq!(results.len(), 9);
}
