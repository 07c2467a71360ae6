//! Artifact export and CSV loading against temp directories.

mod common;

use common::{csv_body, trending_market};
use tradescan_core::data::MarketDataProvider;
use tradescan_core::Strategy;
use tradescan_runner::export::{
    export_sweep_json, export_trades_csv, import_json, load_artifacts, save_artifacts,
};
use tradescan_runner::{
    load_market_data, run_backtest, BacktestConfig, CsvProvider, Optimizer, PreparedData,
    WeightGrid,
};

fn config() -> BacktestConfig {
    BacktestConfig {
        benchmark: "BENCH".into(),
        universe: vec!["FAST".into(), "SLOW".into(), "DOWN".into()],
        ..BacktestConfig::default()
    }
}

#[test]
fn artifacts_round_trip() {
    let result = run_backtest(&trending_market(150), &Strategy::default(), &config()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let run_dir = save_artifacts(&result, dir.path()).unwrap();

    for name in ["manifest.json", "trades.csv", "equity.csv", "report.md"] {
        assert!(run_dir.join(name).exists(), "missing {name}");
    }
    let loaded = load_artifacts(&run_dir).unwrap();
    assert_eq!(loaded.trades, result.trades);
    assert_eq!(loaded.metrics, result.metrics);
    assert_eq!(loaded.run_id, result.run_id);
}

#[test]
fn newer_schema_is_rejected() {
    let result = run_backtest(&trending_market(150), &Strategy::default(), &config()).unwrap();
    let mut value = serde_json::to_value(&result).unwrap();
    value["schema_version"] = serde_json::json!(99);
    let err = import_json(&value.to_string()).unwrap_err();
    assert!(err.to_string().contains("unsupported schema version"));
}

#[test]
fn trades_csv_has_one_row_per_trade() {
    let result = run_backtest(&trending_market(150), &Strategy::default(), &config()).unwrap();
    let csv = export_trades_csv(&result.trades).unwrap();
    let mut lines = csv.lines();
    assert!(lines.next().unwrap().starts_with("symbol,regime,score"));
    assert_eq!(lines.count(), result.trades.len());
    assert!(csv.contains(",TREND,"));
}

#[test]
fn sweep_summary_is_ranked_json() {
    let market = trending_market(150);
    let data = PreparedData::new(&market);
    let results = Optimizer::new(&data, &market.dataset_hash, false)
        .sweep(&WeightGrid::default(), &Strategy::default(), &config())
        .unwrap();
    let json: serde_json::Value = serde_json::from_str(&export_sweep_json(&results).unwrap()).unwrap();
    let rows = json.as_array().unwrap();
    assert_eq!(rows.len(), 9);
    assert_eq!(rows[0]["rank"], 1);
}

#[test]
fn csv_directory_replays_like_memory() {
    let market = trending_market(150);
    let dir = tempfile::tempdir().unwrap();
    for series in std::iter::once(&market.benchmark).chain(&market.instruments) {
        std::fs::write(dir.path().join(format!("{}.csv", series.symbol())), csv_body(series)).unwrap();
    }

    let cfg = config();
    let loaded = load_market_data(dir.path(), &cfg.benchmark, &cfg.universe).unwrap();
    assert_eq!(loaded.instruments.len(), 3);
    let from_disk = run_backtest(&loaded, &Strategy::default(), &cfg).unwrap();
    let in_memory = run_backtest(&market, &Strategy::default(), &cfg).unwrap();
    assert_eq!(from_disk.trades, in_memory.trades);

    let provider = CsvProvider::open(dir.path(), "BENCH").unwrap();
    assert_eq!(provider.get_benchmark(10_000).len(), 150);
    assert_eq!(provider.symbols().unwrap(), vec!["DOWN", "FAST", "SLOW"]);
}
