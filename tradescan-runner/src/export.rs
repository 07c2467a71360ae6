//! Result export: JSON, CSV and Markdown artifacts.
//!
//! - **JSON**: full backtest result with schema versioning, sweep summaries
//! - **CSV**: trade tape and equity curve
//! - **Markdown**: human-readable single-run report
//!
//! Persisted results carry a `schema_version`; newer versions are rejected
//! on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Serialize;

use tradescan_core::domain::{ExitReason, SimulatedTrade};

use crate::metrics::EquityPoint;
use crate::optimizer::SweepResults;
use crate::runner::{BacktestResult, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

/// Deserialize a `BacktestResult`, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

#[derive(Serialize)]
struct SweepRow<'a> {
    rank: usize,
    grid_index: usize,
    trend: f64,
    momentum: f64,
    risk: f64,
    trades: usize,
    win_rate: f64,
    mean_weighted_return: f64,
    fitness: f64,
    run_id: &'a str,
}

/// One summary row per triple, best first. Trades are left out.
pub fn export_sweep_json(results: &SweepResults) -> Result<String> {
    let rows: Vec<SweepRow<'_>> = results
        .all()
        .iter()
        .enumerate()
        .map(|(i, e)| SweepRow {
            rank: i + 1,
            grid_index: e.grid_index,
            trend: e.weights.trend(),
            momentum: e.weights.momentum(),
            risk: e.weights.risk(),
            trades: e.result.metrics.trade_count,
            win_rate: e.result.metrics.win_rate,
            mean_weighted_return: e.result.metrics.mean_weighted_return,
            fitness: e.fitness(),
            run_id: &e.result.run_id,
        })
        .collect();
    serde_json::to_string_pretty(&rows).context("failed to serialize sweep summary")
}

// ─── CSV export ─────────────────────────────────────────────────────

fn exit_label(reason: ExitReason) -> &'static str {
    match reason {
        ExitReason::Stop => "STOP",
        ExitReason::Target => "TARGET",
        ExitReason::Time => "TIME",
    }
}

/// Columns: symbol, regime, score, entry_date, entry_price, exit_date,
/// exit_price, exit_reason, return, position_size, weighted_return
pub fn export_trades_csv(trades: &[SimulatedTrade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "symbol",
        "regime",
        "score",
        "entry_date",
        "entry_price",
        "exit_date",
        "exit_price",
        "exit_reason",
        "return",
        "position_size",
        "weighted_return",
    ])?;

    for t in trades {
        wtr.write_record([
            t.symbol.clone(),
            t.regime.as_str().to_string(),
            format!("{:.2}", t.score),
            t.entry_date.to_string(),
            format!("{:.4}", t.entry_price),
            t.exit_date.to_string(),
            format!("{:.4}", t.exit_price),
            exit_label(t.exit_reason).to_string(),
            format!("{:.6}", t.return_fraction),
            format!("{:.2}", t.position_size),
            format!("{:.6}", t.weighted_return()),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

pub fn export_equity_csv(equity_curve: &[EquityPoint]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "equity", "drawdown"])?;
    for p in equity_curve {
        wtr.write_record([
            p.date.to_string(),
            format!("{:.6}", p.equity),
            format!("{:.6}", p.drawdown),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the artifact set for one run into `{output_dir}/backtest_{run_id prefix}/`:
/// `manifest.json`, `trades.csv`, `equity.csv` and `report.md`.
///
/// Returns the created directory.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<PathBuf> {
    let prefix: String = result.run_id.chars().take(12).collect();
    let run_dir = output_dir.join(format!("backtest_{prefix}"));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let write = |name: &str, body: String| {
        let path = run_dir.join(name);
        std::fs::write(&path, body).with_context(|| format!("failed to write {}", path.display()))
    };
    write("manifest.json", export_json(result)?)?;
    write("trades.csv", export_trades_csv(&result.trades)?)?;
    write("equity.csv", export_equity_csv(&result.equity_curve)?)?;
    write("report.md", generate_report(result))?;

    Ok(run_dir)
}

/// Load a `BacktestResult` from an artifact directory's manifest.json.
pub fn load_artifacts(dir: &Path) -> Result<BacktestResult> {
    let manifest_path = dir.join("manifest.json");
    let json = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    import_json(&json)
}

// ─── Markdown report ────────────────────────────────────────────────

pub fn generate_report(result: &BacktestResult) -> String {
    let mut md = String::with_capacity(2048);
    let m = &result.metrics;
    let s = &result.stats;

    md.push_str("# Backtest Report\n\n");

    md.push_str("## Metadata\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!(
        "| Strategy | {} v{} |\n",
        result.strategy.name, result.strategy.version
    ));
    md.push_str(&format!("| Benchmark | {} |\n", result.config.benchmark));
    md.push_str(&format!(
        "| Period | {} to {} |\n",
        result.start_date, result.end_date
    ));
    md.push_str(&format!("| Sizing | {:?} |\n", result.config.sizing));
    md.push_str(&format!("| Entry Gate | {} |\n", result.config.apply_entry_gate));
    md.push_str(&format!("| Run Id | {} |\n", result.run_id));
    md.push_str(&format!("| Dataset Hash | {} |\n", result.dataset_hash));
    if result.has_synthetic {
        md.push_str("| Data | **SYNTHETIC** |\n");
    }
    md.push('\n');

    md.push_str("## Performance Summary\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Trades | {} |\n", m.trade_count));
    md.push_str(&format!("| Win Rate | {:.1}% |\n", m.win_rate * 100.0));
    md.push_str(&format!("| Mean Return | {:.2}% |\n", m.mean_return * 100.0));
    md.push_str(&format!(
        "| Mean Weighted Return | {:.2}% |\n",
        m.mean_weighted_return * 100.0
    ));
    md.push_str(&format!("| Fitness | {:.5} |\n", m.fitness));
    md.push_str(&format!("| Final Equity | {:.4} |\n", m.final_equity));
    md.push_str(&format!("| Max Drawdown | {:.2}% |\n", m.max_drawdown * 100.0));
    md.push_str(&format!(
        "| Exits (stop/target/time) | {}/{}/{} |\n",
        m.exits.stop, m.exits.target, m.exits.time
    ));
    md.push('\n');

    md.push_str("## Score Buckets\n\n");
    md.push_str("| Bucket | Trades | Mean Return |\n");
    md.push_str("| --- | --- | --- |\n");
    for b in &m.score_buckets {
        let mean = b
            .mean_return
            .map(|r| format!("{:.2}%", r * 100.0))
            .unwrap_or_else(|| "-".into());
        md.push_str(&format!("| {} | {} | {} |\n", b.label, b.trades, mean));
    }
    md.push('\n');

    md.push_str("## Replay Days\n\n");
    md.push_str(&format!(
        "{} days (TREND {}, RANGE {}, VOLATILE {}): {} traded, {} without candidates, \
         {} below threshold, {} banned, {} deferred, {} unsized, {} without future bars.\n",
        s.days,
        s.regimes.trend,
        s.regimes.range,
        s.regimes.volatile,
        s.traded,
        s.no_candidates,
        s.below_threshold,
        s.banned,
        s.deferred,
        s.zero_size,
        s.no_future_bars
    ));
    md
}
