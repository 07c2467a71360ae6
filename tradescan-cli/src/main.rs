//! TradeScan CLI: scan, diagnose, backtest and optimize commands.
//!
//! Commands:
//! - `scan`: rank today's candidates and print the report
//! - `diagnose`: single-instrument report
//! - `backtest`: replay the strategy over history and save artifacts
//! - `optimize`: sweep the factor-weight grid and save a ranked summary
//!
//! Every command reads a CSV directory (`--data-dir`) or generates seeded
//! random walks (`--synthetic`).

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use tradescan_core::data::{CachedProvider, InMemoryProvider, MarketDataProvider};
use tradescan_core::domain::{BarSeries, Symbol};
use tradescan_core::indicators::IndicatorSeries;
use tradescan_core::report::{
    format_diagnosis, format_scan, ArtifactRef, ChartRenderer, MessagingGateway, SinkError,
};
use tradescan_core::rng::{RngHierarchy, REMINDER_SCOPE};
use tradescan_core::scan::{diagnose, DiagnosisOutcome, ScanConfig, ScanOutcome, Scanner};
use tradescan_core::Strategy;
use tradescan_runner::export::{export_sweep_json, generate_report, save_artifacts};
use tradescan_runner::{
    discover_symbols, load_market_data, run_backtest, synthetic_market, BacktestConfig,
    BacktestResult, CsvProvider, MarketData, Optimizer, PreparedData, WeightGrid,
};

#[derive(Parser)]
#[command(
    name = "tradescan",
    about = "TradeScan CLI: regime-aware equity signal scanner and backtester"
)]
struct Cli {
    /// Debug-level logging (overridden by RUST_LOG).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct DataArgs {
    /// Directory of `{SYMBOL}.csv` files.
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Generate seeded random walks instead of reading `--data-dir`.
    #[arg(long, default_value_t = false)]
    synthetic: bool,

    /// Seed for synthetic data and report reminders.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Instruments generated with `--synthetic`.
    #[arg(long, default_value_t = 20)]
    synthetic_symbols: usize,

    /// Bars generated per instrument with `--synthetic`.
    #[arg(long, default_value_t = 500)]
    synthetic_bars: usize,

    /// Benchmark symbol.
    #[arg(long, default_value = "SPY")]
    benchmark: String,

    /// Strategy TOML. Defaults to the built-in regime-weighted table.
    #[arg(long)]
    strategy: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank the universe as of the latest bar.
    Scan {
        #[command(flatten)]
        data: DataArgs,

        /// Restrict the universe (defaults to every instrument in the source).
        #[arg(long, value_delimiter = ',')]
        symbols: Vec<String>,

        /// Maximum picks in the report.
        #[arg(long, default_value_t = 6)]
        max_picks: usize,

        /// Skip instruments priced above this.
        #[arg(long)]
        max_price: Option<f64>,

        /// Scan worker threads.
        #[arg(long, default_value_t = 10)]
        workers: usize,

        /// Scan even when the benchmark regime is VOLATILE.
        #[arg(long, default_value_t = false)]
        no_halt: bool,

        /// Write an indicator CSV for the top pick into this directory.
        #[arg(long)]
        chart_dir: Option<PathBuf>,
    },
    /// Report on one instrument.
    Diagnose {
        #[command(flatten)]
        data: DataArgs,

        symbol: String,

        /// Write an indicator CSV for the instrument into this directory.
        #[arg(long)]
        chart_dir: Option<PathBuf>,
    },
    /// Replay the strategy over history.
    Backtest {
        #[command(flatten)]
        data: DataArgs,

        /// Backtest TOML (window, sizing, gate, universe).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory for run artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Sweep factor weights and rank by fitness.
    Optimize {
        #[command(flatten)]
        data: DataArgs,

        /// Backtest TOML (window, sizing, gate, universe).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Rows to print.
        #[arg(long, default_value_t = 5)]
        top: usize,

        /// Output directory for the sweep summary and best run.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Scan {
            data,
            symbols,
            max_picks,
            max_price,
            workers,
            no_halt,
            chart_dir,
        } => {
            let config = ScanConfig {
                max_picks,
                max_price,
                workers,
                halt_in_volatile: !no_halt,
                ..ScanConfig::default()
            };
            run_scan(&data, symbols, config, chart_dir)
        }
        Commands::Diagnose {
            data,
            symbol,
            chart_dir,
        } => run_diagnose(&data, &symbol, chart_dir),
        Commands::Backtest {
            data,
            config,
            output_dir,
        } => run_backtest_cmd(&data, config, &output_dir),
        Commands::Optimize {
            data,
            config,
            top,
            output_dir,
        } => run_optimize(&data, config, top, &output_dir),
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("info,tradescan_core=debug,tradescan_runner=debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr).compact())
        .with(filter)
        .init();
}

// ─── Collaborators ──────────────────────────────────────────────────

/// Writes the bars and their indicator columns as CSV, one file per label.
struct CsvChartRenderer {
    dir: PathBuf,
}

impl CsvChartRenderer {
    fn new(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create chart directory {}", dir.display()))?;
        Ok(Self { dir })
    }
}

fn cell(value: f64) -> String {
    if value.is_finite() {
        format!("{value:.4}")
    } else {
        String::new()
    }
}

impl ChartRenderer for CsvChartRenderer {
    fn render(
        &self,
        bars: &BarSeries,
        indicators: &IndicatorSeries,
        label: &str,
    ) -> Result<ArtifactRef, SinkError> {
        let path = self.dir.join(format!("{label}_indicators.csv"));
        let render_err = |e: csv::Error| SinkError::Render(e.to_string());
        let mut wtr = csv::Writer::from_path(&path).map_err(render_err)?;
        wtr.write_record([
            "date", "close", "ma5", "ma20", "ma60", "rsi14", "adx14", "atr14", "volume_ratio",
        ])
        .map_err(render_err)?;
        for (i, bar) in bars.bars().iter().enumerate() {
            wtr.write_record([
                bar.date.to_string(),
                cell(bar.close),
                cell(indicators.ma5[i]),
                cell(indicators.ma20[i]),
                cell(indicators.ma60[i]),
                cell(indicators.rsi14[i]),
                cell(indicators.adx14[i]),
                cell(indicators.atr14[i]),
                cell(indicators.volume_ratio[i]),
            ])
            .map_err(render_err)?;
        }
        wtr.flush()?;
        Ok(ArtifactRef(path.display().to_string()))
    }
}

struct StdoutGateway;

impl MessagingGateway for StdoutGateway {
    fn deliver(&self, text: &str, artifact: Option<&ArtifactRef>) -> Result<(), SinkError> {
        println!("{text}");
        if let Some(artifact) = artifact {
            println!("[chart] {}", artifact.as_str());
        }
        Ok(())
    }
}

fn render_chart<P: MarketDataProvider>(
    provider: &P,
    symbol: &str,
    lookback_days: usize,
    chart_dir: Option<PathBuf>,
) -> Result<Option<ArtifactRef>> {
    let Some(dir) = chart_dir else {
        return Ok(None);
    };
    let series = provider.get_bars(symbol, lookback_days);
    if series.is_empty() {
        return Ok(None);
    }
    let indicators = IndicatorSeries::compute(series.bars());
    let artifact = CsvChartRenderer::new(dir)?
        .render(&series, &indicators, symbol)
        .with_context(|| format!("failed to render chart for {symbol}"))?;
    Ok(Some(artifact))
}

// ─── Data sources ───────────────────────────────────────────────────

fn load_strategy(data: &DataArgs) -> Result<Strategy> {
    match &data.strategy {
        Some(path) => Strategy::load(path)
            .with_context(|| format!("failed to load strategy {}", path.display())),
        None => Ok(Strategy::default()),
    }
}

fn synthetic_universe(n: usize) -> Vec<Symbol> {
    (1..=n).map(|i| format!("SYN{i:02}")).collect()
}

fn synthetic_provider(data: &DataArgs) -> Result<(InMemoryProvider, Vec<Symbol>)> {
    let universe = synthetic_universe(data.synthetic_symbols);
    let market = synthetic_market(&data.benchmark, &universe, data.synthetic_bars, data.seed)?;
    let mut provider = InMemoryProvider::new(market.benchmark);
    for series in market.instruments {
        provider.insert(series);
    }
    Ok((provider, universe))
}

fn csv_provider(data: &DataArgs) -> Result<CachedProvider<CsvProvider>> {
    let provider = CsvProvider::open(&data.data_dir, data.benchmark.as_str())
        .with_context(|| format!("failed to open data directory {}", data.data_dir.display()))?;
    Ok(CachedProvider::with_system_clock(provider))
}

fn run_scan(
    data: &DataArgs,
    symbols: Vec<String>,
    config: ScanConfig,
    chart_dir: Option<PathBuf>,
) -> Result<()> {
    let strategy = load_strategy(data)?;
    if data.synthetic {
        let (provider, universe) = synthetic_provider(data)?;
        let universe = if symbols.is_empty() { universe } else { symbols };
        scan_with(&provider, &strategy, config, &universe, data.seed, chart_dir)
    } else {
        let provider = csv_provider(data)?;
        let universe = if symbols.is_empty() {
            provider.inner().symbols()?
        } else {
            symbols
        };
        scan_with(&provider, &strategy, config, &universe, data.seed, chart_dir)
    }
}

fn scan_with<P: MarketDataProvider>(
    provider: &P,
    strategy: &Strategy,
    config: ScanConfig,
    universe: &[Symbol],
    seed: u64,
    chart_dir: Option<PathBuf>,
) -> Result<()> {
    if universe.is_empty() {
        bail!("universe is empty");
    }
    let lookback = config.lookback_days;
    let scanner = Scanner::new(provider, strategy, config).context("failed to build scan pool")?;
    let outcome = scanner.scan(universe);

    let mut rng = RngHierarchy::new(seed).rng_for(REMINDER_SCOPE, 0);
    let title = format!("TradeScan daily picks [{}]", strategy.name);
    let text = format_scan(&outcome, &title, &mut rng);

    let artifact = match &outcome {
        ScanOutcome::Picks { picks, .. } => match picks.first() {
            Some(top) => render_chart(provider, &top.candidate.symbol, lookback, chart_dir)?,
            None => None,
        },
        _ => None,
    };
    StdoutGateway.deliver(&text, artifact.as_ref())?;
    Ok(())
}

fn run_diagnose(data: &DataArgs, symbol: &str, chart_dir: Option<PathBuf>) -> Result<()> {
    let strategy = load_strategy(data)?;
    if data.synthetic {
        let (provider, _) = synthetic_provider(data)?;
        diagnose_with(&provider, &strategy, symbol, data.seed, chart_dir)
    } else {
        let provider = csv_provider(data)?;
        diagnose_with(&provider, &strategy, symbol, data.seed, chart_dir)
    }
}

fn diagnose_with<P: MarketDataProvider>(
    provider: &P,
    strategy: &Strategy,
    symbol: &str,
    seed: u64,
    chart_dir: Option<PathBuf>,
) -> Result<()> {
    let lookback = ScanConfig::default().lookback_days;
    match diagnose(provider, symbol, lookback, &strategy.gate) {
        DiagnosisOutcome::Ready(d) => {
            let mut rng = RngHierarchy::new(seed).rng_for(REMINDER_SCOPE, 0);
            let text = format_diagnosis(&d, &mut rng);
            let artifact = render_chart(provider, symbol, lookback, chart_dir)?;
            StdoutGateway.deliver(&text, artifact.as_ref())?;
            Ok(())
        }
        DiagnosisOutcome::NoData { symbol } => bail!("no data for {symbol}"),
        DiagnosisOutcome::InsufficientHistory {
            symbol,
            available,
            required,
        } => bail!("{symbol}: {available} bars available, {required} required"),
    }
}

// ─── Backtest and optimize ──────────────────────────────────────────

fn load_backtest_config(data: &DataArgs, path: Option<PathBuf>) -> Result<BacktestConfig> {
    let mut config = match path {
        Some(path) => BacktestConfig::load(&path)
            .with_context(|| format!("failed to load backtest config {}", path.display()))?,
        None => BacktestConfig {
            benchmark: data.benchmark.clone(),
            ..BacktestConfig::default()
        },
    };
    if config.universe.is_empty() {
        config.universe = if data.synthetic {
            synthetic_universe(data.synthetic_symbols)
        } else {
            discover_symbols(&data.data_dir)?
        };
    }
    Ok(config)
}

fn load_market(data: &DataArgs, config: &BacktestConfig) -> Result<MarketData> {
    let universe = config.resolve_universe()?;
    let market = if data.synthetic {
        synthetic_market(&config.benchmark, &universe, data.synthetic_bars, data.seed)?
    } else {
        load_market_data(&data.data_dir, &config.benchmark, &universe)
            .with_context(|| format!("failed to load market data from {}", data.data_dir.display()))?
    };
    Ok(market)
}

fn run_backtest_cmd(data: &DataArgs, config_path: Option<PathBuf>, output_dir: &Path) -> Result<()> {
    let strategy = load_strategy(data)?;
    let config = load_backtest_config(data, config_path)?;
    let market = load_market(data, &config)?;

    let result = run_backtest(&market, &strategy, &config)?;
    print_summary(&result);

    let run_dir = save_artifacts(&result, output_dir)?;
    println!("Artifacts saved to: {}", run_dir.display());
    Ok(())
}

fn run_optimize(
    data: &DataArgs,
    config_path: Option<PathBuf>,
    top: usize,
    output_dir: &Path,
) -> Result<()> {
    let strategy = load_strategy(data)?;
    let config = load_backtest_config(data, config_path)?;
    let market = load_market(data, &config)?;
    let prepared = PreparedData::new(&market);

    let results = Optimizer::new(&prepared, &market.dataset_hash, market.has_synthetic).sweep(
        &WeightGrid::default(),
        &strategy,
        &config,
    )?;

    println!(
        "{:<5} {:>6} {:>9} {:>6} {:>7} {:>9} {:>11} {:>9}",
        "rank", "trend", "momentum", "risk", "trades", "win_rate", "mean_w_ret", "fitness"
    );
    for (i, entry) in results.top_n(top).iter().enumerate() {
        let m = &entry.result.metrics;
        println!(
            "{:<5} {:>6.1} {:>9.1} {:>6.1} {:>7} {:>8.1}% {:>10.2}% {:>9.5}",
            i + 1,
            entry.weights.trend(),
            entry.weights.momentum(),
            entry.weights.risk(),
            m.trade_count,
            m.win_rate * 100.0,
            m.mean_weighted_return * 100.0,
            entry.fitness()
        );
    }

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;
    let summary_path = output_dir.join("sweep.json");
    std::fs::write(&summary_path, export_sweep_json(&results)?)
        .with_context(|| format!("failed to write {}", summary_path.display()))?;
    println!("Sweep summary saved to: {}", summary_path.display());

    match results.best() {
        Some(best) => {
            let run_dir = save_artifacts(&best.result, output_dir)?;
            println!("Best run saved to: {}", run_dir.display());
        }
        None => println!("No weight triple produced a trade."),
    }
    Ok(())
}

fn print_summary(result: &BacktestResult) {
    if result.has_synthetic {
        println!("WARNING: results computed on synthetic data");
    }
    print!("{}", generate_report(result));
}
