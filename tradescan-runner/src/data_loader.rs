//! Bar loading for the runner.
//!
//! A data directory holds one `{SYMBOL}.csv` per instrument with columns
//! `date,open,high,low,close,volume`, plus an optional `fundamentals.csv`
//! with columns `symbol,pe_ratio`. `--synthetic` replaces the directory with
//! seeded random walks; results built on them are tagged as synthetic.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use tradescan_core::data::{random_walk, symbol_seed, Fundamentals, MarketDataProvider, WalkParams};
use tradescan_core::domain::{Bar, BarError, BarSeries, Symbol};

/// File holding P/E ratios, excluded from symbol discovery.
pub const FUNDAMENTALS_FILE: &str = "fundamentals.csv";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to load CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("no data file for '{symbol}' in {dir}")]
    MissingSymbol { symbol: Symbol, dir: PathBuf },

    #[error(transparent)]
    Bars(#[from] BarError),
}

#[derive(Debug, Deserialize)]
struct CsvBar {
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    /// Float so files exported with "1234.0" still load.
    volume: f64,
}

#[derive(Debug, Deserialize)]
struct CsvFundamentals {
    symbol: String,
    pe_ratio: Option<f64>,
}

/// Read one symbol file. Rows failing the OHLC sanity check are dropped
/// with a warning; rows are sorted by date before the series is built.
pub fn load_series(path: &Path, symbol: &str) -> Result<BarSeries, LoadError> {
    let mut reader = csv::Reader::from_path(path).map_err(|source| csv_error(path, source))?;
    let mut bars = Vec::new();
    let mut rejected = 0usize;

    for row in reader.deserialize::<CsvBar>() {
        let row = row.map_err(|source| csv_error(path, source))?;
        let bar = Bar {
            date: row.date,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume.max(0.0).round() as u64,
        };
        if bar.is_sane() {
            bars.push(bar);
        } else {
            rejected += 1;
        }
    }
    if rejected > 0 {
        warn!(%symbol, rejected, "dropped bars failing OHLC sanity check");
    }

    bars.sort_by_key(|b| b.date);
    Ok(BarSeries::new(symbol, bars)?)
}

fn csv_error(path: &Path, source: csv::Error) -> LoadError {
    LoadError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

/// Path of a symbol's file inside `dir`.
pub fn symbol_path(dir: &Path, symbol: &str) -> PathBuf {
    dir.join(format!("{symbol}.csv"))
}

/// Symbols with a data file in `dir`, sorted. The fundamentals file is skipped.
pub fn discover_symbols(dir: &Path) -> Result<Vec<Symbol>, LoadError> {
    let io_err = |source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut symbols = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        let is_csv = path.extension().is_some_and(|e| e == "csv");
        let is_fundamentals = path.file_name().is_some_and(|n| n == FUNDAMENTALS_FILE);
        if !is_csv || is_fundamentals {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            symbols.push(stem.to_string());
        }
    }
    symbols.sort();
    Ok(symbols)
}

fn load_fundamentals(dir: &Path) -> Result<HashMap<Symbol, Fundamentals>, LoadError> {
    let path = dir.join(FUNDAMENTALS_FILE);
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let mut reader = csv::Reader::from_path(&path).map_err(|source| csv_error(&path, source))?;
    let mut out = HashMap::new();
    for row in reader.deserialize::<CsvFundamentals>() {
        let row = row.map_err(|source| csv_error(&path, source))?;
        out.insert(row.symbol, Fundamentals { pe_ratio: row.pe_ratio });
    }
    Ok(out)
}

/// Provider over a directory of CSV files.
///
/// Files are read on every request; wrap it in a `CachedProvider` to
/// avoid rereading. Unreadable files are reported as "no data".
#[derive(Debug, Clone)]
pub struct CsvProvider {
    dir: PathBuf,
    benchmark: Symbol,
    fundamentals: HashMap<Symbol, Fundamentals>,
}

impl CsvProvider {
    pub fn open(dir: impl Into<PathBuf>, benchmark: impl Into<Symbol>) -> Result<Self, LoadError> {
        let dir = dir.into();
        let fundamentals = load_fundamentals(&dir)?;
        Ok(Self {
            dir,
            benchmark: benchmark.into(),
            fundamentals,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Every symbol in the directory except the benchmark.
    pub fn symbols(&self) -> Result<Vec<Symbol>, LoadError> {
        Ok(discover_symbols(&self.dir)?
            .into_iter()
            .filter(|s| *s != self.benchmark)
            .collect())
    }

    fn read(&self, symbol: &str, lookback_days: usize) -> BarSeries {
        let path = symbol_path(&self.dir, symbol);
        if !path.exists() {
            debug!(%symbol, "no data file");
            return BarSeries::empty(symbol);
        }
        match load_series(&path, symbol) {
            Ok(series) => series.trailing_days(lookback_days),
            Err(e) => {
                warn!(%symbol, error = %e, "rejected data file");
                BarSeries::empty(symbol)
            }
        }
    }
}

impl MarketDataProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn get_bars(&self, symbol: &str, lookback_days: usize) -> BarSeries {
        self.read(symbol, lookback_days)
    }

    fn get_benchmark(&self, lookback_days: usize) -> BarSeries {
        self.read(&self.benchmark, lookback_days)
    }

    fn get_fundamentals(&self, symbol: &str) -> Fundamentals {
        self.fundamentals.get(symbol).copied().unwrap_or_default()
    }
}

/// Full histories for one replay.
#[derive(Debug, Clone, Serialize)]
pub struct MarketData {
    pub benchmark: BarSeries,
    pub instruments: Vec<BarSeries>,
    /// BLAKE3 over every bar, in load order.
    pub dataset_hash: String,
    pub has_synthetic: bool,
}

impl MarketData {
    pub fn new(benchmark: BarSeries, instruments: Vec<BarSeries>, has_synthetic: bool) -> Self {
        let dataset_hash = dataset_hash(&benchmark, &instruments);
        Self {
            benchmark,
            instruments,
            dataset_hash,
            has_synthetic,
        }
    }
}

fn dataset_hash(benchmark: &BarSeries, instruments: &[BarSeries]) -> String {
    let mut hasher = blake3::Hasher::new();
    for series in std::iter::once(benchmark).chain(instruments) {
        hasher.update(series.symbol().as_bytes());
        for bar in series.bars() {
            hasher.update(bar.date.to_string().as_bytes());
            hasher.update(&bar.open.to_le_bytes());
            hasher.update(&bar.high.to_le_bytes());
            hasher.update(&bar.low.to_le_bytes());
            hasher.update(&bar.close.to_le_bytes());
            hasher.update(&bar.volume.to_le_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}

/// Load the benchmark and every universe symbol from `dir`.
///
/// A missing benchmark is an error. Missing or empty instrument files are
/// skipped with a warning.
pub fn load_market_data(dir: &Path, benchmark: &str, universe: &[Symbol]) -> Result<MarketData, LoadError> {
    let bench_path = symbol_path(dir, benchmark);
    if !bench_path.exists() {
        return Err(LoadError::MissingSymbol {
            symbol: benchmark.to_string(),
            dir: dir.to_path_buf(),
        });
    }
    let bench = load_series(&bench_path, benchmark)?;

    let mut instruments = Vec::with_capacity(universe.len());
    for symbol in universe {
        let path = symbol_path(dir, symbol);
        if !path.exists() {
            warn!(%symbol, "no data file, skipped");
            continue;
        }
        let series = load_series(&path, symbol)?;
        if series.is_empty() {
            warn!(%symbol, "empty data file, skipped");
            continue;
        }
        instruments.push(series);
    }
    info!(
        benchmark,
        bars = bench.len(),
        instruments = instruments.len(),
        "market data loaded"
    );
    Ok(MarketData::new(bench, instruments, false))
}

/// First date of generated histories.
pub fn synthetic_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 2).unwrap_or_default()
}

/// Seeded random walks for the benchmark and each symbol.
pub fn synthetic_market(
    benchmark: &str,
    universe: &[Symbol],
    bars: usize,
    seed: u64,
) -> Result<MarketData, LoadError> {
    warn!(seed, "generating synthetic data, results will be tagged as synthetic");
    let start = synthetic_start();
    let bench_params = WalkParams {
        volatility: 0.012,
        ..WalkParams::default()
    };
    let bench = random_walk(benchmark, start, bars, symbol_seed(seed, benchmark), bench_params)?;
    let instruments = universe
        .iter()
        .map(|symbol| random_walk(symbol, start, bars, symbol_seed(seed, symbol), WalkParams::default()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(MarketData::new(bench, instruments, true))
}
