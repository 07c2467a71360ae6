//! Serializable backtest configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tradescan_core::domain::Symbol;
use tradescan_core::rng::{sample_subset, RngHierarchy, UNIVERSE_SCOPE};
use tradescan_core::trade::SizingMode;
use tradescan_core::Strategy;

/// Content-addressable identifier for a backtest run.
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse backtest config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to read backtest config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("backtest universe is empty")]
    EmptyUniverse,

    #[error("'{name}' must be at least 1")]
    ZeroWindow { name: &'static str },

    #[error("universe subset size must be at least 1")]
    EmptySubset,
}

/// Seeded random subset of the universe, reproducible for a given seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniverseSubset {
    pub size: usize,
    pub seed: u64,
}

/// Everything needed to reproduce a replay besides the strategy and bars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    pub benchmark: Symbol,
    pub universe: Vec<Symbol>,
    /// Benchmark bars skipped at the start so indicators can warm up.
    pub warmup_bars: usize,
    /// Benchmark bars left at the end so late entries still have a future.
    pub reserve_bars: usize,
    /// Bars after the entry date made available to the trade simulation.
    pub forward_bars: usize,
    /// Bars an instrument needs before it can be selected.
    pub min_history: usize,
    pub sizing: SizingMode,
    /// Drop BAN candidates and defer WAIT picks.
    pub apply_entry_gate: bool,
    pub subset: Option<UniverseSubset>,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            benchmark: "SPY".into(),
            universe: Vec::new(),
            warmup_bars: 60,
            reserve_bars: 35,
            forward_bars: 31,
            min_history: 60,
            sizing: SizingMode::Linear,
            apply_entry_gate: false,
            subset: None,
        }
    }
}

impl BacktestConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: BacktestConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// An empty universe is allowed here; callers fill it from the data
    /// directory before replaying.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.forward_bars == 0 {
            return Err(ConfigError::ZeroWindow {
                name: "forward_bars",
            });
        }
        if self.min_history == 0 {
            return Err(ConfigError::ZeroWindow {
                name: "min_history",
            });
        }
        if self.subset.is_some_and(|s| s.size == 0) {
            return Err(ConfigError::EmptySubset);
        }
        Ok(())
    }

    /// The symbols to replay: the configured universe, narrowed to the seeded
    /// subset when one is set. The benchmark is never part of the result.
    pub fn resolve_universe(&self) -> Result<Vec<Symbol>, ConfigError> {
        let universe: Vec<Symbol> = self
            .universe
            .iter()
            .filter(|s| **s != self.benchmark)
            .cloned()
            .collect();
        if universe.is_empty() {
            return Err(ConfigError::EmptyUniverse);
        }
        Ok(match self.subset {
            Some(subset) => {
                let mut rng = RngHierarchy::new(subset.seed).rng_for(UNIVERSE_SCOPE, 0);
                sample_subset(&mut rng, &universe, subset.size)
            }
            None => universe,
        })
    }

    /// Deterministic hash of this config together with the strategy.
    ///
    /// Two runs with identical inputs share a RunId.
    pub fn run_id(&self, strategy: &Strategy) -> RunId {
        let json = serde_json::to_string(self).expect("BacktestConfig serialization failed");
        let mut hasher = blake3::Hasher::new();
        hasher.update(json.as_bytes());
        hasher.update(strategy.fingerprint().as_bytes());
        hasher.finalize().to_hex().to_string()
    }
}
