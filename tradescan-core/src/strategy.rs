//! Versioned strategy table: every tunable of the signal engine in one
//! serializable value, selected by configuration instead of forked code.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Regime;
use crate::regime::RegimeThresholds;
use crate::scoring::{FactorWeights, RegimeWeights};
use crate::trade::{EntryGate, RegimeTradeTable};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("weight '{component}' must be finite and non-negative (got {value})")]
    InvalidWeight { component: &'static str, value: f64 },

    #[error("weights must sum to 1.0 (got {sum})")]
    WeightSum { sum: f64 },

    #[error("threshold '{name}' out of range (got {value})")]
    InvalidThreshold { name: &'static str, value: f64 },

    #[error("failed to parse strategy TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Minimum total score for selection, per regime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectionThresholds {
    pub trend: f64,
    pub range: f64,
    pub volatile: f64,
}

impl SelectionThresholds {
    pub fn for_regime(&self, regime: Regime) -> f64 {
        match regime {
            Regime::Trend => self.trend,
            Regime::Range => self.range,
            Regime::Volatile => self.volatile,
        }
    }
}

impl Default for SelectionThresholds {
    fn default() -> Self {
        Self {
            trend: 60.0,
            range: 70.0,
            volatile: 60.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Strategy {
    pub name: String,
    pub version: u32,
    pub weights: RegimeWeights,
    pub trade_params: RegimeTradeTable,
    pub selection: SelectionThresholds,
    pub regime: RegimeThresholds,
    pub gate: EntryGate,
}

impl Default for Strategy {
    fn default() -> Self {
        Self {
            name: "regime_weighted".into(),
            version: 1,
            weights: RegimeWeights::default(),
            trade_params: RegimeTradeTable::default(),
            selection: SelectionThresholds::default(),
            regime: RegimeThresholds::default(),
            gate: EntryGate::default(),
        }
    }
}

fn check_range(name: &'static str, value: f64, lo: f64, hi: f64) -> Result<(), ConfigError> {
    if value.is_finite() && (lo..=hi).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidThreshold { name, value })
    }
}

impl Strategy {
    /// Parse and validate.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let strategy: Strategy = toml::from_str(text)?;
        strategy.validate()?;
        Ok(strategy)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Range checks for everything the weight type does not already enforce.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for regime in Regime::ALL {
            check_range("selection", self.selection.for_regime(regime), 0.0, 100.0)?;
            let params = self.trade_params.for_regime(regime);
            check_range("stop_multiple", params.stop_multiple, 0.0, f64::MAX)?;
            check_range("target_multiple", params.target_multiple, 0.0, f64::MAX)?;
            if params.max_holding_days == 0 {
                return Err(ConfigError::InvalidThreshold {
                    name: "max_holding_days",
                    value: 0.0,
                });
            }
        }
        check_range("adx_trend", self.regime.adx_trend, 0.0, 100.0)?;
        check_range("atr_fraction_range", self.regime.atr_fraction_range, 0.0, 1.0)?;
        check_range("max_bias_pct", self.gate.max_bias_pct, 0.0, f64::MAX)?;
        check_range("max_rsi", self.gate.max_rsi, 0.0, 100.0)?;
        Ok(())
    }

    /// Copy with one weight triple applied to every regime.
    pub fn with_uniform_weights(&self, weights: FactorWeights) -> Self {
        Self {
            name: format!(
                "{}[t{:.1}/m{:.1}/r{:.1}]",
                self.name,
                weights.trend(),
                weights.momentum(),
                weights.risk()
            ),
            weights: RegimeWeights::uniform(weights),
            ..self.clone()
        }
    }

    /// BLAKE3 hex digest of the canonical JSON form.
    pub fn fingerprint(&self) -> String {
        let json = serde_json::to_string(self).expect("Strategy must serialize");
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}
