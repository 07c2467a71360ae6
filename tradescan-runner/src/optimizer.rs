//! Weight-grid optimizer: replays history once per weight triple and ranks
//! the triples by `mean(weighted return) * win_rate`.

use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use tradescan_core::scoring::FactorWeights;
use tradescan_core::Strategy;

use crate::config::BacktestConfig;
use crate::replay::PreparedData;
use crate::runner::{run_backtest_prepared, BacktestResult, RunError};

/// Grid of (trend, momentum) weights; risk takes the remainder.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightGrid {
    pub trend: Vec<f64>,
    pub momentum: Vec<f64>,
    /// Triples whose risk weight falls below this are skipped.
    pub min_risk: f64,
}

impl Default for WeightGrid {
    /// Trend 0.4 to 0.7, momentum 0.2 to 0.4, risk at least 0.1.
    fn default() -> Self {
        Self {
            trend: vec![0.4, 0.5, 0.6, 0.7],
            momentum: vec![0.2, 0.3, 0.4],
            min_risk: 0.1,
        }
    }
}

impl WeightGrid {
    /// Valid triples in grid order (trend-major).
    pub fn triples(&self) -> Result<Vec<FactorWeights>, RunError> {
        let mut out = Vec::new();
        for &t in &self.trend {
            for &m in &self.momentum {
                // Strip float noise only, so 1 - 0.7 - 0.2 is 0.1 and
                // 1 - 0.45 - 0.2 stays 0.35
                let r = ((1.0 - t - m) * 1e9).round() / 1e9;
                if r + 1e-9 < self.min_risk {
                    continue;
                }
                out.push(FactorWeights::new(t, m, r)?);
            }
        }
        Ok(out)
    }
}

/// One evaluated grid point.
#[derive(Debug, Clone, Serialize)]
pub struct SweepEntry {
    /// Position in grid order.
    pub grid_index: usize,
    pub weights: FactorWeights,
    pub result: BacktestResult,
}

impl SweepEntry {
    pub fn fitness(&self) -> f64 {
        self.result.metrics.fitness
    }
}

/// Sweep results, sorted by fitness (descending). Equal fitness keeps grid
/// order.
#[derive(Debug, Clone, Serialize)]
pub struct SweepResults {
    entries: Vec<SweepEntry>,
}

impl SweepResults {
    fn new(mut entries: Vec<SweepEntry>) -> Self {
        entries.sort_by_key(|e| e.grid_index);
        entries.sort_by(|a, b| b.fitness().total_cmp(&a.fitness()));
        Self { entries }
    }

    pub fn all(&self) -> &[SweepEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_n(&self, n: usize) -> &[SweepEntry] {
        &self.entries[..n.min(self.entries.len())]
    }

    /// Highest-fitness triple that produced at least one trade.
    pub fn best(&self) -> Option<&SweepEntry> {
        self.entries.iter().find(|e| e.result.metrics.trade_count > 0)
    }
}

/// Grid sweep executor over one prepared data set.
pub struct Optimizer<'a> {
    data: &'a PreparedData,
    dataset_hash: &'a str,
    has_synthetic: bool,
    parallel: bool,
}

impl<'a> Optimizer<'a> {
    pub fn new(data: &'a PreparedData, dataset_hash: &'a str, has_synthetic: bool) -> Self {
        Self {
            data,
            dataset_hash,
            has_synthetic,
            parallel: true,
        }
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Each triple is applied to every regime of `base`.
    pub fn sweep(
        &self,
        grid: &WeightGrid,
        base: &Strategy,
        config: &BacktestConfig,
    ) -> Result<SweepResults, RunError> {
        let triples = grid.triples()?;
        let run = |(grid_index, weights): (usize, &FactorWeights)| {
            let strategy = base.with_uniform_weights(*weights);
            run_backtest_prepared(self.data, &strategy, config, self.dataset_hash, self.has_synthetic)
                .map(|result| SweepEntry {
                    grid_index,
                    weights: *weights,
                    result,
                })
        };

        let entries: Vec<SweepEntry> = if self.parallel {
            triples
                .par_iter()
                .enumerate()
                .map(run)
                .collect::<Result<Vec<_>, _>>()?
        } else {
            triples
                .iter()
                .enumerate()
                .map(run)
                .collect::<Result<Vec<_>, _>>()?
        };

        let results = SweepResults::new(entries);
        if let Some(best) = results.best() {
            info!(
                triples = results.len(),
                trend = best.weights.trend(),
                momentum = best.weights.momentum(),
                risk = best.weights.risk(),
                fitness = best.fitness(),
                "sweep finished"
            );
        } else {
            info!(triples = results.len(), "sweep finished without trades");
        }
        Ok(results)
    }
}
