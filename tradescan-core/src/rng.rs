//! Deterministic RNG hierarchy.
//!
//! A master seed yields sub-seeds for each `(scope, iteration)` pair via
//! BLAKE3, so a seeded run draws the same universe subsets and report
//! quotes regardless of call order or thread count.

use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;

/// Scope for the backtest universe subset draw.
pub const UNIVERSE_SCOPE: &str = "universe";
/// Scope for the reminder line appended to reports.
pub const REMINDER_SCOPE: &str = "reminder";

#[derive(Debug, Clone)]
pub struct RngHierarchy {
    master_seed: u64,
}

impl RngHierarchy {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Sub-seed for `(scope, iteration)`, independent of derivation order.
    pub fn sub_seed(&self, scope: &str, iteration: u64) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.master_seed.to_le_bytes());
        hasher.update(scope.as_bytes());
        hasher.update(&iteration.to_le_bytes());
        let hash = hasher.finalize();
        let mut head = [0u8; 8];
        head.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(head)
    }

    pub fn rng_for(&self, scope: &str, iteration: u64) -> StdRng {
        StdRng::seed_from_u64(self.sub_seed(scope, iteration))
    }
}

/// Up to `k` distinct items, in the order they appear in `items`.
pub fn sample_subset<T: Clone>(rng: &mut StdRng, items: &[T], k: usize) -> Vec<T> {
    if k >= items.len() {
        return items.to_vec();
    }
    let mut picked = index::sample(rng, items.len(), k).into_vec();
    picked.sort_unstable();
    picked.into_iter().map(|i| items[i].clone()).collect()
}
