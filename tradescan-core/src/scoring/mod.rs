//! Regime-weighted multi-factor scoring.

pub mod model;
pub mod snapshot;
pub mod weights;

pub use model::{score_candidate, Score};
pub use snapshot::{assign_rs_ranks, percentile_ranks, relative_strength, CandidateSnapshot};
pub use weights::{FactorWeights, RegimeWeights};
