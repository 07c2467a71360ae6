//! Market data boundary: provider trait, in-memory and cached providers,
//! synthetic bars.

pub mod cache;
pub mod provider;
pub mod synthetic;

pub use cache::{CacheTtls, CachedProvider, Clock, ManualClock, SystemClock, TtlCache};
pub use provider::{Fundamentals, InMemoryProvider, MarketDataProvider};
pub use synthetic::{random_walk, symbol_seed, WalkParams};
