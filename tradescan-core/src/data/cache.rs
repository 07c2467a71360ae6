//! TTL cache and a caching provider decorator.
//!
//! Time comes from an injected [`Clock`] so expiry is testable without
//! sleeping. Empty series are never cached: "no data" is retried.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::debug;

use super::provider::{Fundamentals, MarketDataProvider};
use crate::domain::{BarSeries, Symbol};

/// Monotonic time source.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        *offset += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = *self.offset.lock().unwrap_or_else(|e| e.into_inner());
        self.origin + offset
    }
}

/// Key/value store whose entries expire `ttl` after insertion.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, (Instant, V)>>,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Live value for `key`. An expired entry is evicted on the way out.
    pub fn get(&self, key: &K, now: Instant) -> Option<V> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let (inserted, value) = entries.get(key)?;
        if now.duration_since(*inserted) < self.ttl {
            return Some(value.clone());
        }
        entries.remove(key);
        None
    }

    /// Store `value` and drop every entry already expired at `now`.
    pub fn insert(&self, key: K, value: V, now: Instant) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.retain(|_, (inserted, _)| now.duration_since(*inserted) < self.ttl);
        entries.insert(key, (now, value));
    }

    /// Drop every expired entry; returns how many were removed.
    pub fn purge_expired(&self, now: Instant) -> usize {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|_, (inserted, _)| now.duration_since(*inserted) < self.ttl);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Expiry per cached concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    pub benchmark: Duration,
    pub bars: Duration,
    pub fundamentals: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            benchmark: Duration::from_secs(3600),
            bars: Duration::from_secs(15 * 60),
            fundamentals: Duration::from_secs(24 * 3600),
        }
    }
}

/// Decorator caching another provider's responses.
pub struct CachedProvider<P> {
    inner: P,
    clock: Arc<dyn Clock>,
    benchmark: TtlCache<usize, BarSeries>,
    bars: TtlCache<(Symbol, usize), BarSeries>,
    fundamentals: TtlCache<Symbol, Fundamentals>,
}

impl<P: MarketDataProvider> CachedProvider<P> {
    pub fn new(inner: P, clock: Arc<dyn Clock>, ttls: CacheTtls) -> Self {
        Self {
            inner,
            clock,
            benchmark: TtlCache::new(ttls.benchmark),
            bars: TtlCache::new(ttls.bars),
            fundamentals: TtlCache::new(ttls.fundamentals),
        }
    }

    pub fn with_system_clock(inner: P) -> Self {
        Self::new(inner, Arc::new(SystemClock), CacheTtls::default())
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

impl<P: MarketDataProvider> MarketDataProvider for CachedProvider<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn get_bars(&self, symbol: &str, lookback_days: usize) -> BarSeries {
        let now = self.clock.now();
        let key = (symbol.to_string(), lookback_days);
        if let Some(hit) = self.bars.get(&key, now) {
            return hit;
        }
        let fresh = self.inner.get_bars(symbol, lookback_days);
        if !fresh.is_empty() {
            self.bars.insert(key, fresh.clone(), now);
        }
        fresh
    }

    fn get_benchmark(&self, lookback_days: usize) -> BarSeries {
        let now = self.clock.now();
        if let Some(hit) = self.benchmark.get(&lookback_days, now) {
            debug!(lookback_days, "benchmark cache hit");
            return hit;
        }
        let fresh = self.inner.get_benchmark(lookback_days);
        if !fresh.is_empty() {
            self.benchmark.insert(lookback_days, fresh.clone(), now);
        }
        fresh
    }

    fn get_fundamentals(&self, symbol: &str) -> Fundamentals {
        let now = self.clock.now();
        let key = symbol.to_string();
        if let Some(hit) = self.fundamentals.get(&key, now) {
            return hit;
        }
        let fresh = self.inner.get_fundamentals(symbol);
        if !fresh.is_unavailable() {
            self.fundamentals.insert(key, fresh, now);
        }
        fresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        benchmark_calls: AtomicUsize,
        benchmark: BarSeries,
    }

    impl MarketDataProvider for CountingProvider {
        fn name(&self) -> &str {
            "counting"
        }

        fn get_bars(&self, symbol: &str, _lookback_days: usize) -> BarSeries {
            BarSeries::empty(symbol)
        }

        fn get_benchmark(&self, _lookback_days: usize) -> BarSeries {
            self.benchmark_calls.fetch_add(1, Ordering::SeqCst);
            self.benchmark.clone()
        }

        fn get_fundamentals(&self, _symbol: &str) -> Fundamentals {
            Fundamentals::default()
        }
    }

    fn counting(benchmark: BarSeries) -> CountingProvider {
        CountingProvider {
            benchmark_calls: AtomicUsize::new(0),
            benchmark,
        }
    }

    #[test]
    fn ttl_cache_expires() {
        let clock = ManualClock::new();
        let cache = TtlCache::new(Duration::from_secs(10));
        cache.insert("k", 1, clock.now());
        assert_eq!(cache.get(&"k", clock.now()), Some(1));
        clock.advance(Duration::from_secs(10));
        assert_eq!(cache.get(&"k", clock.now()), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn purge_removes_only_expired() {
        let clock = ManualClock::new();
        let cache = TtlCache::new(Duration::from_secs(10));
        cache.insert("old", 1, clock.now());
        clock.advance(Duration::from_secs(6));
        cache.insert("new", 2, clock.now());
        clock.advance(Duration::from_secs(5));
        assert_eq!(cache.purge_expired(clock.now()), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn insert_evicts_stale_keys() {
        let clock = ManualClock::new();
        let cache = TtlCache::new(Duration::from_secs(10));
        cache.insert("a", 1, clock.now());
        cache.insert("b", 2, clock.now());
        clock.advance(Duration::from_secs(10));
        cache.insert("c", 3, clock.now());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&"c", clock.now()), Some(3));
    }

    #[test]
    fn unread_benchmark_lookbacks_do_not_accumulate() {
        let bench = BarSeries::new("BENCH", make_bars(&[10.0; 5])).unwrap();
        let clock = Arc::new(ManualClock::new());
        let provider = CachedProvider::new(counting(bench), clock.clone(), CacheTtls::default());

        provider.get_benchmark(400);
        provider.get_benchmark(300);
        assert_eq!(provider.benchmark.len(), 2);

        clock.advance(Duration::from_secs(3600));
        provider.get_benchmark(200);
        assert_eq!(provider.benchmark.len(), 1);
    }

    #[test]
    fn benchmark_cached_until_ttl() {
        let bench = BarSeries::new("BENCH", make_bars(&[10.0; 5])).unwrap();
        let clock = Arc::new(ManualClock::new());
        let provider = CachedProvider::new(counting(bench), clock.clone(), CacheTtls::default());

        provider.get_benchmark(400);
        provider.get_benchmark(400);
        assert_eq!(provider.inner().benchmark_calls.load(Ordering::SeqCst), 1);

        clock.advance(Duration::from_secs(3600));
        provider.get_benchmark(400);
        assert_eq!(provider.inner().benchmark_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn empty_benchmark_not_cached() {
        let clock = Arc::new(ManualClock::new());
        let provider =
            CachedProvider::new(counting(BarSeries::empty("BENCH")), clock, CacheTtls::default());
        assert!(provider.get_benchmark(400).is_empty());
        provider.get_benchmark(400);
        assert_eq!(provider.inner().benchmark_calls.load(Ordering::SeqCst), 2);
    }
}
