use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Default freshness window for whole-directory aggregates
pub const DEFAULT_TTL: Duration = Duration::from_secs(120);

struct CacheEntry<V> {
    value: V,
    computed_at: Instant,
}

/// Memoizes expensive whole-directory scans with TTL and single-flight
/// concurrency control.
///
/// A hit returns immediately. On a miss, callers serialize on a per-key
/// lock so at most one computation for that key is ever in flight; late
/// arrivals re-check the cache after acquiring the lock and pick up the
/// fresh value instead of recomputing. A failed computation (including a
/// cancelled scan) stores nothing.
///
/// Constructed once and injected into request handlers.
pub struct AggregationCache<V> {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
    key_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<V: Clone> AggregationCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
            key_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn get_or_compute<E>(
        &self,
        key: &str,
        force_refresh: bool,
        compute: impl FnOnce() -> std::result::Result<V, E>,
    ) -> std::result::Result<V, E> {
        if !force_refresh && let Some(value) = self.lookup(key) {
            tracing::debug!(key, "aggregation cache hit");
            return Ok(value);
        }

        let key_lock = self.key_lock(key);
        let _guard = key_lock.lock().expect("cache key lock poisoned");

        // Another caller may have just populated it while we waited
        if !force_refresh && let Some(value) = self.lookup(key) {
            return Ok(value);
        }

        tracing::debug!(key, force_refresh, "aggregation cache miss, computing");
        let value = compute()?;
        self.store(key, value.clone());
        Ok(value)
    }

    fn lookup(&self, key: &str) -> Option<V> {
        let entries = self.entries.lock().expect("cache entries lock poisoned");
        entries.get(key).and_then(|entry| {
            (entry.computed_at.elapsed() < self.ttl).then(|| entry.value.clone())
        })
    }

    fn store(&self, key: &str, value: V) {
        let mut entries = self.entries.lock().expect("cache entries lock poisoned");
        entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                computed_at: Instant::now(),
            },
        );
    }

    fn key_lock(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = self.key_locks.lock().expect("cache lock table poisoned");
        locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
