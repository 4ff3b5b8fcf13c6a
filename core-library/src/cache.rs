//! # TTL Cache
//!
//! Generic key/value cache with per-instance time-to-live and a soft size cap.
//!
//! ## Expiry
//!
//! An entry is valid while `now - inserted_at < ttl`. Expired entries are
//! removed:
//! - lazily, when a `get` finds them stale
//! - by [`TtlCache::cleanup`], run periodically by the sweeper task
//! - by a forced cleanup when `set` finds the cache at `max_size`
//!
//! Cleanup only drops expired entries, so `max_size` can be exceeded while
//! every entry is still fresh.
//!
//! ## Usage
//!
//! ```ignore
//! use core_library::cache::TtlCache;
//! use std::time::Duration;
//!
//! let cache = Arc::new(TtlCache::new(Duration::from_secs(600), 1000));
//! let sweeper = cache.spawn_sweeper(Duration::from_secs(300), shutdown.child_token());
//!
//! cache.set("image_https://...".to_string(), record).await;
//! let hit = cache.get("image_https://...").await;
//! ```

use bridge_traits::time::{Clock, SystemClock};
use serde::Serialize;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Cached value with its insertion time (Unix millis).
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub inserted_at: i64,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: i64, ttl_ms: i64) -> bool {
        now - self.inserted_at >= ttl_ms
    }
}

/// Point-in-time cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub valid_entries: usize,
    pub expired_entries: usize,
    pub ttl_ms: u64,
    pub max_size: usize,
}

/// Time-bounded cache shared by concurrent pipelines.
pub struct TtlCache<K, V> {
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
    ttl: Duration,
    max_size: usize,
    clock: Arc<dyn Clock>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(ttl: Duration, max_size: usize) -> Self {
        Self::with_clock(ttl, max_size, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, max_size: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            max_size,
            clock,
        }
    }

    fn ttl_ms(&self) -> i64 {
        i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX)
    }

    /// Value for `key` if present and not expired.
    pub async fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = self.clock.unix_timestamp_millis();
        let ttl_ms = self.ttl_ms();

        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if !entry.is_expired(now, ttl_ms) => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        // Stale: evict, re-checking under the write lock in case a writer
        // refreshed the entry in between.
        let mut entries = self.entries.write().await;
        if entries
            .get(key)
            .is_some_and(|entry| entry.is_expired(now, ttl_ms))
        {
            entries.remove(key);
        }
        None
    }

    /// Store `value` stamped with the current time.
    pub async fn set(&self, key: K, value: V) {
        let now = self.clock.unix_timestamp_millis();
        let ttl_ms = self.ttl_ms();
        let mut entries = self.entries.write().await;

        if entries.len() >= self.max_size && !entries.contains_key(&key) {
            let removed = purge_expired(&mut entries, now, ttl_ms);
            debug!(
                removed,
                remaining = entries.len(),
                max_size = self.max_size,
                "Cache at capacity, forced cleanup"
            );
        }

        entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: now,
            },
        );
    }

    /// Drop every entry whose key matches `predicate`, returning how many went.
    pub async fn remove_matching<F>(&self, predicate: F) -> usize
    where
        F: Fn(&K) -> bool,
    {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|k, _| !predicate(k));
        before - entries.len()
    }

    /// Delete all expired entries. Returns the number removed.
    pub async fn cleanup(&self) -> usize {
        let now = self.clock.unix_timestamp_millis();
        let mut entries = self.entries.write().await;
        purge_expired(&mut entries, now, self.ttl_ms())
    }

    pub async fn stats(&self) -> CacheStats {
        let now = self.clock.unix_timestamp_millis();
        let ttl_ms = self.ttl_ms();
        let entries = self.entries.read().await;

        let expired = entries
            .values()
            .filter(|entry| entry.is_expired(now, ttl_ms))
            .count();

        CacheStats {
            total_entries: entries.len(),
            valid_entries: entries.len() - expired,
            expired_entries: expired,
            ttl_ms: u64::try_from(self.ttl.as_millis()).unwrap_or(u64::MAX),
            max_size: self.max_size,
        }
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Run [`cleanup`](Self::cleanup) every `interval` until `shutdown` fires.
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        let cache = Arc::clone(self);

        tokio::spawn(async move {
            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        debug!("Cache sweeper stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        let removed = cache.cleanup().await;
                        if removed > 0 {
                            info!(removed, "Swept expired cache entries");
                        }
                    }
                }
            }
        })
    }
}

fn purge_expired<K, V>(entries: &mut HashMap<K, CacheEntry<V>>, now: i64, ttl_ms: i64) -> usize {
    let before = entries.len();
    entries.retain(|_, entry| !entry.is_expired(now, ttl_ms));
    before - entries.len()
}
