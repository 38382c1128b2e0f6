//! In-memory TTL cache.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use cotify_core::constants::{DEFAULT_RECORD_TTL_SECS, DEFAULT_SWEEP_INTERVAL_SECS};

use crate::sweeper::Sweeper;

/// Lifetime used when `now + ttl` overflows `Instant`.
pub(crate) const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Cache entry with an absolute expiry.
///
/// `expires_at` is fixed at insertion; an update replaces the whole entry.
pub(crate) struct CacheEntry<T> {
    value: T,
    expires_at: Instant,
}

impl<T> CacheEntry<T> {
    fn new(value: T, ttl: Duration, now: Instant) -> Self {
        let expires_at = now
            .checked_add(ttl)
            .or_else(|| now.checked_add(FAR_FUTURE))
            .unwrap_or(now);
        Self { value, expires_at }
    }

    /// Still valid at the exact expiry instant.
    pub(crate) fn is_expired_at(&self, now: Instant) -> bool {
        now > self.expires_at
    }
}

pub(crate) type Entries<T> = DashMap<String, CacheEntry<T>>;

/// Removes every entry expired as of now, returning how many were removed.
///
/// Each removal re-checks expiry under the shard lock so an entry replaced
/// by a concurrent `set` survives.
pub(crate) fn purge_expired<T>(entries: &Entries<T>) -> usize {
    let now = Instant::now();
    let expired: Vec<String> = entries
        .iter()
        .filter(|entry| entry.value().is_expired_at(now))
        .map(|entry| entry.key().clone())
        .collect();

    expired
        .iter()
        .filter(|key| entries.remove_if(*key, |_, e| e.is_expired_at(now)).is_some())
        .count()
}

/// Cache configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CacheConfig {
    /// TTL applied by [`TtlCache::set`]
    pub default_ttl: Duration,
    /// How often the background sweep evicts expired entries
    pub sweep_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(DEFAULT_RECORD_TTL_SECS),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
        }
    }
}

impl CacheConfig {
    /// Sets the default TTL.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Sets the sweep interval.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }
}

/// Concurrent in-memory cache with per-entry TTL.
///
/// Keys are strings; values are any `Clone + Send + Sync` type. The map is
/// sharded, so readers and writers of unrelated keys do not contend.
///
/// # Expiry
///
/// Reads evict the entry they find expired. A background task started on
/// construction sweeps the whole map every [`CacheConfig::sweep_interval`]
/// to reclaim entries that are never read again. The task is stopped by
/// [`TtlCache::stop`] or when the cache is dropped.
pub struct TtlCache<T> {
    entries: Arc<Entries<T>>,
    config: CacheConfig,
    sweeper: Sweeper,
}

impl<T: Clone + Send + Sync + 'static> TtlCache<T> {
    /// Creates a new cache with default configuration.
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    /// Creates a cache with custom configuration.
    ///
    /// The sweep is spawned on the current tokio runtime. Without a runtime
    /// the cache still works; expired entries are then reclaimed on read or
    /// by [`TtlCache::purge_expired`].
    pub fn with_config(config: CacheConfig) -> Self {
        let entries = Arc::new(DashMap::new());
        let sweeper = Sweeper::spawn(entries.clone(), config.sweep_interval);
        Self {
            entries,
            config,
            sweeper,
        }
    }

    /// Gets a value if present and not expired.
    pub fn get(&self, key: &str) -> Option<T> {
        let now = Instant::now();
        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired_at(now) => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };

        if expired {
            self.entries.remove_if(key, |_, e| e.is_expired_at(now));
        }
        None
    }

    /// Stores a value with the default TTL, replacing any existing entry.
    pub fn set(&self, key: impl Into<String>, value: T) {
        self.set_with_ttl(key, value, self.config.default_ttl);
    }

    /// Stores a value with a custom TTL, replacing any existing entry.
    pub fn set_with_ttl(&self, key: impl Into<String>, value: T, ttl: Duration) {
        self.entries
            .insert(key.into(), CacheEntry::new(value, ttl, Instant::now()));
    }

    /// Removes an entry. No-op if absent.
    pub fn delete(&self, key: &str) {
        self.entries.remove(key);
    }

    /// Removes all entries. The background sweep keeps running.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Removes all expired entries now, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        purge_expired(&self.entries)
    }

    /// Returns the number of stored entries, expired ones included.
    ///
    /// Under concurrent mutation this is a best-effort snapshot.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let mut stats = CacheStats::default();
        for entry in self.entries.iter() {
            stats.total_entries += 1;
            if entry.value().is_expired_at(now) {
                stats.expired_entries += 1;
            }
        }
        stats.valid_entries = stats.total_entries - stats.expired_entries;
        stats
    }

    /// Returns the cache configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Stops the background sweep. Safe to call repeatedly and from any thread.
    pub fn stop(&self) {
        self.sweeper.stop();
    }

    /// Returns true while the background sweep is alive.
    pub fn is_running(&self) -> bool {
        self.sweeper.is_running()
    }
}

impl<T: Clone + Send + Sync + 'static> Default for TtlCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Total entries (including expired)
    pub total_entries: usize,
    /// Expired entries not yet reclaimed
    pub expired_entries: usize,
    /// Valid (non-expired) entries
    pub valid_entries: usize,
}
