//! Cache-aside coordinator combining a record store with a TTL cache.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use cotify_cache::{CacheConfig, CacheStats, TtlCache};
use cotify_core::error::Result;
use cotify_core::traits::RecordStore;
use cotify_core::types::{validate_key, ListFilter, Record, RecordDraft, StoreOutcome};

/// Coordinator configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Whether to use caching
    pub enable_cache: bool,
    /// Cache TTL and sweep settings
    pub cache: CacheConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            enable_cache: true,
            cache: CacheConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Sets how long looked-up records stay cached.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache = self.cache.with_default_ttl(ttl);
        self
    }

    /// Sets how often expired cache entries are swept.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.cache = self.cache.with_sweep_interval(interval);
        self
    }

    /// Disables caching.
    pub fn no_cache(mut self) -> Self {
        self.enable_cache = false;
        self
    }
}

/// Deduplicating record service.
///
/// Resolves lookups and creates by:
/// 1. Checking the cache
/// 2. Falling through to the backend on a miss
/// 3. Caching every record the backend returns or creates
///
/// The backend's unique constraint on the key decides create races; the
/// losers re-query and return the winner's record. Listings always go to
/// the backend.
pub struct RecordService {
    store: Arc<dyn RecordStore>,
    cache: Option<TtlCache<Record>>,
}

impl RecordService {
    /// Creates a service with default configuration.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self::with_config(store, ServiceConfig::default())
    }

    /// Creates a service with custom configuration.
    pub fn with_config(store: Arc<dyn RecordStore>, config: ServiceConfig) -> Self {
        let cache = if config.enable_cache {
            Some(TtlCache::with_config(config.cache))
        } else {
            None
        };

        Self { store, cache }
    }

    /// Returns the stored record for `key`, creating it if absent.
    ///
    /// `is_new` is true only for the caller whose insert created the record.
    /// Input is validated before the cache or backend is consulted. Backend
    /// errors other than a lost create race propagate unchanged and leave
    /// the cache untouched.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let outcome = service
    ///     .store_or_create("https://x.test/a", "A", "video", "HD")
    ///     .await?;
    /// println!("{} (new: {})", outcome.record.id, outcome.is_new);
    /// ```
    #[instrument(skip(self, key, title, kind, attributes))]
    pub async fn store_or_create(
        &self,
        key: impl Into<String>,
        title: impl Into<String>,
        kind: impl Into<String>,
        attributes: impl Into<String>,
    ) -> Result<StoreOutcome> {
        let draft = RecordDraft::new(key, title, kind, attributes);
        draft.validate()?;

        if let Some(record) = self.cached(&draft.key) {
            debug!(key = %draft.key, "Cache hit");
            return Ok(StoreOutcome::existing(record));
        }

        debug!(key = %draft.key, "Cache miss, querying backend");

        if let Some(record) = self.store.find_by_key(&draft.key).await? {
            self.remember(&record);
            return Ok(StoreOutcome::existing(record));
        }

        let key = draft.key.clone();
        match self.store.insert(draft).await {
            Ok(record) => {
                info!(key = %record.key, id = record.id, "Created record");
                self.remember(&record);
                Ok(StoreOutcome::created(record))
            }
            Err(e) if e.is_conflict() => {
                debug!(key = %key, "Lost create race, re-querying");
                // A soft-deleted winner holds the key but is invisible.
                match self.store.find_by_key(&key).await? {
                    Some(record) => {
                        self.remember(&record);
                        Ok(StoreOutcome::existing(record))
                    }
                    None => Err(e),
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Looks up the record for `key`, from cache when possible.
    ///
    /// A backend miss returns `Ok(None)` and caches nothing.
    #[instrument(skip(self))]
    pub async fn fetch(&self, key: &str) -> Result<Option<Record>> {
        validate_key(key)?;

        if let Some(record) = self.cached(key) {
            debug!(key, "Cache hit");
            return Ok(Some(record));
        }

        let record = self.store.find_by_key(key).await?;
        if let Some(record) = &record {
            self.remember(record);
        }
        Ok(record)
    }

    /// Lists live records matching the filter, straight from the backend.
    #[instrument(skip(self))]
    pub async fn list_filtered(&self, filter: &ListFilter) -> Result<Vec<Record>> {
        self.store.list_filtered(filter).await
    }

    /// Drops the cached record for `key`, if any.
    pub fn invalidate(&self, key: &str) {
        if let Some(cache) = &self.cache {
            cache.delete(key);
        }
    }

    /// Returns cache statistics, or `None` when caching is disabled.
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(TtlCache::stats)
    }

    /// Returns the backend this service fronts.
    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Stops the cache's background sweep. Idempotent.
    pub fn shutdown(&self) {
        if let Some(cache) = &self.cache {
            cache.stop();
        }
    }

    fn cached(&self, key: &str) -> Option<Record> {
        self.cache.as_ref().and_then(|cache| cache.get(key))
    }

    fn remember(&self, record: &Record) {
        if let Some(cache) = &self.cache {
            cache.set(record.key.clone(), record.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use cotify_core::error::CotifyError;
    use cotify_store::MemoryStore;
    use tokio::task::JoinSet;

    /// Wraps a `MemoryStore` and counts backend calls.
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryStore,
        finds: AtomicUsize,
        inserts: AtomicUsize,
        lists: AtomicUsize,
        /// Number of upcoming `find_by_key` calls that pretend the key is absent
        blind_finds: AtomicUsize,
    }

    impl CountingStore {
        fn finds(&self) -> usize {
            self.finds.load(Ordering::SeqCst)
        }

        fn inserts(&self) -> usize {
            self.inserts.load(Ordering::SeqCst)
        }

        fn lists(&self) -> usize {
            self.lists.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RecordStore for CountingStore {
        async fn find_by_key(&self, key: &str) -> Result<Option<Record>> {
            self.finds.fetch_add(1, Ordering::SeqCst);
            let blind = self
                .blind_finds
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if blind {
                return Ok(None);
            }
            self.inner.find_by_key(key).await
        }

        async fn insert(&self, draft: RecordDraft) -> Result<Record> {
            self.inserts.fetch_add(1, Ordering::SeqCst);
            self.inner.insert(draft).await
        }

        async fn list_filtered(&self, filter: &ListFilter) -> Result<Vec<Record>> {
            self.lists.fetch_add(1, Ordering::SeqCst);
            self.inner.list_filtered(filter).await
        }

        async fn count(&self) -> Result<u64> {
            self.inner.count().await
        }
    }

    /// Backend that is always down.
    struct FailingStore;

    #[async_trait]
    impl RecordStore for FailingStore {
        async fn find_by_key(&self, _key: &str) -> Result<Option<Record>> {
            Err(CotifyError::BackendUnavailable("connection refused".into()))
        }

        async fn insert(&self, _draft: RecordDraft) -> Result<Record> {
            Err(CotifyError::BackendUnavailable("connection refused".into()))
        }

        async fn list_filtered(&self, _filter: &ListFilter) -> Result<Vec<Record>> {
            Err(CotifyError::BackendUnavailable("connection refused".into()))
        }

        async fn count(&self) -> Result<u64> {
            Err(CotifyError::BackendUnavailable("connection refused".into()))
        }
    }

    fn service_with(store: Arc<CountingStore>) -> RecordService {
        RecordService::new(store)
    }

    #[tokio::test]
    async fn test_store_or_create_new_then_existing() {
        let store = Arc::new(CountingStore::default());
        let service = service_with(store.clone());

        let first = service
            .store_or_create("https://x.test/a", "A", "video", "HD")
            .await
            .unwrap();
        assert!(first.is_new);
        assert_eq!(first.record.title, "A");
        assert_eq!(first.record.kind, "video");
        assert_eq!(first.record.attributes, "HD");

        let again = service
            .store_or_create("https://x.test/a", "A", "video", "HD")
            .await
            .unwrap();
        assert!(!again.is_new);
        assert_eq!(again.record, first.record);
    }

    #[tokio::test]
    async fn test_repeat_returns_first_callers_fields() {
        let service = service_with(Arc::new(CountingStore::default()));

        service
            .store_or_create("https://x.test/a", "A", "video", "HD")
            .await
            .unwrap();
        let again = service
            .store_or_create("https://x.test/a", "Other", "audio", "SD")
            .await
            .unwrap();

        assert!(!again.is_new);
        assert_eq!(again.record.title, "A");
        assert_eq!(again.record.kind, "video");
    }

    #[tokio::test]
    async fn test_cache_hit_skips_backend() {
        let store = Arc::new(CountingStore::default());
        let service = service_with(store.clone());

        service
            .store_or_create("https://x.test/a", "A", "video", "HD")
            .await
            .unwrap();
        let finds = store.finds();

        service
            .store_or_create("https://x.test/a", "A", "video", "HD")
            .await
            .unwrap();
        service.fetch("https://x.test/a").await.unwrap().unwrap();

        assert_eq!(store.finds(), finds);
        assert_eq!(store.inserts(), 1);
    }

    #[tokio::test]
    async fn test_existing_backend_record_is_cached() {
        let store = Arc::new(CountingStore::default());
        store
            .inner
            .insert(RecordDraft::new("https://x.test/a", "A", "video", ""))
            .await
            .unwrap();
        let service = service_with(store.clone());

        let outcome = service
            .store_or_create("https://x.test/a", "A", "video", "")
            .await
            .unwrap();
        assert!(!outcome.is_new);
        assert_eq!(store.inserts(), 0);

        service.fetch("https://x.test/a").await.unwrap();
        assert_eq!(store.finds(), 1);
    }

    #[tokio::test]
    async fn test_lost_race_returns_winner() {
        let store = Arc::new(CountingStore::default());
        let winner = store
            .inner
            .insert(RecordDraft::new("https://x.test/a", "Winner", "video", ""))
            .await
            .unwrap();
        // The first lookup misses, as if the winner committed just after it
        store.blind_finds.store(1, Ordering::SeqCst);
        let service = service_with(store.clone());

        let outcome = service
            .store_or_create("https://x.test/a", "Loser", "video", "")
            .await
            .unwrap();

        assert!(!outcome.is_new);
        assert_eq!(outcome.record, winner);
        assert_eq!(store.finds(), 2);
        assert_eq!(store.inserts(), 1);
    }

    #[tokio::test]
    async fn test_conflict_with_invisible_winner_surfaces() {
        let store = Arc::new(CountingStore::default());
        store
            .inner
            .insert(RecordDraft::new("https://x.test/a", "A", "video", ""))
            .await
            .unwrap();
        store.inner.soft_delete("https://x.test/a");
        let service = service_with(store.clone());

        let err = service
            .store_or_create("https://x.test/a", "A", "video", "")
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(service.cache_stats().unwrap().total_entries, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_store_or_create_one_winner() {
        let store = Arc::new(CountingStore::default());
        let service = Arc::new(service_with(store.clone()));
        let mut tasks = JoinSet::new();

        for i in 0..32 {
            let service = service.clone();
            tasks.spawn(async move {
                service
                    .store_or_create(
                        "https://x.test/race",
                        format!("title {i}"),
                        "video",
                        format!("attrs {i}"),
                    )
                    .await
                    .unwrap()
            });
        }

        let mut outcomes = Vec::new();
        while let Some(result) = tasks.join_next().await {
            outcomes.push(result.unwrap());
        }

        let winners: Vec<_> = outcomes.iter().filter(|o| o.is_new).collect();
        assert_eq!(winners.len(), 1);
        let winner = winners[0].record.clone();

        // Losers get the winner's record, not their own fields
        assert!(outcomes
            .iter()
            .all(|o| o.record.id == winner.id && o.record.title == winner.title));
        assert_eq!(store.inner.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_never_inserted_is_none() {
        let store = Arc::new(CountingStore::default());
        let service = service_with(store.clone());

        assert!(service.fetch("https://x.test/none").await.unwrap().is_none());
        assert!(service.fetch("https://x.test/none").await.unwrap().is_none());

        // Misses are not cached
        assert_eq!(store.finds(), 2);
        assert_eq!(service.cache_stats().unwrap().total_entries, 0);
    }

    #[tokio::test]
    async fn test_list_filtered_bypasses_cache() {
        let store = Arc::new(CountingStore::default());
        let service = service_with(store.clone());

        service
            .store_or_create("https://x.test/v", "V", "video", "")
            .await
            .unwrap();
        service
            .store_or_create("https://x.test/a", "A", "audio", "")
            .await
            .unwrap();

        let videos = service
            .list_filtered(&ListFilter::new().kind("video"))
            .await
            .unwrap();
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].key, "https://x.test/v");

        service.list_filtered(&ListFilter::new()).await.unwrap();
        assert_eq!(store.lists(), 2);
    }

    #[tokio::test]
    async fn test_invalid_input_rejected_before_backend() {
        let store = Arc::new(CountingStore::default());
        let service = service_with(store.clone());

        let err = service
            .store_or_create("", "A", "video", "")
            .await
            .unwrap_err();
        assert!(err.is_validation_error());

        let err = service
            .store_or_create("https://x.test/a", "", "video", "")
            .await
            .unwrap_err();
        assert!(err.is_validation_error());

        assert!(service.fetch("  ").await.unwrap_err().is_validation_error());

        assert_eq!(store.finds(), 0);
        assert_eq!(store.inserts(), 0);
    }

    #[tokio::test]
    async fn test_backend_error_propagates_and_caches_nothing() {
        let service = RecordService::new(Arc::new(FailingStore));

        let err = service
            .store_or_create("https://x.test/a", "A", "video", "")
            .await
            .unwrap_err();
        assert!(matches!(err, CotifyError::BackendUnavailable(_)));

        let err = service.fetch("https://x.test/a").await.unwrap_err();
        assert!(err.is_recoverable());

        assert!(service.list_filtered(&ListFilter::new()).await.is_err());
        assert_eq!(service.cache_stats().unwrap().total_entries, 0);
    }

    #[tokio::test]
    async fn test_invalidate_forces_backend_lookup() {
        let store = Arc::new(CountingStore::default());
        let service = service_with(store.clone());

        service
            .store_or_create("https://x.test/a", "A", "video", "")
            .await
            .unwrap();
        service.invalidate("https://x.test/a");

        let finds = store.finds();
        service.fetch("https://x.test/a").await.unwrap().unwrap();
        assert_eq!(store.finds(), finds + 1);
    }

    #[tokio::test]
    async fn test_no_cache_always_hits_backend() {
        let store = Arc::new(CountingStore::default());
        let service = RecordService::with_config(store.clone(), ServiceConfig::default().no_cache());

        service
            .store_or_create("https://x.test/a", "A", "video", "")
            .await
            .unwrap();
        service.fetch("https://x.test/a").await.unwrap().unwrap();
        service.fetch("https://x.test/a").await.unwrap().unwrap();

        assert_eq!(store.finds(), 3);
        assert!(service.cache_stats().is_none());
    }

    #[tokio::test]
    async fn test_expired_cache_entry_refetched() {
        let store = Arc::new(CountingStore::default());
        let config = ServiceConfig::default().with_cache_ttl(Duration::from_millis(10));
        let service = RecordService::with_config(store.clone(), config);

        service
            .store_or_create("https://x.test/a", "A", "video", "")
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        let finds = store.finds();
        let record = service.fetch("https://x.test/a").await.unwrap().unwrap();
        assert_eq!(record.key, "https://x.test/a");
        assert_eq!(store.finds(), finds + 1);
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let service = service_with(Arc::new(CountingStore::default()));
        service.shutdown();
        service.shutdown();

        // Still serves requests after the sweep is stopped
        let outcome = service
            .store_or_create("https://x.test/a", "A", "video", "")
            .await
            .unwrap();
        assert!(outcome.is_new);
    }
}
