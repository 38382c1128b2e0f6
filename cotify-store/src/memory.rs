//! In-memory record store.
//!
//! Fast, thread-safe storage suitable for development, testing,
//! and single-process deployments.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, instrument};

use cotify_core::error::{CotifyError, Result};
use cotify_core::traits::RecordStore;
use cotify_core::types::{ListFilter, Record, RecordDraft};

/// In-memory record store.
///
/// Records are keyed by their natural key, so the map entry doubles as the
/// uniqueness constraint: of any number of concurrent inserts for one key,
/// exactly one finds the slot vacant.
///
/// # Thread Safety
///
/// All operations are thread-safe and can be called concurrently.
#[derive(Debug)]
pub struct MemoryStore {
    /// Primary storage: key → Record (soft-deleted records included)
    records: DashMap<String, Record>,
    /// Next record ID
    next_id: AtomicU64,
}

impl MemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Creates a store with preallocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: DashMap::with_capacity(capacity),
            next_id: AtomicU64::new(1),
        }
    }

    /// Marks the record for `key` as deleted.
    ///
    /// The record disappears from lookups and listings but keeps its key,
    /// so a later insert for the same key still conflicts. Returns false if
    /// there was no live record.
    pub fn soft_delete(&self, key: &str) -> bool {
        match self.records.get_mut(key) {
            Some(mut record) if !record.is_deleted() => {
                let now = Utc::now();
                record.deleted_at = Some(now);
                record.updated_at = now;
                debug!(key, id = record.id, "Soft-deleted record");
                true
            }
            _ => false,
        }
    }

    /// Clears all records and resets ID assignment.
    pub fn clear(&self) {
        self.records.clear();
        self.next_id.store(1, Ordering::SeqCst);
    }

    /// Returns the number of stored records, soft-deleted ones included.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    #[instrument(skip(self))]
    async fn find_by_key(&self, key: &str) -> Result<Option<Record>> {
        Ok(self
            .records
            .get(key)
            .filter(|record| !record.is_deleted())
            .map(|record| record.value().clone()))
    }

    /// Validates the draft, assigns an ID, and stores it under its key.
    #[instrument(skip(self, draft), fields(key = %draft.key))]
    async fn insert(&self, draft: RecordDraft) -> Result<Record> {
        draft.validate()?;

        match self.records.entry(draft.key.clone()) {
            Entry::Occupied(_) => {
                debug!("Key already stored");
                Err(CotifyError::UniqueConflict(draft.key))
            }
            Entry::Vacant(slot) => {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                let record = Record::from_draft(id, draft, Utc::now());
                debug!(id, kind = %record.kind, "Inserted record");
                slot.insert(record.clone());
                Ok(record)
            }
        }
    }

    #[instrument(skip(self))]
    async fn list_filtered(&self, filter: &ListFilter) -> Result<Vec<Record>> {
        let mut records: Vec<Record> = self
            .records
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();

        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        debug!(count = records.len(), "Listed records");
        Ok(records)
    }

    async fn count(&self) -> Result<u64> {
        let live = self
            .records
            .iter()
            .filter(|entry| !entry.value().is_deleted())
            .count();
        Ok(live as u64)
    }
}
