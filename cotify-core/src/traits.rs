//! Common traits for Cotify.
//!
//! These traits define the interfaces that different backends can satisfy,
//! enabling the coordinator to sit in front of any of them and enabling testing.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ListFilter, Record, RecordDraft};

// ═══════════════════════════════════════════════════════════════════════════════
// RECORD STORE TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Interface for persistent record storage.
///
/// Implementations might use:
/// - In-memory storage (for testing/development)
/// - libSQL / Turso (for production)
///
/// The store owns the uniqueness constraint on [`Record::key`]: it is the sole
/// arbiter of which concurrent creator wins.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Looks up the live (not soft-deleted) record for a key.
    async fn find_by_key(&self, key: &str) -> Result<Option<Record>>;

    /// Persists a new record, assigning its id and timestamps.
    ///
    /// Must return [`CotifyError::UniqueConflict`](crate::CotifyError::UniqueConflict)
    /// when a record with the same key already exists, soft-deleted or not.
    async fn insert(&self, draft: RecordDraft) -> Result<Record>;

    /// Returns live records matching every set field of the filter,
    /// ordered by creation time.
    async fn list_filtered(&self, filter: &ListFilter) -> Result<Vec<Record>>;

    /// Returns the number of live records.
    async fn count(&self) -> Result<u64>;
}
