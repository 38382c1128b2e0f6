//! DTOs for API requests and responses.
//!
//! Field names follow the wire format existing SDK callers already use:
//! records travel as `items` with `url`, `type` and `metadata`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cotify_core::constants::{DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};
use cotify_core::types::{ListFilter, Record};

/// A stored item.
#[derive(Debug, Serialize)]
pub struct ItemDto {
    /// Record ID
    pub id: u64,
    /// Unique URL
    pub url: String,
    /// Title
    pub title: String,
    /// Item type
    #[serde(rename = "type")]
    pub kind: String,
    /// Opaque metadata
    pub metadata: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last write time
    pub updated_at: DateTime<Utc>,
}

impl From<Record> for ItemDto {
    fn from(record: Record) -> Self {
        Self {
            id: record.id,
            url: record.key,
            title: record.title,
            kind: record.kind,
            metadata: record.attributes,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Request to store an item.
#[derive(Debug, Deserialize)]
pub struct StoreItemRequest {
    /// Unique URL
    pub url: String,
    /// Title
    pub title: String,
    /// Item type
    #[serde(rename = "type")]
    pub kind: String,
    /// Opaque metadata
    #[serde(default)]
    pub metadata: String,
}

/// Response for storing an item.
#[derive(Debug, Serialize)]
pub struct StoreItemResponse {
    /// The stored item
    pub item: ItemDto,
    /// True if this request created the item
    pub is_new: bool,
}

/// Query parameters for listing items.
#[derive(Debug, Deserialize)]
pub struct ListItemsQuery {
    /// Filter by type
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Filter: created at or after (RFC 3339)
    pub from: Option<DateTime<Utc>>,
    /// Filter: created at or before (RFC 3339)
    pub to: Option<DateTime<Utc>>,
    /// Pagination: offset
    pub offset: Option<usize>,
    /// Pagination: limit
    pub limit: Option<usize>,
}

impl ListItemsQuery {
    /// Converts the query's filter fields into a [`ListFilter`].
    pub fn filter(&self) -> ListFilter {
        let mut filter = ListFilter::new();
        if let Some(kind) = &self.kind {
            filter = filter.kind(kind.clone());
        }
        if let Some(from) = self.from {
            filter = filter.from_time(from);
        }
        if let Some(to) = self.to {
            filter = filter.to_time(to);
        }
        filter
    }

    /// Page size, defaulted and capped.
    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIST_LIMIT).min(MAX_LIST_LIMIT)
    }
}

/// Response for listing items.
#[derive(Debug, Serialize)]
pub struct ListItemsResponse {
    /// Items on this page
    pub items: Vec<ItemDto>,
    /// Total count (for pagination)
    pub total: usize,
}

/// Query parameters for looking up one item.
#[derive(Debug, Deserialize)]
pub struct LookupQuery {
    /// URL to look up
    pub url: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "ok", or "degraded" when the backend did not answer
    pub status: String,
    /// Version
    pub version: String,
    /// Uptime in seconds
    pub uptime_seconds: u64,
    /// Live records in the backend
    pub records_count: u64,
    /// Entries held in the lookup cache
    pub cache_entries: usize,
}
