//! Request and response types for the Cotify HTTP API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored item as returned by the server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Server-assigned identifier
    pub id: u64,
    /// Unique URL
    pub url: String,
    /// Title
    pub title: String,
    /// Item type, e.g. "video"
    #[serde(rename = "type")]
    pub kind: String,
    /// Opaque metadata
    #[serde(default)]
    pub metadata: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last write time
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /api/items`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
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

impl StoreItemRequest {
    /// Creates a request with empty metadata.
    pub fn new(url: impl Into<String>, title: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            kind: kind.into(),
            metadata: String::new(),
        }
    }

    /// Sets the metadata.
    pub fn with_metadata(mut self, metadata: impl Into<String>) -> Self {
        self.metadata = metadata.into();
        self
    }
}

/// Response of `POST /api/items`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreItemResponse {
    /// The stored item
    pub item: Item,
    /// True if this request created the item
    pub is_new: bool,
}

/// Query of `GET /api/items`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItemsQuery {
    /// Exact item type
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Inclusive lower bound on creation time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on creation time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<DateTime<Utc>>,
    /// Items to skip
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
    /// Maximum items to return
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl ListItemsQuery {
    /// Restricts to one item type.
    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Sets the inclusive creation-time window. Either end may be open.
    pub fn between(mut self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    /// Sets pagination.
    pub fn page(mut self, offset: usize, limit: usize) -> Self {
        self.offset = Some(offset);
        self.limit = Some(limit);
        self
    }
}

/// Response of `GET /api/items`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemList {
    /// Items on this page
    pub items: Vec<Item>,
    /// Total matching items before pagination
    pub total: usize,
}

/// Response of `GET /health`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// "ok" when the backend answered
    pub status: String,
    /// Server version
    pub version: String,
    /// Seconds since the server started
    pub uptime_seconds: u64,
    /// Live records in the backend
    pub records_count: u64,
    /// Entries currently held in the lookup cache
    pub cache_entries: usize,
}

/// Error body: `{"error": {"code", "message"}}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorDetail {
    pub code: String,
    pub message: String,
}
