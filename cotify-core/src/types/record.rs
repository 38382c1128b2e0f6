//! Record types.
//!
//! A record is created exactly once per distinct key and never mutated
//! afterwards by the store-or-create path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{MAX_KEY_LEN, MAX_KIND_LEN, MAX_TITLE_LEN};
use crate::error::{CotifyError, Result};

/// A persisted URL-tagged record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Identifier assigned by the backend
    pub id: u64,
    /// Natural unique key (the URL)
    pub key: String,
    /// Human-readable title
    pub title: String,
    /// Record kind, e.g. "video" or "audio"
    pub kind: String,
    /// Opaque attribute payload
    pub attributes: String,
    /// When the backend created the record
    pub created_at: DateTime<Utc>,
    /// When the backend last wrote the record
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Record {
    /// Builds a record from a draft with backend-assigned id and timestamp.
    pub fn from_draft(id: u64, draft: RecordDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            key: draft.key,
            title: draft.title,
            kind: draft.kind,
            attributes: draft.attributes,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Returns true if the record carries a soft-delete marker.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Caller-supplied fields of a record, before the backend assigns id and timestamps.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordDraft {
    /// Natural unique key (the URL)
    pub key: String,
    /// Human-readable title
    pub title: String,
    /// Record kind
    pub kind: String,
    /// Opaque attribute payload (may be empty)
    #[serde(default)]
    pub attributes: String,
}

impl RecordDraft {
    /// Creates a new draft.
    pub fn new(
        key: impl Into<String>,
        title: impl Into<String>,
        kind: impl Into<String>,
        attributes: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            kind: kind.into(),
            attributes: attributes.into(),
        }
    }

    /// Validates the draft's fields.
    ///
    /// Key, title, and kind are required and bounded by the column sizes of the
    /// `records` table. Attributes are free-form.
    pub fn validate(&self) -> Result<()> {
        validate_key(&self.key)?;

        if self.title.trim().is_empty() {
            return Err(CotifyError::InvalidInput("title is required".into()));
        }
        let title_len = self.title.chars().count();
        if title_len > MAX_TITLE_LEN {
            return Err(CotifyError::InvalidInput(format!(
                "title too long: {} characters, maximum {}",
                title_len,
                MAX_TITLE_LEN
            )));
        }

        if self.kind.trim().is_empty() {
            return Err(CotifyError::InvalidInput("kind is required".into()));
        }
        let kind_len = self.kind.chars().count();
        if kind_len > MAX_KIND_LEN {
            return Err(CotifyError::InvalidInput(format!(
                "kind too long: {} characters, maximum {}",
                kind_len,
                MAX_KIND_LEN
            )));
        }

        Ok(())
    }
}

/// Validates a record key on its own (used by lookups as well as creates).
pub fn validate_key(key: &str) -> Result<()> {
    if key.trim().is_empty() {
        return Err(CotifyError::InvalidInput("key is required".into()));
    }
    let key_len = key.chars().count();
    if key_len > MAX_KEY_LEN {
        return Err(CotifyError::InvalidInput(format!(
            "key too long: {} characters, maximum {}",
            key_len,
            MAX_KEY_LEN
        )));
    }
    if key.chars().any(char::is_control) {
        return Err(CotifyError::InvalidInput(
            "key contains control characters".into(),
        ));
    }
    Ok(())
}

/// Result of an idempotent store-or-create.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreOutcome {
    /// The stored record (newly created or pre-existing)
    pub record: Record,
    /// True only for the caller whose insert created the record
    pub is_new: bool,
}

impl StoreOutcome {
    /// Outcome for a freshly created record.
    pub fn created(record: Record) -> Self {
        Self { record, is_new: true }
    }

    /// Outcome for a record that already existed.
    pub fn existing(record: Record) -> Self {
        Self { record, is_new: false }
    }
}
