//! Record listing filters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Record;

/// Conjunctive filter for record listings.
///
/// Every set field must match; unset fields match everything. Time bounds
/// apply to `created_at` and are inclusive on both ends.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListFilter {
    /// Exact match on record kind
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Inclusive lower bound on creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<DateTime<Utc>>,
}

impl ListFilter {
    /// Creates a filter that matches every live record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to one kind. An empty kind leaves the filter unset.
    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        let kind = kind.into();
        self.kind = if kind.is_empty() { None } else { Some(kind) };
        self
    }

    /// Sets the inclusive lower bound on creation time.
    pub fn from_time(mut self, from: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self
    }

    /// Sets the inclusive upper bound on creation time.
    pub fn to_time(mut self, to: DateTime<Utc>) -> Self {
        self.to = Some(to);
        self
    }

    /// Returns true if the record is live and satisfies every set field.
    pub fn matches(&self, record: &Record) -> bool {
        if record.is_deleted() {
            return false;
        }
        if let Some(kind) = &self.kind {
            if &record.kind != kind {
                return false;
            }
        }
        if let Some(from) = self.from {
            if record.created_at < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if record.created_at > to {
                return false;
            }
        }
        true
    }
}
