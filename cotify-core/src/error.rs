//! Error types for Cotify.
//!
//! This module provides the error hierarchy using `thiserror`. Backends,
//! the cache-aside coordinator, and the HTTP layer all speak this type.

use thiserror::Error;

/// Result type alias using `CotifyError`.
pub type Result<T> = std::result::Result<T, CotifyError>;

/// Main error type for all Cotify operations.
#[derive(Debug, Error)]
pub enum CotifyError {
    // ═══════════════════════════════════════════════════════════════════════════
    // STORE ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// No live record exists for the key.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A record with this key already exists (lost a create race).
    #[error("Record already exists for key: {0}")]
    UniqueConflict(String),

    /// The persistent backend could not be reached or failed the query.
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// File or socket I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    // ═══════════════════════════════════════════════════════════════════════════
    // VALIDATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Empty, oversized, or malformed input rejected before any backend call.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // SERIALIZATION & NETWORK ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// HTTP request failed or returned an unexpected status.
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // INTERNAL ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Internal invariant violation (should never happen).
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl CotifyError {
    /// Returns true if this error is transient and the caller may retry.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CotifyError::BackendUnavailable(_) | CotifyError::IoError(_) | CotifyError::HttpError(_)
        )
    }

    /// Returns true if this is a duplicate-key conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, CotifyError::UniqueConflict(_))
    }

    /// Returns true if this is a validation error.
    pub fn is_validation_error(&self) -> bool {
        matches!(self, CotifyError::InvalidInput(_) | CotifyError::ConfigError(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CotifyError::UniqueConflict("https://x.test/a".into());
        assert!(err.to_string().contains("https://x.test/a"));

        let err = CotifyError::InvalidInput("key is empty".into());
        assert_eq!(err.to_string(), "Invalid input: key is empty");
    }

    #[test]
    fn test_error_classification() {
        assert!(CotifyError::BackendUnavailable("down".into()).is_recoverable());
        assert!(CotifyError::HttpError("timeout".into()).is_recoverable());
        assert!(!CotifyError::InvalidInput("bad".into()).is_recoverable());

        assert!(CotifyError::UniqueConflict("k".into()).is_conflict());
        assert!(!CotifyError::NotFound("k".into()).is_conflict());

        assert!(CotifyError::InvalidInput("k".into()).is_validation_error());
        assert!(!CotifyError::BackendUnavailable("k".into()).is_validation_error());
    }

    #[test]
    fn test_json_error_conversion() {
        let json_result: std::result::Result<serde_json::Value, _> = serde_json::from_str("invalid");
        let result: Result<serde_json::Value> = json_result.map_err(CotifyError::from);
        assert!(matches!(result, Err(CotifyError::JsonError(_))));
    }
}
