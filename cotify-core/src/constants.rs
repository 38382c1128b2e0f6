//! Field limits and cache defaults for Cotify.
//!
//! Field limits mirror the column sizes of the `records` table so that
//! oversized input is rejected before it reaches a backend.

// ═══════════════════════════════════════════════════════════════════════════════
// RECORD FIELD LIMITS
// ═══════════════════════════════════════════════════════════════════════════════

/// Maximum length of a record key (the URL) in characters.
pub const MAX_KEY_LEN: usize = 2048;

/// Maximum length of a record title in characters.
pub const MAX_TITLE_LEN: usize = 2048;

/// Maximum length of a record kind (e.g. "video") in characters.
pub const MAX_KIND_LEN: usize = 50;

// ═══════════════════════════════════════════════════════════════════════════════
// CACHE DEFAULTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Default time-to-live for cached records (24 hours).
pub const DEFAULT_RECORD_TTL_SECS: u64 = 24 * 60 * 60;

/// Default interval between background sweeps of expired entries (1 hour).
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60 * 60;

// ═══════════════════════════════════════════════════════════════════════════════
// LISTING
// ═══════════════════════════════════════════════════════════════════════════════

/// Default page size for record listings.
pub const DEFAULT_LIST_LIMIT: usize = 100;

/// Maximum page size for record listings.
pub const MAX_LIST_LIMIT: usize = 1000;
