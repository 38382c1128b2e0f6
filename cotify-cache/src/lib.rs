//! TTL cache for Cotify records.
//!
//! Generic in-memory cache with per-entry expiration and a background sweep
//! that reclaims entries nobody reads again.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod cache;
mod sweeper;

pub use cache::{CacheConfig, CacheStats, TtlCache};
