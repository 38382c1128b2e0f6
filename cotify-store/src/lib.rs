//! # Cotify Store
//!
//! Persistent record storage for Cotify.
//!
//! This crate provides the backends behind [`RecordStore`]:
//!
//! - **Memory**: Fast in-memory storage for development and testing
//! - **Turso**: libSQL storage, remote or local (feature `turso`)
//!
//! Both enforce key uniqueness themselves and report a lost create race as
//! [`CotifyError::UniqueConflict`](cotify_core::CotifyError::UniqueConflict).
//!
//! ## Example
//!
//! ```rust,ignore
//! use cotify_core::types::RecordDraft;
//! use cotify_store::{MemoryStore, RecordStore};
//!
//! let store = MemoryStore::new();
//! let record = store
//!     .insert(RecordDraft::new("https://x.test/a", "A", "video", "HD"))
//!     .await?;
//!
//! assert_eq!(store.find_by_key("https://x.test/a").await?, Some(record));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod memory;
#[cfg(feature = "turso")]
mod turso;

pub use memory::MemoryStore;
#[cfg(feature = "turso")]
pub use turso::TursoStore;

// Re-export the trait from core
pub use cotify_core::traits::RecordStore;
