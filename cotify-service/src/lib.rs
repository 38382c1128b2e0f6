//! # Cotify Service
//!
//! Cache-aside coordinator for URL-tagged records.
//!
//! [`RecordService`] sits in front of any [`RecordStore`](cotify_core::traits::RecordStore)
//! and deduplicates creates: however many callers race to store the same
//! URL, exactly one of them creates the record and all of them get it back.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use cotify_service::RecordService;
//! use cotify_store::MemoryStore;
//!
//! let service = RecordService::new(Arc::new(MemoryStore::new()));
//!
//! let first = service.store_or_create("https://x.test/a", "A", "video", "HD").await?;
//! let again = service.store_or_create("https://x.test/a", "A", "video", "HD").await?;
//!
//! assert!(first.is_new);
//! assert!(!again.is_new);
//! assert_eq!(first.record, again.record);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod service;

pub use service::{RecordService, ServiceConfig};
