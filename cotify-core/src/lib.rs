//! # Cotify Core
//!
//! Core types, errors, and traits for the Cotify record store.
//!
//! This crate provides the foundational building blocks used by all other Cotify crates:
//!
//! - **Types**: Records, drafts, list filters, and store outcomes
//! - **Errors**: The error taxonomy shared by backends, the coordinator, and the API
//! - **Constants**: Field limits and cache defaults
//! - **Traits**: The persistent record backend interface
//!
//! ## Example
//!
//! ```rust
//! use cotify_core::{RecordDraft, CotifyError};
//!
//! let draft = RecordDraft::new("https://x.test/a", "A", "video", "HD");
//! assert!(draft.validate().is_ok());
//!
//! let empty = RecordDraft::new("", "A", "video", "HD");
//! assert!(matches!(empty.validate(), Err(CotifyError::InvalidInput(_))));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::{CotifyError, Result};
pub use traits::*;
pub use types::*;
