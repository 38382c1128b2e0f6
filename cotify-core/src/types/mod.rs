//! Domain types for Cotify.
//!
//! - [`Record`]: A persisted URL-tagged record
//! - [`RecordDraft`]: Caller-supplied fields of a record before it is persisted
//! - [`ListFilter`]: Conjunctive filter for record listings
//! - [`StoreOutcome`]: Result of an idempotent store-or-create

mod filter;
mod record;

pub use filter::*;
pub use record::*;
