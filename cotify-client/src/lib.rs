//! # Cotify Client
//!
//! Typed SDK for the Cotify HTTP API.
//!
//! ## Example
//!
//! ```rust,ignore
//! use cotify_client::{CotifyClient, StoreItemRequest};
//!
//! let client = CotifyClient::new("http://localhost:3000")?;
//!
//! let stored = client
//!     .store(&StoreItemRequest::new("https://x.test/a", "A", "video").with_metadata("HD"))
//!     .await?;
//! println!("item {} (new: {})", stored.item.id, stored.is_new);
//!
//! let item = client.lookup("https://x.test/a").await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod client;
mod types;

pub use client::CotifyClient;
pub use types::{HealthStatus, Item, ItemList, ListItemsQuery, StoreItemRequest, StoreItemResponse};
