//! API route configuration.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::state::AppState;

/// Creates the API router with all routes configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))

        // Items
        .route("/api/items", post(handlers::store_item))
        .route("/api/items", get(handlers::list_items))
        .route("/api/items/lookup", get(handlers::lookup_item))

        .with_state(state)
}
