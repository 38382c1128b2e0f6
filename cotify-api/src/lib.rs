//! # Cotify API Server
//!
//! REST API over the deduplicating record service.
//!
//! ## Endpoints
//!
//! - `POST /api/items` - Store an item, or return the existing one for its URL
//! - `GET /api/items` - List items, filtered by type and creation time
//! - `GET /api/items/lookup?url=` - Look up one item by URL
//! - `GET /health` - Liveness plus record and cache counts
//!
//! ## Example
//!
//! ```rust,ignore
//! use cotify_api::{ApiConfig, ApiServer};
//!
//! let server = ApiServer::connect(ApiConfig::from_env()).await?;
//! server.run(([0, 0, 0, 0], 3000)).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod dto;
mod error;
mod handlers;
mod routes;
mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::{ApiConfig, AppState};

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use cotify_core::error::Result;

/// API server for Cotify.
pub struct ApiServer {
    state: Arc<AppState>,
}

impl ApiServer {
    /// Creates a server around prepared state.
    pub fn new(state: AppState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    /// Opens the configured backend and creates a server around it.
    pub async fn connect(config: ApiConfig) -> Result<Self> {
        Ok(Self::new(AppState::connect(config).await?))
    }

    /// Creates the router with all routes configured.
    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        create_router(self.state.clone())
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    }

    /// Runs the server on the given address until Ctrl-C, then stops the
    /// cache sweep.
    pub async fn run(self, addr: impl Into<SocketAddr>) -> std::io::Result<()> {
        let addr = addr.into();
        let listener = tokio::net::TcpListener::bind(addr).await?;

        info!("Cotify API server listening on {}", addr);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        self.state.service.shutdown();
        info!("Cotify API server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
