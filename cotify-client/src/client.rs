//! HTTP client implementation.

use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use cotify_core::error::{CotifyError, Result};

use crate::types::{
    ErrorBody, HealthStatus, Item, ItemList, ListItemsQuery, StoreItemRequest, StoreItemResponse,
};

/// Default timeout for requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Cotify API client.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone, Debug)]
pub struct CotifyClient {
    http: reqwest::Client,
    /// Validated base URL without trailing slash
    base_url: String,
}

impl CotifyClient {
    /// Creates a client with the default 30 second timeout.
    ///
    /// Trailing slashes on `base_url` are ignored.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Creates a client with a custom request timeout.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/');
        let parsed = Url::parse(base_url)
            .map_err(|e| CotifyError::ConfigError(format!("invalid base URL {base_url:?}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(CotifyError::ConfigError(format!(
                "base URL must be http or https: {base_url}"
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(format!("cotify-client/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CotifyError::ConfigError(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.to_string(),
        })
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Stores an item, or returns the existing one for its URL.
    #[instrument(skip(self, request), fields(url = %request.url))]
    pub async fn store(&self, request: &StoreItemRequest) -> Result<StoreItemResponse> {
        let response = self
            .http
            .post(self.endpoint("/api/items"))
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        let stored: StoreItemResponse = handle_response(response).await?;
        debug!(id = stored.item.id, is_new = stored.is_new, "Stored item");
        Ok(stored)
    }

    /// Looks up an item by URL. A 404 is `Ok(None)`.
    #[instrument(skip(self))]
    pub async fn lookup(&self, url: &str) -> Result<Option<Item>> {
        let response = self
            .http
            .get(self.endpoint("/api/items/lookup"))
            .query(&[("url", url)])
            .send()
            .await
            .map_err(transport_error)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        handle_response(response).await.map(Some)
    }

    /// Lists items matching the query.
    #[instrument(skip(self))]
    pub async fn list(&self, query: &ListItemsQuery) -> Result<ItemList> {
        let response = self
            .http
            .get(self.endpoint("/api/items"))
            .query(query)
            .send()
            .await
            .map_err(transport_error)?;

        handle_response(response).await
    }

    /// Fetches server health.
    pub async fn health(&self) -> Result<HealthStatus> {
        let response = self
            .http
            .get(self.endpoint("/health"))
            .send()
            .await
            .map_err(transport_error)?;

        handle_response(response).await
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn transport_error(e: reqwest::Error) -> CotifyError {
    CotifyError::HttpError(e.to_string())
}

/// Decodes a 2xx body, or turns the server's error body into `HttpError`.
async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return response.json().await.map_err(transport_error);
    }

    let text = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => format!("{} {}: {}", status.as_u16(), body.error.code, body.error.message),
        Err(_) => format!("unexpected status {}: {}", status.as_u16(), text),
    };
    Err(CotifyError::HttpError(message))
}
