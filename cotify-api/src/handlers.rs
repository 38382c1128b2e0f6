//! API route handlers.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use tracing::{debug, info, warn};

use crate::dto::*;
use crate::error::ApiError;
use crate::state::AppState;

type Result<T> = std::result::Result<T, ApiError>;

/// POST /api/items
pub async fn store_item(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<StoreItemRequest>, JsonRejection>,
) -> Result<Json<StoreItemResponse>> {
    let Json(req) = payload?;

    let outcome = state
        .service
        .store_or_create(req.url, req.title, req.kind, req.metadata)
        .await?;

    if outcome.is_new {
        info!(id = outcome.record.id, url = %outcome.record.key, "Stored new item");
    } else {
        debug!(id = outcome.record.id, "Item already stored");
    }

    Ok(Json(StoreItemResponse {
        is_new: outcome.is_new,
        item: ItemDto::from(outcome.record),
    }))
}

/// GET /api/items
pub async fn list_items(
    State(state): State<Arc<AppState>>,
    params: std::result::Result<Query<ListItemsQuery>, QueryRejection>,
) -> Result<Json<ListItemsResponse>> {
    let Query(params) = params?;

    let records = state.service.list_filtered(&params.filter()).await?;
    let total = records.len();

    let offset = params.offset.unwrap_or(0);
    let items: Vec<ItemDto> = records
        .into_iter()
        .skip(offset)
        .take(params.limit())
        .map(ItemDto::from)
        .collect();

    Ok(Json(ListItemsResponse { items, total }))
}

/// GET /api/items/lookup?url=...
pub async fn lookup_item(
    State(state): State<Arc<AppState>>,
    params: std::result::Result<Query<LookupQuery>, QueryRejection>,
) -> Result<Json<ItemDto>> {
    let Query(params) = params?;

    match state.service.fetch(&params.url).await? {
        Some(record) => Ok(Json(ItemDto::from(record))),
        None => Err(ApiError::not_found(format!("No item for url: {}", params.url))),
    }
}

/// GET /health
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let (status, records_count) = match state.service.store().count().await {
        Ok(count) => ("ok", count),
        Err(e) => {
            warn!(error = %e, "Health check could not reach backend");
            ("degraded", 0)
        }
    };

    let cache_entries = state
        .service
        .cache_stats()
        .map(|stats| stats.total_entries)
        .unwrap_or(0);

    Json(HealthResponse {
        status: status.into(),
        version: env!("CARGO_PKG_VERSION").into(),
        uptime_seconds: state.uptime().as_secs(),
        records_count,
        cache_entries,
    })
}
