//! Observation Routes
//!
//! - GET /api/v1/observations/:obs_id - Lookup by observation id alone

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::stac::CatalogItem;

/// GET /api/v1/observations/:obs_id
///
/// The target is derived from the id, so clients that only kept an
/// observation id (e.g. from a shared link) can still resolve it.
pub async fn find_observation(
    State(state): State<Arc<AppState>>,
    Path(observation_id): Path<String>,
) -> ApiResult<Json<CatalogItem>> {
    let dataset = state.dataset.read().await;
    let item = dataset.index.find_observation(&observation_id)?;
    Ok(Json(item.clone()))
}
