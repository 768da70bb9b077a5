//! Plume Routes
//!
//! - GET /api/v1/plumes?start=&end= - Joined plumes, optionally windowed
//! - GET /api/v1/plumes/:id - One plume by item id

use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{PlumeListResponse, WindowQuery};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::plumes::Plume;

/// GET /api/v1/plumes
///
/// Without bounds every plume is returned, undated ones last. A window
/// only ever matches dated plumes.
pub async fn list_plumes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WindowQuery>,
) -> ApiResult<Json<PlumeListResponse>> {
    let window = query.window()?;

    let dataset = state.dataset.read().await;
    let plumes = match &window {
        Some(window) => dataset.plumes.in_window(window).to_vec(),
        None => dataset.plumes.all().to_vec(),
    };

    Ok(Json(PlumeListResponse {
        window,
        total: plumes.len(),
        plumes,
    }))
}

/// GET /api/v1/plumes/:id
pub async fn get_plume(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Plume>> {
    let dataset = state.dataset.read().await;
    dataset
        .plumes
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("plume {}", id)))
}
