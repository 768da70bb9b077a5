//! Reload Route
//!
//! - POST /api/v1/reload - Re-read the snapshot and rebuild the index

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::dto::ReloadResponse;
use crate::api::error::ApiResult;
use crate::api::state::AppState;

/// POST /api/v1/reload
///
/// Call after the snapshot job has replaced the artifact.
pub async fn reload(State(state): State<Arc<AppState>>) -> ApiResult<Json<ReloadResponse>> {
    let report = state.reload().await?;
    let targets = state.dataset.read().await.index.len();

    Ok(Json(ReloadResponse {
        status: "ok".to_string(),
        source: state.sources.snapshot_path.clone(),
        targets,
        report,
    }))
}
