//! Coverage Routes
//!
//! - GET /api/v1/coverage?start=&end= - Coverage footprints starting in the window

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{CoverageResponse, WindowQuery};
use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::range::TimeWindow;

/// GET /api/v1/coverage
pub async fn list_coverage(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WindowQuery>,
) -> ApiResult<Json<CoverageResponse>> {
    let window = query.window()?.unwrap_or_else(TimeWindow::unbounded);

    let dataset = state.dataset.read().await;
    let features = dataset.coverage.in_window(&window).to_vec();

    Ok(Json(features.into()))
}
