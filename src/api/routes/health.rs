//! Health Routes
//!
//! - GET /health/live - Liveness probe (process is alive)
//! - GET /health - Index status

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::HealthResponse;
use crate::api::state::AppState;

/// GET /health/live
///
/// Returns 200 if the process is alive, no dependency checks.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health
///
/// Index counts. An empty index reports `empty` and still answers 200.
pub async fn full_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let dataset = state.dataset.read().await;
    let stats = dataset.index.stats();

    let status = if stats.targets > 0 { "healthy" } else { "empty" };

    Json(HealthResponse {
        status: status.to_string(),
        targets: stats.targets,
        target_types: stats.target_types,
        observations: stats.observations,
        coverage_features: dataset.coverage.len(),
        plumes: dataset.plumes.len(),
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
