//! Target Routes
//!
//! - GET /api/v1/targets - Representative observation per target
//! - GET /api/v1/target-types - Distinct target types
//! - GET /api/v1/target-types/:type/targets - Representatives of one type
//! - GET /api/v1/targets/:id - Target summary
//! - GET /api/v1/targets/:id/observations - Sorted timeline, optionally windowed
//! - GET /api/v1/targets/:id/observations/:obs_id - One observation

use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{
    ObservationListResponse, TargetResponse, TargetTypesResponse, TimelineResponse, WindowQuery,
};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;

/// GET /api/v1/targets
pub async fn list_targets(State(state): State<Arc<AppState>>) -> Json<ObservationListResponse> {
    let dataset = state.dataset.read().await;
    let representatives = dataset.index.representatives().into_iter().cloned().collect::<Vec<_>>();
    Json(representatives.into())
}

/// GET /api/v1/target-types
pub async fn list_target_types(State(state): State<Arc<AppState>>) -> Json<TargetTypesResponse> {
    let dataset = state.dataset.read().await;
    let target_types: Vec<String> = dataset
        .index
        .target_types()
        .into_iter()
        .map(str::to_string)
        .collect();

    Json(TargetTypesResponse {
        total: target_types.len(),
        target_types,
    })
}

/// GET /api/v1/target-types/:type/targets
pub async fn targets_of_type(
    State(state): State<Arc<AppState>>,
    Path(target_type): Path<String>,
) -> ApiResult<Json<ObservationListResponse>> {
    let dataset = state.dataset.read().await;
    if dataset.index.group(&target_type).is_none() {
        return Err(ApiError::NotFound(format!("Target type '{}'", target_type)));
    }

    let representatives = dataset
        .index
        .representatives_of_type(&target_type)
        .into_iter()
        .cloned()
        .collect::<Vec<_>>();
    Ok(Json(representatives.into()))
}

/// GET /api/v1/targets/:id
pub async fn get_target(
    State(state): State<Arc<AppState>>,
    Path(target_id): Path<String>,
) -> ApiResult<Json<TargetResponse>> {
    let dataset = state.dataset.read().await;
    let target = dataset.index.target(&target_id)?;
    Ok(Json(TargetResponse {
        target: target.summary(),
    }))
}

/// GET /api/v1/targets/:id/observations?start=&end=
pub async fn list_observations(
    State(state): State<Arc<AppState>>,
    Path(target_id): Path<String>,
    Query(query): Query<WindowQuery>,
) -> ApiResult<Json<TimelineResponse>> {
    let window = query.window()?;

    let dataset = state.dataset.read().await;
    let target = dataset.index.target(&target_id)?;

    let observations = match &window {
        Some(window) => target.in_window(window),
        None => target.all().into_owned(),
    };

    Ok(Json(TimelineResponse {
        target_id,
        window,
        total: observations.len(),
        observations,
    }))
}

/// GET /api/v1/targets/:id/observations/:obs_id
pub async fn get_observation(
    State(state): State<Arc<AppState>>,
    Path((target_id, observation_id)): Path<(String, String)>,
) -> ApiResult<Json<crate::stac::CatalogItem>> {
    let dataset = state.dataset.read().await;
    let item = dataset.index.get_by_id(&target_id, &observation_id)?;
    Ok(Json(item.clone()))
}
