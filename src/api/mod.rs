//! stacdash REST API
//!
//! Read-only HTTP surface over the target index, built with Axum.
//!
//! # Endpoints
//!
//! ## Targets
//! - `GET /api/v1/targets` - Representative observation per target
//! - `GET /api/v1/target-types` - Target type names
//! - `GET /api/v1/target-types/:type/targets` - Representatives of one type
//! - `GET /api/v1/targets/:id` - Target summary
//! - `GET /api/v1/targets/:id/observations?start=&end=` - Sorted timeline
//! - `GET /api/v1/targets/:id/observations/:obs_id` - One observation
//!
//! ## Observations
//! - `GET /api/v1/observations/:obs_id` - Lookup by observation id alone
//!
//! ## Coverage
//! - `GET /api/v1/coverage?start=&end=` - Coverage footprints in a window
//!
//! ## Plumes
//! - `GET /api/v1/plumes?start=&end=` - Plumes joined with their metadata
//! - `GET /api/v1/plumes/:id` - One plume
//!
//! ## Admin
//! - `POST /api/v1/reload` - Reload the snapshot and rebuild the index
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health` - Index status
//!
//! # Example
//!
//! ```rust,ignore
//! use stacdash::api::{serve, AppState};
//! use stacdash::config::Config;
//! use stacdash::dataset::Dataset;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load_default();
//!     let dataset = Dataset::load(&config.index)?;
//!
//!     let state = AppState::new(dataset, config.index.clone(), config.api.clone());
//!     serve(state, &config.api).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ApiConfig;

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Target routes
        .route("/targets", get(routes::targets::list_targets))
        .route("/targets/:id", get(routes::targets::get_target))
        .route("/targets/:id/observations", get(routes::targets::list_observations))
        .route(
            "/targets/:id/observations/:obs_id",
            get(routes::targets::get_observation),
        )
        .route("/target-types", get(routes::targets::list_target_types))
        .route("/target-types/:type/targets", get(routes::targets::targets_of_type))
        // Observation routes
        .route("/observations/:obs_id", get(routes::observations::find_observation))
        // Coverage routes
        .route("/coverage", get(routes::coverage::list_coverage))
        // Plume routes
        .route("/plumes", get(routes::plumes::list_plumes))
        .route("/plumes/:id", get(routes::plumes::get_plume))
        // Admin routes
        .route("/reload", post(routes::reload::reload));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/", get(routes::health::full_health));

    let cors = cors_layer(&state.config);
    let timeout = TimeoutLayer::new(Duration::from_secs(state.config.request_timeout_secs));

    // Create shared state
    let shared_state = Arc::new(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .layer(timeout)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(shared_state)
}

/// CORS for the configured origins; permissive when none are configured
fn cors_layer(config: &ApiConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
    }
}

/// Start the API server
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("stacdash API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("stacdash API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexConfig;
    use crate::dataset::{metadata_catalog, Dataset};
    use crate::index::MalformedPolicy;
    use crate::plumes::{PlumeCollection, PlumeMetadata};
    use crate::snapshot::CollectionSnapshot;
    use crate::stac::{CatalogItem, ItemProperties};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tempfile::tempdir;
    use tower::util::ServiceExt;

    fn sam(target: &str, kind: &str, day: u32) -> CatalogItem {
        let start = format!("2024-01-{:02}T00:00:00Z", day);
        let props = ItemProperties::with_interval(start.clone(), start)
            .set("target_id", json!(target))
            .set("target_name", json!(target.to_uppercase()))
            .set("target_type", json!(kind))
            .set("target_location", json!({"type": "Point", "coordinates": [14.99, 37.75]}));
        CatalogItem::new(
            format!("oco3-co2_{}_2024-01-{:02}T000000Z_unfiltered_xco2", target, day),
            props,
        )
    }

    fn sams() -> Vec<CatalogItem> {
        vec![
            sam("volcano0010", "volcano", 9),
            sam("volcano0010", "volcano", 1),
            sam("volcano0010", "volcano", 5),
            sam("fossil_la", "city", 3),
        ]
    }

    fn dataset(items: Vec<CatalogItem>) -> Dataset {
        let catalog = metadata_catalog(None, true, &items).unwrap();
        Dataset::from_items(items, catalog, MalformedPolicy::Skip).unwrap()
    }

    fn create_test_app() -> Router {
        let state = AppState::new(dataset(sams()), IndexConfig::default(), ApiConfig::default());
        build_router(state)
    }

    async fn get(app: Router, uri: &str) -> Response {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_live() {
        let response = get(create_test_app(), "/health/live").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_full() {
        let response = get(create_test_app(), "/health").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["targets"], 2);
        assert_eq!(body["observations"], 4);
        assert_eq!(body["plumes"], 0);
    }

    #[tokio::test]
    async fn test_list_targets_returns_representatives() {
        let response = get(create_test_app(), "/api/v1/targets").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["total"], 2);
        let ids: Vec<&str> = body["observations"]
            .as_array()
            .unwrap()
            .iter()
            .map(|o| o["id"].as_str().unwrap())
            .collect();
        assert!(ids.contains(&"oco3-co2_volcano0010_2024-01-01T000000Z_unfiltered_xco2"));
        assert!(ids.contains(&"oco3-co2_fossil_la_2024-01-03T000000Z_unfiltered_xco2"));
    }

    #[tokio::test]
    async fn test_target_types() {
        let body = json_body(get(create_test_app(), "/api/v1/target-types").await).await;
        assert_eq!(body["target_types"], json!(["city", "volcano"]));

        let response = get(create_test_app(), "/api/v1/target-types/volcano/targets").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["total"], 1);

        let response = get(create_test_app(), "/api/v1/target-types/glacier/targets").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_get_target() {
        let response = get(create_test_app(), "/api/v1/targets/volcano0010").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["display_name"], "VOLCANO0010");
        assert_eq!(body["observation_count"], 3);
        assert_eq!(body["location"], json!([14.99, 37.75]));

        let response = get(create_test_app(), "/api/v1/targets/nowhere").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "TARGET_NOT_FOUND");
        assert!(body["request_id"].is_string());
    }

    #[tokio::test]
    async fn test_timeline_sorted_and_windowed() {
        let body = json_body(get(create_test_app(), "/api/v1/targets/volcano0010/observations").await).await;
        let starts: Vec<&str> = body["observations"]
            .as_array()
            .unwrap()
            .iter()
            .map(|o| o["properties"]["start_datetime"].as_str().unwrap())
            .collect();
        assert_eq!(
            starts,
            vec!["2024-01-01T00:00:00Z", "2024-01-05T00:00:00Z", "2024-01-09T00:00:00Z"]
        );

        let body = json_body(
            get(
                create_test_app(),
                "/api/v1/targets/volcano0010/observations?start=2024-01-02&end=2024-01-08",
            )
            .await,
        )
        .await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["observations"][0]["properties"]["start_datetime"], "2024-01-05T00:00:00Z");

        let response = get(
            create_test_app(),
            "/api/v1/targets/volcano0010/observations?start=tomorrow",
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_window_excludes_undated_observations() {
        let undated = CatalogItem::new(
            "oco3-co2_volcano0010_undated_unfiltered_xco2",
            ItemProperties::default()
                .set("target_id", json!("volcano0010"))
                .set("target_name", json!("VOLCANO0010"))
                .set("target_type", json!("volcano")),
        );
        let mut items = sams();
        items.push(undated);
        let app = build_router(AppState::new(dataset(items), IndexConfig::default(), ApiConfig::default()));

        let body = json_body(get(app.clone(), "/api/v1/targets/volcano0010/observations").await).await;
        assert_eq!(body["total"], 4);
        assert_eq!(
            body["observations"][3]["id"],
            "oco3-co2_volcano0010_undated_unfiltered_xco2"
        );

        let body = json_body(
            get(
                app,
                "/api/v1/targets/volcano0010/observations?start=2024-01-03&end=2024-01-10",
            )
            .await,
        )
        .await;
        let ids: Vec<&str> = body["observations"]
            .as_array()
            .unwrap()
            .iter()
            .map(|o| o["id"].as_str().unwrap())
            .collect();
        assert_eq!(
            ids,
            vec![
                "oco3-co2_volcano0010_2024-01-05T000000Z_unfiltered_xco2",
                "oco3-co2_volcano0010_2024-01-09T000000Z_unfiltered_xco2",
            ]
        );
    }

    #[tokio::test]
    async fn test_observation_lookups() {
        let id = "oco3-co2_fossil_la_2024-01-03T000000Z_unfiltered_xco2";

        let response = get(
            create_test_app(),
            &format!("/api/v1/targets/fossil_la/observations/{}", id),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["id"], id);

        let response = get(create_test_app(), &format!("/api/v1/observations/{}", id)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = get(
            create_test_app(),
            "/api/v1/targets/fossil_la/observations/oco3-co2_fossil_la_1999-01-01T000000Z_u_x",
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["error"]["code"], "OBSERVATION_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_coverage_empty_by_default() {
        let response = get(create_test_app(), "/api/v1/coverage?start=2024-01-01").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["type"], "FeatureCollection");
        assert_eq!(body["total"], 0);
    }

    #[tokio::test]
    async fn test_plumes_listed_and_windowed() {
        let metadata = PlumeMetadata::from_json(
            &json!({
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "geometry": {"type": "Point", "coordinates": [61.85, 39.43]},
                    "properties": {
                        "Data Download": "https://data.test/emit/plume_aug.tif",
                        "Plume ID": "CH4_PlumeComplex-109",
                        "Orbit": "2321704"
                    }
                }]
            })
            .to_string(),
        )
        .unwrap();
        let plume = |id: &str, day: &str| {
            CatalogItem::new(id, ItemProperties::with_interval(day, day))
        };
        let mut data = dataset(sams());
        data.plumes = PlumeCollection::join(
            vec![
                plume("plume_aug", "2023-08-05T06:08:18Z"),
                plume("plume_jul", "2023-07-26T07:01:05Z"),
            ],
            &metadata,
        );
        let app = build_router(AppState::new(data, IndexConfig::default(), ApiConfig::default()));

        let body = json_body(get(app.clone(), "/api/v1/plumes").await).await;
        assert_eq!(body["total"], 2);
        assert_eq!(body["plumes"][0]["id"], "plume_jul");
        assert!(body.get("window").is_none());

        let body = json_body(get(app.clone(), "/api/v1/plumes?start=2023-08-01").await).await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["plumes"][0]["plumeProperties"]["orbit"], 2321704);
        assert_eq!(body["plumes"][0]["lat"], 39.43);

        let response = get(app.clone(), "/api/v1/plumes/plume_aug").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["plumeProperties"]["plumeId"], "CH4_PlumeComplex-109");
        assert_eq!(body["pointGeometry"]["type"], "Point");

        let response = get(app.clone(), "/api/v1/plumes/unknown").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = get(app, "/api/v1/plumes?end=yesterday").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_reload_swaps_index() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        let snapshot = CollectionSnapshot::new(vec![], vec![sam("glacier7", "glacier", 2)]);
        std::fs::write(&path, serde_json::to_string(&snapshot).unwrap()).unwrap();

        let sources = IndexConfig {
            snapshot_path: path.to_string_lossy().to_string(),
            ..Default::default()
        };
        let state = AppState::new(dataset(sams()), sources, ApiConfig::default());
        let app = build_router(state.clone());

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/reload")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["targets"], 1);
        assert_eq!(body["report"]["indexed"], 1);

        let body = json_body(get(app, "/api/v1/target-types").await).await;
        assert_eq!(body["target_types"], json!(["glacier"]));
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_serving() {
        let sources = IndexConfig {
            snapshot_path: "/nonexistent/stacdash.json".to_string(),
            ..Default::default()
        };
        let state = AppState::new(dataset(sams()), sources, ApiConfig::default());
        let app = build_router(state);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/reload")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = json_body(get(app, "/health").await).await;
        assert_eq!(body["targets"], 2);
    }
}
