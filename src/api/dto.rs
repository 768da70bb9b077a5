//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.

use serde::{Deserialize, Serialize};

use crate::coverage::CoverageFeature;
use crate::index::{BuildReport, TargetSummary};
use crate::plumes::Plume;
use crate::range::{RangeResult, TimeWindow};
use crate::stac::CatalogItem;

// ============================================
// QUERY PARAMETERS
// ============================================

/// `?start=&end=` bounds, RFC 3339 or `YYYY-MM-DD`
#[derive(Debug, Default, Deserialize)]
pub struct WindowQuery {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl WindowQuery {
    /// Parsed window, `None` when neither bound is given
    pub fn window(&self) -> RangeResult<Option<TimeWindow>> {
        if self.start.is_none() && self.end.is_none() {
            return Ok(None);
        }
        TimeWindow::parse(self.start.as_deref(), self.end.as_deref()).map(Some)
    }
}

// ============================================
// TARGET DTOs
// ============================================

/// List of observations (marker representatives or a timeline)
#[derive(Debug, Serialize)]
pub struct ObservationListResponse {
    pub total: usize,
    pub observations: Vec<CatalogItem>,
}

impl From<Vec<CatalogItem>> for ObservationListResponse {
    fn from(observations: Vec<CatalogItem>) -> Self {
        Self {
            total: observations.len(),
            observations,
        }
    }
}

/// Distinct target types
#[derive(Debug, Serialize)]
pub struct TargetTypesResponse {
    pub total: usize,
    pub target_types: Vec<String>,
}

/// One target
#[derive(Debug, Serialize)]
pub struct TargetResponse {
    #[serde(flatten)]
    pub target: TargetSummary,
}

/// Timeline of one target, optionally windowed
#[derive(Debug, Serialize)]
pub struct TimelineResponse {
    pub target_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<TimeWindow>,
    pub total: usize,
    pub observations: Vec<CatalogItem>,
}

// ============================================
// COVERAGE DTOs
// ============================================

/// Coverage footprints as a GeoJSON feature collection
#[derive(Debug, Serialize)]
pub struct CoverageResponse {
    #[serde(rename = "type")]
    pub kind: String,
    pub total: usize,
    pub features: Vec<CoverageFeature>,
}

impl From<Vec<CoverageFeature>> for CoverageResponse {
    fn from(features: Vec<CoverageFeature>) -> Self {
        Self {
            kind: "FeatureCollection".to_string(),
            total: features.len(),
            features,
        }
    }
}

// ============================================
// PLUME DTOs
// ============================================

/// Joined plumes, optionally windowed
#[derive(Debug, Serialize)]
pub struct PlumeListResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<TimeWindow>,
    pub total: usize,
    pub plumes: Vec<Plume>,
}

// ============================================
// ADMIN DTOs
// ============================================

/// Result of a reload
#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub status: String,
    pub source: String,
    pub targets: usize,
    pub report: BuildReport,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `healthy`, or `empty` when no target is indexed
    pub status: String,
    pub targets: usize,
    pub target_types: usize,
    pub observations: usize,
    pub coverage_features: usize,
    pub plumes: usize,
    pub uptime_seconds: u64,
    pub version: String,
}
