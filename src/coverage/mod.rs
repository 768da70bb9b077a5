//! Instrument coverage footprints
//!
//! Coverage files are GeoJSON feature collections of swath polygons, each
//! with a `start_time`/`end_time`. On load they are reduced to those two
//! properties, coordinates are rounded to two decimals and the features are
//! sorted by start so that date filtering is a binary search.

pub mod error;

pub use error::{CoverageError, CoverageResult};

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::range::{TimeWindow, Timestamped};
use crate::stac::{parse_timestamp, Geometry};

/// Decimal places kept in coverage coordinates
pub const COORDINATE_DECIMALS: i32 = 2;

/// Time span of one footprint
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CoverageProperties {
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
}

fn default_feature_type() -> String {
    "Feature".to_string()
}

fn default_collection_type() -> String {
    "FeatureCollection".to_string()
}

/// One coverage footprint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoverageFeature {
    #[serde(rename = "type", default = "default_feature_type")]
    pub kind: String,
    pub properties: CoverageProperties,
    pub geometry: Geometry,
}

impl Timestamped for CoverageFeature {
    fn timestamp_millis(&self) -> Option<i64> {
        self.properties
            .start_time
            .as_deref()
            .and_then(parse_timestamp)
            .map(|t| t.timestamp_millis())
    }
}

/// Coverage file as published; `crs` and other members are ignored
#[derive(Debug, Clone, Deserialize)]
struct RawCoverage {
    #[serde(default)]
    name: Option<String>,
    features: Vec<RawCoverageFeature>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawCoverageFeature {
    #[serde(default)]
    properties: CoverageProperties,
    geometry: Geometry,
}

/// Normalized coverage, sorted ascending by start time
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CoverageCollection {
    #[serde(rename = "type")]
    pub kind: String,
    pub features: Vec<CoverageFeature>,
}

impl CoverageCollection {
    /// Normalize footprints: keep the time span, round, sort
    pub fn from_features(features: impl IntoIterator<Item = (CoverageProperties, Geometry)>) -> Self {
        let mut features: Vec<CoverageFeature> = features
            .into_iter()
            .map(|(properties, mut geometry)| {
                geometry.round_coordinates(COORDINATE_DECIMALS);
                CoverageFeature {
                    kind: default_feature_type(),
                    properties,
                    geometry,
                }
            })
            .collect();
        features.sort_by_key(|f| f.timestamp_millis().unwrap_or(0));

        Self {
            kind: default_collection_type(),
            features,
        }
    }

    pub fn from_json(json: &str) -> CoverageResult<Self> {
        let raw: RawCoverage =
            serde_json::from_str(json).map_err(|e| CoverageError::Parse(e.to_string()))?;
        if let Some(name) = &raw.name {
            tracing::debug!(name = %name, features = raw.features.len(), "Parsed coverage");
        }
        Ok(Self::from_features(
            raw.features.into_iter().map(|f| (f.properties, f.geometry)),
        ))
    }

    pub fn load(path: &Path) -> CoverageResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| CoverageError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Footprints starting inside `window`
    pub fn in_window(&self, window: &TimeWindow) -> &[CoverageFeature] {
        window.apply(&self.features)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl Default for CoverageCollection {
    fn default() -> Self {
        Self::from_features(std::iter::empty())
    }
}
