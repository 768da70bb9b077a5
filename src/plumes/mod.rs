//! Plume enrichment
//!
//! Plume items are joined with a metadata feature collection that carries
//! two features per plume: a `Point` at the concentration maximum and a
//! `Polygon` outline. Both are keyed by the file stem of their
//! `Data Download` URL, which equals the item id:
//!
//! ```text
//! https://.../EMIT_L2B_CH4PLM_001_20230805T060818_000109.tif  →  EMIT_L2B_CH4PLM_001_20230805T060818_000109
//! ```
//!
//! Every item becomes a [`Plume`]; items without metadata keep empty plume
//! properties. Plumes are ordered by start time with undated items last.

pub mod error;

pub use error::{PlumeError, PlumeResult};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

use crate::range::{TimeWindow, Timestamped};
use crate::stac::{CatalogItem, Geometry};

/// Map style attached to a metadata feature
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlumeStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_zoom: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_zoom: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

/// Properties of a metadata feature, under their published names
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct MetadataProperties {
    #[serde(rename = "Data Download", default)]
    pub data_download: Option<String>,
    #[serde(rename = "Plume ID", default)]
    pub plume_id: Option<String>,
    #[serde(rename = "Longitude of max concentration", default)]
    pub longitude_of_max_concentration: Option<f64>,
    #[serde(rename = "Latitude of max concentration", default)]
    pub latitude_of_max_concentration: Option<f64>,
    #[serde(rename = "Concentration Uncertainty (ppm m)", default)]
    pub concentration_uncertainty: Option<f64>,
    #[serde(rename = "Max Plume Concentration (ppm m)", default)]
    pub max_concentration: Option<f64>,
    /// Published as a string or a number
    #[serde(rename = "Orbit", default)]
    pub orbit: Option<Value>,
    #[serde(rename = "UTC Time Observed", default)]
    pub utc_time_observed: Option<String>,
    #[serde(rename = "DCID", default)]
    pub dcid: Option<String>,
    #[serde(rename = "DAAC Scene Numbers", default, deserialize_with = "string_list")]
    pub daac_scene_numbers: Option<Vec<String>>,
    #[serde(rename = "Scene FIDs", default, deserialize_with = "string_list")]
    pub scene_fids: Option<Vec<String>>,
    #[serde(default)]
    pub map_endtime: Option<String>,
    #[serde(default)]
    pub plume_complex_count: Option<u64>,
    #[serde(default)]
    pub style: Option<PlumeStyle>,
}

/// One feature of the metadata collection
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MetadataFeature {
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub properties: MetadataProperties,
}

impl MetadataFeature {
    /// Join key: file name of `Data Download` up to its first `.`
    pub fn stem(&self) -> Option<&str> {
        let url = self.properties.data_download.as_deref()?;
        let file = url.rsplit('/').next()?;
        file.split('.').next().filter(|stem| !stem.is_empty())
    }

    /// Orbit number, whether published as a number or a string
    pub fn orbit(&self) -> Option<i64> {
        match self.properties.orbit.as_ref()? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RawMetadata {
    #[serde(default)]
    name: Option<String>,
    features: Vec<MetadataFeature>,
}

/// Point and polygon metadata features keyed by item id
#[derive(Debug, Clone, Default)]
pub struct PlumeMetadata {
    points: HashMap<String, MetadataFeature>,
    polygons: HashMap<String, MetadataFeature>,
}

impl PlumeMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sort features into the point and polygon lookups
    ///
    /// Features without a stem or with another geometry type are dropped.
    /// A later feature with the same stem replaces an earlier one.
    pub fn from_features(features: impl IntoIterator<Item = MetadataFeature>) -> Self {
        let mut metadata = Self::new();
        for feature in features {
            let Some(stem) = feature.stem().map(str::to_string) else {
                tracing::debug!(plume = ?feature.properties.plume_id, "Metadata feature without Data Download");
                continue;
            };
            match feature.geometry {
                Some(Geometry::Point { .. }) => {
                    metadata.points.insert(stem, feature);
                }
                Some(Geometry::Polygon { .. }) => {
                    metadata.polygons.insert(stem, feature);
                }
                _ => tracing::debug!(stem = %stem, "Ignoring metadata feature geometry"),
            }
        }
        metadata
    }

    pub fn from_json(json: &str) -> PlumeResult<Self> {
        let raw: RawMetadata =
            serde_json::from_str(json).map_err(|e| PlumeError::Parse(e.to_string()))?;
        if let Some(name) = &raw.name {
            tracing::debug!(name = %name, features = raw.features.len(), "Parsed plume metadata");
        }
        Ok(Self::from_features(raw.features))
    }

    pub fn load(path: &Path) -> PlumeResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| PlumeError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn point(&self, id: &str) -> Option<&MetadataFeature> {
        self.points.get(id)
    }

    pub fn polygon(&self, id: &str) -> Option<&MetadataFeature> {
        self.polygons.get(id)
    }

    /// Number of distinct ids with a point or a polygon
    pub fn len(&self) -> usize {
        self.points.len()
            + self
                .polygons
                .keys()
                .filter(|id| !self.points.contains_key(*id))
                .count()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty() && self.polygons.is_empty()
    }
}

/// Plume attributes as served to the dashboard
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlumeProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude_of_max_concentration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude_of_max_concentration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concentration_uncertainty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plume_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concentration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orbit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utc_time_observed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub point_style: Option<PlumeStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub polygon_style: Option<PlumeStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plume_count_number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dcid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daac_scene_number: Option<Vec<String>>,
    #[serde(rename = "sceneFID", skip_serializing_if = "Option::is_none")]
    pub scene_fid: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_end_time: Option<String>,
}

impl PlumeProperties {
    fn from_metadata(point: Option<&MetadataFeature>, polygon: Option<&MetadataFeature>) -> Self {
        let mut properties = Self {
            polygon_style: polygon.and_then(|f| f.properties.style.clone()),
            ..Self::default()
        };
        if let Some(point) = point {
            let p = &point.properties;
            properties.longitude_of_max_concentration = p.longitude_of_max_concentration;
            properties.latitude_of_max_concentration = p.latitude_of_max_concentration;
            properties.concentration_uncertainty = p.concentration_uncertainty;
            properties.plume_id = p.plume_id.clone();
            properties.max_concentration = p.max_concentration;
            properties.orbit = point.orbit();
            properties.utc_time_observed = p.utc_time_observed.clone();
            properties.point_style = p.style.clone();
            properties.plume_count_number = p.plume_complex_count;
            properties.asset_link = p.data_download.clone();
            properties.dcid = p.dcid.clone();
            properties.daac_scene_number = p.daac_scene_numbers.clone();
            properties.scene_fid = p.scene_fids.clone();
            properties.map_end_time = p.map_endtime.clone();
        }
        properties
    }
}

/// A catalog item joined with its plume metadata
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Plume {
    #[serde(flatten)]
    pub item: CatalogItem,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    pub plume_properties: PlumeProperties,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub point_geometry: Option<Geometry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub polygon_geometry: Option<Geometry>,
}

impl Plume {
    /// Join one item with whatever metadata exists for its id
    pub fn join(item: CatalogItem, metadata: &PlumeMetadata) -> Self {
        let point = metadata.point(&item.id);
        let polygon = metadata.polygon(&item.id);

        let point_geometry = point.and_then(|f| f.geometry.clone());
        let (lon, lat) = match point_geometry.as_ref().and_then(Geometry::as_point) {
            Some((lon, lat)) => (Some(lon), Some(lat)),
            None => (None, None),
        };

        Self {
            plume_properties: PlumeProperties::from_metadata(point, polygon),
            point_geometry,
            polygon_geometry: polygon.and_then(|f| f.geometry.clone()),
            lat,
            lon,
            item,
        }
    }

    pub fn id(&self) -> &str {
        &self.item.id
    }

    /// Whether a point or polygon feature matched this item
    pub fn has_metadata(&self) -> bool {
        self.point_geometry.is_some() || self.polygon_geometry.is_some()
    }
}

impl Timestamped for Plume {
    fn timestamp_millis(&self) -> Option<i64> {
        self.item.start_millis()
    }
}

/// Joined plumes ordered by start time, undated last
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct PlumeCollection {
    plumes: Vec<Plume>,
}

impl PlumeCollection {
    /// Join every item with the metadata and order the result
    pub fn join(items: Vec<CatalogItem>, metadata: &PlumeMetadata) -> Self {
        let mut plumes: Vec<Plume> = items
            .into_iter()
            .map(|item| Plume::join(item, metadata))
            .collect();
        plumes.sort_by_key(|p| p.timestamp_millis().unwrap_or(i64::MAX));

        let unmatched: Vec<&str> = plumes
            .iter()
            .filter(|p| !p.has_metadata())
            .map(Plume::id)
            .collect();
        if !unmatched.is_empty() {
            tracing::debug!(items = ?unmatched, "Plumes without metadata");
        }
        tracing::info!(
            plumes = plumes.len(),
            unmatched = unmatched.len(),
            metadata = metadata.len(),
            "Plumes joined"
        );

        Self { plumes }
    }

    pub fn all(&self) -> &[Plume] {
        &self.plumes
    }

    pub fn get(&self, id: &str) -> Option<&Plume> {
        self.plumes.iter().find(|p| p.id() == id)
    }

    /// Dated plumes starting inside `window`
    pub fn in_window(&self, window: &TimeWindow) -> &[Plume] {
        let dated = self
            .plumes
            .partition_point(|p| p.timestamp_millis().is_some());
        window.apply(&self.plumes[..dated])
    }

    pub fn len(&self) -> usize {
        self.plumes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plumes.is_empty()
    }
}

/// Accept strings or numbers; anything else becomes its JSON text
fn string_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let values: Option<Vec<Value>> = Option::deserialize(deserializer)?;
    Ok(values.map(|values| {
        values
            .into_iter()
            .map(|v| match v {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect()
    }))
}
