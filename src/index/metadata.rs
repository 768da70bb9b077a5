//! Per-target metadata
//!
//! Catalog items do not carry everything a target needs (display name,
//! type, location). A [`MetadataCatalog`] supplies it, either loaded from a
//! JSON side file or harvested from metadata embedded in item properties.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

use super::error::{IndexError, IndexResult};
use crate::stac::{CatalogItem, Geometry, ItemProperties, PropertyResult};

/// Metadata record of one target
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TargetMetadata {
    pub target_id: String,
    pub target_name: String,
    pub target_type: String,
    /// Metres; upstream sends a number, a numeric string or null
    #[serde(default, deserialize_with = "deserialize_altitude")]
    pub target_altitude: Option<f64>,
    #[serde(default)]
    pub target_location: Option<Geometry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spatial_region: Option<Value>,
}

impl TargetMetadata {
    /// Longitude/latitude of the target marker
    pub fn location(&self) -> Option<(f64, f64)> {
        self.target_location.as_ref().and_then(Geometry::as_point)
    }

    /// Extract a record from item properties
    ///
    /// Id, name and type are required; altitude and location are optional.
    pub fn from_properties(props: &ItemProperties) -> PropertyResult<Self> {
        let target_location = props
            .get_point("target_location")
            .ok()
            .map(|(lon, lat)| Geometry::Point {
                coordinates: vec![lon, lat],
            });

        Ok(Self {
            target_id: props.get_str("target_id")?.to_string(),
            target_name: props.get_str("target_name")?.to_string(),
            target_type: props.get_str("target_type")?.to_string(),
            target_altitude: props.get_opt_f64("target_altitude")?,
            target_location,
            spatial_region: props.get("spatial_region").ok().cloned(),
        })
    }
}

fn deserialize_altitude<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Lookup of target metadata by target id
#[derive(Debug, Clone, Default)]
pub struct MetadataCatalog {
    records: HashMap<String, TargetMetadata>,
}

impl MetadataCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from records; a later record replaces an earlier one with the same id
    pub fn from_records(records: impl IntoIterator<Item = TargetMetadata>) -> Self {
        let mut catalog = Self::new();
        for record in records {
            catalog.insert(record);
        }
        catalog
    }

    /// Load a JSON array of records
    pub fn load(path: &Path) -> IndexResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| IndexError::Metadata(format!("{}: {}", path.display(), e)))?;
        let records: Vec<TargetMetadata> = serde_json::from_str(&content)
            .map_err(|e| IndexError::Metadata(format!("{}: {}", path.display(), e)))?;

        tracing::info!(path = %path.display(), records = records.len(), "Loaded target metadata");
        Ok(Self::from_records(records))
    }

    /// Collect the metadata embedded in item properties
    ///
    /// The first item seen for a target provides its record.
    pub fn harvest<'a>(items: impl IntoIterator<Item = &'a CatalogItem>) -> Self {
        let mut catalog = Self::new();
        let mut without = 0usize;

        for item in items {
            match TargetMetadata::from_properties(&item.properties) {
                Ok(record) => {
                    catalog
                        .records
                        .entry(record.target_id.clone())
                        .or_insert(record);
                }
                Err(_) => without += 1,
            }
        }

        if without > 0 {
            tracing::debug!(items = without, "Items without embedded target metadata");
        }
        catalog
    }

    /// Fill in records missing here from `other`; existing records win
    pub fn merge(&mut self, other: MetadataCatalog) {
        for (id, record) in other.records {
            self.records.entry(id).or_insert(record);
        }
    }

    pub fn insert(&mut self, record: TargetMetadata) -> Option<TargetMetadata> {
        self.records.insert(record.target_id.clone(), record)
    }

    pub fn get(&self, target_id: &str) -> Option<&TargetMetadata> {
        self.records.get(target_id)
    }

    pub fn contains(&self, target_id: &str) -> bool {
        self.records.contains_key(target_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
