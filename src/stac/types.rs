//! Core catalog types
//!
//! - `CatalogItem`: one observation (a STAC item / GeoJSON feature)
//! - `Link`: typed relation to another document
//! - `Asset`: downloadable resource, optionally with raster statistics
//! - `Geometry`: the GeoJSON geometries these collections use

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::properties::ItemProperties;

/// Relation to another document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Link {
    /// Relation type ("next", "self", "root", ...)
    pub rel: String,
    /// Target URL
    pub href: String,
    /// Media type of the target
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Link {
    pub fn new(rel: impl Into<String>, media_type: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            rel: rel.into(),
            href: href.into(),
            media_type: Some(media_type.into()),
            title: None,
        }
    }

    /// Check if this link has the given relation type
    pub fn is(&self, rel: &str) -> bool {
        self.rel == rel
    }
}

/// A position: `[lon, lat]` or `[lon, lat, alt]`
pub type Position = Vec<f64>;

/// GeoJSON geometry
///
/// Members outside the known geometry types are kept verbatim in `Other`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: Position },
    MultiPoint { coordinates: Vec<Position> },
    LineString { coordinates: Vec<Position> },
    MultiLineString { coordinates: Vec<Vec<Position>> },
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
    GeometryCollection { geometries: Vec<Geometry> },
    #[serde(untagged)]
    Other(Value),
}

impl Geometry {
    /// Longitude/latitude if this is a point
    pub fn as_point(&self) -> Option<(f64, f64)> {
        match self {
            Geometry::Point { coordinates } if coordinates.len() >= 2 => {
                Some((coordinates[0], coordinates[1]))
            }
            _ => None,
        }
    }

    /// Round every coordinate to `decimals` decimal places
    ///
    /// `Other` geometries are left untouched.
    pub fn round_coordinates(&mut self, decimals: i32) {
        let factor = 10f64.powi(decimals);
        let round = |p: &mut Position| {
            for v in p.iter_mut() {
                *v = (*v * factor).round() / factor;
            }
        };

        match self {
            Geometry::Point { coordinates } => round(coordinates),
            Geometry::MultiPoint { coordinates } | Geometry::LineString { coordinates } => {
                coordinates.iter_mut().for_each(round)
            }
            Geometry::MultiLineString { coordinates } | Geometry::Polygon { coordinates } => {
                coordinates.iter_mut().flatten().for_each(round)
            }
            Geometry::MultiPolygon { coordinates } => coordinates
                .iter_mut()
                .flatten()
                .flatten()
                .for_each(round),
            Geometry::GeometryCollection { geometries } => geometries
                .iter_mut()
                .for_each(|g| g.round_coordinates(decimals)),
            Geometry::Other(_) => {}
        }
    }
}

/// Summary statistics of a raster band
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Statistics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stddev: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_percent: Option<f64>,
}

/// Value histogram of a raster band
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Histogram {
    pub min: f64,
    pub max: f64,
    pub count: u64,
    #[serde(default)]
    pub buckets: Vec<u64>,
}

/// Entry of the `raster:bands` extension
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RasterBand {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    /// Either a number or a string such as "nan"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodata: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sampling: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub histogram: Option<Histogram>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<Statistics>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Named downloadable resource of an item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Asset {
    pub href: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
    #[serde(rename = "raster:bands", default, skip_serializing_if = "Vec::is_empty")]
    pub raster_bands: Vec<RasterBand>,
    /// Projection and other extension fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Asset {
    /// Statistics of the first raster band, if published
    pub fn statistics(&self) -> Option<&Statistics> {
        self.raster_bands.first().and_then(|b| b.statistics.as_ref())
    }

    /// `(minimum, maximum)` of the first band, used to scale color ramps
    pub fn value_range(&self) -> Option<(f64, f64)> {
        let stats = self.statistics()?;
        Some((stats.minimum?, stats.maximum?))
    }
}

fn default_feature_type() -> String {
    "Feature".to_string()
}

/// One immutable catalog observation
///
/// The id encodes `<dataKind>_<targetKey>_<timestamp>_<filterStatus>_<measurementKind>`,
/// e.g. `oco3-co2_volcano0010_2025-03-30T232216Z_unfiltered_xco2`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogItem {
    pub id: String,

    #[serde(rename = "type", default = "default_feature_type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Vec<f64>>,

    #[serde(default)]
    pub geometry: Option<Geometry>,

    #[serde(default)]
    pub links: Vec<Link>,

    #[serde(default)]
    pub assets: BTreeMap<String, Asset>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,

    #[serde(default)]
    pub properties: ItemProperties,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stac_version: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stac_extensions: Vec<String>,

    /// Unknown top-level members, verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CatalogItem {
    /// Create a bare item with an id and properties
    pub fn new(id: impl Into<String>, properties: ItemProperties) -> Self {
        Self {
            id: id.into(),
            kind: default_feature_type(),
            bbox: None,
            geometry: None,
            links: Vec::new(),
            assets: BTreeMap::new(),
            collection: None,
            properties,
            stac_version: None,
            stac_extensions: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Start of the observation interval
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.properties.start()
    }

    /// End of the observation interval
    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.properties.end()
    }

    /// Start as epoch milliseconds
    pub fn start_millis(&self) -> Option<i64> {
        self.start_time().map(|t| t.timestamp_millis())
    }

    /// First link with the given relation type
    pub fn link(&self, rel: &str) -> Option<&Link> {
        self.links.iter().find(|l| l.is(rel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sam_item_json() -> Value {
        json!({
            "id": "oco3-co2_volcano0010_2025-03-30T232216Z_unfiltered_xco2",
            "bbox": [14.5, 37.4, 15.4, 38.1],
            "type": "Feature",
            "links": [{"rel": "collection", "type": "application/json", "href": "https://example.test/collections/oco3"}],
            "assets": {
                "xco2": {
                    "href": "s3://bucket/xco2.tif",
                    "type": "image/tiff; application=geotiff",
                    "title": "XCO2",
                    "proj:epsg": 4326,
                    "raster:bands": [{
                        "scale": 1.0,
                        "nodata": "nan",
                        "offset": 0.0,
                        "sampling": "area",
                        "data_type": "float32",
                        "statistics": {"mean": 421.3, "stddev": 1.2, "maximum": 425.0, "minimum": 418.0, "valid_percent": 61.5}
                    }]
                }
            },
            "geometry": {"type": "Polygon", "coordinates": [[[14.5, 37.4], [15.4, 37.4], [15.4, 38.1], [14.5, 37.4]]]},
            "collection": "oco3-co2-sams-daygrid-v11r",
            "properties": {
                "start_datetime": "2025-03-30T23:22:16Z",
                "end_datetime": "2025-03-30T23:24:16Z",
                "target_id": "volcano0010"
            },
            "stac_version": "1.0.0",
            "stac_extensions": ["https://stac-extensions.github.io/raster/v1.1.0/schema.json"],
            "custom_member": {"kept": true}
        })
    }

    #[test]
    fn test_item_deserialize() {
        let item: CatalogItem = serde_json::from_value(sam_item_json()).unwrap();
        assert_eq!(item.kind, "Feature");
        assert_eq!(item.collection.as_deref(), Some("oco3-co2-sams-daygrid-v11r"));
        assert!(matches!(item.geometry, Some(Geometry::Polygon { .. })));
        assert_eq!(item.link("collection").unwrap().media_type.as_deref(), Some("application/json"));
        assert!(item.link("next").is_none());
        assert!(item.start_millis().is_some());
    }

    #[test]
    fn test_unknown_members_survive() {
        let original = sam_item_json();
        let item: CatalogItem = serde_json::from_value(original.clone()).unwrap();
        let back = serde_json::to_value(&item).unwrap();
        assert_eq!(back["custom_member"], original["custom_member"]);
        assert_eq!(back["assets"]["xco2"]["proj:epsg"], 4326);
        assert_eq!(back["assets"]["xco2"]["raster:bands"][0]["nodata"], "nan");
    }

    #[test]
    fn test_asset_statistics() {
        let item: CatalogItem = serde_json::from_value(sam_item_json()).unwrap();
        let asset = &item.assets["xco2"];
        assert_eq!(asset.statistics().unwrap().mean, Some(421.3));
        assert_eq!(asset.value_range(), Some((418.0, 425.0)));
    }

    #[test]
    fn test_null_geometry_allowed() {
        let item: CatalogItem =
            serde_json::from_value(json!({"id": "a", "geometry": null, "properties": {}})).unwrap();
        assert!(item.geometry.is_none());
        assert!(item.start_time().is_none());
    }

    #[test]
    fn test_multi_line_string_and_collection() {
        let item: CatalogItem = serde_json::from_value(json!({
            "id": "a",
            "geometry": {"type": "MultiLineString", "coordinates": [[[1.0, 2.0], [3.0, 4.0]]]},
            "properties": {}
        }))
        .unwrap();
        assert!(matches!(item.geometry, Some(Geometry::MultiLineString { .. })));

        let mut geom: Geometry = serde_json::from_value(json!({
            "type": "GeometryCollection",
            "geometries": [{"type": "Point", "coordinates": [1.234, 5.678]}]
        }))
        .unwrap();
        geom.round_coordinates(1);
        assert_eq!(
            serde_json::to_value(&geom).unwrap(),
            json!({"type": "GeometryCollection", "geometries": [{"type": "Point", "coordinates": [1.2, 5.7]}]})
        );
    }

    #[test]
    fn test_unrecognized_geometry_kept_verbatim() {
        let raw = json!({"type": "Circle", "center": [1.0, 2.0], "radius": 3.0});
        let item: CatalogItem =
            serde_json::from_value(json!({"id": "a", "geometry": raw.clone(), "properties": {}})).unwrap();

        let Some(Geometry::Other(value)) = &item.geometry else {
            panic!("expected a verbatim geometry");
        };
        assert_eq!(value, &raw);
        assert_eq!(serde_json::to_value(&item).unwrap()["geometry"], raw);
    }

    #[test]
    fn test_partial_statistics_round_trip() {
        let stats: Statistics = serde_json::from_value(json!({"mean": 1.5})).unwrap();
        assert_eq!(serde_json::to_value(&stats).unwrap(), json!({"mean": 1.5}));
    }

    #[test]
    fn test_round_coordinates() {
        let mut geom = Geometry::Polygon {
            coordinates: vec![vec![vec![14.5678, 37.4321], vec![15.001, 37.999]]],
        };
        geom.round_coordinates(2);
        assert_eq!(
            geom,
            Geometry::Polygon {
                coordinates: vec![vec![vec![14.57, 37.43], vec![15.0, 38.0]]],
            }
        );

        let point = Geometry::Point { coordinates: vec![1.0, 2.0] };
        assert_eq!(point.as_point(), Some((1.0, 2.0)));
    }
}
