//! Item property bag
//!
//! STAC `properties` is an open schema. The few fields every item carries
//! (`datetime`, `start_datetime`, `end_datetime`) are struct fields; all
//! other members land in `extra` and are read through typed accessors that
//! fail with [`PropertyError`] rather than silently yielding nothing.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::error::{PropertyError, PropertyResult};

/// Properties of a catalog item
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ItemProperties {
    /// Nominal acquisition time
    ///
    /// `Some(None)` is an explicit `null`, which STAC requires when a
    /// start/end pair is given; `None` means the key was absent.
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub datetime: Option<Option<String>>,

    /// Start of the acquisition interval
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_datetime: Option<String>,

    /// End of the acquisition interval
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_datetime: Option<String>,

    /// Every other property, verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ItemProperties {
    /// Create properties with a start/end pair and a null `datetime`
    pub fn with_interval(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            datetime: Some(None),
            start_datetime: Some(start.into()),
            end_datetime: Some(end.into()),
            extra: Map::new(),
        }
    }

    /// Builder: set an extension property
    pub fn set(mut self, field: impl Into<String>, value: Value) -> Self {
        self.extra.insert(field.into(), value);
        self
    }

    /// `datetime` when it is set to a value
    pub fn nominal(&self) -> Option<&str> {
        self.datetime.as_ref().and_then(|d| d.as_deref())
    }

    /// Parsed start of the interval, falling back to `datetime`
    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.start_datetime
            .as_deref()
            .or(self.nominal())
            .and_then(parse_timestamp)
    }

    /// Parsed end of the interval, falling back to `datetime`
    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.end_datetime
            .as_deref()
            .or(self.nominal())
            .and_then(parse_timestamp)
    }

    /// Check whether an extension field is present and non-null
    pub fn contains(&self, field: &str) -> bool {
        self.extra.get(field).map(|v| !v.is_null()).unwrap_or(false)
    }

    /// Raw JSON value of an extension field
    pub fn get(&self, field: &str) -> PropertyResult<&Value> {
        match self.extra.get(field) {
            Some(Value::Null) | None => Err(PropertyError::FieldMissing(field.to_string())),
            Some(value) => Ok(value),
        }
    }

    pub fn get_str(&self, field: &str) -> PropertyResult<&str> {
        self.get(field)?
            .as_str()
            .ok_or_else(|| mismatch(field, "string"))
    }

    pub fn get_f64(&self, field: &str) -> PropertyResult<f64> {
        self.get(field)?
            .as_f64()
            .ok_or_else(|| mismatch(field, "number"))
    }

    /// Optional numeric field
    ///
    /// Missing and null map to `None`. Numeric strings are accepted since
    /// upstream encodes some measurements (e.g. altitude) as text.
    pub fn get_opt_f64(&self, field: &str) -> PropertyResult<Option<f64>> {
        match self.extra.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => Ok(n.as_f64()),
            Some(Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| mismatch(field, "number")),
            Some(_) => Err(mismatch(field, "number")),
        }
    }

    /// Longitude/latitude of a GeoJSON point (or bare `[lon, lat]` array)
    pub fn get_point(&self, field: &str) -> PropertyResult<(f64, f64)> {
        let value = self.get(field)?;
        let coords = match value {
            Value::Object(obj) => obj.get("coordinates"),
            Value::Array(_) => Some(value),
            _ => None,
        }
        .and_then(Value::as_array)
        .ok_or_else(|| mismatch(field, "point"))?;

        match (
            coords.first().and_then(Value::as_f64),
            coords.get(1).and_then(Value::as_f64),
        ) {
            (Some(lon), Some(lat)) => Ok((lon, lat)),
            _ => Err(mismatch(field, "point")),
        }
    }

    /// Deserialize an extension field into any serde type
    pub fn get_as<T: DeserializeOwned>(&self, field: &str) -> PropertyResult<T> {
        let value = self.get(field)?.clone();
        serde_json::from_value(value).map_err(|_| mismatch(field, std::any::type_name::<T>()))
    }
}

fn mismatch(field: &str, expected: &'static str) -> PropertyError {
    PropertyError::FieldTypeMismatch {
        field: field.to_string(),
        expected,
    }
}

/// Parse a catalog timestamp into UTC
///
/// Accepts RFC 3339, the compact form used in OCO-3 item ids
/// (`2025-03-30T232216Z`), naive date-times (taken as UTC) and bare dates
/// (midnight UTC). Returns `None` for anything else.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H%M%SZ", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Wraps whatever was present, `null` included, so it survives re-serialization
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sam_properties() -> ItemProperties {
        serde_json::from_value(json!({
            "start_datetime": "2025-03-30T23:22:16Z",
            "end_datetime": "2025-03-30T23:24:16Z",
            "target_id": "volcano0010",
            "target_name": "Etna",
            "target_type": "volcano",
            "target_altitude": "3357",
            "target_location": {"type": "Point", "coordinates": [14.99, 37.75]},
            "spatial_region": null
        }))
        .unwrap()
    }

    #[test]
    fn test_fixed_fields_and_extras_split() {
        let props = sam_properties();
        assert_eq!(props.start_datetime.as_deref(), Some("2025-03-30T23:22:16Z"));
        assert!(props.datetime.is_none());
        assert!(props.extra.contains_key("target_id"));
        assert!(!props.extra.contains_key("start_datetime"));
    }

    #[test]
    fn test_typed_accessors() {
        let props = sam_properties();
        assert_eq!(props.get_str("target_id").unwrap(), "volcano0010");
        assert_eq!(props.get_point("target_location").unwrap(), (14.99, 37.75));
        assert_eq!(props.get_opt_f64("target_altitude").unwrap(), Some(3357.0));
        assert_eq!(props.get_opt_f64("no_such_field").unwrap(), None);
    }

    #[test]
    fn test_missing_and_mismatch() {
        let props = sam_properties();
        assert_eq!(
            props.get_str("spatial_region"),
            Err(PropertyError::FieldMissing("spatial_region".to_string()))
        );
        assert!(matches!(
            props.get_f64("target_name"),
            Err(PropertyError::FieldTypeMismatch { expected: "number", .. })
        ));
        assert!(matches!(
            props.get_point("target_name"),
            Err(PropertyError::FieldTypeMismatch { expected: "point", .. })
        ));
        assert!(!props.contains("spatial_region"));
    }

    #[test]
    fn test_start_falls_back_to_datetime() {
        let props: ItemProperties =
            serde_json::from_value(json!({"datetime": "2024-02-01T00:00:00Z"})).unwrap();
        assert_eq!(props.start(), props.end());
        assert!(props.start().is_some());
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = parse_timestamp("2025-03-30T23:22:16Z").unwrap();
        assert_eq!(parse_timestamp("2025-03-30T232216Z"), Some(expected));
        assert_eq!(parse_timestamp("2025-03-30T23:22:16"), Some(expected));
        assert_eq!(parse_timestamp("2025-03-30T23:22:16+00:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2025-03-30").unwrap().timestamp_millis() % 86_400_000,
            0
        );
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("not a date").is_none());
    }

    #[test]
    fn test_round_trip_keeps_extras() {
        let props = sam_properties();
        let value = serde_json::to_value(&props).unwrap();
        assert_eq!(value["target_type"], "volcano");
        assert_eq!(value["start_datetime"], "2025-03-30T23:22:16Z");
        assert!(value.get("datetime").is_none());
    }

    #[test]
    fn test_null_datetime_survives_round_trip() {
        let props: ItemProperties = serde_json::from_value(json!({
            "datetime": null,
            "start_datetime": "2024-01-01T00:00:00Z",
            "end_datetime": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(props.datetime, Some(None));
        assert!(props.nominal().is_none());

        let value = serde_json::to_value(&props).unwrap();
        assert_eq!(value.get("datetime"), Some(&Value::Null));

        let props: ItemProperties =
            serde_json::from_value(json!({"datetime": "2024-02-01T00:00:00Z"})).unwrap();
        assert_eq!(props.nominal(), Some("2024-02-01T00:00:00Z"));
        assert_eq!(
            serde_json::to_value(&props).unwrap()["datetime"],
            "2024-02-01T00:00:00Z"
        );
    }
}
