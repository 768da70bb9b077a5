//! Snapshot artifact format
//!
//! A snapshot is a single `FeatureCollection` holding every item of one
//! collection, with `numberMatched == numberReturned == features.len()`.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::error::{SnapshotError, SnapshotResult};
use crate::stac::{CatalogItem, Link};

const JSON: &str = "application/json";
const GEO_JSON: &str = "application/geo+json";

fn default_collection_type() -> String {
    "FeatureCollection".to_string()
}

/// Consolidated collection artifact
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSnapshot {
    #[serde(rename = "type", default = "default_collection_type")]
    pub kind: String,
    #[serde(default)]
    pub links: Vec<Link>,
    pub features: Vec<CatalogItem>,
    pub number_matched: usize,
    pub number_returned: usize,
}

impl CollectionSnapshot {
    /// Wrap a full item list; counts are taken from the list
    pub fn new(links: Vec<Link>, features: Vec<CatalogItem>) -> Self {
        let n = features.len();
        Self {
            kind: default_collection_type(),
            links,
            features,
            number_matched: n,
            number_returned: n,
        }
    }

    /// Check the count invariant
    pub fn validate(&self) -> SnapshotResult<()> {
        let features = self.features.len();
        if self.number_matched != features || self.number_returned != features {
            return Err(SnapshotError::Inconsistent {
                matched: self.number_matched,
                returned: self.number_returned,
                features,
            });
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn into_features(self) -> Vec<CatalogItem> {
        self.features
    }
}

/// Envelope links for a collection snapshot
///
/// `collection`, `parent` and `root` point at the catalog API; `self`
/// points at `self_link_base`, which may be a different deployment.
pub fn envelope_links(stac_api_url: &str, self_link_base: &str, collection_id: &str) -> Vec<Link> {
    let api = stac_api_url.trim_end_matches('/');
    let self_base = self_link_base.trim_end_matches('/');
    let encoded = urlencoding::encode(collection_id);
    let collection = format!("{}/collections/{}", api, encoded);

    vec![
        Link::new("collection", JSON, collection.clone()),
        Link::new("parent", JSON, collection),
        Link::new("root", JSON, format!("{}/", api)),
        Link::new(
            "self",
            GEO_JSON,
            format!("{}/collections/{}/items", self_base, encoded),
        ),
    ]
}

/// Read and validate a snapshot artifact
pub fn load_snapshot(path: &Path) -> SnapshotResult<CollectionSnapshot> {
    let content = std::fs::read_to_string(path).map_err(|source| SnapshotError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let snapshot: CollectionSnapshot = serde_json::from_str(&content)?;
    snapshot.validate()?;

    tracing::debug!(path = %path.display(), features = snapshot.len(), "Loaded snapshot");
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stac::ItemProperties;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_envelope_links() {
        let links = envelope_links("https://api.test/stac/", "https://public.test/stac", "c-1");
        let hrefs: Vec<(&str, &str)> = links.iter().map(|l| (l.rel.as_str(), l.href.as_str())).collect();
        assert_eq!(
            hrefs,
            vec![
                ("collection", "https://api.test/stac/collections/c-1"),
                ("parent", "https://api.test/stac/collections/c-1"),
                ("root", "https://api.test/stac/"),
                ("self", "https://public.test/stac/collections/c-1/items"),
            ]
        );
        assert_eq!(links[3].media_type.as_deref(), Some(GEO_JSON));
    }

    #[test]
    fn test_envelope_links_encode_collection_id() {
        let links = envelope_links("https://api.test/stac", "https://public.test/stac", "my coll#1");
        assert_eq!(links[0].href, "https://api.test/stac/collections/my%20coll%231");
        assert_eq!(links[1].href, links[0].href);
        assert_eq!(
            links[3].href,
            "https://public.test/stac/collections/my%20coll%231/items"
        );
    }

    #[test]
    fn test_serialized_shape() {
        let snapshot = CollectionSnapshot::new(
            vec![],
            vec![CatalogItem::new("a", ItemProperties::default())],
        );
        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["type"], "FeatureCollection");
        assert_eq!(value["numberMatched"], 1);
        assert_eq!(value["numberReturned"], 1);
        assert_eq!(value["features"][0]["id"], "a");
    }

    #[test]
    fn test_load_rejects_inconsistent_counts() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(
            &path,
            json!({
                "type": "FeatureCollection",
                "links": [],
                "features": [{"id": "a", "properties": {}}],
                "numberMatched": 2,
                "numberReturned": 2
            })
            .to_string(),
        )
        .unwrap();

        let err = load_snapshot(&path).unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::Inconsistent { matched: 2, returned: 2, features: 1 }
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let err = load_snapshot(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, SnapshotError::Read { .. }));
    }
}
