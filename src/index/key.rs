//! Target key derivation
//!
//! Observation ids look like
//! `oco3-co2_volcano0010_2025-03-30T232216Z_unfiltered_xco2`: one data-kind
//! token, the target key, then exactly three trailing tokens. The target key
//! may itself contain `_`, so it is everything between the first token and
//! the last three.

use super::error::{IndexError, IndexResult};
use crate::stac::CatalogItem;

const SEPARATOR: char = '_';
const TRAILING_TOKENS: usize = 3;

/// Target key embedded in an observation id
pub fn derive_target_key(observation_id: &str) -> IndexResult<String> {
    let tokens: Vec<&str> = observation_id.split(SEPARATOR).collect();
    if tokens.len() < TRAILING_TOKENS + 1 {
        return Err(IndexError::MalformedIdentifier(observation_id.to_string()));
    }

    let key = tokens[1..tokens.len() - TRAILING_TOKENS].join("_");
    if key.is_empty() {
        return Err(IndexError::MalformedIdentifier(observation_id.to_string()));
    }
    Ok(key)
}

/// Second `_`-token of an observation id
///
/// Only correct for keys without `_`; kept for lookups by older ids.
pub fn legacy_target_key(observation_id: &str) -> Option<&str> {
    observation_id
        .split(SEPARATOR)
        .nth(1)
        .filter(|token| !token.is_empty())
}

/// Target key of an item
///
/// `properties.target_id` wins when present; the id is parsed otherwise.
pub fn resolve_target_key(item: &CatalogItem) -> IndexResult<String> {
    let parsed = derive_target_key(&item.id);

    match item.properties.get_str("target_id") {
        Ok(target_id) => {
            if let Ok(parsed) = &parsed {
                if parsed != target_id {
                    tracing::debug!(
                        observation = %item.id,
                        target_id,
                        parsed = %parsed,
                        "Target id differs from the key embedded in the observation id"
                    );
                }
            }
            Ok(target_id.to_string())
        }
        Err(_) => parsed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stac::ItemProperties;
    use serde_json::json;

    #[test]
    fn test_simple_key() {
        assert_eq!(
            derive_target_key("oco3-co2_volcano0010_2025-03-30T232216Z_unfiltered_xco2").unwrap(),
            "volcano0010"
        );
    }

    #[test]
    fn test_key_with_separator() {
        assert_eq!(
            derive_target_key("oco3-co2_fossil_la_basin_2024-01-01T000000Z_filtered_xco2").unwrap(),
            "fossil_la_basin"
        );
        assert_eq!(
            legacy_target_key("oco3-co2_fossil_la_basin_2024-01-01T000000Z_filtered_xco2"),
            Some("fossil")
        );
    }

    #[test]
    fn test_malformed_ids() {
        for id in ["", "a_b_c", "kind_2024_filtered_xco2", "kind__2024_filtered_xco2"] {
            assert_eq!(
                derive_target_key(id),
                Err(IndexError::MalformedIdentifier(id.to_string())),
                "{}",
                id
            );
        }
        assert_eq!(legacy_target_key("single"), None);
    }

    #[test]
    fn test_property_is_ground_truth() {
        let props = ItemProperties::default().set("target_id", json!("la_basin"));
        let item = CatalogItem::new("oco3-co2_la_2024-01-01T000000Z_filtered_xco2", props);
        assert_eq!(resolve_target_key(&item).unwrap(), "la_basin");

        // no property and no parsable id
        let item = CatalogItem::new("broken", ItemProperties::default());
        assert!(resolve_target_key(&item).is_err());

        // property rescues an unparsable id
        let props = ItemProperties::default().set("target_id", json!("t1"));
        let item = CatalogItem::new("broken", props);
        assert_eq!(resolve_target_key(&item).unwrap(), "t1");
    }
}
