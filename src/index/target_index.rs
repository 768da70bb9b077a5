//! Target index
//!
//! Partitions a flat list of observations by target key and groups targets
//! by type:
//!
//! ```text
//! items ──► resolve key ──► metadata? ──no──► skipped (MissingMetadata)
//!                              │yes
//!                              ▼
//!                targets[key].add_observation ──► groups[target_type] ∋ key
//! ```
//!
//! Every observation of a target lives in exactly that target, and every
//! target belongs to exactly one type group.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use super::error::{IndexError, IndexResult};
use super::key::{derive_target_key, legacy_target_key, resolve_target_key};
use super::metadata::MetadataCatalog;
use super::target::Target;
use crate::stac::CatalogItem;

/// What happened to an added observation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// First observation of a new target
    Created { target_id: String },
    /// Appended to an existing target
    Appended { target_id: String },
    /// No metadata for the key; the observation was dropped
    MissingMetadata { target_id: String },
}

/// Handling of observations whose id cannot be parsed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedPolicy {
    /// Count and continue
    #[default]
    Skip,
    /// Fail the whole build
    Abort,
}

impl FromStr for MalformedPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "skip" => Ok(MalformedPolicy::Skip),
            "abort" => Ok(MalformedPolicy::Abort),
            other => Err(format!("unknown malformed-id policy '{}'", other)),
        }
    }
}

impl fmt::Display for MalformedPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedPolicy::Skip => write!(f, "skip"),
            MalformedPolicy::Abort => write!(f, "abort"),
        }
    }
}

/// Targets sharing a `target_type`
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TargetTypeGroup {
    pub name: String,
    /// Member ids in order of first sight
    pub target_ids: Vec<String>,
}

/// Counts from one index build
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct BuildReport {
    pub items: usize,
    pub indexed: usize,
    pub targets_created: usize,
    pub missing_metadata: usize,
    pub malformed: usize,
    /// Keys with no metadata record
    pub unknown_targets: BTreeSet<String>,
}

/// Index statistics
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct IndexStats {
    pub targets: usize,
    pub target_types: usize,
    pub observations: usize,
    pub unsorted_targets: usize,
}

/// In-memory index of observations by target
#[derive(Debug, Clone, Default)]
pub struct TargetIndex {
    catalog: MetadataCatalog,
    targets: BTreeMap<String, Target>,
    groups: BTreeMap<String, TargetTypeGroup>,
}

impl TargetIndex {
    pub fn new(catalog: MetadataCatalog) -> Self {
        Self {
            catalog,
            targets: BTreeMap::new(),
            groups: BTreeMap::new(),
        }
    }

    /// Build from a full item list, skipping malformed ids
    pub fn build(
        items: impl IntoIterator<Item = CatalogItem>,
        catalog: MetadataCatalog,
    ) -> IndexResult<(Self, BuildReport)> {
        Self::build_with_policy(items, catalog, MalformedPolicy::Skip)
    }

    /// Build from a full item list; every timeline is sorted at the end
    pub fn build_with_policy(
        items: impl IntoIterator<Item = CatalogItem>,
        catalog: MetadataCatalog,
        policy: MalformedPolicy,
    ) -> IndexResult<(Self, BuildReport)> {
        let mut index = Self::new(catalog);
        let mut report = BuildReport::default();

        for item in items {
            report.items += 1;
            match index.add_observation(item) {
                Ok(AddOutcome::Created { .. }) => {
                    report.indexed += 1;
                    report.targets_created += 1;
                }
                Ok(AddOutcome::Appended { .. }) => report.indexed += 1,
                Ok(AddOutcome::MissingMetadata { target_id }) => {
                    report.missing_metadata += 1;
                    report.unknown_targets.insert(target_id);
                }
                Err(e @ IndexError::MalformedIdentifier(_)) => match policy {
                    MalformedPolicy::Skip => {
                        tracing::debug!(error = %e, "Skipping observation");
                        report.malformed += 1;
                    }
                    MalformedPolicy::Abort => return Err(e),
                },
                Err(e) => return Err(e),
            }
        }

        index.sort_all();

        if report.missing_metadata > 0 {
            tracing::warn!(
                observations = report.missing_metadata,
                targets = report.unknown_targets.len(),
                "Observations skipped for targets without metadata"
            );
        }
        tracing::info!(
            items = report.items,
            indexed = report.indexed,
            targets = index.targets.len(),
            types = index.groups.len(),
            malformed = report.malformed,
            "Target index built"
        );

        Ok((index, report))
    }

    /// Route one observation to its target
    pub fn add_observation(&mut self, item: CatalogItem) -> IndexResult<AddOutcome> {
        let key = resolve_target_key(&item)?;

        if let Some(target) = self.targets.get_mut(&key) {
            target.add_observation(item);
            return Ok(AddOutcome::Appended { target_id: key });
        }

        let Some(metadata) = self.catalog.get(&key) else {
            tracing::trace!(target_id = %key, observation = %item.id, "No metadata for target");
            return Ok(AddOutcome::MissingMetadata { target_id: key });
        };

        let mut target = Target::new(metadata);
        // the metadata record may spell the id differently from the key
        target.id = key.clone();
        target.add_observation(item);

        self.groups
            .entry(target.target_type.clone())
            .or_insert_with(|| TargetTypeGroup {
                name: target.target_type.clone(),
                target_ids: Vec::new(),
            })
            .target_ids
            .push(key.clone());
        self.targets.insert(key.clone(), target);

        Ok(AddOutcome::Created { target_id: key })
    }

    /// Sort every timeline in place
    pub fn sort_all(&mut self) {
        for target in self.targets.values_mut() {
            target.sort();
        }
    }

    pub fn target(&self, target_id: &str) -> IndexResult<&Target> {
        self.targets
            .get(target_id)
            .ok_or_else(|| IndexError::TargetNotFound(target_id.to_string()))
    }

    fn target_mut(&mut self, target_id: &str) -> IndexResult<&mut Target> {
        self.targets
            .get_mut(target_id)
            .ok_or_else(|| IndexError::TargetNotFound(target_id.to_string()))
    }

    /// Chronologically first observation of a target
    pub fn get_representative(&mut self, target_id: &str) -> IndexResult<&CatalogItem> {
        self.target_mut(target_id)?
            .representative()
            .ok_or_else(|| IndexError::TargetNotFound(target_id.to_string()))
    }

    /// Sorted timeline of a target
    pub fn get_all(&mut self, target_id: &str) -> IndexResult<&[CatalogItem]> {
        Ok(self.target_mut(target_id)?.timeline())
    }

    /// One observation of a target
    pub fn get_by_id(&self, target_id: &str, observation_id: &str) -> IndexResult<&CatalogItem> {
        self.target(target_id)?
            .get_by_id(observation_id)
            .ok_or_else(|| IndexError::ObservationNotFound {
                target_id: target_id.to_string(),
                observation_id: observation_id.to_string(),
            })
    }

    /// Observation by id alone
    ///
    /// Tries the key parsed from the id, then the legacy second-token key,
    /// then every target.
    pub fn find_observation(&self, observation_id: &str) -> IndexResult<&CatalogItem> {
        let derived = derive_target_key(observation_id).ok();
        let candidates = derived.as_deref().into_iter().chain(legacy_target_key(observation_id));

        for key in candidates {
            if let Some(found) = self.targets.get(key).and_then(|t| t.get_by_id(observation_id)) {
                return Ok(found);
            }
        }

        self.targets
            .values()
            .find_map(|t| t.get_by_id(observation_id))
            .ok_or_else(|| IndexError::ObservationNotFound {
                target_id: derived.unwrap_or_default(),
                observation_id: observation_id.to_string(),
            })
    }

    /// All targets, ordered by id
    pub fn targets(&self) -> impl Iterator<Item = &Target> {
        self.targets.values()
    }

    /// Distinct target types, ordered by name
    pub fn target_types(&self) -> Vec<&str> {
        self.groups.keys().map(String::as_str).collect()
    }

    pub fn group(&self, target_type: &str) -> Option<&TargetTypeGroup> {
        self.groups.get(target_type)
    }

    /// Targets of one type; empty for an unknown type
    pub fn targets_of_type(&self, target_type: &str) -> Vec<&Target> {
        self.groups
            .get(target_type)
            .map(|group| {
                group
                    .target_ids
                    .iter()
                    .filter_map(|id| self.targets.get(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// One representative observation per target
    pub fn representatives(&self) -> Vec<&CatalogItem> {
        self.targets
            .values()
            .filter_map(Target::peek_representative)
            .collect()
    }

    /// Representatives of the targets of one type
    pub fn representatives_of_type(&self, target_type: &str) -> Vec<&CatalogItem> {
        self.targets_of_type(target_type)
            .into_iter()
            .filter_map(Target::peek_representative)
            .collect()
    }

    pub fn catalog(&self) -> &MetadataCatalog {
        &self.catalog
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            targets: self.targets.len(),
            target_types: self.groups.len(),
            observations: self.targets.values().map(Target::len).sum(),
            unsorted_targets: self.targets.values().filter(|t| !t.is_sorted()).count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::TargetMetadata;
    use crate::stac::ItemProperties;

    fn meta(id: &str, kind: &str) -> TargetMetadata {
        TargetMetadata {
            target_id: id.to_string(),
            target_name: id.to_uppercase(),
            target_type: kind.to_string(),
            target_altitude: None,
            target_location: None,
            spatial_region: None,
        }
    }

    fn catalog() -> MetadataCatalog {
        MetadataCatalog::from_records(vec![
            meta("volcano0010", "volcano"),
            meta("volcano0020", "volcano"),
            meta("la_basin", "city"),
        ])
    }

    fn obs(target: &str, day: u32) -> CatalogItem {
        let start = format!("2024-01-{:02}T00:00:00Z", day);
        CatalogItem::new(
            format!("oco3-co2_{}_2024-01-{:02}T000000Z_unfiltered_xco2", target, day),
            ItemProperties::with_interval(start.clone(), start),
        )
    }

    fn ids(items: &[CatalogItem]) -> Vec<&str> {
        items.iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn test_grouping() {
        let items = vec![
            obs("volcano0010", 3),
            obs("la_basin", 2),
            obs("volcano0010", 1),
            obs("volcano0020", 5),
            obs("la_basin", 4),
        ];
        let (index, report) = TargetIndex::build(items.clone(), catalog()).unwrap();

        assert_eq!(report.items, 5);
        assert_eq!(report.indexed, 5);
        assert_eq!(report.targets_created, 3);

        // every observation sits in the target its key names
        let mut total = 0;
        for target in index.targets() {
            for o in target.all().iter() {
                assert_eq!(derive_target_key(&o.id).unwrap(), target.id);
                total += 1;
            }
            // every target is in exactly one group, the one of its type
            let groups: Vec<_> = index
                .target_types()
                .into_iter()
                .filter(|t| index.group(t).unwrap().target_ids.contains(&target.id))
                .collect();
            assert_eq!(groups, vec![target.target_type.as_str()]);
        }
        assert_eq!(total, items.len());

        assert_eq!(index.target_types(), vec!["city", "volcano"]);
        let volcanoes: Vec<&str> = index
            .targets_of_type("volcano")
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(volcanoes, vec!["volcano0010", "volcano0020"]);
        assert!(index.targets_of_type("glacier").is_empty());
    }

    #[test]
    fn test_underscore_keys_stay_together() {
        let (index, _) =
            TargetIndex::build(vec![obs("la_basin", 2), obs("la_basin", 1)], catalog()).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.target("la_basin").unwrap().len(), 2);
        assert!(index.target("la").is_err());
    }

    #[test]
    fn test_missing_metadata_excluded() {
        let mut index = TargetIndex::new(catalog());
        let outcome = index.add_observation(obs("unknown7", 1)).unwrap();
        assert_eq!(
            outcome,
            AddOutcome::MissingMetadata {
                target_id: "unknown7".to_string()
            }
        );
        assert!(index.is_empty());
        assert!(index.target_types().is_empty());
        assert_eq!(
            index.get_all("unknown7").unwrap_err(),
            IndexError::TargetNotFound("unknown7".to_string())
        );

        let (_, report) =
            TargetIndex::build(vec![obs("unknown7", 1), obs("volcano0010", 1)], catalog()).unwrap();
        assert_eq!(report.missing_metadata, 1);
        assert!(report.unknown_targets.contains("unknown7"));
    }

    #[test]
    fn test_lazy_sort_through_index() {
        let mut index = TargetIndex::new(catalog());
        for day in [9, 3, 7, 1] {
            index.add_observation(obs("volcano0010", day)).unwrap();
        }
        assert_eq!(index.stats().unsorted_targets, 1);
        assert_eq!(
            index.representatives()[0].id,
            "oco3-co2_volcano0010_2024-01-01T000000Z_unfiltered_xco2"
        );

        let all = ids(index.get_all("volcano0010").unwrap()).join(",");
        assert!(all.starts_with("oco3-co2_volcano0010_2024-01-01"));
        assert_eq!(index.stats().unsorted_targets, 0);

        index.add_observation(obs("volcano0010", 2)).unwrap();
        assert_eq!(index.stats().unsorted_targets, 1);
        assert_eq!(
            index.get_representative("volcano0010").unwrap().id,
            "oco3-co2_volcano0010_2024-01-01T000000Z_unfiltered_xco2"
        );
        assert_eq!(index.get_all("volcano0010").unwrap()[1].id, obs("volcano0010", 2).id);
    }

    #[test]
    fn test_repeated_reads_are_stable() {
        let tie = |suffix: &str| {
            CatalogItem::new(
                format!("oco3-co2_volcano0010_2024-01-02T000000Z_{}_xco2", suffix),
                ItemProperties::with_interval("2024-01-02T00:00:00Z", "2024-01-02T00:00:00Z"),
            )
        };

        let mut index = TargetIndex::new(catalog());
        index.add_observation(tie("first")).unwrap();
        index.add_observation(obs("volcano0010", 5)).unwrap();
        index.add_observation(tie("second")).unwrap();

        let first_read: Vec<String> = ids(index.get_all("volcano0010").unwrap())
            .into_iter()
            .map(str::to_string)
            .collect();
        let second_read: Vec<String> = ids(index.get_all("volcano0010").unwrap())
            .into_iter()
            .map(str::to_string)
            .collect();
        assert_eq!(first_read, second_read);
        assert!(first_read[0].contains("_first_"));
        assert!(first_read[1].contains("_second_"));

        let rep = index.get_representative("volcano0010").unwrap().id.clone();
        assert_eq!(index.get_representative("volcano0010").unwrap().id, rep);

        // re-sorting after another tie keeps insertion order among equals
        index.add_observation(tie("third")).unwrap();
        index.sort_all();
        index.sort_all();
        let tied: Vec<&str> = ids(index.get_all("volcano0010").unwrap())
            .into_iter()
            .filter(|id| id.contains("2024-01-02"))
            .collect();
        assert_eq!(tied.len(), 3);
        assert!(tied[0].contains("_first_"));
        assert!(tied[1].contains("_second_"));
        assert!(tied[2].contains("_third_"));
        assert_eq!(index.get_representative("volcano0010").unwrap().id, rep);
    }

    #[test]
    fn test_malformed_policy() {
        let bad = CatalogItem::new("garbage", ItemProperties::default());

        let (_, report) = TargetIndex::build(vec![bad.clone(), obs("volcano0010", 1)], catalog()).unwrap();
        assert_eq!(report.malformed, 1);
        assert_eq!(report.indexed, 1);

        let err = TargetIndex::build_with_policy(vec![bad], catalog(), MalformedPolicy::Abort).unwrap_err();
        assert_eq!(err, IndexError::MalformedIdentifier("garbage".to_string()));
    }

    #[test]
    fn test_lookups() {
        let (index, _) = TargetIndex::build(
            vec![obs("volcano0010", 1), obs("la_basin", 2)],
            catalog(),
        )
        .unwrap();

        let la = obs("la_basin", 2).id;
        assert_eq!(index.get_by_id("la_basin", &la).unwrap().id, la);
        assert!(matches!(
            index.get_by_id("la_basin", "nope"),
            Err(IndexError::ObservationNotFound { .. })
        ));
        assert_eq!(index.find_observation(&la).unwrap().id, la);
        assert!(index.find_observation("oco3-co2_x_2024_f_m").is_err());

        assert_eq!(index.representatives_of_type("city").len(), 1);
        assert_eq!(index.stats().observations, 2);
    }

    #[test]
    fn test_target_id_property_routes_observation() {
        let props = ItemProperties::with_interval("2024-01-01T00:00:00Z", "2024-01-01T00:00:00Z")
            .set("target_id", serde_json::json!("la_basin"));
        let item = CatalogItem::new("oco3-co2_la_2024-01-01T000000Z_unfiltered_xco2", props);

        let mut index = TargetIndex::new(catalog());
        index.add_observation(item).unwrap();
        assert_eq!(index.target("la_basin").unwrap().len(), 1);
        // found through the fallback scan
        assert!(index
            .find_observation("oco3-co2_la_2024-01-01T000000Z_unfiltered_xco2")
            .is_ok());
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("abort".parse::<MalformedPolicy>().unwrap(), MalformedPolicy::Abort);
        assert!("maybe".parse::<MalformedPolicy>().is_err());
    }
}
