//! Deploy-time data loading
//!
//! Turns the configured artifacts (snapshot, optional metadata side file,
//! optional coverage, optional plume snapshot and metadata) into the
//! in-memory structures the API and the inspector query.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::IndexConfig;
use crate::coverage::{CoverageCollection, CoverageError};
use crate::index::{BuildReport, IndexError, MalformedPolicy, MetadataCatalog, TargetIndex};
use crate::plumes::{PlumeCollection, PlumeError, PlumeMetadata};
use crate::snapshot::{load_snapshot, SnapshotError};
use crate::stac::CatalogItem;

/// Errors from loading a dataset
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Coverage(#[from] CoverageError),

    #[error(transparent)]
    Plume(#[from] PlumeError),

    /// The loading task panicked or was cancelled
    #[error("Load task failed: {0}")]
    Task(String),
}

/// Everything loaded from one snapshot
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub index: TargetIndex,
    pub coverage: CoverageCollection,
    pub plumes: PlumeCollection,
    pub report: BuildReport,
    pub source: PathBuf,
}

impl Dataset {
    /// Load the configured artifacts and build the index
    pub fn load(config: &IndexConfig) -> Result<Self, DatasetError> {
        let source = PathBuf::from(&config.snapshot_path);
        let features = load_snapshot(&source)?.into_features();

        let side_file = config.metadata_path.as_deref().map(Path::new);
        let catalog = metadata_catalog(side_file, config.harvest_metadata, &features)?;

        let coverage = match &config.coverage_path {
            Some(path) => CoverageCollection::load(Path::new(path))?,
            None => CoverageCollection::default(),
        };

        let plumes = load_plumes(
            config.plume_snapshot_path.as_deref().map(Path::new),
            config.plume_metadata_path.as_deref().map(Path::new),
        )?;

        let mut dataset = Self::from_items(features, catalog, config.malformed)?;
        dataset.coverage = coverage;
        dataset.plumes = plumes;
        dataset.source = source;
        Ok(dataset)
    }

    /// Build from items already in memory
    pub fn from_items(
        items: Vec<CatalogItem>,
        catalog: MetadataCatalog,
        policy: MalformedPolicy,
    ) -> Result<Self, DatasetError> {
        let (index, report) = TargetIndex::build_with_policy(items, catalog, policy)?;
        Ok(Self {
            index,
            coverage: CoverageCollection::default(),
            plumes: PlumeCollection::default(),
            report,
            source: PathBuf::new(),
        })
    }
}

/// Join the plume snapshot with its metadata
///
/// Without a snapshot there are no plumes; without metadata every plume
/// keeps empty plume properties.
pub fn load_plumes(
    snapshot: Option<&Path>,
    metadata: Option<&Path>,
) -> Result<PlumeCollection, DatasetError> {
    let Some(snapshot) = snapshot else {
        if metadata.is_some() {
            tracing::warn!("Plume metadata configured without a plume snapshot; ignoring it");
        }
        return Ok(PlumeCollection::default());
    };

    let items = load_snapshot(snapshot)?.into_features();
    let metadata = match metadata {
        Some(path) => PlumeMetadata::load(path)?,
        None => {
            tracing::warn!(snapshot = %snapshot.display(), "No plume metadata configured");
            PlumeMetadata::new()
        }
    };
    Ok(PlumeCollection::join(items, &metadata))
}

/// Side-file records first, then harvested records for the remaining targets
pub fn metadata_catalog(
    side_file: Option<&Path>,
    harvest: bool,
    items: &[CatalogItem],
) -> Result<MetadataCatalog, IndexError> {
    let mut catalog = match side_file {
        Some(path) => MetadataCatalog::load(path)?,
        None => MetadataCatalog::new(),
    };
    if harvest {
        catalog.merge(MetadataCatalog::harvest(items));
    }
    if catalog.is_empty() {
        tracing::warn!("No target metadata available; every observation will be skipped");
    }
    Ok(catalog)
}
