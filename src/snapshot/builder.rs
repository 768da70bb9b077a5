//! Snapshot builder
//!
//! Fetches one named collection end-to-end and persists it as a single
//! artifact at `<output_dir>/<collection_id>.json`. The write goes to a temp
//! file in the output directory first and is renamed into place, so readers
//! only ever see a complete snapshot.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tokio::task::JoinSet;

use super::envelope::{envelope_links, CollectionSnapshot};
use super::error::{SnapshotError, SnapshotResult};
use crate::fetch::PagedCollectionFetcher;
use crate::stac::CatalogItem;

/// Collection snapshotted when none is named
pub const DEFAULT_COLLECTION_ID: &str = "oco3-co2-sams-daygrid-v11r";

/// What to do when the collection walk aborts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OnFetchFailure {
    /// Propagate the error; nothing is written
    #[default]
    Abort,
    /// Log the abort and write an empty snapshot
    WriteEmpty,
}

impl FromStr for OnFetchFailure {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "abort" => Ok(OnFetchFailure::Abort),
            "write-empty" => Ok(OnFetchFailure::WriteEmpty),
            other => Err(format!(
                "unknown failure policy '{}' (expected 'abort' or 'write-empty')",
                other
            )),
        }
    }
}

impl fmt::Display for OnFetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OnFetchFailure::Abort => write!(f, "abort"),
            OnFetchFailure::WriteEmpty => write!(f, "write-empty"),
        }
    }
}

/// Where to read from and where to write to
#[derive(Debug, Clone)]
pub struct SnapshotOptions {
    /// Base URL of the catalog API
    pub stac_api_url: String,
    /// Base URL used for the envelope's `self` link
    pub self_link_base: String,
    /// Directory receiving `<collection_id>.json`
    pub output_dir: PathBuf,
    pub on_failure: OnFetchFailure,
}

/// Builds and persists collection snapshots
#[derive(Clone)]
pub struct SnapshotBuilder {
    fetcher: PagedCollectionFetcher,
    options: SnapshotOptions,
}

impl SnapshotBuilder {
    pub fn new(fetcher: PagedCollectionFetcher, options: SnapshotOptions) -> Self {
        Self { fetcher, options }
    }

    pub fn options(&self) -> &SnapshotOptions {
        &self.options
    }

    /// `<stac_api_url>/collections/<id>/items`
    pub fn items_url(&self, collection_id: &str) -> String {
        format!(
            "{}/collections/{}/items",
            self.options.stac_api_url.trim_end_matches('/'),
            urlencoding::encode(collection_id)
        )
    }

    /// Artifact path for a collection
    pub fn output_path(&self, collection_id: &str) -> SnapshotResult<PathBuf> {
        validate_collection_id(collection_id)?;
        Ok(self.options.output_dir.join(format!("{}.json", collection_id)))
    }

    /// Fetch the whole collection and wrap it in an envelope
    pub async fn build(&self, collection_id: &str) -> SnapshotResult<CollectionSnapshot> {
        let url = self.items_url(collection_id);

        let features: Vec<CatalogItem> = match self.options.on_failure {
            OnFetchFailure::Abort => self.fetcher.fetch_items(&url).await?,
            OnFetchFailure::WriteEmpty => {
                let outcome = self.fetcher.fetch_all_or_empty(&url).await;
                if !outcome.is_complete() {
                    tracing::warn!(
                        collection = collection_id,
                        "Collection walk aborted, writing an empty snapshot"
                    );
                }
                outcome.into_items()
            }
        };

        let links = envelope_links(
            &self.options.stac_api_url,
            &self.options.self_link_base,
            collection_id,
        );

        tracing::info!(collection = collection_id, items = features.len(), "Snapshot built");
        Ok(CollectionSnapshot::new(links, features))
    }

    /// Persist a snapshot atomically, returning its path
    pub fn write(&self, snapshot: &CollectionSnapshot, collection_id: &str) -> SnapshotResult<PathBuf> {
        let dir = &self.options.output_dir;
        let path = self.output_path(collection_id)?;

        std::fs::create_dir_all(dir).map_err(|source| write_error(dir, source))?;

        let json = serde_json::to_string_pretty(snapshot)?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(|source| write_error(dir, source))?;
        tmp.write_all(json.as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|source| write_error(tmp.path(), source))?;
        tmp.persist(&path)
            .map_err(|e| write_error(&path, e.error))?;

        tracing::info!(path = %path.display(), bytes = json.len(), "Snapshot written");
        Ok(path)
    }

    /// Build and write one collection
    pub async fn run(&self, collection_id: &str) -> SnapshotResult<PathBuf> {
        validate_collection_id(collection_id)?;
        let snapshot = self.build(collection_id).await?;
        self.write(&snapshot, collection_id)
    }

    /// Snapshot several collections concurrently
    ///
    /// Each collection is still walked page by page; only distinct
    /// collections overlap. Results come back in input order.
    pub async fn run_many(&self, collection_ids: &[String]) -> Vec<(String, SnapshotResult<PathBuf>)> {
        let mut tasks = JoinSet::new();
        for (i, id) in collection_ids.iter().enumerate() {
            let builder = self.clone();
            let id = id.clone();
            tasks.spawn(async move {
                let result = builder.run(&id).await;
                (i, result)
            });
        }

        let mut results: Vec<Option<SnapshotResult<PathBuf>>> =
            collection_ids.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((i, result)) => results[i] = Some(result),
                Err(e) => tracing::error!(error = %e, "Snapshot task failed"),
            }
        }

        collection_ids
            .iter()
            .cloned()
            .zip(results)
            .map(|(id, result)| {
                let result = result
                    .unwrap_or_else(|| Err(SnapshotError::Task(format!("no result for {}", id))));
                (id, result)
            })
            .collect()
    }
}

/// A collection id names exactly one file inside the output directory
pub fn validate_collection_id(collection_id: &str) -> SnapshotResult<()> {
    let invalid = collection_id.is_empty()
        || collection_id == "."
        || collection_id.contains("..")
        || collection_id.contains(['/', '\\', '\0']);
    if invalid {
        return Err(SnapshotError::InvalidCollectionId(collection_id.to_string()));
    }
    Ok(())
}

fn write_error(path: &Path, source: std::io::Error) -> SnapshotError {
    SnapshotError::Write {
        path: path.to_path_buf(),
        source,
    }
}
