//! Cursor-linked page walker
//!
//! The catalog API pages with an opaque token that is only known once the
//! previous page has been read, so pages are fetched strictly one after the
//! other: request, consume, find `next`, repeat.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;

use super::error::{FetchError, FetchResult};
use super::transport::PageTransport;
use crate::stac::{CatalogItem, Link};

/// Page size requested when the URL does not carry one
pub const DEFAULT_PAGE_LIMIT: usize = 10_000;

/// One page of a collection-of-items or collection-of-collections response
#[derive(Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
struct Page<T> {
    #[serde(default)]
    features: Option<Vec<T>>,
    #[serde(default)]
    collections: Option<Vec<T>>,
    #[serde(default)]
    links: Vec<Link>,
}

impl<T> Page<T> {
    /// Move whichever array the page carries into `out`
    fn drain_into(&mut self, out: &mut Vec<T>) -> usize {
        let entries = self.features.take().or_else(|| self.collections.take());
        match entries {
            Some(entries) => {
                let n = entries.len();
                out.extend(entries);
                n
            }
            None => 0,
        }
    }

    fn next_href(&self) -> Option<String> {
        self.links
            .iter()
            .rev()
            .find(|l| l.is("next"))
            .map(|l| l.href.clone())
    }
}

/// Counters for one completed walk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchStats {
    pub pages: usize,
    pub entries: usize,
}

/// Result of a walk where failure was explicitly tolerated
///
/// Keeps "the collection is empty" and "the walk was aborted" apart even
/// when the caller ends up treating both as an empty list.
#[derive(Debug)]
pub enum FetchOutcome<T> {
    Complete(Vec<T>),
    Aborted(FetchError),
}

impl<T> FetchOutcome<T> {
    pub fn is_complete(&self) -> bool {
        matches!(self, FetchOutcome::Complete(_))
    }

    /// Items of a complete walk, or an empty list for an aborted one
    pub fn into_items(self) -> Vec<T> {
        match self {
            FetchOutcome::Complete(items) => items,
            FetchOutcome::Aborted(e) => {
                tracing::warn!(error = %e, "Fetch aborted, continuing with an empty result");
                Vec::new()
            }
        }
    }

    pub fn into_result(self) -> FetchResult<Vec<T>> {
        match self {
            FetchOutcome::Complete(items) => Ok(items),
            FetchOutcome::Aborted(e) => Err(e),
        }
    }
}

/// Walks a paginated catalog endpoint to the end
#[derive(Clone)]
pub struct PagedCollectionFetcher {
    transport: Arc<dyn PageTransport>,
    page_limit: usize,
}

impl PagedCollectionFetcher {
    pub fn new(transport: Arc<dyn PageTransport>) -> Self {
        Self {
            transport,
            page_limit: DEFAULT_PAGE_LIMIT,
        }
    }

    /// Builder: page size appended to URLs without a `limit`
    pub fn with_page_limit(mut self, page_limit: usize) -> Self {
        self.page_limit = page_limit.max(1);
        self
    }

    pub fn page_limit(&self) -> usize {
        self.page_limit
    }

    /// Fetch every entry reachable from `start_url`, in page order
    pub async fn fetch_all<T: DeserializeOwned>(&self, start_url: &str) -> FetchResult<Vec<T>> {
        self.fetch_all_with_stats(start_url)
            .await
            .map(|(entries, _)| entries)
    }

    /// Same as [`fetch_all`](Self::fetch_all), also returning walk counters
    pub async fn fetch_all_with_stats<T: DeserializeOwned>(
        &self,
        start_url: &str,
    ) -> FetchResult<(Vec<T>, FetchStats)> {
        let mut entries = Vec::new();
        let mut stats = FetchStats::default();
        let mut visited = HashSet::new();
        let mut next = Some(start_url.to_string());

        while let Some(url) = next.take() {
            let url = append_page_limit(&url, self.page_limit);
            if !visited.insert(url.clone()) {
                return Err(FetchError::PaginationCycle { url });
            }

            tracing::info!("fetching from --> {}", url);
            let response = self.transport.get(&url).await?;
            if !response.is_success() {
                return Err(FetchError::Status {
                    url,
                    status: response.status,
                });
            }

            let mut page: Page<T> =
                serde_json::from_str(&response.body).map_err(|e| FetchError::MalformedBody {
                    url: url.clone(),
                    reason: e.to_string(),
                })?;

            let n = page.drain_into(&mut entries);
            stats.pages += 1;
            stats.entries += n;
            tracing::info!("fetching from --> {} Complete. ({} entries)", url, n);

            next = page.next_href();
        }

        tracing::debug!(pages = stats.pages, entries = stats.entries, "Walk finished");
        Ok((entries, stats))
    }

    /// Fetch, converting a failure into [`FetchOutcome::Aborted`]
    pub async fn fetch_all_or_empty<T: DeserializeOwned>(&self, start_url: &str) -> FetchOutcome<T> {
        match self.fetch_all(start_url).await {
            Ok(entries) => FetchOutcome::Complete(entries),
            Err(e) => {
                tracing::error!(error = %e, "Error fetching data from {}", start_url);
                FetchOutcome::Aborted(e)
            }
        }
    }

    /// Typed convenience for item collections
    pub async fn fetch_items(&self, start_url: &str) -> FetchResult<Vec<CatalogItem>> {
        self.fetch_all(start_url).await
    }
}

/// Add `limit=<n>` unless the URL already has one
///
/// Uses `&` when a query string (e.g. a pagination token) is present,
/// `?` otherwise.
pub fn append_page_limit(url: &str, limit: usize) -> String {
    let query = url.split_once('?').map(|(_, q)| q);

    let has_limit = query
        .map(|q| q.split('&').any(|kv| kv.split('=').next() == Some("limit")))
        .unwrap_or(false);
    if has_limit {
        return url.to_string();
    }

    let sep = match query {
        None => "?",
        Some(q) if q.is_empty() || q.ends_with('&') => "",
        Some(_) => "&",
    };
    format!("{}{}limit={}", url, sep, limit)
}
