//! Paged Collection Fetcher
//!
//! Retrieves a complete, unbounded catalog collection from an API that only
//! offers cursor-linked pagination.
//!
//! ```text
//! GET items?limit=N ──► page 1 ──► links[rel=next] ──► GET page 2 ──► ... ──► no next: done
//! ```
//!
//! - **pager**: the sequential walk, URL normalization, lenient outcome
//! - **transport**: the GET seam and its reqwest implementation
//! - **error**: fetch errors

pub mod error;
pub mod pager;
pub mod transport;

pub use error::{FetchError, FetchResult};
pub use pager::{append_page_limit, FetchOutcome, FetchStats, PagedCollectionFetcher, DEFAULT_PAGE_LIMIT};
pub use transport::{HttpTransport, HttpTransportConfig, PageResponse, PageTransport};
