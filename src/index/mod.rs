//! Target Index
//!
//! Groups catalog observations by the logical target they observe and keeps
//! each target's timeline ready for range queries:
//!
//! - **key**: target key derivation from observation ids
//! - **metadata**: per-target records (name, type, location)
//! - **target**: one target with its lazily sorted timeline
//! - **target_index**: the partition, type groups and lookups
//!
//! # Architecture
//!
//! ```text
//! snapshot features ──► TargetIndex::build ──► targets: key → Target (sorted timeline)
//!                                          └─► groups:  type → [key, ...]
//!
//! marker view:   representatives()              one item per target
//! click:         get_all(target_id)             full timeline
//! time filter:   range::filter_by_range(...)    O(log n) sub-slice
//! ```

mod error;
mod key;
mod metadata;
mod target;
mod target_index;

pub use error::{IndexError, IndexResult};
pub use key::{derive_target_key, legacy_target_key, resolve_target_key};
pub use metadata::{MetadataCatalog, TargetMetadata};
pub use target::{timeline_key, Target, TargetSummary};
pub use target_index::{
    AddOutcome, BuildReport, IndexStats, MalformedPolicy, TargetIndex, TargetTypeGroup,
};
