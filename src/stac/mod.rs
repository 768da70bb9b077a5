//! STAC Catalog Model
//!
//! Typed view of the catalog documents this crate consumes and produces:
//!
//! - **types**: CatalogItem, Link, Asset, raster statistics, GeoJSON geometry
//! - **properties**: the open `properties` bag with typed, fallible accessors
//! - **error**: property access errors
//!
//! Unknown members are kept in `extra` maps so an item survives
//! fetch → snapshot → load without losing fields.

pub mod error;
pub mod properties;
pub mod types;

pub use error::{PropertyError, PropertyResult};
pub use properties::{parse_timestamp, ItemProperties};
pub use types::{Asset, CatalogItem, Geometry, Histogram, Link, Position, RasterBand, Statistics};
