//! Geoscope - spatial predicate construction for geography-enabled stores
//!
//! Builds radius, nearest-neighbour, shape and bounding-box filters as
//! structured queries, renders them as parameterized SQL, and provides the
//! averaged-Cartesian spherical centroid.

pub mod centroid;
pub mod config;
pub mod error;
pub mod models;
pub mod query;
pub mod store;
pub mod units;

pub use centroid::spherical_centroid;
pub use error::{Error, Result};
pub use models::{BoundingBox, GeoPoint, Geography, SearchEntity, SearchLocation, TableRef};
pub use query::{SpatialOps, SpatialPredicateBuilder};
pub use store::{MemoryStore, SpatialStore};
