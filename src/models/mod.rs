//! Core data models for spatial search.

pub mod bbox;
pub mod geography;
pub mod location;

pub use bbox::BoundingBox;
pub use geography::{GeoPoint, Geography, WGS84_SRID};
pub use location::{SearchEntity, SearchLocation, TableRef};
