//! Spatial query construction and execution.

mod builder;
mod expr;
mod ops;
mod sql;

pub use builder::{SpatialPredicateBuilder, DEFAULT_RADIUS_METERS, UNION_SIMPLIFY_TOLERANCE};
pub use expr::{DistanceOrder, GeogExpr, Predicate, ScalarQuery, SpatialQuery};
pub use ops::SpatialOps;
pub use sql::{quote_ident, SqlParam, Statement};
