//! Structured spatial query values.
//!
//! Filters are built as data rather than SQL text so they can be inspected,
//! compared in tests, rendered with bound parameters, or evaluated directly.

use serde::Serialize;

use crate::models::{BoundingBox, GeoPoint, Geography, TableRef};
use crate::store::RowId;

/// An operand that evaluates to a geography value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GeogExpr {
    /// Geography column of the row under test
    Column { name: String },
    /// Serialized geography passed through to the store
    Literal { value: Geography },
    /// Point built from raw coordinates under WGS84
    MakePoint { lng: f64, lat: f64 },
    /// Axis-aligned envelope under WGS84
    Envelope { bbox: BoundingBox },
}

impl GeogExpr {
    pub fn column(name: impl Into<String>) -> Self {
        GeogExpr::Column { name: name.into() }
    }

    pub fn literal(value: Geography) -> Self {
        GeogExpr::Literal { value }
    }

    pub fn point(point: GeoPoint) -> Self {
        GeogExpr::MakePoint {
            lng: point.lng,
            lat: point.lat,
        }
    }

    pub fn envelope(bbox: BoundingBox) -> Self {
        GeogExpr::Envelope { bbox }
    }
}

/// Boolean spatial test between two geography operands.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Predicate {
    /// Great-circle distance between the operands is at most `meters`
    DWithin {
        left: GeogExpr,
        right: GeogExpr,
        meters: f64,
    },
    /// `container` covers `contained`, boundary included
    Covers {
        container: GeogExpr,
        contained: GeogExpr,
    },
    Intersects { left: GeogExpr, right: GeogExpr },
}

impl Predicate {
    /// Both operands, in rendering order
    pub fn operands(&self) -> (&GeogExpr, &GeogExpr) {
        match self {
            Predicate::DWithin { left, right, .. } => (left, right),
            Predicate::Covers {
                container,
                contained,
            } => (container, contained),
            Predicate::Intersects { left, right } => (left, right),
        }
    }
}

/// Ascending order by great-circle distance between two operands.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistanceOrder {
    pub left: GeogExpr,
    pub right: GeogExpr,
}

/// Row filter over a target table, with optional distance ordering and limit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpatialQuery {
    pub table: TableRef,
    pub predicate: Predicate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<DistanceOrder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

/// Query delegated to the store that yields one value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScalarQuery {
    /// Evaluate a predicate over constant operands
    Test { predicate: Predicate },
    /// Union the shapes of the given rows, then simplify preserving topology
    UnionSimplify {
        table: TableRef,
        ids: Vec<RowId>,
        tolerance: f64,
    },
    /// Distance in meters from a row's point to another geography
    Distance {
        table: TableRef,
        id: RowId,
        other: GeogExpr,
    },
    /// Area in square meters of a row's shape
    Area { table: TableRef, id: RowId },
}
