//! Spatial predicate construction.
//!
//! Turns a location or shape plus numeric parameters into [`SpatialQuery`]
//! and [`ScalarQuery`] values. Nothing here touches the store.

use tracing::debug;

use super::expr::{DistanceOrder, GeogExpr, Predicate, ScalarQuery, SpatialQuery};
use crate::models::{BoundingBox, GeoPoint, Geography, SearchEntity, SearchLocation, TableRef};
use crate::store::RowId;

/// Radius used when a caller does not supply one, in meters.
pub const DEFAULT_RADIUS_METERS: f64 = 10_000.0;

/// Tolerance handed to the store's topology-preserving simplify after a union.
pub const UNION_SIMPLIFY_TOLERANCE: f64 = 0.0001;

/// Builds spatial filters against a configured target table.
#[derive(Debug, Clone)]
pub struct SpatialPredicateBuilder {
    target: TableRef,
    default_radius: f64,
}

impl SpatialPredicateBuilder {
    pub fn new(target: TableRef) -> Self {
        Self {
            target,
            default_radius: DEFAULT_RADIUS_METERS,
        }
    }

    pub fn with_default_radius(mut self, meters: f64) -> Self {
        self.default_radius = meters;
        self
    }

    pub fn target(&self) -> &TableRef {
        &self.target
    }

    pub fn default_radius(&self) -> f64 {
        self.default_radius
    }

    fn target_point(&self) -> GeogExpr {
        GeogExpr::column(&self.target.point_column)
    }

    /// Reference point for a location, or `None` when it is unknown.
    pub fn reference(location: &SearchLocation) -> Option<GeogExpr> {
        match location {
            SearchLocation::Geography(geog) => Some(GeogExpr::literal(geog.clone())),
            SearchLocation::Coordinates { lat, lng } => Some(GeogExpr::MakePoint {
                lng: *lng,
                lat: *lat,
            }),
            SearchLocation::Unknown => None,
        }
    }

    fn filter(&self, predicate: Predicate) -> SpatialQuery {
        SpatialQuery {
            table: self.target.clone(),
            predicate,
            order_by: None,
            limit: None,
        }
    }

    /// Target points within `radius` meters of the location.
    ///
    /// Returns `None` for [`SearchLocation::Unknown`].
    pub fn radius_filter(
        &self,
        location: &SearchLocation,
        radius: Option<f64>,
    ) -> Option<SpatialQuery> {
        let Some(reference) = Self::reference(location) else {
            debug!("No location available, skipping radius filter");
            return None;
        };
        Some(self.filter(Predicate::DWithin {
            left: self.target_point(),
            right: reference,
            meters: radius.unwrap_or(self.default_radius),
        }))
    }

    /// The single closest target point within `radius` meters.
    ///
    /// Same filter as [`radius_filter`](Self::radius_filter), ordered by
    /// ascending distance and limited to one row. Order among exact ties is
    /// whatever the store produces.
    pub fn nearest_filter(
        &self,
        location: &SearchLocation,
        radius: Option<f64>,
    ) -> Option<SpatialQuery> {
        let mut query = self.radius_filter(location, radius)?;
        let (left, right) = query.predicate.operands();
        query.order_by = Some(DistanceOrder {
            left: left.clone(),
            right: right.clone(),
        });
        query.limit = Some(1);
        Some(query)
    }

    /// Target points covered by `shape`, boundary included.
    pub fn shape_containment_filter(&self, shape: &Geography) -> SpatialQuery {
        self.filter(Predicate::Covers {
            container: GeogExpr::literal(shape.clone()),
            contained: self.target_point(),
        })
    }

    /// Target points covered by the envelope, boundary included.
    pub fn bounding_box_filter(&self, bbox: BoundingBox) -> SpatialQuery {
        self.filter(Predicate::Covers {
            container: GeogExpr::envelope(bbox),
            contained: self.target_point(),
        })
    }

    /// Does `shape` intersect the inset envelope of `bbox`?
    pub fn bounding_box_contains_query(shape: &Geography, bbox: BoundingBox) -> ScalarQuery {
        ScalarQuery::Test {
            predicate: Predicate::Intersects {
                left: GeogExpr::envelope(bbox.inset()),
                right: GeogExpr::literal(shape.clone()),
            },
        }
    }

    /// Is `point` within `radius` meters of the inset envelope of `bbox`?
    pub fn bounding_box_within_radius_query(
        point: GeoPoint,
        radius: f64,
        bbox: BoundingBox,
    ) -> ScalarQuery {
        ScalarQuery::Test {
            predicate: Predicate::DWithin {
                left: GeogExpr::envelope(bbox.inset()),
                right: GeogExpr::point(point),
                meters: radius,
            },
        }
    }

    pub fn union_simplify_query(source: &TableRef, ids: &[RowId]) -> ScalarQuery {
        ScalarQuery::UnionSimplify {
            table: source.clone(),
            ids: ids.to_vec(),
            tolerance: UNION_SIMPLIFY_TOLERANCE,
        }
    }

    /// Distance from the entity's stored point to `other`.
    ///
    /// `None` when the entity has no stored geography point.
    pub fn distance_query(entity: &SearchEntity, other: GeoPoint) -> Option<ScalarQuery> {
        if !entity.has_geography_point() {
            return None;
        }
        Some(ScalarQuery::Distance {
            table: entity.source.clone(),
            id: entity.id,
            other: GeogExpr::point(other),
        })
    }

    pub fn area_query(entity: &SearchEntity) -> ScalarQuery {
        ScalarQuery::Area {
            table: entity.source.clone(),
            id: entity.id,
        }
    }
}
