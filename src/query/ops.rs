//! Operations that hand built queries to a store and interpret the answer.

use tracing::debug;

use super::builder::SpatialPredicateBuilder;
use super::expr::{ScalarQuery, SpatialQuery};
use crate::error::{Error, Result};
use crate::models::{BoundingBox, GeoPoint, Geography, SearchEntity, TableRef};
use crate::store::{RowId, ScalarValue, SpatialStore};
use crate::units::{meters_to_miles, square_meters_to_square_miles};

/// A predicate builder paired with the store that executes its output.
pub struct SpatialOps<S> {
    builder: SpatialPredicateBuilder,
    store: S,
}

impl<S: SpatialStore> SpatialOps<S> {
    pub fn new(builder: SpatialPredicateBuilder, store: S) -> Self {
        Self { builder, store }
    }

    pub fn builder(&self) -> &SpatialPredicateBuilder {
        &self.builder
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run a filter built elsewhere.
    pub async fn execute(&self, query: &SpatialQuery) -> Result<Vec<RowId>> {
        debug!("Spatial filter: {}", query.to_statement());
        Ok(self.store.select_ids(query).await?)
    }

    async fn scalar(&self, query: &ScalarQuery) -> Result<ScalarValue> {
        debug!("Scalar query: {}", query.to_statement());
        Ok(self.store.scalar(query).await?)
    }

    async fn scalar_bool(&self, query: &ScalarQuery) -> Result<bool> {
        match self.scalar(query).await? {
            ScalarValue::Bool(b) => Ok(b),
            // NULL from a predicate means the test did not hold
            ScalarValue::Null => Ok(false),
            other => Err(Error::UnexpectedScalar {
                expected: "bool",
                found: other.type_name(),
            }),
        }
    }

    async fn scalar_f64(&self, query: &ScalarQuery) -> Result<Option<f64>> {
        match self.scalar(query).await? {
            ScalarValue::Float(v) => Ok(Some(v)),
            ScalarValue::Null => Ok(None),
            other => Err(Error::UnexpectedScalar {
                expected: "float",
                found: other.type_name(),
            }),
        }
    }

    /// Target rows within `radius` meters (default radius when `None`).
    ///
    /// `Ok(None)` when the entity has no location to search from.
    pub async fn find_within_radius(
        &self,
        entity: &SearchEntity,
        radius: Option<f64>,
    ) -> Result<Option<Vec<RowId>>> {
        match self.builder.radius_filter(&entity.location, radius) {
            Some(query) => Ok(Some(self.execute(&query).await?)),
            None => Ok(None),
        }
    }

    /// The closest target row within `radius` meters, as a list of at most one id.
    ///
    /// `Ok(None)` when the entity has no location to search from.
    pub async fn find_nearest(
        &self,
        entity: &SearchEntity,
        radius: Option<f64>,
    ) -> Result<Option<Vec<RowId>>> {
        match self.builder.nearest_filter(&entity.location, radius) {
            Some(query) => Ok(Some(self.execute(&query).await?)),
            None => Ok(None),
        }
    }

    pub async fn find_in_shape(&self, shape: &Geography) -> Result<Vec<RowId>> {
        self.execute(&self.builder.shape_containment_filter(shape))
            .await
    }

    pub async fn find_in_bounding_box(&self, bbox: BoundingBox) -> Result<Vec<RowId>> {
        self.execute(&self.builder.bounding_box_filter(bbox)).await
    }

    /// Whether `shape` intersects the 10%-inset envelope of `bbox`.
    pub async fn bounding_box_contains(&self, shape: &Geography, bbox: BoundingBox) -> Result<bool> {
        let query = SpatialPredicateBuilder::bounding_box_contains_query(shape, bbox);
        self.scalar_bool(&query).await
    }

    /// Whether `point` lies within `radius` meters of the 10%-inset envelope of `bbox`.
    pub async fn bounding_box_within_radius(
        &self,
        point: GeoPoint,
        radius: f64,
        bbox: BoundingBox,
    ) -> Result<bool> {
        let query = SpatialPredicateBuilder::bounding_box_within_radius_query(point, radius, bbox);
        self.scalar_bool(&query).await
    }

    /// Union of the shapes stored for `ids` in `source`, simplified by the store.
    ///
    /// `None` when no listed row has a shape.
    pub async fn union_simplify(
        &self,
        source: &TableRef,
        ids: &[RowId],
    ) -> Result<Option<Geography>> {
        let query = SpatialPredicateBuilder::union_simplify_query(source, ids);
        match self.scalar(&query).await? {
            ScalarValue::Text(text) => Ok(Some(Geography::new(text))),
            ScalarValue::Null => Ok(None),
            other => Err(Error::UnexpectedScalar {
                expected: "text",
                found: other.type_name(),
            }),
        }
    }

    /// Great-circle distance in miles from the entity's stored point to `other`.
    ///
    /// `None` when the entity has no stored geography point.
    pub async fn distance_between(
        &self,
        entity: &SearchEntity,
        other: GeoPoint,
    ) -> Result<Option<f64>> {
        let Some(query) = SpatialPredicateBuilder::distance_query(entity, other) else {
            return Ok(None);
        };
        Ok(self.scalar_f64(&query).await?.map(meters_to_miles))
    }

    /// Area of the entity's stored shape in square miles.
    pub async fn area_of_shape(&self, entity: &SearchEntity) -> Result<Option<f64>> {
        let query = SpatialPredicateBuilder::area_query(entity);
        Ok(self
            .scalar_f64(&query)
            .await?
            .map(square_meters_to_square_miles))
    }
}
