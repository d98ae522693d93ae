//! How a searching entity knows where it is, and where its rows live.

use serde::{Deserialize, Serialize};

use super::{GeoPoint, Geography};
use crate::store::RowId;

/// Table and column names used to scope store queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableRef {
    pub table: String,
    pub id_column: String,
    /// Geography point column
    pub point_column: String,
    /// Geography polygon/multipolygon column
    pub shape_column: String,
}

impl TableRef {
    /// A table using the conventional `id`, `geog_point` and `geog_shape` columns
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }
}

impl Default for TableRef {
    fn default() -> Self {
        Self {
            table: String::new(),
            id_column: "id".to_string(),
            point_column: "geog_point".to_string(),
            shape_column: "geog_shape".to_string(),
        }
    }
}

/// Location representation available on a searching entity.
///
/// Decided once from the entity's attributes; predicate construction matches
/// on it instead of probing attributes per call.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchLocation {
    /// Stored geography point
    Geography(Geography),
    /// Raw numeric columns
    Coordinates { lat: f64, lng: f64 },
    /// Neither is populated; nothing can be searched
    Unknown,
}

impl SearchLocation {
    /// Pick the representation from optional entity attributes.
    ///
    /// A stored geography point wins over raw coordinates. Coordinates count
    /// only when both halves are present.
    pub fn from_attributes(
        geog_point: Option<Geography>,
        lat: Option<f64>,
        lng: Option<f64>,
    ) -> Self {
        match (geog_point, lat, lng) {
            (Some(geog), _, _) => Self::Geography(geog),
            (None, Some(lat), Some(lng)) => Self::Coordinates { lat, lng },
            _ => Self::Unknown,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl From<GeoPoint> for SearchLocation {
    fn from(point: GeoPoint) -> Self {
        Self::Coordinates {
            lat: point.lat,
            lng: point.lng,
        }
    }
}

/// The "searching" side of a query: a row in some table with a location.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchEntity {
    pub source: TableRef,
    pub id: RowId,
    pub location: SearchLocation,
}

impl SearchEntity {
    pub fn new(source: TableRef, id: RowId, location: SearchLocation) -> Self {
        Self {
            source,
            id,
            location,
        }
    }

    /// Whether the entity carries a stored geography point
    pub fn has_geography_point(&self) -> bool {
        matches!(self.location, SearchLocation::Geography(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geography_wins_over_coordinates() {
        let location = SearchLocation::from_attributes(
            Some(Geography::new("POINT(1 2)")),
            Some(2.0),
            Some(1.0),
        );
        assert_eq!(location, SearchLocation::Geography(Geography::new("POINT(1 2)")));
    }

    #[test]
    fn test_coordinates_need_both_halves() {
        assert_eq!(
            SearchLocation::from_attributes(None, Some(2.0), Some(1.0)),
            SearchLocation::Coordinates { lat: 2.0, lng: 1.0 }
        );
        assert_eq!(
            SearchLocation::from_attributes(None, Some(2.0), None),
            SearchLocation::Unknown
        );
        assert!(!SearchLocation::from_attributes(None, None, None).is_known());
    }

    #[test]
    fn test_table_ref_defaults() {
        let table = TableRef::new("places");
        assert_eq!(table.table, "places");
        assert_eq!(table.id_column, "id");
        assert_eq!(table.point_column, "geog_point");
        assert_eq!(table.shape_column, "geog_shape");
    }
}
