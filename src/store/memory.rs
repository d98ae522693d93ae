//! In-process spatial store.
//!
//! Evaluates [`SpatialQuery`] and [`ScalarQuery`] values directly with the
//! `geo` crate so filters can be exercised without a database. Distances are
//! great-circle on a spherical earth; areas are geodesic. Envelopes and
//! polygon edges are treated as straight lines in lng/lat, and the union
//! result is returned without simplification.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::str::FromStr;

use anyhow::Context;
use geo::{
    BooleanOps, BoundingRect, Closest, ClosestPoint, CoordsIter, GeodesicArea, Geometry,
    Intersects, LineString, MultiPolygon, Point, Polygon, Relate,
};
use serde::Deserialize;
use tracing::{debug, info};
use wkt::ToWkt;

use super::index::ColumnIndex;
use super::{RowId, ScalarValue, SpatialStore, StoreError};
use crate::models::{BoundingBox, Geography, SearchEntity, SearchLocation, TableRef};
use crate::query::{GeogExpr, Predicate, ScalarQuery, SpatialQuery};

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// One row as supplied by a caller or a JSON fixture.
///
/// `lat`/`lng` are raw numeric coordinates. Every other field besides `id`
/// is a geography column; `null` means NULL.
#[derive(Debug, Clone, Deserialize)]
pub struct RowRecord {
    pub id: RowId,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(flatten)]
    pub columns: BTreeMap<String, Option<Geography>>,
}

impl RowRecord {
    pub fn new(id: RowId) -> Self {
        Self {
            id,
            lat: None,
            lng: None,
            columns: BTreeMap::new(),
        }
    }

    pub fn with_coordinates(mut self, lat: f64, lng: f64) -> Self {
        self.lat = Some(lat);
        self.lng = Some(lng);
        self
    }

    pub fn with(mut self, column: &str, value: impl Into<Geography>) -> Self {
        self.columns.insert(column.to_string(), Some(value.into()));
        self
    }
}

struct MemoryRow {
    id: RowId,
    lat: Option<f64>,
    lng: Option<f64>,
    columns: HashMap<String, Geometry<f64>>,
}

#[derive(Default)]
struct MemoryTable {
    rows: Vec<MemoryRow>,
    indexes: HashMap<String, ColumnIndex>,
}

impl MemoryTable {
    fn row_by_id(&self, id: RowId) -> Option<&MemoryRow> {
        self.rows.iter().find(|row| row.id == id)
    }
}

/// Spatial store held entirely in memory.
#[derive(Default)]
pub struct MemoryStore {
    tables: HashMap<String, MemoryTable>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a row, parsing its geography columns.
    pub fn insert(&mut self, table: &str, record: RowRecord) -> Result<(), StoreError> {
        let mut columns = HashMap::new();
        for (name, value) in record.columns {
            if let Some(geog) = value {
                columns.insert(name, parse_geography(&geog)?);
            }
        }

        let table = self.tables.entry(table.to_string()).or_default();
        let slot = table.rows.len();
        for (name, geometry) in &columns {
            table
                .indexes
                .entry(name.clone())
                .or_default()
                .insert(slot, geometry);
        }
        table.rows.push(MemoryRow {
            id: record.id,
            lat: record.lat,
            lng: record.lng,
            columns,
        });
        Ok(())
    }

    /// Load tables from a JSON object of `{ "<table>": [ {"id": 1, ...}, ... ] }`.
    pub fn load_json<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixture {}", path.display()))?;
        let tables: BTreeMap<String, Vec<RowRecord>> =
            serde_json::from_str(&content).context("Failed to parse fixture JSON")?;

        let mut store = Self::new();
        for (table, rows) in tables {
            let count = rows.len();
            for record in rows {
                let id = record.id;
                store
                    .insert(&table, record)
                    .with_context(|| format!("Invalid row {} in table {}", id, table))?;
            }
            info!("Loaded {} rows into {}", count, table);
        }
        Ok(store)
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.tables.get(table).map(|t| t.rows.len()).unwrap_or(0)
    }

    /// Entity view of a stored row. The point column wins over raw `lat`/`lng`.
    pub fn entity(&self, source: &TableRef, id: RowId) -> Option<SearchEntity> {
        let row = self.tables.get(&source.table)?.row_by_id(id)?;
        let point = row
            .columns
            .get(&source.point_column)
            .map(|geometry| Geography::new(geometry.wkt_string()));
        Some(SearchEntity::new(
            source.clone(),
            id,
            SearchLocation::from_attributes(point, row.lat, row.lng),
        ))
    }

    fn table(&self, name: &str) -> Result<&MemoryTable, StoreError> {
        self.tables
            .get(name)
            .ok_or_else(|| StoreError::UnknownTable(name.to_string()))
    }

    fn run_select(&self, query: &SpatialQuery) -> Result<Vec<RowId>, StoreError> {
        let table = self.table(&query.table.table)?;
        let predicate = BoundPredicate::bind(&query.predicate)?;

        let mut matched = Vec::new();
        for slot in predicate.candidates(table) {
            let row = &table.rows[slot];
            if predicate.eval(Some(row))? {
                matched.push(row);
            }
        }

        if let Some(order) = &query.order_by {
            let left = Operand::bind(&order.left)?;
            let right = Operand::bind(&order.right)?;
            let mut keyed = Vec::with_capacity(matched.len());
            for row in matched {
                let distance = match (left.resolve(Some(row))?, right.resolve(Some(row))?) {
                    (Some(a), Some(b)) => distance_meters(a, b)?,
                    // NULLs sort last
                    _ => f64::INFINITY,
                };
                keyed.push((distance, row));
            }
            // Stable: equidistant rows keep table order.
            keyed.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
            matched = keyed.into_iter().map(|(_, row)| row).collect();
        }

        let mut ids: Vec<RowId> = matched.iter().map(|row| row.id).collect();
        if let Some(limit) = query.limit {
            ids.truncate(limit);
        }

        debug!("Matched {} rows in {}", ids.len(), query.table.table);
        Ok(ids)
    }

    fn run_scalar(&self, query: &ScalarQuery) -> Result<ScalarValue, StoreError> {
        match query {
            ScalarQuery::Test { predicate } => {
                let predicate = BoundPredicate::bind(predicate)?;
                Ok(ScalarValue::Bool(predicate.eval(None)?))
            }
            ScalarQuery::UnionSimplify { table: source, ids, .. } => {
                let table = self.table(&source.table)?;
                let mut merged: Option<MultiPolygon<f64>> = None;
                for row in table.rows.iter().filter(|row| ids.contains(&row.id)) {
                    let Some(shape) = row.columns.get(&source.shape_column) else {
                        continue;
                    };
                    let shape = to_multi_polygon(shape)?;
                    merged = Some(match merged {
                        Some(acc) => acc.union(&shape),
                        None => shape,
                    });
                }
                Ok(merged
                    .map(|mp| ScalarValue::Text(mp.wkt_string()))
                    .unwrap_or(ScalarValue::Null))
            }
            ScalarQuery::Distance { table: source, id, other } => {
                let table = self.table(&source.table)?;
                let other = Operand::bind(other)?;
                let Some(row) = table.row_by_id(*id) else {
                    return Ok(ScalarValue::Null);
                };
                let Some(point) = row.columns.get(&source.point_column) else {
                    return Ok(ScalarValue::Null);
                };
                match other.resolve(Some(row))? {
                    Some(other) => Ok(ScalarValue::Float(distance_meters(point, other)?)),
                    None => Ok(ScalarValue::Null),
                }
            }
            ScalarQuery::Area { table: source, id } => {
                let table = self.table(&source.table)?;
                Ok(table
                    .row_by_id(*id)
                    .and_then(|row| row.columns.get(&source.shape_column))
                    .map(|shape| ScalarValue::Float(shape.geodesic_area_unsigned()))
                    .unwrap_or(ScalarValue::Null))
            }
        }
    }
}

impl SpatialStore for MemoryStore {
    async fn select_ids(&self, query: &SpatialQuery) -> Result<Vec<RowId>, StoreError> {
        self.run_select(query)
    }

    async fn scalar(&self, query: &ScalarQuery) -> Result<ScalarValue, StoreError> {
        self.run_scalar(query)
    }
}

/// Parse stored or literal geography text.
fn parse_geography(geog: &Geography) -> Result<Geometry<f64>, StoreError> {
    let geometry: Geometry<f64> = wkt::Wkt::<f64>::from_str(geog.wkt())
        .map_err(|e| StoreError::InvalidGeometry(format!("{:?}", e)))
        .and_then(|w| {
            w.try_into().map_err(|e: wkt::conversion::Error| {
                StoreError::InvalidGeometry(format!("{:?}", e))
            })
        })?;
    check_range(&geometry)?;
    Ok(geometry)
}

fn check_range(geometry: &Geometry<f64>) -> Result<(), StoreError> {
    match geometry
        .coords_iter()
        .find(|c| !(-180.0..=180.0).contains(&c.x) || !(-90.0..=90.0).contains(&c.y))
    {
        Some(c) => Err(StoreError::OutOfRange(format!("({} {})", c.x, c.y))),
        None => Ok(()),
    }
}

fn envelope(bbox: &BoundingBox) -> Geometry<f64> {
    // An inverted box matches nothing.
    if bbox.min_lng > bbox.max_lng || bbox.min_lat > bbox.max_lat {
        return Geometry::Polygon(Polygon::new(LineString::new(vec![]), vec![]));
    }
    Geometry::Polygon(bbox.to_rect().to_polygon())
}

fn to_multi_polygon(geometry: &Geometry<f64>) -> Result<MultiPolygon<f64>, StoreError> {
    match geometry {
        Geometry::Polygon(p) => Ok(MultiPolygon::new(vec![p.clone()])),
        Geometry::MultiPolygon(mp) => Ok(mp.clone()),
        Geometry::Rect(r) => Ok(MultiPolygon::new(vec![r.to_polygon()])),
        _ => Err(StoreError::Unsupported(
            "union of non-polygonal geographies".to_string(),
        )),
    }
}

/// Great-circle distance between two lng/lat points in meters.
fn haversine_distance(a: Point<f64>, b: Point<f64>) -> f64 {
    let lat1_rad = a.y().to_radians();
    let lat2_rad = b.y().to_radians();
    let delta_lat = (b.y() - a.y()).to_radians();
    let delta_lng = (b.x() - a.x()).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_METERS * c
}

fn point_distance(point: Point<f64>, other: &Geometry<f64>) -> Result<f64, StoreError> {
    if other.bounding_rect().is_none() {
        return Ok(f64::INFINITY);
    }
    if other.intersects(&point) {
        return Ok(0.0);
    }
    match other.closest_point(&point) {
        Closest::Intersection(_) => Ok(0.0),
        Closest::SinglePoint(nearest) => Ok(haversine_distance(point, nearest)),
        Closest::Indeterminate => Err(StoreError::Unsupported(
            "distance to a geometry without a unique closest point".to_string(),
        )),
    }
}

fn distance_meters(a: &Geometry<f64>, b: &Geometry<f64>) -> Result<f64, StoreError> {
    match (a, b) {
        (Geometry::Point(p), Geometry::Point(q)) => Ok(haversine_distance(*p, *q)),
        (Geometry::Point(p), other) | (other, Geometry::Point(p)) => point_distance(*p, other),
        _ if a.intersects(b) => Ok(0.0),
        _ => Err(StoreError::Unsupported(
            "distance between two non-point geographies".to_string(),
        )),
    }
}

fn covers(container: &Geometry<f64>, contained: &Geometry<f64>) -> bool {
    if container.bounding_rect().is_none() || contained.bounding_rect().is_none() {
        return false;
    }
    container.relate(contained).is_covers()
}

/// An operand with its constant side already evaluated
enum Operand<'q> {
    Column(&'q str),
    Value(Geometry<f64>),
}

impl<'q> Operand<'q> {
    fn bind(expr: &'q GeogExpr) -> Result<Self, StoreError> {
        Ok(match expr {
            GeogExpr::Column { name } => Operand::Column(name),
            GeogExpr::Literal { value } => Operand::Value(parse_geography(value)?),
            GeogExpr::MakePoint { lng, lat } => {
                let point = Geometry::Point(Point::new(*lng, *lat));
                check_range(&point)?;
                Operand::Value(point)
            }
            GeogExpr::Envelope { bbox } => {
                let geometry = envelope(bbox);
                check_range(&geometry)?;
                Operand::Value(geometry)
            }
        })
    }

    /// The operand's geometry for `row`; `None` is NULL.
    fn resolve<'a>(&'a self, row: Option<&'a MemoryRow>) -> Result<Option<&'a Geometry<f64>>, StoreError> {
        match self {
            Operand::Value(geometry) => Ok(Some(geometry)),
            Operand::Column(name) => match row {
                Some(row) => Ok(row.columns.get(*name)),
                None => Err(StoreError::Unsupported(format!(
                    "column {} referenced outside a table",
                    name
                ))),
            },
        }
    }
}

enum Test {
    DWithin(f64),
    Covers,
    Intersects,
}

struct BoundPredicate<'q> {
    test: Test,
    left: Operand<'q>,
    right: Operand<'q>,
}

impl<'q> BoundPredicate<'q> {
    fn bind(predicate: &'q Predicate) -> Result<Self, StoreError> {
        let test = match predicate {
            Predicate::DWithin { meters, .. } => Test::DWithin(*meters),
            Predicate::Covers { .. } => Test::Covers,
            Predicate::Intersects { .. } => Test::Intersects,
        };
        let (left, right) = predicate.operands();
        Ok(Self {
            test,
            left: Operand::bind(left)?,
            right: Operand::bind(right)?,
        })
    }

    /// Row slots worth evaluating, in table order.
    fn candidates(&self, table: &MemoryTable) -> Vec<usize> {
        let column_and_value = match (&self.left, &self.right) {
            (Operand::Column(name), Operand::Value(value))
            | (Operand::Value(value), Operand::Column(name)) => Some((*name, value)),
            _ => None,
        };
        match (&self.test, column_and_value) {
            (Test::Covers | Test::Intersects, Some((name, value))) => table
                .indexes
                .get(name)
                .map(|index| index.candidates(value))
                .unwrap_or_default(),
            _ => (0..table.rows.len()).collect(),
        }
    }

    fn eval(&self, row: Option<&MemoryRow>) -> Result<bool, StoreError> {
        let (Some(left), Some(right)) = (self.left.resolve(row)?, self.right.resolve(row)?) else {
            return Ok(false);
        };
        match self.test {
            Test::DWithin(meters) => Ok(distance_meters(left, right)? <= meters),
            Test::Covers => Ok(covers(left, right)),
            Test::Intersects => Ok(left.intersects(right)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_points(points: &[(RowId, &str)]) -> MemoryStore {
        let mut store = MemoryStore::new();
        for (id, wkt) in points {
            store
                .insert("places", RowRecord::new(*id).with("geog_point", *wkt))
                .unwrap();
        }
        store
    }

    #[test]
    fn test_haversine_one_degree_on_equator() {
        let d = haversine_distance(Point::new(0.0, 0.0), Point::new(1.0, 0.0));
        assert!((d - 111_194.93).abs() < 1.0, "got {}", d);
    }

    #[test]
    fn test_insert_rejects_malformed_wkt() {
        let mut store = MemoryStore::new();
        let err = store
            .insert("places", RowRecord::new(1).with("geog_point", "POINT(1"))
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidGeometry(_)));
    }

    #[test]
    fn test_insert_rejects_out_of_range_latitude() {
        let mut store = MemoryStore::new();
        let err = store
            .insert("places", RowRecord::new(1).with("geog_point", "POINT(10 95)"))
            .unwrap_err();
        assert!(matches!(err, StoreError::OutOfRange(_)));
    }

    #[test]
    fn test_srid_prefix_accepted() {
        let store = store_with_points(&[(1, "SRID=4326;POINT(8.5 47.4)")]);
        assert_eq!(store.row_count("places"), 1);
    }

    #[test]
    fn test_null_column_never_matches() {
        let mut store = MemoryStore::new();
        let mut record = RowRecord::new(1);
        record.columns.insert("geog_point".to_string(), None);
        store.insert("places", record).unwrap();

        let query = SpatialQuery {
            table: TableRef::new("places"),
            predicate: Predicate::DWithin {
                left: GeogExpr::column("geog_point"),
                right: GeogExpr::MakePoint { lng: 0.0, lat: 0.0 },
                meters: 1e9,
            },
            order_by: None,
            limit: None,
        };
        assert!(store.run_select(&query).unwrap().is_empty());
    }

    #[test]
    fn test_inverted_envelope_matches_nothing() {
        let store = store_with_points(&[(1, "POINT(5 5)")]);
        let query = SpatialQuery {
            table: TableRef::new("places"),
            predicate: Predicate::Covers {
                container: GeogExpr::envelope(BoundingBox::new(10.0, 10.0, 0.0, 0.0)),
                contained: GeogExpr::column("geog_point"),
            },
            order_by: None,
            limit: None,
        };
        assert!(store.run_select(&query).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_table() {
        let store = MemoryStore::new();
        let query = ScalarQuery::Area {
            table: TableRef::new("nowhere"),
            id: 1,
        };
        assert!(matches!(
            store.run_scalar(&query),
            Err(StoreError::UnknownTable(name)) if name == "nowhere"
        ));
    }

    #[test]
    fn test_column_outside_table_is_rejected() {
        let store = MemoryStore::new();
        let query = ScalarQuery::Test {
            predicate: Predicate::Intersects {
                left: GeogExpr::column("geog_shape"),
                right: GeogExpr::MakePoint { lng: 0.0, lat: 0.0 },
            },
        };
        assert!(matches!(
            store.run_scalar(&query),
            Err(StoreError::Unsupported(_))
        ));
    }

    #[test]
    fn test_point_to_polygon_distance() {
        let square = parse_geography(&Geography::new("POLYGON((0 0, 1 0, 1 1, 0 1, 0 0))")).unwrap();
        let inside = Geometry::Point(Point::new(0.5, 0.5));
        let outside = Geometry::Point(Point::new(2.0, 0.5));

        assert_eq!(distance_meters(&inside, &square).unwrap(), 0.0);
        let d = distance_meters(&square, &outside).unwrap();
        // One degree of longitude at latitude 0.5
        assert!((d - 111_190.0).abs() < 100.0, "got {}", d);
    }

    #[test]
    fn test_entity_location_from_point_column() {
        let mut store = MemoryStore::new();
        store
            .insert("regions", RowRecord::new(1).with("geog_point", "POINT(8.5 47.4)"))
            .unwrap();
        store
            .insert(
                "regions",
                RowRecord::new(2).with("geog_shape", "POLYGON((0 0, 1 0, 1 1, 0 0))"),
            )
            .unwrap();
        let regions = TableRef::new("regions");

        assert!(store.entity(&regions, 1).unwrap().has_geography_point());
        assert_eq!(
            store.entity(&regions, 2).unwrap().location,
            SearchLocation::Unknown
        );
        assert!(store.entity(&regions, 3).is_none());
    }

    #[test]
    fn test_entity_location_from_raw_coordinates() {
        let mut store = MemoryStore::new();
        store
            .insert("regions", RowRecord::new(1).with_coordinates(40.0, -74.0))
            .unwrap();
        store
            .insert(
                "regions",
                RowRecord::new(2)
                    .with_coordinates(40.0, -74.0)
                    .with("geog_point", "POINT(8.5 47.4)"),
            )
            .unwrap();
        let regions = TableRef::new("regions");

        assert_eq!(
            store.entity(&regions, 1).unwrap().location,
            SearchLocation::Coordinates {
                lat: 40.0,
                lng: -74.0
            }
        );
        assert!(store.entity(&regions, 2).unwrap().has_geography_point());
    }

    #[test]
    fn test_load_json_fixture() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.json");
        std::fs::write(
            &path,
            r#"{
                "places": [
                    {"id": 1, "geog_point": "POINT(1 1)"},
                    {"id": 2, "geog_point": null}
                ],
                "regions": [
                    {"id": 10, "geog_shape": "POLYGON((0 0, 2 0, 2 2, 0 2, 0 0))"}
                ]
            }"#,
        )
        .unwrap();

        let store = MemoryStore::load_json(&path).unwrap();
        assert_eq!(store.row_count("places"), 2);
        assert_eq!(store.row_count("regions"), 1);
        assert_eq!(store.row_count("missing"), 0);
    }

    #[test]
    fn test_load_json_fixture_with_coordinates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.json");
        std::fs::write(&path, r#"{"regions": [{"id": 1, "lat": 40.0, "lng": -74.0}]}"#).unwrap();

        let store = MemoryStore::load_json(&path).unwrap();
        let entity = store.entity(&TableRef::new("regions"), 1).unwrap();
        assert_eq!(
            entity.location,
            SearchLocation::Coordinates {
                lat: 40.0,
                lng: -74.0
            }
        );
    }
}
