//! Points and serialized geography values exchanged with the store.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Spatial reference identifier for WGS84 longitude/latitude.
pub const WGS84_SRID: i32 = 4326;

/// Geographic point (lat/lng, degrees, WGS84)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Serialize as store-native geography text.
    ///
    /// Longitude is the first coordinate, latitude the second.
    pub fn to_geography(&self) -> Geography {
        Geography::new(format!(
            "SRID={};POINT({} {})",
            WGS84_SRID, self.lng, self.lat
        ))
    }
}

impl From<GeoPoint> for geo::Point<f64> {
    fn from(point: GeoPoint) -> Self {
        geo::Point::new(point.lng, point.lat)
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

impl std::str::FromStr for GeoPoint {
    type Err = String;

    /// Parse "lat,lng"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lng) = s
            .split_once(',')
            .ok_or_else(|| format!("expected \"lat,lng\", got {:?}", s))?;
        let lat = lat
            .trim()
            .parse::<f64>()
            .map_err(|e| format!("invalid latitude {:?}: {}", lat, e))?;
        let lng = lng
            .trim()
            .parse::<f64>()
            .map_err(|e| format!("invalid longitude {:?}: {}", lng, e))?;
        Ok(Self { lat, lng })
    }
}

/// A serialized geography value (point, polygon or multipolygon).
///
/// Opaque to this crate: the text is handed to the store as-is, either plain
/// WKT or EWKT carrying an `SRID=4326;` prefix. Nothing is validated locally;
/// malformed text fails when the store parses it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Geography(String);

impl Geography {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    /// The WKT body, without any `SRID=...;` prefix.
    pub fn wkt(&self) -> &str {
        let text = self.0.trim();
        match text.split_once(';') {
            Some((prefix, body)) if prefix.trim().to_ascii_uppercase().starts_with("SRID=") => {
                body.trim()
            }
            _ => text,
        }
    }
}

impl fmt::Display for Geography {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Geography {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl From<&str> for Geography {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_geography_is_lng_first() {
        let point = GeoPoint::new(47.4, 8.5);
        assert_eq!(point.to_geography().as_str(), "SRID=4326;POINT(8.5 47.4)");
    }

    #[test]
    fn test_wkt_strips_srid_prefix() {
        let geog = Geography::new("SRID=4326;POLYGON((0 0, 1 0, 1 1, 0 0))");
        assert_eq!(geog.wkt(), "POLYGON((0 0, 1 0, 1 1, 0 0))");

        let plain = Geography::new("POINT(1 2)");
        assert_eq!(plain.wkt(), "POINT(1 2)");
    }

    #[test]
    fn test_parse_point() {
        let point: GeoPoint = "40.7, -74.0".parse().unwrap();
        assert_eq!(point, GeoPoint::new(40.7, -74.0));
        assert!("40.7".parse::<GeoPoint>().is_err());
        assert!("north,-74".parse::<GeoPoint>().is_err());
    }
}
