//! Averaged-Cartesian spherical centroid.
//!
//! Points are projected onto the unit sphere, their vectors averaged, and the
//! mean direction converted back to latitude/longitude. This approximates the
//! geodesic centroid; it is not equal to it. Input order does not matter.

use crate::error::{Error, Result};
use crate::models::GeoPoint;

/// Centroid of a non-empty set of points.
///
/// Fails with [`Error::EmptyInput`] when `points` yields nothing.
/// When the unit vectors cancel out (e.g. exactly antipodal pairs) the mean
/// vector is zero and the returned point carries no meaning.
pub fn spherical_centroid<I>(points: I) -> Result<GeoPoint>
where
    I: IntoIterator<Item = GeoPoint>,
{
    let mut count = 0usize;
    let (mut x, mut y, mut z) = (0.0f64, 0.0f64, 0.0f64);

    for point in points {
        let lat = point.lat.to_radians();
        let lng = point.lng.to_radians();
        x += lat.cos() * lng.cos();
        y += lat.cos() * lng.sin();
        z += lat.sin();
        count += 1;
    }

    if count == 0 {
        return Err(Error::EmptyInput);
    }

    let n = count as f64;
    let (x, y, z) = (x / n, y / n, z / n);

    let lng = y.atan2(x);
    let hyp = (x * x + y * y).sqrt();
    let lat = z.atan2(hyp);

    Ok(GeoPoint::new(lat.to_degrees(), lng.to_degrees()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_single_point_is_unchanged() {
        let p = GeoPoint::new(47.3769, 8.5417);
        let c = spherical_centroid([p]).unwrap();
        assert!((c.lat - p.lat).abs() < EPS);
        assert!((c.lng - p.lng).abs() < EPS);
    }

    #[test]
    fn test_equator_quarter_turn() {
        let c = spherical_centroid([GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 90.0)]).unwrap();
        assert!(c.lat.abs() < EPS);
        assert!((c.lng - 45.0).abs() < EPS);
    }

    #[test]
    fn test_near_antipodal_lands_between_inputs() {
        // Not exactly opposite, so the mean vector is short but well defined.
        let a = GeoPoint::new(1.0, 10.0);
        let b = GeoPoint::new(2.0, 160.0);
        let c = spherical_centroid([a, b]).unwrap();

        assert!(c.lng > a.lng && c.lng < b.lng, "lng {}", c.lng);
        assert!(c.lat > 0.0, "lat {}", c.lat);
    }

    #[test]
    fn test_order_does_not_matter() {
        let points = vec![
            GeoPoint::new(40.7128, -74.0060),
            GeoPoint::new(34.0522, -118.2437),
            GeoPoint::new(41.8781, -87.6298),
        ];
        let forward = spherical_centroid(points.clone()).unwrap();
        let reversed = spherical_centroid(points.into_iter().rev()).unwrap();
        assert!((forward.lat - reversed.lat).abs() < EPS);
        assert!((forward.lng - reversed.lng).abs() < EPS);
    }

    #[test]
    fn test_empty_input_is_an_error() {
        let result = spherical_centroid(Vec::<GeoPoint>::new());
        assert!(matches!(result, Err(Error::EmptyInput)));
    }

    #[test]
    fn test_wraps_across_antimeridian() {
        let c = spherical_centroid([GeoPoint::new(0.0, 179.0), GeoPoint::new(0.0, -179.0)])
            .unwrap();
        assert!((c.lng.abs() - 180.0).abs() < EPS);
    }
}
