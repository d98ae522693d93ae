//! Axis-aligned geographic envelopes.

use geo::{coord, Rect};
use serde::{Deserialize, Serialize};

/// Share of each axis span trimmed from both ends by [`BoundingBox::inset`].
pub const INSET_FRACTION: f64 = 0.1;

/// Bounding box in WGS84 degrees.
///
/// `min <= max` on each axis is the caller's responsibility. An inverted box
/// is not rejected here; the store simply matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lng: f64,
    pub min_lat: f64,
    pub max_lng: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn new(min_lng: f64, min_lat: f64, max_lng: f64, max_lat: f64) -> Self {
        Self {
            min_lng,
            min_lat,
            max_lng,
            max_lat,
        }
    }

    /// Envelope shrunk toward its center by 10% of the span on every side.
    ///
    /// Membership checks against the store use this envelope, not the box
    /// as requested. (0,0,10,10) becomes (1,1,9,9).
    pub fn inset(&self) -> Self {
        let lng_margin = INSET_FRACTION * (self.max_lng - self.min_lng);
        let lat_margin = INSET_FRACTION * (self.max_lat - self.min_lat);
        Self {
            min_lng: self.min_lng + lng_margin,
            min_lat: self.min_lat + lat_margin,
            max_lng: self.max_lng - lng_margin,
            max_lat: self.max_lat - lat_margin,
        }
    }

    /// Corners as `[min_lng, min_lat, max_lng, max_lat]`
    pub fn to_array(&self) -> [f64; 4] {
        [self.min_lng, self.min_lat, self.max_lng, self.max_lat]
    }

    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(
            coord! { x: self.min_lng, y: self.min_lat },
            coord! { x: self.max_lng, y: self.max_lat },
        )
    }
}

impl std::str::FromStr for BoundingBox {
    type Err = String;

    /// Parse "minLng,minLat,maxLng,maxLat"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<f64> = s
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|e| format!("invalid bounding box {:?}: {}", s, e))?;
        if parts.len() != 4 {
            return Err(format!(
                "expected \"minLng,minLat,maxLng,maxLat\", got {} values",
                parts.len()
            ));
        }
        Ok(Self::new(parts[0], parts[1], parts[2], parts[3]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inset_unit_box() {
        let inset = BoundingBox::new(0.0, 0.0, 10.0, 10.0).inset();
        assert_eq!(inset, BoundingBox::new(1.0, 1.0, 9.0, 9.0));
    }

    #[test]
    fn test_inset_uneven_axes() {
        let inset = BoundingBox::new(-120.0, 30.0, -100.0, 35.0).inset();
        assert!((inset.min_lng - -118.0).abs() < 1e-9);
        assert!((inset.max_lng - -102.0).abs() < 1e-9);
        assert!((inset.min_lat - 30.5).abs() < 1e-9);
        assert!((inset.max_lat - 34.5).abs() < 1e-9);
    }

    #[test]
    fn test_inverted_box_is_not_corrected() {
        // Caller's problem; the values pass straight through.
        let inset = BoundingBox::new(10.0, 10.0, 0.0, 0.0).inset();
        assert_eq!(inset, BoundingBox::new(9.0, 9.0, 1.0, 1.0));
    }

    #[test]
    fn test_parse_bbox() {
        let bbox: BoundingBox = "-74.1, 40.6, -73.9, 40.8".parse().unwrap();
        assert_eq!(bbox.to_array(), [-74.1, 40.6, -73.9, 40.8]);
        assert!("1,2,3".parse::<BoundingBox>().is_err());
    }
}
