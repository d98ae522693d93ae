//! Per-column R-tree over row envelopes.

use geo::{BoundingRect, Geometry, Rect};
use rstar::{RTree, RTreeObject, AABB};

/// Envelope of one row's geometry, pointing back at the row slot
#[derive(Debug, Clone)]
struct IndexedGeometry {
    row: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedGeometry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

fn rect_envelope(rect: Rect<f64>) -> AABB<[f64; 2]> {
    AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y])
}

/// Candidate lookup for one geography column
#[derive(Default)]
pub(crate) struct ColumnIndex {
    tree: RTree<IndexedGeometry>,
}

impl ColumnIndex {
    /// Empty geometries have no envelope and are never candidates.
    pub fn insert(&mut self, row: usize, geometry: &Geometry<f64>) {
        if let Some(rect) = geometry.bounding_rect() {
            self.tree.insert(IndexedGeometry {
                row,
                envelope: rect_envelope(rect),
            });
        }
    }

    /// Rows whose envelope intersects `geometry`'s, in ascending row order
    pub fn candidates(&self, geometry: &Geometry<f64>) -> Vec<usize> {
        let Some(rect) = geometry.bounding_rect() else {
            return Vec::new();
        };
        let mut rows: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&rect_envelope(rect))
            .map(|ig| ig.row)
            .collect();
        rows.sort_unstable();
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{point, polygon};

    #[test]
    fn test_candidates_by_envelope() {
        let mut index = ColumnIndex::default();
        index.insert(0, &Geometry::Point(point!(x: 1.0, y: 1.0)));
        index.insert(1, &Geometry::Point(point!(x: 50.0, y: 50.0)));
        index.insert(2, &Geometry::Point(point!(x: 2.0, y: 2.0)));

        let query = Geometry::Polygon(polygon![
            (x: 0.0, y: 0.0),
            (x: 3.0, y: 0.0),
            (x: 3.0, y: 3.0),
            (x: 0.0, y: 3.0),
        ]);
        assert_eq!(index.candidates(&query), vec![0, 2]);
    }
}
