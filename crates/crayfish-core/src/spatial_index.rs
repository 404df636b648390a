//! R-tree over element bounding boxes for point location.

use crate::mesh::BBox;
use crate::point::Point;
use rstar::{PointDistance, RTree, RTreeObject, AABB};
use std::fmt;

/// Bounding box of one element, as stored in the tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementEnvelope {
    pub element: usize,
    pub bbox: BBox,
}

impl RTreeObject for ElementEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.bbox.min_x, self.bbox.min_y],
            [self.bbox.max_x, self.bbox.max_y],
        )
    }
}

impl PointDistance for ElementEnvelope {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = (self.bbox.min_x - point[0]).max(point[0] - self.bbox.max_x).max(0.0);
        let dy = (self.bbox.min_y - point[1]).max(point[1] - self.bbox.max_y).max(0.0);
        dx * dx + dy * dy
    }

    fn contains_point(&self, point: &[f64; 2]) -> bool {
        self.bbox.contains(Point::new(point[0], point[1]))
    }
}

/// Spatial index answering "which elements' boxes contain this point".
#[derive(Clone)]
pub struct ElementIndex {
    tree: RTree<ElementEnvelope>,
}

impl ElementIndex {
    pub fn build(bboxes: &[BBox]) -> Self {
        let envelopes = bboxes
            .iter()
            .enumerate()
            .filter(|(_, bbox)| !bbox.is_empty())
            .map(|(element, bbox)| ElementEnvelope { element, bbox: *bbox })
            .collect();
        Self { tree: RTree::bulk_load(envelopes) }
    }

    /// Candidate elements for `p`, lowest index first.
    ///
    /// Points on a shared edge belong to several boxes; ordering keeps the
    /// choice between them stable.
    pub fn candidates(&self, p: Point) -> Vec<usize> {
        let mut found: Vec<usize> = self
            .tree
            .locate_all_at_point(&[p.x, p.y])
            .map(|e| e.element)
            .collect();
        found.sort_unstable();
        found
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

impl fmt::Debug for ElementIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementIndex").field("elements", &self.len()).finish()
    }
}
