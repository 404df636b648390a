use crate::point::Point;

/// A path in mesh coordinates that can be sampled at any progress in [0, 1].
pub trait Shape {
    /// Sample the shape at a given progress in [0, 1].
    fn next_vector(&self, progress: f64) -> Point;

    /// The path length of this shape in mesh units.
    fn length(&self) -> f64;
}

/// A straight segment between two points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

impl Segment {
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }
}

impl Shape for Segment {
    fn next_vector(&self, progress: f64) -> Point {
        self.start.lerp(&self.end, progress)
    }

    fn length(&self) -> f64 {
        self.start.distance(&self.end)
    }
}

/// An ordered sequence of vertices forming an open line.
///
/// Self-intersections are allowed. A polyline with fewer than two vertices
/// has no segments and zero length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polyline {
    vertices: Vec<Point>,
}

impl Polyline {
    pub fn new(vertices: Vec<Point>) -> Self {
        Self { vertices }
    }

    pub fn from_coords(coords: &[(f64, f64)]) -> Self {
        Self::new(coords.iter().copied().map(Point::from).collect())
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Segments in vertex order.
    pub fn segments(&self) -> impl Iterator<Item = Segment> + '_ {
        self.vertices.windows(2).map(|w| Segment::new(w[0], w[1]))
    }

    /// Distance from the start of the line to each vertex.
    ///
    /// Same length as `vertices()`; the first entry is 0.
    pub fn cumulative_lengths(&self) -> Vec<f64> {
        let mut acc = 0.0;
        let mut out = Vec::with_capacity(self.vertices.len());
        if !self.vertices.is_empty() {
            out.push(0.0);
        }
        for segment in self.segments() {
            acc += segment.length();
            out.push(acc);
        }
        out
    }

    /// Point at `distance` along the line, clamped to its ends.
    ///
    /// Returns `None` for an empty polyline.
    pub fn point_at_distance(&self, distance: f64) -> Option<Point> {
        let first = *self.vertices.first()?;
        if distance <= 0.0 {
            return Some(first);
        }
        let mut travelled = 0.0;
        for segment in self.segments() {
            let len = segment.length();
            if len > 0.0 && travelled + len >= distance {
                return Some(segment.next_vector((distance - travelled) / len));
            }
            travelled += len;
        }
        self.vertices.last().copied()
    }
}

impl Shape for Polyline {
    fn next_vector(&self, progress: f64) -> Point {
        let total = self.length();
        self.point_at_distance(progress.clamp(0.0, 1.0) * total)
            .unwrap_or(Point::ZERO)
    }

    fn length(&self) -> f64 {
        self.segments().map(|s| s.length()).sum()
    }
}

impl FromIterator<Point> for Polyline {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
