//! Mesh topology, point location and interpolation of outputs.

use crate::dataset::DataSet;
use crate::error::MeshError;
use crate::output::{Output, OutputKind};
use crate::point::Point;
use crate::sampler::FieldQuery;
use crate::spatial_index::ElementIndex;
use glam::DVec2;

/// Barycentric weights above `-INSIDE_TOL` count as inside.
const INSIDE_TOL: f64 = 1e-10;
/// Triangles with a smaller doubled area are skipped.
const DEGENERATE_TOL: f64 = 1e-12;
/// Slack on the bilinear parameters of points on a quad's edges.
const BILINEAR_TOL: f64 = 1e-9;

/// Element shapes found in hydraulic model meshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    /// Three-node triangle.
    Triangle,
    /// Four-node quadrilateral.
    Quad,
    /// N-node convex polygon.
    Polygon,
    /// Two-node 1D element. Never contains an area point.
    Line,
}

impl ElementType {
    pub fn min_nodes(&self) -> usize {
        match self {
            ElementType::Triangle => 3,
            ElementType::Quad => 4,
            ElementType::Polygon => 3,
            ElementType::Line => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub kind: ElementType,
    pub nodes: Vec<usize>,
}

impl Element {
    pub fn new(kind: ElementType, nodes: Vec<usize>) -> Self {
        Self { kind, nodes }
    }

    pub fn triangle(a: usize, b: usize, c: usize) -> Self {
        Self::new(ElementType::Triangle, vec![a, b, c])
    }

    pub fn quad(a: usize, b: usize, c: usize, d: usize) -> Self {
        Self::new(ElementType::Quad, vec![a, b, c, d])
    }
}

/// Axis-aligned bounding box, inclusive on every side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl BBox {
    pub const EMPTY: BBox = BBox {
        min_x: f64::INFINITY,
        max_x: f64::NEG_INFINITY,
        min_y: f64::INFINITY,
        max_y: f64::NEG_INFINITY,
    };

    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point>) -> Self {
        let mut bbox = Self::EMPTY;
        for p in points {
            bbox.extend(*p);
        }
        bbox
    }

    pub fn extend(&mut self, p: Point) {
        self.min_x = self.min_x.min(p.x);
        self.max_x = self.max_x.max(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_y = self.max_y.max(p.y);
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    /// Overlap of two boxes; empty when they are disjoint.
    pub fn intersection(&self, other: &BBox) -> BBox {
        BBox {
            min_x: self.min_x.max(other.min_x),
            max_x: self.max_x.min(other.max_x),
            min_y: self.min_y.max(other.min_y),
            max_y: self.max_y.min(other.max_y),
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Result of locating a point: the containing element and the interpolation
/// weights of up to four of its nodes.
///
/// Triangles and polygons use barycentric weights of one fan triangle and
/// leave the fourth weight at zero. Quads use bilinear weights of all four
/// corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub element: usize,
    pub nodes: [usize; 4],
    pub weights: [f64; 4],
}

/// Nodes, elements and the datasets defined on them.
#[derive(Debug, Clone)]
pub struct Mesh {
    nodes: Vec<Point>,
    elements: Vec<Element>,
    bboxes: Vec<BBox>,
    index: ElementIndex,
    extent: BBox,
    datasets: Vec<DataSet>,
}

impl Mesh {
    pub fn new(nodes: Vec<Point>, elements: Vec<Element>) -> Result<Self, MeshError> {
        for (i, elem) in elements.iter().enumerate() {
            let required = elem.kind.min_nodes();
            if elem.nodes.len() < required {
                return Err(MeshError::TooFewNodes {
                    element: i,
                    required,
                    actual: elem.nodes.len(),
                });
            }
            if let Some(&index) = elem.nodes.iter().find(|&&n| n >= nodes.len()) {
                return Err(MeshError::NodeIndex { element: i, index, node_count: nodes.len() });
            }
        }

        Ok(Self::build(nodes, elements))
    }

    /// `cols` x `rows` quads of side `cell_size` with the lower left corner at `origin`.
    pub fn regular_grid(origin: Point, cell_size: f64, cols: usize, rows: usize) -> Self {
        let mut nodes = Vec::with_capacity((cols + 1) * (rows + 1));
        for j in 0..=rows {
            for i in 0..=cols {
                nodes.push(origin + Point::new(i as f64, j as f64) * cell_size);
            }
        }
        let stride = cols + 1;
        let mut elements = Vec::with_capacity(cols * rows);
        for j in 0..rows {
            for i in 0..cols {
                let n0 = j * stride + i;
                elements.push(Element::quad(n0, n0 + 1, n0 + stride + 1, n0 + stride));
            }
        }
        Self::build(nodes, elements)
    }

    fn build(nodes: Vec<Point>, elements: Vec<Element>) -> Self {
        let bboxes: Vec<BBox> = elements
            .iter()
            .map(|e| BBox::from_points(e.nodes.iter().map(|&n| &nodes[n])))
            .collect();
        let index = ElementIndex::build(&bboxes);
        let extent = BBox::from_points(nodes.iter());

        log::debug!("mesh built: {} nodes, {} elements", nodes.len(), elements.len());

        Self { nodes, elements, bboxes, index, extent, datasets: Vec::new() }
    }

    pub fn nodes(&self) -> &[Point] {
        &self.nodes
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn extent(&self) -> BBox {
        self.extent
    }

    pub fn element_bbox(&self, element: usize) -> Option<&BBox> {
        self.bboxes.get(element)
    }

    pub fn element_count_for_type(&self, kind: ElementType) -> usize {
        self.elements.iter().filter(|e| e.kind == kind).count()
    }

    /// Average of the element's node coordinates.
    pub fn element_centroid(&self, element: usize) -> Option<Point> {
        let elem = self.elements.get(element)?;
        let sum = elem
            .nodes
            .iter()
            .fold(Point::ZERO, |acc, &n| acc + self.nodes[n]);
        Some(sum * (1.0 / elem.nodes.len() as f64))
    }

    // ── Datasets ─────────────────────────────────────────────────

    pub fn add_dataset(&mut self, dataset: DataSet) {
        self.datasets.push(dataset);
    }

    pub fn datasets(&self) -> &[DataSet] {
        &self.datasets
    }

    pub fn dataset(&self, index: usize) -> Option<&DataSet> {
        self.datasets.get(index)
    }

    pub fn dataset_by_name(&self, name: &str) -> Option<&DataSet> {
        self.datasets.iter().find(|d| d.name() == name)
    }

    pub fn dataset_mut(&mut self, index: usize) -> Option<&mut DataSet> {
        self.datasets.get_mut(index)
    }

    /// Find a dataset's output at a time step.
    pub fn output(&self, dataset: usize, time_index: usize) -> Option<&Output> {
        self.dataset(dataset)?.output(time_index)
    }

    // ── Location and interpolation ───────────────────────────────

    /// Find the element containing `p`.
    ///
    /// On a shared edge the lowest-numbered element wins.
    pub fn locate(&self, p: Point) -> Option<Location> {
        if !p.is_finite() || !self.extent.contains(p) {
            return None;
        }
        self.index
            .candidates(p)
            .into_iter()
            .find_map(|i| self.locate_in(i, p))
    }

    /// Locate `p` inside one particular element.
    pub fn locate_in(&self, element: usize, p: Point) -> Option<Location> {
        let elem = self.elements.get(element)?;
        if elem.kind == ElementType::Line {
            return None;
        }
        // fan triangulation around the first node decides containment
        let n0 = elem.nodes[0];
        let fan = elem.nodes[1..].windows(2).find_map(|w| {
            let (a, b) = (w[0], w[1]);
            let [wa, wb, wc] = barycentric(self.nodes[n0], self.nodes[a], self.nodes[b], p)?;
            Some(Location {
                element,
                nodes: [n0, a, b, b],
                weights: [wa, wb, wc, 0.0],
            })
        })?;

        if elem.kind != ElementType::Quad {
            return Some(fan);
        }
        let corners = [elem.nodes[0], elem.nodes[1], elem.nodes[2], elem.nodes[3]];
        let quad = corners.map(|n| self.nodes[n]);
        match inverse_bilinear(quad, p) {
            Some((u, v)) => Some(Location {
                element,
                nodes: corners,
                weights: [(1.0 - u) * (1.0 - v), u * (1.0 - v), u * v, (1.0 - u) * v],
            }),
            None => Some(fan),
        }
    }

    /// Scalar value of `output` at `p`, or `None` outside coverage.
    pub fn value_at(&self, output: &Output, p: Point) -> Option<f64> {
        let loc = self.locate(p)?;
        self.value_at_location(output, &loc)
    }

    /// Scalar value of `output` at an already located point.
    pub fn value_at_location(&self, output: &Output, loc: &Location) -> Option<f64> {
        match output.kind() {
            OutputKind::Element => output.value(loc.element),
            OutputKind::Node => {
                if !output.is_active(loc.element) {
                    return None;
                }
                let mut acc = 0.0;
                for (node, weight) in loc.nodes.iter().zip(loc.weights) {
                    acc += output.value(*node)? * weight;
                }
                Some(acc)
            }
        }
    }

    /// Vector value of `output` at `p`. `None` for scalar outputs.
    pub fn vector_value_at(&self, output: &Output, p: Point) -> Option<DVec2> {
        if !output.is_vector() {
            return None;
        }
        let loc = self.locate(p)?;
        match output.kind() {
            OutputKind::Element => output.vector(loc.element),
            OutputKind::Node => {
                if !output.is_active(loc.element) {
                    return None;
                }
                let mut acc = DVec2::ZERO;
                for (node, weight) in loc.nodes.iter().zip(loc.weights) {
                    acc += output.vector(*node)? * weight;
                }
                Some(acc)
            }
        }
    }

    /// Bind an output to this mesh so it can be queried by coordinate.
    pub fn bind<'a>(&'a self, output: &'a Output) -> MeshOutput<'a> {
        MeshOutput { mesh: self, output }
    }
}

/// An output paired with the mesh it is defined on.
#[derive(Debug, Clone, Copy)]
pub struct MeshOutput<'a> {
    pub mesh: &'a Mesh,
    pub output: &'a Output,
}

impl FieldQuery for MeshOutput<'_> {
    fn value_at(&self, p: Point) -> Option<f64> {
        self.mesh.value_at(self.output, p)
    }
}

/// Barycentric weights of `p` in triangle `abc`, if inside.
fn barycentric(a: Point, b: Point, c: Point, p: Point) -> Option<[f64; 3]> {
    let area = (b - a).perp_dot(&(c - a));
    if area.abs() < DEGENERATE_TOL {
        return None;
    }
    let wa = (b - p).perp_dot(&(c - p)) / area;
    let wb = (c - p).perp_dot(&(a - p)) / area;
    let wc = 1.0 - wa - wb;
    if wa >= -INSIDE_TOL && wb >= -INSIDE_TOL && wc >= -INSIDE_TOL {
        Some([wa, wb, wc])
    } else {
        None
    }
}

/// Parameters `(u, v)` in `[0, 1]` of `p` in the bilinear map of a quad
/// with corners `q` in order, so that
/// `p = (1-u)(1-v) q0 + u(1-v) q1 + uv q2 + (1-u)v q3`.
fn inverse_bilinear(q: [Point; 4], p: Point) -> Option<(f64, f64)> {
    let e = q[1] - q[0];
    let f = q[3] - q[0];
    let g = q[0] - q[1] + q[2] - q[3];
    let h = p - q[0];

    let k2 = g.perp_dot(&f);
    let k1 = e.perp_dot(&f) + h.perp_dot(&g);
    let k0 = h.perp_dot(&e);

    let solve_u = |v: f64| -> Option<(f64, f64)> {
        let dx = e.x + g.x * v;
        let dy = e.y + g.y * v;
        let u = if dx.abs() >= dy.abs() {
            if dx == 0.0 {
                return None;
            }
            (h.x - f.x * v) / dx
        } else {
            (h.y - f.y * v) / dy
        };
        let inside = |t: f64| (-BILINEAR_TOL..=1.0 + BILINEAR_TOL).contains(&t);
        (inside(u) && inside(v)).then(|| (u.clamp(0.0, 1.0), v.clamp(0.0, 1.0)))
    };

    // parallelograms make the quadratic in v linear
    if k2.abs() <= DEGENERATE_TOL * k1.abs() {
        if k1 == 0.0 {
            return None;
        }
        return solve_u(-k0 / k1);
    }
    let disc = k1 * k1 - 4.0 * k0 * k2;
    if disc < 0.0 {
        return None;
    }
    let root = disc.sqrt();
    let inv = 0.5 / k2;
    solve_u((-k1 - root) * inv).or_else(|| solve_u((-k1 + root) * inv))
}
