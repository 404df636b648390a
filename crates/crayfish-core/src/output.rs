use glam::DVec2;

/// Stored marker for "no value here". Never returned from queries.
pub const NODATA: f64 = -9999.0;

/// Where an output's values live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// One value per mesh node; interpolated inside elements.
    Node,
    /// One value per element; constant across the element.
    Element,
}

/// The values of one dataset at one time step.
///
/// Vector outputs carry per-value components and store the magnitude as the
/// scalar value, so scalar queries on them return magnitudes.
#[derive(Debug, Clone)]
pub struct Output {
    pub time: f64,
    kind: OutputKind,
    values: Vec<f64>,
    vectors: Option<Vec<DVec2>>,
    /// Per-element activity flags (node outputs only). Empty means all active.
    active: Vec<bool>,
}

impl Output {
    pub fn node(time: f64, values: Vec<f64>) -> Self {
        Self { time, kind: OutputKind::Node, values, vectors: None, active: Vec::new() }
    }

    pub fn element(time: f64, values: Vec<f64>) -> Self {
        Self { time, kind: OutputKind::Element, values, vectors: None, active: Vec::new() }
    }

    pub fn node_vectors(time: f64, vectors: Vec<DVec2>) -> Self {
        Self::with_vectors(time, OutputKind::Node, vectors)
    }

    pub fn element_vectors(time: f64, vectors: Vec<DVec2>) -> Self {
        Self::with_vectors(time, OutputKind::Element, vectors)
    }

    fn with_vectors(time: f64, kind: OutputKind, vectors: Vec<DVec2>) -> Self {
        let values = vectors
            .iter()
            .map(|v| if is_nodata_vector(*v) { NODATA } else { v.length() })
            .collect();
        Self { time, kind, values, vectors: Some(vectors), active: Vec::new() }
    }

    /// Mark elements as wet/dry. Inactive elements yield no node-interpolated values.
    pub fn with_active(mut self, active: Vec<bool>) -> Self {
        self.active = active;
        self
    }

    pub fn kind(&self) -> OutputKind {
        self.kind
    }

    pub fn is_vector(&self) -> bool {
        self.vectors.is_some()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Scalar value (magnitude for vector outputs) at a node or element index.
    pub fn value(&self, index: usize) -> Option<f64> {
        self.values
            .get(index)
            .copied()
            .filter(|v| *v != NODATA && v.is_finite())
    }

    pub fn vector(&self, index: usize) -> Option<DVec2> {
        self.vectors
            .as_ref()?
            .get(index)
            .copied()
            .filter(|v| !is_nodata_vector(*v))
    }

    pub fn is_active(&self, element: usize) -> bool {
        self.active.get(element).copied().unwrap_or(true)
    }

    /// Minimum and maximum over defined values.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        (0..self.values.len())
            .filter_map(|i| self.value(i))
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

fn is_nodata_vector(v: DVec2) -> bool {
    v.x == NODATA || v.y == NODATA || !v.is_finite()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nodata_is_hidden() {
        let out = Output::node(0.0, vec![1.0, NODATA, 3.0]);
        assert_eq!(out.value(0), Some(1.0));
        assert_eq!(out.value(1), None);
        assert_eq!(out.value(7), None);
    }

    #[test]
    fn test_vector_magnitudes() {
        let out = Output::node_vectors(
            1.5,
            vec![DVec2::new(3.0, 4.0), DVec2::new(NODATA, 0.0)],
        );
        assert!(out.is_vector());
        assert_eq!(out.value(0), Some(5.0));
        assert_eq!(out.vector(0), Some(DVec2::new(3.0, 4.0)));
        assert_eq!(out.value(1), None);
        assert_eq!(out.vector(1), None);
    }

    #[test]
    fn test_scalar_output_has_no_vectors() {
        let out = Output::element(0.0, vec![2.0]);
        assert_eq!(out.kind(), OutputKind::Element);
        assert_eq!(out.vector(0), None);
    }

    #[test]
    fn test_value_range_skips_nodata() {
        let out = Output::element(0.0, vec![NODATA, 4.0, -2.0, 9.0]);
        assert_eq!(out.value_range(), Some((-2.0, 9.0)));
        assert_eq!(Output::element(0.0, vec![NODATA]).value_range(), None);
    }

    #[test]
    fn test_active_defaults_to_true() {
        let out = Output::node(0.0, vec![0.0; 4]).with_active(vec![true, false]);
        assert!(out.is_active(0));
        assert!(!out.is_active(1));
        assert!(out.is_active(5));
    }
}
