//! Layout of vector arrows for one output.
//!
//! Produces pixel-space geometry only. Stroking the arrows with
//! `RenderSettings::color` and `line_width` is left to the host's painter.

use crate::settings::{RenderSettings, ShaftLengthMethod};
use crate::view::Viewport;
use crayfish_core::{BBox, Mesh, Output, OutputKind, Point};
use glam::DVec2;

/// One arrow in pixel coordinates: a shaft from `start` to `end` and a head
/// made of two barbs from `end` back to `head_left` and `head_right`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arrow {
    pub start: DVec2,
    pub end: DVec2,
    pub head_left: DVec2,
    pub head_right: DVec2,
    pub magnitude: f64,
}

/// Shaft length in pixels for a vector of `magnitude`.
///
/// `range` is the output's magnitude range, used by the MinMax method; a
/// missing or zero-width range gives the minimum length.
pub fn shaft_length(settings: &RenderSettings, magnitude: f64, range: Option<(f64, f64)>) -> f64 {
    match settings.shaft_length_method {
        ShaftLengthMethod::MinMax => match range {
            Some((lo, hi)) if hi > lo => {
                let k = ((magnitude - lo) / (hi - lo)).clamp(0.0, 1.0);
                let span = settings.shaft_length_max - settings.shaft_length_min;
                settings.shaft_length_min + k * span
            }
            _ => settings.shaft_length_min,
        },
        ShaftLengthMethod::Scaled => magnitude * settings.shaft_length_scale,
        ShaftLengthMethod::Fixed => settings.shaft_length_fixed,
    }
}

/// Arrow for `vector` anchored at pixel `start`. `None` for zero or
/// undefined vectors, which have no direction.
pub fn arrow(
    settings: &RenderSettings,
    start: DVec2,
    vector: DVec2,
    range: Option<(f64, f64)>,
) -> Option<Arrow> {
    let magnitude = vector.length();
    if !(magnitude > 0.0) || !magnitude.is_finite() {
        return None;
    }
    // pixel rows grow downwards
    let dir = DVec2::new(vector.x, -vector.y) / magnitude;
    let length = shaft_length(settings, magnitude, range);
    let end = start + dir * length;

    let head_length = length * settings.head_length / 100.0;
    let half_width = length * settings.head_width / 100.0 / 2.0;
    let back = end - dir * head_length;
    let across = dir.perp() * half_width;

    Some(Arrow {
        start,
        end,
        head_left: back - across,
        head_right: back + across,
        magnitude,
    })
}

/// Arrows for every visible vector of `output`.
///
/// Vectors are taken at mesh nodes (node outputs) or element centroids
/// (element outputs), or interpolated on a grid when the settings ask for
/// it. Positions outside the view or the mesh, zero vectors and vectors
/// rejected by the magnitude filter are skipped.
pub fn layout_vectors(
    settings: &RenderSettings,
    mesh: &Mesh,
    output: &Output,
    viewport: &Viewport,
) -> Vec<Arrow> {
    if !output.is_vector() {
        log::debug!("output at t={} has no vector values, nothing to lay out", output.time);
        return Vec::new();
    }

    let positions: Vec<(Point, DVec2)> = if settings.display_vectors_on_grid {
        grid_positions(settings, viewport, mesh.extent())
            .filter_map(|p| Some((p, mesh.vector_value_at(output, p)?)))
            .collect()
    } else {
        match output.kind() {
            OutputKind::Node => mesh
                .nodes()
                .iter()
                .enumerate()
                .filter_map(|(i, p)| Some((*p, output.vector(i)?)))
                .collect(),
            OutputKind::Element => (0..mesh.elements().len())
                .filter_map(|e| Some((mesh.element_centroid(e)?, output.vector(e)?)))
                .collect(),
        }
    };

    let range = output.value_range();
    let filter = settings.magnitude_filter;
    let arrows: Vec<Arrow> = positions
        .into_iter()
        .filter(|(p, v)| viewport.contains(*p) && filter.accepts(v.length()))
        .filter_map(|(p, v)| arrow(settings, viewport.map.real_to_pixel(p), v, range))
        .collect();

    log::debug!("laid out {} vector arrows", arrows.len());
    arrows
}

/// Grid points `x_spacing` x `y_spacing` map units apart, aligned to the
/// view's lower left corner and clipped to the part of `extent` in view.
///
/// A spacing finer than one pixel is widened to the smallest multiple of
/// itself that is at least a pixel, so the grid never holds more points
/// than the view has pixels.
fn grid_positions(
    settings: &RenderSettings,
    viewport: &Viewport,
    extent: BBox,
) -> impl Iterator<Item = Point> {
    let mupp = viewport.map.map_units_per_pixel;
    let (xs, ys) = if settings.x_spacing < 1 || settings.y_spacing < 1 {
        log::warn!(
            "grid spacing {}x{} is not drawable",
            settings.x_spacing,
            settings.y_spacing
        );
        (GridAxis::EMPTY, GridAxis::EMPTY)
    } else if !(mupp > 0.0) || !mupp.is_finite() {
        log::warn!("view scale {mupp} map units per pixel has no grid");
        (GridAxis::EMPTY, GridAxis::EMPTY)
    } else {
        let view = viewport.bounds();
        let clip = view.intersection(&extent);
        let dx = settings.x_spacing as f64;
        let dy = settings.y_spacing as f64;
        (
            GridAxis::new(view.min_x, clip.min_x, clip.max_x, dx, mupp),
            GridAxis::new(view.min_y, clip.min_y, clip.max_y, dy, mupp),
        )
    };
    (0..ys.count).flat_map(move |j| (0..xs.count).map(move |i| Point::new(xs.at(i), ys.at(j))))
}

/// Grid lines `origin + k * step` along one axis.
#[derive(Debug, Clone, Copy)]
struct GridAxis {
    origin: f64,
    first: usize,
    step: f64,
    count: usize,
}

impl GridAxis {
    const EMPTY: GridAxis = GridAxis { origin: 0.0, first: 0, step: 0.0, count: 0 };

    /// Lines falling in `[lo, hi]`, at least one pixel of `mupp` apart.
    fn new(origin: f64, lo: f64, hi: f64, spacing: f64, mupp: f64) -> Self {
        let step = if spacing >= mupp { spacing } else { spacing * (mupp / spacing).ceil() };
        let first = ((lo - origin) / step).ceil().max(0.0);
        let last = ((hi - origin) / step).floor();
        if !(last >= first) {
            return Self::EMPTY;
        }
        Self { origin, first: first as usize, step, count: (last - first) as usize + 1 }
    }

    fn at(&self, k: usize) -> f64 {
        self.origin + (self.first + k) as f64 * self.step
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crayfish_core::{DataSet, DataType};

    fn settings() -> RenderSettings {
        let ds = DataSet::new("velocity", DataType::Vector);
        RenderSettings::load(ds.config()).unwrap()
    }

    fn close(a: DVec2, b: DVec2) -> bool {
        (a - b).length() < 1e-9
    }

    /// 2 x 2 cells of 10 units.
    fn mesh() -> Mesh {
        Mesh::regular_grid(Point::ZERO, 10.0, 2, 2)
    }

    fn full_view() -> Viewport {
        Viewport::new(Point::ZERO, 1.0, 20, 20)
    }

    #[test]
    fn test_shaft_length_methods() {
        let mut s = settings();
        assert_eq!(shaft_length(&s, 5.0, Some((0.0, 10.0))), 3.0 + 0.5 * 37.0);
        assert_eq!(shaft_length(&s, 5.0, Some((2.0, 2.0))), 3.0);
        assert_eq!(shaft_length(&s, 50.0, Some((0.0, 10.0))), 40.0);

        s.shaft_length_method = ShaftLengthMethod::Scaled;
        assert_eq!(shaft_length(&s, 2.0, None), 20.0);

        s.shaft_length_method = ShaftLengthMethod::Fixed;
        s.shaft_length_fixed = 7.0;
        assert_eq!(shaft_length(&s, 123.0, None), 7.0);
    }

    #[test]
    fn test_arrow_geometry() {
        let mut s = settings();
        s.shaft_length_method = ShaftLengthMethod::Fixed;
        s.shaft_length_fixed = 10.0;

        let a = arrow(&s, DVec2::new(5.0, 5.0), DVec2::new(2.0, 0.0), None).unwrap();
        assert!(close(a.end, DVec2::new(15.0, 5.0)));
        // head 40% long, 15% wide
        assert!(close(a.head_left, DVec2::new(11.0, 4.25)));
        assert!(close(a.head_right, DVec2::new(11.0, 5.75)));
        assert_eq!(a.magnitude, 2.0);

        // north in map units is up on screen
        let a = arrow(&s, DVec2::new(5.0, 5.0), DVec2::new(0.0, 3.0), None).unwrap();
        assert!(close(a.end, DVec2::new(5.0, -5.0)));
    }

    #[test]
    fn test_zero_vector_has_no_arrow() {
        assert!(arrow(&settings(), DVec2::ZERO, DVec2::ZERO, None).is_none());
    }

    #[test]
    fn test_node_layout_and_filter() {
        let mesh = mesh();
        let vectors = (0..9).map(|i| DVec2::new(i as f64, 0.0)).collect();
        let output = Output::node_vectors(0.0, vectors);
        let mut s = settings();

        // node 0 has a zero vector
        assert_eq!(layout_vectors(&s, &mesh, &output, &full_view()).len(), 8);

        s.magnitude_filter.min = Some(2.0);
        s.magnitude_filter.max = Some(5.0);
        let arrows = layout_vectors(&s, &mesh, &output, &full_view());
        let mags: Vec<f64> = arrows.iter().map(|a| a.magnitude).collect();
        assert_eq!(mags, vec![2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_min_max_uses_output_range() {
        let mesh = mesh();
        let vectors = (0..9).map(|i| DVec2::new(0.0, i as f64)).collect();
        let output = Output::node_vectors(0.0, vectors);
        let arrows = layout_vectors(&settings(), &mesh, &output, &full_view());
        let longest = arrows.last().unwrap();
        assert!(((longest.start - longest.end).length() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_element_layout_at_centroids() {
        let mesh = mesh();
        let output = Output::element_vectors(0.0, vec![DVec2::new(1.0, 1.0); 4]);
        let view = full_view();
        let arrows = layout_vectors(&settings(), &mesh, &output, &view);
        assert_eq!(arrows.len(), 4);
        assert!(close(arrows[0].start, view.map.real_to_pixel(Point::new(5.0, 5.0))));
    }

    #[test]
    fn test_grid_layout() {
        let mesh = mesh();
        let output = Output::node_vectors(0.0, vec![DVec2::new(1.0, 0.0); 9]);
        let mut s = settings();
        s.display_vectors_on_grid = true;
        s.x_spacing = 5;
        s.y_spacing = 10;
        // 5 columns by 3 rows over [0, 20] x [0, 20]
        assert_eq!(layout_vectors(&s, &mesh, &output, &full_view()).len(), 15);

        s.x_spacing = 0;
        assert!(layout_vectors(&s, &mesh, &output, &full_view()).is_empty());
    }

    #[test]
    fn test_grid_is_clipped_to_mesh() {
        let mesh = mesh();
        let output = Output::node_vectors(0.0, vec![DVec2::new(1.0, 0.0); 9]);
        let mut s = settings();
        s.display_vectors_on_grid = true;
        s.x_spacing = 5;
        s.y_spacing = 5;
        // view spans [-100, 200], only [0, 20] of it holds mesh
        let view = Viewport::new(Point::new(-100.0, -100.0), 1.0, 300, 300);
        let arrows = layout_vectors(&s, &mesh, &output, &view);
        assert_eq!(arrows.len(), 25);
        assert!(close(arrows[0].start, view.map.real_to_pixel(Point::ZERO)));
    }

    #[test]
    fn test_grid_finer_than_a_pixel_is_widened() {
        let mesh = mesh();
        let output = Output::node_vectors(0.0, vec![DVec2::new(1.0, 0.0); 9]);
        let mut s = settings();
        s.display_vectors_on_grid = true;
        s.x_spacing = 1;
        s.y_spacing = 1;

        // 2.5 map units per pixel: every third grid line, 7 x 7 over [0, 20]
        let view = Viewport::new(Point::ZERO, 2.5, 8, 8);
        assert_eq!(layout_vectors(&s, &mesh, &output, &view).len(), 49);

        // a huge zoomed out view collapses the mesh to a single pixel
        let view = Viewport::new(Point::ZERO, 500.0, 2000, 2000);
        assert_eq!(layout_vectors(&s, &mesh, &output, &view).len(), 1);
    }

    #[test]
    fn test_grid_over_huge_view_only_visits_mesh() {
        let mesh = mesh();
        let output = Output::node_vectors(0.0, vec![DVec2::new(1.0, 0.0); 9]);
        let mut s = settings();
        s.display_vectors_on_grid = true;
        s.x_spacing = 1;
        s.y_spacing = 1;
        let view = Viewport::new(Point::ZERO, 1e-3, u32::MAX, u32::MAX);
        assert_eq!(layout_vectors(&s, &mesh, &output, &view).len(), 21 * 21);

        let view = Viewport::new(Point::ZERO, 0.0, 100, 100);
        assert!(layout_vectors(&s, &mesh, &output, &view).is_empty());
    }

    #[test]
    fn test_positions_outside_view_are_skipped() {
        let mesh = mesh();
        let output = Output::node_vectors(0.0, vec![DVec2::new(1.0, 0.0); 9]);
        let view = Viewport::new(Point::ZERO, 1.0, 10, 10);
        assert_eq!(layout_vectors(&settings(), &mesh, &output, &view).len(), 4);
    }

    #[test]
    fn test_scalar_output_has_no_arrows() {
        let output = Output::node(0.0, vec![1.0; 9]);
        assert!(layout_vectors(&settings(), &mesh(), &output, &full_view()).is_empty());
    }
}
