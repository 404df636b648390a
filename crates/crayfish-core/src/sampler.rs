//! Sampling of mesh outputs along lines (cross sections) and over time.
//!
//! [`sample`] walks a polyline at a regular interval and queries a field at
//! each point. The result is a lazy iterator: nothing is evaluated until it
//! is consumed, and a caller may stop early without paying for the rest of
//! the line.

use crate::dataset::DataSet;
use crate::mesh::{Mesh, MeshOutput};
use crate::output::Output;
use crate::point::Point;
use crate::shape::Polyline;
use std::iter::FusedIterator;

/// Anything that can report a scalar value at a 2D coordinate.
///
/// `None` means the point lies outside the field's coverage.
pub trait FieldQuery {
    fn value_at(&self, p: Point) -> Option<f64>;
}

impl<T: FieldQuery + ?Sized> FieldQuery for &T {
    fn value_at(&self, p: Point) -> Option<f64> {
        (**self).value_at(p)
    }
}

/// Adapts a closure into a [`FieldQuery`].
#[derive(Clone, Copy)]
pub struct FnField<F>(pub F);

impl<F: Fn(Point) -> Option<f64>> FieldQuery for FnField<F> {
    fn value_at(&self, p: Point) -> Option<f64> {
        (self.0)(p)
    }
}

/// How densely to sample a line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    /// This many equally spaced points, both line ends included.
    Steps(usize),
    /// A point every `spacing` mesh units from the start, plus the end point.
    Spacing(f64),
}

/// One point of a cross section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Distance along the line from its first vertex.
    pub distance: f64,
    /// Field value, or `None` outside the mesh.
    pub value: Option<f64>,
}

/// Lazy sequence of samples along a line.
///
/// Distances are strictly increasing. Cloning (or [`SampleSeries::rewind`])
/// gives an independent pass from the start.
pub struct SampleSeries<'a, F> {
    field: F,
    vertices: &'a [Point],
    cumulative: Vec<f64>,
    length: f64,
    step: f64,
    count: usize,
    index: usize,
    segment: usize,
}

impl<'a, F: FieldQuery> SampleSeries<'a, F> {
    fn new(field: F, line: &'a Polyline, resolution: Resolution) -> Self {
        let cumulative = line.cumulative_lengths();
        let length = cumulative.last().copied().unwrap_or(0.0);
        let (count, step) = if length > 0.0 && length.is_finite() {
            plan(length, resolution)
        } else {
            (0, 0.0)
        };
        Self {
            field,
            vertices: line.vertices(),
            cumulative,
            length,
            step,
            count,
            index: 0,
            segment: 0,
        }
    }

    /// Total length of the sampled line.
    pub fn line_length(&self) -> f64 {
        self.length
    }

    /// Start over from the first sample.
    pub fn rewind(&mut self) {
        self.index = 0;
        self.segment = 0;
    }

    /// Drain into parallel distance and value columns for plotting.
    pub fn collect_xy(self) -> (Vec<f64>, Vec<Option<f64>>) {
        self.map(|s| (s.distance, s.value)).unzip()
    }

    fn distance(&self, i: usize) -> f64 {
        if self.count >= 2 && i == self.count - 1 {
            self.length
        } else {
            i as f64 * self.step
        }
    }

    /// Point at `d`, advancing the segment cursor. `d` never decreases
    /// between calls within one pass.
    fn point_at(&mut self, d: f64) -> Point {
        let last = self.cumulative.len() - 1;
        while self.segment + 1 < last && self.cumulative[self.segment + 1] < d {
            self.segment += 1;
        }
        let seg = self.segment;
        let seg_len = self.cumulative[seg + 1] - self.cumulative[seg];
        let t = if seg_len > 0.0 {
            ((d - self.cumulative[seg]) / seg_len).clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.vertices[seg].lerp(&self.vertices[seg + 1], t)
    }
}

/// Upper bound on the number of samples in one series.
///
/// Keeps `i * step` exact enough that consecutive distances stay strictly
/// increasing. Finer resolutions give an empty series.
pub const MAX_SAMPLES: usize = 1 << 31;

/// Number of samples and the interval between them for a non-empty line.
fn plan(length: f64, resolution: Resolution) -> (usize, f64) {
    match resolution {
        Resolution::Steps(0) => (0, 0.0),
        Resolution::Steps(1) => (1, 0.0),
        Resolution::Steps(n) if n <= MAX_SAMPLES => (n, length / (n - 1) as f64),
        Resolution::Spacing(s) if s > 0.0 && s.is_finite() => {
            let intervals = (length / s).ceil();
            if !(intervals < MAX_SAMPLES as f64) {
                log::warn!("spacing {s} over length {length} needs too many samples");
                return (0, 0.0);
            }
            let mut below = intervals as usize;
            // guard against rounding putting the last interior point on the end
            while below > 1 && (below - 1) as f64 * s >= length {
                below -= 1;
            }
            (below + 1, s)
        }
        Resolution::Steps(n) => {
            log::warn!("{n} steps exceed the sample limit");
            (0, 0.0)
        }
        Resolution::Spacing(_) => (0, 0.0),
    }
}

impl<F: FieldQuery> Iterator for SampleSeries<'_, F> {
    type Item = Sample;

    fn next(&mut self) -> Option<Sample> {
        if self.index >= self.count {
            return None;
        }
        let distance = self.distance(self.index);
        let p = self.point_at(distance);
        self.index += 1;
        Some(Sample { distance, value: self.field.value_at(p) })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count - self.index;
        (remaining, Some(remaining))
    }
}

impl<F: FieldQuery> ExactSizeIterator for SampleSeries<'_, F> {}

impl<F: FieldQuery> FusedIterator for SampleSeries<'_, F> {}

impl<F: Clone> Clone for SampleSeries<'_, F> {
    fn clone(&self) -> Self {
        Self {
            field: self.field.clone(),
            vertices: self.vertices,
            cumulative: self.cumulative.clone(),
            length: self.length,
            step: self.step,
            count: self.count,
            index: self.index,
            segment: self.segment,
        }
    }
}

/// Sample `field` along `line`.
///
/// Empty and zero-length lines, zero step counts, non-positive spacings and
/// resolutions needing more than [`MAX_SAMPLES`] points all give an empty
/// series.
pub fn sample<F: FieldQuery>(
    field: F,
    line: &Polyline,
    resolution: Resolution,
) -> SampleSeries<'_, F> {
    SampleSeries::new(field, line, resolution)
}

/// Cross section of one mesh output along `line`.
pub fn cross_section<'a>(
    mesh: &'a Mesh,
    output: &'a Output,
    line: &'a Polyline,
    resolution: Resolution,
) -> SampleSeries<'a, MeshOutput<'a>> {
    sample(mesh.bind(output), line, resolution)
}

/// Value at `point` for every output of `dataset`, as `(time, value)` pairs.
pub fn time_series(mesh: &Mesh, dataset: &DataSet, point: Point) -> Vec<(f64, Option<f64>)> {
    // every output shares the mesh, so locate once
    let location = mesh.locate(point);
    dataset
        .outputs()
        .iter()
        .map(|o| {
            let value = location.and_then(|loc| mesh.value_at_location(o, &loc));
            (o.time, value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x_field() -> FnField<impl Fn(Point) -> Option<f64> + Clone> {
        FnField(|p: Point| Some(p.x))
    }

    fn distances(line: &Polyline, resolution: Resolution) -> Vec<f64> {
        sample(x_field(), line, resolution).map(|s| s.distance).collect()
    }

    #[test]
    fn test_steps_include_both_ends() {
        let line = Polyline::from_coords(&[(0.0, 0.0), (10.0, 0.0)]);
        let d = distances(&line, Resolution::Steps(3));
        assert_eq!(d, vec![0.0, 5.0, 10.0]);
    }

    #[test]
    fn test_single_step_is_start_point() {
        let line = Polyline::from_coords(&[(2.0, 0.0), (10.0, 0.0)]);
        let s: Vec<Sample> = sample(x_field(), &line, Resolution::Steps(1)).collect();
        assert_eq!(s, vec![Sample { distance: 0.0, value: Some(2.0) }]);
        assert_eq!(sample(x_field(), &line, Resolution::Steps(0)).count(), 0);
    }

    #[test]
    fn test_spacing_appends_end_point() {
        let line = Polyline::from_coords(&[(0.0, 0.0), (10.0, 0.0)]);
        let d = distances(&line, Resolution::Spacing(3.0));
        assert_eq!(d, vec![0.0, 3.0, 6.0, 9.0, 10.0]);
        // exact multiple: no duplicate end point
        let d = distances(&line, Resolution::Spacing(2.5));
        assert_eq!(d, vec![0.0, 2.5, 5.0, 7.5, 10.0]);
    }

    #[test]
    fn test_spacing_longer_than_line() {
        let line = Polyline::from_coords(&[(0.0, 0.0), (1.0, 0.0)]);
        let d = distances(&line, Resolution::Spacing(50.0));
        assert_eq!(d, vec![0.0, 1.0]);
    }

    #[test]
    fn test_invalid_spacing_is_empty() {
        let line = Polyline::from_coords(&[(0.0, 0.0), (1.0, 0.0)]);
        assert_eq!(sample(x_field(), &line, Resolution::Spacing(0.0)).count(), 0);
        assert_eq!(sample(x_field(), &line, Resolution::Spacing(-1.0)).count(), 0);
        assert_eq!(sample(x_field(), &line, Resolution::Spacing(f64::NAN)).count(), 0);
    }

    #[test]
    fn test_too_fine_resolution_is_empty() {
        let line = Polyline::from_coords(&[(0.0, 0.0), (1.0, 0.0)]);
        assert_eq!(sample(x_field(), &line, Resolution::Spacing(1e-300)).len(), 0);
        assert_eq!(sample(x_field(), &line, Resolution::Spacing(f64::MIN_POSITIVE)).len(), 0);
        assert_eq!(sample(x_field(), &line, Resolution::Steps(usize::MAX)).len(), 0);
        assert_eq!(sample(x_field(), &line, Resolution::Steps(MAX_SAMPLES + 1)).len(), 0);

        // the largest allowed count is still lazy and ordered at the far end
        let mut series = sample(x_field(), &line, Resolution::Steps(MAX_SAMPLES));
        assert_eq!(series.len(), MAX_SAMPLES);
        let first = series.next().unwrap();
        let second = series.next().unwrap();
        assert!(first.distance < second.distance);
    }

    #[test]
    fn test_fine_spacing_stays_strictly_increasing() {
        let line = Polyline::from_coords(&[(0.0, 0.0), (1.0, 0.0)]);
        let spacing = 1.0 / (1u32 << 20) as f64;
        let d = distances(&line, Resolution::Spacing(spacing));
        assert_eq!(d.len(), (1 << 20) + 1);
        assert!(d.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(d.last(), Some(&1.0));
    }

    #[test]
    fn test_follows_bends() {
        // L-shaped line, 10 along x then 10 up y
        let line = Polyline::from_coords(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]);
        let field = FnField(|p: Point| Some(p.x + 100.0 * p.y));
        let s: Vec<Sample> = sample(field, &line, Resolution::Steps(5)).collect();
        let values: Vec<f64> = s.iter().map(|s| s.value.unwrap()).collect();
        assert_eq!(values, vec![0.0, 5.0, 10.0, 510.0, 1010.0]);
    }

    #[test]
    fn test_exact_size_and_early_stop() {
        let line = Polyline::from_coords(&[(0.0, 0.0), (100.0, 0.0)]);
        let mut series = sample(x_field(), &line, Resolution::Spacing(1.0));
        assert_eq!(series.len(), 101);
        let first: Vec<Sample> = series.by_ref().take(3).collect();
        assert_eq!(first.len(), 3);
        assert_eq!(series.len(), 98);
    }

    #[test]
    fn test_clone_and_rewind_restart() {
        let line = Polyline::from_coords(&[(0.0, 0.0), (4.0, 0.0)]);
        let mut series = sample(x_field(), &line, Resolution::Steps(5));
        let fresh = series.clone();
        let a: Vec<Sample> = series.by_ref().collect();
        assert_eq!(series.next(), None);
        series.rewind();
        let b: Vec<Sample> = series.collect();
        let c: Vec<Sample> = fresh.collect();
        assert_eq!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn test_collect_xy() {
        let line = Polyline::from_coords(&[(0.0, 0.0), (2.0, 0.0)]);
        let field = FnField(|p: Point| if p.x < 1.5 { Some(p.x) } else { None });
        let (x, y) = sample(field, &line, Resolution::Steps(3)).collect_xy();
        assert_eq!(x, vec![0.0, 1.0, 2.0]);
        assert_eq!(y, vec![Some(0.0), Some(1.0), None]);
    }

    #[test]
    fn test_degenerate_lines_are_empty() {
        let empty = Polyline::default();
        assert_eq!(sample(x_field(), &empty, Resolution::Steps(10)).count(), 0);
        let point = Polyline::from_coords(&[(1.0, 1.0), (1.0, 1.0)]);
        assert_eq!(sample(x_field(), &point, Resolution::Steps(10)).count(), 0);
    }
}
