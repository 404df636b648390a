//! Arithmetic on datasets, the building blocks of a mesh calculator.
//!
//! A [`DataSetCalculator`] first checks that the datasets taking part share
//! one time axis, then combines them output by output. Undefined values
//! propagate: an operation with an undefined operand is undefined, and so is
//! any result that is not a finite number.

use crate::dataset::{DataSet, DataType};
use crate::error::CalcError;
use crate::mesh::Mesh;
use crate::output::{Output, OutputKind, NODATA};

/// Two time steps closer than this are the same step.
const TIME_TOL: f64 = 1e-5;

/// Operations on one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// 1 for zero, 0 otherwise.
    Not,
    Negate,
    Abs,
}

impl UnaryOp {
    pub fn apply(self, a: f64) -> f64 {
        match self {
            UnaryOp::Not => truth(a == 0.0),
            UnaryOp::Negate => -a,
            UnaryOp::Abs => a.abs(),
        }
    }
}

/// Operations on two values. Comparisons and logic give 1 or 0; any
/// non-zero value counts as true.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    /// Undefined for a zero divisor.
    Divide,
    Power,
    Equal,
    NotEqual,
    Greater,
    GreaterEqual,
    Lesser,
    LesserEqual,
    And,
    Or,
    Min,
    Max,
    /// The first value where the second is true, undefined elsewhere.
    Filter,
}

impl BinaryOp {
    pub fn apply(self, a: f64, b: f64) -> Option<f64> {
        let v = match self {
            BinaryOp::Add => a + b,
            BinaryOp::Subtract => a - b,
            BinaryOp::Multiply => a * b,
            BinaryOp::Divide if b == 0.0 => return None,
            BinaryOp::Divide => a / b,
            BinaryOp::Power => a.powf(b),
            BinaryOp::Equal => truth(a == b),
            BinaryOp::NotEqual => truth(a != b),
            BinaryOp::Greater => truth(a > b),
            BinaryOp::GreaterEqual => truth(a >= b),
            BinaryOp::Lesser => truth(a < b),
            BinaryOp::LesserEqual => truth(a <= b),
            BinaryOp::And => truth(a != 0.0 && b != 0.0),
            BinaryOp::Or => truth(a != 0.0 || b != 0.0),
            BinaryOp::Min => a.min(b),
            BinaryOp::Max => a.max(b),
            BinaryOp::Filter if b != 0.0 => a,
            BinaryOp::Filter => return None,
        };
        v.is_finite().then_some(v)
    }
}

/// Reductions of a dataset over all of its time steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Sum,
    Min,
    Max,
    Average,
}

impl Aggregate {
    /// `None` when no value is defined.
    pub fn apply(self, values: impl IntoIterator<Item = f64>) -> Option<f64> {
        let mut count = 0usize;
        let mut acc: Option<f64> = None;
        for v in values {
            count += 1;
            acc = Some(match (self, acc) {
                (_, None) => v,
                (Aggregate::Sum | Aggregate::Average, Some(a)) => a + v,
                (Aggregate::Min, Some(a)) => a.min(v),
                (Aggregate::Max, Some(a)) => a.max(v),
            });
        }
        match self {
            Aggregate::Average => acc.map(|sum| sum / count as f64),
            _ => acc,
        }
    }
}

fn truth(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// Combines datasets defined on one mesh.
///
/// Datasets with a single output are static and take part in every time
/// step. Time-varying datasets must all have the same steps.
#[derive(Debug, Clone)]
pub struct DataSetCalculator<'a> {
    mesh: &'a Mesh,
    times: Vec<f64>,
}

impl<'a> DataSetCalculator<'a> {
    /// Check the named datasets of `mesh` against each other.
    pub fn new(mesh: &'a Mesh, names: &[&str]) -> Result<Self, CalcError> {
        let mut times: Option<Vec<f64>> = None;
        for &name in names {
            let dataset = mesh
                .dataset_by_name(name)
                .ok_or_else(|| CalcError::UnknownDataset(name.to_string()))?;
            if dataset.output_count() == 0 {
                return Err(CalcError::EmptyDataset(name.to_string()));
            }
            if !dataset.is_time_varying() {
                continue;
            }
            let steps = dataset.times();
            if let Some(expected) = &times {
                check_steps(name, expected, &steps)?;
            } else {
                times = Some(steps);
            }
        }
        let times = times.unwrap_or_else(|| vec![0.0]);
        log::debug!("calculator over {} datasets, {} time steps", names.len(), times.len());
        Ok(Self { mesh, times })
    }

    /// Shared time steps; a single zero when every dataset is static.
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Static dataset holding `value` at every node.
    pub fn number(&self, value: f64) -> DataSet {
        let stored = if value.is_finite() { value } else { NODATA };
        let mut result = DataSet::new("number", DataType::Scalar);
        result.add_output(Output::node(0.0, vec![stored; self.mesh.nodes().len()]));
        result
    }

    pub fn ones(&self) -> DataSet {
        self.number(1.0)
    }

    pub fn nodata(&self) -> DataSet {
        self.number(NODATA)
    }

    /// Apply `op` to every value of every output.
    pub fn unary(&self, op: UnaryOp, dataset: &DataSet) -> DataSet {
        let mut result = DataSet::new(dataset.name(), DataType::Scalar);
        for output in dataset.outputs() {
            let values = (0..output.len())
                .map(|i| output.value(i).map(|a| op.apply(a)))
                .map(store_value)
                .collect();
            let active = activity(self.mesh, output);
            result.add_output(like_output(output, values, output.time, active));
        }
        result
    }

    /// Combine two datasets step by step.
    ///
    /// The result has a step per shared time if either input varies in
    /// time, otherwise one. Inputs of the same kind combine value by value;
    /// a node input meeting an element input is evaluated at element
    /// centroids and gives an element result.
    pub fn binary(&self, op: BinaryOp, a: &DataSet, b: &DataSet) -> Result<DataSet, CalcError> {
        let steps = if a.is_time_varying() || b.is_time_varying() { self.times.len() } else { 1 };
        let name = format!("{} {:?} {}", a.name(), op, b.name());
        let mut result = DataSet::new(name, DataType::Scalar);

        for step in 0..steps {
            let oa = step_output(a, step)?;
            let ob = step_output(b, step)?;
            let time = if steps > 1 { self.times[step] } else { oa.time };

            let output = if oa.kind() == ob.kind() {
                let values = (0..oa.len().max(ob.len()))
                    .map(|i| op.apply(oa.value(i)?, ob.value(i)?))
                    .map(store_value)
                    .collect();
                let active = match (activity(self.mesh, oa), activity(self.mesh, ob)) {
                    (Some(x), Some(y)) => {
                        Some(x.iter().zip(&y).map(|(p, q)| *p && *q).collect())
                    }
                    (x, y) => x.or(y),
                };
                like_output(oa, values, time, active)
            } else {
                let values = (0..self.mesh.elements().len())
                    .map(|e| {
                        let va = self.element_value(oa, e)?;
                        op.apply(va, self.element_value(ob, e)?)
                    })
                    .map(store_value)
                    .collect();
                Output::element(time, values)
            };
            result.add_output(output);
        }
        log::debug!("{:?} of '{}' and '{}' over {} steps", op, a.name(), b.name(), steps);
        Ok(result)
    }

    /// Reduce every node (or element) of `dataset` over its time steps.
    ///
    /// Undefined values are skipped; a place with none defined stays
    /// undefined.
    pub fn aggregate(&self, op: Aggregate, dataset: &DataSet) -> Result<DataSet, CalcError> {
        let outputs = dataset.outputs();
        let first = outputs
            .first()
            .ok_or_else(|| CalcError::EmptyDataset(dataset.name().to_string()))?;
        if outputs.iter().any(|o| o.kind() != first.kind()) {
            return Err(CalcError::MixedKinds(dataset.name().to_string()));
        }

        let len = outputs.iter().map(Output::len).max().unwrap_or(0);
        let values = (0..len)
            .map(|i| op.apply(outputs.iter().filter_map(|o| o.value(i))))
            .map(store_value)
            .collect();
        let name = format!("{:?} of {}", op, dataset.name());
        let mut result = DataSet::new(name, DataType::Scalar);
        result.add_output(match first.kind() {
            OutputKind::Node => Output::node(0.0, values),
            OutputKind::Element => Output::element(0.0, values),
        });
        Ok(result)
    }

    /// Value of `output` representing element `e`: its own value for element
    /// outputs, the interpolated value at the centroid for node outputs.
    fn element_value(&self, output: &Output, e: usize) -> Option<f64> {
        match output.kind() {
            OutputKind::Element => output.value(e),
            OutputKind::Node => {
                let centroid = self.mesh.element_centroid(e)?;
                let loc = self.mesh.locate_in(e, centroid)?;
                self.mesh.value_at_location(output, &loc)
            }
        }
    }
}

fn check_steps(name: &str, expected: &[f64], actual: &[f64]) -> Result<(), CalcError> {
    if actual.len() != expected.len() {
        return Err(CalcError::StepCount {
            dataset: name.to_string(),
            expected: expected.len(),
            actual: actual.len(),
        });
    }
    for (index, (&e, &a)) in expected.iter().zip(actual).enumerate() {
        if (e - a).abs() > TIME_TOL {
            return Err(CalcError::TimeMismatch {
                dataset: name.to_string(),
                index,
                expected: e,
                actual: a,
            });
        }
    }
    Ok(())
}

/// Output of the same kind as `like` holding `values`.
fn like_output(like: &Output, values: Vec<f64>, time: f64, active: Option<Vec<bool>>) -> Output {
    match (like.kind(), active) {
        (OutputKind::Node, Some(active)) => Output::node(time, values).with_active(active),
        (OutputKind::Node, None) => Output::node(time, values),
        (OutputKind::Element, _) => Output::element(time, values),
    }
}

/// Output used for `step`: static datasets reuse their only output.
fn step_output(dataset: &DataSet, step: usize) -> Result<&Output, CalcError> {
    let index = if dataset.is_time_varying() { step } else { 0 };
    dataset.output(index).ok_or_else(|| CalcError::MissingOutput {
        dataset: dataset.name().to_string(),
        index,
    })
}

/// Per-element activity of a node output, `None` when every element is active.
fn activity(mesh: &Mesh, output: &Output) -> Option<Vec<bool>> {
    if output.kind() != OutputKind::Node {
        return None;
    }
    let flags: Vec<bool> = (0..mesh.elements().len()).map(|e| output.is_active(e)).collect();
    flags.iter().any(|a| !a).then_some(flags)
}

fn store_value(v: Option<f64>) -> f64 {
    v.unwrap_or(NODATA)
}
