use crate::config::{vector_defaults, ConfigStore};
use crate::output::Output;

/// Whether a dataset holds scalars or 2D vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Scalar,
    Vector,
}

/// A named quantity (depth, velocity, ...) over a mesh, one output per time step.
#[derive(Debug, Clone)]
pub struct DataSet {
    name: String,
    data_type: DataType,
    outputs: Vec<Output>,
    config: ConfigStore,
}

impl DataSet {
    /// Create an empty dataset whose configuration holds the rendering defaults.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        let name = name.into();
        let mut config = ConfigStore::new();
        config.set_all(vector_defaults());
        log::debug!("dataset '{}' created with {} config keys", name, config.len());
        Self { name, data_type, outputs: Vec::new(), config }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn add_output(&mut self, output: Output) {
        self.outputs.push(output);
    }

    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    pub fn output(&self, time_index: usize) -> Option<&Output> {
        self.outputs.get(time_index)
    }

    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_time_varying(&self) -> bool {
        self.outputs.len() > 1
    }

    pub fn times(&self) -> Vec<f64> {
        self.outputs.iter().map(|o| o.time).collect()
    }

    /// Minimum and maximum over every output.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.outputs
            .iter()
            .filter_map(Output::value_range)
            .reduce(|(lo, hi), (l, h)| (lo.min(l), hi.max(h)))
    }

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    /// Mutable access to the stored configuration.
    ///
    /// Holding this borrow is what makes an editor the only writer for the
    /// dataset; hosts sharing a dataset across threads wrap it in a lock.
    pub fn config_mut(&mut self) -> &mut ConfigStore {
        &mut self.config
    }
}
