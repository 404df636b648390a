use thiserror::Error;

/// Errors reading typed values out of a dataset's configuration store.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A required key is absent. The dataset populates every key on
    /// creation, so this means the store is corrupt or predates the key.
    #[error("missing configuration key '{0}'")]
    Missing(String),

    /// The key exists but holds a value of another kind.
    #[error("configuration key '{key}' is not a valid {expected}")]
    WrongType { key: String, expected: &'static str },
}

/// Errors building a mesh from nodes and elements.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeshError {
    #[error("element {element} references node {index}, mesh has {node_count} nodes")]
    NodeIndex {
        element: usize,
        index: usize,
        node_count: usize,
    },

    #[error("element {element} needs at least {required} nodes, has {actual}")]
    TooFewNodes {
        element: usize,
        required: usize,
        actual: usize,
    },
}

/// Errors combining datasets in a calculation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    #[error("no dataset named '{0}'")]
    UnknownDataset(String),

    #[error("dataset '{0}' has no outputs")]
    EmptyDataset(String),

    #[error("dataset '{dataset}' has {actual} time steps, expected {expected}")]
    StepCount {
        dataset: String,
        expected: usize,
        actual: usize,
    },

    #[error("dataset '{dataset}' step {index} is at t={actual}, expected t={expected}")]
    TimeMismatch {
        dataset: String,
        index: usize,
        expected: f64,
        actual: f64,
    },

    #[error("dataset '{dataset}' has no output for step {index}")]
    MissingOutput { dataset: String, index: usize },

    #[error("dataset '{0}' mixes node and element outputs")]
    MixedKinds(String),
}
