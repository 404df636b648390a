pub mod point;
pub mod shape;
pub mod config;
pub mod error;
pub mod output;
pub mod dataset;
pub mod mesh;
pub mod spatial_index;
pub mod sampler;
pub mod calc;

pub use point::Point;
pub use shape::{Shape, Segment, Polyline};
pub use config::{ConfigStore, ConfigValue, Rgba};
pub use error::{CalcError, ConfigError, MeshError};
pub use output::{Output, OutputKind, NODATA};
pub use dataset::{DataSet, DataType};
pub use mesh::{BBox, Element, ElementType, Location, Mesh, MeshOutput};
pub use sampler::{
    cross_section, sample, time_series, FieldQuery, FnField, Resolution, Sample, SampleSeries,
    MAX_SAMPLES,
};
pub use calc::{Aggregate, BinaryOp, DataSetCalculator, UnaryOp};
