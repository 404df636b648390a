use crate::settings::Field;
use thiserror::Error;

/// A render setting outside its allowed range. Raised by
/// [`RenderSettings::validate`](crate::RenderSettings::validate) and by a
/// refused commit.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("minimum shaft length ({min}) must be less than maximum ({max})")]
    ShaftLengthOrder { min: f64, max: f64 },

    #[error("{field} must not be negative, got {value}")]
    NegativeShaftLength { field: Field, value: f64 },

    #[error("{field} must be greater than zero, got {value}")]
    NonPositive { field: Field, value: f64 },

    #[error("{field} must not be negative, got {value}")]
    Negative { field: Field, value: f64 },

    #[error("{field} must be a finite number, got {value}")]
    NotFinite { field: Field, value: f64 },

    #[error("{field} must be at least 1 when vectors are drawn on a grid, got {value}")]
    GridSpacing { field: Field, value: i32 },

    #[error("line width must be at least 1, got {0}")]
    LineWidth(i32),
}

impl ValidationError {
    /// The setting that failed. Order errors report the minimum.
    pub fn field(&self) -> Field {
        match self {
            ValidationError::ShaftLengthOrder { .. } => Field::ShaftLengthMin,
            ValidationError::NegativeShaftLength { field, .. }
            | ValidationError::NonPositive { field, .. }
            | ValidationError::Negative { field, .. }
            | ValidationError::NotFinite { field, .. }
            | ValidationError::GridSpacing { field, .. } => *field,
            ValidationError::LineWidth(_) => Field::LineWidth,
        }
    }
}
