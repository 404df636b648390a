pub mod error;
pub mod settings;
pub mod text;
pub mod vectors;
pub mod view;

pub use error::ValidationError;
pub use settings::{Field, MagnitudeFilter, RenderSettings, ShaftLengthMethod};
pub use vectors::{arrow, layout_vectors, shaft_length, Arrow};
pub use view::{MapToPixel, Viewport};
