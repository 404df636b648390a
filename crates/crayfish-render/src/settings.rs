//! Vector rendering settings of one dataset.
//!
//! [`RenderSettings`] is a working copy of the 16 `v_*` keys in a dataset's
//! [`ConfigStore`]. Edits only touch the copy; nothing reaches the store
//! until [`RenderSettings::commit`] succeeds, so an editor can hold
//! half-typed or invalid values without corrupting what is stored.

use crate::error::ValidationError;
use crate::text::{parse_float_or_zero, parse_int};
use crayfish_core::config::{keys, FILTER_UNSET};
use crayfish_core::{ConfigError, ConfigStore, ConfigValue, Rgba};
use std::fmt;
use std::time::Duration;

/// How the shaft length of a vector arrow is derived from its magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShaftLengthMethod {
    /// Magnitudes map linearly onto `[min, max]` pixels.
    #[default]
    MinMax,
    /// Magnitude times a scale factor.
    Scaled,
    /// Every arrow has the same length.
    Fixed,
}

impl ShaftLengthMethod {
    pub fn from_index(index: i64) -> Option<Self> {
        match index {
            0 => Some(ShaftLengthMethod::MinMax),
            1 => Some(ShaftLengthMethod::Scaled),
            2 => Some(ShaftLengthMethod::Fixed),
            _ => None,
        }
    }

    /// Stored index: 0 = MinMax, 1 = Scaled, 2 = Fixed.
    pub fn index(self) -> i64 {
        match self {
            ShaftLengthMethod::MinMax => 0,
            ShaftLengthMethod::Scaled => 1,
            ShaftLengthMethod::Fixed => 2,
        }
    }
}

/// Optional lower and upper magnitude bounds. Vectors outside are not drawn.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MagnitudeFilter {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl MagnitudeFilter {
    pub const NONE: MagnitudeFilter = MagnitudeFilter { min: None, max: None };

    pub fn is_active(&self) -> bool {
        self.min.is_some() || self.max.is_some()
    }

    /// Inclusive on both bounds.
    pub fn accepts(&self, magnitude: f64) -> bool {
        self.min.map_or(true, |min| magnitude >= min)
            && self.max.map_or(true, |max| magnitude <= max)
    }
}

/// One editable setting, for text edits and error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    ShaftLengthMethod,
    ShaftLengthMin,
    ShaftLengthMax,
    ShaftLengthScale,
    ShaftLengthFixed,
    LineWidth,
    HeadWidth,
    HeadLength,
    DisplayVectorsOnGrid,
    XSpacing,
    YSpacing,
    FilterMin,
    FilterMax,
    Color,
    DisplayTrace,
    Fps,
}

impl Field {
    pub const ALL: [Field; 16] = [
        Field::ShaftLengthMethod,
        Field::ShaftLengthMin,
        Field::ShaftLengthMax,
        Field::ShaftLengthScale,
        Field::ShaftLengthFixed,
        Field::LineWidth,
        Field::HeadWidth,
        Field::HeadLength,
        Field::DisplayVectorsOnGrid,
        Field::XSpacing,
        Field::YSpacing,
        Field::FilterMin,
        Field::FilterMax,
        Field::Color,
        Field::DisplayTrace,
        Field::Fps,
    ];

    /// Store key holding this setting.
    pub fn key(self) -> &'static str {
        match self {
            Field::ShaftLengthMethod => keys::SHAFT_LENGTH_METHOD,
            Field::ShaftLengthMin => keys::SHAFT_LENGTH_MIN,
            Field::ShaftLengthMax => keys::SHAFT_LENGTH_MAX,
            Field::ShaftLengthScale => keys::SHAFT_LENGTH_SCALE,
            Field::ShaftLengthFixed => keys::SHAFT_LENGTH_FIXED,
            Field::LineWidth => keys::PEN_WIDTH,
            Field::HeadWidth => keys::HEAD_WIDTH,
            Field::HeadLength => keys::HEAD_LENGTH,
            Field::DisplayVectorsOnGrid => keys::GRID,
            Field::XSpacing => keys::GRID_X,
            Field::YSpacing => keys::GRID_Y,
            Field::FilterMin => keys::FILTER_MIN,
            Field::FilterMax => keys::FILTER_MAX,
            Field::Color => keys::COLOR,
            Field::DisplayTrace => keys::TRACE,
            Field::Fps => keys::FPS,
        }
    }

    /// Human readable name.
    pub fn label(self) -> &'static str {
        match self {
            Field::ShaftLengthMethod => "shaft length method",
            Field::ShaftLengthMin => "minimum shaft length",
            Field::ShaftLengthMax => "maximum shaft length",
            Field::ShaftLengthScale => "shaft length scale",
            Field::ShaftLengthFixed => "fixed shaft length",
            Field::LineWidth => "line width",
            Field::HeadWidth => "head width",
            Field::HeadLength => "head length",
            Field::DisplayVectorsOnGrid => "grid display",
            Field::XSpacing => "x spacing",
            Field::YSpacing => "y spacing",
            Field::FilterMin => "minimum magnitude",
            Field::FilterMax => "maximum magnitude",
            Field::Color => "color",
            Field::DisplayTrace => "trace display",
            Field::Fps => "fps",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How a vector dataset is drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    pub shaft_length_method: ShaftLengthMethod,
    /// Shortest arrow in pixels (MinMax). Range: >= 0, below `shaft_length_max`
    pub shaft_length_min: f64,
    /// Longest arrow in pixels (MinMax). Range: >= 0
    pub shaft_length_max: f64,
    /// Pixels per unit of magnitude (Scaled). Range: > 0
    pub shaft_length_scale: f64,
    /// Arrow length in pixels (Fixed). Range: > 0
    pub shaft_length_fixed: f64,
    /// Pen width in pixels. Range: >= 1
    pub line_width: i32,
    /// Arrow head width, percent of the shaft length. Range: >= 0
    pub head_width: f64,
    /// Arrow head length, percent of the shaft length. Range: >= 0
    pub head_length: f64,
    /// Draw vectors on a regular grid instead of at nodes/elements.
    pub display_vectors_on_grid: bool,
    /// Grid cell width in mesh units. Range: >= 1 with grid display
    pub x_spacing: i32,
    /// Grid cell height in mesh units. Range: >= 1 with grid display
    pub y_spacing: i32,
    pub magnitude_filter: MagnitudeFilter,
    pub color: Rgba,
    /// Animate particle traces along the field.
    pub display_trace: bool,
    /// Trace animation frame rate. Range: > 0
    pub fps: f64,
}

impl RenderSettings {
    /// Read every setting from a dataset's store.
    ///
    /// Keys are never defaulted here; a dataset writes its defaults when it
    /// is created, so a missing key is reported.
    pub fn load(store: &ConfigStore) -> Result<Self, ConfigError> {
        let method_index = store.int(keys::SHAFT_LENGTH_METHOD)?;
        let shaft_length_method =
            ShaftLengthMethod::from_index(method_index).ok_or_else(|| ConfigError::WrongType {
                key: keys::SHAFT_LENGTH_METHOD.to_string(),
                expected: "shaft length method (0, 1 or 2)",
            })?;

        let settings = Self {
            shaft_length_method,
            shaft_length_min: store.float(keys::SHAFT_LENGTH_MIN)?,
            shaft_length_max: store.float(keys::SHAFT_LENGTH_MAX)?,
            shaft_length_scale: store.float(keys::SHAFT_LENGTH_SCALE)?,
            shaft_length_fixed: store.float(keys::SHAFT_LENGTH_FIXED)?,
            line_width: int32(store, keys::PEN_WIDTH)?,
            head_width: store.float(keys::HEAD_WIDTH)?,
            head_length: store.float(keys::HEAD_LENGTH)?,
            display_vectors_on_grid: store.bool(keys::GRID)?,
            x_spacing: int32(store, keys::GRID_X)?,
            y_spacing: int32(store, keys::GRID_Y)?,
            magnitude_filter: MagnitudeFilter {
                min: filter_bound(store.float(keys::FILTER_MIN)?),
                max: filter_bound(store.float(keys::FILTER_MAX)?),
            },
            color: store.color(keys::COLOR)?,
            display_trace: store.bool(keys::TRACE)?,
            fps: store.float(keys::FPS)?,
        };
        log::debug!("render settings loaded: {:?}", settings.shaft_length_method);
        Ok(settings)
    }

    /// Check every range constraint. The first violation is returned.
    ///
    /// Every float setting must be finite, including the ones the current
    /// shaft length method does not use, since all of them are stored.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in self.float_settings() {
            if !value.is_finite() {
                return Err(ValidationError::NotFinite { field, value });
            }
        }

        match self.shaft_length_method {
            ShaftLengthMethod::MinMax => {
                non_negative_shaft(Field::ShaftLengthMin, self.shaft_length_min)?;
                non_negative_shaft(Field::ShaftLengthMax, self.shaft_length_max)?;
                // also rejects NaN
                if !(self.shaft_length_min < self.shaft_length_max) {
                    return Err(ValidationError::ShaftLengthOrder {
                        min: self.shaft_length_min,
                        max: self.shaft_length_max,
                    });
                }
            }
            ShaftLengthMethod::Scaled => {
                positive(Field::ShaftLengthScale, self.shaft_length_scale)?
            }
            ShaftLengthMethod::Fixed => {
                positive(Field::ShaftLengthFixed, self.shaft_length_fixed)?
            }
        }

        if self.line_width < 1 {
            return Err(ValidationError::LineWidth(self.line_width));
        }
        non_negative(Field::HeadWidth, self.head_width)?;
        non_negative(Field::HeadLength, self.head_length)?;

        if self.display_vectors_on_grid {
            let spacings = [(Field::XSpacing, self.x_spacing), (Field::YSpacing, self.y_spacing)];
            for (field, value) in spacings {
                if value < 1 {
                    return Err(ValidationError::GridSpacing { field, value });
                }
            }
        }

        if let Some(min) = self.magnitude_filter.min {
            non_negative(Field::FilterMin, min)?;
        }
        if let Some(max) = self.magnitude_filter.max {
            non_negative(Field::FilterMax, max)?;
        }

        positive(Field::Fps, self.fps)
    }

    /// Validate, then write all 16 keys to `store`.
    ///
    /// A refused commit leaves the store exactly as it was. The `&mut`
    /// borrow makes the caller the only writer for the duration; hosts that
    /// share a dataset between threads hold their lock around this call.
    pub fn commit(&self, store: &mut ConfigStore) -> Result<(), ValidationError> {
        if let Err(err) = self.validate() {
            log::warn!("render settings not saved: {} ({})", err, err.field().key());
            return Err(err);
        }
        store.set_all(self.entries());
        log::debug!("render settings committed to store");
        Ok(())
    }

    /// Every float setting with its field; unset filter bounds are skipped.
    fn float_settings(&self) -> impl Iterator<Item = (Field, f64)> {
        [
            (Field::ShaftLengthMin, Some(self.shaft_length_min)),
            (Field::ShaftLengthMax, Some(self.shaft_length_max)),
            (Field::ShaftLengthScale, Some(self.shaft_length_scale)),
            (Field::ShaftLengthFixed, Some(self.shaft_length_fixed)),
            (Field::HeadWidth, Some(self.head_width)),
            (Field::HeadLength, Some(self.head_length)),
            (Field::FilterMin, self.magnitude_filter.min),
            (Field::FilterMax, self.magnitude_filter.max),
            (Field::Fps, Some(self.fps)),
        ]
        .into_iter()
        .filter_map(|(field, value)| Some((field, value?)))
    }

    /// The 16 store entries describing these settings.
    pub fn entries(&self) -> Vec<(&'static str, ConfigValue)> {
        let filter = |bound: Option<f64>| ConfigValue::Float(bound.unwrap_or(FILTER_UNSET));
        vec![
            (keys::SHAFT_LENGTH_METHOD, ConfigValue::Int(self.shaft_length_method.index())),
            (keys::SHAFT_LENGTH_MIN, ConfigValue::Float(self.shaft_length_min)),
            (keys::SHAFT_LENGTH_MAX, ConfigValue::Float(self.shaft_length_max)),
            (keys::SHAFT_LENGTH_SCALE, ConfigValue::Float(self.shaft_length_scale)),
            (keys::SHAFT_LENGTH_FIXED, ConfigValue::Float(self.shaft_length_fixed)),
            (keys::PEN_WIDTH, ConfigValue::from(self.line_width)),
            (keys::HEAD_WIDTH, ConfigValue::Float(self.head_width)),
            (keys::HEAD_LENGTH, ConfigValue::Float(self.head_length)),
            (keys::GRID, ConfigValue::Bool(self.display_vectors_on_grid)),
            (keys::GRID_X, ConfigValue::from(self.x_spacing)),
            (keys::GRID_Y, ConfigValue::from(self.y_spacing)),
            (keys::FILTER_MIN, filter(self.magnitude_filter.min)),
            (keys::FILTER_MAX, filter(self.magnitude_filter.max)),
            (keys::COLOR, ConfigValue::Color(self.color)),
            (keys::TRACE, ConfigValue::Bool(self.display_trace)),
            (keys::FPS, ConfigValue::Float(self.fps)),
        ]
    }

    /// Apply text typed into an editor.
    ///
    /// Float fields take unparsable text as `0.0`. Integer fields keep their
    /// value when the text is not an integer. Empty text on a filter bound
    /// clears it. Method, color and the two flags are not text fields and
    /// are left alone.
    pub fn set_text(&mut self, field: Field, text: &str) {
        match field {
            Field::ShaftLengthMin => self.shaft_length_min = parse_float_or_zero(text),
            Field::ShaftLengthMax => self.shaft_length_max = parse_float_or_zero(text),
            Field::ShaftLengthScale => self.shaft_length_scale = parse_float_or_zero(text),
            Field::ShaftLengthFixed => self.shaft_length_fixed = parse_float_or_zero(text),
            Field::HeadWidth => self.head_width = parse_float_or_zero(text),
            Field::HeadLength => self.head_length = parse_float_or_zero(text),
            Field::Fps => self.fps = parse_float_or_zero(text),
            Field::FilterMin => self.magnitude_filter.min = filter_text(text),
            Field::FilterMax => self.magnitude_filter.max = filter_text(text),
            Field::LineWidth => set_int(&mut self.line_width, text),
            Field::XSpacing => set_int(&mut self.x_spacing, text),
            Field::YSpacing => set_int(&mut self.y_spacing, text),
            Field::ShaftLengthMethod
            | Field::DisplayVectorsOnGrid
            | Field::Color
            | Field::DisplayTrace => {
                log::debug!("{} is not a text setting", field);
            }
        }
    }

    /// Whether vectors are filtered by magnitude.
    pub fn filter_by_mag(&self) -> bool {
        self.magnitude_filter.is_active()
    }

    /// Turn magnitude filtering on or off.
    ///
    /// Turning it off clears both bounds. Turning it on with no bound set
    /// starts from a minimum of zero, which lets every vector through.
    pub fn set_filter_by_mag(&mut self, enabled: bool) {
        if !enabled {
            self.magnitude_filter = MagnitudeFilter::NONE;
        } else if !self.magnitude_filter.is_active() {
            self.magnitude_filter.min = Some(0.0);
        }
    }

    /// Duration of one trace animation frame, `None` unless `fps` is a
    /// positive finite rate.
    pub fn frame_interval(&self) -> Option<Duration> {
        if !(self.fps > 0.0) || !self.fps.is_finite() {
            return None;
        }
        Duration::try_from_secs_f64(1.0 / self.fps).ok()
    }
}

fn int32(store: &ConfigStore, key: &str) -> Result<i32, ConfigError> {
    i32::try_from(store.int(key)?).map_err(|_| ConfigError::WrongType {
        key: key.to_string(),
        expected: "32-bit int",
    })
}

/// Negative stored bounds mean "unset".
fn filter_bound(stored: f64) -> Option<f64> {
    (stored >= 0.0).then_some(stored)
}

fn filter_text(text: &str) -> Option<f64> {
    if text.trim().is_empty() {
        None
    } else {
        Some(parse_float_or_zero(text))
    }
}

fn set_int(target: &mut i32, text: &str) {
    if let Some(v) = parse_int(text) {
        *target = v;
    }
}

fn non_negative_shaft(field: Field, value: f64) -> Result<(), ValidationError> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::NegativeShaftLength { field, value })
    }
}

fn non_negative(field: Field, value: f64) -> Result<(), ValidationError> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::Negative { field, value })
    }
}

fn positive(field: Field, value: f64) -> Result<(), ValidationError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::NonPositive { field, value })
    }
}
