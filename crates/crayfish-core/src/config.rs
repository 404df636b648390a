//! Per-dataset key/value configuration store.
//!
//! Every dataset owns one [`ConfigStore`]. Rendering code reads typed values
//! out of it and writes them back on commit; the store itself has no notion
//! of which keys belong together.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;
use std::path::Path;

/// Names of the vector rendering keys every dataset carries.
pub mod keys {
    pub const SHAFT_LENGTH_METHOD: &str = "v_shaft_length_method";
    pub const SHAFT_LENGTH_MIN: &str = "v_shaft_length_min";
    pub const SHAFT_LENGTH_MAX: &str = "v_shaft_length_max";
    pub const SHAFT_LENGTH_SCALE: &str = "v_shaft_length_scale";
    pub const SHAFT_LENGTH_FIXED: &str = "v_shaft_length_fixed";
    pub const PEN_WIDTH: &str = "v_pen_width";
    pub const HEAD_WIDTH: &str = "v_head_width";
    pub const HEAD_LENGTH: &str = "v_head_length";
    pub const GRID: &str = "v_grid";
    pub const GRID_X: &str = "v_grid_x";
    pub const GRID_Y: &str = "v_grid_y";
    pub const FILTER_MIN: &str = "v_filter_min";
    pub const FILTER_MAX: &str = "v_filter_max";
    pub const COLOR: &str = "v_color";
    pub const TRACE: &str = "v_trace";
    pub const FPS: &str = "v_fps";

    pub const VECTOR_KEYS: [&str; 16] = [
        SHAFT_LENGTH_METHOD,
        SHAFT_LENGTH_MIN,
        SHAFT_LENGTH_MAX,
        SHAFT_LENGTH_SCALE,
        SHAFT_LENGTH_FIXED,
        PEN_WIDTH,
        HEAD_WIDTH,
        HEAD_LENGTH,
        GRID,
        GRID_X,
        GRID_Y,
        FILTER_MIN,
        FILTER_MAX,
        COLOR,
        TRACE,
        FPS,
    ];
}

/// Stored value of an unset magnitude filter bound.
pub const FILTER_UNSET: f64 = -1.0;

/// An RGBA color, 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba { r: 0, g: 0, b: 0, a: 255 };

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Packed `0xAARRGGBB`.
    pub fn to_argb32(self) -> u32 {
        u32::from_be_bytes([self.a, self.r, self.g, self.b])
    }

    pub fn from_argb32(argb: u32) -> Self {
        let [a, r, g, b] = argb.to_be_bytes();
        Self { r, g, b, a }
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::BLACK
    }
}

/// A scalar configuration value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigValue {
    Float(f64),
    Int(i64),
    Bool(bool),
    Color(Rgba),
}

impl ConfigValue {
    pub fn kind(&self) -> &'static str {
        match self {
            ConfigValue::Float(_) => "float",
            ConfigValue::Int(_) => "int",
            ConfigValue::Bool(_) => "bool",
            ConfigValue::Color(_) => "color",
        }
    }

    /// Floats, and ints widened to float.
    pub fn as_float(&self) -> Option<f64> {
        match *self {
            ConfigValue::Float(v) => Some(v),
            ConfigValue::Int(v) => Some(v as f64),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match *self {
            ConfigValue::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            ConfigValue::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Rgba> {
        match *self {
            ConfigValue::Color(v) => Some(v),
            _ => None,
        }
    }
}

impl From<f64> for ConfigValue {
    fn from(v: f64) -> Self {
        ConfigValue::Float(v)
    }
}

impl From<i64> for ConfigValue {
    fn from(v: i64) -> Self {
        ConfigValue::Int(v)
    }
}

impl From<i32> for ConfigValue {
    fn from(v: i32) -> Self {
        ConfigValue::Int(v as i64)
    }
}

impl From<bool> for ConfigValue {
    fn from(v: bool) -> Self {
        ConfigValue::Bool(v)
    }
}

impl From<Rgba> for ConfigValue {
    fn from(v: Rgba) -> Self {
        ConfigValue::Color(v)
    }
}

/// String-keyed map of configuration values, ordered by key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigStore {
    values: BTreeMap<String, ConfigValue>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.values.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ConfigValue>) {
        self.values.insert(key.into(), value.into());
    }

    /// Insert every pair. Cannot fail part-way.
    pub fn set_all<K, I>(&mut self, entries: I)
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, ConfigValue)>,
    {
        self.values
            .extend(entries.into_iter().map(|(k, v)| (k.into(), v)));
    }

    pub fn remove(&mut self, key: &str) -> Option<ConfigValue> {
        self.values.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    // ── Typed reads ──────────────────────────────────────────────

    fn require(&self, key: &str) -> Result<&ConfigValue, ConfigError> {
        self.get(key).ok_or_else(|| ConfigError::Missing(key.to_string()))
    }

    pub fn float(&self, key: &str) -> Result<f64, ConfigError> {
        self.require(key)?
            .as_float()
            .ok_or_else(|| wrong_type(key, "float"))
    }

    pub fn int(&self, key: &str) -> Result<i64, ConfigError> {
        self.require(key)?.as_int().ok_or_else(|| wrong_type(key, "int"))
    }

    pub fn bool(&self, key: &str) -> Result<bool, ConfigError> {
        self.require(key)?
            .as_bool()
            .ok_or_else(|| wrong_type(key, "bool"))
    }

    pub fn color(&self, key: &str) -> Result<Rgba, ConfigError> {
        self.require(key)?
            .as_color()
            .ok_or_else(|| wrong_type(key, "color"))
    }

    // ── Persistence ──────────────────────────────────────────────

    /// Save the store to disk as JSON.
    pub fn save_json(&self, path: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, json)
    }

    /// Load a store previously written by [`ConfigStore::save_json`].
    pub fn load_json(path: &Path) -> io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

fn wrong_type(key: &str, expected: &'static str) -> ConfigError {
    ConfigError::WrongType { key: key.to_string(), expected }
}

/// Initial vector rendering configuration of a freshly created dataset.
pub fn vector_defaults() -> Vec<(&'static str, ConfigValue)> {
    vec![
        (keys::SHAFT_LENGTH_METHOD, ConfigValue::Int(0)),
        (keys::SHAFT_LENGTH_MIN, ConfigValue::Float(3.0)),
        (keys::SHAFT_LENGTH_MAX, ConfigValue::Float(40.0)),
        (keys::SHAFT_LENGTH_SCALE, ConfigValue::Float(10.0)),
        (keys::SHAFT_LENGTH_FIXED, ConfigValue::Float(10.0)),
        (keys::PEN_WIDTH, ConfigValue::Int(1)),
        (keys::HEAD_WIDTH, ConfigValue::Float(15.0)),
        (keys::HEAD_LENGTH, ConfigValue::Float(40.0)),
        (keys::GRID, ConfigValue::Bool(false)),
        (keys::GRID_X, ConfigValue::Int(50)),
        (keys::GRID_Y, ConfigValue::Int(50)),
        (keys::FILTER_MIN, ConfigValue::Float(FILTER_UNSET)),
        (keys::FILTER_MAX, ConfigValue::Float(FILTER_UNSET)),
        (keys::COLOR, ConfigValue::Color(Rgba::BLACK)),
        (keys::TRACE, ConfigValue::Bool(false)),
        (keys::FPS, ConfigValue::Float(15.0)),
    ]
}
