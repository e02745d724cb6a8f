//! Data source interface.
//!
//! The viewer never decodes or stores image data itself. It asks a
//! [`DataSource`] for a region of samples at a given pyramid level and axis
//! position, and notifies it when a coarser pyramid level is needed.

mod memory;
mod samples;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use memory::InMemorySource;
pub use samples::SampleBuffer;

/// Position along a named axis. Most axes are integer indices (z, time);
/// some, like the channel axis, are named.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AxisPosition {
    Int(i64),
    Str(String),
}

impl AxisPosition {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Str(_) => None,
        }
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Self::Int(_))
    }
}

impl Default for AxisPosition {
    fn default() -> Self {
        Self::Int(0)
    }
}

impl fmt::Display for AxisPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for AxisPosition {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for AxisPosition {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<&str> for AxisPosition {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for AxisPosition {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

/// Axis label → position.
pub type AxisPositions = BTreeMap<String, AxisPosition>;

/// Per-image metadata passed through from the source untouched.
pub type Tags = BTreeMap<String, String>;

/// Build an [`AxisPositions`] map from `(label, position)` pairs.
pub fn axes<I, K, V>(pairs: I) -> AxisPositions
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<AxisPosition>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Render axis positions as `label=pos, ...` for logs and errors.
pub fn describe_axes(axes: &AxisPositions) -> String {
    axes.iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Extent of valid full-resolution coordinates. `x_max`/`y_max` are exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub x_min: i64,
    pub y_min: i64,
    pub x_max: i64,
    pub y_max: i64,
}

impl Bounds {
    pub fn new(x_min: i64, y_min: i64, x_max: i64, y_max: i64) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    pub fn width(&self) -> f64 {
        (self.x_max - self.x_min) as f64
    }

    pub fn height(&self) -> f64 {
        (self.y_max - self.y_min) as f64
    }
}

/// Samples returned by a source for one region request.
#[derive(Clone, Debug)]
pub struct TaggedSamples {
    pub samples: SampleBuffer,
    pub bit_depth: u8,
    pub tags: Tags,
}

/// Source of multi-axis, optionally multi-resolution image data.
///
/// Implementations are shared between the caller's thread and the viewer's
/// recompute worker, so every method takes `&self`.
pub trait DataSource: Send + Sync {
    /// Full-resolution extent, or `None` when the dataset has no fixed extent
    /// (e.g. a live acquisition that keeps growing).
    fn bounds(&self) -> Option<Bounds>;

    /// Fetch `width x height` samples at pyramid level `resolution_index`,
    /// starting at `(x_offset, y_offset)` in that level's pixel coordinates.
    /// May block on disk or network I/O.
    fn samples_for_region(
        &self,
        axes: &AxisPositions,
        resolution_index: u32,
        x_offset: i64,
        y_offset: i64,
        width: usize,
        height: usize,
    ) -> Result<TaggedSamples>;

    /// Axis positions of every image in the dataset.
    fn image_keys(&self) -> Vec<AxisPositions>;

    /// Largest pyramid level currently available (0 = full resolution only).
    fn max_resolution_index(&self) -> u32;

    /// Ask the source to extend its pyramid down to `index`. Fire-and-forget.
    fn request_resolution_level(&self, index: u32);

    /// Called once when the viewer closes.
    fn close(&self) {}
}
