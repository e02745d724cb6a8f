use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_ANIMATION_FPS, MIN_SOURCE_SIZE};
use crate::error::{NdViewError, Result};
use crate::overlay::DefaultOverlayBuilder;
use crate::process::RgbByteOrder;
use crate::view::Point;

/// Viewer construction settings, loadable from TOML.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Full-resolution extent shown at startup. When unset, the dataset
    /// bounds are used once known.
    pub initial_source_size: Option<[f64; 2]>,
    /// Smallest source extent zoom-in may reach, in full-resolution pixels.
    pub min_source_size: f64,
    /// Samples are packed 4-byte color.
    pub rgb: bool,
    pub rgb_byte_order: RgbByteOrder,
    pub animation_fps: f64,
    pub overlay: OverlayConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Physical size of one full-resolution pixel, in micrometres.
    pub pixel_size_um: f64,
    pub show_scale_bar: bool,
    pub label_axes: Vec<String>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            initial_source_size: None,
            min_source_size: MIN_SOURCE_SIZE,
            rgb: false,
            rgb_byte_order: RgbByteOrder::default(),
            animation_fps: DEFAULT_ANIMATION_FPS,
            overlay: OverlayConfig::default(),
        }
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            pixel_size_um: 1.0,
            show_scale_bar: false,
            label_axes: Vec::new(),
        }
    }
}

impl ViewerConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.min_source_size > 0.0) {
            return Err(NdViewError::Config(format!(
                "min_source_size must be positive, got {}",
                self.min_source_size
            )));
        }
        if !(self.animation_fps > 0.0) {
            return Err(NdViewError::Config(format!(
                "animation_fps must be positive, got {}",
                self.animation_fps
            )));
        }
        if !(self.overlay.pixel_size_um > 0.0) {
            return Err(NdViewError::Config(format!(
                "overlay.pixel_size_um must be positive, got {}",
                self.overlay.pixel_size_um
            )));
        }
        if let Some([w, h]) = self.initial_source_size {
            if !(w > 0.0 && h > 0.0) {
                return Err(NdViewError::Config(format!(
                    "initial_source_size must be positive, got {w}x{h}"
                )));
            }
        }
        Ok(())
    }

    pub fn initial_source_point(&self) -> Option<Point> {
        self.initial_source_size.map(|[w, h]| Point::new(w, h))
    }

    pub fn overlay_builder(&self) -> DefaultOverlayBuilder {
        DefaultOverlayBuilder {
            pixel_size_um: self.overlay.pixel_size_um,
            show_scale_bar: self.overlay.show_scale_bar,
            label_axes: self.overlay.label_axes.clone(),
        }
    }
}
