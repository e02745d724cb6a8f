use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::color::ChannelColor;
use crate::consts::{GAMMA_SNAP_TOLERANCE, NO_CHANNEL};
use crate::error::Result;
use crate::process::{ContrastOutcome, ContrastRequest};

/// Display state of one channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelSettings {
    pub color: ChannelColor,
    pub bit_depth: u8,
    pub contrast_min: u32,
    pub contrast_max: u32,
    pub gamma: f64,
    pub active: bool,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            color: ChannelColor::WHITE,
            bit_depth: 8,
            contrast_min: 0,
            contrast_max: 255,
            gamma: 1.0,
            active: true,
        }
    }
}

impl ChannelSettings {
    /// Largest raw value representable at this channel's bit depth. Depths
    /// above 16 are packed color with 8-bit components.
    pub fn max_value(&self) -> u32 {
        match self.bit_depth {
            1..=16 => (1u32 << self.bit_depth) - 1,
            _ => 255,
        }
    }

    fn clamp_contrast(&mut self) {
        let max_value = self.max_value();
        self.contrast_max = self.contrast_max.min(max_value);
        self.contrast_min = self.contrast_min.min(self.contrast_max);
    }
}

/// Settings shared by all channels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistogramSettings {
    /// Set contrast from the measured range on every recompute.
    pub autoscale: bool,
    pub ignore_outliers: bool,
    /// Percent of pixels ignored at each end when `ignore_outliers` is on.
    pub percent_to_ignore: f64,
    /// Apply contrast edits on one channel to every channel.
    pub sync_channels: bool,
    pub log_histogram: bool,
    /// Blend every active channel instead of showing only the current one.
    pub composite: bool,
}

impl Default for HistogramSettings {
    fn default() -> Self {
        Self {
            autoscale: true,
            ignore_outliers: false,
            percent_to_ignore: 0.1,
            sync_channels: false,
            log_histogram: false,
            composite: true,
        }
    }
}

impl HistogramSettings {
    pub fn outlier_fraction(&self) -> f64 {
        if self.ignore_outliers {
            0.01 * self.percent_to_ignore.clamp(0.0, 100.0)
        } else {
            0.0
        }
    }
}

/// Persisted display state. The viewer passes it through as an opaque
/// document; contrast values are kept valid at every mutation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub histogram: HistogramSettings,
    pub channels: BTreeMap<String, ChannelSettings>,
}

impl DisplaySettings {
    /// Settings of `name`, or defaults for a channel never seen.
    pub fn channel(&self, name: &str) -> ChannelSettings {
        self.channels.get(name).cloned().unwrap_or_default()
    }

    /// Register `name` with a palette color if it is new. Returns `true` if
    /// it was added.
    pub fn ensure_channel(&mut self, name: &str) -> bool {
        if self.channels.contains_key(name) {
            return false;
        }
        let color = if name == NO_CHANNEL {
            ChannelColor::WHITE
        } else {
            let named = self.channels.keys().filter(|k| k.as_str() != NO_CHANNEL).count();
            ChannelColor::for_channel_index(named)
        };
        self.channels.insert(
            name.to_string(),
            ChannelSettings {
                color,
                ..ChannelSettings::default()
            },
        );
        true
    }

    pub fn remove_channel(&mut self, name: &str) -> bool {
        self.channels.remove(name).is_some()
    }

    fn targets(&self, name: &str) -> Vec<String> {
        if self.histogram.sync_channels {
            self.channels.keys().cloned().collect()
        } else {
            vec![name.to_string()]
        }
    }

    fn entry(&mut self, name: &str) -> &mut ChannelSettings {
        self.channels.entry(name.to_string()).or_default()
    }

    /// Record the bit depth reported by the source. A channel seen for the
    /// first time at a new depth opens to the full range.
    pub fn set_bit_depth(&mut self, name: &str, bit_depth: u8) {
        let channel = self.entry(name);
        if channel.bit_depth == bit_depth {
            return;
        }
        let widen = channel.contrast_max == channel.max_value();
        channel.bit_depth = bit_depth;
        if widen {
            channel.contrast_max = channel.max_value();
        }
        channel.clamp_contrast();
    }

    /// Set both bounds, clamped to the bit depth; a minimum above the
    /// maximum is pulled down to it.
    pub fn set_contrast(&mut self, name: &str, min: u32, max: u32) {
        for target in self.targets(name) {
            let channel = self.entry(&target);
            let max_value = channel.max_value();
            channel.contrast_max = max.min(max_value);
            channel.contrast_min = min.min(channel.contrast_max);
        }
    }

    pub fn set_contrast_min(&mut self, name: &str, min: u32) {
        for target in self.targets(name) {
            let channel = self.entry(&target);
            channel.contrast_min = min.min(channel.contrast_max);
        }
    }

    pub fn set_contrast_max(&mut self, name: &str, max: u32) {
        for target in self.targets(name) {
            let channel = self.entry(&target);
            channel.contrast_max = max.min(channel.max_value()).max(channel.contrast_min);
        }
    }

    /// Non-positive or non-finite gamma is ignored; values near 1 snap to 1.
    pub fn set_gamma(&mut self, name: &str, gamma: f64) {
        if !gamma.is_finite() || gamma <= 0.0 {
            return;
        }
        let gamma = if (gamma - 1.0).abs() < GAMMA_SNAP_TOLERANCE {
            1.0
        } else {
            gamma
        };
        for target in self.targets(name) {
            self.entry(&target).gamma = gamma;
        }
    }

    pub fn set_color(&mut self, name: &str, color: ChannelColor) {
        self.entry(name).color = color;
    }

    pub fn set_active(&mut self, name: &str, active: bool) {
        self.entry(name).active = active;
    }

    /// Open the contrast to `0..=2^bit_depth - 1`.
    pub fn full_range(&mut self, name: &str) {
        let max_value = self.channel(name).max_value();
        self.set_contrast(name, 0, max_value);
    }

    pub fn contrast_request(&self, name: &str) -> ContrastRequest {
        let channel = self.channel(name);
        ContrastRequest {
            contrast_min: channel.contrast_min,
            contrast_max: channel.contrast_max,
            gamma: channel.gamma,
            color: channel.color,
            autoscale: self.histogram.autoscale,
            outlier_fraction: self.histogram.outlier_fraction(),
        }
    }

    /// Store contrast chosen by autoscaling.
    pub fn apply_outcome(&mut self, name: &str, outcome: &ContrastOutcome) {
        if !outcome.autoscaled {
            return;
        }
        let channel = self.entry(name);
        let max_value = channel.max_value();
        channel.contrast_max = outcome.contrast_max.min(max_value);
        channel.contrast_min = outcome.contrast_min.min(channel.contrast_max);
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let mut settings: Self = toml::from_str(text)?;
        for channel in settings.channels.values_mut() {
            channel.clamp_contrast();
        }
        Ok(settings)
    }
}
