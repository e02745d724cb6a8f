pub mod animate;
pub mod config;
pub mod info;
pub mod render;

use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;
use ndview_core::config::ViewerConfig;
use ndview_core::process::RgbByteOrder;
use ndview_core::source::AxisPosition;
use ndview_core::viewer::{ChannelPresenter, DisplaySettings, PresenterEvent, Viewer};

use crate::dataset::{self, Dataset};

/// How long a command waits for the viewer's pipelines to settle.
pub const SETTLE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Args)]
pub struct DatasetArgs {
    /// Directory of images named like `c-DAPI_z-3_t-0.tif`
    #[arg(required_unless_present = "demo")]
    pub input: Option<PathBuf>,

    /// Use a synthetic three-channel z-stack instead of an input directory
    #[arg(long, conflicts_with = "input")]
    pub demo: bool,

    /// Number of z-planes in the demo dataset
    #[arg(long, default_value = "9")]
    pub demo_planes: usize,

    /// Viewer config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Display settings file (TOML) to start from
    #[arg(long)]
    pub settings: Option<PathBuf>,
}

impl DatasetArgs {
    pub fn load(&self) -> Result<(Dataset, ViewerConfig)> {
        let mut config = match self.config {
            Some(ref path) => ViewerConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => ViewerConfig::default(),
        };
        let dataset = match self.input {
            Some(ref dir) if !self.demo => dataset::load_dir(dir)?,
            _ => dataset::demo(512, 512, self.demo_planes.max(1)),
        };
        if dataset.rgb {
            config.rgb = true;
            config.rgb_byte_order = RgbByteOrder::Rgba;
        }
        Ok((dataset, config))
    }

    pub fn display_settings(&self) -> Result<Option<DisplaySettings>> {
        let Some(ref path) = self.settings else {
            return Ok(None);
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings {}", path.display()))?;
        let settings = DisplaySettings::from_toml_str(&text)
            .with_context(|| format!("Invalid display settings {}", path.display()))?;
        Ok(Some(settings))
    }

    /// Build a viewer over the dataset and wait for the first frame.
    pub fn open_viewer(&self) -> Result<(Viewer, Receiver<PresenterEvent>, Dataset)> {
        let (dataset, config) = self.load()?;
        let settings = self.display_settings()?;
        let (presenter, events) = ChannelPresenter::new();
        let viewer = Viewer::new(dataset.source.clone(), Arc::new(presenter), config)?;
        viewer.initialize_to_loaded(settings);
        settle(&viewer)?;
        Ok((viewer, events, dataset))
    }
}

pub fn settle(viewer: &Viewer) -> Result<()> {
    if !viewer.flush(SETTLE_TIMEOUT) {
        bail!("Viewer did not settle within {}s", SETTLE_TIMEOUT.as_secs());
    }
    Ok(())
}

/// Parse `WIDTHxHEIGHT`.
pub fn parse_size(s: &str) -> std::result::Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let w: u32 = w.trim().parse().map_err(|e| format!("bad width '{w}': {e}"))?;
    let h: u32 = h.trim().parse().map_err(|e| format!("bad height '{h}': {e}"))?;
    if w == 0 || h == 0 {
        return Err(format!("size must be non-zero, got {w}x{h}"));
    }
    Ok((w, h))
}

/// Parse `label=value`; integer values become integer positions.
pub fn parse_axis(s: &str) -> std::result::Result<(String, AxisPosition), String> {
    let (label, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected LABEL=VALUE, got '{s}'"))?;
    if label.is_empty() {
        return Err(format!("empty axis label in '{s}'"));
    }
    let position = value
        .parse::<i64>()
        .map(AxisPosition::Int)
        .unwrap_or_else(|_| AxisPosition::from(value));
    Ok((label.to_string(), position))
}

/// Parse `CHANNEL=MIN:MAX`. An empty channel name is the unnamed channel.
pub fn parse_contrast(s: &str) -> std::result::Result<(String, u32, u32), String> {
    let (channel, range) = s
        .split_once('=')
        .ok_or_else(|| format!("expected CHANNEL=MIN:MAX, got '{s}'"))?;
    let (min, max) = range
        .split_once(':')
        .ok_or_else(|| format!("expected MIN:MAX, got '{range}'"))?;
    let min = min.parse().map_err(|e| format!("bad minimum '{min}': {e}"))?;
    let max = max.parse().map_err(|e| format!("bad maximum '{max}': {e}"))?;
    Ok((channel.to_string(), min, max))
}

/// Parse `CHANNEL=VALUE` for a floating-point channel setting.
pub fn parse_channel_value(s: &str) -> std::result::Result<(String, f64), String> {
    let (channel, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected CHANNEL=VALUE, got '{s}'"))?;
    let value = value.parse().map_err(|e| format!("bad value '{value}': {e}"))?;
    Ok((channel.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("800x600"), Ok((800, 600)));
        assert_eq!(parse_size("64X32"), Ok((64, 32)));
        assert!(parse_size("800").is_err());
        assert!(parse_size("0x10").is_err());
    }

    #[test]
    fn test_parse_axis() {
        assert_eq!(parse_axis("z=4"), Ok(("z".to_string(), AxisPosition::Int(4))));
        assert_eq!(
            parse_axis("channel=GFP"),
            Ok(("channel".to_string(), AxisPosition::from("GFP")))
        );
        assert!(parse_axis("=3").is_err());
    }

    #[test]
    fn test_parse_contrast() {
        assert_eq!(parse_contrast("DAPI=100:900"), Ok(("DAPI".to_string(), 100, 900)));
        assert_eq!(parse_contrast("=0:255"), Ok((String::new(), 0, 255)));
        assert!(parse_contrast("DAPI=100").is_err());
    }
}
