use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use ndview_core::overlay::{Overlay, Shape};
use ndview_core::source::AxisPosition;
use ndview_core::viewer::PresenterEvent;
use tracing::{debug, warn};

use super::{parse_axis, parse_channel_value, parse_contrast, parse_size, settle, DatasetArgs};
use crate::summary;

#[derive(Args)]
pub struct RenderArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// Display size
    #[arg(long, default_value = "512x512", value_parser = parse_size)]
    pub size: (u32, u32),

    /// Magnification relative to the whole image (2 shows half the width)
    #[arg(long)]
    pub zoom: Option<f64>,

    /// Full-resolution pixel at the top-left corner of the view
    #[arg(long, num_args = 2, value_names = ["X", "Y"], allow_negative_numbers = true)]
    pub offset: Option<Vec<f64>>,

    /// Axis position, e.g. `z=4` or `channel=GFP` (repeatable)
    #[arg(long, value_parser = parse_axis)]
    pub axis: Vec<(String, AxisPosition)>,

    /// Manual contrast, e.g. `GFP=100:2000` (repeatable, disables autoscale)
    #[arg(long, value_parser = parse_contrast)]
    pub contrast: Vec<(String, u32, u32)>,

    /// Gamma of a channel, e.g. `DAPI=0.7` (repeatable)
    #[arg(long, value_parser = parse_channel_value)]
    pub gamma: Vec<(String, f64)>,

    /// Leave a channel out of the composite (repeatable)
    #[arg(long)]
    pub hide: Vec<String>,

    /// Show only the current channel instead of the composite
    #[arg(long)]
    pub single: bool,

    /// Ignore this percentage of pixels at each end when autoscaling
    #[arg(long)]
    pub ignore_outliers: Option<f64>,

    /// Draw the zoom indicator and scale bar
    #[arg(long)]
    pub overlay: bool,

    /// Write the final display settings to this file (TOML)
    #[arg(long)]
    pub save_settings: Option<PathBuf>,

    /// Output file path
    #[arg(short, long, default_value = "view.png")]
    pub output: PathBuf,
}

pub fn run(args: &RenderArgs) -> Result<()> {
    let (viewer, events, _dataset) = args.dataset.open_viewer()?;
    let (width, height) = args.size;

    viewer.resize(width, height);
    for (label, position) in &args.axis {
        viewer.set_axis_position(label, position.clone());
    }
    if let Some(zoom) = args.zoom {
        if !(zoom > 0.0) || !viewer.zoom(1.0 / zoom, None) {
            warn!(zoom, "Zoom rejected");
        }
    }
    if let Some([x, y]) = args.offset.as_deref() {
        viewer.set_view_offset(*x, *y);
    }
    if args.single {
        viewer.set_composite_mode(false);
    }
    if let Some(percent) = args.ignore_outliers {
        let mut histogram = viewer.display_settings().histogram;
        histogram.ignore_outliers = true;
        histogram.percent_to_ignore = percent;
        viewer.set_histogram_settings(histogram);
    }
    for (channel, min, max) in &args.contrast {
        viewer.set_contrast(channel, *min, *max);
    }
    for (channel, gamma) in &args.gamma {
        viewer.set_gamma(channel, *gamma);
    }
    for channel in &args.hide {
        viewer.set_channel_active(channel, false);
    }
    settle(&viewer)?;

    let frame = viewer.composited_frame().context("No frame was composited")?;
    let mut img = frame.buffer.to_rgb_image();
    if !frame.buffer.is_empty() && (img.width(), img.height()) != (width, height) {
        img = imageops::resize(&img, width, height, FilterType::Nearest);
    }
    if args.overlay {
        let overlay = events
            .try_iter()
            .filter_map(|event| match event {
                PresenterEvent::Overlay(overlay) => Some(overlay),
                _ => None,
            })
            .last();
        if let Some(overlay) = overlay {
            draw_overlay(&mut img, &overlay);
        }
    }
    img.save(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    if let Some(ref path) = args.save_settings {
        std::fs::write(path, viewer.display_settings_document()?)
            .with_context(|| format!("Failed to write settings to {}", path.display()))?;
    }

    summary::print_render_summary(&frame.view, &viewer.display_settings(), &viewer.channel_names(), &args.output);
    viewer.close();
    Ok(())
}

/// Rasterize overlay rectangles. Text needs a font and is skipped.
fn draw_overlay(img: &mut RgbImage, overlay: &Overlay) {
    for shape in &overlay.shapes {
        match shape {
            Shape::Rect {
                x,
                y,
                width,
                height,
                color,
                filled,
            } => {
                let pixel = Rgb([color.r, color.g, color.b]);
                let x0 = x.round() as i64;
                let y0 = y.round() as i64;
                let x1 = x0 + width.round() as i64 - 1;
                let y1 = y0 + height.round() as i64 - 1;
                for py in y0..=y1 {
                    for px in x0..=x1 {
                        let edge = px == x0 || px == x1 || py == y0 || py == y1;
                        if *filled || edge {
                            put(img, px, py, pixel);
                        }
                    }
                }
            }
            Shape::Text { text, .. } => debug!(text = %text, "Overlay text not rasterized"),
        }
    }
}

fn put(img: &mut RgbImage, x: i64, y: i64, pixel: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, pixel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndview_core::color::ChannelColor;

    #[test]
    fn test_outline_leaves_interior() {
        let mut img = RgbImage::new(10, 10);
        let overlay = Overlay {
            shapes: vec![Shape::Rect {
                x: 2.0,
                y: 2.0,
                width: 5.0,
                height: 4.0,
                color: ChannelColor::MAGENTA,
                filled: false,
            }],
        };
        draw_overlay(&mut img, &overlay);
        assert_eq!(img.get_pixel(2, 2), &Rgb([255, 0, 255]));
        assert_eq!(img.get_pixel(6, 5), &Rgb([255, 0, 255]));
        assert_eq!(img.get_pixel(4, 3), &Rgb([0, 0, 0]));
        assert_eq!(img.get_pixel(7, 2), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_filled_rect_clipped_to_image() {
        let mut img = RgbImage::new(4, 4);
        let overlay = Overlay {
            shapes: vec![Shape::Rect {
                x: 2.0,
                y: -1.0,
                width: 10.0,
                height: 3.0,
                color: ChannelColor::WHITE,
                filled: true,
            }],
        };
        draw_overlay(&mut img, &overlay);
        assert_eq!(img.get_pixel(3, 1), &Rgb([255, 255, 255]));
        assert_eq!(img.get_pixel(1, 1), &Rgb([0, 0, 0]));
        assert_eq!(img.get_pixel(3, 2), &Rgb([0, 0, 0]));
    }
}
