use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use image::DynamicImage;
use ndarray::Array2;
use ndview_core::consts::CHANNEL_AXIS;
use ndview_core::source::{AxisPosition, AxisPositions, InMemorySource, SampleBuffer};
use tracing::{debug, info, warn};

/// Channels of the synthetic dataset.
pub const DEMO_CHANNELS: [&str; 3] = ["DAPI", "GFP", "mCherry"];

const DEMO_BIT_DEPTH: u8 = 12;
const DEMO_SPOTS: usize = 24;

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "tif", "tiff", "bmp"];

pub struct Dataset {
    pub source: Arc<InMemorySource>,
    /// Images are packed RGBA color.
    pub rgb: bool,
    pub images: usize,
}

/// Parse axes from a file stem like `c-DAPI_z-3_t-0`.
///
/// Each `_`-separated token is `label-value`; `c` is short for the channel
/// axis. Integer values become integer positions.
pub fn parse_axes(stem: &str) -> Option<AxisPositions> {
    let mut axes = AxisPositions::new();
    for token in stem.split('_') {
        let (label, value) = token.split_once('-')?;
        if label.is_empty() || value.is_empty() {
            return None;
        }
        let label = if label == "c" { CHANNEL_AXIS } else { label };
        let position = match value.parse::<i64>() {
            Ok(v) if label != CHANNEL_AXIS => AxisPosition::Int(v),
            _ => AxisPosition::Str(value.to_string()),
        };
        axes.insert(label.to_string(), position);
    }
    (!axes.is_empty()).then_some(axes)
}

/// Load every image in `dir` whose name encodes its axes.
pub fn load_dir(dir: &Path) -> Result<Dataset> {
    let mut paths: Vec<_> = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        })
        .collect();
    paths.sort();

    let source = InMemorySource::new();
    let mut rgb = None;
    let mut images = 0;
    for path in &paths {
        let Some(axes) = path.file_stem().and_then(|s| s.to_str()).and_then(parse_axes) else {
            warn!(path = %path.display(), "File name does not encode axes; skipped");
            continue;
        };
        let img = image::open(path).with_context(|| format!("Failed to decode {}", path.display()))?;
        let (samples, bit_depth) = decode(img)?;

        let is_rgb = samples.is_packed();
        match rgb {
            Some(prev) if prev != is_rgb => {
                bail!("{} mixes color and grayscale images", dir.display())
            }
            _ => rgb = Some(is_rgb),
        }
        debug!(path = %path.display(), bit_depth, "Image loaded");
        source.insert(axes, samples, bit_depth);
        images += 1;
    }

    if images == 0 {
        bail!("No images with axis-encoded names found in {}", dir.display());
    }
    info!(images, dir = %dir.display(), "Dataset loaded");
    Ok(Dataset {
        source: Arc::new(source),
        rgb: rgb.unwrap_or(false),
        images,
    })
}

fn decode(img: DynamicImage) -> Result<(SampleBuffer, u8)> {
    let (w, h) = (img.width() as usize, img.height() as usize);
    let decoded = match img {
        DynamicImage::ImageLuma8(buf) => (SampleBuffer::Gray8(Array2::from_shape_vec((h, w), buf.into_raw())?), 8),
        DynamicImage::ImageLuma16(buf) => (SampleBuffer::Gray16(Array2::from_shape_vec((h, w), buf.into_raw())?), 16),
        other @ DynamicImage::ImageLumaA8(_) => {
            let buf = other.to_luma8();
            (SampleBuffer::Gray8(Array2::from_shape_vec((h, w), buf.into_raw())?), 8)
        }
        other @ DynamicImage::ImageLumaA16(_) => {
            let buf = other.to_luma16();
            (SampleBuffer::Gray16(Array2::from_shape_vec((h, w), buf.into_raw())?), 16)
        }
        other => {
            let buf = other.to_rgba8();
            (SampleBuffer::Packed32(Array2::from_shape_vec((h, w * 4), buf.into_raw())?), 32)
        }
    };
    Ok(decoded)
}

/// Synthetic 12-bit z-stack of fluorescent spots, one image per channel and
/// plane. Each spot is sharpest at its own focal plane and blurs away from it.
pub fn demo(width: usize, height: usize, planes: usize) -> Dataset {
    let source = InMemorySource::new();
    let max_value = ((1u32 << DEMO_BIT_DEPTH) - 1) as f64;

    for (c, channel) in DEMO_CHANNELS.iter().enumerate() {
        let spots = demo_spots(c as u64, width, height, planes);
        for z in 0..planes {
            let plane = Array2::from_shape_fn((height, width), |(y, x)| {
                let mut value = 180.0 + 20.0 * c as f64;
                for spot in &spots {
                    let defocus = (z as f64 - spot.focus).abs();
                    let sigma = spot.sigma * (1.0 + 0.5 * defocus);
                    let amplitude = spot.amplitude / (1.0 + 0.5 * defocus).powi(2);
                    let d2 = (x as f64 - spot.x).powi(2) + (y as f64 - spot.y).powi(2);
                    value += amplitude * (-d2 / (2.0 * sigma * sigma)).exp();
                }
                value.min(max_value) as u16
            });
            let axes: AxisPositions = [
                (CHANNEL_AXIS.to_string(), AxisPosition::from(*channel)),
                ("z".to_string(), AxisPosition::Int(z as i64)),
            ]
            .into_iter()
            .collect();
            source.insert(axes, SampleBuffer::Gray16(plane), DEMO_BIT_DEPTH);
        }
    }

    info!(width, height, planes, "Demo dataset generated");
    Dataset {
        source: Arc::new(source),
        rgb: false,
        images: DEMO_CHANNELS.len() * planes,
    }
}

struct Spot {
    x: f64,
    y: f64,
    focus: f64,
    sigma: f64,
    amplitude: f64,
}

fn demo_spots(seed: u64, width: usize, height: usize, planes: usize) -> Vec<Spot> {
    let mut state = seed.wrapping_mul(0x9E37_79B9_7F4A_7C15).wrapping_add(1);
    let mut next = move || {
        state = splitmix64(state);
        (state >> 11) as f64 / (1u64 << 53) as f64
    };
    (0..DEMO_SPOTS)
        .map(|_| Spot {
            x: next() * width as f64,
            y: next() * height as f64,
            focus: next() * planes.saturating_sub(1) as f64,
            sigma: 1.5 + next() * 3.0,
            amplitude: 800.0 + next() * 2800.0,
        })
        .collect()
}

fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndview_core::source::DataSource;

    #[test]
    fn test_parse_axes_from_stem() {
        let axes = parse_axes("c-DAPI_z-3_t-0").unwrap();
        assert_eq!(axes["channel"], AxisPosition::from("DAPI"));
        assert_eq!(axes["z"], AxisPosition::Int(3));
        assert_eq!(axes["t"], AxisPosition::Int(0));
    }

    #[test]
    fn test_numeric_channel_stays_named() {
        let axes = parse_axes("c-488").unwrap();
        assert_eq!(axes["channel"], AxisPosition::from("488"));
    }

    #[test]
    fn test_unencoded_stem_rejected() {
        assert!(parse_axes("IMG0001").is_none());
        assert!(parse_axes("z-").is_none());
    }

    #[test]
    fn test_load_dir_reads_encoded_images() {
        let dir = tempfile::tempdir().unwrap();
        for z in 0..2u8 {
            let img = image::GrayImage::from_pixel(6, 4, image::Luma([z * 50]));
            img.save(dir.path().join(format!("c-DAPI_z-{z}.png"))).unwrap();
        }
        image::GrayImage::new(2, 2).save(dir.path().join("notes.png")).unwrap();

        let dataset = load_dir(dir.path()).unwrap();
        assert_eq!(dataset.images, 2);
        assert!(!dataset.rgb);
        assert_eq!(dataset.source.image_keys().len(), 2);
        let bounds = dataset.source.bounds().unwrap();
        assert_eq!((bounds.width(), bounds.height()), (6.0, 4.0));
    }

    #[test]
    fn test_empty_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_dir(dir.path()).is_err());
    }

    #[test]
    fn test_demo_is_deterministic() {
        let a = demo(32, 32, 3);
        let b = demo(32, 32, 3);
        assert_eq!(a.images, 9);
        let key = a.source.image_keys()[0].clone();
        let fa = a.source.samples_for_region(&key, 0, 0, 0, 32, 32).unwrap();
        let fb = b.source.samples_for_region(&key, 0, 0, 0, 32, 32).unwrap();
        assert_eq!(fa.samples, fb.samples);
        assert_eq!(fa.bit_depth, 12);
    }
}
