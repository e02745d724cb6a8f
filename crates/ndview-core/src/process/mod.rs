//! Per-channel tone mapping.
//!
//! A [`PixelProcessor`] turns the raw samples of one channel into an 8-bit
//! tone-mapped buffer plus a color lookup table, keeping the raw histogram
//! and min/max statistics used for autoscaling.

mod channel;
pub mod histogram;
mod tone_curve;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::color::ChannelColor;
use crate::error::{NdViewError, Result};
use crate::source::SampleBuffer;

pub use channel::ChannelProcessor;
pub use histogram::HistogramStats;
pub use tone_curve::ToneCurve;

/// Contrast parameters of one recompute.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContrastRequest {
    pub contrast_min: u32,
    pub contrast_max: u32,
    pub gamma: f64,
    pub color: ChannelColor,
    pub autoscale: bool,
    /// Fraction (not percent) of pixels ignored at each end when
    /// autoscaling. `0.0` disables outlier rejection.
    pub outlier_fraction: f64,
}

/// Contrast applied by a recompute.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContrastOutcome {
    pub contrast_min: u32,
    pub contrast_max: u32,
    pub autoscaled: bool,
}

/// Byte layout of a packed 4-byte color sample.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RgbByteOrder {
    /// Blue, green, red, then an ignored byte.
    #[default]
    Bgra,
    Rgba,
    Argb,
    Abgr,
}

impl RgbByteOrder {
    /// Byte offsets of red, green and blue within one pixel.
    pub fn offsets(self) -> (usize, usize, usize) {
        match self {
            Self::Bgra => (2, 1, 0),
            Self::Rgba => (0, 1, 2),
            Self::Argb => (1, 2, 3),
            Self::Abgr => (3, 2, 1),
        }
    }
}

/// Tone mapper for a packed-color channel: three grayscale processors that
/// share one contrast setting and one summed histogram.
#[derive(Clone, Debug)]
pub struct RgbProcessor {
    red: ChannelProcessor,
    green: ChannelProcessor,
    blue: ChannelProcessor,
    order: RgbByteOrder,
    summed_histogram: Vec<u32>,
    stats: HistogramStats,
}

impl RgbProcessor {
    pub fn new(order: RgbByteOrder) -> Self {
        Self {
            red: ChannelProcessor::new(),
            green: ChannelProcessor::new(),
            blue: ChannelProcessor::new(),
            order,
            summed_histogram: vec![0; 256],
            stats: HistogramStats::default(),
        }
    }

    pub fn ingest(&mut self, samples: SampleBuffer, bit_depth: u8) -> Result<()> {
        let SampleBuffer::Packed32(packed) = samples else {
            return Err(NdViewError::UnsupportedBitDepth(bit_depth));
        };
        let (h, w4) = packed.dim();
        let w = w4 / 4;
        let (r, g, b) = self.order.offsets();
        let plane = |offset: usize| Array2::from_shape_fn((h, w), |(y, x)| packed[[y, x * 4 + offset]]);
        self.red.ingest(SampleBuffer::Gray8(plane(r)), 8)?;
        self.green.ingest(SampleBuffer::Gray8(plane(g)), 8)?;
        self.blue.ingest(SampleBuffer::Gray8(plane(b)), 8)?;
        Ok(())
    }

    pub fn recompute(&mut self, request: &ContrastRequest) -> ContrastOutcome {
        let (mut min, mut max) = if request.contrast_min <= request.contrast_max {
            (request.contrast_min, request.contrast_max)
        } else {
            (request.contrast_max, request.contrast_min)
        };
        let mut autoscaled = false;

        if self.has_samples() {
            for sub in self.planes_mut() {
                sub.reset_histogram();
                sub.map_with_histogram(min, max);
            }
            self.summed_histogram = vec![0; self.red.raw_histogram().len()];
            for sub in [&self.red, &self.green, &self.blue] {
                for (sum, &c) in self.summed_histogram.iter_mut().zip(sub.raw_histogram()) {
                    *sum += c;
                }
            }
            self.stats = histogram::analyze(&self.summed_histogram, request.outlier_fraction);

            if request.autoscale {
                if let Some((lo, hi)) = self.stats.autoscale_bounds(request.outlier_fraction) {
                    (min, max) = (lo.min(hi) as u32, lo.max(hi) as u32);
                    autoscaled = true;
                    for sub in self.planes_mut() {
                        sub.map_without_histogram(min, max);
                    }
                }
            }
        }

        self.red.set_curve(ToneCurve::new(ChannelColor::RED, request.gamma));
        self.green.set_curve(ToneCurve::new(ChannelColor::GREEN, request.gamma));
        self.blue.set_curve(ToneCurve::new(ChannelColor::BLUE, request.gamma));
        ContrastOutcome {
            contrast_min: min,
            contrast_max: max,
            autoscaled,
        }
    }

    fn planes_mut(&mut self) -> [&mut ChannelProcessor; 3] {
        [&mut self.red, &mut self.green, &mut self.blue]
    }

    pub fn planes(&self) -> [&ChannelProcessor; 3] {
        [&self.red, &self.green, &self.blue]
    }

    pub fn has_samples(&self) -> bool {
        self.red.has_samples()
    }

    pub fn byte_order(&self) -> RgbByteOrder {
        self.order
    }
}

/// Tone mapper of one channel, grayscale or packed color.
#[derive(Clone, Debug)]
pub enum PixelProcessor {
    Grayscale(ChannelProcessor),
    RgbSource(RgbProcessor),
}

impl PixelProcessor {
    pub fn new(rgb: bool, order: RgbByteOrder) -> Self {
        if rgb {
            Self::RgbSource(RgbProcessor::new(order))
        } else {
            Self::Grayscale(ChannelProcessor::new())
        }
    }

    pub fn is_rgb(&self) -> bool {
        matches!(self, Self::RgbSource(_))
    }

    pub fn ingest(&mut self, samples: SampleBuffer, bit_depth: u8) -> Result<()> {
        match self {
            Self::Grayscale(p) => p.ingest(samples, bit_depth),
            Self::RgbSource(p) => p.ingest(samples, bit_depth),
        }
    }

    pub fn recompute(&mut self, request: &ContrastRequest) -> ContrastOutcome {
        match self {
            Self::Grayscale(p) => p.recompute(request),
            Self::RgbSource(p) => p.recompute(request),
        }
    }

    pub fn has_samples(&self) -> bool {
        match self {
            Self::Grayscale(p) => p.has_samples(),
            Self::RgbSource(p) => p.has_samples(),
        }
    }

    /// Raw histogram; summed over the three planes for packed color.
    pub fn raw_histogram(&self) -> &[u32] {
        match self {
            Self::Grayscale(p) => p.raw_histogram(),
            Self::RgbSource(p) => &p.summed_histogram,
        }
    }

    pub fn stats(&self) -> HistogramStats {
        match self {
            Self::Grayscale(p) => p.stats(),
            Self::RgbSource(p) => p.stats,
        }
    }

    pub fn display_histogram(&self, log: bool) -> Vec<f64> {
        histogram::display_bins(self.raw_histogram(), log)
    }

    /// `(width, height)` of the tone-mapped output.
    pub fn tone_dims(&self) -> (usize, usize) {
        let (h, w) = match self {
            Self::Grayscale(p) => p.tone_mapped().dim(),
            Self::RgbSource(p) => p.red.tone_mapped().dim(),
        };
        (w, h)
    }

    /// Tone-mapped buffers with the lookup table that colors each.
    pub fn layers(&self) -> Vec<(&Array2<u8>, &ToneCurve)> {
        match self {
            Self::Grayscale(p) => vec![(p.tone_mapped(), p.curve())],
            Self::RgbSource(p) => p
                .planes()
                .into_iter()
                .map(|sub| (sub.tone_mapped(), sub.curve()))
                .collect(),
        }
    }
}
