use ndarray::{Array2, Zip};
use num_traits::AsPrimitive;

use crate::consts::PARALLEL_PIXEL_THRESHOLD;
use crate::error::{NdViewError, Result};
use crate::source::SampleBuffer;

use super::histogram::{self, HistogramStats};
use super::tone_curve::ToneCurve;
use super::{ContrastOutcome, ContrastRequest};

/// Tone mapper for one grayscale channel.
///
/// Holds the last fetched raw samples, their histogram, the 8-bit
/// tone-mapped result and the lookup table that colors it.
#[derive(Clone, Debug)]
pub struct ChannelProcessor {
    raw: Option<SampleBuffer>,
    bit_depth: u8,
    raw_histogram: Vec<u32>,
    tone_mapped: Array2<u8>,
    curve: ToneCurve,
    stats: HistogramStats,
    contrast: (u32, u32),
}

impl ChannelProcessor {
    pub fn new() -> Self {
        Self {
            raw: None,
            bit_depth: 8,
            raw_histogram: vec![0; 256],
            tone_mapped: Array2::zeros((0, 0)),
            curve: ToneCurve::default(),
            stats: HistogramStats::default(),
            contrast: (0, 255),
        }
    }

    /// Replace the raw samples. The histogram is cleared and the tone-mapped
    /// buffer zeroed at the new dimensions until the next recompute.
    pub fn ingest(&mut self, samples: SampleBuffer, bit_depth: u8) -> Result<()> {
        if samples.is_packed() {
            return Err(NdViewError::UnsupportedBitDepth(32));
        }
        let (w, h) = samples.dim();
        self.raw_histogram = vec![0; samples.histogram_len()];
        if self.tone_mapped.dim() != (h, w) {
            self.tone_mapped = Array2::zeros((h, w));
        } else {
            self.tone_mapped.fill(0);
        }
        self.bit_depth = bit_depth;
        self.raw = Some(samples);
        Ok(())
    }

    /// Tone-map the raw samples, derive histogram statistics, optionally
    /// autoscale, and rebuild the lookup table.
    ///
    /// Returns the contrast actually applied, which differs from the request
    /// when autoscaling.
    pub fn recompute(&mut self, request: &ContrastRequest) -> ContrastOutcome {
        let (mut min, mut max) = ordered(request.contrast_min, request.contrast_max);
        let mut autoscaled = false;

        if self.raw.is_some() {
            self.raw_histogram.iter_mut().for_each(|c| *c = 0);
            self.map_tones(min, max, true);
            self.stats = histogram::analyze(&self.raw_histogram, request.outlier_fraction);

            if request.autoscale {
                if let Some((lo, hi)) = self.stats.autoscale_bounds(request.outlier_fraction) {
                    (min, max) = ordered(lo as u32, hi as u32);
                    autoscaled = true;
                    self.map_tones(min, max, false);
                }
            }
        }

        self.curve = ToneCurve::new(request.color, request.gamma);
        self.contrast = (min, max);
        ContrastOutcome {
            contrast_min: min,
            contrast_max: max,
            autoscaled,
        }
    }

    /// Autoscale bounds and histogram come from an external sum; tone-map
    /// with the given contrast without touching the histogram.
    pub(crate) fn map_without_histogram(&mut self, min: u32, max: u32) {
        self.map_tones(min, max, false);
        self.contrast = (min, max);
    }

    pub(crate) fn reset_histogram(&mut self) {
        self.raw_histogram.iter_mut().for_each(|c| *c = 0);
    }

    pub(crate) fn map_with_histogram(&mut self, min: u32, max: u32) {
        self.map_tones(min, max, true);
        self.contrast = (min, max);
    }

    pub(crate) fn set_curve(&mut self, curve: ToneCurve) {
        self.curve = curve;
    }

    fn map_tones(&mut self, min: u32, max: u32, build_histogram: bool) {
        let hist = build_histogram.then_some(self.raw_histogram.as_mut_slice());
        match &self.raw {
            Some(SampleBuffer::Gray8(raw)) => tone_map(raw, &mut self.tone_mapped, hist, min, max),
            Some(SampleBuffer::Gray16(raw)) => tone_map(raw, &mut self.tone_mapped, hist, min, max),
            Some(SampleBuffer::Packed32(_)) | None => {}
        }
    }

    pub fn has_samples(&self) -> bool {
        self.raw.is_some()
    }

    pub fn raw(&self) -> Option<&SampleBuffer> {
        self.raw.as_ref()
    }

    pub fn bit_depth(&self) -> u8 {
        self.bit_depth
    }

    pub fn raw_histogram(&self) -> &[u32] {
        &self.raw_histogram
    }

    pub fn tone_mapped(&self) -> &Array2<u8> {
        &self.tone_mapped
    }

    pub fn curve(&self) -> &ToneCurve {
        &self.curve
    }

    pub fn stats(&self) -> HistogramStats {
        self.stats
    }

    pub fn contrast(&self) -> (u32, u32) {
        self.contrast
    }
}

impl Default for ChannelProcessor {
    fn default() -> Self {
        Self::new()
    }
}

fn ordered(a: u32, b: u32) -> (u32, u32) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// `trunc((v - min) * 256 / (max - min + 1) + 0.5)`, with negative
/// differences clamped to 0 and results clamped to 255.
#[inline]
fn tone_level(value: u32, min: u32, scale: f64) -> u8 {
    let diff = value.saturating_sub(min);
    let level = (diff as f64 * scale + 0.5) as u32;
    level.min(255) as u8
}

fn tone_map<T>(raw: &Array2<T>, out: &mut Array2<u8>, hist: Option<&mut [u32]>, min: u32, max: u32)
where
    T: Copy + Send + Sync + AsPrimitive<u32>,
{
    let scale = 256.0 / ((max - min) as f64 + 1.0);
    match hist {
        Some(hist) => {
            Zip::from(out).and(raw).for_each(|o, &v| {
                let v: u32 = v.as_();
                hist[v as usize] += 1;
                *o = tone_level(v, min, scale);
            });
        }
        None => {
            let (h, w) = raw.dim();
            if h * w >= PARALLEL_PIXEL_THRESHOLD {
                Zip::from(out)
                    .and(raw)
                    .par_for_each(|o, &v| *o = tone_level(v.as_(), min, scale));
            } else {
                Zip::from(out)
                    .and(raw)
                    .for_each(|o, &v| *o = tone_level(v.as_(), min, scale));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ChannelColor;

    fn request(min: u32, max: u32) -> ContrastRequest {
        ContrastRequest {
            contrast_min: min,
            contrast_max: max,
            gamma: 1.0,
            color: ChannelColor::WHITE,
            autoscale: false,
            outlier_fraction: 0.0,
        }
    }

    #[test]
    fn test_ingest_rejects_packed_samples() {
        let mut p = ChannelProcessor::new();
        let packed = SampleBuffer::Packed32(Array2::zeros((2, 8)));
        assert!(p.ingest(packed, 32).is_err());
        assert!(!p.has_samples());
    }

    #[test]
    fn test_swapped_contrast_is_ordered() {
        let mut p = ChannelProcessor::new();
        p.ingest(SampleBuffer::Gray8(Array2::from_elem((1, 1), 10)), 8)
            .unwrap();
        let out = p.recompute(&request(200, 0));
        assert_eq!((out.contrast_min, out.contrast_max), (0, 200));
    }

    #[test]
    fn test_recompute_without_samples_only_rebuilds_curve() {
        let mut p = ChannelProcessor::new();
        let out = p.recompute(&request(5, 9));
        assert!(!out.autoscaled);
        assert_eq!(p.contrast(), (5, 9));
        assert_eq!(p.tone_mapped().len(), 0);
    }
}
