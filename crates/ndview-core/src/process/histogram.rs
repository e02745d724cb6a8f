use crate::consts::DISPLAY_HISTOGRAM_BINS;

/// Statistics derived from a raw sample histogram.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HistogramStats {
    /// Smallest sample value present, `None` for an empty histogram.
    pub pixel_min: Option<usize>,
    pub pixel_max: Option<usize>,
    pub min_after_rejecting: usize,
    pub max_after_rejecting: usize,
    pub total: u64,
}

impl HistogramStats {
    /// Contrast bounds for autoscaling: the outlier-rejected bounds when
    /// `outlier_fraction > 0`, otherwise the raw min/max.
    pub fn autoscale_bounds(&self, outlier_fraction: f64) -> Option<(usize, usize)> {
        let (min, max) = (self.pixel_min?, self.pixel_max?);
        if outlier_fraction > 0.0 {
            Some((self.min_after_rejecting, self.max_after_rejecting))
        } else {
            Some((min, max))
        }
    }
}

/// Compute min/max and outlier-rejected bounds of `hist`.
///
/// The min/max scan walks the histogram in at most 256 display bins of
/// `hist.len() / 256` buckets each. Outlier rejection walks inward from each
/// end until the cumulative count exceeds `outlier_fraction * total`.
pub fn analyze(hist: &[u32], outlier_fraction: f64) -> HistogramStats {
    let total: u64 = hist.iter().map(|&c| c as u64).sum();
    if hist.is_empty() {
        return HistogramStats::default();
    }

    let bin_size = (hist.len() / DISPLAY_HISTOGRAM_BINS).max(1);
    let scanned = (hist.len() / bin_size).min(DISPLAY_HISTOGRAM_BINS) * bin_size;
    let mut pixel_min = None;
    let mut pixel_max = None;
    for (i, &count) in hist[..scanned].iter().enumerate() {
        if count > 0 {
            pixel_max = Some(i);
            if pixel_min.is_none() {
                pixel_min = Some(i);
            }
        }
    }

    let threshold = outlier_fraction.max(0.0) * total as f64;
    let min_after_rejecting = cumulative_crossing(hist.iter().enumerate(), threshold).unwrap_or(0);
    let max_after_rejecting = cumulative_crossing(hist.iter().enumerate().rev(), threshold)
        .unwrap_or(hist.len() - 1);

    HistogramStats {
        pixel_min,
        pixel_max,
        min_after_rejecting,
        max_after_rejecting,
        total,
    }
}

fn cumulative_crossing<'a>(
    buckets: impl Iterator<Item = (usize, &'a u32)>,
    threshold: f64,
) -> Option<usize> {
    let mut cumulative = 0u64;
    for (i, &count) in buckets {
        cumulative += count as u64;
        if cumulative as f64 > threshold {
            return Some(i);
        }
    }
    None
}

/// Coalesce `hist` into 256 display bins, optionally on a `ln(1 + x)` scale.
pub fn display_bins(hist: &[u32], log: bool) -> Vec<f64> {
    if hist.is_empty() {
        return vec![0.0; DISPLAY_HISTOGRAM_BINS];
    }
    let bin_size = (hist.len() / DISPLAY_HISTOGRAM_BINS).max(1);
    hist.chunks(bin_size)
        .take(DISPLAY_HISTOGRAM_BINS)
        .map(|chunk| {
            let count: u64 = chunk.iter().map(|&c| c as u64).sum();
            if log {
                (count as f64).ln_1p()
            } else {
                count as f64
            }
        })
        .collect()
}
