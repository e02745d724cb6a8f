use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use tracing::{debug, info};

use crate::error::{NdViewError, Result};
use crate::sync::{read, write};

use super::{
    describe_axes, AxisPosition, AxisPositions, Bounds, DataSource, SampleBuffer, TaggedSamples,
    Tags,
};

/// One image and its downsampled pyramid levels. `levels[0]` is full resolution.
struct Pyramid {
    levels: Vec<SampleBuffer>,
    bit_depth: u8,
    tags: Tags,
}

impl Pyramid {
    fn extend_to(&mut self, index: u32) {
        while self.levels.len() <= index as usize {
            let next = self.levels[self.levels.len() - 1].downsample2x();
            self.levels.push(next);
        }
    }
}

struct Store {
    images: BTreeMap<AxisPositions, Pyramid>,
    extent: Option<(usize, usize)>,
    max_level: u32,
}

/// In-memory multi-axis image store with an on-demand resolution pyramid.
///
/// Images are anchored at the origin. Coarser levels are built by 2x2 mean
/// binning when [`DataSource::request_resolution_level`] asks for them.
pub struct InMemorySource {
    store: RwLock<Store>,
    unbounded: bool,
    closed: AtomicBool,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::with_unbounded(false)
    }

    /// A source that reports no fixed extent, as a live acquisition would.
    pub fn unbounded() -> Self {
        Self::with_unbounded(true)
    }

    fn with_unbounded(unbounded: bool) -> Self {
        Self {
            store: RwLock::new(Store {
                images: BTreeMap::new(),
                extent: None,
                max_level: 0,
            }),
            unbounded,
            closed: AtomicBool::new(false),
        }
    }

    /// Store a full-resolution image at `axes`, replacing any previous one.
    pub fn insert(&self, axes: AxisPositions, samples: SampleBuffer, bit_depth: u8) {
        self.insert_tagged(axes, samples, bit_depth, Tags::new());
    }

    pub fn insert_tagged(&self, axes: AxisPositions, samples: SampleBuffer, bit_depth: u8, tags: Tags) {
        let mut store = write(&self.store);
        let (w, h) = samples.dim();
        store.extent = Some(match store.extent {
            Some((ew, eh)) => (ew.max(w), eh.max(h)),
            None => (w, h),
        });
        let mut pyramid = Pyramid {
            levels: vec![samples],
            bit_depth,
            tags,
        };
        pyramid.extend_to(store.max_level);
        debug!(axes = %describe_axes(&axes), width = w, height = h, "Image stored");
        store.images.insert(axes, pyramid);
    }

    pub fn len(&self) -> usize {
        read(&self.store).images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl Default for InMemorySource {
    fn default() -> Self {
        Self::new()
    }
}

/// Axes missing from either side are taken to be at position 0.
fn axes_match(stored: &AxisPositions, requested: &AxisPositions) -> bool {
    let zero = AxisPosition::default();
    stored
        .keys()
        .chain(requested.keys())
        .all(|axis| stored.get(axis).unwrap_or(&zero) == requested.get(axis).unwrap_or(&zero))
}

impl DataSource for InMemorySource {
    fn bounds(&self) -> Option<Bounds> {
        if self.unbounded {
            return None;
        }
        read(&self.store)
            .extent
            .map(|(w, h)| Bounds::new(0, 0, w as i64, h as i64))
    }

    fn samples_for_region(
        &self,
        axes: &AxisPositions,
        resolution_index: u32,
        x_offset: i64,
        y_offset: i64,
        width: usize,
        height: usize,
    ) -> Result<TaggedSamples> {
        if self.is_closed() {
            return Err(NdViewError::SourceClosed);
        }
        if width == 0 || height == 0 {
            return Err(NdViewError::InvalidDimensions { width, height });
        }
        let store = read(&self.store);
        if resolution_index > store.max_level {
            return Err(NdViewError::ResolutionUnavailable {
                index: resolution_index,
                max: store.max_level,
            });
        }
        let pyramid = store
            .images
            .iter()
            .find(|(key, _)| axes_match(key, axes))
            .map(|(_, pyramid)| pyramid)
            .ok_or_else(|| NdViewError::MissingAxes(describe_axes(axes)))?;

        let level = &pyramid.levels[resolution_index as usize];
        Ok(TaggedSamples {
            samples: level.region(x_offset, y_offset, width, height),
            bit_depth: pyramid.bit_depth,
            tags: pyramid.tags.clone(),
        })
    }

    fn image_keys(&self) -> Vec<AxisPositions> {
        read(&self.store).images.keys().cloned().collect()
    }

    fn max_resolution_index(&self) -> u32 {
        read(&self.store).max_level
    }

    fn request_resolution_level(&self, index: u32) {
        let mut store = write(&self.store);
        if index <= store.max_level {
            return;
        }
        for pyramid in store.images.values_mut() {
            pyramid.extend_to(index);
        }
        store.max_level = index;
        info!(level = index, "Resolution pyramid extended");
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}
