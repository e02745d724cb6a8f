use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use tracing::{debug, warn};

use crate::consts::{CHANNEL_AXIS, NO_CHANNEL};
use crate::error::NdViewError;
use crate::process::{PixelProcessor, RgbByteOrder};
use crate::render::{Compositor, PixelBuffer};
use crate::source::{AxisPosition, AxisPositions, DataSource, Tags};
use crate::sync::{lock, read, write};
use crate::view::ViewCoords;

use super::settings::DisplaySettings;

/// Result of one recompute cycle.
#[derive(Clone, Debug)]
pub struct DisplayFrame {
    pub buffer: Arc<PixelBuffer>,
    /// Raw histogram per channel.
    pub histograms: BTreeMap<String, Vec<u32>>,
    /// Tags of the image shown for the view's current channel.
    pub tags: Option<Tags>,
    pub view: ViewCoords,
}

/// Channel name → processor, created on first use.
pub struct ChannelRegistry {
    processors: Mutex<BTreeMap<String, Arc<Mutex<PixelProcessor>>>>,
    rgb: bool,
    order: RgbByteOrder,
}

impl ChannelRegistry {
    pub fn new(rgb: bool, order: RgbByteOrder) -> Self {
        Self {
            processors: Mutex::new(BTreeMap::new()),
            rgb,
            order,
        }
    }

    pub fn get_or_create(&self, name: &str) -> Arc<Mutex<PixelProcessor>> {
        let mut processors = lock(&self.processors);
        let processor = processors.entry(name.to_string()).or_insert_with(|| {
            debug!(channel = name, rgb = self.rgb, "Creating channel processor");
            Arc::new(Mutex::new(PixelProcessor::new(self.rgb, self.order)))
        });
        Arc::clone(processor)
    }

    pub fn get(&self, name: &str) -> Option<Arc<Mutex<PixelProcessor>>> {
        lock(&self.processors).get(name).cloned()
    }

    pub fn remove(&self, name: &str) -> bool {
        lock(&self.processors).remove(name).is_some()
    }

    pub fn histograms(&self) -> BTreeMap<String, Vec<u32>> {
        let processors: Vec<_> = lock(&self.processors)
            .iter()
            .map(|(name, p)| (name.clone(), Arc::clone(p)))
            .collect();
        processors
            .into_iter()
            .map(|(name, p)| {
                let hist = lock(&p).raw_histogram().to_vec();
                (name, hist)
            })
            .collect()
    }
}

/// Fetches, tone-maps and composites the channels of one view.
pub struct ImageMaker {
    registry: ChannelRegistry,
    compositor: Mutex<Compositor>,
    last_tags: Mutex<Option<Tags>>,
}

impl ImageMaker {
    pub fn new(rgb: bool, order: RgbByteOrder) -> Self {
        Self {
            registry: ChannelRegistry::new(rgb, order),
            compositor: Mutex::new(Compositor::new()),
            last_tags: Mutex::new(None),
        }
    }

    pub fn registry(&self) -> &ChannelRegistry {
        &self.registry
    }

    /// Run one recompute cycle for `view`.
    ///
    /// With `fetch` set, every displayed channel's samples are fetched again.
    /// Channels with nothing resident are fetched either way. A channel whose
    /// fetch fails keeps its previous tone-mapped image.
    /// Autoscaled contrast is written back into `settings`.
    pub fn make_image(
        &self,
        view: &ViewCoords,
        source: &dyn DataSource,
        settings: &RwLock<DisplaySettings>,
        channels: &[String],
        fetch: bool,
    ) -> DisplayFrame {
        let (width, height) = view.source_size_at_res_level();
        let resolution = view.resolution_index();
        let (x, y) = view.view_offset_at_res_level();
        let snapshot = read(settings).clone();
        let current = current_channel(view, channels);
        let shown = displayed_channels(&snapshot, channels, &current);
        let mut keys: Option<Vec<AxisPositions>> = None;

        let mut bit_depths = Vec::new();
        let mut outcomes = Vec::new();
        for name in &shown {
            let processor = self.registry.get_or_create(name);
            let mut processor = lock(&processor);

            if (fetch || !processor.has_samples()) && width > 0 && height > 0 {
                let keys = keys.get_or_insert_with(|| source.image_keys());
                let axes = axes_for_channel(view.axes(), name, keys.as_slice());
                match source.samples_for_region(&axes, resolution, x, y, width, height) {
                    Ok(tagged) => {
                        let (got_width, got_height) = tagged.samples.dim();
                        if (got_width, got_height) != (width, height) {
                            let e = NdViewError::DimensionMismatch {
                                width,
                                height,
                                got_width,
                                got_height,
                            };
                            warn!(channel = %name, error = %e, "Source returned wrong region size; keeping previous image");
                            continue;
                        }
                        if *name == current {
                            *lock(&self.last_tags) = Some(tagged.tags);
                        }
                        if let Err(e) = processor.ingest(tagged.samples, tagged.bit_depth) {
                            warn!(channel = %name, error = %e, "Samples rejected; keeping previous image");
                            continue;
                        }
                        bit_depths.push((name.clone(), tagged.bit_depth));
                    }
                    Err(e) => {
                        warn!(channel = %name, error = %e, "Fetch failed; keeping previous image");
                        continue;
                    }
                }
            }

            let outcome = processor.recompute(&snapshot.contrast_request(name));
            outcomes.push((name.clone(), outcome));
        }

        if !bit_depths.is_empty() || outcomes.iter().any(|(_, o)| o.autoscaled) {
            let mut settings = write(settings);
            for (name, bit_depth) in &bit_depths {
                settings.set_bit_depth(name, *bit_depth);
            }
            for (name, outcome) in &outcomes {
                settings.apply_outcome(name, outcome);
            }
        }

        let handles: Vec<_> = shown.iter().map(|name| self.registry.get_or_create(name)).collect();
        let guards: Vec<MutexGuard<'_, PixelProcessor>> = handles.iter().map(|h| lock(h)).collect();
        let refs: Vec<&PixelProcessor> = guards.iter().map(|g| &**g).collect();
        let buffer = lock(&self.compositor).composite(&refs, width, height);
        drop(refs);
        drop(guards);

        debug!(
            channels = shown.len(),
            width,
            height,
            resolution,
            fetch,
            "Frame composited"
        );
        DisplayFrame {
            buffer,
            histograms: self.registry.histograms(),
            tags: lock(&self.last_tags).clone(),
            view: view.clone(),
        }
    }
}

/// The view's channel if it is one of `channels`, otherwise the first.
fn current_channel(view: &ViewCoords, channels: &[String]) -> String {
    let active = view.active_channel();
    if channels.contains(&active) {
        active
    } else {
        channels.first().cloned().unwrap_or_else(|| NO_CHANNEL.to_string())
    }
}

fn displayed_channels(settings: &DisplaySettings, channels: &[String], current: &str) -> Vec<String> {
    if settings.histogram.composite {
        channels
            .iter()
            .filter(|c| settings.channel(c).active)
            .cloned()
            .collect()
    } else {
        vec![current.to_string()]
    }
}

/// Request axes for `channel`: the view's axes with the channel substituted,
/// minus axes that no image of that channel carries.
fn axes_for_channel(view_axes: &AxisPositions, channel: &str, keys: &[AxisPositions]) -> AxisPositions {
    let mut axes = view_axes.clone();
    if channel == NO_CHANNEL {
        axes.remove(CHANNEL_AXIS);
    } else {
        axes.insert(CHANNEL_AXIS.to_string(), AxisPosition::from(channel));
    }

    let channel_keys = keys.iter().filter(|k| match k.get(CHANNEL_AXIS) {
        Some(c) => c.to_string() == channel,
        None => channel == NO_CHANNEL,
    });
    let present: BTreeSet<&str> = channel_keys.flat_map(|k| k.keys().map(String::as_str)).collect();
    if !present.is_empty() {
        axes.retain(|axis, _| present.contains(axis.as_str()));
    }
    axes
}
