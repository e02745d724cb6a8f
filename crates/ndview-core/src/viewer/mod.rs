//! Viewer façade.
//!
//! [`Viewer`] owns the live viewport, the display settings and three
//! single-worker pipelines:
//!
//! * `display-calculation` fetches and tone-maps samples, then composites;
//! * `presentation` hands frames to the [`Presenter`] and folds newly
//!   arrived images into the axis ranges;
//! * `overlay` rebuilds overlay geometry, abandoning stale builds.
//!
//! Mutations are applied on the caller's thread, then a task carrying a
//! snapshot of the view is submitted. Bursts of submissions coalesce.

mod animation;
mod image_maker;
mod presenter;
mod ranges;
mod settings;
mod tasks;

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::color::ChannelColor;
use crate::config::ViewerConfig;
use crate::consts::CHANNEL_AXIS;
use crate::error::{NdViewError, Result};
use crate::overlay::OverlayBuilder;
use crate::sched::{CoalescingExecutor, ExecutorOptions, Submitter};
use crate::source::{AxisPosition, AxisPositions, DataSource};
use crate::sync::{lock, read, write};
use crate::view::{Point, ViewCoords};

pub use animation::next_position;
pub use image_maker::{ChannelRegistry, DisplayFrame, ImageMaker};
pub use presenter::{ChannelPresenter, NullPresenter, Presenter, PresenterEvent};
pub use ranges::AxisRanges;
pub use settings::{ChannelSettings, DisplaySettings, HistogramSettings};

use animation::Animator;
use tasks::{OverlayTask, PresentationTask, RecomputeTask};

struct ViewerShared {
    source: Arc<dyn DataSource>,
    presenter: Arc<dyn Presenter>,
    coords: Mutex<ViewCoords>,
    settings: RwLock<DisplaySettings>,
    ranges: Mutex<AxisRanges>,
    locked_axes: Mutex<BTreeSet<String>>,
    image_maker: ImageMaker,
    latest: Mutex<Option<DisplayFrame>>,
}

impl ViewerShared {
    /// Ask the source for a coarser pyramid level if the view needs one.
    fn sync_resolution(&self, view: &ViewCoords) {
        let index = view.resolution_index();
        let available = self.source.max_resolution_index();
        if index > available {
            info!(index, available, "Requesting resolution level");
            self.source.request_resolution_level(index);
        }
    }

    fn recompute_task(&self, fetch: bool) -> RecomputeTask {
        let view = lock(&self.coords).snapshot();
        self.sync_resolution(&view);
        RecomputeTask { view, fetch }
    }

    /// Move every unlocked axis (all axes when `from_human`) to `axes`.
    fn apply_image_event(&self, axes: &AxisPositions, from_human: bool) {
        let locked = lock(&self.locked_axes).clone();
        let mut coords = lock(&self.coords);
        for (axis, position) in axes {
            if from_human || !locked.contains(axis) {
                coords.set_axis_position(axis.clone(), position.clone());
            }
        }
    }

    fn run_recompute(&self, task: RecomputeTask) -> DisplayFrame {
        let channels = lock(&self.ranges).display_channels();
        {
            let mut settings = write(&self.settings);
            for channel in &channels {
                settings.ensure_channel(channel);
            }
        }
        let frame = self.image_maker.make_image(
            &task.view,
            self.source.as_ref(),
            &self.settings,
            &channels,
            task.fetch,
        );
        *lock(&self.latest) = Some(frame.clone());
        frame
    }

    /// Fold newly arrived images into the ranges, tell the presenter and
    /// jump to the newest one.
    fn expand_ranges(&self, events: &[AxisPositions]) {
        let (ranges, new_channels) = {
            let mut ranges = lock(&self.ranges);
            let mut new_channels = Vec::new();
            for event in events {
                new_channels.extend(ranges.include(event));
            }
            (ranges.clone(), new_channels)
        };
        if !new_channels.is_empty() {
            let mut settings = write(&self.settings);
            for channel in &new_channels {
                settings.ensure_channel(channel);
            }
            debug!(channels = ?new_channels, "New channels registered");
        }
        self.presenter.expand_axis_ranges(&ranges, &new_channels);
        if let Some(latest) = events.last() {
            self.apply_image_event(latest, false);
        }
    }
}

/// Interactive display pipeline over one [`DataSource`].
pub struct Viewer {
    shared: Arc<ViewerShared>,
    config: ViewerConfig,
    recompute: CoalescingExecutor<RecomputeTask>,
    presentation: CoalescingExecutor<PresentationTask>,
    overlay: CoalescingExecutor<OverlayTask>,
    animation: Mutex<Option<Animator>>,
    closed: AtomicBool,
}

impl Viewer {
    /// Viewer with the overlay described by `config`.
    pub fn new(source: Arc<dyn DataSource>, presenter: Arc<dyn Presenter>, config: ViewerConfig) -> Result<Self> {
        let builder = config.overlay_builder();
        Self::with_overlay_builder(source, presenter, config, Box::new(builder))
    }

    pub fn with_overlay_builder(
        source: Arc<dyn DataSource>,
        presenter: Arc<dyn Presenter>,
        config: ViewerConfig,
        mut builder: Box<dyn OverlayBuilder>,
    ) -> Result<Self> {
        config.validate()?;
        let coords = ViewCoords::new(source.bounds(), config.initial_source_point(), config.rgb)
            .with_min_source_size(config.min_source_size);
        let shared = Arc::new(ViewerShared {
            source,
            presenter,
            coords: Mutex::new(coords),
            settings: RwLock::new(DisplaySettings::default()),
            ranges: Mutex::new(AxisRanges::new()),
            locked_axes: Mutex::new(BTreeSet::new()),
            image_maker: ImageMaker::new(config.rgb, config.rgb_byte_order),
            latest: Mutex::new(None),
        });

        let recompute = CoalescingExecutor::new("ndview-display-calculation", ExecutorOptions::default());
        let presentation = CoalescingExecutor::new("ndview-presentation", ExecutorOptions::default());
        let overlay = CoalescingExecutor::new(
            "ndview-overlay",
            ExecutorOptions {
                cancel_in_flight: true,
            },
        );

        let publish: Submitter<PresentationTask> = presentation.submitter();
        let worker = Arc::clone(&shared);
        recompute.start(move |task: RecomputeTask, _token| {
            let frame = worker.run_recompute(task);
            publish.submit(PresentationTask::Publish(frame));
        })?;

        let build_overlay = overlay.submitter();
        let refresh = recompute.submitter();
        let worker = Arc::clone(&shared);
        presentation.start(move |task: PresentationTask, _token| match task {
            PresentationTask::Publish(frame) => {
                worker.presenter.present(&frame);
                build_overlay.submit(OverlayTask { view: frame.view });
            }
            PresentationTask::ExpandRange(events) => {
                worker.expand_ranges(&events);
                refresh.submit(worker.recompute_task(true));
            }
        })?;

        let worker = Arc::clone(&shared);
        overlay.start(move |task: OverlayTask, token| {
            if let Some(built) = builder.build(&task.view, token) {
                if !token.is_cancelled() {
                    worker.presenter.show_overlay(&built, &task.view);
                }
            }
        })?;

        info!(
            bounds = ?shared.source.bounds(),
            rgb = config.rgb,
            "Viewer started"
        );
        Ok(Self {
            shared,
            config,
            recompute,
            presentation,
            overlay,
            animation: Mutex::new(None),
            closed: AtomicBool::new(false),
        })
    }

    // ------------------------------------------------------------------
    // Viewport
    // ------------------------------------------------------------------

    /// Pan by `(dx, dy)` display pixels.
    pub fn pan(&self, dx: f64, dy: f64) {
        lock(&self.shared.coords).pan(dx, dy);
        self.on_viewport_changed();
    }

    /// Zoom by `factor` around `center` (display pixels) or the view center.
    /// Returns `false` if the zoom was rejected.
    pub fn zoom(&self, factor: f64, center: Option<Point>) -> bool {
        let accepted = lock(&self.shared.coords).zoom(factor, center);
        if accepted {
            self.on_viewport_changed();
        }
        accepted
    }

    pub fn resize(&self, width: u32, height: u32) {
        lock(&self.shared.coords).resize(width, height);
        self.on_viewport_changed();
    }

    /// Move the view to `(x, y)` full-resolution pixels, clamped to bounds.
    pub fn set_view_offset(&self, x: f64, y: f64) {
        lock(&self.shared.coords).set_view_offset_clamped(x, y);
        self.on_viewport_changed();
    }

    pub fn set_axis_position(&self, axis: &str, position: impl Into<AxisPosition>) {
        lock(&self.shared.coords).set_axis_position(axis, position);
        self.on_viewport_changed();
    }

    /// Jump to the image at `axes`. Locked axes only move when the request
    /// comes from a human.
    pub fn set_image_event(&self, axes: &AxisPositions, from_human: bool) {
        self.shared.apply_image_event(axes, from_human);
        self.on_viewport_changed();
    }

    pub fn lock_axis(&self, axis: &str) {
        lock(&self.shared.locked_axes).insert(axis.to_string());
    }

    pub fn unlock_axis(&self, axis: &str) {
        lock(&self.shared.locked_axes).remove(axis);
    }

    pub fn is_axis_locked(&self, axis: &str) -> bool {
        lock(&self.shared.locked_axes).contains(axis)
    }

    /// Snapshot of the current view.
    pub fn view(&self) -> ViewCoords {
        lock(&self.shared.coords).snapshot()
    }

    // ------------------------------------------------------------------
    // Contrast and channels
    // ------------------------------------------------------------------

    pub fn set_channel_active(&self, channel: &str, active: bool) {
        write(&self.shared.settings).set_active(channel, active);
        self.update();
    }

    /// Blend all active channels, or show only the view's channel.
    pub fn set_composite_mode(&self, composite: bool) {
        write(&self.shared.settings).histogram.composite = composite;
        self.update();
    }

    /// Manual contrast. Turns autoscaling off.
    pub fn set_contrast(&self, channel: &str, min: u32, max: u32) {
        {
            let mut settings = write(&self.shared.settings);
            settings.histogram.autoscale = false;
            settings.set_contrast(channel, min, max);
        }
        self.on_contrast_changed(channel);
    }

    pub fn set_gamma(&self, channel: &str, gamma: f64) {
        write(&self.shared.settings).set_gamma(channel, gamma);
        self.on_contrast_changed(channel);
    }

    pub fn set_channel_color(&self, channel: &str, color: ChannelColor) {
        write(&self.shared.settings).set_color(channel, color);
        self.on_contrast_changed(channel);
    }

    pub fn set_histogram_settings(&self, histogram: HistogramSettings) {
        let composite_changed = {
            let mut settings = write(&self.shared.settings);
            let changed = settings.histogram.composite != histogram.composite;
            settings.histogram = histogram;
            changed
        };
        if composite_changed {
            self.update();
        } else {
            self.recompute.submit(self.shared.recompute_task(false));
        }
    }

    /// Set the contrast of `channel` to its measured pixel range.
    pub fn autoscale_channel(&self, channel: &str) {
        let Some(processor) = self.shared.image_maker.registry().get(channel) else {
            return;
        };
        let stats = lock(&processor).stats();
        if let (Some(min), Some(max)) = (stats.pixel_min, stats.pixel_max) {
            self.set_contrast(channel, min as u32, max as u32);
        }
    }

    /// Open the contrast of `channel` to the full range of its bit depth.
    pub fn full_range_channel(&self, channel: &str) {
        {
            let mut settings = write(&self.shared.settings);
            settings.histogram.autoscale = false;
            settings.full_range(channel);
        }
        self.on_contrast_changed(channel);
    }

    pub fn remove_channel(&self, channel: &str) {
        self.shared.image_maker.registry().remove(channel);
        write(&self.shared.settings).remove_channel(channel);
        lock(&self.shared.ranges).remove_channel(channel);
        info!(channel, "Channel removed");
        self.recompute.submit(self.shared.recompute_task(false));
    }

    pub fn display_settings(&self) -> DisplaySettings {
        read(&self.shared.settings).clone()
    }

    /// Display settings serialized for persistence.
    pub fn display_settings_document(&self) -> Result<String> {
        read(&self.shared.settings).to_toml_string()
    }

    /// Histogram of `channel` in 256 display bins.
    pub fn display_histogram(&self, channel: &str) -> Option<Vec<f64>> {
        let log = read(&self.shared.settings).histogram.log_histogram;
        let processor = self.shared.image_maker.registry().get(channel)?;
        let bins = lock(&processor).display_histogram(log);
        Some(bins)
    }

    pub fn channel_names(&self) -> Vec<String> {
        lock(&self.shared.ranges).display_channels()
    }

    pub fn axis_ranges(&self) -> AxisRanges {
        lock(&self.shared.ranges).clone()
    }

    // ------------------------------------------------------------------
    // Update triggers
    // ------------------------------------------------------------------

    /// Refetch and redraw the current view.
    pub fn on_viewport_changed(&self) {
        self.recompute.submit(self.shared.recompute_task(true));
    }

    pub fn update(&self) {
        self.on_viewport_changed();
    }

    /// Re-tone-map the samples already held, without fetching.
    pub fn on_contrast_changed(&self, channel: &str) {
        debug!(channel, "Contrast changed");
        self.recompute.submit(self.shared.recompute_task(false));
    }

    /// A new image was stored at `axes`.
    pub fn on_new_data_available(&self, axes: AxisPositions) {
        let bounds = self.shared.source.bounds();
        lock(&self.shared.coords).set_bounds(bounds);
        self.presentation.submit(PresentationTask::ExpandRange(vec![axes]));
    }

    /// Start from a finished dataset: adopt persisted settings, if any, and
    /// scan every stored image.
    pub fn initialize_to_loaded(&self, settings: Option<DisplaySettings>) {
        if let Some(settings) = settings {
            *write(&self.shared.settings) = settings;
        }
        let keys = self.shared.source.image_keys();
        info!(images = keys.len(), "Initializing from loaded dataset");
        let bounds = self.shared.source.bounds();
        lock(&self.shared.coords).set_bounds(bounds);
        if keys.is_empty() {
            self.update();
        } else {
            self.presentation.submit(PresentationTask::ExpandRange(keys));
        }
    }

    /// Latest composited frame.
    pub fn composited_frame(&self) -> Option<DisplayFrame> {
        lock(&self.shared.latest).clone()
    }

    // ------------------------------------------------------------------
    // Animation
    // ------------------------------------------------------------------

    /// Step `axis` through its observed range at `fps` (the configured rate
    /// when `None`), wrapping around. Replaces a running animation.
    pub fn start_animation(&self, axis: &str, fps: Option<f64>) -> Result<()> {
        if axis == CHANNEL_AXIS || !lock(&self.shared.ranges).is_integer_axis(axis) {
            return Err(NdViewError::MissingAxes(axis.to_string()));
        }
        self.stop_animation();

        let fps = fps.unwrap_or(self.config.animation_fps);
        let shared = Arc::clone(&self.shared);
        let submit = self.recompute.submitter();
        let label = axis.to_string();
        let animator = Animator::start(axis, fps, move || {
            let Some((min, max)) = lock(&shared.ranges).range(&label) else {
                return false;
            };
            {
                let mut coords = lock(&shared.coords);
                let position = coords.axis_position(&label).as_int().unwrap_or(min);
                coords.set_axis_position(label.clone(), next_position(position, min, max));
            }
            submit.submit(shared.recompute_task(true))
        })?;
        *lock(&self.animation) = Some(animator);
        Ok(())
    }

    pub fn stop_animation(&self) {
        let animator = lock(&self.animation).take();
        if let Some(animator) = animator {
            animator.stop();
            info!("Animation stopped");
        }
    }

    pub fn is_animating(&self) -> bool {
        lock(&self.animation).is_some()
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Wait until every pipeline is idle. Returns `false` on timeout.
    pub fn flush(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            let before = self.submitted_total();
            for executor_idle in [
                self.recompute.wait_idle(deadline.saturating_duration_since(Instant::now())),
                self.presentation.wait_idle(deadline.saturating_duration_since(Instant::now())),
                self.overlay.wait_idle(deadline.saturating_duration_since(Instant::now())),
            ] {
                if !executor_idle {
                    return false;
                }
            }
            // Workers feed each other; idle only counts if nothing was
            // submitted while waiting.
            if self.submitted_total() == before {
                return true;
            }
        }
    }

    fn submitted_total(&self) -> u64 {
        self.recompute.submitted_count()
            + self.presentation.submitted_count()
            + self.overlay.submitted_count()
    }

    /// Stop animation, interrupt overlay work, discard queued tasks and close
    /// the data source. Idempotent.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.stop_animation();
        let discarded =
            self.overlay.shutdown_now() + self.presentation.shutdown_now() + self.recompute.shutdown_now();
        self.shared.source.close();
        info!(discarded, "Viewer closed");
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl Drop for Viewer {
    fn drop(&mut self) {
        self.close();
    }
}
