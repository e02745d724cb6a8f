use crate::consts::{CHANNEL_AXIS, DEFAULT_SOURCE_SIZE, MIN_SOURCE_SIZE, NO_CHANNEL};
use crate::source::{AxisPosition, AxisPositions, Bounds};

/// A point or extent in either display or full-resolution pixel units.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// What part of the dataset is on screen, and at which pyramid level.
///
/// `source_size` and `view_offset` are always in full-resolution pixels,
/// whatever pyramid level the display is fetched from. Cloning yields an
/// independent snapshot for handing to worker tasks.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewCoords {
    view_offset: Point,
    source_size: Point,
    display_size: (u32, u32),
    bounds: Option<Bounds>,
    axes: AxisPositions,
    rgb: bool,
    min_source_size: f64,
    source_size_initialized: bool,
}

impl ViewCoords {
    /// `initial_source_size` of `None` starts at a 700x700 placeholder that
    /// is replaced by the dataset extent once bounds are known.
    pub fn new(bounds: Option<Bounds>, initial_source_size: Option<Point>, rgb: bool) -> Self {
        let mut coords = Self {
            view_offset: Point::default(),
            source_size: initial_source_size
                .unwrap_or(Point::new(DEFAULT_SOURCE_SIZE, DEFAULT_SOURCE_SIZE)),
            display_size: (0, 0),
            bounds: None,
            axes: AxisPositions::new(),
            rgb,
            min_source_size: MIN_SOURCE_SIZE,
            source_size_initialized: initial_source_size.is_some(),
        };
        coords.set_bounds(bounds);
        coords
    }

    pub fn with_min_source_size(mut self, min_source_size: f64) -> Self {
        self.min_source_size = min_source_size;
        self
    }

    pub fn set_bounds(&mut self, bounds: Option<Bounds>) {
        if let Some(b) = bounds {
            if !self.source_size_initialized {
                self.source_size = Point::new(b.width(), b.height());
                self.source_size_initialized = true;
            }
        }
        self.bounds = bounds;
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    pub fn is_rgb(&self) -> bool {
        self.rgb
    }

    pub fn view_offset(&self) -> Point {
        self.view_offset
    }

    pub fn set_view_offset(&mut self, x: f64, y: f64) {
        self.view_offset = Point::new(x, y);
    }

    /// Full-resolution extent mapped onto the display.
    pub fn source_size(&self) -> Point {
        self.source_size
    }

    pub fn set_source_size(&mut self, width: f64, height: f64) {
        self.source_size = Point::new(width, height);
        self.source_size_initialized = true;
    }

    pub fn display_size(&self) -> (u32, u32) {
        self.display_size
    }

    pub fn set_display_size(&mut self, width: u32, height: u32) {
        self.display_size = (width, height);
    }

    /// Pyramid level to fetch from: `ceil(log2(source_width / display_width))`,
    /// never below 0.
    pub fn resolution_index(&self) -> u32 {
        let display_width = self.display_size.0 as f64;
        if display_width <= 0.0 || self.source_size.x <= 0.0 {
            return 0;
        }
        let exact = (self.source_size.x / display_width).log2().ceil();
        if exact.is_finite() && exact > 0.0 {
            exact as u32
        } else {
            0
        }
    }

    pub fn downsample_factor(&self) -> f64 {
        2f64.powi(self.resolution_index() as i32)
    }

    /// Display pixels per full-resolution pixel.
    pub fn magnification(&self) -> f64 {
        self.display_size.0 as f64 / self.source_size.x
    }

    /// Display pixels per pixel of the fetched pyramid level.
    pub fn magnification_at_res_level(&self) -> f64 {
        let level_width = (self.source_size.x / self.downsample_factor()).floor().max(1.0);
        self.display_size.0 as f64 / level_width
    }

    /// Size in pixels of the region fetched from the current pyramid level.
    pub fn source_size_at_res_level(&self) -> (usize, usize) {
        let ds = self.downsample_factor();
        (
            (self.source_size.x / ds).floor().max(0.0) as usize,
            (self.source_size.y / ds).floor().max(0.0) as usize,
        )
    }

    /// View offset in pixels of the current pyramid level.
    pub fn view_offset_at_res_level(&self) -> (i64, i64) {
        let ds = self.downsample_factor();
        (
            (self.view_offset.x / ds).floor() as i64,
            (self.view_offset.y / ds).floor() as i64,
        )
    }

    /// Shift the view by `(dx, dy)` display pixels. Does nothing until the
    /// display has a size.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        let scale = self.downsample_factor() / self.magnification_at_res_level();
        if !scale.is_finite() || scale <= 0.0 {
            return;
        }
        let x = self.view_offset.x + dx * scale;
        let y = self.view_offset.y + dy * scale;
        self.set_view_offset_clamped(x, y);
    }

    /// Scale the source extent by `factor` (< 1 zooms in) around `center`,
    /// given in display pixels, or around the middle of the view. A point is
    /// ignored while the display has no size.
    ///
    /// Returns `false` when the zoom would exceed the over-zoom limit and was
    /// rejected.
    pub fn zoom(&mut self, factor: f64, center: Option<Point>) -> bool {
        let offset = self.view_offset;
        let old_size = self.source_size;
        let mag = self.magnification();
        let zoom_center = match center {
            Some(p) if mag.is_finite() && mag > 0.0 => {
                Point::new(offset.x + p.x / mag, offset.y + p.y / mag)
            }
            _ => Point::new(offset.x + old_size.x / 2.0, offset.y + old_size.y / 2.0),
        };

        let mut width = old_size.x * factor;
        let mut height = old_size.y * factor;
        if width < self.min_source_size || height < self.min_source_size {
            return false;
        }
        if let Some(b) = self.bounds {
            let overzoom = (width / b.width()).max(height / b.height());
            if overzoom > 1.0 {
                width /= overzoom;
                height /= overzoom;
            }
        }
        self.source_size = Point::new(width, height);

        let x = zoom_center.x - (zoom_center.x - offset.x) * width / old_size.x;
        let y = zoom_center.y - (zoom_center.y - offset.y) * height / old_size.y;
        self.set_view_offset_clamped(x, y);
        true
    }

    /// The rendering surface changed size. Reshape the source extent to the
    /// new aspect ratio and keep the view in bounds.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            self.display_size = (width, height);
            return;
        }
        let (old_w, old_h) = self.display_size;
        let canvas_aspect = width as f64 / height as f64;
        let source = self.source_size;
        let source_aspect = source.x / source.y;

        let (mut new_x, mut new_y) = if let Some(b) = self.bounds {
            let (mut x, mut y) = if canvas_aspect > source_aspect {
                (canvas_aspect / source_aspect * source.x, source.y)
            } else {
                (source.x, source.y / (canvas_aspect / source_aspect))
            };
            let overzoom = (x / b.width()).max(y / b.height());
            if overzoom > 1.0 {
                x /= overzoom;
                y /= overzoom;
            }
            (x, y)
        } else if old_w != 0 && old_h != 0 {
            (
                source.x * (width as f64 / old_w as f64),
                source.y * (height as f64 / old_h as f64),
            )
        } else {
            (source.x / source_aspect * canvas_aspect, source.y)
        };
        if !new_x.is_finite() || !new_y.is_finite() {
            new_x = source.x;
            new_y = source.y;
        }

        self.display_size = (width, height);
        self.source_size = Point::new(new_x, new_y);
        let offset = self.view_offset;
        self.set_view_offset_clamped(offset.x, offset.y);
    }

    /// Move the view to `(x, y)`, kept inside the bounds if there are any.
    /// Non-finite coordinates are ignored.
    pub fn set_view_offset_clamped(&mut self, x: f64, y: f64) {
        if !x.is_finite() || !y.is_finite() {
            return;
        }
        self.view_offset = match self.bounds {
            Some(b) => Point::new(
                (b.x_max as f64 - self.source_size.x).min(x).max(b.x_min as f64),
                (b.y_max as f64 - self.source_size.y).min(y).max(b.y_min as f64),
            ),
            None => Point::new(x, y),
        };
    }

    pub fn axes(&self) -> &AxisPositions {
        &self.axes
    }

    pub fn set_axis_position(&mut self, axis: impl Into<String>, position: impl Into<AxisPosition>) {
        self.axes.insert(axis.into(), position.into());
    }

    /// Position along `axis`; axes never set are at 0.
    pub fn axis_position(&self, axis: &str) -> AxisPosition {
        self.axes.get(axis).cloned().unwrap_or_default()
    }

    /// Name of the channel the view points at, or the unnamed channel.
    pub fn active_channel(&self) -> String {
        self.axes
            .get(CHANNEL_AXIS)
            .map(|p| p.to_string())
            .unwrap_or_else(|| NO_CHANNEL.to_string())
    }

    pub fn set_active_channel(&mut self, channel: &str) {
        self.set_axis_position(CHANNEL_AXIS, channel);
    }

    /// Immutable copy for a worker task.
    pub fn snapshot(&self) -> Self {
        self.clone()
    }
}
