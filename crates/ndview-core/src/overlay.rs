//! Overlay geometry drawn on top of the composited image.
//!
//! Only the shapes are produced here; drawing them is up to the presenter.

use crate::color::ChannelColor;
use crate::consts::{SCALE_BAR_WIDTH, ZOOM_INDICATOR_MARGIN, ZOOM_INDICATOR_WIDTH};
use crate::sched::CancelToken;
use crate::view::ViewCoords;

/// Shape in display pixel coordinates.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        color: ChannelColor,
        filled: bool,
    },
    Text {
        x: f64,
        y: f64,
        text: String,
        color: ChannelColor,
    },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Overlay {
    pub shapes: Vec<Shape>,
}

impl Overlay {
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

/// Builds the overlay for a view snapshot on the overlay worker.
///
/// Long builds should poll `token` and return `None` once it is cancelled;
/// a cancelled overlay is discarded either way.
pub trait OverlayBuilder: Send {
    fn build(&mut self, view: &ViewCoords, token: &CancelToken) -> Option<Overlay>;
}

/// Zoom indicator, optional scale bar and optional axis position labels.
#[derive(Clone, Debug, PartialEq)]
pub struct DefaultOverlayBuilder {
    pub pixel_size_um: f64,
    pub show_scale_bar: bool,
    /// Axes whose current position is printed in the lower-left corner.
    pub label_axes: Vec<String>,
}

impl Default for DefaultOverlayBuilder {
    fn default() -> Self {
        Self {
            pixel_size_um: 1.0,
            show_scale_bar: false,
            label_axes: Vec::new(),
        }
    }
}

impl DefaultOverlayBuilder {
    pub fn new(pixel_size_um: f64, show_scale_bar: bool) -> Self {
        Self {
            pixel_size_um,
            show_scale_bar,
            label_axes: Vec::new(),
        }
    }
}

impl OverlayBuilder for DefaultOverlayBuilder {
    fn build(&mut self, view: &ViewCoords, token: &CancelToken) -> Option<Overlay> {
        let mut overlay = Overlay::default();

        overlay.shapes.extend(zoom_indicator(view));
        if token.is_cancelled() {
            return None;
        }

        if self.show_scale_bar {
            overlay.shapes.extend(scale_bar(view, self.pixel_size_um));
            if token.is_cancelled() {
                return None;
            }
        }

        let (_, display_h) = view.display_size();
        for (i, axis) in self.label_axes.iter().enumerate() {
            overlay.shapes.push(Shape::Text {
                x: ZOOM_INDICATOR_MARGIN,
                y: display_h as f64 - 30.0 * (i + 1) as f64,
                text: format!("{axis}: {}", view.axis_position(axis)),
                color: ChannelColor::WHITE,
            });
            if token.is_cancelled() {
                return None;
            }
        }

        Some(overlay)
    }
}

/// Outer rectangle standing for the whole image, inner rectangle for the
/// visible part. Empty when unbounded or fully zoomed out.
pub fn zoom_indicator(view: &ViewCoords) -> Vec<Shape> {
    let Some(bounds) = view.bounds() else {
        return Vec::new();
    };
    let (full_w, full_h) = (bounds.width(), bounds.height());
    if full_w <= 0.0 || full_h <= 0.0 {
        return Vec::new();
    }

    let outer_w = ZOOM_INDICATOR_WIDTH;
    let outer_h = (full_h / full_w * outer_w).trunc();
    let offset = view.view_offset();
    let source = view.source_size();
    let inner_x = (outer_w / full_w * (offset.x - bounds.x_min as f64)).round();
    let inner_y = (outer_h / full_h * (offset.y - bounds.y_min as f64)).round();
    let inner_w = (outer_w * source.x / full_w).trunc();
    let inner_h = (outer_h * source.y / full_h).trunc();

    if inner_w == outer_w && inner_h == outer_h {
        return Vec::new();
    }
    let rect = |x, y, width, height| Shape::Rect {
        x,
        y,
        width,
        height,
        color: ChannelColor::MAGENTA,
        filled: false,
    };
    vec![
        rect(ZOOM_INDICATOR_MARGIN, ZOOM_INDICATOR_MARGIN, outer_w, outer_h),
        rect(
            ZOOM_INDICATOR_MARGIN + inner_x,
            ZOOM_INDICATOR_MARGIN + inner_y,
            inner_w,
            inner_h,
        ),
    ]
}

/// Label `round(pixel_size / magnification * 100) µm` above a filled bar
/// 100 display pixels wide in the upper-right corner.
pub fn scale_bar(view: &ViewCoords, pixel_size_um: f64) -> Vec<Shape> {
    let magnification = view.magnification();
    if !magnification.is_finite() || magnification <= 0.0 {
        return Vec::new();
    }
    let bar_um = (pixel_size_um / magnification * SCALE_BAR_WIDTH).round();
    let display_w = view.display_size().0 as f64;
    vec![
        Shape::Text {
            x: display_w - 100.0,
            y: 30.0,
            text: format!("{bar_um} \u{00B5}m"),
            color: ChannelColor::WHITE,
        },
        Shape::Rect {
            x: display_w - 125.0,
            y: 62.0,
            width: SCALE_BAR_WIDTH,
            height: 15.0,
            color: ChannelColor::WHITE,
            filled: true,
        },
    ]
}
