use std::sync::mpsc;

use crate::overlay::Overlay;
use crate::view::ViewCoords;

use super::image_maker::DisplayFrame;
use super::ranges::AxisRanges;

/// Receives the viewer's output on the presentation and overlay workers.
///
/// Calls may block; the pipelines feeding them coalesce in the meantime.
pub trait Presenter: Send + Sync {
    fn present(&self, frame: &DisplayFrame);

    fn show_overlay(&self, overlay: &Overlay, view: &ViewCoords);

    /// Axis ranges grew; `new_channels` were seen for the first time.
    fn expand_axis_ranges(&self, ranges: &AxisRanges, new_channels: &[String]);
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn present(&self, _frame: &DisplayFrame) {}

    fn show_overlay(&self, _overlay: &Overlay, _view: &ViewCoords) {}

    fn expand_axis_ranges(&self, _ranges: &AxisRanges, _new_channels: &[String]) {}
}

#[derive(Debug)]
pub enum PresenterEvent {
    Frame(DisplayFrame),
    Overlay(Overlay),
    AxisRanges {
        ranges: AxisRanges,
        new_channels: Vec<String>,
    },
}

/// Forwards presenter calls over an mpsc channel to whichever thread owns
/// the display.
pub struct ChannelPresenter {
    tx: mpsc::Sender<PresenterEvent>,
}

impl ChannelPresenter {
    pub fn new() -> (Self, mpsc::Receiver<PresenterEvent>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }
}

impl Presenter for ChannelPresenter {
    fn present(&self, frame: &DisplayFrame) {
        let _ = self.tx.send(PresenterEvent::Frame(frame.clone()));
    }

    fn show_overlay(&self, overlay: &Overlay, _view: &ViewCoords) {
        let _ = self.tx.send(PresenterEvent::Overlay(overlay.clone()));
    }

    fn expand_axis_ranges(&self, ranges: &AxisRanges, new_channels: &[String]) {
        let _ = self.tx.send(PresenterEvent::AxisRanges {
            ranges: ranges.clone(),
            new_channels: new_channels.to_vec(),
        });
    }
}
