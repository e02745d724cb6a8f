/// Minimum pixel count (h*w) to use Rayon parallelism in per-pixel loops.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Axis label reserved for the channel axis.
pub const CHANNEL_AXIS: &str = "channel";

/// Name used for the single channel of a dataset without a channel axis.
pub const NO_CHANNEL: &str = "";

/// Number of entries in a tone curve lookup table (8-bit output).
pub const TONE_LEVELS: usize = 256;

/// Number of bins the raw histogram is coalesced into for display and
/// min/max statistics.
pub const DISPLAY_HISTOGRAM_BINS: usize = 256;

/// Source extent (full-resolution pixels) used before the dataset bounds
/// are known.
pub const DEFAULT_SOURCE_SIZE: f64 = 700.0;

/// Zoom-in stops once either source dimension would drop below this many
/// full-resolution pixels.
pub const MIN_SOURCE_SIZE: f64 = 5.0;

/// Gamma values within this distance of 1.0 snap to linear.
pub const GAMMA_SNAP_TOLERANCE: f64 = 0.1;

/// Default frame rate of axis animation.
pub const DEFAULT_ANIMATION_FPS: f64 = 7.0;

/// Outer width in display pixels of the zoom indicator overlay.
pub const ZOOM_INDICATOR_WIDTH: f64 = 100.0;

/// Margin in display pixels of the zoom indicator overlay.
pub const ZOOM_INDICATOR_MARGIN: f64 = 10.0;

/// Width in display pixels of the scale bar overlay.
pub const SCALE_BAR_WIDTH: f64 = 100.0;

/// Red plane saturation value of a packed 0x00RRGGBB pixel.
pub const RED_PLANE_MAX: u32 = 0x00FF_0000;

/// Green plane saturation value of a packed 0x00RRGGBB pixel.
pub const GREEN_PLANE_MAX: u32 = 0x0000_FF00;

/// Blue plane saturation value of a packed 0x00RRGGBB pixel.
pub const BLUE_PLANE_MAX: u32 = 0x0000_00FF;
