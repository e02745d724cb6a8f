#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use ndarray::Array2;

use ndview_core::source::{axes, AxisPosition, InMemorySource, SampleBuffer};

/// Generous upper bound for pipelines to drain in tests.
pub const FLUSH_TIMEOUT: Duration = Duration::from_secs(10);

/// 16-bit grayscale buffer filled by `f(x, y)`.
pub fn gray16(width: usize, height: usize, f: impl Fn(usize, usize) -> u16) -> SampleBuffer {
    SampleBuffer::Gray16(Array2::from_shape_fn((height, width), |(y, x)| f(x, y)))
}

/// 8-bit grayscale buffer filled by `f(x, y)`.
pub fn gray8(width: usize, height: usize, f: impl Fn(usize, usize) -> u8) -> SampleBuffer {
    SampleBuffer::Gray8(Array2::from_shape_fn((height, width), |(y, x)| f(x, y)))
}

/// Uniform 8-bit buffer.
pub fn flat8(width: usize, height: usize, value: u8) -> SampleBuffer {
    gray8(width, height, |_, _| value)
}

/// Packed 4-byte color buffer with every pixel set to `pixel`.
pub fn packed(width: usize, height: usize, pixel: [u8; 4]) -> SampleBuffer {
    SampleBuffer::Packed32(Array2::from_shape_fn((height, width * 4), |(_, col)| pixel[col % 4]))
}

/// Source holding one uniform 8-bit image per `(channel, value)` at z = 0.
pub fn channel_source(width: usize, height: usize, channels: &[(&str, u8)]) -> Arc<InMemorySource> {
    let source = InMemorySource::new();
    for &(name, value) in channels {
        source.insert(
            axes([("channel", AxisPosition::from(name)), ("z", AxisPosition::from(0))]),
            flat8(width, height, value),
            8,
        );
    }
    Arc::new(source)
}

/// Source without a channel axis holding `planes` z-planes whose pixels all
/// equal the plane index times 10.
pub fn z_stack_source(width: usize, height: usize, planes: usize) -> Arc<InMemorySource> {
    let source = InMemorySource::new();
    for z in 0..planes {
        source.insert(axes([("z", z as i64)]), flat8(width, height, (z * 10) as u8), 8);
    }
    Arc::new(source)
}
