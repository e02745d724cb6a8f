mod buffer;
mod compositor;

pub use buffer::PixelBuffer;
pub use compositor::Compositor;
