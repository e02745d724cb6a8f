use thiserror::Error;

#[derive(Error, Debug)]
pub enum NdViewError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("No image stored at axes {0}")]
    MissingAxes(String),

    #[error("Resolution level {index} not available (max: {max})")]
    ResolutionUnavailable { index: u32, max: u32 },

    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Unsupported bit depth: {0}")]
    UnsupportedBitDepth(u8),

    #[error("Sample buffer is {got_width}x{got_height}, expected {width}x{height}")]
    DimensionMismatch {
        width: usize,
        height: usize,
        got_width: usize,
        got_height: usize,
    },

    #[error("Config error: {0}")]
    Config(String),

    #[error("Data source is closed")]
    SourceClosed,
}

impl From<toml::de::Error> for NdViewError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for NdViewError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, NdViewError>;
