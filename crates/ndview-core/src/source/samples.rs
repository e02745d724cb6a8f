use byteorder::{ByteOrder, LittleEndian};
use ndarray::Array2;
use num_traits::AsPrimitive;

use crate::error::{NdViewError, Result};

/// Raw samples of one image region.
#[derive(Clone, Debug, PartialEq)]
pub enum SampleBuffer {
    /// Grayscale, 8 bits per sample.
    Gray8(Array2<u8>),
    /// Grayscale, 9 to 16 bits per sample.
    Gray16(Array2<u16>),
    /// Packed color, four interleaved bytes per pixel. Shape is
    /// `(height, width * 4)`.
    Packed32(Array2<u8>),
}

impl SampleBuffer {
    pub fn width(&self) -> usize {
        match self {
            Self::Gray8(a) => a.ncols(),
            Self::Gray16(a) => a.ncols(),
            Self::Packed32(a) => a.ncols() / 4,
        }
    }

    pub fn height(&self) -> usize {
        match self {
            Self::Gray8(a) => a.nrows(),
            Self::Gray16(a) => a.nrows(),
            Self::Packed32(a) => a.nrows(),
        }
    }

    pub fn dim(&self) -> (usize, usize) {
        (self.width(), self.height())
    }

    /// Number of raw histogram buckets for this sample width.
    pub fn histogram_len(&self) -> usize {
        match self {
            Self::Gray16(_) => 1 << 16,
            Self::Gray8(_) | Self::Packed32(_) => 1 << 8,
        }
    }

    pub fn is_packed(&self) -> bool {
        matches!(self, Self::Packed32(_))
    }

    /// Decode little-endian raw sample bytes.
    ///
    /// `bit_depth` selects the layout: up to 8 bits is one byte per sample,
    /// 9 to 16 bits is two bytes per sample, 32 is packed 4-byte color.
    pub fn from_le_bytes(bytes: &[u8], width: usize, height: usize, bit_depth: u8) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(NdViewError::InvalidDimensions { width, height });
        }
        let pixels = width
            .checked_mul(height)
            .ok_or(NdViewError::InvalidDimensions { width, height })?;
        let bytes_per_pixel = match bit_depth {
            1..=8 => 1,
            9..=16 => 2,
            32 => 4,
            other => return Err(NdViewError::UnsupportedBitDepth(other)),
        };
        if bytes.len() != pixels * bytes_per_pixel {
            return Err(NdViewError::InvalidDimensions { width, height });
        }

        let shape_err = |_| NdViewError::InvalidDimensions { width, height };
        let buffer = match bytes_per_pixel {
            1 => Self::Gray8(Array2::from_shape_vec((height, width), bytes.to_vec()).map_err(shape_err)?),
            2 => {
                let mut values = vec![0u16; pixels];
                LittleEndian::read_u16_into(bytes, &mut values);
                Self::Gray16(Array2::from_shape_vec((height, width), values).map_err(shape_err)?)
            }
            _ => Self::Packed32(
                Array2::from_shape_vec((height, width * 4), bytes.to_vec()).map_err(shape_err)?,
            ),
        };
        Ok(buffer)
    }

    /// Copy out a `width x height` region starting at `(x, y)`. Pixels outside
    /// the buffer are zero.
    pub fn region(&self, x: i64, y: i64, width: usize, height: usize) -> Self {
        match self {
            Self::Gray8(a) => Self::Gray8(crop_fill(a, x, y, width, height, 1)),
            Self::Gray16(a) => Self::Gray16(crop_fill(a, x, y, width, height, 1)),
            Self::Packed32(a) => Self::Packed32(crop_fill(a, x, y, width, height, 4)),
        }
    }

    /// Next pyramid level: 2x2 mean binning, odd edges averaged over the
    /// pixels that exist.
    pub fn downsample2x(&self) -> Self {
        match self {
            Self::Gray8(a) => Self::Gray8(bin2x2(a, 1)),
            Self::Gray16(a) => Self::Gray16(bin2x2(a, 1)),
            Self::Packed32(a) => Self::Packed32(bin2x2(a, 4)),
        }
    }
}

/// `components` interleaved values per pixel along each row.
fn crop_fill<T>(src: &Array2<T>, x: i64, y: i64, width: usize, height: usize, components: usize) -> Array2<T>
where
    T: Copy + Default,
{
    let (src_h, src_w) = (src.nrows() as i64, (src.ncols() / components) as i64);
    Array2::from_shape_fn((height, width * components), |(row, col)| {
        let sy = y + row as i64;
        let sx = x + (col / components) as i64;
        if sy < 0 || sx < 0 || sy >= src_h || sx >= src_w {
            T::default()
        } else {
            src[[sy as usize, sx as usize * components + col % components]]
        }
    })
}

fn bin2x2<T>(src: &Array2<T>, components: usize) -> Array2<T>
where
    T: Copy + AsPrimitive<u32>,
    u32: AsPrimitive<T>,
{
    let src_h = src.nrows();
    let src_w = src.ncols() / components;
    let out_h = src_h.div_ceil(2).max(1);
    let out_w = src_w.div_ceil(2).max(1);

    Array2::from_shape_fn((out_h, out_w * components), |(row, col)| -> T {
        let px = col / components;
        let c = col % components;
        let mut sum = 0u32;
        let mut count = 0u32;
        for sy in (row * 2)..(row * 2 + 2).min(src_h) {
            for sx in (px * 2)..(px * 2 + 2).min(src_w) {
                sum += src[[sy, sx * components + c]].as_();
                count += 1;
            }
        }
        let mean = if count == 0 { 0 } else { (sum + count / 2) / count };
        mean.as_()
    })
}
