use std::path::Path;

use image::{ImageFormat, Rgb, RgbImage};

use crate::error::Result;

/// Composited display image, one packed `0x00RRGGBB` value per pixel in
/// row-major order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PixelBuffer {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u32>,
}

impl PixelBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height],
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(y * self.width + x).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn to_rgb_image(&self) -> RgbImage {
        let mut img = RgbImage::new(self.width as u32, self.height as u32);
        for (i, &p) in self.pixels.iter().enumerate() {
            let (x, y) = (i % self.width, i / self.width);
            let rgb = [(p >> 16) as u8, (p >> 8) as u8, p as u8];
            img.put_pixel(x as u32, y as u32, Rgb(rgb));
        }
        img
    }

    /// Save as 8-bit RGB PNG.
    pub fn save_png(&self, path: &Path) -> Result<()> {
        self.to_rgb_image().save_with_format(path, ImageFormat::Png)?;
        Ok(())
    }
}
