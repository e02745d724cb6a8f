use crate::color::ChannelColor;
use crate::consts::TONE_LEVELS;

/// 256-entry lookup table from tone level to packed color, split per plane
/// and pre-shifted into `0x00RRGGBB` bit positions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToneCurve {
    pub reds: [u32; TONE_LEVELS],
    pub greens: [u32; TONE_LEVELS],
    pub blues: [u32; TONE_LEVELS],
}

impl ToneCurve {
    /// `out = round((level / 255)^gamma * component)` for each color component.
    pub fn new(color: ChannelColor, gamma: f64) -> Self {
        let mut curve = Self {
            reds: [0; TONE_LEVELS],
            greens: [0; TONE_LEVELS],
            blues: [0; TONE_LEVELS],
        };
        let last = (TONE_LEVELS - 1) as f64;
        for level in 0..TONE_LEVELS {
            let y = (level as f64 / last).powf(gamma);
            let scale = |component: u8| (y * component as f64).round().clamp(0.0, 255.0) as u32;
            curve.reds[level] = scale(color.r) << 16;
            curve.greens[level] = scale(color.g) << 8;
            curve.blues[level] = scale(color.b);
        }
        curve
    }

    /// Packed color of one tone level.
    #[inline]
    pub fn lookup(&self, level: u8) -> u32 {
        let i = level as usize;
        self.reds[i] | self.greens[i] | self.blues[i]
    }
}

impl Default for ToneCurve {
    fn default() -> Self {
        Self::new(ChannelColor::WHITE, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_white_is_identity() {
        let curve = ToneCurve::default();
        assert_eq!(curve.lookup(0), 0);
        assert_eq!(curve.lookup(128), 0x0080_8080);
        assert_eq!(curve.lookup(255), 0x00FF_FFFF);
    }

    #[test]
    fn test_planes_are_preshifted() {
        let curve = ToneCurve::new(ChannelColor::GREEN, 1.0);
        assert_eq!(curve.greens[255], 0xFF00);
        assert_eq!(curve.reds[255], 0);
        assert_eq!(curve.blues[255], 0);
    }

    #[test]
    fn test_gamma_darkens_midtones() {
        let curve = ToneCurve::new(ChannelColor::RED, 2.0);
        let mid = curve.reds[128] >> 16;
        assert!(mid < 128);
        assert_eq!(curve.reds[255], 0x00FF_0000);
    }
}
