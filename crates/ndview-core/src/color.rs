use serde::{Deserialize, Serialize};

/// Display color of a channel. Each tone level is scaled by these components.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl ChannelColor {
    pub const WHITE: Self = Self::new(255, 255, 255);
    pub const RED: Self = Self::new(255, 0, 0);
    pub const GREEN: Self = Self::new(0, 255, 0);
    pub const BLUE: Self = Self::new(0, 0, 255);
    pub const CYAN: Self = Self::new(0, 255, 255);
    pub const MAGENTA: Self = Self::new(255, 0, 255);
    pub const YELLOW: Self = Self::new(255, 255, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Default color for the `index`-th channel of a multi-channel dataset.
    pub fn for_channel_index(index: usize) -> Self {
        const PALETTE: [ChannelColor; 6] = [
            ChannelColor::BLUE,
            ChannelColor::GREEN,
            ChannelColor::RED,
            ChannelColor::MAGENTA,
            ChannelColor::CYAN,
            ChannelColor::YELLOW,
        ];
        PALETTE[index % PALETTE.len()]
    }

    /// Pack into a 0x00RRGGBB pixel.
    pub fn packed(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }
}

impl Default for ChannelColor {
    fn default() -> Self {
        Self::WHITE
    }
}
