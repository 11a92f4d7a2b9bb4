//! Fixed-size value types shared by several packets.

/// Client-relative tick counter, transmitted as a variable-length integer.
pub type TimeStamp = u32;

/// 24-bit RGB color, transmitted as three bytes in r, g, b order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Pack into `0x00RRGGBB`.
    pub const fn to_u32(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    /// Unpack from `0x00RRGGBB`, ignoring the top byte.
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_u32(value: u32) -> Self {
        Self {
            r: (value >> 16) as u8,
            g: (value >> 8) as u8,
            b: value as u8,
        }
    }
}
