//! Colors and the categorical palette used by nominal color scales.

use crate::error::{Error, Result};

/// Default qualitative palette for nominal color scales.
pub const DEEP: [Rgba; 10] = [
    Rgba::rgb(0x4C, 0x72, 0xB0),
    Rgba::rgb(0xDD, 0x84, 0x52),
    Rgba::rgb(0x55, 0xA8, 0x68),
    Rgba::rgb(0xC4, 0x4E, 0x52),
    Rgba::rgb(0x81, 0x72, 0xB3),
    Rgba::rgb(0x93, 0x78, 0x60),
    Rgba::rgb(0xDA, 0x8B, 0xC3),
    Rgba::rgb(0x8C, 0x8C, 0x8C),
    Rgba::rgb(0xCC, 0xB9, 0x74),
    Rgba::rgb(0x64, 0xB5, 0xCD),
];

/// `n` distinguishable colors.
///
/// The first colors of [`DEEP`] when it is long enough, otherwise `n`
/// evenly spaced hues at fixed lightness and saturation.
#[must_use]
pub fn palette(n: usize) -> Vec<Rgba> {
    if n <= DEEP.len() {
        return DEEP[..n].to_vec();
    }
    (0..n).map(|i| from_hls(i as f32 / n as f32, 0.6, 0.65)).collect()
}

/// HLS to opaque RGB, with hue as a fraction of the color wheel.
fn from_hls(hue: f32, lightness: f32, saturation: f32) -> Rgba {
    let chroma = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let sector = hue.rem_euclid(1.0) * 6.0;
    let second = chroma * (1.0 - (sector % 2.0 - 1.0).abs());
    let (r, g, b) = match sector as u32 {
        0 => (chroma, second, 0.0),
        1 => (second, chroma, 0.0),
        2 => (0.0, chroma, second),
        3 => (0.0, second, chroma),
        4 => (second, 0.0, chroma),
        _ => (chroma, 0.0, second),
    };
    let m = lightness - chroma / 2.0;
    let byte = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgba::rgb(byte(r), byte(g), byte(b))
}

/// 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgba {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Opacity, 255 is opaque.
    pub a: u8,
}

impl Rgba {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    /// Opaque red.
    pub const RED: Self = Self::rgb(255, 0, 0);
    /// Opaque green.
    pub const GREEN: Self = Self::rgb(0, 255, 0);
    /// Opaque blue.
    pub const BLUE: Self = Self::rgb(0, 0, 255);

    /// Color from all four channels.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Same color at opacity `a`.
    #[must_use]
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Channels in `[r, g, b, a]` order, as stored in a framebuffer.
    #[must_use]
    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Inverse of [`Rgba::to_array`].
    #[must_use]
    pub const fn from_array([r, g, b, a]: [u8; 4]) -> Self {
        Self::new(r, g, b, a)
    }

    /// Parse `#RRGGBB` or `#RRGGBBAA`; the leading `#` is optional.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidColor`] for any other shape or a non-hex digit.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if !matches!(digits.len(), 6 | 8) || !digits.is_ascii() {
            return Err(Error::InvalidColor(hex.to_string()));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| Error::InvalidColor(hex.to_string()))
        };
        let a = if digits.len() == 8 { channel(6)? } else { 255 };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?, a))
    }

    /// Channel-wise mix, `t` clamped to `[0, 1]`.
    #[must_use]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (f32::from(a) + (f32::from(b) - f32::from(a)) * t).round() as u8;
        Self::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b), mix(self.a, other.a))
    }
}
