use serde::{Deserialize, Serialize};
use std::fmt;

/// An RGBA stroke color with 8-bit channels and a fractional alpha.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// Opacity in `[0, 1]`
    pub a: f32,
}

impl Rgba {
    /// Translucent white, the default stroke color.
    pub const TRANSLUCENT_WHITE: Rgba = Rgba::new(255, 255, 255, 0.5);

    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 1.0)
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::TRANSLUCENT_WHITE
    }
}

/// CSS `rgba()` notation, handy for canvas-style renderers.
impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}
