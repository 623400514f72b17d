//! Color value types.
//!
//! [`ColorI`] stores 8-bit channels, [`ColorF`] stores floating point
//! channels. Both default to opaque white.

use std::fmt;
use std::str::FromStr;

use glam::Vec4;
use serde::{Deserialize, Serialize};

use crate::text::{MathParseError, parse_components};

/// An 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColorI {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl ColorI {
    /// Opaque white.
    pub const WHITE: Self = Self::new(255, 255, 255, 255);

    /// Opaque black.
    pub const BLACK: Self = Self::new(0, 0, 0, 255);

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Channels in RGBA order.
    #[must_use]
    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    #[must_use]
    pub const fn from_array([r, g, b, a]: [u8; 4]) -> Self {
        Self::new(r, g, b, a)
    }
}

impl Default for ColorI {
    fn default() -> Self {
        Self::WHITE
    }
}

impl fmt::Display for ColorI {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.r, self.g, self.b, self.a)
    }
}

impl FromStr for ColorI {
    type Err = MathParseError;

    /// Accepts `"r g b"` (alpha defaults to 255) or `"r g b a"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.split_whitespace().count() == 3 {
            let [r, g, b] = parse_components::<u8, 3>(s)?;
            return Ok(Self::new(r, g, b, 255));
        }
        Ok(Self::from_array(parse_components::<u8, 4>(s)?))
    }
}

impl From<ColorF> for ColorI {
    fn from(c: ColorF) -> Self {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::new(q(c.r), q(c.g), q(c.b), q(c.a))
    }
}

/// A floating point RGBA color. Channels are nominally in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorF {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl ColorF {
    /// Opaque white.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);

    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// The color as a `Vec4` in RGBA order.
    #[must_use]
    pub fn to_vec4(self) -> Vec4 {
        Vec4::new(self.r, self.g, self.b, self.a)
    }

    #[must_use]
    pub fn from_vec4(v: Vec4) -> Self {
        Self::new(v.x, v.y, v.z, v.w)
    }
}

impl Default for ColorF {
    fn default() -> Self {
        Self::WHITE
    }
}

impl fmt::Display for ColorF {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.r, self.g, self.b, self.a)
    }
}

impl FromStr for ColorF {
    type Err = MathParseError;

    /// Accepts `"r g b"` (alpha defaults to 1) or `"r g b a"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.split_whitespace().count() == 3 {
            let [r, g, b] = parse_components::<f32, 3>(s)?;
            return Ok(Self::new(r, g, b, 1.0));
        }
        let [r, g, b, a] = parse_components::<f32, 4>(s)?;
        Ok(Self::new(r, g, b, a))
    }
}

impl From<ColorI> for ColorF {
    fn from(c: ColorI) -> Self {
        let n = |v: u8| f32::from(v) / 255.0;
        Self::new(n(c.r), n(c.g), n(c.b), n(c.a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_i_text_roundtrip() {
        let c: ColorI = "255 128 0 64".parse().unwrap();
        assert_eq!(c, ColorI::new(255, 128, 0, 64));
        assert_eq!(c.to_string(), "255 128 0 64");
    }

    #[test]
    fn test_color_i_alpha_defaults_opaque() {
        let c: ColorI = "10 20 30".parse().unwrap();
        assert_eq!(c.a, 255);
    }

    #[test]
    fn test_color_i_rejects_out_of_range() {
        assert!("256 0 0 0".parse::<ColorI>().is_err());
    }

    #[test]
    fn test_color_f_text() {
        let c: ColorF = "1 0.5 0 1".parse().unwrap();
        assert_eq!(c, ColorF::new(1.0, 0.5, 0.0, 1.0));
        assert_eq!(c.to_string(), "1 0.5 0 1");
    }

    #[test]
    fn test_color_conversion() {
        let c = ColorI::from(ColorF::new(1.0, 0.0, 0.5, 1.0));
        assert_eq!(c, ColorI::new(255, 0, 128, 255));
        assert_eq!(ColorF::from(ColorI::BLACK), ColorF::new(0.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn test_color_serialization_roundtrip() {
        let c = ColorF::new(0.25, 0.5, 0.75, 1.0);
        let bytes = rmp_serde::to_vec(&c).unwrap();
        let restored: ColorF = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(c, restored);
    }
}
