//! Colors for points, clusters and the background.
//!
//! Colors are kept in the same form a 2D canvas uses: 8-bit red, green and
//! blue channels with a floating-point alpha in `0.0..=1.0`. They serialize as
//! CSS strings (`rgba(190, 160, 240, 0.75)`) so configuration files stay
//! readable.
//!
//! # Example
//!
//! ```ignore
//! use clusterglow::color::Rgba;
//!
//! let lilac: Rgba = "rgba(190, 160, 240, 0.75)".parse()?;
//! let white = Rgba::new(255, 255, 255, 0.5);
//! let halfway = lilac.blend(white, 0.5);
//! ```

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ColorParseError;

/// An RGBA color with 8-bit channels and a fractional alpha.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::new(255, 255, 255, 1.0);
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0.0);

    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Same color with a different alpha.
    #[inline]
    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Linear blend towards `other`.
    ///
    /// Color channels are rounded to the nearest integer; alpha is not.
    /// `ratio` is used as given, so callers clamp it when they need to.
    pub fn blend(self, other: Rgba, ratio: f32) -> Rgba {
        let channel = |from: u8, to: u8| {
            let v = from as f32 + (to as f32 - from as f32) * ratio;
            v.round().clamp(0.0, 255.0) as u8
        };
        Rgba {
            r: channel(self.r, other.r),
            g: channel(self.g, other.g),
            b: channel(self.b, other.b),
            a: self.a + (other.a - self.a) * ratio,
        }
    }

    /// Channels as normalized floats, alpha clamped to `0.0..=1.0`.
    pub fn to_f32(self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a.clamp(0.0, 1.0),
        ]
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Rgba::WHITE
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

impl FromStr for Rgba {
    type Err = ColorParseError;

    /// Parse `rgb(r, g, b)`, `rgba(r, g, b, a)`, `#rgb` or `#rrggbb`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let err = || ColorParseError(s.to_string());

        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(err);
        }

        let body = s
            .strip_prefix("rgba(")
            .or_else(|| s.strip_prefix("rgb("))
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(err)?;

        let parts: Vec<&str> = body.split(',').map(str::trim).collect();
        if parts.len() != 3 && parts.len() != 4 {
            return Err(err());
        }

        let channel = |p: &str| p.parse::<u8>().map_err(|_| err());
        let a = match parts.get(3) {
            Some(p) => p.parse::<f32>().map_err(|_| err())?,
            None => 1.0,
        };
        if !(0.0..=1.0).contains(&a) {
            return Err(err());
        }

        Ok(Rgba::new(channel(parts[0])?, channel(parts[1])?, channel(parts[2])?, a))
    }
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    let digit = |i: usize| u8::from_str_radix(hex.get(i..i + 1)?, 16).ok();
    match hex.len() {
        3 => Some(Rgba::new(digit(0)? * 17, digit(1)? * 17, digit(2)? * 17, 1.0)),
        6 => {
            let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
            Some(Rgba::new(byte(0)?, byte(2)?, byte(4)?, 1.0))
        }
        _ => None,
    }
}

impl TryFrom<String> for Rgba {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgba> for String {
    fn from(c: Rgba) -> Self {
        c.to_string()
    }
}

/// The fixed set of colors clusters cycle through.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterPalette {
    colors: Vec<Rgba>,
}

impl ClusterPalette {
    pub fn new(colors: Vec<Rgba>) -> Self {
        Self { colors }
    }

    pub fn colors(&self) -> &[Rgba] {
        &self.colors
    }

    /// Number of distinct colors in the palette.
    pub fn distinct(&self) -> usize {
        let mut seen: Vec<Rgba> = Vec::with_capacity(self.colors.len());
        for c in &self.colors {
            if !seen.contains(c) {
                seen.push(*c);
            }
        }
        seen.len()
    }

    /// Any palette color.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Rgba {
        match self.colors.len() {
            0 => Rgba::WHITE,
            n => self.colors[rng.gen_range(0..n)],
        }
    }

    /// A palette color that differs from `current`.
    ///
    /// Falls back to `current` only when the palette has nothing else to offer.
    pub fn pick_other<R: Rng + ?Sized>(&self, current: Rgba, rng: &mut R) -> Rgba {
        let candidates: Vec<Rgba> = self.colors.iter().copied().filter(|c| *c != current).collect();
        if candidates.is_empty() {
            return current;
        }
        candidates[rng.gen_range(0..candidates.len())]
    }
}

impl Default for ClusterPalette {
    fn default() -> Self {
        Self::new(vec![
            Rgba::new(190, 160, 240, 0.75), // Lilac
            Rgba::new(255, 180, 220, 0.75), // Pink
            Rgba::new(140, 230, 210, 0.75), // Mint
            Rgba::new(255, 190, 150, 0.75), // Peach
            Rgba::new(170, 215, 255, 0.75), // Sky
            Rgba::new(240, 240, 160, 0.75), // Butter
            Rgba::new(160, 240, 160, 0.75), // Green
        ])
    }
}
