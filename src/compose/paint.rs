//! Colors, alpha blending and the shadow blur.

use crate::error::PinProError;
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An opaque sRGB color, written as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(0xff, 0xff, 0xff);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_rgba(self, alpha: u8) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, alpha])
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl FromStr for Color {
    type Err = PinProError;

    /// Parses `#rgb` or `#rrggbb` (the `#` is optional).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PinProError::InvalidRequest(format!("invalid color: {s}"));
        let hex = s.trim().trim_start_matches('#');
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16);
        match hex.len() {
            3 => {
                let expand = |i: usize| channel(i..i + 1).map(|v| v * 17);
                Ok(Self::rgb(
                    expand(0).map_err(|_| invalid())?,
                    expand(1).map_err(|_| invalid())?,
                    expand(2).map_err(|_| invalid())?,
                ))
            }
            6 => Ok(Self::rgb(
                channel(0..2).map_err(|_| invalid())?,
                channel(2..4).map_err(|_| invalid())?,
                channel(4..6).map_err(|_| invalid())?,
            )),
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = PinProError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Paints `color` over the pixel at `coverage` (0.0..=1.0) opacity.
///
/// Straight-alpha source-over; a transparent destination takes the source
/// color unchanged.
pub fn blend_pixel(dst: &mut Rgba<u8>, color: Color, coverage: f32) {
    let sa = coverage.clamp(0.0, 1.0);
    if sa <= 0.0 {
        return;
    }
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return;
    }
    let src = [color.r, color.g, color.b];
    for (i, &sc) in src.iter().enumerate() {
        let mixed = (sc as f32 * sa + dst[i] as f32 * da * (1.0 - sa)) / out_a;
        dst[i] = mixed.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}

/// Paints `color` through a full-surface coverage mask scaled by `opacity`.
pub fn fill_mask(surface: &mut RgbaImage, mask: &[f32], color: Color, opacity: f32) {
    let width = surface.width() as usize;
    for (x, y, pixel) in surface.enumerate_pixels_mut() {
        let coverage = mask[y as usize * width + x as usize] * opacity;
        blend_pixel(pixel, color, coverage);
    }
}

/// Gaussian blur of a coverage mask.
///
/// `blur` follows the 2D-canvas `shadowBlur` convention: sigma is half of
/// it. Samples outside the mask count as empty.
pub fn blur_mask(mask: &[f32], width: u32, height: u32, blur: f32) -> Vec<f32> {
    let sigma = blur / 2.0;
    if sigma <= 0.0 || mask.is_empty() {
        return mask.to_vec();
    }
    let kernel = gaussian_kernel(sigma);
    let radius = (kernel.len() / 2) as i64;
    let (w, h) = (width as i64, height as i64);

    let mut tmp = vec![0.0f32; mask.len()];
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0f32;
            for (k, weight) in kernel.iter().enumerate() {
                let sx = x + k as i64 - radius;
                if (0..w).contains(&sx) {
                    acc += mask[(y * w + sx) as usize] * weight;
                }
            }
            tmp[(y * w + x) as usize] = acc;
        }
    }

    let mut out = vec![0.0f32; mask.len()];
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0f32;
            for (k, weight) in kernel.iter().enumerate() {
                let sy = y + k as i64 - radius;
                if (0..h).contains(&sy) {
                    acc += tmp[(sy * w + x) as usize] * weight;
                }
            }
            out[(y * w + x) as usize] = acc.min(1.0);
        }
    }
    out
}

fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    let radius = (sigma * 3.0).ceil() as i32;
    let denom = 2.0 * sigma * sigma;
    let weights: Vec<f32> = (-radius..=radius)
        .map(|i| (-((i * i) as f32) / denom).exp())
        .collect();
    let sum: f32 = weights.iter().sum();
    weights.into_iter().map(|w| w / sum).collect()
}
