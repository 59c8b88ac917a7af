//! Static preset tables: canvas resolutions, creative styles and quality tiers.

use crate::error::PinProError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Aspect ratios the pin canvases are rendered at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    /// 3:4 standard portrait pin.
    #[serde(rename = "3:4")]
    StandardPortrait,
    /// 1:1 square.
    #[serde(rename = "1:1")]
    Square,
    /// 9:16 story/idea pin.
    #[serde(rename = "9:16")]
    Portrait,
}

impl AspectRatio {
    /// Returns the aspect ratio as a string (e.g., "9:16").
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StandardPortrait => "3:4",
            Self::Square => "1:1",
            Self::Portrait => "9:16",
        }
    }

    /// Width divided by height.
    pub fn ratio(&self) -> f64 {
        match self {
            Self::StandardPortrait => 3.0 / 4.0,
            Self::Square => 1.0,
            Self::Portrait => 9.0 / 16.0,
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pixel dimensions of a canvas preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolutionSpec {
    /// Surface width in pixels.
    pub width: u32,
    /// Surface height in pixels.
    pub height: u32,
    /// Ratio label passed to the image provider.
    pub aspect_ratio: AspectRatio,
}

/// Canvas resolution presets, keyed by the nominal export size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resolution {
    /// Classic 2:3-ish Pinterest pin, previewed at 3:4.
    #[default]
    #[serde(rename = "1000x1500")]
    Pin1000x1500,
    /// Square pin.
    #[serde(rename = "1000x1000")]
    Square1000x1000,
    /// Full-screen story pin.
    #[serde(rename = "1080x1920")]
    Story1080x1920,
}

impl Resolution {
    /// Every preset, in display order.
    pub const ALL: [Resolution; 3] = [
        Resolution::Pin1000x1500,
        Resolution::Square1000x1000,
        Resolution::Story1080x1920,
    ];

    /// Returns the render dimensions for this preset.
    pub const fn spec(self) -> ResolutionSpec {
        match self {
            Self::Pin1000x1500 => ResolutionSpec {
                width: 450,
                height: 600,
                aspect_ratio: AspectRatio::StandardPortrait,
            },
            Self::Square1000x1000 => ResolutionSpec {
                width: 400,
                height: 400,
                aspect_ratio: AspectRatio::Square,
            },
            Self::Story1080x1920 => ResolutionSpec {
                width: 337,
                height: 600,
                aspect_ratio: AspectRatio::Portrait,
            },
        }
    }

    /// The preset key, e.g. `"1000x1500"`.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Pin1000x1500 => "1000x1500",
            Self::Square1000x1000 => "1000x1000",
            Self::Story1080x1920 => "1080x1920",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Resolution {
    type Err = PinProError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.key() == s)
            .ok_or_else(|| PinProError::InvalidRequest(format!("unknown resolution: {s}")))
    }
}

/// Creative style presets appended to the user's prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreativeStyle {
    #[default]
    Photographic,
    Cinematic,
    DigitalArt,
    #[serde(rename = "3d_render")]
    Render3d,
    NeonCyber,
    MinimalistVector,
}

impl CreativeStyle {
    /// Every preset, in display order.
    pub const ALL: [CreativeStyle; 6] = [
        CreativeStyle::Photographic,
        CreativeStyle::Cinematic,
        CreativeStyle::DigitalArt,
        CreativeStyle::Render3d,
        CreativeStyle::NeonCyber,
        CreativeStyle::MinimalistVector,
    ];

    /// The preset key, e.g. `"digital_art"`.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Photographic => "photographic",
            Self::Cinematic => "cinematic",
            Self::DigitalArt => "digital_art",
            Self::Render3d => "3d_render",
            Self::NeonCyber => "neon_cyber",
            Self::MinimalistVector => "minimalist_vector",
        }
    }

    /// Human readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Photographic => "Photorealistic",
            Self::Cinematic => "Cinematic",
            Self::DigitalArt => "Digital Art",
            Self::Render3d => "3D Render",
            Self::NeonCyber => "Neon/Cyberpunk",
            Self::MinimalistVector => "Minimalist",
        }
    }

    /// Text appended after `Style:` in the outbound prompt.
    pub fn prompt_suffix(&self) -> &'static str {
        match self {
            Self::Photographic => "high-end photography, 8k resolution, highly detailed, realistic textures, natural lighting, professional camera",
            Self::Cinematic => "cinematic lighting, dramatic shadows, movie still quality, moody, anamorphic, sharp focus",
            Self::DigitalArt => "vibrant digital illustration, detailed artstation style, smooth gradients, imaginative",
            Self::Render3d => "unreal engine 5, octane render, stylized 3d, soft shadows, clay-like smooth texture, playful",
            Self::NeonCyber => "neon glow, futuristic city vibes, synthwave aesthetic, cyan and magenta lighting",
            Self::MinimalistVector => "flat vector illustration, bold graphic design, clean lines, minimalist, solid colors, modern branding",
        }
    }
}

impl fmt::Display for CreativeStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for CreativeStyle {
    type Err = PinProError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|style| style.key() == s)
            .ok_or_else(|| PinProError::InvalidRequest(format!("unknown style: {s}")))
    }
}

/// Output quality tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageQuality {
    /// 1K output from the fast model. Works with any key.
    #[default]
    #[serde(rename = "1K")]
    Standard,
    /// 2K output from the pro model. Needs a paid key.
    #[serde(rename = "2K")]
    HighDefinition,
}

impl ImageQuality {
    /// The tier key, `"1K"` or `"2K"`.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Standard => "1K",
            Self::HighDefinition => "2K",
        }
    }

    /// Whether this tier needs a premium credential.
    pub fn is_premium(&self) -> bool {
        matches!(self, Self::HighDefinition)
    }
}

impl fmt::Display for ImageQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ImageQuality {
    type Err = PinProError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "1K" | "STANDARD" => Ok(Self::Standard),
            "2K" | "HD" | "HIGH_DEFINITION" => Ok(Self::HighDefinition),
            _ => Err(PinProError::InvalidRequest(format!("unknown quality: {s}"))),
        }
    }
}
