//! Requests sent to image providers and the images they return.

use crate::catalog::{CreativeStyle, ImageQuality, Resolution};
use crate::error::{PinProError, Result};
use serde::{Deserialize, Serialize};

/// Encoding of the bytes a provider returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg,
    WebP,
}

impl ImageFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }

    /// Trusts the reported MIME type, then sniffs the payload, then falls
    /// back to PNG.
    pub fn detect(reported_mime: &str, data: &[u8]) -> Self {
        Self::from_mime_type(reported_mime)
            .or_else(|| Self::sniff(data))
            .unwrap_or_default()
    }

    fn from_mime_type(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebP),
            _ => None,
        }
    }

    fn sniff(data: &[u8]) -> Option<Self> {
        const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";
        match data {
            d if d.starts_with(PNG_SIGNATURE) => Some(Self::Png),
            [0xFF, 0xD8, 0xFF, ..] => Some(Self::Jpeg),
            d if d.len() >= 12 && d.starts_with(b"RIFF") && &d[8..12] == b"WEBP" => {
                Some(Self::WebP)
            }
            _ => None,
        }
    }
}

/// Metadata about the generation call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationMetadata {
    /// Model used for generation.
    pub model: Option<String>,
    /// Generation duration in milliseconds.
    pub duration_ms: Option<u64>,
}

/// A request to generate a pin's base image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The user's raw prompt.
    pub prompt: String,
    /// Canvas preset; its aspect ratio is sent to the provider.
    pub resolution: Resolution,
    /// Creative style whose suffix is appended to the prompt.
    pub style: CreativeStyle,
    /// Quality tier selecting the backing model.
    pub quality: ImageQuality,
}

impl GenerationRequest {
    /// Creates a request with default presets.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            resolution: Resolution::default(),
            style: CreativeStyle::default(),
            quality: ImageQuality::default(),
        }
    }

    /// Sets the canvas preset.
    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    /// Sets the creative style.
    pub fn with_style(mut self, style: CreativeStyle) -> Self {
        self.style = style;
        self
    }

    /// Sets the quality tier.
    pub fn with_quality(mut self, quality: ImageQuality) -> Self {
        self.quality = quality;
        self
    }

    /// The prompt actually sent to the provider.
    pub fn full_prompt(&self) -> String {
        format!(
            "{}. Style: {}. Pinterest aesthetic, professional quality.",
            self.prompt,
            self.style.prompt_suffix()
        )
    }

    /// Rejects requests that must never reach a provider.
    pub fn validate(&self) -> Result<()> {
        if self.prompt.trim().is_empty() {
            return Err(PinProError::InvalidRequest("prompt must not be empty".into()));
        }
        Ok(())
    }
}

/// Base image bytes exactly as the provider returned them.
#[derive(Debug, Clone)]
#[must_use = "generated image should be composed or saved"]
pub struct GeneratedImage {
    pub data: Vec<u8>,
    pub format: ImageFormat,
    pub metadata: GenerationMetadata,
}

impl GeneratedImage {
    pub fn new(data: Vec<u8>, format: ImageFormat, metadata: GenerationMetadata) -> Self {
        Self {
            data,
            format,
            metadata,
        }
    }

    /// Payload size in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_prefers_reported_mime() {
        let png = b"\x89PNG\r\n\x1a\n\0\0\0\0";
        assert_eq!(ImageFormat::detect("image/jpeg", png), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::detect(" IMAGE/WEBP ", png), ImageFormat::WebP);
    }

    #[test]
    fn test_detect_sniffs_unknown_mime() {
        assert_eq!(
            ImageFormat::detect("", b"\x89PNG\r\n\x1a\n\0\0\0\0"),
            ImageFormat::Png
        );
        assert_eq!(
            ImageFormat::detect("application/octet-stream", &[0xFF, 0xD8, 0xFF, 0xE0]),
            ImageFormat::Jpeg
        );
        assert_eq!(
            ImageFormat::detect("", b"RIFF\0\0\0\0WEBPVP8 "),
            ImageFormat::WebP
        );
        assert_eq!(ImageFormat::detect("", b"RIFF"), ImageFormat::Png);
        assert_eq!(ImageFormat::detect("", b""), ImageFormat::Png);
    }

    #[test]
    fn test_full_prompt() {
        let req = GenerationRequest::new("A cozy reading nook").with_style(CreativeStyle::NeonCyber);
        assert_eq!(
            req.full_prompt(),
            "A cozy reading nook. Style: neon glow, futuristic city vibes, synthwave aesthetic, \
             cyan and magenta lighting. Pinterest aesthetic, professional quality."
        );
    }

    #[test]
    fn test_validate_rejects_blank_prompt() {
        assert!(GenerationRequest::new("").validate().is_err());
        assert!(GenerationRequest::new("   ").validate().is_err());
        assert!(GenerationRequest::new("lanterns").validate().is_ok());
    }
}
