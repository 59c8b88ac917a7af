//! Gemini (Google) image generation provider.

use crate::catalog::ImageQuality;
use crate::error::{PinProError, Result};
use crate::gate::KeySlot;
use crate::gemini::GeminiConnection;
use crate::image::provider::ImageProvider;
use crate::image::types::{GeneratedImage, GenerationMetadata, GenerationRequest, ImageFormat};
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Shown when a response carries no image part.
pub(crate) const NO_IMAGE_MESSAGE: &str = "The AI didn't return an image. Try a different prompt.";

/// Gemini image model variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeminiModel {
    /// Gemini 2.5 Flash Image: fast, works with free keys.
    FlashImage,
    /// Gemini 3 Pro Image: higher quality, supports `imageSize`, needs a paid key.
    ProImage,
}

impl GeminiModel {
    /// Returns the API model identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FlashImage => "gemini-2.5-flash-image",
            Self::ProImage => "gemini-3-pro-image-preview",
        }
    }

    /// Picks the model backing a quality tier.
    pub fn for_quality(quality: ImageQuality) -> Self {
        match quality {
            ImageQuality::Standard => Self::FlashImage,
            ImageQuality::HighDefinition => Self::ProImage,
        }
    }

    /// Whether the model accepts the `imageSize` parameter.
    pub fn supports_image_size(&self) -> bool {
        matches!(self, Self::ProImage)
    }
}

/// Builder for GeminiProvider.
#[derive(Debug, Clone, Default)]
pub struct GeminiProviderBuilder {
    api_key: Option<String>,
    key_slot: Option<KeySlot>,
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl GeminiProviderBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to `GOOGLE_API_KEY`, then `API_KEY`.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Reads the key selected through the key gate before every call.
    pub fn key_slot(mut self, slot: KeySlot) -> Self {
        self.key_slot = Some(slot);
        self
    }

    /// Overrides the REST base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the provider.
    ///
    /// The key is not resolved here; every call resolves it afresh.
    pub fn build(self) -> GeminiProvider {
        GeminiProvider {
            connection: GeminiConnection::new(
                self.base_url,
                self.api_key,
                self.key_slot,
                self.timeout,
            ),
        }
    }
}

/// Gemini image generation provider.
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    connection: GeminiConnection,
}

impl GeminiProvider {
    /// Creates a new `GeminiProviderBuilder`.
    pub fn builder() -> GeminiProviderBuilder {
        GeminiProviderBuilder::new()
    }

    async fn generate_impl(&self, request: &GenerationRequest) -> Result<GeneratedImage> {
        request.validate()?;
        let start = Instant::now();

        let model = GeminiModel::for_quality(request.quality);
        let body = GeminiRequest::from_generation_request(request);

        tracing::debug!(
            model = model.as_str(),
            aspect_ratio = %request.resolution.spec().aspect_ratio,
            style = %request.style,
            "requesting pin image"
        );

        let text = self
            .connection
            .generate_content(model.as_str(), &body)
            .await?;
        let response: GeminiResponse = serde_json::from_str(&text)?;
        let inline_data = extract_inline_image(response)?;

        let data = base64::engine::general_purpose::STANDARD
            .decode(inline_data.data.trim())
            .map_err(|e| PinProError::Decode(e.to_string()))?;

        let format = ImageFormat::detect(&inline_data.mime_type, &data);

        let duration_ms = start.elapsed().as_millis() as u64;
        tracing::debug!(bytes = data.len(), duration_ms, "pin image received");

        Ok(GeneratedImage::new(
            data,
            format,
            GenerationMetadata {
                model: Some(model.as_str().to_string()),
                duration_ms: Some(duration_ms),
            },
        ))
    }
}

#[async_trait]
impl ImageProvider for GeminiProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedImage> {
        self.generate_impl(request).await
    }

    fn name(&self) -> &str {
        "Gemini (Google)"
    }
}

/// Picks the first inline image of the first candidate.
///
/// Parts are scanned in order; text parts before the image are skipped.
fn extract_inline_image(response: GeminiResponse) -> Result<InlineData> {
    // Prompt-level blocks arrive as HTTP 200 with no candidates.
    if let Some(feedback) = response.prompt_feedback {
        if let Some(reason) = feedback.block_reason {
            let msg = feedback
                .block_reason_message
                .unwrap_or_else(|| format!("Prompt blocked: {reason}"));
            return Err(PinProError::ContentBlocked(msg));
        }
    }

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(PinProError::NoImageReturned(NO_IMAGE_MESSAGE.into()));
    };

    if let Some(ref finish_reason) = candidate.finish_reason {
        match finish_reason.as_str() {
            "SAFETY"
            | "IMAGE_SAFETY"
            | "IMAGE_PROHIBITED_CONTENT"
            | "PROHIBITED_CONTENT"
            | "BLOCKLIST" => {
                return Err(PinProError::ContentBlocked(format!(
                    "Content blocked by Gemini safety filter: {finish_reason}"
                )));
            }
            _ => {}
        }
    }

    candidate
        .content
        .map(|content| content.parts)
        .unwrap_or_default()
        .into_iter()
        .find_map(|part| part.inline_data)
        .ok_or_else(|| PinProError::NoImageReturned(NO_IMAGE_MESSAGE.into()))
}

// Request/Response types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiTextPart>,
}

#[derive(Debug, Serialize)]
struct GeminiTextPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiConfig {
    response_modalities: Vec<String>,
    image_config: ImageConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageConfig {
    aspect_ratio: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_size: Option<&'static str>,
}

impl GeminiRequest {
    fn from_generation_request(req: &GenerationRequest) -> Self {
        let model = GeminiModel::for_quality(req.quality);
        let image_size = model.supports_image_size().then_some(req.quality.key());

        Self {
            contents: vec![GeminiContent {
                parts: vec![GeminiTextPart {
                    text: req.full_prompt(),
                }],
            }],
            generation_config: GeminiConfig {
                response_modalities: vec!["IMAGE".to_string()],
                image_config: ImageConfig {
                    aspect_ratio: req.resolution.spec().aspect_ratio.as_str(),
                    image_size,
                },
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContentResponse>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
    #[serde(default)]
    block_reason_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPartResponse {
    #[serde(default)]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    mime_type: String,
    data: String,
}
