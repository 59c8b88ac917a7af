//! Prompt assistant: turns a topic into ready-to-use image prompts.

use crate::error::{PinProError, Result};
use crate::gate::KeySlot;
use crate::gemini::GeminiConnection;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Text model used by the assistant.
pub const ASSISTANT_MODEL: &str = "gemini-3-flash-preview";

/// Shown when the model answers with no text.
pub const EMPTY_RESPONSE_FALLBACK: &str = "Sorry, I couldn't generate a prompt right now.";

/// Shown when the call itself fails.
pub const ERROR_FALLBACK: &str = "An error occurred. Please try again.";

/// Lines this short (after trimming) are dropped from suggestions.
const MIN_SUGGESTION_CHARS: usize = 10;

/// Trait for text-generation backends.
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Sends a plain instruction and returns the text answer.
    async fn complete(&self, instruction: &str) -> Result<String>;

    /// Sends an instruction whose answer must be JSON matching `schema`.
    async fn complete_json(&self, instruction: &str, schema: serde_json::Value) -> Result<String>;
}

/// Builder for [`GeminiTextProvider`].
#[derive(Debug, Clone, Default)]
pub struct GeminiTextProviderBuilder {
    api_key: Option<String>,
    key_slot: Option<KeySlot>,
    base_url: Option<String>,
    timeout: Option<Duration>,
    model: Option<String>,
}

impl GeminiTextProviderBuilder {
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

    /// Overrides the text model.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Builds the provider.
    pub fn build(self) -> GeminiTextProvider {
        GeminiTextProvider {
            connection: GeminiConnection::new(
                self.base_url,
                self.api_key,
                self.key_slot,
                self.timeout,
            ),
            model: self.model.unwrap_or_else(|| ASSISTANT_MODEL.to_string()),
        }
    }
}

/// Gemini text generation.
#[derive(Debug, Clone)]
pub struct GeminiTextProvider {
    connection: GeminiConnection,
    model: String,
}

impl GeminiTextProvider {
    /// Creates a new builder.
    pub fn builder() -> GeminiTextProviderBuilder {
        GeminiTextProviderBuilder::default()
    }

    async fn send(&self, body: &TextRequest) -> Result<String> {
        let text = self.connection.generate_content(&self.model, body).await?;
        let response: TextResponse = serde_json::from_str(&text)?;
        Ok(response.text())
    }
}

#[async_trait]
impl TextProvider for GeminiTextProvider {
    async fn complete(&self, instruction: &str) -> Result<String> {
        self.send(&TextRequest::plain(instruction)).await
    }

    async fn complete_json(&self, instruction: &str, schema: serde_json::Value) -> Result<String> {
        self.send(&TextRequest::json(instruction, schema)).await
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TextRequest {
    contents: Vec<TextContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<JsonConfig>,
}

#[derive(Debug, Serialize)]
struct TextContent {
    parts: Vec<TextPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TextPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonConfig {
    response_mime_type: &'static str,
    response_schema: serde_json::Value,
}

impl TextRequest {
    fn plain(instruction: &str) -> Self {
        Self {
            contents: vec![TextContent {
                parts: vec![TextPart {
                    text: Some(instruction.to_string()),
                }],
            }],
            generation_config: None,
        }
    }

    fn json(instruction: &str, schema: serde_json::Value) -> Self {
        Self {
            generation_config: Some(JsonConfig {
                response_mime_type: "application/json",
                response_schema: schema,
            }),
            ..Self::plain(instruction)
        }
    }
}

#[derive(Debug, Deserialize)]
struct TextResponse {
    #[serde(default)]
    candidates: Vec<TextCandidate>,
}

#[derive(Debug, Deserialize)]
struct TextCandidate {
    #[serde(default)]
    content: Option<TextCandidateContent>,
}

#[derive(Debug, Deserialize)]
struct TextCandidateContent {
    #[serde(default)]
    parts: Vec<TextPart>,
}

impl TextResponse {
    /// Concatenated text of the first candidate.
    fn text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

/// One marketing idea for a pin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinMarketingIdea {
    /// Viral headline, usable as overlay text.
    pub headline: String,
    /// Pin description.
    pub description: String,
    /// Matching background color, `#rrggbb`.
    pub hex_color: String,
}

/// Wraps a [`TextProvider`] with the pin-specific instructions.
pub struct PromptAssistant<T> {
    provider: T,
}

impl<T: TextProvider> PromptAssistant<T> {
    /// Creates an assistant on top of `provider`.
    pub fn new(provider: T) -> Self {
        Self { provider }
    }

    /// Asks for three descriptive prompts about `topic` and returns the raw
    /// answer. Use [`parse_suggestions`] to split it.
    pub async fn suggest_prompts(&self, topic: &str) -> Result<String> {
        if topic.trim().is_empty() {
            return Err(PinProError::InvalidRequest("topic must not be empty".into()));
        }
        let instruction = format!(
            "Act as a Pinterest Marketing Expert. I will give you a topic or business idea, \
             and you will write 3 highly descriptive, aesthetic image generation prompts that I \
             can use to create a viral Pinterest Pin. The prompts should focus on lighting, mood, \
             and composition.\nTopic: {topic}"
        );
        self.provider.complete(&instruction).await
    }

    /// Like [`suggest_prompts`](Self::suggest_prompts) but never fails:
    /// errors and empty answers become a displayable message. An empty topic
    /// issues no call and yields `None`.
    pub async fn suggest_or_fallback(&self, topic: &str) -> Option<String> {
        if topic.trim().is_empty() {
            return None;
        }
        let text = match self.suggest_prompts(topic).await {
            Ok(text) if text.trim().is_empty() => EMPTY_RESPONSE_FALLBACK.to_string(),
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("prompt assistant failed: {e}");
                ERROR_FALLBACK.to_string()
            }
        };
        Some(text)
    }

    /// Asks for five headline/description/color ideas for `topic`.
    ///
    /// A malformed JSON answer yields an empty list.
    pub async fn marketing_ideas(&self, topic: &str) -> Result<Vec<PinMarketingIdea>> {
        if topic.trim().is_empty() {
            return Err(PinProError::InvalidRequest("topic must not be empty".into()));
        }
        let instruction = format!(
            "Provide 5 viral Pinterest headlines and descriptions for: {topic}. Format as JSON."
        );
        let text = self
            .provider
            .complete_json(&instruction, marketing_schema())
            .await?;
        match serde_json::from_str(&text) {
            Ok(ideas) => Ok(ideas),
            Err(e) => {
                tracing::warn!("marketing ideas were not valid JSON: {e}");
                Ok(Vec::new())
            }
        }
    }
}

fn marketing_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "headline": { "type": "STRING" },
                "description": { "type": "STRING" },
                "hexColor": {
                    "type": "STRING",
                    "description": "Matching background hex color"
                }
            },
            "required": ["headline", "description", "hexColor"]
        }
    })
}

/// Splits an assistant answer into candidate prompts.
///
/// Lines of ten characters or fewer are dropped, then a leading `"1. "`
/// style number is stripped.
pub fn parse_suggestions(text: &str) -> Vec<String> {
    text.lines()
        .filter(|line| line.trim().chars().count() > MIN_SUGGESTION_CHARS)
        .map(|line| strip_ordinal(line).to_string())
        .collect()
}

fn strip_ordinal(line: &str) -> &str {
    let digits = line.len() - line.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return line;
    }
    match line[digits..].strip_prefix('.') {
        Some(rest) => rest.trim_start(),
        None => line,
    }
}
