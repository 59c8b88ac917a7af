//! Shared plumbing for the Gemini `generateContent` endpoint.
//!
//! Both the image provider and the prompt assistant talk to the same REST
//! endpoint. A fresh [`reqwest::Client`] and a freshly resolved API key are
//! produced for every call, because the key selected in the key slot can
//! change between two calls of the same session.

use crate::error::{parse_retry_after, sanitize_error_message, PinProError, Result};
use crate::gate::KeySlot;
use std::time::Duration;

/// Default Gemini REST base URL.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Environment variables consulted, in order, when no key is configured.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GOOGLE_API_KEY", "API_KEY"];

/// Substring the provider uses when a key or model entity does not exist.
const ENTITY_NOT_FOUND: &str = "Requested entity was not found";

/// Connection settings shared by the Gemini-backed providers.
#[derive(Debug, Clone)]
pub(crate) struct GeminiConnection {
    base_url: String,
    api_key: Option<String>,
    key_slot: Option<KeySlot>,
    timeout: Duration,
}

impl GeminiConnection {
    pub(crate) fn new(
        base_url: Option<String>,
        api_key: Option<String>,
        key_slot: Option<KeySlot>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_key,
            key_slot,
            timeout: timeout.unwrap_or(DEFAULT_TIMEOUT),
        }
    }

    /// Resolves the key to use for the next call.
    ///
    /// Order: a key selected through the key slot, the explicitly configured
    /// key, then the environment.
    pub(crate) fn resolve_key(&self) -> Result<String> {
        self.key_slot
            .as_ref()
            .and_then(KeySlot::get)
            .or_else(|| self.api_key.clone())
            .or_else(|| {
                API_KEY_ENV_VARS
                    .iter()
                    .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()))
            })
            .ok_or_else(|| {
                PinProError::Auth("GOOGLE_API_KEY not set and no API key provided".into())
            })
    }

    pub(crate) fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }

    /// Posts a `generateContent` body and returns the successful response text.
    pub(crate) async fn generate_content<B: serde::Serialize + ?Sized>(
        &self,
        model: &str,
        body: &B,
    ) -> Result<String> {
        let api_key = self.resolve_key()?;
        let client = reqwest::Client::builder().timeout(self.timeout).build()?;
        let url = self.endpoint(model);

        tracing::debug!(model, "calling Gemini generateContent");

        let response = client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            return Err(parse_error(status.as_u16(), &text, &headers));
        }

        Ok(response.text().await?)
    }
}

/// Maps a non-success HTTP response onto the error taxonomy.
pub(crate) fn parse_error(
    status: u16,
    text: &str,
    headers: &reqwest::header::HeaderMap,
) -> PinProError {
    let text = sanitize_error_message(text);
    if status == 404 || text.contains(ENTITY_NOT_FOUND) {
        return PinProError::CredentialInvalid(text);
    }
    if status == 429 {
        let retry_after = parse_retry_after(headers).map(Duration::from_secs);
        return PinProError::RateLimited { retry_after };
    }
    if status == 401 || status == 403 {
        return PinProError::Auth(text);
    }
    let lower = text.to_lowercase();
    if lower.contains("safety") || lower.contains("blocked") || lower.contains("prohibited") {
        return PinProError::ContentBlocked(text);
    }
    PinProError::Api {
        status,
        message: text,
    }
}
