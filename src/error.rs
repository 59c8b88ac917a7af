//! Error types for pin generation and composition.

use std::time::Duration;

/// Errors that can occur while generating, composing or exporting a pin.
#[derive(Debug, thiserror::Error)]
pub enum PinProError {
    /// API key missing or rejected.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The provider reported the credential or model entity as not found.
    #[error("credential invalid: {0}")]
    CredentialInvalid(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Rate limit exceeded.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    /// The response carried no inline image part.
    #[error("no image returned: {0}")]
    NoImageReturned(String),

    /// Content was blocked by safety filters.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// Invalid request parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The interactive credential selection flow failed.
    #[error("key selection failed: {0}")]
    GateInteraction(String),

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Failed to decode base64 data.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// Image decoding or encoding failed.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error (e.g., saving file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration could not be loaded or is inconsistent.
    #[error("configuration error: {0}")]
    Config(String),
}

impl PinProError {
    /// Returns true if this error is likely transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::Network(_) | Self::Api { status: 500..=599, .. }
        )
    }

    /// Returns the suggested retry delay, if available.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            Self::Network(_) => Some(Duration::from_secs(2)),
            Self::Api { .. } if self.is_retryable() => Some(Duration::from_secs(1)),
            _ => None,
        }
    }
}

/// Result type alias for pin operations.
pub type Result<T> = std::result::Result<T, PinProError>;

/// Longest provider message kept in an error, in characters.
const MAX_ERROR_MESSAGE_CHARS: usize = 500;

/// Cleans a provider error body before it is shown to a user.
///
/// Pulls `error.message` out of Google-style JSON error envelopes, redacts
/// anything that looks like an API key and truncates long bodies.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let extracted = serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| text.trim().to_string());

    let redacted = extracted
        .split(' ')
        .map(|word| {
            if word.starts_with("AIza") && word.len() > 20 {
                "[REDACTED]"
            } else {
                word
            }
        })
        .collect::<Vec<_>>()
        .join(" ");

    if redacted.chars().count() > MAX_ERROR_MESSAGE_CHARS {
        let truncated: String = redacted.chars().take(MAX_ERROR_MESSAGE_CHARS).collect();
        format!("{truncated}...")
    } else {
        redacted
    }
}

/// Reads a `Retry-After` header expressed in seconds.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_retryable() {
        assert!(PinProError::RateLimited { retry_after: None }.is_retryable());
        assert!(PinProError::Api {
            status: 503,
            message: "unavailable".into()
        }
        .is_retryable());

        assert!(!PinProError::Auth("bad key".into()).is_retryable());
        assert!(!PinProError::CredentialInvalid("gone".into()).is_retryable());
        assert!(!PinProError::NoImageReturned("empty".into()).is_retryable());
        assert!(!PinProError::Api {
            status: 400,
            message: "bad".into()
        }
        .is_retryable());
    }

    #[test]
    fn test_retry_after() {
        let rate_limited = PinProError::RateLimited {
            retry_after: Some(Duration::from_secs(60)),
        };
        assert_eq!(rate_limited.retry_after(), Some(Duration::from_secs(60)));

        let rate_limited_no_hint = PinProError::RateLimited { retry_after: None };
        assert_eq!(rate_limited_no_hint.retry_after(), None);

        let auth = PinProError::Auth("bad".into());
        assert_eq!(auth.retry_after(), None);
    }

    #[test]
    fn test_error_display() {
        let err = PinProError::Api {
            status: 500,
            message: "Internal".into(),
        };
        assert_eq!(err.to_string(), "API error: 500 - Internal");

        let err = PinProError::ContentBlocked("Safety filter triggered".into());
        assert_eq!(err.to_string(), "content blocked: Safety filter triggered");
    }

    #[test]
    fn test_sanitize_extracts_google_message() {
        let body = r#"{"error":{"code":404,"message":"Requested entity was not found.","status":"NOT_FOUND"}}"#;
        assert_eq!(
            sanitize_error_message(body),
            "Requested entity was not found."
        );
    }

    #[test]
    fn test_sanitize_redacts_keys_and_truncates() {
        let msg = sanitize_error_message("key AIzaSyA1234567890abcdefghijkl rejected");
        assert_eq!(msg, "key [REDACTED] rejected");

        let long = "x".repeat(800);
        let msg = sanitize_error_message(&long);
        assert!(msg.ends_with("..."));
        assert_eq!(msg.chars().count(), MAX_ERROR_MESSAGE_CHARS + 3);
    }

    #[test]
    fn test_parse_retry_after() {
        let mut headers = reqwest::header::HeaderMap::new();
        assert_eq!(parse_retry_after(&headers), None);
        headers.insert(
            reqwest::header::RETRY_AFTER,
            reqwest::header::HeaderValue::from_static("30"),
        );
        assert_eq!(parse_retry_after(&headers), Some(30));
    }
}
