//! Error types for image generation.

use std::time::Duration;

/// Errors that can occur while preparing or running a generation.
#[derive(Debug, thiserror::Error)]
pub enum LuminaError {
    /// Settings rejected before any external call (empty prompt, form bounds).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A generation is already in flight for this session.
    #[error("a generation is already in progress")]
    Busy,

    /// API key missing or invalid.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Billing is not enabled or the quota is exhausted.
    #[error("billing error: {0}")]
    Billing(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Rate limit exceeded.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    /// Content was blocked by safety filters.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// The response parsed but did not have the expected shape.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Failed to decode base64 data.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// I/O error (e.g., reading a reference image or saving a result).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LuminaError {
    /// Returns true if the error was raised locally, before any external call.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidRequest(_))
    }

    /// Returns true if the error came from the image-generation service.
    pub fn is_external(&self) -> bool {
        matches!(
            self,
            Self::Auth(_)
                | Self::Billing(_)
                | Self::Api { .. }
                | Self::RateLimited { .. }
                | Self::ContentBlocked(_)
                | Self::UnexpectedResponse(_)
                | Self::Network(_)
                | Self::Json(_)
        )
    }
}

/// Result type alias for generation operations.
pub type Result<T> = std::result::Result<T, LuminaError>;

/// Maximum length of a service error message kept in an error value.
const MAX_ERROR_MESSAGE_LEN: usize = 500;

/// Reads the `Retry-After` header as whole seconds.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Turns a raw error body into a message fit for display.
///
/// Google APIs wrap errors as `{"error": {"message": ...}}`; the inner message
/// is preferred when present. API keys echoed back in the body are redacted and
/// the result is truncated.
pub(crate) fn sanitize_error_message(body: &str) -> String {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string());

    let redacted = message
        .split(' ')
        .map(|word| {
            if word.starts_with("AIza") || word.contains("key=") {
                "[REDACTED]"
            } else {
                word
            }
        })
        .collect::<Vec<_>>()
        .join(" ");

    if redacted.chars().count() > MAX_ERROR_MESSAGE_LEN {
        let truncated: String = redacted.chars().take(MAX_ERROR_MESSAGE_LEN).collect();
        format!("{truncated}...")
    } else {
        redacted
    }
}
