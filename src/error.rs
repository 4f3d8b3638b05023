//! Error types for video generation.

use std::time::Duration;

/// Failures that originate at a vendor boundary.
///
/// These are surfaced as-is; nothing in this crate retries them.
#[derive(Debug, thiserror::Error)]
pub enum VendorError {
    /// Transport failure talking to the vendor.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Vendor answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// A Replicate prediction finished as `failed` or `canceled`.
    #[error("prediction failed: {0}")]
    Prediction(String),

    /// A Google long-running operation finished with an error.
    #[error("operation failed: {0}")]
    Operation(String),

    /// Output was withheld by the vendor's safety filters.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// Response body did not have the expected shape.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Inline payload could not be decoded.
    #[error("failed to decode: {0}")]
    Decode(String),
}

/// Errors that can occur while resolving a client or generating a video.
#[derive(Debug, thiserror::Error)]
pub enum VideoGenError {
    /// Provider identifier is unknown or not wired for video generation.
    #[error(
        "provider '{provider}' is not supported for video generation (supported: {})",
        .supported.join(", ")
    )]
    UnsupportedProvider {
        provider: String,
        supported: Vec<String>,
    },

    /// A required secret is missing for the selected provider.
    #[error("missing credentials: {0}")]
    Credential(String),

    /// Malformed caller input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Failure from the vendor SDK or network.
    #[error(transparent)]
    Vendor(#[from] VendorError),

    /// Polling exceeded the configured bound.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// The blocking worker panicked or was cancelled.
    #[error("worker failed: {0}")]
    Worker(String),

    /// I/O error (temporary files, saving artifacts).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for VideoGenError {
    fn from(err: reqwest::Error) -> Self {
        Self::Vendor(VendorError::Http(err))
    }
}

impl From<tokio::task::JoinError> for VideoGenError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Worker(err.to_string())
    }
}

impl VideoGenError {
    /// Returns the vendor error, if this failure came from a vendor call.
    pub fn as_vendor(&self) -> Option<&VendorError> {
        match self {
            Self::Vendor(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type alias for video generation operations.
pub type Result<T> = std::result::Result<T, VideoGenError>;

/// Truncates an error body so huge HTML error pages don't end up in messages.
pub(crate) fn truncate_body(text: &str) -> String {
    const MAX: usize = 512;
    let trimmed = text.trim();
    if trimmed.len() <= MAX {
        return trimmed.to_string();
    }
    let mut end = MAX;
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &trimmed[..end])
}
