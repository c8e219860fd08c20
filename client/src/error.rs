//! Error taxonomy for tenant API calls.

use reqwest::StatusCode;

/// Failure of a single tenant API operation, reported after the retry
/// policy has already run its course.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Transport-level failure (connect, timeout) that survived retries.
    #[error("request failed after {attempts} attempts: {source}")]
    Transport {
        attempts: u32,
        source: reqwest::Error,
    },

    /// Non-success HTTP status. A 5xx here means retries were exhausted;
    /// a 4xx was never retried.
    #[error("API error {status}: {body}")]
    Http { status: StatusCode, body: String },

    /// The response arrived but did not decode into the documented shape.
    #[error("malformed response from {context}: {detail}")]
    Malformed {
        context: &'static str,
        detail: String,
    },
}

impl ApiError {
    /// Transient errors may succeed on a later run; permanent ones will not.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Http { status, .. } => {
                status.is_server_error() || matches!(status.as_u16(), 408 | 429)
            }
            Self::Malformed { .. } => false,
        }
    }
}

/// Failure to construct a [`crate::RestClient`].
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("base URL must include a host")]
    MissingHost,
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}
