//! API Error Types

use thiserror::Error;

/// Errors returned by the Volley API client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure (connect, timeout, TLS).
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body did not match the expected shape.
    #[error("invalid response from API: {0}")]
    Decode(#[from] serde_json::Error),

    /// A looked-up resource does not exist.
    #[error("{0} not found")]
    NotFound(String),
}

impl ApiError {
    /// Whether the API rejected the bearer credential.
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Status { status: 401 | 403, .. })
    }
}

/// Result type for API operations.
pub type ApiResult<T> = Result<T, ApiError>;
