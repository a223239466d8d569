//! Error types for the SDK.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type for SDK operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the client.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid client setup.
    #[error("Configuration error: {message}")]
    Configuration {
        /// What is wrong.
        message: String,
    },

    /// Transport failure not covered by a more specific variant.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with an error body.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message from the server.
        message: String,
        /// Error type from the server (`schema_error`, `gateway_error`, ...).
        error_type: Option<String>,
        /// Request ID for correlating with server logs.
        request_id: Option<String>,
    },

    /// The server's model backend is rate limited.
    #[error("Rate limited: retry after {retry_after:?} seconds")]
    RateLimited {
        /// Seconds to wait, from `Retry-After`.
        retry_after: Option<u64>,
        /// Message from the server.
        message: String,
        /// Request ID for correlating with server logs.
        request_id: Option<String>,
    },

    /// The server rejected the request as invalid.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Message from the server.
        message: String,
    },

    /// The response body could not be decoded.
    #[error("Failed to parse response: {message}")]
    ParseError {
        /// Decoder message.
        message: String,
    },

    /// No response within the configured timeout.
    #[error("Request timed out after {duration_ms}ms")]
    Timeout {
        /// Timeout in milliseconds.
        duration_ms: u64,
    },

    /// The server could not be reached.
    #[error("Connection error: {message}")]
    Connection {
        /// Transport message.
        message: String,
    },

    /// A local file could not be read for upload.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        /// File being uploaded.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an API error from a status and message.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
            error_type: None,
            request_id: None,
        }
    }

    /// Create a parse error.
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::ParseError {
            message: message.into(),
        }
    }

    /// Whether repeating the same call may succeed.
    ///
    /// The client never retries on its own; this is for callers that do.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::RateLimited { .. } | Self::Timeout { .. } | Self::Connection { .. } => true,
            Self::Api { status, .. } => matches!(status, 502 | 503 | 504),
            _ => false,
        }
    }

    /// HTTP status code, when the server answered.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::RateLimited { .. } => Some(503),
            Self::InvalidRequest { .. } => Some(400),
            _ => None,
        }
    }

    /// Error type reported by the server.
    pub fn error_type(&self) -> Option<&str> {
        match self {
            Self::Api { error_type, .. } => error_type.as_deref(),
            Self::RateLimited { .. } => Some("rate_limit_error"),
            Self::InvalidRequest { .. } => Some("invalid_request_error"),
            _ => None,
        }
    }

    /// Request ID, when the server sent one.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Self::Api { request_id, .. } | Self::RateLimited { request_id, .. } => {
                request_id.as_deref()
            }
            _ => None,
        }
    }

    /// How long the server asked callers to wait.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after, .. } => retry_after.map(Duration::from_secs),
            _ => None,
        }
    }
}

/// Error body returned by the server.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ApiErrorResponse {
    /// Error details.
    pub error: ApiErrorDetail,
}

/// Detailed error information.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ApiErrorDetail {
    /// Error type.
    #[serde(rename = "type")]
    pub error_type: Option<String>,
    /// Human-readable message.
    pub message: String,
}
