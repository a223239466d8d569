//! Error types shared across the workspace.
//!
//! The taxonomy has four families:
//! - input errors (malformed request body or upload, surfaced as client errors)
//! - [`GatewayError`] (the upstream model could not produce text)
//! - [`SchemaError`] (the model produced text that does not fit the expected shape)
//! - [`ExtractionError`] (the uploaded document could not be turned into text)
//!
//! Nothing in the workspace retries automatically; every error propagates to the caller.

use std::time::Duration;
use thiserror::Error;

/// Result type for geotech operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error for agent operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The caller supplied a malformed request.
    #[error("Invalid input: {message}")]
    Input {
        /// Description of what was wrong with the input.
        message: String,
    },

    /// The language model gateway failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// The model output did not match the expected schema.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Document text extraction failed.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

impl Error {
    /// Create an input error.
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
        }
    }

    /// Short machine-readable category, used for logs and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Input { .. } => "input",
            Self::Gateway(_) => "gateway",
            Self::Schema(_) => "schema",
            Self::Extraction(_) => "extraction",
        }
    }
}

/// Failures talking to the external text-completion service.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The provider is misconfigured (for example the credential is missing).
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration issue.
        message: String,
    },

    /// The credential was rejected.
    #[error("Authentication failed: {message}")]
    Authentication {
        /// Message returned by the provider.
        message: String,
    },

    /// The provider is rate limiting this client.
    #[error("Rate limit exceeded{}", retry_after.map(|d| format!(": retry after {}s", d.as_secs())).unwrap_or_default())]
    RateLimited {
        /// How long the provider asked us to wait, if it said.
        retry_after: Option<Duration>,
    },

    /// The request never reached the provider or the connection broke.
    #[error("Network error: {message}")]
    Network {
        /// Underlying transport error.
        message: String,
    },

    /// The provider answered with an error status.
    #[error("Upstream error{}: {message}", status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Upstream {
        /// HTTP status returned by the provider.
        status: Option<u16>,
        /// Error message from the provider.
        message: String,
    },

    /// The provider answered but produced no text.
    #[error("Model returned no content: {reason}")]
    EmptyResponse {
        /// Why no content was produced (block reason, finish reason, ...).
        reason: String,
    },

    /// The provider body could not be decoded.
    #[error("Malformed provider response: {message}")]
    MalformedResponse {
        /// Decoder error.
        message: String,
    },
}

impl GatewayError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create an upstream error.
    pub fn upstream(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            message: message.into(),
        }
    }

    /// Create an empty-response error.
    pub fn empty(reason: impl Into<String>) -> Self {
        Self::EmptyResponse {
            reason: reason.into(),
        }
    }

    /// Create a malformed-response error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    /// Get the retry-after duration if available.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

/// Model output could not be coerced into the expected structured shape.
#[derive(Debug, Error)]
#[error("Failed to parse {schema}: {message}")]
pub struct SchemaError {
    /// Name of the target schema (`DocumentSummary`, `Report`).
    pub schema: &'static str,
    /// Decoder message.
    pub message: String,
    /// Line of the failure within the cleaned text (1-based, 0 if unknown).
    pub line: usize,
    /// Column of the failure within the cleaned text (1-based, 0 if unknown).
    pub column: usize,
}

impl SchemaError {
    /// Build a schema error from a `serde_json` failure.
    pub fn from_json(schema: &'static str, err: &serde_json::Error) -> Self {
        Self {
            schema,
            message: err.to_string(),
            line: err.line(),
            column: err.column(),
        }
    }
}

/// Document-to-text extraction failures.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The file type is not one we can read.
    #[error("Unsupported document type: {file}")]
    Unsupported {
        /// File name or path that was rejected.
        file: String,
    },

    /// The file could not be read from disk.
    #[error("Failed to read {file}: {source}")]
    Io {
        /// File name or path.
        file: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file was read but its content could not be decoded.
    #[error("Failed to extract text from {file}: {message}")]
    Failed {
        /// File name or path.
        file: String,
        /// Decoder message.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind() {
        assert_eq!(Error::input("bad").kind(), "input");
        assert_eq!(Error::from(GatewayError::network("down")).kind(), "gateway");
        let schema = SchemaError {
            schema: "Report",
            message: "missing field".to_string(),
            line: 1,
            column: 2,
        };
        assert_eq!(Error::from(schema).kind(), "schema");
    }

    #[test]
    fn test_gateway_error_display() {
        let err = GatewayError::RateLimited {
            retry_after: Some(Duration::from_secs(30)),
        };
        assert_eq!(err.to_string(), "Rate limit exceeded: retry after 30s");
        assert_eq!(err.retry_after(), Some(Duration::from_secs(30)));

        let err = GatewayError::upstream(Some(503), "overloaded");
        assert_eq!(err.to_string(), "Upstream error (HTTP 503): overloaded");

        let err = GatewayError::upstream(None, "odd");
        assert_eq!(err.to_string(), "Upstream error: odd");
    }

    #[test]
    fn test_schema_error_from_json() {
        let err = serde_json::from_str::<serde_json::Value>("{\n  \"a\": }").unwrap_err();
        let schema = SchemaError::from_json("DocumentSummary", &err);
        assert_eq!(schema.schema, "DocumentSummary");
        assert_eq!(schema.line, 2);
        assert!(schema.to_string().starts_with("Failed to parse DocumentSummary"));
    }
}
