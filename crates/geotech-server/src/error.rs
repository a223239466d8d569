//! API error type and its HTTP mapping.
//!
//! Every failure leaves the server as
//! `{"error": {"type": "...", "message": "..."}}`.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use geotech_agents::TranscriptError;
use geotech_core::{Error, ExtractionError, GatewayError};
use geotech_telemetry::Outcome;
use serde::Serialize;
use std::time::Duration;
use tracing::error;

/// Error returned by handlers.
#[derive(Debug)]
pub struct ApiError {
    /// HTTP status
    pub status: StatusCode,
    /// Machine-readable error type
    pub error_type: &'static str,
    /// Human-readable message
    pub message: String,
    /// Value for the `Retry-After` header
    pub retry_after: Option<Duration>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: ErrorDetail<'a>,
}

#[derive(Serialize)]
struct ErrorDetail<'a> {
    #[serde(rename = "type")]
    error_type: &'a str,
    message: &'a str,
}

impl ApiError {
    /// Create an error with an explicit status and type.
    pub fn new(status: StatusCode, error_type: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            error_type,
            message: message.into(),
            retry_after: None,
        }
    }

    /// 400 for a malformed request.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_request_error", message)
    }

    /// 500 for anything the caller cannot fix.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
    }

    /// Set the `Retry-After` value.
    #[must_use]
    pub fn with_retry_after(mut self, retry_after: Option<Duration>) -> Self {
        self.retry_after = retry_after;
        self
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        let message = err.to_string();
        match err {
            GatewayError::Configuration { .. } => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "configuration_error", message)
            }
            GatewayError::RateLimited { retry_after } => {
                Self::new(StatusCode::SERVICE_UNAVAILABLE, "rate_limit_error", message)
                    .with_retry_after(retry_after)
            }
            _ => Self::new(StatusCode::BAD_GATEWAY, "gateway_error", message),
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let message = err.to_string();
        match err {
            Error::Input { .. } => Self::bad_request(message),
            Error::Gateway(e) => e.into(),
            Error::Schema(_) => Self::new(StatusCode::BAD_GATEWAY, "schema_error", message),
            Error::Extraction(ExtractionError::Unsupported { .. }) => {
                Self::new(StatusCode::BAD_REQUEST, "invalid_request_error", message)
            }
            Error::Extraction(_) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "extraction_error",
                message,
            ),
        }
    }
}

impl From<TranscriptError> for ApiError {
    fn from(err: TranscriptError) -> Self {
        error!(error = %err, "Transcript store failed");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "transcript_error",
            err.to_string(),
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                error_type: self.error_type,
                message: &self.message,
            },
        };
        let mut response = (self.status, Json(body)).into_response();

        if let Some(retry_after) = self.retry_after {
            if let Ok(value) = HeaderValue::from_str(&retry_after.as_secs().to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

/// Metric outcome label for a failed operation.
pub(crate) fn outcome_of(err: &Error) -> Outcome {
    match err {
        Error::Input { .. } | Error::Extraction(ExtractionError::Unsupported { .. }) => {
            Outcome::InvalidInput
        }
        Error::Gateway(_) => Outcome::GatewayError,
        Error::Schema(_) => Outcome::SchemaError,
        Error::Extraction(_) => Outcome::ExtractionError,
    }
}
