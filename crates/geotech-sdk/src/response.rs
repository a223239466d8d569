//! Response bodies.

use geotech_core::Report;
use serde::{Deserialize, Serialize};

/// Answer from `POST /chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Model answer, unmodified.
    pub response: String,
}

/// Answer from `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `healthy` when the server is up.
    pub status: String,
    /// Server version.
    pub version: String,
    /// Model answering requests.
    pub model: String,
}

impl HealthResponse {
    /// Whether the server reports itself healthy.
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Answer from `POST /validate_parameters`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResponse {
    /// Advisory message.
    pub message: String,
}

impl ValidationResponse {
    /// Whether the message is a range warning.
    pub fn is_warning(&self) -> bool {
        self.message.starts_with("Warning:")
    }
}

/// A generated report together with the server's parameter check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportResponse {
    /// The report.
    pub report: Report,
    /// Contents of the `x-parameter-check` header, when present.
    pub parameter_check: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response() {
        let health: HealthResponse = serde_json::from_str(
            r#"{"status":"healthy","version":"0.1.0","model":"gemini-1.5-flash"}"#,
        )
        .unwrap();
        assert!(health.is_healthy());
    }

    #[test]
    fn test_validation_warning() {
        let response = ValidationResponse {
            message: "Warning: cohesion (60 kPa) outside typical range (0, 50).".to_string(),
        };
        assert!(response.is_warning());
    }
}
