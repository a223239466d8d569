//! Google Gemini provider implementation.
//!
//! Supports Gemini models via Google AI Studio and Vertex AI.
//!
//! # API Formats
//! - Google AI Studio: `https://generativelanguage.googleapis.com/v1beta/models/{MODEL}:generateContent`
//! - Vertex AI: `https://{LOCATION}-aiplatform.googleapis.com/v1/projects/{PROJECT}/locations/{LOCATION}/publishers/google/models/{MODEL}:generateContent`

use async_trait::async_trait;
use geotech_core::{CompletionProvider, CompletionRequest, GatewayError, ResponseFormat};
use reqwest::header::RETRY_AFTER;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, trace, warn};

/// Default model for new configurations.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Google provider API type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GoogleApiType {
    /// Google AI Studio (generativelanguage.googleapis.com)
    #[default]
    GoogleAI,
    /// Vertex AI (aiplatform.googleapis.com)
    VertexAI,
}

/// Google provider configuration
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    /// Provider instance ID
    pub id: String,
    /// API key (for Google AI Studio)
    pub api_key: Option<SecretString>,
    /// Access token (for Vertex AI, usually from a service account)
    pub access_token: Option<SecretString>,
    /// API type (Google AI or Vertex AI)
    pub api_type: GoogleApiType,
    /// Google Cloud project ID (required for Vertex AI)
    pub project_id: Option<String>,
    /// Google Cloud location (Vertex AI)
    pub location: String,
    /// Model every request is sent to
    pub model: String,
    /// Base URL override; replaces the public endpoint
    pub base_url: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Default sampling temperature
    pub temperature: Option<f32>,
    /// Default output token limit
    pub max_output_tokens: Option<u32>,
}

impl GoogleConfig {
    /// Create a new Google AI Studio configuration
    #[must_use]
    pub fn google_ai(id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            api_key: Some(SecretString::new(api_key.into())),
            access_token: None,
            api_type: GoogleApiType::GoogleAI,
            project_id: None,
            location: "us-central1".to_string(),
            model: DEFAULT_MODEL.to_string(),
            base_url: None,
            timeout: Duration::from_secs(120),
            temperature: None,
            max_output_tokens: None,
        }
    }

    /// Create a new Vertex AI configuration
    #[must_use]
    pub fn vertex_ai(
        id: impl Into<String>,
        project_id: impl Into<String>,
        location: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            api_key: None,
            access_token: Some(SecretString::new(access_token.into())),
            api_type: GoogleApiType::VertexAI,
            project_id: Some(project_id.into()),
            location: location.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: None,
            timeout: Duration::from_secs(120),
            temperature: None,
            max_output_tokens: None,
        }
    }

    /// Set the model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Point the provider at a different base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the default temperature
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the default output token limit
    #[must_use]
    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }

    /// Get the base URL for the API
    fn base_url(&self) -> String {
        if let Some(base) = &self.base_url {
            return base.trim_end_matches('/').to_string();
        }
        match self.api_type {
            GoogleApiType::GoogleAI => {
                "https://generativelanguage.googleapis.com/v1beta".to_string()
            }
            GoogleApiType::VertexAI => {
                let project = self.project_id.as_deref().unwrap_or("unknown");
                let location = &self.location;
                format!(
                    "https://{location}-aiplatform.googleapis.com/v1/projects/{project}/locations/{location}/publishers/google"
                )
            }
        }
    }
}

/// Google Gemini provider implementation
pub struct GoogleProvider {
    config: GoogleConfig,
    client: Client,
    endpoint: String,
}

impl std::fmt::Debug for GoogleProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleProvider")
            .field("id", &self.config.id)
            .field("model", &self.config.model)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl GoogleProvider {
    /// Create a new Google provider
    ///
    /// # Errors
    /// Returns error if HTTP client cannot be created or configuration is invalid
    pub fn new(config: GoogleConfig) -> Result<Self, GatewayError> {
        match config.api_type {
            GoogleApiType::GoogleAI => {
                if config.api_key.is_none() {
                    return Err(GatewayError::configuration(
                        "API key is required for Google AI Studio (set GOOGLE_API_KEY)",
                    ));
                }
            }
            GoogleApiType::VertexAI => {
                if config.project_id.is_none() {
                    return Err(GatewayError::configuration(
                        "Project ID is required for Vertex AI",
                    ));
                }
                if config.access_token.is_none() {
                    return Err(GatewayError::configuration(
                        "Access token is required for Vertex AI",
                    ));
                }
            }
        }
        if config.model.trim().is_empty() {
            return Err(GatewayError::configuration("Model must not be empty"));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(16)
            .build()
            .map_err(|e| {
                GatewayError::configuration(format!("Failed to create HTTP client: {e}"))
            })?;

        let endpoint = format!("{}/models/{}:generateContent", config.base_url(), config.model);

        Ok(Self {
            config,
            client,
            endpoint,
        })
    }

    /// Full `generateContent` URL
    pub fn endpoint_url(&self) -> &str {
        &self.endpoint
    }

    /// Build the Gemini request body
    fn transform_request(&self, request: &CompletionRequest) -> GoogleRequest {
        let json_mode = request.response_format == ResponseFormat::Json;

        GoogleRequest {
            contents: vec![GoogleContent {
                role: Some("user".to_string()),
                parts: vec![GooglePart {
                    text: Some(request.prompt.clone()),
                }],
            }],
            generation_config: Some(GoogleGenerationConfig {
                temperature: request.temperature.or(self.config.temperature),
                max_output_tokens: request.max_output_tokens.or(self.config.max_output_tokens),
                response_mime_type: json_mode.then(|| ResponseFormat::Json.mime_type().to_string()),
            }),
        }
    }

    /// Pull the reply text out of a decoded response
    fn transform_response(response: GoogleResponse) -> Result<String, GatewayError> {
        let Some(candidate) = response.candidates.into_iter().next() else {
            let reason = response
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .map_or_else(
                    || "no candidates in response".to_string(),
                    |r| format!("prompt blocked ({r})"),
                );
            return Err(GatewayError::empty(reason));
        };

        let text = candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            let reason = candidate
                .finish_reason
                .map_or_else(|| "empty text".to_string(), |r| format!("finish reason {r}"));
            return Err(GatewayError::empty(reason));
        }

        Ok(text)
    }

    /// Parse error response
    fn parse_error(status: u16, body: &str, retry_after: Option<Duration>) -> GatewayError {
        #[derive(Deserialize)]
        struct GoogleErrorResponse {
            error: GoogleErrorDetail,
        }

        #[derive(Deserialize)]
        struct GoogleErrorDetail {
            message: String,
        }

        let message = serde_json::from_str::<GoogleErrorResponse>(body)
            .map_or_else(|_| format!("HTTP {status}: {body}"), |r| r.error.message);

        match status {
            400 if message.contains("API key not valid") => GatewayError::authentication(message),
            401 | 403 => GatewayError::authentication(message),
            429 => GatewayError::RateLimited { retry_after },
            _ => GatewayError::upstream(Some(status), message),
        }
    }
}

#[async_trait]
impl CompletionProvider for GoogleProvider {
    fn id(&self) -> &str {
        &self.config.id
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, GatewayError> {
        let google_request = self.transform_request(request);

        debug!(
            provider = "google",
            model = %self.config.model,
            url = %self.endpoint,
            prompt_chars = request.prompt_chars(),
            json_mode = request.response_format == ResponseFormat::Json,
            "Sending generateContent request"
        );

        let mut req_builder = self.client.post(&self.endpoint);

        match self.config.api_type {
            GoogleApiType::GoogleAI => {
                if let Some(ref key) = self.config.api_key {
                    req_builder = req_builder.header("x-goog-api-key", key.expose_secret());
                }
            }
            GoogleApiType::VertexAI => {
                if let Some(ref token) = self.config.access_token {
                    req_builder = req_builder.bearer_auth(token.expose_secret());
                }
            }
        }

        let response = req_builder
            .json(&google_request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Google API request failed");
                GatewayError::network(format!("Request failed: {e}"))
            })?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);

        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::network(format!("Failed to read response: {e}")))?;

        trace!(status = %status, body = %body, "Received Google response");

        if !status.is_success() {
            let err = Self::parse_error(status.as_u16(), &body, retry_after);
            warn!(status = status.as_u16(), error = %err, "Google API returned an error");
            return Err(err);
        }

        let google_response: GoogleResponse = serde_json::from_str(&body)
            .map_err(|e| GatewayError::malformed(format!("Invalid response JSON: {e}")))?;

        Self::transform_response(google_response)
    }
}

// Google API Types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GoogleRequest {
    contents: Vec<GoogleContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GoogleGenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GooglePart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GooglePart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GoogleGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleResponse {
    #[serde(default)]
    candidates: Vec<GoogleCandidate>,
    #[serde(default)]
    prompt_feedback: Option<GooglePromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleCandidate {
    #[serde(default)]
    content: Option<GoogleContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GooglePromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_google_ai_config() {
        let config = GoogleConfig::google_ai("google-1", "test-key");

        assert_eq!(config.id, "google-1");
        assert!(config.api_key.is_some());
        assert_eq!(config.api_type, GoogleApiType::GoogleAI);
        assert_eq!(config.model, "gemini-1.5-flash");
        assert!(config.project_id.is_none());
    }

    #[test]
    fn test_vertex_ai_config() {
        let config =
            GoogleConfig::vertex_ai("vertex-1", "my-project", "us-central1", "test-token");

        assert!(config.access_token.is_some());
        assert_eq!(config.api_type, GoogleApiType::VertexAI);
        assert_eq!(config.project_id, Some("my-project".to_string()));
        assert_eq!(config.location, "us-central1");
    }

    #[test]
    fn test_endpoint_google_ai() {
        let provider =
            GoogleProvider::new(GoogleConfig::google_ai("google-1", "test-key")).unwrap();
        let url = provider.endpoint_url();
        assert_eq!(
            url,
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
        assert!(!url.contains("key="));
    }

    #[test]
    fn test_endpoint_vertex_ai() {
        let provider = GoogleProvider::new(
            GoogleConfig::vertex_ai("vertex-1", "my-project", "europe-west4", "test-token")
                .with_model("gemini-1.5-pro"),
        )
        .unwrap();
        let url = provider.endpoint_url();
        assert!(url.starts_with("https://europe-west4-aiplatform.googleapis.com/v1/projects/my-project"));
        assert!(url.ends_with("/publishers/google/models/gemini-1.5-pro:generateContent"));
    }

    #[test]
    fn test_endpoint_base_url_override() {
        let provider = GoogleProvider::new(
            GoogleConfig::google_ai("google-1", "k").with_base_url("http://127.0.0.1:9999/"),
        )
        .unwrap();
        assert_eq!(
            provider.endpoint_url(),
            "http://127.0.0.1:9999/models/gemini-1.5-flash:generateContent"
        );
    }

    #[test]
    fn test_provider_creation_missing_credentials() {
        let mut config = GoogleConfig::google_ai("test", "k");
        config.api_key = None;
        assert!(matches!(
            GoogleProvider::new(config),
            Err(GatewayError::Configuration { .. })
        ));

        let mut config = GoogleConfig::vertex_ai("test", "p", "us-central1", "t");
        config.project_id = None;
        assert!(GoogleProvider::new(config).is_err());
    }

    #[test]
    fn test_transform_request_json_mode() {
        let provider = GoogleProvider::new(
            GoogleConfig::google_ai("google-1", "k").with_temperature(0.3),
        )
        .unwrap();

        let body = serde_json::to_value(
            provider.transform_request(&CompletionRequest::json("extract").with_max_output_tokens(64)),
        )
        .unwrap();
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "extract");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 64);
        assert!((body["generationConfig"]["temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);

        let body =
            serde_json::to_value(provider.transform_request(&CompletionRequest::text("hi"))).unwrap();
        assert!(body["generationConfig"].get("responseMimeType").is_none());
    }

    #[test]
    fn test_transform_response() {
        let response: GoogleResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hello "},{"text":"there"}]},"finishReason":"STOP"}]}"#,
        )
        .unwrap();
        assert_eq!(GoogleProvider::transform_response(response).unwrap(), "Hello there");

        let blocked: GoogleResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap();
        let err = GoogleProvider::transform_response(blocked).unwrap_err();
        assert!(matches!(err, GatewayError::EmptyResponse { ref reason } if reason.contains("SAFETY")));

        let empty: GoogleResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"MAX_TOKENS"}]}"#).unwrap();
        assert!(matches!(
            GoogleProvider::transform_response(empty),
            Err(GatewayError::EmptyResponse { .. })
        ));
    }

    #[test]
    fn test_parse_error_mapping() {
        let body = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT"}}"#;
        assert!(matches!(
            GoogleProvider::parse_error(400, body, None),
            GatewayError::Authentication { .. }
        ));

        let body = r#"{"error":{"code":400,"message":"Invalid JSON payload"}}"#;
        assert!(matches!(
            GoogleProvider::parse_error(400, body, None),
            GatewayError::Upstream { status: Some(400), .. }
        ));

        assert!(matches!(
            GoogleProvider::parse_error(403, "{}", None),
            GatewayError::Authentication { .. }
        ));

        let err = GoogleProvider::parse_error(429, "", Some(Duration::from_secs(7)));
        assert_eq!(err.retry_after(), Some(Duration::from_secs(7)));

        let err = GoogleProvider::parse_error(503, "overloaded", None);
        assert!(matches!(err, GatewayError::Upstream { status: Some(503), ref message } if message.contains("overloaded")));
    }
}
