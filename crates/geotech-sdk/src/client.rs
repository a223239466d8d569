//! HTTP client for the assistant API.

use crate::config::ClientConfig;
use crate::error::{ApiErrorResponse, Error, Result};
use crate::request::{ChatRequest, ParameterSet};
use crate::response::{ChatResponse, HealthResponse, ReportResponse, ValidationResponse};
use geotech_agents::{ReportInput, TranscriptEntry};
use geotech_core::{DocumentSummary, Report};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, RETRY_AFTER, USER_AGENT};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// Header carrying the advisory parameter check of a report.
pub const PARAMETER_CHECK_HEADER: &str = "x-parameter-check";

/// Client for the geotechnical assistant server.
///
/// The client never retries; use [`Error::is_retryable`] to decide.
///
/// # Example
///
/// ```rust,no_run
/// use geotech_sdk::Client;
///
/// #[tokio::main]
/// async fn main() -> Result<(), geotech_sdk::Error> {
///     let client = Client::builder()
///         .base_url("http://localhost:8000")
///         .build()?;
///
///     let answer = client.ask("What is the frost depth in Kelowna?").await?;
///     println!("{answer}");
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    config: Arc<ClientConfig>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.config.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a client with the given configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| Error::configuration(format!("Invalid user agent: {e}")))?,
        );

        for (name, value) in &config.custom_headers {
            let header_name = HeaderName::try_from(name.as_str()).map_err(|e| {
                Error::configuration(format!("Invalid header name '{name}': {e}"))
            })?;
            let header_value = HeaderValue::from_str(value).map_err(|e| {
                Error::configuration(format!("Invalid header value for '{name}': {e}"))
            })?;
            headers.insert(header_name, header_value);
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| Error::configuration(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            config: Arc::new(config),
        })
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Ask a question against the server transcript and return the answer.
    pub async fn ask(&self, query: impl Into<String>) -> Result<String> {
        Ok(self.chat(&ChatRequest::new(query)).await?.response)
    }

    /// Send a chat request.
    #[instrument(skip(self, request))]
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let url = self.url("chat")?;
        debug!("Sending chat request to {}", url);
        let response = self.send(self.http.post(url).json(request)).await?;
        decode(response).await
    }

    /// Upload a local file for analysis.
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub async fn analyze_document(&self, path: impl AsRef<Path>) -> Result<DocumentSummary> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.analyze_bytes(file_name, bytes).await
    }

    /// Upload in-memory document bytes for analysis. The extension of
    /// `file_name` selects the text extractor on the server.
    #[instrument(skip(self, bytes), fields(bytes = bytes.len()))]
    pub async fn analyze_bytes(
        &self,
        file_name: impl Into<String> + std::fmt::Debug,
        bytes: Vec<u8>,
    ) -> Result<DocumentSummary> {
        let url = self.url("analyze_document")?;
        let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name.into()));
        debug!("Uploading document to {}", url);
        let response = self.send(self.http.post(url).multipart(form)).await?;
        decode(response).await
    }

    /// Generate a report.
    #[instrument(skip(self, input), fields(report_type = %input.report_type))]
    pub async fn generate_report(&self, input: &ReportInput) -> Result<ReportResponse> {
        let url = self.url("generate_report")?;
        let response = self.send(self.http.post(url).json(input)).await?;
        let parameter_check = response
            .headers()
            .get(PARAMETER_CHECK_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let report: Report = decode(response).await?;
        Ok(ReportResponse {
            report,
            parameter_check,
        })
    }

    /// Check parameters against typical ranges.
    #[instrument(skip(self, params), fields(count = params.len()))]
    pub async fn validate_parameters(&self, params: &ParameterSet) -> Result<ValidationResponse> {
        let url = self.url("validate_parameters")?;
        let response = self.send(self.http.post(url).json(params)).await?;
        decode(response).await
    }

    /// The server's chat transcript.
    #[instrument(skip(self))]
    pub async fn history(&self) -> Result<Vec<TranscriptEntry>> {
        let url = self.url("chat/history")?;
        let response = self.send(self.http.get(url)).await?;
        decode(response).await
    }

    /// Clear the server's chat transcript.
    #[instrument(skip(self))]
    pub async fn clear_history(&self) -> Result<()> {
        let url = self.url("chat/history")?;
        self.send(self.http.delete(url)).await?;
        Ok(())
    }

    /// Check the health of the server.
    #[instrument(skip(self))]
    pub async fn health(&self) -> Result<HealthResponse> {
        let url = self.url("health")?;
        debug!("Checking health at {}", url);
        let response = self.send(self.http.get(url)).await?;
        decode(response).await
    }

    /// Whether the server is reachable and healthy.
    pub async fn is_healthy(&self) -> bool {
        self.health().await.is_ok_and(|h| h.is_healthy())
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.config
            .base_url
            .join(path)
            .map_err(|e| Error::configuration(format!("Invalid URL path '{path}': {e}")))
    }

    /// Send a request and turn non-success statuses into errors.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = request.send().await.map_err(|e| self.map_reqwest_error(e))?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(error_from_response(response).await)
        }
    }

    fn map_reqwest_error(&self, error: reqwest::Error) -> Error {
        if error.is_timeout() {
            Error::Timeout {
                duration_ms: u64::try_from(self.config.timeout.as_millis()).unwrap_or(u64::MAX),
            }
        } else if error.is_connect() {
            Error::Connection {
                message: error.to_string(),
            }
        } else {
            Error::Http(error)
        }
    }
}

async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| Error::parse_error(e.to_string()))
}

async fn error_from_response(response: reqwest::Response) -> Error {
    let status = response.status();
    let headers = response.headers();
    let request_id = headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    let retry_after = headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());

    let body = response.text().await.unwrap_or_default();
    let (error_type, message) = match serde_json::from_str::<ApiErrorResponse>(&body) {
        Ok(parsed) => (parsed.error.error_type, parsed.error.message),
        Err(_) if body.is_empty() => (None, format!("HTTP {}", status.as_u16())),
        Err(_) => (None, body),
    };

    match status {
        StatusCode::BAD_REQUEST => Error::InvalidRequest { message },
        StatusCode::SERVICE_UNAVAILABLE | StatusCode::TOO_MANY_REQUESTS
            if error_type.as_deref() == Some("rate_limit_error") || retry_after.is_some() =>
        {
            Error::RateLimited {
                retry_after,
                message,
                request_id,
            }
        }
        _ => Error::Api {
            status: status.as_u16(),
            message,
            error_type,
            request_id,
        },
    }
}

/// Builder for [`Client`].
#[derive(Debug, Default)]
pub struct ClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    user_agent: Option<String>,
    custom_headers: Vec<(String, String)>,
}

impl ClientBuilder {
    /// Create a new client builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the server address.
    #[must_use]
    pub fn base_url(mut self, url: impl AsRef<str>) -> Self {
        self.base_url = Some(url.as_ref().to_string());
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the connection timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the user agent.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Add a header sent with every request.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_headers.push((name.into(), value.into()));
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<Client> {
        let mut raw = self
            .base_url
            .unwrap_or_else(|| ClientConfig::DEFAULT_BASE_URL.to_string());
        // Relative joins keep any path prefix only when the base ends in '/'.
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base_url = Url::parse(&raw)
            .map_err(|e| Error::configuration(format!("Invalid base URL '{raw}': {e}")))?;

        let mut config = ClientConfig::new(base_url);
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
        if let Some(timeout) = self.connect_timeout {
            config.connect_timeout = timeout;
        }
        if let Some(user_agent) = self.user_agent {
            config.user_agent = user_agent;
        }
        config.custom_headers = self.custom_headers;

        Client::new(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let client = Client::builder().build().unwrap();
        assert_eq!(client.config().base_url().as_str(), "http://localhost:8000/");
        assert_eq!(client.config().timeout(), ClientConfig::DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_builder_keeps_path_prefix() {
        let client = Client::builder()
            .base_url("https://example.com/geotech")
            .build()
            .unwrap();
        assert_eq!(
            client.url("chat/history").unwrap().as_str(),
            "https://example.com/geotech/chat/history"
        );
    }

    #[test]
    fn test_builder_rejects_bad_url() {
        let err = Client::builder().base_url("not a url").build().unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_builder_rejects_bad_header() {
        let err = Client::builder()
            .header("bad header", "x")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Invalid header name"));
    }
}
