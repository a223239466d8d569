//! Client configuration.

use std::time::Duration;
use url::Url;

/// Configuration for the API client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the assistant server.
    pub(crate) base_url: Url,
    /// Request timeout. Report generation and document analysis wait on the
    /// model, so this is generous.
    pub(crate) timeout: Duration,
    /// Connection timeout.
    pub(crate) connect_timeout: Duration,
    /// User agent string.
    pub(crate) user_agent: String,
    /// Extra headers sent with every request.
    pub(crate) custom_headers: Vec<(String, String)>,
}

impl ClientConfig {
    /// Default server address.
    pub const DEFAULT_BASE_URL: &'static str = "http://localhost:8000";
    /// Default request timeout (180 seconds).
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(180);
    /// Default connection timeout (10 seconds).
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
    /// Default user agent.
    pub const DEFAULT_USER_AGENT: &'static str =
        concat!("geotech-sdk-rust/", env!("CARGO_PKG_VERSION"));

    /// Create a configuration with default values for `base_url`.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: Self::DEFAULT_TIMEOUT,
            connect_timeout: Self::DEFAULT_CONNECT_TIMEOUT,
            user_agent: Self::DEFAULT_USER_AGENT.to_string(),
            custom_headers: Vec::new(),
        }
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Get the request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Get the connection timeout.
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Get the user agent.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Get custom headers.
    pub fn custom_headers(&self) -> &[(String, String)] {
        &self.custom_headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let url = Url::parse(ClientConfig::DEFAULT_BASE_URL).unwrap();
        let config = ClientConfig::new(url);
        assert_eq!(config.base_url().as_str(), "http://localhost:8000/");
        assert_eq!(config.timeout(), ClientConfig::DEFAULT_TIMEOUT);
        assert!(config.user_agent().starts_with("geotech-sdk-rust/"));
        assert!(config.custom_headers().is_empty());
    }
}
