//! HTTP server lifecycle.

use crate::routes::create_router;
use crate::shutdown::shutdown_signal;
use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use geotech_config::ServerSettings;
use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

/// Listener and request limits.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind host
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Largest accepted request body (uploads included)
    pub max_body_bytes: usize,
    /// Permissive CORS for browser dashboards
    pub cors_enabled: bool,
    /// How long in-flight requests get after a shutdown signal
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from(&ServerSettings::default())
    }
}

impl From<&ServerSettings> for ServerConfig {
    fn from(settings: &ServerSettings) -> Self {
        Self {
            host: settings.host.clone(),
            port: settings.port,
            max_body_bytes: settings.max_body_bytes,
            cors_enabled: settings.cors_enabled,
            shutdown_timeout: settings.shutdown_timeout,
        }
    }
}

impl ServerConfig {
    /// Create a default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the host.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// `host:port`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// The API server.
#[derive(Debug)]
pub struct Server {
    config: ServerConfig,
    state: AppState,
}

impl Server {
    /// Create a server.
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// The full application: routes, body limit and optional CORS.
    pub fn app(&self) -> axum::Router {
        let mut app = create_router(self.state.clone())
            .layer(DefaultBodyLimit::max(self.config.max_body_bytes));
        if self.config.cors_enabled {
            app = app.layer(CorsLayer::permissive());
        }
        app
    }

    /// Serve until Ctrl+C or SIGTERM.
    pub async fn run(self) -> std::io::Result<()> {
        self.run_until(async {
            shutdown_signal().await;
        })
        .await
    }

    /// Serve until `shutdown` resolves, then give in-flight requests
    /// `shutdown_timeout` to finish.
    pub async fn run_until<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let address = self.config.bind_address();
        let listener = tokio::net::TcpListener::bind(&address).await?;
        info!(address = %address, model = %self.state.model, "Server listening");

        let grace = self.config.shutdown_timeout;
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let serve = axum::serve(
            listener,
            self.app().into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            shutdown.await;
            let _ = stop_tx.send(());
        })
        .into_future();

        let deadline = async move {
            if stop_rx.await.is_ok() {
                tokio::time::sleep(grace).await;
            } else {
                std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            result = serve => {
                info!("Server stopped");
                result
            }
            () = deadline => {
                warn!(timeout_secs = grace.as_secs(), "Shutdown timeout elapsed, dropping open connections");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_from_settings() {
        let config = ServerConfig::default().with_host("127.0.0.1").with_port(9000);
        assert_eq!(config.bind_address(), "127.0.0.1:9000");
        assert_eq!(config.max_body_bytes, 25 * 1024 * 1024);
    }
}
