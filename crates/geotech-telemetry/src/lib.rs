//! # Geotech Telemetry
//!
//! Observability for the geotechnical assistant.
//!
//! This crate provides:
//! - Structured logging (text or JSON) with `RUST_LOG` filtering
//! - Optional distributed tracing with OpenTelemetry
//! - Prometheus metrics for requests, model latency and schema failures

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod logging;
pub mod metrics;
pub mod tracing_setup;

pub use logging::{init_logging, LoggingConfig};
pub use metrics::{Metrics, Outcome};
pub use tracing_setup::{init_tracing, shutdown_tracing, TracingConfig};

/// Telemetry initialization error
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Failed to install the global subscriber
    #[error("Failed to initialize telemetry: {0}")]
    Init(String),
    /// Failed to register a metric family
    #[error("Failed to register metrics: {0}")]
    Metrics(#[from] prometheus::Error),
}
