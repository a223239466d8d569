//! Prometheus metrics.
//!
//! Three families are exported:
//! - `geotech_requests_total{operation,outcome}`
//! - `geotech_llm_latency_seconds{operation}`
//! - `geotech_schema_failures_total{schema}`

use prometheus::{
    register_histogram_vec_with_registry, register_int_counter_vec_with_registry, Encoder,
    HistogramVec, IntCounterVec, Registry, TextEncoder,
};
use std::sync::Arc;
use std::time::Duration;

/// Latency buckets in seconds. Model calls routinely take several seconds.
const LATENCY_BUCKETS: &[f64] = &[0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 30.0, 60.0, 120.0];

/// Outcome label for a finished operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Completed successfully
    Success,
    /// Rejected because of caller input
    InvalidInput,
    /// The model gateway failed
    GatewayError,
    /// Model output did not match the schema
    SchemaError,
    /// Document text extraction failed
    ExtractionError,
}

impl Outcome {
    /// Label value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::InvalidInput => "invalid_input",
            Self::GatewayError => "gateway_error",
            Self::SchemaError => "schema_error",
            Self::ExtractionError => "extraction_error",
        }
    }
}

/// Application metrics backed by a private registry.
#[derive(Clone)]
pub struct Metrics {
    requests_total: IntCounterVec,
    llm_latency: HistogramVec,
    schema_failures: IntCounterVec,
    registry: Arc<Registry>,
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

impl Metrics {
    /// Create and register all metric families.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests_total = register_int_counter_vec_with_registry!(
            "geotech_requests_total",
            "Total operations by name and outcome",
            &["operation", "outcome"],
            registry
        )?;

        let llm_latency = register_histogram_vec_with_registry!(
            "geotech_llm_latency_seconds",
            "Language model call latency in seconds",
            &["operation"],
            LATENCY_BUCKETS.to_vec(),
            registry
        )?;

        let schema_failures = register_int_counter_vec_with_registry!(
            "geotech_schema_failures_total",
            "Model replies that did not match the expected schema",
            &["schema"],
            registry
        )?;

        Ok(Self {
            requests_total,
            llm_latency,
            schema_failures,
            registry: Arc::new(registry),
        })
    }

    /// Count one finished operation.
    pub fn record_request(&self, operation: &str, outcome: Outcome) {
        self.requests_total
            .with_label_values(&[operation, outcome.as_str()])
            .inc();
    }

    /// Record how long one model call took.
    pub fn observe_llm_latency(&self, operation: &str, elapsed: Duration) {
        self.llm_latency
            .with_label_values(&[operation])
            .observe(elapsed.as_secs_f64());
    }

    /// Count a reply that failed to parse into `schema`.
    pub fn record_schema_failure(&self, schema: &str) {
        self.schema_failures.with_label_values(&[schema]).inc();
    }

    /// Render all metrics in the Prometheus text format.
    pub fn gather(&self) -> String {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buffer) {
            tracing::warn!(error = %e, "Failed to encode metrics");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}
