//! Model calls and structured reply parsing shared by the agents.

use geotech_core::{
    clean, extract_object_span, CompletionProvider, CompletionRequest, GatewayError, SchemaError,
    StructuredOutput,
};
use geotech_telemetry::Metrics;
use std::time::Instant;
use tracing::{debug, error, info};

/// Send one request and record its latency under `operation`.
pub(crate) async fn call_model(
    provider: &dyn CompletionProvider,
    metrics: Option<&Metrics>,
    operation: &str,
    request: &CompletionRequest,
) -> Result<String, GatewayError> {
    let start = Instant::now();
    let result = provider.complete(request).await;
    let elapsed = start.elapsed();

    if let Some(metrics) = metrics {
        metrics.observe_llm_latency(operation, elapsed);
    }

    match &result {
        Ok(text) => debug!(
            operation,
            provider = provider.id(),
            model = provider.model(),
            latency_ms = elapsed.as_millis() as u64,
            reply_chars = text.len(),
            "Model call completed"
        ),
        Err(e) => error!(
            operation,
            provider = provider.id(),
            latency_ms = elapsed.as_millis() as u64,
            error = %e,
            "Model call failed"
        ),
    }
    result
}

/// Clean a model reply and parse it into `T`.
///
/// When the cleaned text is not a bare object but contains one surrounded by
/// prose, the object span is tried before giving up.
pub(crate) fn parse_reply<T: StructuredOutput>(
    raw: &str,
    metrics: Option<&Metrics>,
) -> Result<T, SchemaError> {
    info!(schema = T::SCHEMA, raw = %raw, "Raw model reply");
    let cleaned = clean(raw);
    debug!(schema = T::SCHEMA, cleaned = %cleaned, "Cleaned model reply");

    let err = match T::parse(&cleaned) {
        Ok(value) => return Ok(value),
        Err(err) => err,
    };

    if let Some(span) = extract_object_span(&cleaned).filter(|span| span.len() < cleaned.len()) {
        if let Ok(value) = T::parse(span) {
            debug!(schema = T::SCHEMA, "Parsed object embedded in prose");
            return Ok(value);
        }
    }

    if let Some(metrics) = metrics {
        metrics.record_schema_failure(T::SCHEMA);
    }
    error!(
        schema = T::SCHEMA,
        error = %err,
        raw = %raw,
        cleaned = %cleaned,
        "Model reply did not match schema"
    );
    Err(err)
}
