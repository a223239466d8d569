//! HTTP request handlers.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use geotech_agents::{
    render_history, scan_parameters, validate_parameters, ReportInput, TranscriptEntry,
};
use geotech_core::{DocumentSummary, Error, Report};
use geotech_telemetry::Outcome;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    error::{outcome_of, ApiError},
    extractors::{JsonBody, RequestId},
    state::AppState,
};

/// Response header carrying the advisory parameter check of a report request.
pub const PARAMETER_CHECK_HEADER: &str = "x-parameter-check";

/// Multipart field holding the uploaded document.
pub const UPLOAD_FIELD: &str = "file";

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Version
    pub version: String,
    /// Model answering requests
    pub model: String,
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model: state.model.clone(),
    })
}

/// Metrics endpoint (Prometheus format)
pub async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let metrics = state.metrics.gather();
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics,
    )
}

fn record<T>(state: &AppState, operation: &str, result: &Result<T, Error>) {
    let outcome = match result {
        Ok(_) => Outcome::Success,
        Err(e) => outcome_of(e),
    };
    state.metrics.record_request(operation, outcome);
}

/// Chat request
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The question
    pub query: String,
    /// Rendered history; the server transcript is used when absent
    #[serde(default)]
    pub chat_history: Option<String>,
}

/// Chat response
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Model answer, unmodified
    pub response: String,
}

/// Answer a question and append the turn to the transcript.
#[instrument(skip(state, body), fields(request_id = %request_id))]
pub async fn chat(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    JsonBody(body): JsonBody<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let history = match body.chat_history {
        Some(history) => history,
        None => render_history(&state.transcript.load().await?),
    };

    let result = state.agents.chat.respond(&body.query, &history).await;
    record(&state, "chat", &result);
    let response = result?;

    let turn = [
        TranscriptEntry::user(body.query),
        TranscriptEntry::assistant(response.clone()),
    ];
    if let Err(e) = state.transcript.append(&turn).await {
        error!(error = %e, "Failed to record chat turn");
    }

    info!(reply_chars = response.len(), "Chat completed");
    Ok(Json(ChatResponse { response }))
}

/// Analyze an uploaded document (multipart field `file`).
#[instrument(skip(state, multipart), fields(request_id = %request_id))]
pub async fn analyze_document(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<DocumentSummary>, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let (file_name, bytes) = loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {e}")))?;
        let Some(field) = field else {
            state
                .metrics
                .record_request("analyze_document", Outcome::InvalidInput);
            return Err(ApiError::bad_request(format!(
                "Missing multipart field '{UPLOAD_FIELD}'"
            )));
        };
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {e}")))?;
        break (file_name, bytes);
    };

    debug!(file_name = %file_name, bytes = bytes.len(), "Upload received");

    let uploads = state.uploads.clone();
    let name = file_name.clone();
    let upload = tokio::task::spawn_blocking(move || uploads.store(&name, &bytes))
        .await
        .map_err(|e| ApiError::internal(format!("Upload task failed: {e}")))?
        .map_err(|e| {
            error!(error = %e, "Failed to store upload");
            ApiError::internal(format!("Failed to store upload: {e}"))
        })?;

    let result = state.agents.extraction.analyze_file(upload.path()).await;
    drop(upload);
    record(&state, "analyze_document", &result);

    let summary = result.map_err(|e| {
        warn!(file_name = %file_name, error = %e, "Document analysis failed");
        ApiError::from(e)
    })?;
    info!(file_name = %file_name, doc_type = %summary.doc_type, "Document analyzed");
    Ok(Json(summary))
}

/// Generate a report. The parameter check is advisory and travels in a header.
#[instrument(skip(state, input), fields(request_id = %request_id, report_type = %input.report_type))]
pub async fn generate_report(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    JsonBody(input): JsonBody<ReportInput>,
) -> Result<Response, ApiError> {
    let check = validate_parameters(scan_parameters(&input.parameters));
    if check.is_warning() {
        warn!(check = %check, "Report parameters outside typical ranges");
    }

    let result = state.agents.report.generate(&input).await;
    record(&state, "generate_report", &result);
    let report: Report = result?;

    let mut response = Json(report).into_response();
    if let Ok(value) = HeaderValue::from_str(&check.to_string()) {
        response.headers_mut().insert(PARAMETER_CHECK_HEADER, value);
    }
    Ok(response)
}

/// Parameters in the order the caller wrote them.
#[derive(Debug, Default)]
pub struct OrderedParameters(pub Vec<(String, f64)>);

impl<'de> Deserialize<'de> for OrderedParameters {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ParamVisitor;

        impl<'de> Visitor<'de> for ParamVisitor {
            type Value = OrderedParameters;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object of parameter names to numbers")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut params = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, f64>()? {
                    params.push(entry);
                }
                Ok(OrderedParameters(params))
            }
        }

        deserializer.deserialize_map(ParamVisitor)
    }
}

/// Parameter check response
#[derive(Debug, Serialize, Deserialize)]
pub struct ValidationResponse {
    /// Advisory message
    pub message: String,
}

/// Check parameters against typical ranges.
#[instrument(skip(state, params))]
pub async fn validate_parameters_endpoint(
    State(state): State<AppState>,
    JsonBody(params): JsonBody<OrderedParameters>,
) -> Json<ValidationResponse> {
    let check = validate_parameters(params.0);
    state
        .metrics
        .record_request("validate_parameters", Outcome::Success);
    Json(ValidationResponse {
        message: check.to_string(),
    })
}

/// Current chat transcript.
pub async fn get_history(
    State(state): State<AppState>,
) -> Result<Json<Vec<TranscriptEntry>>, ApiError> {
    Ok(Json(state.transcript.load().await?))
}

/// Clear the chat transcript.
pub async fn clear_history(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.transcript.clear().await?;
    info!("Chat transcript cleared");
    Ok(StatusCode::NO_CONTENT)
}
