//! Gemini adapter tests against a mock HTTP server.

use geotech_core::{CompletionProvider, CompletionRequest, GatewayError};
use geotech_providers::{GoogleConfig, GoogleProvider};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATE_PATH: &str = "/models/gemini-1.5-flash:generateContent";

fn provider(server: &MockServer) -> GoogleProvider {
    GoogleProvider::new(
        GoogleConfig::google_ai("google", "test-key")
            .with_base_url(server.uri())
            .with_timeout(Duration::from_secs(5)),
    )
    .unwrap()
}

fn gemini_reply(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }],
        "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 5, "totalTokenCount": 15}
    })
}

#[tokio::test]
async fn test_complete_sends_key_header_and_returns_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "contents": [{"role": "user", "parts": [{"text": "What is glacial till?"}]}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply("Dense, overconsolidated soil.")))
        .expect(1)
        .mount(&server)
        .await;

    let text = provider(&server)
        .complete(&CompletionRequest::text("What is glacial till?"))
        .await
        .unwrap();
    assert_eq!(text, "Dense, overconsolidated soil.");
}

#[tokio::test]
async fn test_json_mode_sets_mime_type() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(body_partial_json(json!({
            "generationConfig": {"responseMimeType": "application/json"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply("{\"a\": 1}")))
        .expect(1)
        .mount(&server)
        .await;

    let text = provider(&server)
        .complete(&CompletionRequest::json("extract"))
        .await
        .unwrap();
    assert_eq!(text, "{\"a\": 1}");
}

#[tokio::test]
async fn test_invalid_key_maps_to_authentication() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": 400, "message": "API key not valid. Please pass a valid API key.", "status": "INVALID_ARGUMENT"}
        })))
        .mount(&server)
        .await;

    let err = provider(&server)
        .complete(&CompletionRequest::text("hi"))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Authentication { .. }));
}

#[tokio::test]
async fn test_rate_limit_carries_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("Retry-After", "12")
                .set_body_json(json!({"error": {"code": 429, "message": "Resource exhausted"}})),
        )
        .mount(&server)
        .await;

    let err = provider(&server)
        .complete(&CompletionRequest::text("hi"))
        .await
        .unwrap_err();
    assert_eq!(err.retry_after(), Some(Duration::from_secs(12)));
}

#[tokio::test]
async fn test_server_error_maps_to_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = provider(&server)
        .complete(&CompletionRequest::text("hi"))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Upstream { status: Some(500), .. }));
}

#[tokio::test]
async fn test_undecodable_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let err = provider(&server)
        .complete(&CompletionRequest::text("hi"))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::MalformedResponse { .. }));
}

#[tokio::test]
async fn test_blocked_prompt_is_empty_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"promptFeedback": {"blockReason": "SAFETY"}})),
        )
        .mount(&server)
        .await;

    let err = provider(&server)
        .complete(&CompletionRequest::text("hi"))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::EmptyResponse { .. }));
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let provider = GoogleProvider::new(
        GoogleConfig::google_ai("google", "k")
            .with_base_url(uri)
            .with_timeout(Duration::from_secs(2)),
    )
    .unwrap();
    let err = provider
        .complete(&CompletionRequest::text("hi"))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Network { .. }));
}

#[tokio::test]
async fn test_vertex_uses_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-1.5-flash:generateContent"))
        .and(header("authorization", "Bearer vertex-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply("ok")))
        .expect(1)
        .mount(&server)
        .await;

    let provider = GoogleProvider::new(
        GoogleConfig::vertex_ai("vertex", "proj", "us-central1", "vertex-token")
            .with_base_url(server.uri()),
    )
    .unwrap();
    assert_eq!(
        provider.complete(&CompletionRequest::text("hi")).await.unwrap(),
        "ok"
    );
}
