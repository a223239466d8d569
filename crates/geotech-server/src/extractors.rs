//! Custom Axum extractors.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ApiError;

/// Request ID from `x-request-id` / `x-correlation-id`, or a fresh UUID.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for RequestId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get("x-request-id")
            .or_else(|| parts.headers.get("x-correlation-id"))
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map_or_else(|| uuid::Uuid::new_v4().to_string(), String::from);

        Ok(Self(id))
    }
}

/// JSON body extractor whose rejections use the API error shape.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> axum::extract::FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = axum::body::Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read request body: {e}")))?;

        let value: T = serde_json::from_slice(&bytes).map_err(|e| {
            debug!(error = %e, "JSON parse error");
            ApiError::bad_request(format!("Invalid JSON: {e}"))
        })?;

        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::FromRequest;
    use axum::http::{Request as HttpRequest, StatusCode};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Query {
        query: String,
    }

    #[tokio::test]
    async fn test_request_id_from_header() {
        let req = HttpRequest::builder()
            .header("x-request-id", "req-42")
            .body(())
            .unwrap();
        let (mut parts, _) = req.into_parts();
        let RequestId(id) = RequestId::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(id, "req-42");
    }

    #[tokio::test]
    async fn test_request_id_generated() {
        let (mut parts, _) = HttpRequest::builder().body(()).unwrap().into_parts();
        let RequestId(id) = RequestId::from_request_parts(&mut parts, &()).await.unwrap();
        assert!(uuid::Uuid::parse_str(&id).is_ok());
    }

    #[tokio::test]
    async fn test_json_body_rejects_missing_field() {
        let req = HttpRequest::builder()
            .body(axum::body::Body::from(r#"{"chat_history": ""}"#))
            .unwrap();
        let err = JsonBody::<Query>::from_request(req, &()).await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.contains("query"));
    }

    #[tokio::test]
    async fn test_json_body_parses() {
        let req = HttpRequest::builder()
            .body(axum::body::Body::from(r#"{"query": "hi"}"#))
            .unwrap();
        let JsonBody(body) = JsonBody::<Query>::from_request(req, &()).await.unwrap();
        assert_eq!(body.query, "hi");
    }
}
