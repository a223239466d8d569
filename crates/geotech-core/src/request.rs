//! Completion request types.
//!
//! A request is a single rendered prompt plus a hint about the shape of the
//! text the caller expects back. Providers translate the hint into whatever
//! their API offers (Gemini: `responseMimeType`).

use serde::{Deserialize, Serialize};

/// Shape of the text the caller expects from the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    /// Free-form text.
    #[default]
    Text,
    /// A single JSON object.
    Json,
}

impl ResponseFormat {
    /// MIME type associated with the format.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Text => "text/plain",
            Self::Json => "application/json",
        }
    }
}

/// One prompt-in, text-out call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Fully rendered prompt.
    pub prompt: String,

    /// Expected response format.
    #[serde(default)]
    pub response_format: ResponseFormat,

    /// Per-request temperature override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Per-request output token limit override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

impl CompletionRequest {
    /// Plain-text request.
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            response_format: ResponseFormat::Text,
            temperature: None,
            max_output_tokens: None,
        }
    }

    /// Request expecting a JSON object back.
    pub fn json(prompt: impl Into<String>) -> Self {
        Self {
            response_format: ResponseFormat::Json,
            ..Self::text(prompt)
        }
    }

    /// Override the sampling temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Override the output token limit.
    #[must_use]
    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }

    /// Prompt length in characters, used for log fields.
    pub fn prompt_chars(&self) -> usize {
        self.prompt.chars().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_constructors() {
        let req = CompletionRequest::text("hello");
        assert_eq!(req.response_format, ResponseFormat::Text);
        assert!(req.temperature.is_none());

        let req = CompletionRequest::json("give me json")
            .with_temperature(0.2)
            .with_max_output_tokens(512);
        assert_eq!(req.response_format, ResponseFormat::Json);
        assert_eq!(req.temperature, Some(0.2));
        assert_eq!(req.max_output_tokens, Some(512));
        assert_eq!(req.response_format.mime_type(), "application/json");
    }

    #[test]
    fn test_request_deserialize_defaults() {
        let req: CompletionRequest = serde_json::from_str(r#"{"prompt":"p"}"#).unwrap();
        assert_eq!(req.response_format, ResponseFormat::Text);
        assert_eq!(req.prompt_chars(), 1);
    }
}
