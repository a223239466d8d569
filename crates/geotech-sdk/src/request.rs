//! Request bodies.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Body of `POST /chat`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// The question.
    pub query: String,
    /// Rendered history; omitted to let the server use its transcript.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_history: Option<String>,
}

impl ChatRequest {
    /// A question answered against the server transcript.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            chat_history: None,
        }
    }

    /// Supply the history explicitly.
    #[must_use]
    pub fn with_history(mut self, history: impl Into<String>) -> Self {
        self.chat_history = Some(history.into());
        self
    }
}

/// Body of `POST /validate_parameters`, serialized as a JSON object whose
/// keys keep insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet(Vec<(String, f64)>);

impl ParameterSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.0.push((name.into(), value));
        self
    }

    /// Parameters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(name, value)| (name.as_str(), *value))
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl Serialize for ParameterSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
