use serde::de::DeserializeOwned;
use serde_json::Value;

use super::ApiError;

/// A response body, parsed according to its declared content type.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
}

impl Payload {
    /// Parse a successful response body. JSON content types must parse.
    pub fn parse(content_type: Option<&str>, body: &[u8]) -> Result<Self, ApiError> {
        if !Self::is_json(content_type) {
            return Ok(Payload::Text(String::from_utf8_lossy(body).into_owned()));
        }
        if body.is_empty() {
            return Ok(Payload::Json(Value::Null));
        }
        serde_json::from_slice(body)
            .map(Payload::Json)
            .map_err(|e| ApiError::InvalidResponse(format!("malformed JSON body: {}", e)))
    }

    /// Parse an error response body. Never fails: error bodies are best effort.
    pub fn parse_lossy(content_type: Option<&str>, body: &[u8]) -> Self {
        Self::parse(content_type, body)
            .unwrap_or_else(|_| Payload::Text(String::from_utf8_lossy(body).into_owned()))
    }

    fn is_json(content_type: Option<&str>) -> bool {
        content_type
            .map(|ct| ct.to_ascii_lowercase().contains("application/json"))
            .unwrap_or(false)
    }

    /// The `detail` field of a JSON error payload, if any.
    pub fn detail(&self) -> Option<&Value> {
        match self {
            Payload::Json(value) => value.get("detail"),
            Payload::Text(_) => None,
        }
    }

    /// Deserialize into the caller's type. Text bodies deserialize as a JSON string.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        let result = match self {
            Payload::Json(value) => T::deserialize(value),
            Payload::Text(text) => T::deserialize(Value::String(text.clone())),
        };
        result.map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }
}
