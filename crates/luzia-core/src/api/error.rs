use reqwest::{Method, StatusCode};
use serde_json::Value;
use thiserror::Error;

use super::payload::Payload;

/// Errors produced by the data access layer.
///
/// `Clone` because a single coalesced response is handed to every caller
/// that joined it.
#[derive(Error, Debug, Clone)]
pub enum ApiError {
    /// The network call itself failed (offline, DNS, refused, transport timeout).
    #[error("Network error: {0}")]
    Transport(String),

    /// A response arrived with a non-2xx status.
    #[error("{message}")]
    Http {
        status: u16,
        message: String,
        detail: Option<Value>,
    },

    /// The call was aborted through its cancellation token.
    #[error("Request cancelled")]
    Cancelled,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// Build an HTTP status error with a normalized, human readable message.
    pub fn from_status(method: &Method, path: &str, status: StatusCode, payload: &Payload) -> Self {
        let detail = payload.detail().cloned();
        let fallback = format!("{} {} failed with status {}", method, path, status.as_u16());
        let message = detail
            .as_ref()
            .and_then(Self::message_from_detail)
            .unwrap_or(fallback);

        ApiError::Http {
            status: status.as_u16(),
            message,
            detail,
        }
    }

    /// Prefer a string `detail`, then the first `msg` of a validation array,
    /// then a `msg` on a detail object.
    fn message_from_detail(detail: &Value) -> Option<String> {
        match detail {
            Value::String(s) => Some(s.clone()),
            Value::Array(items) => items
                .first()
                .and_then(|first| first.get("msg"))
                .and_then(Value::as_str)
                .map(str::to_string),
            Value::Object(map) => map.get("msg").map(|msg| match msg {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            }),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ApiError::Cancelled)
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn error_for(body: Value) -> ApiError {
        ApiError::from_status(
            &Method::GET,
            "/dashboard/overview",
            StatusCode::UNPROCESSABLE_ENTITY,
            &Payload::Json(body),
        )
    }

    #[test]
    fn test_string_detail_is_the_message() {
        let err = error_for(json!({"detail": "Organização não encontrada"}));
        assert_eq!(err.to_string(), "Organização não encontrada");
        assert_eq!(err.status(), Some(422));
    }

    #[test]
    fn test_validation_array_uses_first_msg() {
        let err = error_for(json!({
            "detail": [
                {"loc": ["body", "email"], "msg": "field required"},
                {"loc": ["body", "password"], "msg": "too short"}
            ]
        }));
        assert_eq!(err.to_string(), "field required");
    }

    #[test]
    fn test_detail_object_with_msg() {
        let err = error_for(json!({"detail": {"msg": "bad filter"}}));
        assert_eq!(err.to_string(), "bad filter");
    }

    #[test]
    fn test_fallback_message() {
        let err = error_for(json!({"error": "nope"}));
        assert_eq!(err.to_string(), "GET /dashboard/overview failed with status 422");

        let err = ApiError::from_status(
            &Method::DELETE,
            "/organizacoes/1",
            StatusCode::INTERNAL_SERVER_ERROR,
            &Payload::Text("Internal Server Error".to_string()),
        );
        assert_eq!(err.to_string(), "DELETE /organizacoes/1 failed with status 500");
        assert!(matches!(err, ApiError::Http { detail: None, .. }));
    }

    #[test]
    fn test_empty_validation_array_falls_back() {
        let err = error_for(json!({"detail": []}));
        assert_eq!(err.to_string(), "GET /dashboard/overview failed with status 422");
        // Raw detail is kept even when it didn't produce the message
        assert!(matches!(err, ApiError::Http { detail: Some(Value::Array(_)), .. }));
    }

    #[test]
    fn test_classification_helpers() {
        let unauthorized = ApiError::from_status(
            &Method::GET,
            "/x",
            StatusCode::UNAUTHORIZED,
            &Payload::Json(json!({"detail": "Token expirado"})),
        );
        assert!(unauthorized.is_unauthorized());
        assert!(!unauthorized.is_transport());
        assert!(ApiError::Cancelled.is_cancelled());
        assert!(ApiError::Transport("offline".into()).is_transport());
        assert_eq!(ApiError::Transport("offline".into()).status(), None);
    }
}
