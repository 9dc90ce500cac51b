//! Error types for autolist-ai HTTP handlers
//!
//! Agent and pricing failures inside an analysis are values carried by the
//! response; only request-level failures surface here.

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::types::AgentError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Malformed multipart upload (400)
    #[error("Invalid upload: {0}")]
    Multipart(#[from] MultipartError),

    /// Remote agent failed (502)
    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Multipart(ref err) => {
                (StatusCode::BAD_REQUEST, "MULTIPART_ERROR", err.body_text())
            }
            ApiError::Agent(ref err) => (StatusCode::BAD_GATEWAY, "AGENT_ERROR", err.to_string()),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let response = ApiError::BadRequest("no images".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = ApiError::from(AgentError::NotConfigured("no key".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
