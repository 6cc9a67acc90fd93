pub mod codes;
pub mod handlers;

pub use codes::ErrorCode;

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use validator::ValidationErrors;

/// Body returned for every server-side failure. Details never leave the process.
pub const SERVER_ERROR_MESSAGE: &str = "Server error";

/// Standard error body.
///
/// Client errors carry a message, a machine-readable code and optional
/// details. Server errors carry only `{"error": "Server error"}`.
///
/// ```json
/// { "error": "Request validation failed", "code": "VALIDATION_ERROR", "details": { ... } }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable message
    #[schema(example = "Server error")]
    pub error: String,
    /// Machine-readable identifier, present on client errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
    /// Structured details such as per-field validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn client(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: Some(code),
            details: None,
        }
    }

    pub fn server_error() -> Self {
        Self {
            error: SERVER_ERROR_MESSAGE.to_string(),
            code: None,
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Application error type that can be converted to HTTP responses.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
    #[error("JSON extraction error: {0}")]
    JsonExtractorRejection(#[from] JsonRejection),

    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationErrors),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    /// A dependency failed; `code` classifies it in logs.
    #[error("{code}: {message}")]
    Upstream { code: ErrorCode, message: String },

    #[error("Internal Server Error: {0}")]
    InternalServerError(String),
}

impl AppError {
    pub fn upstream(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Upstream {
            code,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            // Well-formed JSON with the wrong shape is a validation failure.
            AppError::JsonExtractorRejection(JsonRejection::JsonDataError(_)) => {
                StatusCode::BAD_REQUEST
            }
            AppError::JsonExtractorRejection(e) => e.status(),
            AppError::ValidationError(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Upstream { .. } | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            AppError::JsonExtractorRejection(JsonRejection::JsonDataError(e)) => {
                tracing::info!(
                    error_code = ErrorCode::ValidationError.code(),
                    "Request body has the wrong shape: {}",
                    e.body_text()
                );
                ErrorResponse::client(ErrorCode::ValidationError, e.body_text())
            }
            AppError::JsonExtractorRejection(e) => {
                tracing::warn!(
                    error_code = ErrorCode::JsonExtraction.code(),
                    "JSON extraction error: {:?}",
                    e
                );
                ErrorResponse::client(ErrorCode::JsonExtraction, e.body_text())
            }
            AppError::ValidationError(e) => {
                tracing::info!(
                    error_code = ErrorCode::ValidationError.code(),
                    "Validation error: {:?}",
                    e
                );
                ErrorResponse::client(
                    ErrorCode::ValidationError,
                    ErrorCode::ValidationError.default_message(),
                )
                .with_details(validation_details(&e))
            }
            AppError::BadRequest(msg) => {
                tracing::info!(error_code = ErrorCode::BadRequest.code(), "Bad request: {}", msg);
                ErrorResponse::client(ErrorCode::BadRequest, msg)
            }
            AppError::Forbidden(msg) => {
                tracing::info!(error_code = ErrorCode::Forbidden.code(), "Forbidden: {}", msg);
                ErrorResponse::client(ErrorCode::Forbidden, msg)
            }
            AppError::NotFound(msg) => {
                tracing::info!(error_code = ErrorCode::NotFound.code(), "Not found: {}", msg);
                ErrorResponse::client(ErrorCode::NotFound, msg)
            }
            AppError::Upstream { code, message } => {
                tracing::error!(error_code = code.code(), "{}: {}", code, message);
                ErrorResponse::server_error()
            }
            AppError::InternalServerError(msg) => {
                tracing::error!(
                    error_code = ErrorCode::InternalError.code(),
                    "Internal server error: {}",
                    msg
                );
                ErrorResponse::server_error()
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Flattens `validator` errors into `{ field: [{code, message, params}] }`.
pub fn validation_details(errors: &ValidationErrors) -> serde_json::Value {
    let details = errors
        .field_errors()
        .iter()
        .map(|(field, errors)| {
            let messages: Vec<serde_json::Value> = errors
                .iter()
                .map(|err| {
                    serde_json::json!({
                        "code": err.code,
                        "message": err.message,
                        "params": err.params,
                    })
                })
                .collect();
            (field.to_string(), serde_json::json!(messages))
        })
        .collect::<serde_json::Map<_, _>>();

    serde_json::Value::Object(details)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::{Value, json};

    async fn into_parts(err: AppError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_server_errors_hide_details() {
        let (status, body) =
            into_parts(AppError::InternalServerError("pool exhausted".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Server error" }));

        let (status, body) = into_parts(AppError::upstream(
            ErrorCode::EmbeddingError,
            "provider returned 401",
        ))
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Server error" }));
    }

    #[tokio::test]
    async fn test_bad_request_carries_message_and_code() {
        let (status, body) = into_parts(AppError::BadRequest("message is required".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "message is required");
        assert_eq!(body["code"], "BAD_REQUEST");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn test_wrong_json_shape_is_validation_error() {
        use axum::{body::Body, extract::FromRequest, http::Request};

        let request = Request::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"ids":["seven"]}"#))
            .unwrap();
        let rejection = axum::Json::<std::collections::HashMap<String, Vec<i64>>>::from_request(
            request,
            &(),
        )
        .await
        .unwrap_err();
        assert!(matches!(rejection, JsonRejection::JsonDataError(_)));

        let (status, body) = into_parts(AppError::from(rejection)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_forbidden_maps_to_403() {
        let (status, body) = into_parts(AppError::Forbidden("Not allowed by CORS".into())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Not allowed by CORS");
    }

    #[test]
    fn test_upstream_display_includes_code() {
        let err = AppError::upstream(ErrorCode::UpstreamTimeout, "embedding exceeded 30s");
        assert_eq!(err.to_string(), "UPSTREAM_TIMEOUT: embedding exceeded 30s");
    }
}
