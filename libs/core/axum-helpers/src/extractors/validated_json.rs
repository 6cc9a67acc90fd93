//! JSON extractor with automatic validation using the validator crate.

use crate::errors::AppError;
use axum::extract::{FromRequest, Json, Request};
use serde::de::DeserializeOwned;
use validator::Validate;

/// JSON extractor with automatic validation.
///
/// Body parse failures reject with [`AppError::JsonExtractorRejection`].
/// Syntax errors and missing content types keep axum's 4xx status; JSON of
/// the wrong shape (missing field, wrong type) becomes 400 `VALIDATION_ERROR`.
/// `validate()` failures reject with [`AppError::ValidationError`] (400,
/// per-field details).
///
/// # Example
/// ```ignore
/// #[derive(Deserialize, Validate)]
/// struct Ask {
///     #[validate(length(min = 1))]
///     message: String,
/// }
///
/// async fn ask(ValidatedJson(payload): ValidatedJson<Ask>) -> String {
///     payload.message
/// }
/// ```
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = Json::<T>::from_request(req, state).await?;
        data.validate()?;
        Ok(ValidatedJson(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        routing::post,
    };
    use http_body_util::BodyExt;
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Deserialize, Validate)]
    struct Ask {
        #[validate(length(min = 1, message = "must not be empty"))]
        message: String,
    }

    async fn echo(ValidatedJson(ask): ValidatedJson<Ask>) -> String {
        ask.message
    }

    fn app() -> Router {
        Router::new().route("/ask", post(echo))
    }

    async fn send(body: &'static str) -> (StatusCode, Vec<u8>) {
        let response = app()
            .oneshot(
                HttpRequest::builder()
                    .method("POST")
                    .uri("/ask")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, bytes.to_vec())
    }

    #[tokio::test]
    async fn test_valid_body_passes_through() {
        let (status, body) = send(r#"{"message":"hi"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"hi");
    }

    #[tokio::test]
    async fn test_validation_failure_is_400_with_details() {
        let (status, body) = send(r#"{"message":""}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(json["details"]["message"][0]["message"], "must not be empty");
    }

    #[tokio::test]
    async fn test_missing_field_is_validation_error() {
        let (status, body) = send(r#"{}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_wrong_type_is_validation_error() {
        let (status, body) = send(r#"{"message":42}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_malformed_json_is_client_error() {
        let (status, body) = send("{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "JSON_EXTRACTION");
    }
}
