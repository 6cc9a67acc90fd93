use axum::response::{IntoResponse, Response};
use axum_helpers::{AppError, ErrorCode};
use std::time::Duration;
use thiserror::Error;

/// Pipeline stage that exceeded its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum TimeoutStage {
    Embedding,
    Retrieval,
}

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    Store(String),

    #[error("{stage} timed out after {after:?}")]
    Timeout { stage: TimeoutStage, after: Duration },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type RetrievalResult<T> = Result<T, RetrievalError>;

impl From<reqwest::Error> for RetrievalError {
    fn from(err: reqwest::Error) -> Self {
        RetrievalError::Embedding(err.to_string())
    }
}

impl From<sea_orm::DbErr> for RetrievalError {
    fn from(err: sea_orm::DbErr) -> Self {
        RetrievalError::Store(err.to_string())
    }
}

impl From<core_config::ConfigError> for RetrievalError {
    fn from(err: core_config::ConfigError) -> Self {
        RetrievalError::Config(err.to_string())
    }
}

/// Client mistakes become 400s; everything else is a 500 with a generic body.
impl From<RetrievalError> for AppError {
    fn from(err: RetrievalError) -> Self {
        match err {
            RetrievalError::Validation(msg) => AppError::BadRequest(msg),
            RetrievalError::Embedding(msg) => AppError::upstream(ErrorCode::EmbeddingError, msg),
            RetrievalError::Store(msg) => AppError::upstream(ErrorCode::RetrievalError, msg),
            err @ RetrievalError::Timeout { .. } => {
                AppError::upstream(ErrorCode::UpstreamTimeout, err.to_string())
            }
            RetrievalError::Config(msg) => AppError::upstream(ErrorCode::ConfigurationError, msg),
            RetrievalError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for RetrievalError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}
