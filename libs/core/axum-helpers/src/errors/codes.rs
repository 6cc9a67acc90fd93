//! Type-safe error codes used in client error bodies and in structured logs.
//!
//! Each code has a SCREAMING_SNAKE identifier, an integer for log filtering
//! and metrics, and a default message.
//!
//! ```rust
//! use axum_helpers::errors::ErrorCode;
//!
//! let code = ErrorCode::ValidationError;
//! assert_eq!(code.as_str(), "VALIDATION_ERROR");
//! assert_eq!(code.code(), 1001);
//! ```

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Client errors (1000s)
    /// Request validation failed
    ValidationError,

    /// Request body could not be parsed as the expected JSON
    JsonExtraction,

    /// Route does not exist
    NotFound,

    /// Request rejected by policy (e.g. disallowed browser origin)
    Forbidden,

    /// Malformed request that is not a validation failure
    BadRequest,

    // Server errors (1100s)
    /// An unexpected internal server error occurred
    InternalError,

    // Upstream errors (2000s)
    /// The embedding provider failed or returned an unusable vector
    EmbeddingError,

    /// The vector store query failed
    RetrievalError,

    /// An outbound call exceeded its deadline
    UpstreamTimeout,

    /// Server-side configuration is unusable for this request
    ConfigurationError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::JsonExtraction => "JSON_EXTRACTION",
            Self::NotFound => "NOT_FOUND",
            Self::Forbidden => "FORBIDDEN",
            Self::BadRequest => "BAD_REQUEST",
            Self::InternalError => "INTERNAL_ERROR",
            Self::EmbeddingError => "EMBEDDING_ERROR",
            Self::RetrievalError => "RETRIEVAL_ERROR",
            Self::UpstreamTimeout => "UPSTREAM_TIMEOUT",
            Self::ConfigurationError => "CONFIGURATION_ERROR",
        }
    }

    /// Integer code attached to log lines as `error_code`.
    ///
    /// - 1000-1099: client errors
    /// - 1100-1199: generic server errors
    /// - 2000-2099: upstream (embedding provider, vector store) errors
    pub fn code(&self) -> i32 {
        match self {
            Self::ValidationError => 1001,
            Self::JsonExtraction => 1003,
            Self::NotFound => 1004,
            Self::Forbidden => 1007,
            Self::BadRequest => 1010,
            Self::InternalError => 1101,
            Self::EmbeddingError => 2001,
            Self::RetrievalError => 2002,
            Self::UpstreamTimeout => 2003,
            Self::ConfigurationError => 2004,
        }
    }

    pub fn default_message(&self) -> &'static str {
        match self {
            Self::ValidationError => "Request validation failed",
            Self::JsonExtraction => "Failed to parse request body",
            Self::NotFound => "The requested resource was not found",
            Self::Forbidden => "Access forbidden",
            Self::BadRequest => "Bad request",
            Self::InternalError => "An internal server error occurred",
            Self::EmbeddingError => "Embedding provider error",
            Self::RetrievalError => "Vector store query failed",
            Self::UpstreamTimeout => "Upstream call timed out",
            Self::ConfigurationError => "Server configuration error",
        }
    }

    pub fn is_server_error(&self) -> bool {
        self.code() >= 1100
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
