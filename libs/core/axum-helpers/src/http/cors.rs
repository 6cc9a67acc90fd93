use crate::errors::AppError;
use axum::{
    extract::{Request, State},
    http::{HeaderValue, Method, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use core_config::cors::CorsConfig;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Message returned with the 403 produced by [`origin_guard`].
pub const CORS_REJECTION_MESSAGE: &str = "Not allowed by CORS";

/// Parsed allow-list shared by the CORS layer and the origin guard.
#[derive(Clone, Debug)]
pub struct AllowedOrigins(Arc<Vec<HeaderValue>>);

impl AllowedOrigins {
    pub fn from_config(config: &CorsConfig) -> Result<Self, header::InvalidHeaderValue> {
        let origins = config
            .allowed_origins
            .iter()
            .map(|origin| origin.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self(Arc::new(origins)))
    }

    pub fn contains(&self, origin: &HeaderValue) -> bool {
        self.0.iter().any(|allowed| allowed == origin)
    }

    pub fn as_slice(&self) -> &[HeaderValue] {
        &self.0
    }
}

/// Creates a CORS layer for the configured allow-list.
///
/// - Methods: GET, POST, OPTIONS
/// - Headers: Content-Type, Accept
/// - Credentials allowed
/// - 1 hour max age
pub fn create_cors_layer(origins: &AllowedOrigins) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins.as_slice().to_vec()))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}

/// Rejects browser requests from origins outside the allow-list.
///
/// Requests without an `Origin` header (curl, server-to-server, same-origin
/// navigations) pass through untouched.
pub async fn origin_guard(
    State(origins): State<AllowedOrigins>,
    request: Request,
    next: Next,
) -> Response {
    match request.headers().get(header::ORIGIN) {
        Some(origin) if !origins.contains(origin) => {
            tracing::warn!(origin = ?origin, "Rejected request from disallowed origin");
            AppError::Forbidden(CORS_REJECTION_MESSAGE.to_string()).into_response()
        }
        _ => next.run(request).await,
    }
}
