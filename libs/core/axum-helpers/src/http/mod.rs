//! HTTP middleware: CORS allow-list, origin guard and security headers.
//!
//! ```ignore
//! use axum_helpers::http::{AllowedOrigins, create_cors_layer, origin_guard, security_headers};
//!
//! let origins = AllowedOrigins::from_config(&cors_config)?;
//! let app = Router::new()
//!     .layer(axum::middleware::from_fn(security_headers))
//!     .layer(create_cors_layer(&origins))
//!     .layer(axum::middleware::from_fn_with_state(origins, origin_guard));
//! ```

pub mod cors;
pub mod security;

pub use cors::{AllowedOrigins, CORS_REJECTION_MESSAGE, create_cors_layer, origin_guard};
pub use security::security_headers;
