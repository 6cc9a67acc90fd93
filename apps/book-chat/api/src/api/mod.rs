use axum::{Router, middleware, routing::get};
use axum_helpers::{AllowedOrigins, server::health_router};
use observability::metrics_middleware;

use crate::openapi::ApiDoc;
use crate::state::AppState;

pub mod health;

/// Chat routes, merged at the root by `create_router` (`POST /chat`).
pub fn routes(state: &AppState) -> Router {
    domain_retrieval::router_with_shared(state.chat.clone())
}

/// Routes merged outside the origin guard:
/// `/ready` (chunk store check) and `/metrics` (Prometheus text).
pub fn ops_router(state: AppState) -> Router {
    Router::new()
        .route("/ready", get(health::ready_handler))
        .with_state(state)
        .route("/metrics", get(observability::metrics_handler))
}

/// Full application router.
///
/// - `POST /chat` plus docs, behind CORS and the origin guard
/// - `/health`: liveness with app name/version
/// - `/ready`: readiness, pings PostgreSQL
/// - `/metrics`: Prometheus text
pub fn app(state: &AppState, origins: &AllowedOrigins) -> Router {
    axum_helpers::create_router::<ApiDoc>(routes(state), origins)
        .merge(health_router(state.config.app))
        .merge(ops_router(state.clone()))
        .layer(middleware::from_fn(metrics_middleware))
}
