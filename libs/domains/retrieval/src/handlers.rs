//! HTTP surface for the chat pipeline

use axum::{Json, Router, extract::State, routing::post};
use axum_helpers::{AppError, ErrorResponse, ValidatedJson};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::models::{ChatRequest, ChatResponse};
use crate::repository::ChunkRepository;
use crate::service::ChatService;

/// OpenAPI documentation for the chat API
#[derive(OpenApi)]
#[openapi(
    paths(chat),
    components(schemas(ChatRequest, ChatResponse, ErrorResponse)),
    tags(
        (name = "chat", description = "Retrieval over the book's chunk store")
    )
)]
pub struct ApiDoc;

/// Return the nearest chunks not yet shown to the caller
#[utoipa::path(
    post,
    path = "/chat",
    tag = "chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Retrieved context, or the exhaustion message", body = ChatResponse),
        (status = 400, description = "Blank message or malformed chunk ids", body = ErrorResponse),
        (status = 403, description = "Origin not allowed", body = ErrorResponse),
        (status = 422, description = "Body is not a chat request", body = ErrorResponse),
        (status = 500, description = "Server error", body = ErrorResponse)
    )
)]
pub async fn chat<R: ChunkRepository>(
    State(service): State<Arc<ChatService<R>>>,
    ValidatedJson(request): ValidatedJson<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let response = service.chat(request).await?;
    Ok(Json(response))
}

/// Create router for chat handlers; serves `POST /chat`.
pub fn router<R: ChunkRepository + 'static>(service: ChatService<R>) -> Router {
    router_with_shared(Arc::new(service))
}

/// Same as [`router`] for a service the caller also holds (e.g. for `/ready`).
pub fn router_with_shared<R: ChunkRepository + 'static>(service: Arc<ChatService<R>>) -> Router {
    Router::new()
        .route("/chat", post(chat::<R>))
        .with_state(service)
}
