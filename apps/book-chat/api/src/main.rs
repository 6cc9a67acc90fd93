use axum_helpers::{AllowedOrigins, server::create_production_app};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_retrieval::{ChatService, OpenAIProvider, PgChunkRepository};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output (before any fallible operations)
    install_color_eyre();

    let config = Config::from_env()?;

    init_tracing(&config.environment);

    observability::init_metrics()
        .map_err(|e| eyre::eyre!("Failed to install metrics recorder: {}", e))?;

    let db = database::postgres::connect_from_config_with_retry(config.database.clone(), None)
        .await
        .map_err(|e| eyre::eyre!("PostgreSQL connection failed: {}", e))?;

    let provider = OpenAIProvider::new(config.openai.clone())?;
    let repository = PgChunkRepository::new(db.clone(), config.retrieval.table.clone());

    info!(
        table = %config.retrieval.table,
        top_k = config.retrieval.top_k,
        model = %config.retrieval.embedding.model,
        distance = %config.retrieval.distance,
        reply_mode = %config.retrieval.reply_mode,
        "Chat pipeline configured"
    );

    let chat = Arc::new(ChatService::new(
        repository,
        Arc::new(provider),
        config.retrieval.clone(),
    ));

    let state = AppState { config, db, chat };

    let origins = AllowedOrigins::from_config(&state.config.cors)
        .map_err(|e| eyre::eyre!("Invalid CORS_ALLOWED_ORIGIN: {}", e))?;

    let app = api::app(&state, &origins);

    info!("Starting book chat API with graceful shutdown (30s timeout)");

    let server_config = state.config.server.clone();
    let db = state.db.clone();

    create_production_app(
        app,
        &server_config,
        Duration::from_secs(30),
        async move {
            info!("Shutting down: closing database connections");
            match db.close().await {
                Ok(_) => info!("PostgreSQL connection closed successfully"),
                Err(e) => tracing::error!("Error closing PostgreSQL: {}", e),
            }
        },
    )
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Book chat API shutdown complete");
    Ok(())
}
