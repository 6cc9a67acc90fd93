//! Application state management.
//!
//! The state holds the configuration, the PostgreSQL pool (closed on
//! shutdown) and the chat service shared with the `/chat` router.

use database::postgres::DatabaseConnection;
use domain_retrieval::{ChatService, PgChunkRepository};
use std::sync::Arc;

/// Shared application state; cloning copies only `Arc`s and pool handles.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded from environment variables
    pub config: crate::config::Config,
    /// PostgreSQL database connection pool
    pub db: DatabaseConnection,
    /// Chat pipeline over the pgvector chunk table
    pub chat: Arc<ChatService<PgChunkRepository>>,
}
