//! Retrieval Domain Library
//!
//! Stateless retrieval over a pgvector chunk table: embed the user's message,
//! return the nearest chunks the client has not seen yet, and let the client
//! carry the growing exclusion set between turns.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   ChatService   │  ← timeouts, exclusion set, reply rendering
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐     ┌──────────────────┐
//! │ ChunkRepository │     │ EmbeddingProvider│
//! │   (trait)       │     │    (trait)       │
//! └────────┬────────┘     └────────┬─────────┘
//!          │                       │
//! ┌────────▼────────┐     ┌────────▼─────────┐
//! │PgChunkRepository│     │  OpenAIProvider  │
//! │InMemoryChunkRepo│     └──────────────────┘
//! └─────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_retrieval::{
//!     ChatRequest, ChatService, OpenAIProvider, PgChunkRepository, RetrievalConfig,
//! };
//! use core_config::FromEnv;
//! use std::sync::Arc;
//!
//! # async fn example(db: sea_orm::DatabaseConnection) -> Result<(), Box<dyn std::error::Error>> {
//! let config = RetrievalConfig::from_env()?;
//! let repository = PgChunkRepository::new(db, config.table.clone());
//! let provider = Arc::new(OpenAIProvider::from_env()?);
//!
//! let service = ChatService::new(repository, provider, config);
//! let first = service.chat(ChatRequest::new("Who is the narrator?", vec![])).await?;
//! let next = service
//!     .chat(ChatRequest::new("Tell me more", first.new_used_ids.clone()))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod embedding;
pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod query;
pub mod repository;
pub mod service;

pub use config::RetrievalConfig;
pub use embedding::{
    EmbeddingModel, EmbeddingOptions, EmbeddingProvider, EmbeddingResult, OpenAIConfig,
    OpenAIProvider,
};
pub use error::{RetrievalError, RetrievalResult, TimeoutStage};
pub use handlers::{ApiDoc, router, router_with_shared};
pub use models::{
    ChatRequest, ChatResponse, ChunkId, ChunkRecord, DistanceMetric, EMPTY_REPLY, ReplyMode,
    RetrievedChunk,
};
pub use postgres::PgChunkRepository;
pub use query::{RetrievalQuery, TableName};
pub use repository::{ChunkRepository, InMemoryChunkRepository};
pub use service::ChatService;
