use core_config::{ConfigError, FromEnv, env_or_default, env_parse, env_parse_optional};
use std::time::Duration;

use crate::embedding::{EmbeddingModel, EmbeddingOptions};
use crate::models::{DistanceMetric, ReplyMode};
use crate::query::{DEFAULT_SCHEMA, DEFAULT_TABLE, TableName};

pub const DEFAULT_TOP_K: u32 = 5;
pub const DEFAULT_EMBEDDING_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 10;

/// Tuning for the chat retrieval pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalConfig {
    pub table: TableName,
    /// Maximum chunks per reply, at least 1
    pub top_k: u32,
    pub distance: DistanceMetric,
    pub reply_mode: ReplyMode,
    pub embedding: EmbeddingOptions,
    pub embedding_timeout: Duration,
    pub query_timeout: Duration,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            table: TableName::default(),
            top_k: DEFAULT_TOP_K,
            distance: DistanceMetric::default(),
            reply_mode: ReplyMode::default(),
            embedding: EmbeddingOptions::default(),
            embedding_timeout: Duration::from_secs(DEFAULT_EMBEDDING_TIMEOUT_SECS),
            query_timeout: Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS),
        }
    }
}

impl RetrievalConfig {
    pub fn with_table(mut self, table: TableName) -> Self {
        self.table = table;
        self
    }

    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub fn with_reply_mode(mut self, reply_mode: ReplyMode) -> Self {
        self.reply_mode = reply_mode;
        self
    }

    pub fn with_embedding(mut self, embedding: EmbeddingOptions) -> Self {
        self.embedding = embedding;
        self
    }

    pub fn with_timeouts(mut self, embedding: Duration, query: Duration) -> Self {
        self.embedding_timeout = embedding;
        self.query_timeout = query;
        self
    }
}

impl FromEnv for RetrievalConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let schema = env_or_default("CHUNKS_SCHEMA", DEFAULT_SCHEMA);
        let table_name = env_or_default("CHUNKS_TABLE", DEFAULT_TABLE);
        let table = TableName::new(schema, table_name).map_err(|e| ConfigError::ParseError {
            key: "CHUNKS_TABLE".to_string(),
            details: e.to_string(),
        })?;

        let top_k: u32 = env_parse("RETRIEVAL_TOP_K", DEFAULT_TOP_K)?;
        if top_k == 0 {
            return Err(ConfigError::ParseError {
                key: "RETRIEVAL_TOP_K".to_string(),
                details: "must be at least 1".to_string(),
            });
        }

        let model: EmbeddingModel = env_parse("EMBEDDING_MODEL", EmbeddingModel::default())?;
        let dimensions = env_parse_optional::<u32>("EMBEDDING_DIMENSIONS")?;

        Ok(Self {
            table,
            top_k,
            distance: env_parse("RETRIEVAL_DISTANCE", DistanceMetric::default())?,
            reply_mode: env_parse("CHAT_REPLY_MODE", ReplyMode::default())?,
            embedding: EmbeddingOptions::new(model, dimensions),
            embedding_timeout: Duration::from_secs(env_parse(
                "EMBEDDING_TIMEOUT_SECS",
                DEFAULT_EMBEDDING_TIMEOUT_SECS,
            )?),
            query_timeout: Duration::from_secs(env_parse(
                "RETRIEVAL_QUERY_TIMEOUT_SECS",
                DEFAULT_QUERY_TIMEOUT_SECS,
            )?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: [&str; 10] = [
        "CHUNKS_SCHEMA",
        "CHUNKS_TABLE",
        "RETRIEVAL_TOP_K",
        "RETRIEVAL_DISTANCE",
        "CHAT_REPLY_MODE",
        "EMBEDDING_MODEL",
        "EMBEDDING_DIMENSIONS",
        "EMBEDDING_TIMEOUT_SECS",
        "RETRIEVAL_QUERY_TIMEOUT_SECS",
        "OPENAI_API_KEY",
    ];

    #[test]
    fn test_defaults_when_unset() {
        temp_env::with_vars_unset(VARS, || {
            let config = RetrievalConfig::from_env().unwrap();
            assert_eq!(config, RetrievalConfig::default());
            assert_eq!(config.table.to_string(), "public.book_chunks3");
            assert_eq!(config.top_k, 5);
            assert_eq!(config.embedding_timeout, Duration::from_secs(30));
            assert_eq!(config.query_timeout, Duration::from_secs(10));
            assert_eq!(config.embedding.model, EmbeddingModel::TextEmbedding3Small);
        });
    }

    #[test]
    fn test_overrides() {
        temp_env::with_vars(
            [
                ("CHUNKS_SCHEMA", Some("library")),
                ("CHUNKS_TABLE", Some("chapters")),
                ("RETRIEVAL_TOP_K", Some("3")),
                ("RETRIEVAL_DISTANCE", Some("l2")),
                ("CHAT_REPLY_MODE", Some("Prompt")),
                ("EMBEDDING_MODEL", Some("text-embedding-3-large")),
                ("EMBEDDING_DIMENSIONS", Some("256")),
                ("EMBEDDING_TIMEOUT_SECS", Some("12")),
                ("RETRIEVAL_QUERY_TIMEOUT_SECS", Some("2")),
            ],
            || {
                let config = RetrievalConfig::from_env().unwrap();
                assert_eq!(config.table.qualified(), "\"library\".\"chapters\"");
                assert_eq!(config.top_k, 3);
                assert_eq!(config.distance, DistanceMetric::L2);
                assert_eq!(config.reply_mode, ReplyMode::Prompt);
                assert_eq!(config.embedding.model, EmbeddingModel::TextEmbedding3Large);
                assert_eq!(config.embedding.dimensions, Some(256));
                assert_eq!(config.embedding_timeout, Duration::from_secs(12));
                assert_eq!(config.query_timeout, Duration::from_secs(2));
            },
        );
    }

    #[test]
    fn test_zero_top_k_is_rejected() {
        temp_env::with_var("RETRIEVAL_TOP_K", Some("0"), || {
            let err = RetrievalConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("RETRIEVAL_TOP_K"));
        });
    }

    #[test]
    fn test_oversized_top_k_is_rejected() {
        temp_env::with_var("RETRIEVAL_TOP_K", Some("18446744073709551615"), || {
            let err = RetrievalConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("RETRIEVAL_TOP_K"));
        });
    }

    #[test]
    fn test_bad_values_are_rejected() {
        temp_env::with_var("RETRIEVAL_DISTANCE", Some("manhattan"), || {
            assert!(RetrievalConfig::from_env().is_err());
        });
        temp_env::with_var("CHAT_REPLY_MODE", Some("summary"), || {
            assert!(RetrievalConfig::from_env().is_err());
        });
        temp_env::with_var("CHUNKS_TABLE", Some(" "), || {
            assert!(RetrievalConfig::from_env().is_err());
        });
    }

    #[test]
    fn test_builder_clamps_top_k() {
        assert_eq!(RetrievalConfig::default().with_top_k(0).top_k, 1);
    }
}
