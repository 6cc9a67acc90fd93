use std::sync::Arc;
use std::time::Duration;

use observability::{ChatMetrics, ChatOutcome, Stage, StageTimer};
use tracing::{debug, info, instrument, warn};

use crate::config::RetrievalConfig;
use crate::embedding::EmbeddingProvider;
use crate::error::{RetrievalError, RetrievalResult, TimeoutStage};
use crate::models::{ChatRequest, ChatResponse, RetrievedChunk};
use crate::query::RetrievalQuery;
use crate::repository::ChunkRepository;

/// Chat service: embed the message, fetch the nearest unseen chunks, render a reply.
///
/// Holds no per-client state; the exclusion set travels with every request.
pub struct ChatService<R: ChunkRepository> {
    repository: R,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    config: RetrievalConfig,
}

impl<R: ChunkRepository> ChatService<R> {
    pub fn new(
        repository: R,
        embedding_provider: Arc<dyn EmbeddingProvider>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            repository,
            embedding_provider,
            config,
        }
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Answer one chat turn.
    ///
    /// Returns at most `top_k` chunks, none of them in `used_chunk_ids`. When
    /// nothing is left the reply is [`crate::models::EMPTY_REPLY`] and
    /// `new_used_ids` is empty.
    #[instrument(
        skip_all,
        fields(
            excluded = request.used_chunk_ids.len(),
            provider = self.embedding_provider.name()
        )
    )]
    pub async fn chat(&self, request: ChatRequest) -> RetrievalResult<ChatResponse> {
        if request.message.trim().is_empty() {
            ChatMetrics::record_request(ChatOutcome::Invalid, 0);
            return Err(RetrievalError::Validation(
                "message must not be blank".to_string(),
            ));
        }

        match self.answer(&request).await {
            Ok(response) => {
                let outcome = if response.new_used_ids.is_empty() {
                    ChatOutcome::Exhausted
                } else {
                    ChatOutcome::Answered
                };
                ChatMetrics::record_request(outcome, response.new_used_ids.len());
                info!(
                    outcome = outcome.as_str(),
                    returned = response.new_used_ids.len(),
                    "Chat request served"
                );
                Ok(response)
            }
            Err(err) => {
                ChatMetrics::record_request(ChatOutcome::Failed, 0);
                warn!(error = %err, "Chat request failed");
                Err(err)
            }
        }
    }

    async fn answer(&self, request: &ChatRequest) -> RetrievalResult<ChatResponse> {
        let embedding = self.embed(&request.message).await?;

        let query = RetrievalQuery::new(
            embedding,
            request.excluded_ids(),
            self.config.top_k,
            self.config.distance,
        );
        let chunks = self.retrieve(&query).await?;

        if chunks.is_empty() {
            debug!("No unseen chunks left");
            return Ok(ChatResponse::exhausted());
        }

        Ok(ChatResponse {
            reply: self.config.reply_mode.render(&chunks, &request.message),
            new_used_ids: chunks.iter().map(|chunk| chunk.id).collect(),
        })
    }

    async fn embed(&self, message: &str) -> RetrievalResult<Vec<f32>> {
        let mut timer = StageTimer::start(Stage::Embedding);
        let result = with_deadline(
            TimeoutStage::Embedding,
            self.config.embedding_timeout,
            self.embedding_provider.embed(&self.config.embedding, message),
        )
        .await;

        let elapsed = timer.finish(result.is_ok());
        let embedding = result?;
        debug!(
            dimension = embedding.dimension,
            tokens = embedding.tokens_used,
            elapsed_ms = elapsed.as_millis() as u64,
            "Embedded message"
        );
        Ok(embedding.values)
    }

    async fn retrieve(&self, query: &RetrievalQuery) -> RetrievalResult<Vec<RetrievedChunk>> {
        let mut timer = StageTimer::start(Stage::Retrieval);
        let result = with_deadline(
            TimeoutStage::Retrieval,
            self.config.query_timeout,
            self.repository.nearest(query),
        )
        .await;

        let elapsed = timer.finish(result.is_ok());
        let chunks = result?;
        debug!(
            rows = chunks.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Retrieved chunks"
        );
        Ok(chunks)
    }

    /// Readiness probe for the chunk store.
    pub async fn ping(&self) -> RetrievalResult<()> {
        with_deadline(
            TimeoutStage::Retrieval,
            self.config.query_timeout,
            self.repository.ping(),
        )
        .await
    }
}

async fn with_deadline<T, F>(stage: TimeoutStage, after: Duration, fut: F) -> RetrievalResult<T>
where
    F: std::future::Future<Output = RetrievalResult<T>>,
{
    tokio::time::timeout(after, fut)
        .await
        .map_err(|_| RetrievalError::Timeout { stage, after })?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::{EmbeddingOptions, EmbeddingResult, MockEmbeddingProvider};
    use crate::models::{EMPTY_REPLY, ReplyMode};
    use crate::repository::MockChunkRepository;
    use async_trait::async_trait;

    fn chunk(id: i64, content: &str) -> RetrievedChunk {
        RetrievedChunk {
            id,
            content: content.to_string(),
        }
    }

    fn embedder() -> MockEmbeddingProvider {
        let mut provider = MockEmbeddingProvider::new();
        provider.expect_name().return_const("mock");
        provider
            .expect_embed()
            .returning(|_, _| Ok(EmbeddingResult::new(vec![0.1, 0.2, 0.3], 4)));
        provider
    }

    fn service(
        repo: MockChunkRepository,
        provider: MockEmbeddingProvider,
    ) -> ChatService<MockChunkRepository> {
        ChatService::new(repo, Arc::new(provider), RetrievalConfig::default())
    }

    #[tokio::test]
    async fn test_chat_joins_chunks_in_result_order() {
        let mut repo = MockChunkRepository::new();
        repo.expect_nearest()
            .withf(|q| {
                q.limit == 5 && q.excluded_ids.is_empty() && q.embedding == vec![0.1, 0.2, 0.3]
            })
            .times(1)
            .returning(|_| Ok(vec![chunk(3, "c"), chunk(1, "a"), chunk(2, "b")]));

        let response = service(repo, embedder())
            .chat(ChatRequest::new("who?", vec![]))
            .await
            .unwrap();

        assert_eq!(response.reply, "c\na\nb");
        assert_eq!(response.new_used_ids, vec![3, 1, 2]);
    }

    #[tokio::test]
    async fn test_chat_passes_deduplicated_exclusions() {
        let mut repo = MockChunkRepository::new();
        repo.expect_nearest()
            .withf(|q| q.excluded_ids == vec![1, 2, 5])
            .times(1)
            .returning(|_| Ok(vec![chunk(9, "fresh")]));

        let response = service(repo, embedder())
            .chat(ChatRequest::new("more", vec![5, 1, 2, 1]))
            .await
            .unwrap();

        assert_eq!(response.new_used_ids, vec![9]);
    }

    #[tokio::test]
    async fn test_chat_without_rows_is_exhausted() {
        let mut repo = MockChunkRepository::new();
        repo.expect_nearest().returning(|_| Ok(vec![]));

        let response = service(repo, embedder())
            .chat(ChatRequest::new("anything else?", vec![1, 2, 3, 4, 5]))
            .await
            .unwrap();

        assert_eq!(response.reply, EMPTY_REPLY);
        assert!(response.new_used_ids.is_empty());
    }

    #[tokio::test]
    async fn test_blank_message_makes_no_outbound_calls() {
        let mut provider = MockEmbeddingProvider::new();
        provider.expect_name().return_const("mock");
        provider.expect_embed().never();
        let mut repo = MockChunkRepository::new();
        repo.expect_nearest().never();

        let err = service(repo, provider)
            .chat(ChatRequest::new("  ", vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, RetrievalError::Validation(_)));
    }

    #[tokio::test]
    async fn test_embedding_failure_skips_retrieval() {
        let mut provider = MockEmbeddingProvider::new();
        provider.expect_name().return_const("mock");
        provider
            .expect_embed()
            .returning(|_, _| Err(RetrievalError::Embedding("401".into())));
        let mut repo = MockChunkRepository::new();
        repo.expect_nearest().never();

        let err = service(repo, provider)
            .chat(ChatRequest::new("q", vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, RetrievalError::Embedding(_)));
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let mut repo = MockChunkRepository::new();
        repo.expect_nearest()
            .returning(|_| Err(RetrievalError::Store("connection refused".into())));

        let err = service(repo, embedder())
            .chat(ChatRequest::new("q", vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, RetrievalError::Store(_)));
    }

    #[tokio::test]
    async fn test_config_drives_limit_and_reply_mode() {
        let mut repo = MockChunkRepository::new();
        repo.expect_nearest()
            .withf(|q| q.limit == 2)
            .returning(|_| Ok(vec![chunk(1, "one"), chunk(2, "two")]));

        let config = RetrievalConfig::default()
            .with_top_k(2)
            .with_reply_mode(ReplyMode::Prompt);
        let service = ChatService::new(repo, Arc::new(embedder()), config);

        let response = service.chat(ChatRequest::new("q?", vec![])).await.unwrap();
        assert_eq!(
            response.reply,
            "Potentially useful information:\none\ntwo\n\nNew user message:\nq?"
        );
    }

    struct SlowEmbedder;

    #[async_trait]
    impl EmbeddingProvider for SlowEmbedder {
        fn name(&self) -> &'static str {
            "slow"
        }

        async fn embed(&self, _: &EmbeddingOptions, _: &str) -> RetrievalResult<EmbeddingResult> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(EmbeddingResult::new(vec![1.0], 1))
        }

        async fn embed_batch(
            &self,
            _: &EmbeddingOptions,
            _: &[String],
        ) -> RetrievalResult<Vec<EmbeddingResult>> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn test_slow_embedding_times_out() {
        let mut repo = MockChunkRepository::new();
        repo.expect_nearest().never();

        let config = RetrievalConfig::default()
            .with_timeouts(Duration::from_millis(20), Duration::from_secs(10));
        let service = ChatService::new(repo, Arc::new(SlowEmbedder), config);

        let err = service.chat(ChatRequest::new("q", vec![])).await.unwrap_err();
        assert!(matches!(
            err,
            RetrievalError::Timeout {
                stage: TimeoutStage::Embedding,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_ping_delegates_to_repository() {
        let mut repo = MockChunkRepository::new();
        repo.expect_ping().times(1).returning(|| Ok(()));
        assert!(service(repo, embedder()).ping().await.is_ok());
    }
}
