use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::RetrievalResult;
use crate::models::{ChunkRecord, RetrievedChunk};
use crate::query::RetrievalQuery;

/// Read access to the chunk store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChunkRepository: Send + Sync {
    /// Up to `query.limit` chunks closest to `query.embedding`, skipping
    /// `query.excluded_ids`. Closest first; equal distances by ascending id.
    async fn nearest(&self, query: &RetrievalQuery) -> RetrievalResult<Vec<RetrievedChunk>>;

    /// Cheap liveness probe used by `/ready`.
    async fn ping(&self) -> RetrievalResult<()>;
}

/// In-memory chunk store for tests and local runs
#[derive(Clone, Default)]
pub struct InMemoryChunkRepository {
    chunks: Arc<RwLock<Vec<ChunkRecord>>>,
}

impl InMemoryChunkRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chunks(chunks: Vec<ChunkRecord>) -> Self {
        Self {
            chunks: Arc::new(RwLock::new(chunks)),
        }
    }

    /// Adds a chunk, replacing any existing chunk with the same id.
    pub async fn insert(&self, chunk: ChunkRecord) {
        let mut chunks = self.chunks.write().await;
        chunks.retain(|c| c.id != chunk.id);
        chunks.push(chunk);
    }

    pub async fn len(&self) -> usize {
        self.chunks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.chunks.read().await.is_empty()
    }
}

#[async_trait]
impl ChunkRepository for InMemoryChunkRepository {
    async fn nearest(&self, query: &RetrievalQuery) -> RetrievalResult<Vec<RetrievedChunk>> {
        let chunks = self.chunks.read().await;
        let excluded: HashSet<i64> = query.excluded_ids.iter().copied().collect();

        let mut scored: Vec<(f64, &ChunkRecord)> = chunks
            .iter()
            .filter(|c| !excluded.contains(&c.id))
            .map(|c| {
                let distance = query.distance.distance(&query.embedding, &c.embedding);
                // NaN sorts last, as in Postgres
                let distance = if distance.is_nan() { f64::INFINITY } else { distance };
                (distance, c)
            })
            .collect();

        scored.sort_by(|(da, a), (db, b)| da.total_cmp(db).then(a.id.cmp(&b.id)));

        Ok(scored
            .into_iter()
            .take(query.limit as usize)
            .map(|(_, c)| RetrievedChunk {
                id: c.id,
                content: c.content.clone(),
            })
            .collect())
    }

    async fn ping(&self) -> RetrievalResult<()> {
        Ok(())
    }
}
