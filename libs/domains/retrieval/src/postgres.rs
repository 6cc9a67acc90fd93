use async_trait::async_trait;
use sea_orm::{ConnectionTrait, DatabaseConnection};
use tracing::debug;

use crate::error::{RetrievalError, RetrievalResult};
use crate::models::RetrievedChunk;
use crate::query::{RetrievalQuery, TableName};
use crate::repository::ChunkRepository;

/// pgvector-backed chunk store.
///
/// Expects a table with at least `id` (integer), `content` (text) and
/// `embedding` (vector) columns.
#[derive(Clone)]
pub struct PgChunkRepository {
    db: DatabaseConnection,
    table: TableName,
}

impl PgChunkRepository {
    pub fn new(db: DatabaseConnection, table: TableName) -> Self {
        Self { db, table }
    }

    pub fn table(&self) -> &TableName {
        &self.table
    }
}

#[async_trait]
impl ChunkRepository for PgChunkRepository {
    async fn nearest(&self, query: &RetrievalQuery) -> RetrievalResult<Vec<RetrievedChunk>> {
        let stmt = query.to_statement(&self.table);
        debug!(
            table = %self.table,
            limit = query.limit,
            excluded = query.excluded_ids.len(),
            "Running nearest-neighbor query"
        );

        let rows = self.db.query_all_raw(stmt).await?;

        rows.into_iter()
            .map(|row| -> RetrievalResult<RetrievedChunk> {
                Ok(RetrievedChunk {
                    id: row.try_get::<i64>("", "id")?,
                    content: row.try_get::<String>("", "content")?,
                })
            })
            .collect()
    }

    async fn ping(&self) -> RetrievalResult<()> {
        database::postgres::check_health(&self.db)
            .await
            .map_err(|e| RetrievalError::Store(e.to_string()))
    }
}
