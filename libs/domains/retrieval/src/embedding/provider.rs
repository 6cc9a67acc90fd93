use async_trait::async_trait;

use super::{EmbeddingOptions, EmbeddingResult};
use crate::error::RetrievalResult;

/// Turns text into vectors.
///
/// Implementations must return exactly one vector per input, in input order,
/// and fail when a vector's length differs from
/// [`EmbeddingOptions::expected_dimension`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Short provider name for logs
    fn name(&self) -> &'static str;

    async fn embed(&self, options: &EmbeddingOptions, text: &str)
    -> RetrievalResult<EmbeddingResult>;

    async fn embed_batch(
        &self,
        options: &EmbeddingOptions,
        texts: &[String],
    ) -> RetrievalResult<Vec<EmbeddingResult>>;
}
