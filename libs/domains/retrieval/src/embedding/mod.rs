mod openai;
mod provider;

pub use openai::{OpenAIConfig, OpenAIProvider};
pub use provider::EmbeddingProvider;

#[cfg(test)]
pub use provider::MockEmbeddingProvider;

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::str::FromStr;

use crate::error::{RetrievalError, RetrievalResult};

/// Embedding model selection
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EmbeddingModel {
    /// OpenAI text-embedding-3-small (1536 dimensions)
    #[default]
    TextEmbedding3Small,
    /// OpenAI text-embedding-3-large (3072 dimensions)
    TextEmbedding3Large,
    /// OpenAI text-embedding-ada-002 (1536 dimensions, legacy)
    TextEmbeddingAda002,
    /// Any other model id understood by an OpenAI-compatible endpoint
    Other(String),
}

impl EmbeddingModel {
    pub fn model_name(&self) -> &str {
        match self {
            EmbeddingModel::TextEmbedding3Small => "text-embedding-3-small",
            EmbeddingModel::TextEmbedding3Large => "text-embedding-3-large",
            EmbeddingModel::TextEmbeddingAda002 => "text-embedding-ada-002",
            EmbeddingModel::Other(name) => name,
        }
    }

    /// Native output size, when known.
    pub fn default_dimension(&self) -> Option<u32> {
        match self {
            EmbeddingModel::TextEmbedding3Small | EmbeddingModel::TextEmbeddingAda002 => {
                Some(1536)
            }
            EmbeddingModel::TextEmbedding3Large => Some(3072),
            EmbeddingModel::Other(_) => None,
        }
    }

    /// Whether the model accepts the `dimensions` request parameter.
    pub fn supports_dimensions(&self) -> bool {
        !matches!(self, EmbeddingModel::TextEmbeddingAda002)
    }
}

impl FromStr for EmbeddingModel {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "text-embedding-3-small" => EmbeddingModel::TextEmbedding3Small,
            "text-embedding-3-large" => EmbeddingModel::TextEmbedding3Large,
            "text-embedding-ada-002" => EmbeddingModel::TextEmbeddingAda002,
            other => EmbeddingModel::Other(other.to_string()),
        })
    }
}

impl std::fmt::Display for EmbeddingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.model_name())
    }
}

/// Model plus optional output size for one embedding call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EmbeddingOptions {
    pub model: EmbeddingModel,
    /// Requested output size; also the size every vector is checked against
    pub dimensions: Option<u32>,
}

impl EmbeddingOptions {
    pub fn new(model: EmbeddingModel, dimensions: Option<u32>) -> Self {
        Self { model, dimensions }
    }

    pub fn expected_dimension(&self) -> Option<u32> {
        self.dimensions.or_else(|| self.model.default_dimension())
    }

    /// Reject empty vectors and vectors of the wrong length.
    pub fn check(&self, result: &EmbeddingResult) -> RetrievalResult<()> {
        if result.values.is_empty() {
            return Err(RetrievalError::Embedding("provider returned an empty vector".into()));
        }
        match self.expected_dimension() {
            Some(expected) if expected != result.dimension => Err(RetrievalError::Embedding(
                format!(
                    "expected {expected}-dimensional embedding from {}, got {}",
                    self.model, result.dimension
                ),
            )),
            _ => Ok(()),
        }
    }
}

/// Embedding result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingResult {
    pub values: Vec<f32>,
    pub dimension: u32,
    pub tokens_used: u32,
}

impl EmbeddingResult {
    pub fn new(values: Vec<f32>, tokens_used: u32) -> Self {
        Self {
            dimension: values.len() as u32,
            values,
            tokens_used,
        }
    }
}
