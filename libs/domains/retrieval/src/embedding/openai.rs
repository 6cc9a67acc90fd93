use async_trait::async_trait;
use core_config::{ConfigError, FromEnv, env_or_default, env_parse, env_required};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{EmbeddingOptions, EmbeddingProvider, EmbeddingResult};
use crate::error::{RetrievalError, RetrievalResult, TimeoutStage};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_EMBEDDING_TIMEOUT_SECS: u64 = 30;

/// OpenAI embedding provider configuration
#[derive(Clone)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub base_url: String,
    /// Whole-request timeout on the HTTP client
    pub timeout: Duration,
}

impl OpenAIConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_EMBEDDING_TIMEOUT_SECS),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn embeddings_url(&self) -> String {
        format!("{}/embeddings", self.base_url.trim_end_matches('/'))
    }
}

impl std::fmt::Debug for OpenAIConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Reads `OPENAI_API_KEY` (required), `OPENAI_BASE_URL` and
/// `EMBEDDING_TIMEOUT_SECS` (default 30).
impl FromEnv for OpenAIConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let api_key = env_required("OPENAI_API_KEY")?;
        let base_url = env_or_default("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL);
        let timeout_secs = env_parse("EMBEDDING_TIMEOUT_SECS", DEFAULT_EMBEDDING_TIMEOUT_SECS)?;

        Ok(Self {
            api_key,
            base_url,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// OpenAI embeddings provider
pub struct OpenAIProvider {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIProvider {
    pub fn new(config: OpenAIConfig) -> RetrievalResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RetrievalError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    pub fn from_env() -> RetrievalResult<Self> {
        Self::new(OpenAIConfig::from_env()?)
    }

    fn map_transport_error(&self, err: reqwest::Error) -> RetrievalError {
        if err.is_timeout() {
            RetrievalError::Timeout {
                stage: TimeoutStage::Embedding,
                after: self.config.timeout,
            }
        } else {
            err.into()
        }
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
    #[serde(default)]
    usage: EmbeddingUsage,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[derive(Debug, Default, Deserialize)]
struct EmbeddingUsage {
    total_tokens: u32,
}

#[async_trait]
impl EmbeddingProvider for OpenAIProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn embed(
        &self,
        options: &EmbeddingOptions,
        text: &str,
    ) -> RetrievalResult<EmbeddingResult> {
        let results = self.embed_batch(options, &[text.to_string()]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| RetrievalError::Embedding("No embedding returned".to_string()))
    }

    async fn embed_batch(
        &self,
        options: &EmbeddingOptions,
        texts: &[String],
    ) -> RetrievalResult<Vec<EmbeddingResult>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let dimensions = options
            .dimensions
            .filter(|_| options.model.supports_dimensions());

        let request = EmbeddingRequest {
            model: options.model.model_name(),
            input: texts,
            dimensions,
        };

        let response = self
            .client
            .post(self.config.embeddings_url())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(RetrievalError::Embedding(format!(
                "OpenAI API error ({}): {}",
                status, error_text
            )));
        }

        let embedding_response: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        if embedding_response.data.len() != texts.len() {
            return Err(RetrievalError::Embedding(format!(
                "requested {} embeddings, received {}",
                texts.len(),
                embedding_response.data.len()
            )));
        }

        let mut data = embedding_response.data;
        data.sort_by_key(|d| d.index);

        let tokens_per_embedding = embedding_response.usage.total_tokens / texts.len() as u32;

        let results = data
            .into_iter()
            .map(|d| EmbeddingResult::new(d.embedding, tokens_per_embedding))
            .collect::<Vec<_>>();

        for result in &results {
            options.check(result)?;
        }

        debug!(
            model = %options.model,
            count = results.len(),
            tokens = embedding_response.usage.total_tokens,
            "Generated embeddings"
        );

        Ok(results)
    }
}
