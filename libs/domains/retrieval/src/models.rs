use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// Reply sent when every relevant chunk has already been shown.
pub const EMPTY_REPLY: &str = "No new relevant information left in the book.";

/// Identifier of a stored chunk.
///
/// Deserializes from a JSON integer or from a string holding one (`"7"`,
/// surrounding whitespace ignored). Anything else is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ChunkId(pub i64);

impl<'de> Deserialize<'de> for ChunkId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ChunkIdVisitor;

        impl serde::de::Visitor<'_> for ChunkIdVisitor {
            type Value = ChunkId;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an integer chunk id or a string containing one")
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<ChunkId, E> {
                Ok(ChunkId(v))
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<ChunkId, E> {
                i64::try_from(v)
                    .map(ChunkId)
                    .map_err(|_| E::custom(format!("chunk id {v} is out of range")))
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<ChunkId, E> {
                v.trim()
                    .parse::<i64>()
                    .map(ChunkId)
                    .map_err(|_| E::custom(format!("invalid chunk id {v:?}")))
            }
        }

        deserializer.deserialize_any(ChunkIdVisitor)
    }
}

impl From<i64> for ChunkId {
    fn from(id: i64) -> Self {
        ChunkId(id)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<ChunkId>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<ChunkId>>::deserialize(deserializer)?.unwrap_or_default())
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("message must not be blank".into());
        return Err(err);
    }
    Ok(())
}

/// Body of `POST /chat`.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// The user's question
    #[validate(custom(function = "not_blank"))]
    #[schema(example = "Who is the narrator?")]
    pub message: String,

    /// Chunks already shown to this client; never returned again
    #[serde(default, deserialize_with = "null_as_empty")]
    #[schema(value_type = Vec<i64>, example = json!([1, 2, 3]))]
    pub used_chunk_ids: Vec<ChunkId>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>, used_chunk_ids: Vec<i64>) -> Self {
        Self {
            message: message.into(),
            used_chunk_ids: used_chunk_ids.into_iter().map(ChunkId).collect(),
        }
    }

    /// De-duplicated exclusion set, ascending.
    pub fn excluded_ids(&self) -> Vec<i64> {
        self.used_chunk_ids
            .iter()
            .map(|id| id.0)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Body returned by `POST /chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    /// Retrieved context, or the exhaustion message
    pub reply: String,
    /// Ids of the chunks in `reply`, in result order
    pub new_used_ids: Vec<i64>,
}

impl ChatResponse {
    pub fn exhausted() -> Self {
        Self {
            reply: EMPTY_REPLY.to_string(),
            new_used_ids: Vec::new(),
        }
    }
}

/// One row returned by a nearest-neighbor query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub id: i64,
    pub content: String,
}

/// A stored chunk together with its embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkRecord {
    pub id: i64,
    pub content: String,
    pub embedding: Vec<f32>,
}

impl ChunkRecord {
    pub fn new(id: i64, content: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            id,
            content: content.into(),
            embedding,
        }
    }
}

/// pgvector distance operator used for ordering.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    #[default]
    Cosine,
    L2,
    InnerProduct,
}

impl DistanceMetric {
    pub fn operator(&self) -> &'static str {
        match self {
            DistanceMetric::Cosine => "<=>",
            DistanceMetric::L2 => "<->",
            DistanceMetric::InnerProduct => "<#>",
        }
    }

    /// Same value pgvector computes for the operator (smaller is closer).
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f64 {
        let dot: f64 = a.iter().zip(b).map(|(x, y)| *x as f64 * *y as f64).sum();
        match self {
            DistanceMetric::Cosine => {
                let norm_a = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
                let norm_b = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
                if norm_a == 0.0 || norm_b == 0.0 {
                    f64::NAN
                } else {
                    1.0 - dot / (norm_a * norm_b)
                }
            }
            DistanceMetric::L2 => a
                .iter()
                .zip(b)
                .map(|(x, y)| (*x as f64 - *y as f64).powi(2))
                .sum::<f64>()
                .sqrt(),
            DistanceMetric::InnerProduct => -dot,
        }
    }
}

/// How retrieved chunks are rendered into `reply`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ReplyMode {
    /// Chunk contents joined by a newline
    #[default]
    Context,
    /// Contents packaged with the user message, ready for a chat model
    Prompt,
}

impl ReplyMode {
    pub fn render(&self, chunks: &[RetrievedChunk], message: &str) -> String {
        let context = chunks
            .iter()
            .map(|chunk| chunk.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        match self {
            ReplyMode::Context => context,
            ReplyMode::Prompt => format!(
                "Potentially useful information:\n{context}\n\nNew user message:\n{message}"
            ),
        }
    }
}
