pub mod memory;
pub mod weaviate;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use memory::MemoryVectorStore;
pub use weaviate::WeaviateStore;

/// A chunk row as stored in the vector index.
///
/// `chunk_hash` is the identity key used for diffing against the
/// document's current chunk set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkRecord {
    pub text: String,
    pub chunk_hash: String,
    pub chunk_index: usize,
    pub start: usize,
    pub end: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_prefix: Option<String>,
    pub vector: Vec<f32>,
}

/// A search hit: the record plus its distance to the query vector.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredRecord {
    #[serde(flatten)]
    pub record: ChunkRecord,
    #[serde(rename = "_distance")]
    pub distance: f32,
}

/// Vector index capability.
///
/// Search results ascend by distance. `reset` drops the table entirely;
/// the next insert re-establishes it.
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn insert(&self, records: Vec<ChunkRecord>) -> Result<(), VectorStoreError>;

    async fn vector_search(
        &self,
        query: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredRecord>, VectorStoreError>;

    async fn reset(&self) -> Result<(), VectorStoreError>;

    async fn count(&self) -> Result<usize, VectorStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum VectorStoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("insert failed: {0}")]
    Insert(String),
    #[error("query failed: {0}")]
    Query(String),
    #[error("reset failed: {0}")]
    Reset(String),
}
