//! In-process vector store.
//!
//! Brute-force cosine scan over the stored records. Backs the default
//! `"memory"` config mode and the test suites; semantics match the
//! remote store (ascending distance, reset drops everything).

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{ChunkRecord, ScoredRecord, VectorStore, VectorStoreError};

#[derive(Default)]
pub struct MemoryVectorStore {
    records: RwLock<Vec<ChunkRecord>>,
}

impl MemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn insert(&self, mut records: Vec<ChunkRecord>) -> Result<(), VectorStoreError> {
        let mut stored = self.records.write().await;
        stored.append(&mut records);
        Ok(())
    }

    async fn vector_search(
        &self,
        query: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredRecord>, VectorStoreError> {
        let stored = self.records.read().await;

        let mut scored: Vec<ScoredRecord> = stored
            .iter()
            .map(|record| ScoredRecord {
                distance: 1.0 - cosine(query, &record.vector),
                record: record.clone(),
            })
            .collect();

        scored.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        scored.truncate(limit);

        Ok(scored)
    }

    async fn reset(&self) -> Result<(), VectorStoreError> {
        self.records.write().await.clear();
        Ok(())
    }

    async fn count(&self) -> Result<usize, VectorStoreError> {
        Ok(self.records.read().await.len())
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}
