//! Weaviate-backed vector store.
//!
//! Chunk vectors live in a single `DocumentChunk` class with external
//! vectors (`vectorizer: none`). The class is created lazily on first
//! insert and dropped wholesale by `reset`, which matches the sync
//! manager's full-resync policy.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use uuid::Uuid;

use crate::{ChunkRecord, ScoredRecord, VectorStore, VectorStoreError};

const CHUNK_CLASS: &str = "DocumentChunk";

#[derive(Clone)]
pub struct WeaviateStore {
    client: Client,
    base_url: String,
}

impl WeaviateStore {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create the chunk class if it doesn't exist.
    async fn ensure_schema(&self) -> Result<(), VectorStoreError> {
        let url = format!("{}/v1/schema/{}", self.base_url, CHUNK_CLASS);
        let resp = self.client.get(&url).send().await?;
        if resp.status().is_success() {
            return Ok(());
        }

        let schema = json!({
            "class": CHUNK_CLASS,
            "description": "A positionally-anchored chunk of an analyzed document",
            "vectorizer": "none",
            "vectorIndexType": "hnsw",
            "vectorIndexConfig": { "distance": "cosine" },
            "properties": [
                { "name": "text", "dataType": ["text"], "tokenization": "word" },
                { "name": "chunkHash", "dataType": ["text"], "tokenization": "field", "indexFilterable": true },
                { "name": "chunkIndex", "dataType": ["int"] },
                { "name": "start", "dataType": ["int"] },
                { "name": "end", "dataType": ["int"] },
                { "name": "sectionTitle", "dataType": ["text"], "tokenization": "word" },
                { "name": "sectionPath", "dataType": ["text"], "tokenization": "field" },
                { "name": "contextPrefix", "dataType": ["text"], "tokenization": "field" }
            ]
        });

        let url = format!("{}/v1/schema", self.base_url);
        let resp = self.client.post(&url).json(&schema).send().await?;
        if !resp.status().is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(VectorStoreError::Insert(body));
        }

        tracing::info!(class = CHUNK_CLASS, "created weaviate chunk class");
        Ok(())
    }

    /// Probe Weaviate's readiness endpoint.
    pub async fn health_check(&self) -> Result<bool, VectorStoreError> {
        let url = format!("{}/v1/.well-known/ready", self.base_url);
        let resp = self.client.get(&url).send().await?;
        Ok(resp.status().is_success())
    }
}

#[async_trait]
impl VectorStore for WeaviateStore {
    async fn insert(&self, records: Vec<ChunkRecord>) -> Result<(), VectorStoreError> {
        if records.is_empty() {
            return Ok(());
        }
        self.ensure_schema().await?;

        let objects: Vec<_> = records
            .iter()
            .map(|record| {
                json!({
                    "class": CHUNK_CLASS,
                    "id": Uuid::new_v4().to_string(),
                    "vector": record.vector,
                    "properties": {
                        "text": record.text,
                        "chunkHash": record.chunk_hash,
                        "chunkIndex": record.chunk_index,
                        "start": record.start,
                        "end": record.end,
                        "sectionTitle": record.section_title,
                        "sectionPath": record.section_path,
                        "contextPrefix": record.context_prefix,
                    }
                })
            })
            .collect();

        let url = format!("{}/v1/batch/objects", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&json!({ "objects": objects }))
            .send()
            .await?;

        if !resp.status().is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(VectorStoreError::Insert(body));
        }

        Ok(())
    }

    async fn vector_search(
        &self,
        query: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredRecord>, VectorStoreError> {
        let vector_csv = query
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", ");

        let graphql = format!(
            r#"{{
                Get {{
                    {class}(
                        nearVector: {{ vector: [{vector}] }}
                        limit: {limit}
                    ) {{
                        text
                        chunkHash
                        chunkIndex
                        start
                        end
                        sectionTitle
                        sectionPath
                        contextPrefix
                        _additional {{ distance vector }}
                    }}
                }}
            }}"#,
            class = CHUNK_CLASS,
            vector = vector_csv,
            limit = limit,
        );

        let url = format!("{}/v1/graphql", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&json!({ "query": graphql }))
            .send()
            .await?;

        if !resp.status().is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(VectorStoreError::Query(body));
        }

        let body: serde_json::Value = resp.json().await?;
        let hits = body["data"]["Get"][CHUNK_CLASS]
            .as_array()
            .cloned()
            .unwrap_or_default();

        let results = hits
            .into_iter()
            .filter_map(|hit| {
                let distance = hit["_additional"]["distance"].as_f64()? as f32;
                let vector = hit["_additional"]["vector"]
                    .as_array()
                    .map(|values| {
                        values
                            .iter()
                            .filter_map(|v| v.as_f64().map(|f| f as f32))
                            .collect()
                    })
                    .unwrap_or_default();

                Some(ScoredRecord {
                    distance,
                    record: ChunkRecord {
                        text: hit["text"].as_str().unwrap_or_default().to_string(),
                        chunk_hash: hit["chunkHash"].as_str().unwrap_or_default().to_string(),
                        chunk_index: hit["chunkIndex"].as_u64().unwrap_or(0) as usize,
                        start: hit["start"].as_u64().unwrap_or(0) as usize,
                        end: hit["end"].as_u64().unwrap_or(0) as usize,
                        section_title: hit["sectionTitle"].as_str().map(String::from),
                        section_path: hit["sectionPath"].as_str().map(String::from),
                        context_prefix: hit["contextPrefix"].as_str().map(String::from),
                        vector,
                    },
                })
            })
            .collect();

        Ok(results)
    }

    async fn reset(&self) -> Result<(), VectorStoreError> {
        let url = format!("{}/v1/schema/{}", self.base_url, CHUNK_CLASS);
        let resp = self.client.delete(&url).send().await?;

        // Dropping a class that was never created is fine.
        if !resp.status().is_success() && resp.status().as_u16() != 404 {
            let body = resp.text().await.unwrap_or_default();
            return Err(VectorStoreError::Reset(body));
        }

        tracing::debug!(class = CHUNK_CLASS, "dropped weaviate chunk class");
        Ok(())
    }

    async fn count(&self) -> Result<usize, VectorStoreError> {
        let graphql = format!(
            r#"{{ Aggregate {{ {CHUNK_CLASS} {{ meta {{ count }} }} }} }}"#
        );

        let url = format!("{}/v1/graphql", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&json!({ "query": graphql }))
            .send()
            .await?;

        if !resp.status().is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(VectorStoreError::Query(body));
        }

        let body: serde_json::Value = resp.json().await?;
        let count = body["data"]["Aggregate"][CHUNK_CLASS][0]["meta"]["count"]
            .as_u64()
            .unwrap_or(0);

        Ok(count as usize)
    }
}
