//! Two-tier content-addressed synchronizer between document state and
//! the vector index.
//!
//! Tier 1 keys on the whole-document hash: an unchanged document costs
//! zero external calls. Tier 2 diffs the document's chunk-hash set
//! against what the store holds: pure additions embed only the new
//! chunks, while any deletion forces a full resync (the store exposes
//! no by-hash vector read, so surviving chunks must be re-embedded
//! before the reset-and-reinsert).
//!
//! Bookkeeping commits last: `stored_hashes` and `last_doc_hash` are
//! updated only after the store insert succeeds, so an error or
//! cancellation leaves the prior state intact and the next sync
//! re-derives the work.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use margin_chunker::{chunk_with_hierarchy, Chunk, ChunkOptions};
use margin_common::hash::hash_text;
use margin_hierarchy::{extract_hierarchy, HierarchyError, HierarchyMap, HierarchyOptions};
use margin_ml::{Embedder, MlError};
use margin_store::{ChunkRecord, ScoredRecord, VectorStore, VectorStoreError};

#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    pub chunk: ChunkOptions,
    pub hierarchy: HierarchyOptions,
}

#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// Maximum number of nearest-neighbor results.
    pub limit: usize,
    pub sync: SyncOptions,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            limit: 10,
            sync: SyncOptions::default(),
        }
    }
}

/// Search results plus the hierarchy the synced document produced.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub results: Vec<ScoredRecord>,
    pub hierarchy: Option<HierarchyMap>,
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("hierarchy extraction failed: {0}")]
    Hierarchy(#[from] HierarchyError),
    #[error("embedder error: {0}")]
    Embedder(#[from] MlError),
    #[error("vector store error: {0}")]
    Store(#[from] VectorStoreError),
}

#[derive(Default)]
struct SyncState {
    last_doc_hash: Option<String>,
    stored_hashes: HashSet<String>,
    last_hierarchy: Option<HierarchyMap>,
}

/// Process-wide synchronizer. All bookkeeping is in-memory; a restart
/// simply triggers a fresh first sync.
pub struct DocSyncManager {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    state: Mutex<SyncState>,
}

impl DocSyncManager {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> Self {
        Self {
            embedder,
            store,
            state: Mutex::new(SyncState::default()),
        }
    }

    /// Reconcile the vector index with `text`.
    ///
    /// Returns `false` when the document-hash fast path fired (no
    /// external calls), `true` when chunking ran.
    pub async fn sync_if_needed(&self, text: &str, opts: &SyncOptions) -> Result<bool, SyncError> {
        let mut state = self.state.lock().await;
        self.sync_locked(&mut state, text, opts).await
    }

    /// Sync, then run a nearest-neighbor search for `question`.
    ///
    /// The lock is held across the sync and the search, so results are
    /// consistent with `text` at call time.
    pub async fn query_with_sync(
        &self,
        text: &str,
        question: &str,
        opts: &QueryOptions,
    ) -> Result<QueryResponse, SyncError> {
        let mut state = self.state.lock().await;
        self.sync_locked(&mut state, text, &opts.sync).await?;

        let query_vector = self.embedder.embed(question).await?;
        let results = self.store.vector_search(&query_vector, opts.limit).await?;

        Ok(QueryResponse {
            results,
            hierarchy: state.last_hierarchy.clone(),
        })
    }

    /// Drop the vector table and clear all bookkeeping. The next sync
    /// behaves like the first ever.
    pub async fn reset(&self) -> Result<(), SyncError> {
        let mut state = self.state.lock().await;
        self.store.reset().await?;
        *state = SyncState::default();
        tracing::info!("sync manager reset");
        Ok(())
    }

    async fn sync_locked(
        &self,
        state: &mut SyncState,
        text: &str,
        opts: &SyncOptions,
    ) -> Result<bool, SyncError> {
        let doc_hash = hash_text(text);
        if state.last_doc_hash.as_deref() == Some(doc_hash.as_str()) {
            tracing::debug!("document unchanged, skipping sync");
            return Ok(false);
        }

        let hierarchy =
            extract_hierarchy(text, Some(self.embedder.as_ref()), &opts.hierarchy).await?;
        let chunks = chunk_with_hierarchy(text, &hierarchy, &opts.chunk);
        let current_hashes: HashSet<String> = chunks.iter().map(|c| c.hash.clone()).collect();

        let to_insert: Vec<&Chunk> = chunks
            .iter()
            .filter(|c| !state.stored_hashes.contains(&c.hash))
            .collect();
        let has_deletions = state
            .stored_hashes
            .iter()
            .any(|hash| !current_hashes.contains(hash));

        if has_deletions {
            // The store has no by-hash vector read, so surviving chunks
            // are re-embedded along with the new ones.
            let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
            let vectors = self.embedder.embed_batch(&texts).await?;
            let records = make_records(chunks.iter(), vectors);

            self.store.reset().await?;
            self.store.insert(records).await?;
            tracing::info!(chunk_count = chunks.len(), "full resync of vector index");
        } else if !to_insert.is_empty() {
            let texts: Vec<String> = to_insert.iter().map(|c| c.text.clone()).collect();
            let vectors = self.embedder.embed_batch(&texts).await?;
            let records = make_records(to_insert.iter().copied(), vectors);

            self.store.insert(records).await?;
            tracing::info!(inserted = to_insert.len(), "appended new chunks");
        } else {
            tracing::debug!("chunk set unchanged, no store mutation");
        }

        state.stored_hashes = current_hashes;
        state.last_doc_hash = Some(doc_hash);
        state.last_hierarchy = Some(hierarchy);

        Ok(true)
    }
}

fn make_records<'a>(
    chunks: impl Iterator<Item = &'a Chunk>,
    vectors: Vec<Vec<f32>>,
) -> Vec<ChunkRecord> {
    chunks
        .zip(vectors)
        .map(|(chunk, vector)| ChunkRecord {
            text: chunk.text.clone(),
            chunk_hash: chunk.hash.clone(),
            chunk_index: chunk.index,
            start: chunk.start,
            end: chunk.end,
            section_title: chunk.section_title.clone(),
            section_path: chunk.section_path.clone(),
            context_prefix: chunk.context_prefix.clone(),
            vector,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    /// Embedder that records every batch it is asked to embed.
    #[derive(Default)]
    struct CountingEmbedder {
        batches: StdMutex<Vec<Vec<String>>>,
        single_calls: AtomicUsize,
    }

    impl CountingEmbedder {
        fn batch_count(&self) -> usize {
            self.batches.lock().unwrap().len()
        }

        fn last_batch(&self) -> Vec<String> {
            self.batches.lock().unwrap().last().cloned().unwrap_or_default()
        }
    }

    #[async_trait]
    impl Embedder for CountingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, MlError> {
            self.single_calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![1.0, 0.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, MlError> {
            self.batches.lock().unwrap().push(texts.to_vec());
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    /// Store that records the order of mutating operations.
    #[derive(Default)]
    struct RecordingStore {
        inner: margin_store::MemoryVectorStore,
        ops: StdMutex<Vec<String>>,
    }

    impl RecordingStore {
        fn ops(&self) -> Vec<String> {
            self.ops.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl VectorStore for RecordingStore {
        async fn insert(&self, records: Vec<ChunkRecord>) -> Result<(), VectorStoreError> {
            self.ops
                .lock()
                .unwrap()
                .push(format!("insert:{}", records.len()));
            self.inner.insert(records).await
        }

        async fn vector_search(
            &self,
            query: &[f32],
            limit: usize,
        ) -> Result<Vec<ScoredRecord>, VectorStoreError> {
            self.inner.vector_search(query, limit).await
        }

        async fn reset(&self) -> Result<(), VectorStoreError> {
            self.ops.lock().unwrap().push("reset".to_string());
            self.inner.reset().await
        }

        async fn count(&self) -> Result<usize, VectorStoreError> {
            self.inner.count().await
        }
    }

    fn manager() -> (Arc<CountingEmbedder>, Arc<RecordingStore>, DocSyncManager) {
        let embedder = Arc::new(CountingEmbedder::default());
        let store = Arc::new(RecordingStore::default());
        let manager = DocSyncManager::new(embedder.clone(), store.clone());
        (embedder, store, manager)
    }

    fn small_chunks() -> SyncOptions {
        SyncOptions {
            chunk: ChunkOptions {
                max_chunk_size: 20,
                overlap: 0,
            },
            hierarchy: HierarchyOptions::default(),
        }
    }

    const DOC: &str = "# A\n\nFirst body.\n\n# B\n\nSecond body.";

    #[tokio::test]
    async fn test_second_sync_is_fast_path() {
        let (embedder, store, manager) = manager();
        let opts = small_chunks();

        assert!(manager.sync_if_needed(DOC, &opts).await.unwrap());
        let batches_after_first = embedder.batch_count();
        let ops_after_first = store.ops().len();

        // Identical text: zero external calls.
        assert!(!manager.sync_if_needed(DOC, &opts).await.unwrap());
        assert_eq!(embedder.batch_count(), batches_after_first);
        assert_eq!(store.ops().len(), ops_after_first);
    }

    #[tokio::test]
    async fn test_incremental_append_embeds_only_new_chunks() {
        let (embedder, store, manager) = manager();
        let opts = small_chunks();

        manager.sync_if_needed(DOC, &opts).await.unwrap();
        let count_before = store.inner.count().await.unwrap();

        let extended = format!("{DOC}\n\nNew paragraph.");
        manager.sync_if_needed(&extended, &opts).await.unwrap();

        // Exactly one more batch, containing only the new chunk's text.
        assert_eq!(embedder.batch_count(), 2);
        assert_eq!(embedder.last_batch(), vec!["New paragraph.".to_string()]);
        assert!(!store.ops().contains(&"reset".to_string()));
        assert_eq!(store.inner.count().await.unwrap(), count_before + 1);
    }

    #[tokio::test]
    async fn test_deletion_triggers_full_resync() {
        let (embedder, store, manager) = manager();
        let opts = small_chunks();

        manager.sync_if_needed(DOC, &opts).await.unwrap();

        // Dropping section B removes stored hashes.
        let shrunk = "# A\n\nFirst body.";
        manager.sync_if_needed(shrunk, &opts).await.unwrap();

        let ops = store.ops();
        let reset_pos = ops.iter().position(|op| op == "reset").unwrap();
        assert!(reset_pos > 0, "reset follows the first sync's insert");
        assert!(
            ops[reset_pos + 1].starts_with("insert:"),
            "all current chunks reinserted after the reset"
        );

        // The resync embedded every current chunk, not just new ones.
        let last = embedder.last_batch();
        assert_eq!(last.len(), store.inner.count().await.unwrap());
    }

    #[tokio::test]
    async fn test_unchanged_chunk_set_skips_store() {
        let (embedder, store, manager) = manager();
        let opts = small_chunks();

        manager.sync_if_needed("# A\n\nBody one.", &opts).await.unwrap();
        let ops_before = store.ops().len();
        let batches_before = embedder.batch_count();

        // Extra blank line between paragraphs: new doc hash, identical
        // chunk hashes.
        let worked = manager
            .sync_if_needed("# A\n\n\nBody one.", &opts)
            .await
            .unwrap();
        assert!(worked);
        assert_eq!(store.ops().len(), ops_before);
        assert_eq!(embedder.batch_count(), batches_before);

        // And the new hash is now the fast path.
        assert!(!manager
            .sync_if_needed("# A\n\n\nBody one.", &opts)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_reset_then_sync_behaves_like_first_sync() {
        let (embedder, store, manager) = manager();
        let opts = small_chunks();

        manager.sync_if_needed(DOC, &opts).await.unwrap();
        let first_batch = embedder.last_batch();

        manager.reset().await.unwrap();
        assert_eq!(store.inner.count().await.unwrap(), 0);

        assert!(manager.sync_if_needed(DOC, &opts).await.unwrap());
        assert_eq!(embedder.last_batch(), first_batch);
    }

    #[tokio::test]
    async fn test_query_with_sync_returns_hierarchy_and_results() {
        let (embedder, _store, manager) = manager();
        let opts = QueryOptions {
            limit: 2,
            sync: small_chunks(),
        };

        let response = manager
            .query_with_sync(DOC, "what is in section B?", &opts)
            .await
            .unwrap();

        assert!(response.hierarchy.is_some());
        assert!(!response.results.is_empty());
        assert!(response.results.len() <= 2);
        assert_eq!(embedder.single_calls.load(Ordering::SeqCst), 1);
    }
}
