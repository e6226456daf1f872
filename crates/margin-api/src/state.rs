use std::sync::Arc;

use margin_common::config::AppConfig;
use margin_ml::{Embedder, RemoteMlClient};
use margin_store::{MemoryVectorStore, VectorStore, WeaviateStore};
use margin_sync::DocSyncManager;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub ml: Arc<RemoteMlClient>,
    pub store: Arc<dyn VectorStore>,
    pub sync: Arc<DocSyncManager>,
}

impl AppState {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let ml = Arc::new(RemoteMlClient::new(
            &config.ml_service_url,
            &config.embed_model,
            config.embed_dims,
            config.ml_max_retries,
            config.ml_timeout_secs,
        )?);
        tracing::info!("ML service client configured at {}", config.ml_service_url);

        let store: Arc<dyn VectorStore> = match config.vector_index.as_str() {
            "weaviate" => {
                tracing::info!("using weaviate vector index at {}", config.weaviate_url);
                Arc::new(WeaviateStore::new(&config.weaviate_url))
            }
            _ => {
                tracing::info!("using in-memory vector index");
                Arc::new(MemoryVectorStore::new())
            }
        };

        let embedder: Arc<dyn Embedder> = ml.clone();
        let sync = Arc::new(DocSyncManager::new(embedder, store.clone()));

        Ok(Self {
            config: Arc::new(config.clone()),
            ml,
            store,
            sync,
        })
    }
}
