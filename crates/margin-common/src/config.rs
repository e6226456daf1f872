use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_ml_service_url")]
    pub ml_service_url: String,
    /// Which vector index backs the sync manager: "memory" or "weaviate".
    #[serde(default = "default_vector_index")]
    pub vector_index: String,
    #[serde(default = "default_weaviate_url")]
    pub weaviate_url: String,
    #[serde(default = "default_embed_model")]
    pub embed_model: String,
    #[serde(default = "default_embed_dims")]
    pub embed_dims: usize,
    #[serde(default = "default_review_model")]
    pub review_model: String,
    #[serde(default = "default_ml_max_retries")]
    pub ml_max_retries: u32,
    #[serde(default = "default_ml_timeout_secs")]
    pub ml_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_ml_service_url() -> String {
    "http://localhost:50051".to_string()
}

fn default_vector_index() -> String {
    "memory".to_string()
}

fn default_weaviate_url() -> String {
    "http://localhost:8081".to_string()
}

fn default_embed_model() -> String {
    "all-MiniLM-L6-v2".to_string()
}

fn default_embed_dims() -> usize {
    384
}

fn default_review_model() -> String {
    "claude-sonnet-4-5-20250929".to_string()
}

fn default_ml_max_retries() -> u32 {
    3
}

fn default_ml_timeout_secs() -> u64 {
    30
}

impl AppConfig {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::default().separator("__"))
            .build()?
            .try_deserialize()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            ml_service_url: default_ml_service_url(),
            vector_index: default_vector_index(),
            weaviate_url: default_weaviate_url(),
            embed_model: default_embed_model(),
            embed_dims: default_embed_dims(),
            review_model: default_review_model(),
            ml_max_retries: default_ml_max_retries(),
            ml_timeout_secs: default_ml_timeout_secs(),
        }
    }
}
