pub mod remote;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use remote::RemoteMlClient;

/// A single message in an LLM conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Per-call generation options.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Model identifier passed through to the provider.
    pub model: Option<String>,
}

/// Text embedding capability.
///
/// `embed_batch` must preserve index alignment: `vectors[i]` corresponds
/// to `texts[i]`. Vectors are expected to be L2-normalized by the
/// backing model, though consumers tolerate non-normalized output.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, MlError>;

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, MlError>;

    /// Embedding vector dimensionality (e.g. 384).
    fn dimensions(&self) -> usize;
}

/// LLM generation capability.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Run one generation and return the raw text content.
    ///
    /// The content may arrive wrapped in a ```json fence; callers that
    /// expect structured output strip it themselves.
    async fn generate(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
        opts: &GenerateOptions,
    ) -> Result<String, MlError>;
}

#[derive(Debug, thiserror::Error)]
pub enum MlError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("ML service unavailable: {0}")]
    Unavailable(String),
    #[error("embedding failed: {0}")]
    Embed(String),
    #[error("generation failed: {0}")]
    Generate(String),
    #[error("malformed ML service response: {0}")]
    MalformedResponse(String),
}
