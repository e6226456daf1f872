use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::{Agent, ChatMessage, Embedder, GenerateOptions, MlError};

/// HTTP client for the ML sidecar service.
///
/// The sidecar hosts the embedding model and proxies LLM providers
/// behind two JSON endpoints:
///
/// - `POST /embed` `{texts, model}` -> `{embeddings: [[f32]]}`
/// - `POST /generate` `{system_prompt, messages, model}` -> `{content}`
///
/// Transient failures (HTTP 429, 5xx, network errors) are retried with
/// exponential backoff: 1s, 2s, 4s, ... capped at 2^5. Other 4xx
/// responses fail immediately.
#[derive(Clone)]
pub struct RemoteMlClient {
    client: Client,
    base_url: String,
    embed_model: String,
    embed_dims: usize,
    max_retries: u32,
}

impl RemoteMlClient {
    pub fn new(
        base_url: &str,
        embed_model: &str,
        embed_dims: usize,
        max_retries: u32,
        timeout_secs: u64,
    ) -> Result<Self, MlError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            embed_model: embed_model.to_string(),
            embed_dims,
            max_retries,
        })
    }

    /// Probe the sidecar's readiness endpoint.
    pub async fn health_check(&self) -> Result<bool, MlError> {
        let url = format!("{}/health", self.base_url);
        let resp = self.client.get(&url).send().await?;
        Ok(resp.status().is_success())
    }

    /// POST with retry on rate limits, server errors, and network
    /// failures. Returns the first non-retryable response.
    async fn post_with_retry(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<reqwest::Response, MlError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tracing::debug!(attempt, delay_secs = delay.as_secs(), "retrying ML service call");
                tokio::time::sleep(delay).await;
            }

            match self.client.post(url).json(body).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status.as_u16() == 429 || status.is_server_error() {
                        let detail = resp.text().await.unwrap_or_default();
                        last_error = Some(MlError::Unavailable(format!("{status}: {detail}")));
                        continue;
                    }
                    return Ok(resp);
                }
                Err(e) => {
                    last_error = Some(e.into());
                    continue;
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| MlError::Unavailable("retries exhausted".to_string())))
    }
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    content: String,
}

#[async_trait]
impl Embedder for RemoteMlClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, MlError> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        if vectors.is_empty() {
            return Err(MlError::MalformedResponse(
                "empty embeddings array".to_string(),
            ));
        }
        Ok(vectors.remove(0))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, MlError> {
        tracing::debug!(batch_size = texts.len(), "requesting embeddings");
        let url = format!("{}/embed", self.base_url);
        let body = json!({
            "texts": texts,
            "model": self.embed_model,
        });

        let resp = self.post_with_retry(&url, &body).await?;
        if !resp.status().is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(MlError::Embed(detail));
        }

        let parsed: EmbedResponse = resp
            .json()
            .await
            .map_err(|e| MlError::MalformedResponse(e.to_string()))?;

        if parsed.embeddings.len() != texts.len() {
            return Err(MlError::MalformedResponse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                parsed.embeddings.len()
            )));
        }

        Ok(parsed.embeddings)
    }

    fn dimensions(&self) -> usize {
        self.embed_dims
    }
}

#[async_trait]
impl Agent for RemoteMlClient {
    async fn generate(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
        opts: &GenerateOptions,
    ) -> Result<String, MlError> {
        let url = format!("{}/generate", self.base_url);
        let body = json!({
            "system_prompt": system_prompt,
            "messages": messages,
            "model": opts.model,
        });

        let resp = self.post_with_retry(&url, &body).await?;
        if !resp.status().is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(MlError::Generate(detail));
        }

        let parsed: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| MlError::MalformedResponse(e.to_string()))?;

        Ok(parsed.content)
    }
}
