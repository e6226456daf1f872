//! LLM-driven review orchestrators.
//!
//! Criticism and suggestion run a sliding window over the document's
//! chunks; each window is one generation call whose JSON array response
//! is fence-stripped and parsed. A chunk whose call or parse fails is
//! logged and skipped, so one bad window never aborts the document.
//! Summarization is map-reduce with a single-chunk fast path.

mod parse;
pub mod prompts;

use serde::{Deserialize, Serialize};

use margin_chunker::{chunk_text, ChunkOptions};
use margin_ml::{Agent, ChatMessage, GenerateOptions};

/// A quote-anchored criticism. The quote is whatever the model said,
/// verbatim; exact-match attachment is the consumer's job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Criticism {
    pub quote: String,
    pub criticism: String,
}

/// A quote-anchored replacement suggestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    pub quote: String,
    pub suggestion: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct ReviewOptions {
    /// Model identifier forwarded to the agent.
    pub model: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("summarization failed: {0}")]
    Summarization(String),
}

fn review_window() -> ChunkOptions {
    ChunkOptions {
        max_chunk_size: 1500,
        overlap: 200,
    }
}

fn summary_window() -> ChunkOptions {
    ChunkOptions {
        max_chunk_size: 10_000,
        overlap: 400,
    }
}

fn generate_options(opts: &ReviewOptions) -> GenerateOptions {
    GenerateOptions {
        model: opts.model.clone(),
    }
}

/// Collect criticisms across the document.
///
/// Per-chunk failures are skipped; the call always returns whatever
/// windows succeeded.
pub async fn criticize(text: &str, agent: &dyn Agent, opts: &ReviewOptions) -> Vec<Criticism> {
    run_windows(text, agent, opts, prompts::CRITICISM_SYSTEM).await
}

/// Collect replacement suggestions across the document.
pub async fn suggest_changes(
    text: &str,
    agent: &dyn Agent,
    opts: &ReviewOptions,
) -> Vec<Suggestion> {
    run_windows(text, agent, opts, prompts::SUGGESTION_SYSTEM).await
}

async fn run_windows<T: serde::de::DeserializeOwned>(
    text: &str,
    agent: &dyn Agent,
    opts: &ReviewOptions,
    system_prompt: &str,
) -> Vec<T> {
    let chunks = chunk_text(text, &review_window());
    let generate_opts = generate_options(opts);
    let mut results = Vec::new();

    for chunk in &chunks {
        let messages = [ChatMessage::user(&chunk.text)];
        match agent.generate(system_prompt, &messages, &generate_opts).await {
            Ok(response) => match parse::parse_json_array::<T>(&response) {
                Ok(mut items) => results.append(&mut items),
                Err(error) => {
                    tracing::warn!(chunk = chunk.index, %error, "discarding unparseable review response");
                }
            },
            Err(error) => {
                tracing::warn!(chunk = chunk.index, %error, "review generation failed for chunk");
            }
        }
    }

    tracing::debug!(windows = chunks.len(), results = results.len(), "review pass complete");
    results
}

/// Map-reduce summarization.
///
/// Zero chunks yield an empty summary. One chunk runs the REDUCE prompt
/// directly. Otherwise every chunk is MAP-summarized (failures skipped),
/// the parts are concatenated, and REDUCE runs over the combination.
/// All MAP calls failing, or the REDUCE call failing, is an error.
pub async fn summarize(
    text: &str,
    agent: &dyn Agent,
    opts: &ReviewOptions,
) -> Result<String, ReviewError> {
    let chunks = chunk_text(text, &summary_window());
    let generate_opts = generate_options(opts);

    if chunks.is_empty() {
        return Ok(String::new());
    }

    if chunks.len() == 1 {
        let messages = [ChatMessage::user(&chunks[0].text)];
        return agent
            .generate(prompts::SUMMARY_REDUCE_SYSTEM, &messages, &generate_opts)
            .await
            .map_err(|e| ReviewError::Summarization(e.to_string()));
    }

    let mut parts = Vec::new();
    for chunk in &chunks {
        let messages = [ChatMessage::user(&chunk.text)];
        match agent
            .generate(prompts::SUMMARY_MAP_SYSTEM, &messages, &generate_opts)
            .await
        {
            Ok(summary) => {
                parts.push(format!(
                    "--- Chunk {} Summary ---\n{}\n\n",
                    chunk.index + 1,
                    summary
                ));
            }
            Err(error) => {
                tracing::warn!(chunk = chunk.index, %error, "map summary failed for chunk");
            }
        }
    }

    if parts.is_empty() {
        return Err(ReviewError::Summarization(
            "every map summary failed".to_string(),
        ));
    }

    let combined = parts.concat();
    let messages = [ChatMessage::user(&combined)];
    agent
        .generate(prompts::SUMMARY_REDUCE_SYSTEM, &messages, &generate_opts)
        .await
        .map_err(|e| ReviewError::Summarization(e.to_string()))
}
