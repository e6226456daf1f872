pub mod sections;
pub mod splitter;

use serde::{Deserialize, Serialize};

use margin_hierarchy::HierarchyMap;

pub use sections::chunk_with_hierarchy;
pub use splitter::chunk_text;

/// An ordered slice of a document with bit-exact provenance.
///
/// `start`/`end` are byte offsets of the non-overlapped canonical
/// segment in the source document, half-open. `text` may carry a
/// leading overlap prefix borrowed from the preceding segment, and
/// `hash` covers the overlapped form, so changing the overlap changes
/// the hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    /// Zero-based position among all chunks of the document.
    pub index: usize,
    pub text: String,
    pub start: usize,
    pub end: usize,
    /// SHA-256 hex of `text`.
    pub hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_title: Option<String>,
    /// Section path such as `"Chapter 1 > 1.2 Budget"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_path: Option<String>,
    /// Bracketed form of the path, ready to prepend to LLM prompts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_prefix: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChunkOptions {
    /// Upper bound per chunk after merging. The overlap prefix may push
    /// the final text length above this.
    pub max_chunk_size: usize,
    /// Characters borrowed from the previous canonical segment's tail.
    pub overlap: usize,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            max_chunk_size: 1000,
            overlap: 200,
        }
    }
}

/// Cheap whole-document statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStats {
    pub total_characters: usize,
    pub total_words: usize,
    pub total_paragraphs: usize,
}

/// Statistics plus chunks, optionally annotated with the hierarchy the
/// chunking ran under.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    #[serde(flatten)]
    pub stats: DocumentStats,
    pub chunks: Vec<Chunk>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hierarchy: Option<HierarchyMap>,
}

/// Count characters, whitespace-separated words, and non-empty
/// paragraphs. Pure; empty input yields all zeros.
pub fn analyze_text(text: &str) -> DocumentStats {
    DocumentStats {
        total_characters: text.chars().count(),
        total_words: text.split_whitespace().count(),
        total_paragraphs: splitter::count_paragraphs(text),
    }
}

/// Full analysis: stats plus chunks, hierarchy-aware when one is given.
pub fn analyze_document(
    text: &str,
    opts: &ChunkOptions,
    hierarchy: Option<&HierarchyMap>,
) -> AnalysisResult {
    let chunks = match hierarchy {
        Some(map) => chunk_with_hierarchy(text, map, opts),
        None => chunk_text(text, opts),
    };

    AnalysisResult {
        stats: analyze_text(text),
        chunks,
        hierarchy: hierarchy.cloned(),
    }
}

/// SHA-256 hex digest of the whole document.
pub fn hash_document(text: &str) -> String {
    margin_common::hash::hash_text(text)
}
