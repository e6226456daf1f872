pub mod headings;
pub mod segmentation;
pub mod summary;

use serde::{Deserialize, Serialize};

use margin_ml::{Embedder, MlError};

/// A node in the document's structural tree.
///
/// The offset range covers the section body including all descendants:
/// `end_offset` is the start of the next same-or-higher-level sibling,
/// or the document length. Offsets are byte offsets into the UTF-8
/// source, half-open, always on char boundaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadingNode {
    /// Heading depth, 1..=6.
    pub level: u8,
    pub title: String,
    pub start_offset: usize,
    pub end_offset: usize,
    /// Nested nodes of strictly greater level, in document order.
    pub children: Vec<HeadingNode>,
}

/// Which detector produced the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    #[serde(rename = "heading")]
    Heading,
    #[serde(rename = "embedding-similarity")]
    EmbeddingSimilarity,
    #[serde(rename = "positional")]
    Positional,
}

/// Extractive summary of one top-level section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionSummary {
    pub title: String,
    pub summary: String,
}

/// The full structural map of a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyMap {
    /// Root-level forest of sections.
    pub headings: Vec<HeadingNode>,
    /// Pretty-printed indented enumeration of the tree.
    pub outline: String,
    /// First sentences of the whole document (extractive).
    pub document_summary: String,
    /// One extractive summary per shallowest-level section.
    pub section_summaries: Vec<SectionSummary>,
    pub strategy: Strategy,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HierarchyOptions {
    /// Z-score multiplier applied to the similarity stdev, not an
    /// absolute cosine. The adaptive boundary threshold is
    /// `mean - similarity_threshold * stdev`.
    pub similarity_threshold: f32,
    /// Smallest permissible embedding-derived section, in characters.
    pub min_section_size: usize,
    pub doc_summary_max_sentences: usize,
    pub section_summary_max_sentences: usize,
    pub max_outline_depth: usize,
}

impl Default for HierarchyOptions {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.5,
            min_section_size: 200,
            doc_summary_max_sentences: 3,
            section_summary_max_sentences: 1,
            max_outline_depth: 6,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HierarchyError {
    #[error("embedder error: {0}")]
    Embedder(#[from] MlError),
}

/// Build the structural map for a document.
///
/// Strategy selection, in order: explicit headings win; otherwise an
/// embedding-similarity topic segmentation runs when an embedder is
/// available; otherwise the document is sliced positionally.
pub async fn extract_hierarchy(
    text: &str,
    embedder: Option<&dyn Embedder>,
    opts: &HierarchyOptions,
) -> Result<HierarchyMap, HierarchyError> {
    if text.trim().is_empty() {
        return Ok(HierarchyMap {
            headings: segmentation::positional_sections(text),
            outline: String::new(),
            document_summary: String::new(),
            section_summaries: Vec::new(),
            strategy: Strategy::Positional,
        });
    }

    let flat = headings::detect_headings(text);

    let (nodes, strategy) = if !flat.is_empty() {
        (headings::build_tree(flat, text.len()), Strategy::Heading)
    } else if let Some(embedder) = embedder {
        let nodes = segmentation::segment_by_similarity(text, embedder, opts).await?;
        (nodes, Strategy::EmbeddingSimilarity)
    } else {
        (segmentation::positional_sections(text), Strategy::Positional)
    };

    tracing::debug!(
        sections = nodes.len(),
        strategy = ?strategy,
        "extracted document hierarchy"
    );

    let outline = summary::render_outline(&nodes, opts.max_outline_depth);
    let document_summary = summary::extract_sentences(text, opts.doc_summary_max_sentences);
    let section_summaries =
        summary::section_summaries(text, &nodes, opts.section_summary_max_sentences);

    Ok(HierarchyMap {
        headings: nodes,
        outline,
        document_summary,
        section_summaries,
        strategy,
    })
}

/// Describe the section path containing `offset` as `"A > B > C"`.
///
/// Descends the tree collecting titles of nodes whose range contains
/// the offset. Returns an empty string when no section covers it.
pub fn build_context_prefix(offset: usize, nodes: &[HeadingNode]) -> String {
    let mut parts: Vec<&str> = Vec::new();
    let mut level = nodes;

    while let Some(node) = level
        .iter()
        .find(|n| n.start_offset <= offset && offset < n.end_offset)
    {
        parts.push(&node.title);
        level = &node.children;
    }

    parts.join(" > ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(level: u8, title: &str, start: usize, end: usize, children: Vec<HeadingNode>) -> HeadingNode {
        HeadingNode {
            level,
            title: title.to_string(),
            start_offset: start,
            end_offset: end,
            children,
        }
    }

    #[test]
    fn test_context_prefix_nested() {
        let tree = vec![node(
            1,
            "Chapter 1",
            0,
            100,
            vec![node(2, "1.2 Budget", 40, 100, vec![])],
        )];
        assert_eq!(build_context_prefix(50, &tree), "Chapter 1 > 1.2 Budget");
        assert_eq!(build_context_prefix(10, &tree), "Chapter 1");
    }

    #[test]
    fn test_context_prefix_past_all_sections() {
        let tree = vec![node(1, "Intro", 0, 20, vec![])];
        assert_eq!(build_context_prefix(25, &tree), "");
    }

    #[tokio::test]
    async fn test_empty_document_is_positional() {
        let map = extract_hierarchy("", None, &HierarchyOptions::default())
            .await
            .unwrap();
        assert_eq!(map.strategy, Strategy::Positional);
        assert_eq!(map.headings.len(), 1);
        assert_eq!(map.headings[0].start_offset, 0);
        assert_eq!(map.headings[0].end_offset, 0);
        assert!(map.outline.is_empty());
        assert!(map.document_summary.is_empty());
        assert!(map.section_summaries.is_empty());
    }

    #[tokio::test]
    async fn test_markdown_document_uses_heading_strategy() {
        let text = "# Intro\n\nHello world.\n\n## Details\n\nMore text.";
        let map = extract_hierarchy(text, None, &HierarchyOptions::default())
            .await
            .unwrap();

        assert_eq!(map.strategy, Strategy::Heading);
        assert_eq!(map.headings.len(), 1);
        assert_eq!(map.headings[0].title, "Intro");
        assert_eq!(map.headings[0].children[0].title, "Details");
        assert_eq!(map.outline, "1. Intro\n  1.1. Details");
        assert!(map.document_summary.contains("Hello world."));
        assert_eq!(map.section_summaries.len(), 1);
        assert_eq!(map.section_summaries[0].title, "Intro");
    }

    #[tokio::test]
    async fn test_plain_text_without_embedder_is_positional() {
        let text = "Just some flowing prose with no structure at all, going on for a bit.";
        let map = extract_hierarchy(text, None, &HierarchyOptions::default())
            .await
            .unwrap();

        assert_eq!(map.strategy, Strategy::Positional);
        assert_eq!(map.headings.len(), 1);
        assert_eq!(map.headings[0].end_offset, text.len());
        assert_eq!(map.headings[0].title, "Section 1 of 1");
    }

    #[test]
    fn test_strategy_serialization() {
        assert_eq!(
            serde_json::to_string(&Strategy::EmbeddingSimilarity).unwrap(),
            "\"embedding-similarity\""
        );
        assert_eq!(serde_json::to_string(&Strategy::Heading).unwrap(), "\"heading\"");
    }
}
