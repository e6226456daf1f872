//! Headingless strategies: embedding-similarity topic segmentation and
//! the positional fallback.

use std::sync::LazyLock;

use regex::Regex;

use margin_ml::Embedder;

use crate::{HeadingNode, HierarchyError, HierarchyOptions};

static PARAGRAPH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*\n").unwrap());

/// A paragraph with its recovered document offsets.
#[derive(Debug, Clone)]
pub struct Paragraph {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

/// Split on blank lines and recover each paragraph's offsets with a
/// forward search cursor. The cursor, not offset arithmetic, is the
/// source of truth for positions.
pub fn split_paragraphs(text: &str) -> Vec<Paragraph> {
    let mut paragraphs = Vec::new();
    let mut cursor = 0;

    for part in PARAGRAPH_RE.split(text) {
        let trimmed = part.trim();
        if trimmed.is_empty() {
            continue;
        }

        let start = text[cursor..]
            .find(trimmed)
            .map(|pos| pos + cursor)
            .unwrap_or(cursor);
        let end = start + trimmed.len();
        cursor = end;

        paragraphs.push(Paragraph {
            text: trimmed.to_string(),
            start,
            end,
        });
    }

    paragraphs
}

/// Topic segmentation by cosine similarity between adjacent paragraphs.
///
/// A boundary opens wherever the similarity drops below the adaptive
/// threshold `mean - k * stdev` (population stdev, `k` from the
/// options). Sections smaller than `min_section_size` are absorbed into
/// the group before them by skipping the candidate boundary.
pub async fn segment_by_similarity(
    text: &str,
    embedder: &dyn Embedder,
    opts: &HierarchyOptions,
) -> Result<Vec<HeadingNode>, HierarchyError> {
    let paragraphs = split_paragraphs(text);

    if paragraphs.len() <= 1 {
        return Ok(vec![HeadingNode {
            level: 1,
            title: "Section 1 of 1".to_string(),
            start_offset: 0,
            end_offset: text.len(),
            children: Vec::new(),
        }]);
    }

    let texts: Vec<String> = paragraphs.iter().map(|p| p.text.clone()).collect();
    let vectors = embedder.embed_batch(&texts).await?;

    let similarities: Vec<f32> = (1..vectors.len())
        .map(|i| cosine_similarity(&vectors[i - 1], &vectors[i]))
        .collect();

    let mean = similarities.iter().sum::<f32>() / similarities.len() as f32;
    let variance = similarities
        .iter()
        .map(|s| (s - mean).powi(2))
        .sum::<f32>()
        / similarities.len() as f32;
    let threshold = mean - opts.similarity_threshold * variance.sqrt();

    let mut candidates = vec![0usize];
    for (i, similarity) in similarities.iter().enumerate() {
        if *similarity < threshold {
            candidates.push(i + 1);
        }
    }

    let boundaries = merge_tiny_sections(&candidates, &paragraphs, opts.min_section_size);

    tracing::debug!(
        paragraphs = paragraphs.len(),
        threshold,
        sections = boundaries.len(),
        "similarity segmentation complete"
    );

    let total = boundaries.len();
    let sections = boundaries
        .iter()
        .enumerate()
        .map(|(k, &start_para)| {
            let is_last = k + 1 == total;
            let end_offset = if is_last {
                text.len()
            } else {
                paragraphs[boundaries[k + 1] - 1].end
            };

            HeadingNode {
                level: 1,
                title: format!("Section {} of {}", k + 1, total),
                start_offset: paragraphs[start_para].start,
                end_offset,
                children: Vec::new(),
            }
        })
        .collect();

    Ok(sections)
}

/// Scan candidate boundaries left to right; a candidate whose would-be
/// previous section is under `min_section_size` chars of paragraph text
/// is dropped. Boundary 0 is always kept.
fn merge_tiny_sections(
    candidates: &[usize],
    paragraphs: &[Paragraph],
    min_section_size: usize,
) -> Vec<usize> {
    let mut kept = vec![0usize];

    for &candidate in &candidates[1..] {
        let previous = *kept.last().unwrap_or(&0);
        let span: usize = paragraphs[previous..candidate]
            .iter()
            .map(|p| p.text.len())
            .sum();

        if span < min_section_size {
            continue;
        }
        kept.push(candidate);
    }

    kept
}

/// Cosine similarity with a zero-magnitude guard.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
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

/// Slice the document into `clamp(1, min(5, ceil(len / 500)))` equal
/// character ranges, each a level-1 section.
pub fn positional_sections(text: &str) -> Vec<HeadingNode> {
    let char_count = text.chars().count();
    let count = char_count.div_ceil(500).clamp(1, 5);

    // Byte offset of every char boundary, plus the end of the text.
    let mut boundaries: Vec<usize> = text.char_indices().map(|(b, _)| b).collect();
    boundaries.push(text.len());

    (0..count)
        .map(|k| {
            let start_char = k * char_count / count;
            let end_char = if k + 1 == count {
                char_count
            } else {
                (k + 1) * char_count / count
            };

            HeadingNode {
                level: 1,
                title: format!("Section {} of {}", k + 1, count),
                start_offset: boundaries[start_char],
                end_offset: boundaries[end_char],
                children: Vec::new(),
            }
        })
        .collect()
}
