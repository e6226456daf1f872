//! Paragraph/sentence-aware segmentation with overlap and positional
//! indexing.
//!
//! The pipeline: split on blank lines, break oversized paragraphs at
//! sentence boundaries, merge tiny segments back together, prepend a
//! word-trimmed overlap from each segment's predecessor, then recover
//! every canonical segment's offsets with a forward search cursor.

use std::sync::LazyLock;

use regex::Regex;

use margin_common::hash::hash_text;

use crate::{Chunk, ChunkOptions};

static PARAGRAPH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*\n").unwrap());

// The regex crate has no look-behind; a sentence boundary is a
// terminator immediately followed by whitespace, and the split lands
// after the terminator.
static SENTENCE_BOUNDARY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]\s+").unwrap());

pub(crate) fn count_paragraphs(text: &str) -> usize {
    PARAGRAPH_RE
        .split(text)
        .filter(|p| !p.trim().is_empty())
        .count()
}

/// Split a document into chunks. Never fails; empty input yields no
/// chunks.
pub fn chunk_text(text: &str, opts: &ChunkOptions) -> Vec<Chunk> {
    let segments = segment(text, opts.max_chunk_size);
    assemble(text, &segments, opts)
}

/// Produce the canonical (non-overlapped) segments.
fn segment(text: &str, max_chunk_size: usize) -> Vec<String> {
    let mut pieces = Vec::new();

    for paragraph in PARAGRAPH_RE.split(text) {
        let trimmed = paragraph.trim();
        if trimmed.is_empty() {
            continue;
        }

        if trimmed.len() > max_chunk_size {
            pieces.extend(split_oversized(trimmed, max_chunk_size));
        } else {
            pieces.push(trimmed.to_string());
        }
    }

    merge_tiny(pieces, max_chunk_size)
}

/// Break an oversized paragraph at sentence boundaries, greedily
/// packing sentences into a buffer that flushes before it would exceed
/// the limit. A single terminator-free paragraph stays whole: the
/// buffer never flushes.
fn split_oversized(paragraph: &str, max_chunk_size: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut buffer = String::new();

    for sentence in split_sentences(paragraph) {
        if !buffer.is_empty() && buffer.len() + 1 + sentence.len() > max_chunk_size {
            pieces.push(std::mem::take(&mut buffer));
        }
        if buffer.is_empty() {
            buffer.push_str(sentence);
        } else {
            buffer.push(' ');
            buffer.push_str(sentence);
        }
    }

    if !buffer.is_empty() {
        pieces.push(buffer);
    }

    pieces
}

fn split_sentences(paragraph: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut cursor = 0;

    for boundary in SENTENCE_BOUNDARY_RE.find_iter(paragraph) {
        // The terminator (one byte) stays with the left sentence; the
        // whitespace run is consumed.
        let split_at = boundary.start() + 1;
        if split_at > cursor {
            sentences.push(&paragraph[cursor..split_at]);
        }
        cursor = boundary.end();
    }

    if cursor < paragraph.len() {
        sentences.push(&paragraph[cursor..]);
    }

    sentences
}

/// Pack consecutive small segments, joined with a blank line, while the
/// joined length stays within `max_chunk_size + 2`.
fn merge_tiny(pieces: Vec<String>, max_chunk_size: usize) -> Vec<String> {
    let mut merged = Vec::new();
    let mut buffer = String::new();

    for piece in pieces {
        if !buffer.is_empty() && buffer.len() + 2 + piece.len() > max_chunk_size + 2 {
            merged.push(std::mem::take(&mut buffer));
        }
        if buffer.is_empty() {
            buffer = piece;
        } else {
            buffer.push_str("\n\n");
            buffer.push_str(&piece);
        }
    }

    if !buffer.is_empty() {
        merged.push(buffer);
    }

    merged
}

/// Apply overlap, recover positions, and hash.
fn assemble(text: &str, segments: &[String], opts: &ChunkOptions) -> Vec<Chunk> {
    let mut chunks = Vec::with_capacity(segments.len());
    let mut search_from = 0;

    for (index, segment) in segments.iter().enumerate() {
        let chunk_text = if index == 0 || opts.overlap == 0 {
            segment.clone()
        } else {
            apply_overlap(&segments[index - 1], segment, opts.overlap)
        };

        // The cursor advances one char past each match start so forward
        // progress is guaranteed even for repeated segments.
        let (start, end) = match text[search_from..].find(segment.as_str()) {
            Some(pos) => {
                let start = search_from + pos;
                let first_char = segment.chars().next().map(char::len_utf8).unwrap_or(1);
                search_from = start + first_char;
                (start, start + segment.len())
            }
            None => (0, search_from),
        };

        chunks.push(Chunk {
            index,
            hash: hash_text(&chunk_text),
            text: chunk_text,
            start,
            end,
            section_title: None,
            section_path: None,
            context_prefix: None,
        });
    }

    chunks
}

/// Borrow the last `overlap` characters of the previous canonical
/// segment, trimmed at the first whitespace boundary, and join with a
/// single space.
fn apply_overlap(previous: &str, segment: &str, overlap: usize) -> String {
    let tail = tail_chars(previous, overlap);
    let trimmed = match tail.find(' ') {
        Some(pos) => &tail[pos + 1..],
        None => tail,
    };

    if trimmed.is_empty() {
        segment.to_string()
    } else {
        format!("{trimmed} {segment}")
    }
}

/// Last `n` characters of `s`, on a char boundary.
fn tail_chars(s: &str, n: usize) -> &str {
    let char_count = s.chars().count();
    if char_count <= n {
        return s;
    }
    s.char_indices()
        .nth(char_count - n)
        .map(|(byte, _)| &s[byte..])
        .unwrap_or(s)
}
