//! Line-oriented heading detection and tree assembly.
//!
//! Three recognizers run per line, first match wins: markdown `#`
//! prefixes, ALL-CAPS title lines, and dotted numeric labels. Each
//! heading records the byte offset of the start of its source line.

use std::sync::LazyLock;

use regex::Regex;

use crate::HeadingNode;

static MARKDOWN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.+)$").unwrap());

// Dotted labels ("1.1 Nested", "1.2. Budget") may omit the trailing
// punctuation; bare numbers require it so prose like "10 items left"
// is not a heading.
static NUMERIC_DOTTED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+(?:\.\d+)+)[.)]?\s+(.+)$").unwrap());
static NUMERIC_SINGLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)[.)]\s+(.+)$").unwrap());

/// A detected heading before nesting.
#[derive(Debug, Clone)]
pub struct FlatHeading {
    pub level: u8,
    pub title: String,
    /// Byte offset of the start of the heading's source line.
    pub offset: usize,
}

/// Scan the document line by line and collect flat headings with offsets.
pub fn detect_headings(text: &str) -> Vec<FlatHeading> {
    let mut headings = Vec::new();
    let mut offset = 0;

    for line in text.split('\n') {
        let content = line.trim_end_matches('\r');
        if let Some((level, title)) = recognize_line(content) {
            headings.push(FlatHeading {
                level,
                title,
                offset,
            });
        }
        offset += line.len() + 1;
    }

    headings
}

fn recognize_line(line: &str) -> Option<(u8, String)> {
    if let Some(caps) = MARKDOWN_RE.captures(line) {
        let level = caps[1].len() as u8;
        return Some((level, caps[2].trim().to_string()));
    }

    if is_all_caps_heading(line) {
        return Some((1, title_case(line.trim())));
    }

    if let Some(caps) = NUMERIC_DOTTED_RE.captures(line) {
        let depth = caps[1].split('.').count().min(6) as u8;
        return Some((depth, caps[2].trim().to_string()));
    }

    if let Some(caps) = NUMERIC_SINGLE_RE.captures(line) {
        return Some((1, caps[2].trim().to_string()));
    }

    None
}

/// An ALL-CAPS line counts as a level-1 heading when it is at least 5
/// chars, uppercase-stable, begins with A-Z, has at least 3 words, and
/// is not a markdown/list/quote line.
fn is_all_caps_heading(line: &str) -> bool {
    let trimmed = line.trim();

    trimmed.len() >= 5
        && trimmed == trimmed.to_uppercase()
        && trimmed.starts_with(|c: char| c.is_ascii_uppercase())
        && trimmed.split_whitespace().count() >= 3
        && !trimmed.starts_with(['#', '-', '*', '>'])
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Nest a flat heading list into a forest.
///
/// A node's children are the contiguous headings after it with strictly
/// greater level, bounded by the next same-or-higher-level sibling. Its
/// `end_offset` is that sibling's offset, or the document length.
pub fn build_tree(flat: Vec<FlatHeading>, doc_len: usize) -> Vec<HeadingNode> {
    let end_offsets: Vec<usize> = (0..flat.len())
        .map(|i| {
            flat[i + 1..]
                .iter()
                .find(|h| h.level <= flat[i].level)
                .map(|h| h.offset)
                .unwrap_or(doc_len)
        })
        .collect();

    nest(&flat, &end_offsets)
}

fn nest(flat: &[FlatHeading], end_offsets: &[usize]) -> Vec<HeadingNode> {
    let mut nodes = Vec::new();
    let mut i = 0;

    while i < flat.len() {
        let current = &flat[i];
        let mut j = i + 1;
        while j < flat.len() && flat[j].level > current.level {
            j += 1;
        }

        nodes.push(HeadingNode {
            level: current.level,
            title: current.title.clone(),
            start_offset: current.offset,
            end_offset: end_offsets[i],
            children: nest(&flat[i + 1..j], &end_offsets[i + 1..j]),
        });

        i = j;
    }

    nodes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_headings_nest() {
        let text = "# Intro\n\nHello world.\n\n## Details\n\nMore text.";
        let flat = detect_headings(text);
        assert_eq!(flat.len(), 2);

        let tree = build_tree(flat, text.len());
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].title, "Intro");
        assert_eq!(tree[0].level, 1);
        assert_eq!(tree[0].end_offset, text.len());
        assert_eq!(tree[0].children.len(), 1);
        assert_eq!(tree[0].children[0].title, "Details");
        assert_eq!(tree[0].children[0].level, 2);
    }

    #[test]
    fn test_numeric_headings_depth() {
        let text = "1. First\n\ncontent\n\n1.1 Nested\n\nmore\n\n2. Second";
        let tree = build_tree(detect_headings(text), text.len());

        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].title, "First");
        assert_eq!(tree[0].level, 1);
        assert_eq!(tree[1].title, "Second");
        assert_eq!(tree[1].level, 1);
        assert_eq!(tree[0].children.len(), 1);
        assert_eq!(tree[0].children[0].title, "Nested");
        assert_eq!(tree[0].children[0].level, 2);
    }

    #[test]
    fn test_dotted_heading_with_terminator() {
        let flat = detect_headings("1.2. Budget\n\nnumbers");
        assert_eq!(flat.len(), 1);
        assert_eq!(flat[0].title, "Budget");
        assert_eq!(flat[0].level, 2);
    }

    #[test]
    fn test_bare_number_requires_terminator() {
        assert!(detect_headings("10 items left in the queue").is_empty());
        let flat = detect_headings("2) Second point");
        assert_eq!(flat.len(), 1);
        assert_eq!(flat[0].title, "Second point");
    }

    #[test]
    fn test_all_caps_heading_title_cased() {
        let flat = detect_headings("PROJECT STATUS REPORT\n\nAll systems nominal.");
        assert_eq!(flat.len(), 1);
        assert_eq!(flat[0].level, 1);
        assert_eq!(flat[0].title, "Project Status Report");
    }

    #[test]
    fn test_two_word_caps_is_not_heading() {
        assert!(detect_headings("STATUS REPORT").is_empty());
    }

    #[test]
    fn test_caps_list_line_is_not_heading() {
        assert!(detect_headings("- ALL CAPS LIST ITEM").is_empty());
        assert!(detect_headings("> ALL CAPS QUOTE LINE").is_empty());
    }

    #[test]
    fn test_heading_offsets_are_line_starts() {
        let text = "intro line\n# Heading\nbody";
        let flat = detect_headings(text);
        assert_eq!(flat.len(), 1);
        assert_eq!(flat[0].offset, 11);
        assert_eq!(&text[flat[0].offset..flat[0].offset + 9], "# Heading");
    }

    #[test]
    fn test_sibling_ranges_do_not_overlap() {
        let text = "# A\n\naaa\n\n## A1\n\nbbb\n\n# B\n\nccc";
        let tree = build_tree(detect_headings(text), text.len());
        assert_eq!(tree.len(), 2);
        assert!(tree[0].end_offset <= tree[1].start_offset);
        let child = &tree[0].children[0];
        assert!(child.start_offset >= tree[0].start_offset);
        assert!(child.end_offset <= tree[0].end_offset);
    }

    #[test]
    fn test_level_deeper_than_six_is_clamped() {
        let flat = detect_headings("1.2.3.4.5.6.7 Deep\n\nx");
        assert_eq!(flat[0].level, 6);
    }

    fn assert_tree_invariants(nodes: &[HeadingNode], doc_len: usize) {
        for node in nodes {
            assert!(node.start_offset < node.end_offset);
            assert!(node.end_offset <= doc_len);
            for child in &node.children {
                assert!(child.level > node.level);
                assert!(child.start_offset >= node.start_offset);
                assert!(child.end_offset <= node.end_offset);
            }
            assert_tree_invariants(&node.children, doc_len);
        }
    }

    #[test]
    fn test_tree_invariants_on_mixed_document() {
        let text = "# Top\n\nbody\n\n## Mid\n\nmore\n\n### Leaf\n\ndeep\n\n## Mid Two\n\ntail\n\n# Next\n\nend";
        let tree = build_tree(detect_headings(text), text.len());
        assert_eq!(tree.len(), 2);
        assert_tree_invariants(&tree, text.len());
    }
}
