//! Extractive summaries and outline rendering.

use std::sync::LazyLock;

use regex::Regex;

use crate::{HeadingNode, SectionSummary};

static SENTENCE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^.!?]+[.!?]+").unwrap());

/// First `max_sentences` sentences of `text`, joined by spaces.
///
/// A sentence is a maximal terminator-ended run. Text with no
/// terminator at all falls back to the whole trimmed input.
pub fn extract_sentences(text: &str, max_sentences: usize) -> String {
    let sentences: Vec<&str> = SENTENCE_RE
        .find_iter(text)
        .take(max_sentences)
        .map(|m| m.as_str().trim())
        .collect();

    if sentences.is_empty() {
        return text.trim().to_string();
    }

    sentences.join(" ")
}

/// Depth-first indented enumeration of the tree.
///
/// Each line is `"{indent}{number}. {title}"` where the indent is two
/// spaces per level above 1 and the number is the node's dotted 1-based
/// position among siblings (root `1`, its first child `1.1`). Nodes
/// deeper than `max_depth` are omitted.
pub fn render_outline(nodes: &[HeadingNode], max_depth: usize) -> String {
    let mut lines = Vec::new();
    walk_outline(nodes, &[], max_depth, &mut lines);
    lines.join("\n")
}

fn walk_outline(
    nodes: &[HeadingNode],
    path: &[usize],
    max_depth: usize,
    lines: &mut Vec<String>,
) {
    for (i, node) in nodes.iter().enumerate() {
        if node.level as usize > max_depth {
            continue;
        }

        let mut numbered = path.to_vec();
        numbered.push(i + 1);
        let number = numbered
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(".");
        let indent = "  ".repeat((node.level.max(1) - 1) as usize);

        lines.push(format!("{indent}{number}. {}", node.title));
        walk_outline(&node.children, &numbered, max_depth, lines);
    }
}

/// Extractive summary per shallowest-level section.
///
/// Only root sections at the minimum level present among the roots get
/// a summary; deeper structure is covered by the outline.
pub fn section_summaries(
    text: &str,
    nodes: &[HeadingNode],
    max_sentences: usize,
) -> Vec<SectionSummary> {
    let Some(min_level) = nodes.iter().map(|n| n.level).min() else {
        return Vec::new();
    };

    nodes
        .iter()
        .filter(|n| n.level == min_level)
        .map(|n| {
            let body = &text[n.start_offset..n.end_offset.min(text.len())];
            SectionSummary {
                title: n.title.clone(),
                summary: extract_sentences(body, max_sentences),
            }
        })
        .collect()
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
    fn test_extract_sentences_takes_first_n() {
        let text = "One. Two! Three? Four.";
        assert_eq!(extract_sentences(text, 2), "One. Two!");
        assert_eq!(extract_sentences(text, 10), "One. Two! Three? Four.");
    }

    #[test]
    fn test_extract_sentences_unterminated_fallback() {
        assert_eq!(
            extract_sentences("  a single unterminated fragment  ", 3),
            "a single unterminated fragment"
        );
    }

    #[test]
    fn test_extract_sentences_drops_trailing_fragment() {
        // The trailing fragment has no terminator and is not matched.
        assert_eq!(extract_sentences("Done. and then", 5), "Done.");
    }

    #[test]
    fn test_outline_numbering_and_indent() {
        let tree = vec![
            node(1, "Intro", 0, 50, vec![node(2, "Details", 20, 50, vec![])]),
            node(1, "Close", 50, 80, vec![]),
        ];
        let outline = render_outline(&tree, 6);
        assert_eq!(outline, "1. Intro\n  1.1. Details\n2. Close");
    }

    #[test]
    fn test_outline_depth_limit() {
        let tree = vec![node(
            1,
            "Top",
            0,
            10,
            vec![node(3, "Deep", 5, 10, vec![])],
        )];
        assert_eq!(render_outline(&tree, 2), "1. Top");
    }

    #[test]
    fn test_section_summaries_shallowest_only() {
        let text = "Alpha body. More alpha.\n\nBeta body. More beta.";
        let tree = vec![
            node(1, "Alpha", 0, 23, vec![node(2, "Sub", 12, 23, vec![])]),
            node(1, "Beta", 25, text.len(), vec![]),
        ];
        let summaries = section_summaries(text, &tree, 1);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].title, "Alpha");
        assert_eq!(summaries[0].summary, "Alpha body.");
        assert_eq!(summaries[1].summary, "Beta body.");
    }

    #[test]
    fn test_section_summaries_empty_forest() {
        assert!(section_summaries("text", &[], 1).is_empty());
    }
}
