//! Hierarchy-aware chunking.
//!
//! The heading tree is flattened to its leaf sections; each leaf's body
//! is segmented independently and the local offsets are translated back
//! into document coordinates. Chunk indices stay monotone across
//! section boundaries.

use margin_hierarchy::{build_context_prefix, HeadingNode, HierarchyMap};

use crate::{splitter, Chunk, ChunkOptions};

/// Split along leaf sections and annotate chunks with structural
/// metadata. Offsets are document-relative.
pub fn chunk_with_hierarchy(
    text: &str,
    hierarchy: &HierarchyMap,
    opts: &ChunkOptions,
) -> Vec<Chunk> {
    let mut leaves = Vec::new();
    collect_leaves(&hierarchy.headings, &mut leaves);

    let mut chunks = Vec::new();

    for leaf in leaves {
        let start = leaf.start_offset.min(text.len());
        let end = leaf.end_offset.min(text.len());
        let body = &text[start..end];

        let prefix = build_context_prefix(leaf.start_offset, &hierarchy.headings);
        let context_prefix = if prefix.is_empty() {
            None
        } else {
            Some(format!("[{prefix}] "))
        };
        let section_path = if prefix.is_empty() {
            None
        } else {
            Some(prefix)
        };

        for mut chunk in splitter::chunk_text(body, opts) {
            chunk.index = chunks.len();
            chunk.start += start;
            chunk.end += start;
            chunk.section_title = Some(leaf.title.clone());
            chunk.section_path = section_path.clone();
            chunk.context_prefix = context_prefix.clone();
            chunks.push(chunk);
        }
    }

    chunks
}

fn collect_leaves<'a>(nodes: &'a [HeadingNode], leaves: &mut Vec<&'a HeadingNode>) {
    for node in nodes {
        if node.children.is_empty() {
            leaves.push(node);
        } else {
            collect_leaves(&node.children, leaves);
        }
    }
}
