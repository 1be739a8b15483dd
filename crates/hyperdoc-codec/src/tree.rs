//! Block-tree traversal.
//!
//! All walks are iterative (explicit stack) and circuit-break at
//! [`MAX_TREE_DEPTH`], so a hostile or corrupt tree cannot blow the stack.

use std::collections::{BTreeSet, HashSet};

use hyperdoc_types::{Annotation, Block, BlockNode, HmId, QueryBlock};

use crate::MAX_TREE_DEPTH;

/// Pre-order depth-first walk yielding `(depth, node)`.
pub struct Walk<'a> {
    stack: Vec<(usize, &'a BlockNode)>,
    truncated: bool,
}

impl<'a> Walk<'a> {
    pub fn new(nodes: &'a [BlockNode]) -> Self {
        Self {
            stack: nodes.iter().rev().map(|n| (0, n)).collect(),
            truncated: false,
        }
    }
}

impl<'a> Iterator for Walk<'a> {
    type Item = (usize, &'a BlockNode);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;
        if depth + 1 < MAX_TREE_DEPTH {
            // Push children in reverse to maintain order
            self.stack
                .extend(node.children.iter().rev().map(|child| (depth + 1, child)));
        } else if !node.children.is_empty() && !self.truncated {
            self.truncated = true;
            tracing::warn!("block walk hit MAX_TREE_DEPTH ({MAX_TREE_DEPTH}), truncating");
        }
        Some((depth, node))
    }
}

pub fn walk(nodes: &[BlockNode]) -> Walk<'_> {
    Walk::new(nodes)
}

/// Find a node by block id anywhere in the tree.
pub fn find_block<'a>(nodes: &'a [BlockNode], block_id: &str) -> Option<&'a BlockNode> {
    walk(nodes)
        .map(|(_, node)| node)
        .find(|node| node.block.id() == block_id)
}

/// All Query blocks in the tree, in document order.
pub fn query_blocks(nodes: &[BlockNode]) -> Vec<&QueryBlock> {
    walk(nodes)
        .filter_map(|(_, node)| match &node.block {
            Block::Query(q) => Some(q),
            _ => None,
        })
        .collect()
}

/// Every hypermedia identifier the tree links to: Embed blocks plus Link and
/// Embed annotations. Non-hypermedia links are skipped. First occurrence
/// order, no duplicates.
pub fn references(nodes: &[BlockNode]) -> Vec<HmId> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for (_, node) in walk(nodes) {
        let block_link = match &node.block {
            Block::Embed(b) => Some(b.link.as_str()),
            _ => None,
        };
        let annotation_links = node.block.annotations().iter().filter_map(Annotation::link);
        for link in block_link.into_iter().chain(annotation_links) {
            if let Some(id) = HmId::parse(link)
                && seen.insert(id.to_url())
            {
                out.push(id);
            }
        }
    }
    out
}

/// Accounts mentioned in the tree: Embed annotations whose target is a bare
/// account (no path).
pub fn mentioned_accounts(nodes: &[BlockNode]) -> BTreeSet<String> {
    walk(nodes)
        .flat_map(|(_, node)| node.block.annotations())
        .filter_map(|annotation| match annotation {
            Annotation::Embed(l) => HmId::parse(&l.link),
            _ => None,
        })
        .filter(HmId::is_account)
        .map(|id| id.uid)
        .collect()
}

/// Drop trailing top-level empty paragraphs (the editor's cursor line).
pub fn trim_trailing_empty_blocks(nodes: &[BlockNode]) -> Vec<BlockNode> {
    let keep = nodes
        .iter()
        .rposition(|node| !(node.children.is_empty() && node.block.is_empty_paragraph()))
        .map_or(0, |i| i + 1);
    nodes[..keep].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyperdoc_types::{AnnotationKind, EmbedBlock, QueryAttributes, Spans, TextBlock};

    fn para(id: &str, text: &str) -> BlockNode {
        BlockNode::new(Block::Paragraph(TextBlock {
            id: id.into(),
            text: text.into(),
            ..Default::default()
        }))
    }

    fn para_with(id: &str, text: &str, annotations: Vec<Annotation>) -> BlockNode {
        BlockNode::new(Block::Paragraph(TextBlock {
            id: id.into(),
            text: text.into(),
            annotations,
            ..Default::default()
        }))
    }

    fn sample_tree() -> Vec<BlockNode> {
        vec![
            para("a0000000", "a").with_children(vec![
                para("a1000000", "a1"),
                para("a2000000", "a2").with_children(vec![para("a2100000", "a21")]),
            ]),
            para("b0000000", "b"),
        ]
    }

    // ── Walk ────────────────────────────────────────────────────────────

    #[test]
    fn test_walk_preorder() {
        let tree = sample_tree();
        let order: Vec<(usize, &str)> = walk(&tree).map(|(d, n)| (d, n.block.id())).collect();
        assert_eq!(order, vec![
            (0, "a0000000"),
            (1, "a1000000"),
            (1, "a2000000"),
            (2, "a2100000"),
            (0, "b0000000"),
        ]);
    }

    #[test]
    fn test_walk_truncates_deep_trees() {
        let mut node = para("leaf0000", "leaf");
        for i in 0..(MAX_TREE_DEPTH + 10) {
            node = para(&format!("n{i:07}"), "x").with_children(vec![node]);
        }
        let tree = vec![node];
        assert_eq!(walk(&tree).count(), MAX_TREE_DEPTH);
    }

    #[test]
    fn test_find_block() {
        let tree = sample_tree();
        assert_eq!(find_block(&tree, "a2100000").unwrap().block.text(), Some("a21"));
        assert!(find_block(&tree, "missing0").is_none());
    }

    #[test]
    fn test_query_blocks() {
        let mut tree = sample_tree();
        tree[0].children.push(BlockNode::new(Block::Query(QueryBlock {
            id: "query001".into(),
            revision: None,
            attributes: QueryAttributes::default(),
        })));
        let found = query_blocks(&tree);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "query001");
    }

    // ── Links ───────────────────────────────────────────────────────────

    #[test]
    fn test_references_and_mentions() {
        let tree = vec![
            para_with("p0000001", "hi \u{FFFC} see", vec![
                Annotation::new(AnnotationKind::Embed, Some("hm://z6Mkalice".into()), Spans::single(3, 4)),
                Annotation::new(AnnotationKind::Link, Some("https://web.example".into()), Spans::single(5, 8)),
            ]),
            BlockNode::new(Block::Embed(EmbedBlock {
                id: "e0000001".into(),
                link: "hm://z6Mkbob/notes".into(),
                ..Default::default()
            })),
            para_with("p0000002", "\u{FFFC}", vec![Annotation::new(
                AnnotationKind::Embed,
                Some("hm://z6Mkalice".into()),
                Spans::single(0, 1),
            )]),
        ];
        let refs: Vec<String> = references(&tree).iter().map(HmId::to_url).collect();
        assert_eq!(refs, vec!["hm://z6Mkalice", "hm://z6Mkbob/notes"]);

        let mentions = mentioned_accounts(&tree);
        assert_eq!(mentions.into_iter().collect::<Vec<_>>(), vec!["z6Mkalice"]);
    }

    #[test]
    fn test_document_embed_is_not_a_mention() {
        let tree = vec![para_with("p0000001", "\u{FFFC}", vec![Annotation::new(
            AnnotationKind::Embed,
            Some("hm://z6Mkalice/profile".into()),
            Spans::single(0, 1),
        )])];
        assert!(mentioned_accounts(&tree).is_empty());
    }

    // ── Trimming ────────────────────────────────────────────────────────

    #[test]
    fn test_trim_trailing_empty_blocks() {
        let tree = vec![para("p1", "keep"), para("p2", ""), para("p3", "keep"), para("p4", ""), para("p5", "")];
        let trimmed = trim_trailing_empty_blocks(&tree);
        let ids: Vec<&str> = trimmed.iter().map(|n| n.block.id()).collect();
        assert_eq!(ids, vec!["p1", "p2", "p3"]);
    }

    #[test]
    fn test_trim_keeps_empty_parent_with_children() {
        let tree = vec![para("p1", "").with_children(vec![para("c1", "child")])];
        assert_eq!(trim_trailing_empty_blocks(&tree).len(), 1);
        assert!(trim_trailing_empty_blocks(&[para("p1", "")]).is_empty());
    }
}
