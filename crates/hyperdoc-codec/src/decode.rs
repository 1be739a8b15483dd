//! Canonical blocks to editor blocks.
//!
//! Decoding walks the text one code point at a time and computes the set of
//! annotations active at each position. A change in that set closes the
//! current leaf. Link and Embed annotations select the leaf's container
//! rather than a style flag; two links with different targets are different
//! containers even when they touch.

use hyperdoc_types::{Annotation, AnnotationKind, Block, BlockNode, ChildrenType};

use crate::MAX_TREE_DEPTH;
use crate::editor::{EditorBlock, EditorBlockType, EditorProps, InlineContent, StyledText, Styles};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Container<'a> {
    Plain,
    Link(&'a str),
    Embed(&'a str),
}

#[derive(Debug)]
struct Leaf<'a> {
    styles: Styles,
    container: Container<'a>,
    start: usize,
    end: usize,
}

fn active_at<'a>(annotations: &'a [Annotation], pos: u32) -> (Styles, Container<'a>) {
    let mut styles = Styles::default();
    let mut container = Container::Plain;
    for annotation in annotations {
        if !annotation.spans().contains(pos) {
            continue;
        }
        match annotation {
            Annotation::Link(l) => {
                if container == Container::Plain {
                    container = Container::Link(&l.link);
                }
            }
            Annotation::Embed(l) => container = Container::Embed(&l.link),
            other => styles.set(other.kind()),
        }
    }
    (styles, container)
}

fn split_leaves<'a>(text: &str, annotations: &'a [Annotation]) -> Vec<Leaf<'a>> {
    let mut leaves = Vec::new();
    let mut open: Option<Leaf<'a>> = None;
    for (pos, (byte, _)) in text.char_indices().enumerate() {
        let (styles, container) = active_at(annotations, pos as u32);
        let unchanged = open
            .as_ref()
            .is_some_and(|leaf| leaf.styles == styles && leaf.container == container);
        if unchanged {
            continue;
        }
        if let Some(mut leaf) = open.take() {
            leaf.end = byte;
            leaves.push(leaf);
        }
        open = Some(Leaf {
            styles,
            container,
            start: byte,
            end: byte,
        });
    }
    if let Some(mut leaf) = open {
        leaf.end = text.len();
        leaves.push(leaf);
    }
    leaves
}

/// Rebuild nested inline content from text plus annotations.
///
/// Empty text decodes to a single empty text run.
pub fn decode_inline(text: &str, annotations: &[Annotation]) -> Vec<InlineContent> {
    let mut out: Vec<InlineContent> = Vec::new();
    for leaf in split_leaves(text, annotations) {
        let slice = &text[leaf.start..leaf.end];
        match leaf.container {
            Container::Embed(link) => {
                // one inline embed per placeholder, even when spans merged
                for _ in slice.chars() {
                    out.push(InlineContent::InlineEmbed {
                        link: link.to_string(),
                        styles: leaf.styles,
                    });
                }
            }
            Container::Link(href) => {
                let run = StyledText::styled(slice, leaf.styles);
                match out.last_mut() {
                    Some(InlineContent::Link { href: open, content }) if open.as_str() == href => {
                        content.push(run)
                    }
                    _ => out.push(InlineContent::Link {
                        href: href.to_string(),
                        content: vec![run],
                    }),
                }
            }
            Container::Plain => out.push(InlineContent::Text(StyledText::styled(slice, leaf.styles))),
        }
    }
    if out.is_empty() {
        out.push(InlineContent::Text(StyledText::default()));
    }
    out
}

fn with_children_type(mut props: EditorProps, children_type: Option<ChildrenType>) -> EditorProps {
    props.children_type = children_type.map(|c| c.as_str().to_string());
    props
}

/// Decode one block (children are not visited).
pub fn decode_block(block: &Block) -> EditorBlock {
    let props = EditorProps {
        revision: block.revision().map(str::to_string),
        ..Default::default()
    };
    let props = with_children_type(props, block.children_type());

    let (kind, props, content) = match block {
        Block::Paragraph(b) => (EditorBlockType::Paragraph, props, decode_inline(&b.text, &b.annotations)),
        Block::Heading(b) => (EditorBlockType::Heading, props, decode_inline(&b.text, &b.annotations)),
        Block::Math(b) => (EditorBlockType::Math, props, decode_inline(&b.text, &b.annotations)),
        Block::Code(b) => (
            EditorBlockType::CodeBlock,
            EditorProps {
                language: b.attributes.language.clone(),
                ..props
            },
            decode_inline(&b.text, &b.annotations),
        ),
        Block::Image(b) | Block::Video(b) => (
            if matches!(block, Block::Video(_)) {
                EditorBlockType::Video
            } else {
                EditorBlockType::Image
            },
            EditorProps {
                url: Some(b.link.clone()),
                width: b.attributes.width.map(|w| w.to_string()),
                name: b.attributes.name.clone(),
                ..props
            },
            decode_inline(&b.text, &b.annotations),
        ),
        Block::File(b) => (
            EditorBlockType::File,
            EditorProps {
                url: Some(b.link.clone()),
                name: b.attributes.name.clone(),
                size: b.attributes.size.map(|s| s.to_string()),
                ..props
            },
            Vec::new(),
        ),
        Block::Button(b) => (
            EditorBlockType::Button,
            EditorProps {
                url: Some(b.link.clone()),
                name: b.attributes.name.clone(),
                alignment: b.attributes.alignment.map(|a| a.as_str().to_string()),
                ..props
            },
            decode_inline(&b.text, &[]),
        ),
        Block::Embed(b) => (
            EditorBlockType::Embed,
            EditorProps {
                url: Some(b.link.clone()),
                view: b.attributes.view.map(|v| v.as_str().to_string()),
                ..props
            },
            Vec::new(),
        ),
        Block::WebEmbed(b) => (
            EditorBlockType::WebEmbed,
            EditorProps {
                url: Some(b.link.clone()),
                ..props
            },
            Vec::new(),
        ),
        Block::Query(b) => {
            let attrs = &b.attributes;
            let query = &attrs.query;
            (
                EditorBlockType::Query,
                EditorProps {
                    style: attrs.style.map(|s| s.as_str().to_string()),
                    column_count: attrs.column_count.map(|c| c.to_string()),
                    banner: Some(attrs.banner.to_string()),
                    query_includes: serde_json::to_string(&query.includes).ok(),
                    query_sort: serde_json::to_string(&query.sort).ok(),
                    query_limit: query.limit.map(|l| l.to_string()),
                    ..props
                },
                Vec::new(),
            )
        }
    };

    EditorBlock {
        id: block.id().to_string(),
        kind,
        props,
        content,
        children: Vec::new(),
    }
}

/// Decode a block tree. A node with children always carries a children
/// type on the editor side, `Group` when the canonical block has none.
///
/// Nesting past [`MAX_TREE_DEPTH`] is cut off with a warning; the rest of
/// the tree still decodes.
pub fn decode_block_nodes(nodes: &[BlockNode]) -> Vec<EditorBlock> {
    decode_level(nodes, 0)
}

fn decode_level(nodes: &[BlockNode], depth: usize) -> Vec<EditorBlock> {
    nodes
        .iter()
        .map(|node| {
            let mut block = decode_block(&node.block);
            if node.children.is_empty() {
                return block;
            }
            if block.props.children_type.is_none() {
                block.props.children_type = Some(ChildrenType::Group.as_str().to_string());
            }
            if depth + 1 >= MAX_TREE_DEPTH {
                tracing::warn!(
                    block_id = %block.id,
                    max_depth = MAX_TREE_DEPTH,
                    "block tree exceeds max depth, dropping deeper children"
                );
            } else {
                block.children = decode_level(&node.children, depth + 1);
            }
            block
        })
        .collect()
}

/// Annotation kinds present in `annotations` that decode to style flags.
pub fn style_kinds(annotations: &[Annotation]) -> Vec<AnnotationKind> {
    let mut kinds: Vec<AnnotationKind> = annotations
        .iter()
        .map(Annotation::kind)
        .filter(|k| !k.carries_link())
        .collect();
    kinds.sort();
    kinds.dedup();
    kinds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::{encode_editor_block, encode_inline};
    use hyperdoc_types::{MediaAttributes, MediaBlock, Spans, TextBlock};
    use pretty_assertions::assert_eq;

    fn bold() -> Styles {
        Styles {
            bold: true,
            ..Default::default()
        }
    }

    fn italic() -> Styles {
        Styles {
            italic: true,
            ..Default::default()
        }
    }

    fn text(s: &str, styles: Styles) -> InlineContent {
        InlineContent::Text(StyledText::styled(s, styles))
    }

    // ── Leaves ──────────────────────────────────────────────────────────

    #[test]
    fn test_empty_text_is_one_empty_leaf() {
        assert_eq!(decode_inline("", &[]), vec![text("", Styles::default())]);
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(decode_inline("hello", &[]), vec![text("hello", Styles::default())]);
    }

    #[test]
    fn test_overlap_splits_leaves() {
        let annotations = vec![
            Annotation::Bold(Spans::single(1, 3)),
            Annotation::Italic(Spans::single(2, 4)),
        ];
        assert_eq!(decode_inline("ABCDE", &annotations), vec![
            text("A", Styles::default()),
            text("B", bold()),
            text("C", Styles { bold: true, italic: true, ..Default::default() }),
            text("D", italic()),
            text("E", Styles::default()),
        ]);
    }

    #[test]
    fn test_multi_span_annotation() {
        let annotations = vec![Annotation::Code(Spans {
            starts: vec![0, 4],
            ends: vec![2, 6],
        })];
        let code = Styles {
            code: true,
            ..Default::default()
        };
        assert_eq!(decode_inline("ab cd ef", &annotations), vec![
            text("ab", code),
            text(" c", Styles::default()),
            text("d ", code),
            text("ef", Styles::default()),
        ]);
    }

    #[test]
    fn test_emoji_offsets() {
        let annotations = vec![Annotation::Bold(Spans::single(7, 8))];
        assert_eq!(decode_inline("👨‍👩‍👧‍👦a", &annotations), vec![
            text("👨‍👩‍👧‍👦", Styles::default()),
            text("a", bold()),
        ]);
    }

    // ── Containers ──────────────────────────────────────────────────────

    #[test]
    fn test_link_groups_styled_runs() {
        let annotations = vec![
            Annotation::new(AnnotationKind::Link, Some("https://x.example".into()), Spans::single(4, 12)),
            Annotation::Bold(Spans::single(8, 12)),
        ];
        assert_eq!(decode_inline("see the docs", &annotations), vec![
            text("see ", Styles::default()),
            InlineContent::Link {
                href: "https://x.example".into(),
                content: vec![StyledText::plain("the "), StyledText::styled("docs", bold())],
            },
        ]);
    }

    #[test]
    fn test_adjacent_links_with_different_targets() {
        let annotations = vec![
            Annotation::new(AnnotationKind::Link, Some("https://a.example".into()), Spans::single(0, 2)),
            Annotation::new(AnnotationKind::Link, Some("https://b.example".into()), Spans::single(2, 4)),
        ];
        let out = decode_inline("abcd", &annotations);
        assert_eq!(out, vec![
            InlineContent::Link {
                href: "https://a.example".into(),
                content: vec![StyledText::plain("ab")],
            },
            InlineContent::Link {
                href: "https://b.example".into(),
                content: vec![StyledText::plain("cd")],
            },
        ]);
    }

    #[test]
    fn test_inline_embed_placeholder_position() {
        let text_in = "Hello \u{FFFC} how are you?";
        let annotations = vec![Annotation::new(
            AnnotationKind::Embed,
            Some("hm://z6Mkabc".into()),
            Spans::single(6, 7),
        )];
        let out = decode_inline(text_in, &annotations);
        assert_eq!(out, vec![
            text("Hello ", Styles::default()),
            InlineContent::InlineEmbed {
                link: "hm://z6Mkabc".into(),
                styles: Styles::default(),
            },
            text(" how are you?", Styles::default()),
        ]);
    }

    #[test]
    fn test_merged_embed_span_yields_one_embed_per_placeholder() {
        let annotations = vec![Annotation::new(
            AnnotationKind::Embed,
            Some("hm://z6Mkabc".into()),
            Spans::single(0, 2),
        )];
        let out = decode_inline("\u{FFFC}\u{FFFC}", &annotations);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|i| matches!(i, InlineContent::InlineEmbed { .. })));
    }

    // ── Round trips ─────────────────────────────────────────────────────

    #[test]
    fn test_decode_encode_reproduces_annotations() {
        let annotations = vec![
            Annotation::new(AnnotationKind::Embed, Some("hm://z6Mkabc".into()), Spans::single(6, 7)),
            Annotation::Italic(Spans::single(8, 15)),
            Annotation::Bold(Spans::single(16, 20)),
        ];
        let text_in = "Hello \u{FFFC} how are you?";
        let encoded = encode_inline(&decode_inline(text_in, &annotations));
        assert_eq!(encoded.text, text_in);
        assert_eq!(encoded.annotations, annotations);
    }

    #[test]
    fn test_encode_decode_preserves_visible_text_and_boundaries() {
        let content = vec![
            text("👨‍👩‍👧‍👦 Hello ", Styles::default()),
            text("wor", bold()),
            text("ld!", Styles { bold: true, underline: true, ..Default::default() }),
            InlineContent::Link {
                href: "hm://z6Mkabc/doc".into(),
                content: vec![StyledText::plain(" link")],
            },
        ];
        let encoded = encode_inline(&content);
        assert_eq!(decode_inline(&encoded.text, &encoded.annotations), content);
    }

    #[test]
    fn test_block_roundtrip_image() {
        let block = Block::Image(MediaBlock {
            id: "img00001".into(),
            text: "caption".into(),
            link: "ipfs://bafyimage".into(),
            attributes: MediaAttributes {
                width: Some(320),
                name: Some("a.png".into()),
                ..Default::default()
            },
            ..Default::default()
        });
        let editor = decode_block(&block);
        assert_eq!(editor.kind, EditorBlockType::Image);
        assert_eq!(editor.props.width.as_deref(), Some("320"));
        assert_eq!(encode_editor_block(&editor).unwrap(), block);
    }

    #[test]
    fn test_block_roundtrip_query() {
        let block: Block = serde_json::from_value(serde_json::json!({
            "type": "Query",
            "id": "query001",
            "attributes": {
                "style": "List",
                "banner": true,
                "query": {
                    "includes": [{"space": "z6Mkabc", "path": "", "mode": "Children"}],
                    "limit": 4
                }
            }
        }))
        .unwrap();
        let editor = decode_block(&block);
        assert_eq!(editor.props.banner.as_deref(), Some("true"));
        assert_eq!(encode_editor_block(&editor).unwrap(), block);
    }

    // ── Trees ───────────────────────────────────────────────────────────

    #[test]
    fn test_children_type_defaults_to_group() {
        let child = BlockNode::new(Block::Paragraph(TextBlock {
            id: "child001".into(),
            text: "child".into(),
            ..Default::default()
        }));
        let parent = BlockNode::new(Block::Paragraph(TextBlock {
            id: "parent01".into(),
            text: "parent".into(),
            ..Default::default()
        }))
        .with_children(vec![child]);
        let out = decode_block_nodes(&[parent]);
        assert_eq!(out[0].props.children_type.as_deref(), Some("Group"));
        assert_eq!(out[0].children[0].props.children_type, None);
    }

    #[test]
    fn test_style_kinds() {
        let annotations = vec![
            Annotation::Italic(Spans::single(0, 1)),
            Annotation::Bold(Spans::single(0, 1)),
            Annotation::new(AnnotationKind::Link, Some("x".into()), Spans::single(0, 1)),
            Annotation::Bold(Spans::single(2, 3)),
        ];
        assert_eq!(style_kinds(&annotations), vec![AnnotationKind::Bold, AnnotationKind::Italic]);
    }
}
