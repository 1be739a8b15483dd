//! Editor blocks to canonical blocks.
//!
//! Inline content is flattened into leaves in order. Each leaf appends its
//! text and records its spans in an [`AnnotationAccumulator`]:
//!
//! ```text
//! text("Hello ")  embed(hm://a)  text(" how", italic)
//! └─ [0,6)        └─ [6,7) U+FFFC └─ Italic [7,11)
//! ```
//!
//! The finished block is validated before it is returned.

use std::str::FromStr;

use serde::de::DeserializeOwned;

use hyperdoc_types::{
    AnnotationKind, BaseAttributes, Block, BlockNode, ButtonAlignment, ButtonAttributes,
    ButtonBlock, ChildrenType, CodeAttributes, CodeBlock, EmbedAttributes, EmbedBlock, EmbedView,
    FileAttributes, FileBlock, LinkBlock, MediaAttributes, MediaBlock, Query, QueryAttributes,
    QueryBlock, QueryStyle, TextBlock,
};

use crate::editor::{EditorBlock, EditorBlockType, EditorProps, InlineContent, Styles};
use crate::error::EncodeError;
use crate::unicode::{AnnotationAccumulator, code_point_length};
use crate::{EMBED_PLACEHOLDER_STR, MAX_TREE_DEPTH, Result};

/// Flattened text and annotations of one block's inline content.
#[derive(Debug, Default)]
pub struct EncodedText {
    pub text: String,
    pub annotations: Vec<hyperdoc_types::Annotation>,
}

struct Flattener {
    text: String,
    pos: u32,
    acc: AnnotationAccumulator,
}

impl Flattener {
    fn push_run(&mut self, text: &str, styles: &Styles) -> (u32, u32) {
        let start = self.pos;
        self.text.push_str(text);
        self.pos += code_point_length(text);
        for kind in styles.active() {
            self.acc.add_span(kind, None, start, self.pos);
        }
        (start, self.pos)
    }
}

/// Flatten inline content into plain text plus standoff annotations.
pub fn encode_inline(content: &[InlineContent]) -> EncodedText {
    let mut flat = Flattener {
        text: String::new(),
        pos: 0,
        acc: AnnotationAccumulator::new(),
    };
    for item in content {
        match item {
            InlineContent::Text(run) => {
                flat.push_run(&run.text, &run.styles);
            }
            InlineContent::Link { href, content } => {
                let start = flat.pos;
                for run in content {
                    flat.push_run(&run.text, &run.styles);
                }
                flat.acc
                    .add_span(AnnotationKind::Link, Some(href), start, flat.pos);
            }
            InlineContent::InlineEmbed { link, styles } => {
                let (start, end) = flat.push_run(EMBED_PLACEHOLDER_STR, styles);
                flat.acc.add_span(AnnotationKind::Embed, Some(link), start, end);
            }
        }
    }
    EncodedText {
        text: flat.text,
        annotations: flat.acc.emit(),
    }
}

/// Encode one editor block (children are not visited).
pub fn encode_editor_block(block: &EditorBlock) -> Result<Block> {
    let id = block.id.clone();
    let props = &block.props;
    let revision = non_empty(&props.revision);
    let children_type = parse_enum(&id, "childrenType", &props.children_type, ChildrenType::from_str)?;
    let EncodedText { text, annotations } = encode_inline(&block.content);
    let link = non_empty(&props.url).unwrap_or_default();

    match block.kind {
        EditorBlockType::Button if !annotations.is_empty() => {
            return Err(EncodeError::unsupported_content(block, "inline styles or links"));
        }
        EditorBlockType::File
        | EditorBlockType::Embed
        | EditorBlockType::WebEmbed
        | EditorBlockType::Query
            if !text.is_empty() =>
        {
            return Err(EncodeError::unsupported_content(block, "inline content"));
        }
        _ => {}
    }

    let encoded = match block.kind {
        EditorBlockType::Paragraph | EditorBlockType::Heading | EditorBlockType::Math => {
            let b = TextBlock {
                id,
                revision,
                text,
                annotations,
                attributes: BaseAttributes { children_type },
            };
            match block.kind {
                EditorBlockType::Heading => Block::Heading(b),
                EditorBlockType::Math => Block::Math(b),
                _ => Block::Paragraph(b),
            }
        }
        EditorBlockType::CodeBlock => Block::Code(CodeBlock {
            id,
            revision,
            text,
            annotations,
            attributes: CodeAttributes {
                children_type,
                language: non_empty(&props.language),
            },
        }),
        EditorBlockType::Image | EditorBlockType::Video => {
            let attributes = MediaAttributes {
                children_type,
                width: parse_number(&id, "width", &props.width)?,
                name: non_empty(&props.name),
            };
            let b = MediaBlock {
                id,
                revision,
                text,
                annotations,
                link,
                attributes,
            };
            if block.kind == EditorBlockType::Video {
                Block::Video(b)
            } else {
                Block::Image(b)
            }
        }
        EditorBlockType::File => Block::File(FileBlock {
            attributes: FileAttributes {
                children_type,
                name: non_empty(&props.name),
                size: parse_number(&id, "size", &props.size)?,
            },
            id,
            revision,
            link,
        }),
        EditorBlockType::Button => Block::Button(ButtonBlock {
            attributes: ButtonAttributes {
                children_type,
                name: non_empty(&props.name),
                alignment: parse_enum(&id, "alignment", &props.alignment, ButtonAlignment::from_str)?,
            },
            id,
            revision,
            text,
            link,
        }),
        EditorBlockType::Embed => Block::Embed(EmbedBlock {
            attributes: EmbedAttributes {
                children_type,
                view: parse_enum(&id, "view", &props.view, EmbedView::from_str)?,
            },
            id,
            revision,
            link,
        }),
        EditorBlockType::WebEmbed => Block::WebEmbed(LinkBlock {
            id,
            revision,
            link,
            attributes: BaseAttributes { children_type },
        }),
        EditorBlockType::Query => Block::Query(QueryBlock {
            attributes: query_attributes(&id, props, children_type)?,
            id,
            revision,
        }),
    };

    encoded.validate()?;
    Ok(encoded)
}

/// Encode an editor block tree into canonical block nodes.
pub fn encode_editor_blocks(blocks: &[EditorBlock]) -> Result<Vec<BlockNode>> {
    encode_level(blocks, 0)
}

fn encode_level(blocks: &[EditorBlock], depth: usize) -> Result<Vec<BlockNode>> {
    if depth >= MAX_TREE_DEPTH {
        return Err(EncodeError::TooDeep(MAX_TREE_DEPTH));
    }
    blocks
        .iter()
        .map(|block| {
            let children = if block.children.is_empty() {
                Vec::new()
            } else {
                encode_level(&block.children, depth + 1)?
            };
            Ok(BlockNode::new(encode_editor_block(block)?).with_children(children))
        })
        .collect()
}

fn query_attributes(
    id: &str,
    props: &EditorProps,
    children_type: Option<ChildrenType>,
) -> Result<QueryAttributes> {
    let banner = match props.banner.as_deref() {
        None | Some("") | Some("false") => false,
        Some("true") => true,
        Some(other) => return Err(EncodeError::invalid_prop(id, "banner", other)),
    };
    Ok(QueryAttributes {
        children_type,
        style: parse_enum(id, "style", &props.style, QueryStyle::from_str)?,
        column_count: parse_number(id, "columnCount", &props.column_count)?,
        banner,
        query: Query {
            includes: parse_json(id, "queryIncludes", &props.query_includes)?.unwrap_or_default(),
            sort: parse_json(id, "querySort", &props.query_sort)?.unwrap_or_default(),
            limit: parse_number(id, "queryLimit", &props.query_limit)?,
        },
    })
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.clone().filter(|v| !v.is_empty())
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_number<T: FromStr>(id: &str, prop: &'static str, value: &Option<String>) -> Result<Option<T>> {
    present(value)
        .map(|v| v.parse().map_err(|_| EncodeError::invalid_prop(id, prop, v)))
        .transpose()
}

fn parse_enum<T>(
    id: &str,
    prop: &'static str,
    value: &Option<String>,
    parse: fn(&str) -> Option<T>,
) -> Result<Option<T>> {
    present(value)
        .map(|v| parse(v).ok_or_else(|| EncodeError::invalid_prop(id, prop, v)))
        .transpose()
}

fn parse_json<T: DeserializeOwned>(
    id: &str,
    prop: &'static str,
    value: &Option<String>,
) -> Result<Option<T>> {
    present(value)
        .map(|v| {
            serde_json::from_str(v).map_err(|source| EncodeError::InvalidJson {
                block_id: id.to_string(),
                prop,
                source,
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::StyledText;
    use hyperdoc_types::{Annotation, Spans, QueryIncludeMode, ValidationError};
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

    fn paragraph(content: Vec<InlineContent>) -> EditorBlock {
        EditorBlock::new("blk00001", EditorBlockType::Paragraph).with_content(content)
    }

    fn text(s: &str, styles: Styles) -> InlineContent {
        InlineContent::Text(StyledText::styled(s, styles))
    }

    // ── Inline flattening ───────────────────────────────────────────────

    #[test]
    fn test_overlapping_styles_become_independent_annotations() {
        let out = encode_inline(&[
            text("hello ", Styles::default()),
            text("good ", bold()),
            text("world!", Styles { bold: true, italic: true, ..Default::default() }),
        ]);
        assert_eq!(out.text, "hello good world!");
        assert_eq!(out.annotations, vec![
            Annotation::Bold(Spans::single(6, 17)),
            Annotation::Italic(Spans::single(11, 17)),
        ]);
    }

    #[test]
    fn test_each_style_flag_encodes() {
        let styles = [
            (Styles { bold: true, ..Default::default() }, AnnotationKind::Bold),
            (Styles { italic: true, ..Default::default() }, AnnotationKind::Italic),
            (Styles { underline: true, ..Default::default() }, AnnotationKind::Underline),
            (Styles { strike: true, ..Default::default() }, AnnotationKind::Strike),
            (Styles { code: true, ..Default::default() }, AnnotationKind::Code),
        ];
        for (s, kind) in styles {
            let out = encode_inline(&[text("Hello ", Styles::default()), text("world!", s)]);
            assert_eq!(out.annotations, vec![Annotation::new(kind, None, Spans::single(6, 12))]);
        }
    }

    #[test]
    fn test_bold_then_italic_overlap() {
        let out = encode_inline(&[
            text("A", Styles::default()),
            text("B", bold()),
            text("C", Styles { bold: true, italic: true, ..Default::default() }),
            text("D", italic()),
            text("E", Styles::default()),
        ]);
        assert_eq!(out.annotations, vec![
            Annotation::Bold(Spans::single(1, 3)),
            Annotation::Italic(Spans::single(2, 4)),
        ]);
    }

    #[test]
    fn test_offsets_count_code_points() {
        let out = encode_inline(&[
            text("👨‍👩‍👧‍👦 Hello ", Styles::default()),
            text("world!", bold()),
        ]);
        assert_eq!(out.annotations, vec![Annotation::Bold(Spans::single(14, 20))]);
    }

    #[test]
    fn test_emoji_then_bold_char() {
        let out = encode_inline(&[text("👨‍👩‍👧‍👦", Styles::default()), text("a", bold())]);
        assert_eq!(out.annotations, vec![Annotation::Bold(Spans::single(7, 8))]);
    }

    #[test]
    fn test_link_wraps_its_content() {
        let out = encode_inline(&[
            text("see ", Styles::default()),
            InlineContent::Link {
                href: "https://example.com".into(),
                content: vec![StyledText::plain("the "), StyledText::styled("docs", bold())],
            },
        ]);
        assert_eq!(out.text, "see the docs");
        assert_eq!(out.annotations, vec![
            Annotation::new(AnnotationKind::Link, Some("https://example.com".into()), Spans::single(4, 12)),
            Annotation::Bold(Spans::single(8, 12)),
        ]);
    }

    #[test]
    fn test_inline_embed_placeholder() {
        let out = encode_inline(&[
            text("Hello ", Styles::default()),
            InlineContent::InlineEmbed {
                link: "hm://z6Mkabc".into(),
                styles: Styles::default(),
            },
            text(" how ", Styles::default()),
            text("are you", italic()),
            text(" ", Styles::default()),
            text("doing", bold()),
        ]);
        assert_eq!(out.text, "Hello \u{FFFC} how are you doing");
        assert_eq!(out.annotations, vec![
            Annotation::new(AnnotationKind::Embed, Some("hm://z6Mkabc".into()), Spans::single(6, 7)),
            Annotation::Italic(Spans::single(12, 19)),
            Annotation::Bold(Spans::single(20, 25)),
        ]);
    }

    #[test]
    fn test_split_runs_with_same_style_merge() {
        let out = encode_inline(&[text("ab", bold()), text("cd", bold())]);
        assert_eq!(out.annotations, vec![Annotation::Bold(Spans::single(0, 4))]);
    }

    // ── Block mapping ───────────────────────────────────────────────────

    #[test]
    fn test_paragraph_block() {
        let block = encode_editor_block(&paragraph(vec![text("hi", bold())])).unwrap();
        assert_eq!(block, Block::Paragraph(TextBlock {
            id: "blk00001".into(),
            text: "hi".into(),
            annotations: vec![Annotation::Bold(Spans::single(0, 2))],
            ..Default::default()
        }));
    }

    #[test]
    fn test_image_block_props() {
        let block = EditorBlock::new("img00001", EditorBlockType::Image)
            .with_props(EditorProps {
                url: Some("ipfs://bafyimage".into()),
                width: Some("240".into()),
                name: Some("cat.png".into()),
                ..Default::default()
            })
            .with_content(vec![text("A cat", Styles::default())]);
        let Block::Image(image) = encode_editor_block(&block).unwrap() else {
            panic!("expected image");
        };
        assert_eq!(image.link, "ipfs://bafyimage");
        assert_eq!(image.text, "A cat");
        assert_eq!(image.attributes.width, Some(240));
        assert_eq!(image.attributes.name.as_deref(), Some("cat.png"));
    }

    #[test]
    fn test_file_and_embed_blocks() {
        let file = EditorBlock::new("file0001", EditorBlockType::File).with_props(EditorProps {
            url: Some("ipfs://bafyfile".into()),
            size: Some("123456".into()),
            ..Default::default()
        });
        let Block::File(file) = encode_editor_block(&file).unwrap() else {
            panic!("expected file");
        };
        assert_eq!(file.attributes.size, Some(123456));

        let embed = EditorBlock::new("embed001", EditorBlockType::Embed).with_props(EditorProps {
            url: Some("hm://z6Mkabc/doc".into()),
            view: Some("card".into()),
            ..Default::default()
        });
        let Block::Embed(embed) = encode_editor_block(&embed).unwrap() else {
            panic!("expected embed");
        };
        assert_eq!(embed.attributes.view, Some(EmbedView::Card));
    }

    #[test]
    fn test_query_block_props() {
        let block = EditorBlock::new("query001", EditorBlockType::Query).with_props(EditorProps {
            style: Some("List".into()),
            column_count: Some("3".into()),
            banner: Some("true".into()),
            query_includes: Some(r#"[{"space":"z6Mkabc","path":"/notes","mode":"AllDescendants"}]"#.into()),
            query_sort: Some(r#"[{"term":"UpdateTime","reverse":true}]"#.into()),
            query_limit: Some("10".into()),
            ..Default::default()
        });
        let Block::Query(query) = encode_editor_block(&block).unwrap() else {
            panic!("expected query");
        };
        assert_eq!(query.attributes.style, Some(QueryStyle::List));
        assert_eq!(query.attributes.column_count, Some(3));
        assert!(query.attributes.banner);
        assert_eq!(query.attributes.query.includes[0].mode, QueryIncludeMode::AllDescendants);
        assert_eq!(query.attributes.query.limit, Some(10));
    }

    // ── Errors ──────────────────────────────────────────────────────────

    #[test]
    fn test_invalid_width_is_an_error() {
        let block = EditorBlock::new("img00001", EditorBlockType::Image).with_props(EditorProps {
            width: Some("wide".into()),
            ..Default::default()
        });
        let err = encode_editor_block(&block).unwrap_err();
        assert!(matches!(err, EncodeError::InvalidProp { prop: "width", .. }));
    }

    #[test]
    fn test_malformed_query_json_is_an_error() {
        let block = EditorBlock::new("query001", EditorBlockType::Query).with_props(EditorProps {
            query_includes: Some("[{".into()),
            ..Default::default()
        });
        let err = encode_editor_block(&block).unwrap_err();
        assert!(matches!(err, EncodeError::InvalidJson { prop: "queryIncludes", .. }));
    }

    #[test]
    fn test_link_without_href_fails_validation() {
        let block = paragraph(vec![InlineContent::Link {
            href: String::new(),
            content: vec![StyledText::plain("x")],
        }]);
        let err = encode_editor_block(&block).unwrap_err();
        assert!(matches!(
            err,
            EncodeError::Validation(ValidationError::MissingAnnotationLink { .. })
        ));
    }

    #[test]
    fn test_embed_needs_hypermedia_link() {
        let block = EditorBlock::new("embed001", EditorBlockType::Embed);
        let err = encode_editor_block(&block).unwrap_err();
        assert!(matches!(err, EncodeError::Validation(ValidationError::MissingLink { .. })));
    }

    #[test]
    fn test_unknown_children_type() {
        let block = EditorBlock::new("blk00001", EditorBlockType::Paragraph).with_props(EditorProps {
            children_type: Some("Spiral".into()),
            ..Default::default()
        });
        assert!(matches!(
            encode_editor_block(&block),
            Err(EncodeError::InvalidProp { prop: "childrenType", .. })
        ));
    }

    #[test]
    fn test_styled_button_label_is_an_error() {
        let button = EditorBlock::new("btn00001", EditorBlockType::Button)
            .with_props(EditorProps {
                url: Some("https://example.com".into()),
                ..Default::default()
            })
            .with_content(vec![text("Go", bold())]);
        let err = encode_editor_block(&button).unwrap_err();
        assert!(matches!(
            err,
            EncodeError::UnsupportedContent { kind: EditorBlockType::Button, .. }
        ));

        let plain = button.with_content(vec![text("Go", Styles::default())]);
        let Block::Button(b) = encode_editor_block(&plain).unwrap() else {
            panic!("expected button");
        };
        assert_eq!(b.text, "Go");
    }

    #[test]
    fn test_text_on_media_block_is_an_error() {
        for kind in [EditorBlockType::File, EditorBlockType::Embed, EditorBlockType::WebEmbed] {
            let block = EditorBlock::new("media001", kind)
                .with_props(EditorProps {
                    url: Some("hm://z6Mkabc/doc".into()),
                    ..Default::default()
                })
                .with_content(vec![text("caption", Styles::default())]);
            let err = encode_editor_block(&block).unwrap_err();
            assert!(matches!(err, EncodeError::UnsupportedContent { kind: k, .. } if k == kind));
        }
    }

    // ── Trees ───────────────────────────────────────────────────────────

    #[test]
    fn test_tree_keeps_children() {
        let tree = vec![
            paragraph(vec![text("parent", Styles::default())])
                .with_props(EditorProps {
                    children_type: Some("Ordered".into()),
                    ..Default::default()
                })
                .with_children(vec![
                    EditorBlock::new("child001", EditorBlockType::Paragraph)
                        .with_content(vec![text("one", Styles::default())]),
                ]),
        ];
        let nodes = encode_editor_blocks(&tree).unwrap();
        assert_eq!(nodes[0].block.children_type(), Some(ChildrenType::Ordered));
        assert_eq!(nodes[0].children[0].block.text(), Some("one"));
    }

    #[test]
    fn test_tree_depth_guard() {
        let mut block = EditorBlock::new("leaf0000", EditorBlockType::Paragraph);
        for i in 0..MAX_TREE_DEPTH {
            block = EditorBlock::new(format!("node{i:04}"), EditorBlockType::Paragraph)
                .with_children(vec![block]);
        }
        assert!(matches!(
            encode_editor_blocks(&[block]),
            Err(EncodeError::TooDeep(_))
        ));
    }
}
