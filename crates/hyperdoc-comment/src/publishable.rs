//! Publishable projection of canonical blocks.
//!
//! The immutable comment body carries a trimmed form of each block: the
//! revision is dropped, attributes are flattened into the block map, and
//! empty paragraphs disappear. Highlight (`Range`) annotations and Query
//! blocks have no publishable form.

use hyperdoc_codec::MAX_TREE_DEPTH;
use hyperdoc_types::{Annotation, AnnotationKind, Block, BlockKind, BlockNode};

use crate::Result;
use crate::cbor::Value;
use crate::error::CommentError;

/// One annotation as it appears in a comment body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishableAnnotation {
    pub kind: AnnotationKind,
    pub starts: Vec<u32>,
    pub ends: Vec<u32>,
    /// Present for Link and Embed only.
    pub link: Option<String>,
}

impl PublishableAnnotation {
    pub fn from_annotation(block_id: &str, annotation: &Annotation) -> Result<Self> {
        let kind = annotation.kind();
        if kind == AnnotationKind::Range {
            return Err(CommentError::UnsupportedAnnotation {
                block_id: block_id.to_string(),
                kind,
            });
        }
        let spans = annotation.spans();
        Ok(Self {
            kind,
            starts: spans.starts.clone(),
            ends: spans.ends.clone(),
            link: kind
                .carries_link()
                .then(|| annotation.link().unwrap_or_default().to_string()),
        })
    }

    pub fn to_cbor(&self) -> Value {
        let mut entries = vec![
            ("type".to_string(), Value::text(self.kind.as_str())),
            ("starts".to_string(), ints(&self.starts)),
            ("ends".to_string(), ints(&self.ends)),
        ];
        if let Some(link) = &self.link {
            entries.push(("link".to_string(), Value::text(link.as_str())));
        }
        Value::Map(entries)
    }
}

fn ints(values: &[u32]) -> Value {
    Value::Array(values.iter().map(|&v| Value::from(v)).collect())
}

/// One block of a comment body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishableBlock {
    pub id: String,
    pub kind: BlockKind,
    pub text: Option<String>,
    pub link: Option<String>,
    /// `None` for block types whose record has no annotations key.
    pub annotations: Option<Vec<PublishableAnnotation>>,
    /// Flattened attributes, only the ones that are set.
    pub attributes: Vec<(String, Value)>,
    pub children: Vec<PublishableBlock>,
}

impl PublishableBlock {
    fn new(block: &Block) -> Self {
        Self {
            id: block.id().to_string(),
            kind: block.kind(),
            text: None,
            link: None,
            annotations: None,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    fn with_text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    fn with_link(mut self, link: &str) -> Self {
        self.link = Some(link.to_string());
        self
    }

    fn with_annotations(mut self, annotations: &[Annotation]) -> Result<Self> {
        let converted = annotations
            .iter()
            .map(|a| PublishableAnnotation::from_annotation(&self.id, a))
            .collect::<Result<Vec<_>>>()?;
        self.annotations = Some(converted);
        Ok(self)
    }

    fn attr(mut self, key: &str, value: Option<impl Into<Value>>) -> Self {
        if let Some(value) = value {
            self.attributes.push((key.to_string(), value.into()));
        }
        self
    }

    /// Project a node, `Ok(None)` when it is dropped from the body.
    pub fn from_node(node: &BlockNode) -> Result<Option<Self>> {
        Self::from_node_at(node, 0)
    }

    fn from_node_at(node: &BlockNode, depth: usize) -> Result<Option<Self>> {
        let block = &node.block;
        let children_type = block.children_type().map(|c| c.as_str());
        let base = Self::new(block).attr("childrenType", children_type);

        let publishable = match block {
            Block::Paragraph(b) if b.text.is_empty() => return Ok(None),
            Block::Paragraph(b) | Block::Heading(b) | Block::Math(b) => {
                base.with_text(&b.text).with_annotations(&b.annotations)?
            }
            Block::Code(b) => base
                .with_text(&b.text)
                .with_annotations(&b.annotations)?
                .attr("language", b.attributes.language.as_deref()),
            Block::Image(b) => base
                .with_text(&b.text)
                .with_link(&b.link)
                .with_annotations(&b.annotations)?
                .attr("width", b.attributes.width)
                .attr("name", b.attributes.name.as_deref()),
            Block::Video(b) => base
                .with_text("")
                .with_link(&b.link)
                .attr("width", b.attributes.width)
                .attr("name", b.attributes.name.as_deref()),
            Block::File(b) => base
                .with_link(&b.link)
                .attr("name", b.attributes.name.as_deref())
                .attr("size", b.attributes.size),
            Block::Button(b) => base
                .with_text(&b.text)
                .with_link(&b.link)
                .attr("name", b.attributes.name.as_deref())
                .attr("alignment", b.attributes.alignment.as_ref().map(|a| a.as_str())),
            Block::Embed(b) => base
                .with_link(&b.link)
                .attr("view", b.attributes.view.as_ref().map(|v| v.as_str())),
            Block::WebEmbed(b) => base.with_link(&b.link),
            Block::Query(b) => {
                return Err(CommentError::UnsupportedBlock {
                    block_id: b.id.clone(),
                    kind: BlockKind::Query,
                });
            }
        };

        Ok(Some(Self {
            children: publish_level(&node.children, depth + 1)?,
            ..publishable
        }))
    }

    pub fn to_cbor(&self) -> Value {
        let mut entries = vec![
            ("id".to_string(), Value::text(self.id.as_str())),
            ("type".to_string(), Value::text(self.kind.as_str())),
        ];
        if let Some(text) = &self.text {
            entries.push(("text".to_string(), Value::text(text.as_str())));
        }
        if let Some(link) = &self.link {
            entries.push(("link".to_string(), Value::text(link.as_str())));
        }
        if let Some(annotations) = &self.annotations {
            entries.push((
                "annotations".to_string(),
                Value::Array(annotations.iter().map(PublishableAnnotation::to_cbor).collect()),
            ));
        }
        entries.extend(self.attributes.iter().cloned());
        entries.push((
            "children".to_string(),
            Value::Array(self.children.iter().map(PublishableBlock::to_cbor).collect()),
        ));
        Value::Map(entries)
    }
}

/// Project a block tree into a comment body.
pub fn to_publishable(nodes: &[BlockNode]) -> Result<Vec<PublishableBlock>> {
    publish_level(nodes, 0)
}

fn publish_level(nodes: &[BlockNode], depth: usize) -> Result<Vec<PublishableBlock>> {
    if depth >= MAX_TREE_DEPTH {
        return Err(CommentError::TooDeep(MAX_TREE_DEPTH));
    }
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        if let Some(block) = PublishableBlock::from_node_at(node, depth)? {
            out.push(block);
        }
    }
    Ok(out)
}
