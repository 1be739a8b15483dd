//! Canonical block model.
//!
//! A document's content is a tree of [`BlockNode`]s. Each node holds one
//! [`Block`], a closed tagged union over the eleven block types. Text-bearing
//! blocks store plain `text` plus standoff [`Annotation`]s whose offsets are
//! Unicode code points into that text.
//!
//! ## Serialized shape
//!
//! ```text
//! { "type": "Paragraph", "id": "a1b2c3d4", "text": "hello",
//!   "annotations": [{ "type": "Bold", "starts": [0], "ends": [5] }],
//!   "attributes": { "childrenType": "Ordered" } }
//! ```
//!
//! Optional fields are omitted when unset so that equal content always
//! serializes identically.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::EnumString;

use crate::error::ValidationError;
use crate::ids::HmId;

/// Block discriminant, for logging and error messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum BlockKind {
    Paragraph,
    Heading,
    Code,
    Math,
    Image,
    Video,
    File,
    Button,
    Embed,
    WebEmbed,
    Query,
}

impl BlockKind {
    /// Parse from string (case-insensitive).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        <Self as FromStr>::from_str(s).ok()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Paragraph => "Paragraph",
            BlockKind::Heading => "Heading",
            BlockKind::Code => "Code",
            BlockKind::Math => "Math",
            BlockKind::Image => "Image",
            BlockKind::Video => "Video",
            BlockKind::File => "File",
            BlockKind::Button => "Button",
            BlockKind::Embed => "Embed",
            BlockKind::WebEmbed => "WebEmbed",
            BlockKind::Query => "Query",
        }
    }
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a block's children are laid out.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum ChildrenType {
    #[default]
    Group,
    Ordered,
    Unordered,
    Blockquote,
}

impl ChildrenType {
    /// Parse from string (case-insensitive).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        <Self as FromStr>::from_str(s).ok()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChildrenType::Group => "Group",
            ChildrenType::Ordered => "Ordered",
            ChildrenType::Unordered => "Unordered",
            ChildrenType::Blockquote => "Blockquote",
        }
    }
}

impl std::fmt::Display for ChildrenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How an embed block renders its target.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum EmbedView {
    #[default]
    Content,
    Card,
}

impl EmbedView {
    /// Parse from string (case-insensitive).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        <Self as FromStr>::from_str(s).ok()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EmbedView::Content => "Content",
            EmbedView::Card => "Card",
        }
    }
}

/// Horizontal placement of a button.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum ButtonAlignment {
    #[serde(rename = "flex-start")]
    #[strum(serialize = "flex-start", serialize = "start")]
    Start,
    #[serde(rename = "center")]
    #[strum(serialize = "center")]
    Center,
    #[serde(rename = "flex-end")]
    #[strum(serialize = "flex-end", serialize = "end")]
    End,
}

impl ButtonAlignment {
    /// Parse from string (case-insensitive). Accepts "start"/"end" aliases.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        <Self as FromStr>::from_str(s).ok()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ButtonAlignment::Start => "flex-start",
            ButtonAlignment::Center => "center",
            ButtonAlignment::End => "flex-end",
        }
    }
}

/// Presentation of query results.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum QueryStyle {
    #[default]
    Card,
    List,
}

impl QueryStyle {
    /// Parse from string (case-insensitive).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        <Self as FromStr>::from_str(s).ok()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryStyle::Card => "Card",
            QueryStyle::List => "List",
        }
    }
}

// ── Query definition ──────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryIncludeMode {
    #[default]
    Children,
    AllDescendants,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuerySortTerm {
    Path,
    Title,
    CreateTime,
    UpdateTime,
    DisplayTime,
}

/// One document subtree a query pulls from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryInclude {
    pub space: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub mode: QueryIncludeMode,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySort {
    pub term: QuerySortTerm,
    #[serde(default)]
    pub reverse: bool,
}

/// The query a Query block runs over the document graph.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    #[serde(default)]
    pub includes: Vec<QueryInclude>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<QuerySort>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

// ── Annotations ─────────────────────────────────────────────────────────────

/// Annotation discriminant. Doubles as the identity key component when
/// accumulating spans, so the derived ordering is the emit order.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum AnnotationKind {
    Bold,
    Italic,
    Underline,
    Strike,
    Code,
    /// Highlight. Editor-only; never published in comments.
    Range,
    Link,
    Embed,
}

impl AnnotationKind {
    /// Parse from string (case-insensitive).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        <Self as FromStr>::from_str(s).ok()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnnotationKind::Bold => "Bold",
            AnnotationKind::Italic => "Italic",
            AnnotationKind::Underline => "Underline",
            AnnotationKind::Strike => "Strike",
            AnnotationKind::Code => "Code",
            AnnotationKind::Range => "Range",
            AnnotationKind::Link => "Link",
            AnnotationKind::Embed => "Embed",
        }
    }

    /// `true` for Link and Embed, which carry a target.
    pub fn carries_link(&self) -> bool {
        matches!(self, AnnotationKind::Link | AnnotationKind::Embed)
    }
}

impl std::fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parallel `[start, end)` arrays in code points.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Spans {
    #[serde(default)]
    pub starts: Vec<u32>,
    #[serde(default)]
    pub ends: Vec<u32>,
}

impl Spans {
    pub fn single(start: u32, end: u32) -> Self {
        Self {
            starts: vec![start],
            ends: vec![end],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.starts.iter().copied().zip(self.ends.iter().copied())
    }

    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }

    /// Whether some span contains `pos`. Binary search over the sorted ends.
    pub fn contains(&self, pos: u32) -> bool {
        let idx = self.ends.partition_point(|&end| end <= pos);
        self.starts.get(idx).is_some_and(|&start| start <= pos)
    }

    /// Spans must be non-empty, sorted, disjoint and within `len`. Touching
    /// spans (`start == prev_end`) are accepted even though the codec never
    /// emits them.
    fn validate(
        &self,
        block_id: &str,
        annotation: AnnotationKind,
        len: u32,
    ) -> Result<(), ValidationError> {
        if self.starts.len() != self.ends.len() {
            return Err(ValidationError::MismatchedSpans {
                block_id: block_id.to_string(),
                annotation,
                starts: self.starts.len(),
                ends: self.ends.len(),
            });
        }
        let mut prev_end = 0;
        for (i, (start, end)) in self.iter().enumerate() {
            if start >= end {
                return Err(ValidationError::EmptySpan {
                    block_id: block_id.to_string(),
                    annotation,
                    start,
                    end,
                });
            }
            if i > 0 && start < prev_end {
                return Err(ValidationError::OverlappingSpans {
                    block_id: block_id.to_string(),
                    annotation,
                    start,
                });
            }
            if end > len {
                return Err(ValidationError::SpanOutOfBounds {
                    block_id: block_id.to_string(),
                    annotation,
                    end,
                    len,
                });
            }
            prev_end = end;
        }
        Ok(())
    }
}

/// Spans plus the target of a Link or Embed annotation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkSpans {
    #[serde(default)]
    pub link: String,
    #[serde(flatten)]
    pub spans: Spans,
}

/// A standoff annotation over a block's text.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Annotation {
    Bold(Spans),
    Italic(Spans),
    Underline(Spans),
    Strike(Spans),
    Code(Spans),
    Range(Spans),
    Link(LinkSpans),
    Embed(LinkSpans),
}

impl Annotation {
    /// Build an annotation from its key and spans. `link` is ignored for
    /// style kinds and defaults to empty for Link/Embed.
    pub fn new(kind: AnnotationKind, link: Option<String>, spans: Spans) -> Self {
        match kind {
            AnnotationKind::Bold => Annotation::Bold(spans),
            AnnotationKind::Italic => Annotation::Italic(spans),
            AnnotationKind::Underline => Annotation::Underline(spans),
            AnnotationKind::Strike => Annotation::Strike(spans),
            AnnotationKind::Code => Annotation::Code(spans),
            AnnotationKind::Range => Annotation::Range(spans),
            AnnotationKind::Link => Annotation::Link(LinkSpans {
                link: link.unwrap_or_default(),
                spans,
            }),
            AnnotationKind::Embed => Annotation::Embed(LinkSpans {
                link: link.unwrap_or_default(),
                spans,
            }),
        }
    }

    pub fn kind(&self) -> AnnotationKind {
        match self {
            Annotation::Bold(_) => AnnotationKind::Bold,
            Annotation::Italic(_) => AnnotationKind::Italic,
            Annotation::Underline(_) => AnnotationKind::Underline,
            Annotation::Strike(_) => AnnotationKind::Strike,
            Annotation::Code(_) => AnnotationKind::Code,
            Annotation::Range(_) => AnnotationKind::Range,
            Annotation::Link(_) => AnnotationKind::Link,
            Annotation::Embed(_) => AnnotationKind::Embed,
        }
    }

    pub fn spans(&self) -> &Spans {
        match self {
            Annotation::Bold(s)
            | Annotation::Italic(s)
            | Annotation::Underline(s)
            | Annotation::Strike(s)
            | Annotation::Code(s)
            | Annotation::Range(s) => s,
            Annotation::Link(l) | Annotation::Embed(l) => &l.spans,
        }
    }

    pub fn link(&self) -> Option<&str> {
        match self {
            Annotation::Link(l) | Annotation::Embed(l) => Some(&l.link),
            _ => None,
        }
    }

    /// Check span invariants against a text of `len` code points.
    pub fn validate(&self, block_id: &str, len: u32) -> crate::Result<()> {
        if self.kind().carries_link() && self.link().is_none_or(str::is_empty) {
            return Err(ValidationError::MissingAnnotationLink {
                block_id: block_id.to_string(),
                annotation: self.kind(),
            });
        }
        self.spans().validate(block_id, self.kind(), len)
    }
}

// ── Blocks ──────────────────────────────────────────────────────────────────

/// Attributes shared by every block type.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children_type: Option<ChildrenType>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children_type: Option<ChildrenType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children_type: Option<ChildrenType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children_type: Option<ChildrenType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children_type: Option<ChildrenType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<ButtonAlignment>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children_type: Option<ChildrenType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<EmbedView>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children_type: Option<ChildrenType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<QueryStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_count: Option<u32>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub banner: bool,
    #[serde(default)]
    pub query: Query,
}

/// Paragraph, Heading and Math.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBlock {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub attributes: BaseAttributes,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlock {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub attributes: CodeAttributes,
}

/// Image and Video. `text` is the caption.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaBlock {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub attributes: MediaAttributes,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileBlock {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub attributes: FileAttributes,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonBlock {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub attributes: ButtonAttributes,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedBlock {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub attributes: EmbedAttributes,
}

/// WebEmbed: an external URL rendered inline.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkBlock {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub attributes: BaseAttributes,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryBlock {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    #[serde(default)]
    pub attributes: QueryAttributes,
}

/// A canonical content block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Block {
    Paragraph(TextBlock),
    Heading(TextBlock),
    Code(CodeBlock),
    Math(TextBlock),
    Image(MediaBlock),
    Video(MediaBlock),
    File(FileBlock),
    Button(ButtonBlock),
    Embed(EmbedBlock),
    WebEmbed(LinkBlock),
    Query(QueryBlock),
}

/// Run `$body` with `$b` bound to the variant payload, whatever its type.
macro_rules! each_variant {
    ($block:expr, $b:ident => $body:expr) => {
        match $block {
            Block::Paragraph($b) | Block::Heading($b) | Block::Math($b) => $body,
            Block::Code($b) => $body,
            Block::Image($b) | Block::Video($b) => $body,
            Block::File($b) => $body,
            Block::Button($b) => $body,
            Block::Embed($b) => $body,
            Block::WebEmbed($b) => $body,
            Block::Query($b) => $body,
        }
    };
}

impl Block {
    pub fn kind(&self) -> BlockKind {
        match self {
            Block::Paragraph(_) => BlockKind::Paragraph,
            Block::Heading(_) => BlockKind::Heading,
            Block::Code(_) => BlockKind::Code,
            Block::Math(_) => BlockKind::Math,
            Block::Image(_) => BlockKind::Image,
            Block::Video(_) => BlockKind::Video,
            Block::File(_) => BlockKind::File,
            Block::Button(_) => BlockKind::Button,
            Block::Embed(_) => BlockKind::Embed,
            Block::WebEmbed(_) => BlockKind::WebEmbed,
            Block::Query(_) => BlockKind::Query,
        }
    }

    pub fn id(&self) -> &str {
        each_variant!(self, b => b.id.as_str())
    }

    pub fn revision(&self) -> Option<&str> {
        each_variant!(self, b => b.revision.as_deref())
    }

    pub fn children_type(&self) -> Option<ChildrenType> {
        each_variant!(self, b => b.attributes.children_type)
    }

    pub fn set_children_type(&mut self, children_type: Option<ChildrenType>) {
        each_variant!(self, b => b.attributes.children_type = children_type)
    }

    /// Text of text-bearing blocks (captions included).
    pub fn text(&self) -> Option<&str> {
        match self {
            Block::Paragraph(b) | Block::Heading(b) | Block::Math(b) => Some(&b.text),
            Block::Code(b) => Some(&b.text),
            Block::Image(b) | Block::Video(b) => Some(&b.text),
            Block::Button(b) => Some(&b.text),
            Block::File(_) | Block::Embed(_) | Block::WebEmbed(_) | Block::Query(_) => None,
        }
    }

    pub fn annotations(&self) -> &[Annotation] {
        match self {
            Block::Paragraph(b) | Block::Heading(b) | Block::Math(b) => &b.annotations,
            Block::Code(b) => &b.annotations,
            Block::Image(b) | Block::Video(b) => &b.annotations,
            Block::File(_)
            | Block::Button(_)
            | Block::Embed(_)
            | Block::WebEmbed(_)
            | Block::Query(_) => &[],
        }
    }

    pub fn link(&self) -> Option<&str> {
        match self {
            Block::Image(b) | Block::Video(b) => Some(&b.link),
            Block::File(b) => Some(&b.link),
            Block::Button(b) => Some(&b.link),
            Block::Embed(b) => Some(&b.link),
            Block::WebEmbed(b) => Some(&b.link),
            Block::Paragraph(_)
            | Block::Heading(_)
            | Block::Math(_)
            | Block::Code(_)
            | Block::Query(_) => None,
        }
    }

    /// An empty paragraph with no annotations: the editor's placeholder line.
    pub fn is_empty_paragraph(&self) -> bool {
        matches!(self, Block::Paragraph(b) if b.text.is_empty() && b.annotations.is_empty())
    }

    /// Check the block against its type-specific schema.
    pub fn validate(&self) -> crate::Result<()> {
        let id = self.id();
        if id.is_empty() {
            return Err(ValidationError::EmptyBlockId { kind: self.kind() });
        }
        if let Some(text) = self.text() {
            let len = text.chars().count() as u32;
            for annotation in self.annotations() {
                annotation.validate(id, len)?;
            }
        }
        match self {
            Block::Embed(b) if b.link.is_empty() => Err(ValidationError::MissingLink {
                block_id: id.to_string(),
                kind: BlockKind::Embed,
            }),
            Block::Embed(b) if HmId::parse(&b.link).is_none() => {
                Err(ValidationError::InvalidEmbedLink {
                    block_id: id.to_string(),
                    link: b.link.clone(),
                })
            }
            Block::WebEmbed(b) if b.link.is_empty() => Err(ValidationError::MissingLink {
                block_id: id.to_string(),
                kind: BlockKind::WebEmbed,
            }),
            _ => Ok(()),
        }
    }
}

/// One node of a document's content tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockNode {
    pub block: Block,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<BlockNode>,
}

impl BlockNode {
    pub fn new(block: Block) -> Self {
        Self {
            block,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<BlockNode>) -> Self {
        self.children = children;
        self
    }
}
