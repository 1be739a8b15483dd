//! The interactive editor's block representation.
//!
//! Editor blocks hold nested inline runs (styled text, link wrappers and
//! inline-embed placeholders) instead of flat text with standoff offsets.
//! Block properties are strings, as the editor stores them; numeric and JSON
//! properties are parsed during encoding.

use serde::{Deserialize, Serialize};

use hyperdoc_types::AnnotationKind;

fn is_false(b: &bool) -> bool {
    !*b
}

/// Style flags of one text run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Styles {
    #[serde(skip_serializing_if = "is_false")]
    pub bold: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub italic: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub underline: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub strike: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub code: bool,
    /// Highlight.
    #[serde(skip_serializing_if = "is_false")]
    pub range: bool,
}

impl Styles {
    pub const KINDS: [AnnotationKind; 6] = [
        AnnotationKind::Bold,
        AnnotationKind::Italic,
        AnnotationKind::Underline,
        AnnotationKind::Strike,
        AnnotationKind::Code,
        AnnotationKind::Range,
    ];

    pub fn is_plain(&self) -> bool {
        *self == Self::default()
    }

    pub fn get(&self, kind: AnnotationKind) -> bool {
        match kind {
            AnnotationKind::Bold => self.bold,
            AnnotationKind::Italic => self.italic,
            AnnotationKind::Underline => self.underline,
            AnnotationKind::Strike => self.strike,
            AnnotationKind::Code => self.code,
            AnnotationKind::Range => self.range,
            AnnotationKind::Link | AnnotationKind::Embed => false,
        }
    }

    /// Turn on the flag for a style kind. Link and Embed are not styles and
    /// are ignored.
    pub fn set(&mut self, kind: AnnotationKind) {
        match kind {
            AnnotationKind::Bold => self.bold = true,
            AnnotationKind::Italic => self.italic = true,
            AnnotationKind::Underline => self.underline = true,
            AnnotationKind::Strike => self.strike = true,
            AnnotationKind::Code => self.code = true,
            AnnotationKind::Range => self.range = true,
            AnnotationKind::Link | AnnotationKind::Embed => {}
        }
    }

    /// Active style kinds, in annotation order.
    pub fn active(&self) -> impl Iterator<Item = AnnotationKind> + '_ {
        Self::KINDS.into_iter().filter(|&k| self.get(k))
    }
}

/// A run of uniformly styled text.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyledText {
    pub text: String,
    #[serde(default)]
    pub styles: Styles,
}

impl StyledText {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            styles: Styles::default(),
        }
    }

    pub fn styled(text: impl Into<String>, styles: Styles) -> Self {
        Self {
            text: text.into(),
            styles,
        }
    }
}

/// One inline item of an editor block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum InlineContent {
    Text(StyledText),
    Link {
        href: String,
        #[serde(default)]
        content: Vec<StyledText>,
    },
    /// Occupies exactly one placeholder code point in canonical text.
    InlineEmbed {
        link: String,
        #[serde(default)]
        styles: Styles,
    },
}

/// Editor block type names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EditorBlockType {
    Paragraph,
    Heading,
    #[serde(alias = "codeBlock")]
    CodeBlock,
    Math,
    Image,
    Video,
    File,
    Button,
    Embed,
    #[serde(alias = "webEmbed")]
    WebEmbed,
    Query,
}

/// Editor block properties. All values are strings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", alias = "ref")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_count: Option<String>,
    /// JSON array of query includes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_includes: Option<String>,
    /// JSON array of query sort terms.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_sort: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_limit: Option<String>,
    /// `"true"` or `"false"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,
}

/// A block as the editor sees it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorBlock {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EditorBlockType,
    #[serde(default)]
    pub props: EditorProps,
    #[serde(default)]
    pub content: Vec<InlineContent>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<EditorBlock>,
}

impl EditorBlock {
    pub fn new(id: impl Into<String>, kind: EditorBlockType) -> Self {
        Self {
            id: id.into(),
            kind,
            props: EditorProps::default(),
            content: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_content(mut self, content: Vec<InlineContent>) -> Self {
        self.content = content;
        self
    }

    pub fn with_props(mut self, props: EditorProps) -> Self {
        self.props = props;
        self
    }

    pub fn with_children(mut self, children: Vec<EditorBlock>) -> Self {
        self.children = children;
        self
    }

    /// Visible text: runs concatenated, one placeholder per inline embed.
    pub fn visible_text(&self) -> String {
        let mut out = String::new();
        for item in &self.content {
            match item {
                InlineContent::Text(run) => out.push_str(&run.text),
                InlineContent::Link { content, .. } => {
                    content.iter().for_each(|run| out.push_str(&run.text))
                }
                InlineContent::InlineEmbed { .. } => out.push(crate::EMBED_PLACEHOLDER),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_editor_block_json() {
        let block: EditorBlock = serde_json::from_value(serde_json::json!({
            "id": "blk00001",
            "type": "codeBlock",
            "props": { "language": "rust", "ref": "hm://z6Mkabc" },
            "content": [
                { "type": "text", "text": "fn ", "styles": {} },
                { "type": "link", "href": "https://x.example", "content": [
                    { "type": "text", "text": "main", "styles": { "bold": true } }
                ]},
                { "type": "inline-embed", "link": "hm://z6Mkabc" }
            ]
        }))
        .unwrap();
        assert_eq!(block.kind, EditorBlockType::CodeBlock);
        assert_eq!(block.props.language.as_deref(), Some("rust"));
        assert_eq!(block.props.url.as_deref(), Some("hm://z6Mkabc"));
        assert_eq!(block.content.len(), 3);
        assert_eq!(block.visible_text(), "fn main\u{FFFC}");
    }

    #[test]
    fn test_styles_skip_false_flags() {
        let styles = Styles {
            bold: true,
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(styles).unwrap(), serde_json::json!({"bold": true}));
        let kinds: Vec<AnnotationKind> = styles.active().collect();
        assert_eq!(kinds, vec![AnnotationKind::Bold]);
    }
}
