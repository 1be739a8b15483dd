//! Block codec for hyperdoc.
//!
//! Converts between the rich-text editor's representation (nested inline
//! runs with style flags) and canonical blocks (flat text plus standoff
//! annotations in code-point offsets), and walks canonical block trees.
//!
//! # Data Flow
//!
//! ```text
//! EditorBlock ──encode_editor_block──▶ Block
//!   content: InlineContent[]             text: "Hello \u{FFFC} world"
//!   (Text | Link | InlineEmbed)          annotations: Bold/.../Link/Embed spans
//!          ◀──────decode_block───────
//!
//! BlockNode[] ──walk / find_block / references──▶ &BlockNode, HmId
//!             ──expand_embeds(source)──────────▶ ExpandedNode[] (Circular / Missing / TooDeep)
//! serde_json::Value ──parse_document_lossy──────▶ Document (invalid parts dropped)
//! ```
//!
//! # Modules
//!
//! |-------------|----------------------------------------------------|
//! | Module      | Purpose                                            |
//! |-------------|----------------------------------------------------|
//! | `unicode`   | Code-point offsets, annotation accumulator         |
//! | `editor`    | Editor-side block and inline types                 |
//! | `encode`    | Editor → canonical                                 |
//! | `decode`    | Canonical → editor                                 |
//! | `tree`      | Iterative block-tree walks                         |
//! | `embeds`    | Embed expansion with cycle detection               |
//! | `document`  | Lossy document record parsing                      |
//! |-------------|----------------------------------------------------|

pub mod decode;
pub mod document;
pub mod editor;
pub mod embeds;
pub mod encode;
pub mod error;
pub mod tree;
pub mod unicode;

pub use decode::{decode_block, decode_block_nodes, decode_inline, style_kinds};
pub use document::{DocumentExt, parse_document_lossy};
pub use editor::{
    EditorBlock, EditorBlockType, EditorProps, InlineContent, StyledText, Styles,
};
pub use embeds::{DocumentSource, ExpandedNode, Expansion, expand_embeds};
pub use encode::{EncodedText, encode_editor_block, encode_editor_blocks, encode_inline};
pub use error::{DocumentError, EncodeError};
pub use tree::{
    Walk, find_block, mentioned_accounts, query_blocks, references, trim_trailing_empty_blocks,
    walk,
};
pub use unicode::{AnnotationAccumulator, code_point_length};

/// Maximum block-tree depth before walks and codecs stop descending.
pub const MAX_TREE_DEPTH: usize = 512;

/// Object replacement character standing in for an inline embed.
pub const EMBED_PLACEHOLDER: char = '\u{FFFC}';
pub const EMBED_PLACEHOLDER_STR: &str = "\u{FFFC}";

pub type Result<T> = std::result::Result<T, EncodeError>;
