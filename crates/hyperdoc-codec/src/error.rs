//! Error types for the block codec.

use thiserror::Error;

use hyperdoc_types::ValidationError;

use crate::editor::{EditorBlock, EditorBlockType};

/// Errors encoding editor blocks into canonical blocks.
#[derive(Error, Debug)]
pub enum EncodeError {
    /// A property that does not parse as its expected type.
    #[error("block {block_id}: invalid {prop} value {value:?}")]
    InvalidProp {
        block_id: String,
        prop: &'static str,
        value: String,
    },

    /// A JSON-valued property (query includes/sort) that is not valid JSON
    /// for its shape.
    #[error("block {block_id}: malformed {prop}: {source}")]
    InvalidJson {
        block_id: String,
        prop: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Inline content on a block type that cannot hold it: annotations on a
    /// button label, or any text on a file, embed, web embed or query.
    #[error("block {block_id}: {kind:?} blocks cannot carry {what}")]
    UnsupportedContent {
        block_id: String,
        kind: EditorBlockType,
        what: &'static str,
    },

    /// The encoded block failed its schema.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Nesting beyond [`crate::MAX_TREE_DEPTH`].
    #[error("block tree nested deeper than {0} levels")]
    TooDeep(usize),
}

impl EncodeError {
    pub fn unsupported_content(block: &EditorBlock, what: &'static str) -> Self {
        Self::UnsupportedContent {
            block_id: block.id.clone(),
            kind: block.kind,
            what,
        }
    }

    pub fn invalid_prop(block_id: &str, prop: &'static str, value: &str) -> Self {
        Self::InvalidProp {
            block_id: block_id.to_string(),
            prop,
            value: value.to_string(),
        }
    }
}

/// Errors parsing a document record.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("document record is not a JSON object")]
    NotAnObject,

    #[error("document record has no account")]
    MissingAccount,
}
