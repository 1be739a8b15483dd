//! Identifier and block data model for hyperdoc.
//!
//! This crate is the foundation the codec, comment and activity crates build
//! on: hypermedia identifiers, the canonical block tree with standoff
//! annotations, and the document / comment records the storage layer hands
//! back. It performs no I/O.
//!
//! # Content Model
//!
//! ```text
//! Document (account + path + version)
//!     └── content: BlockNode[]
//!           └── block: Block (Paragraph | Heading | Code | Math | Image | Video
//!           │                 | File | Button | Embed | WebEmbed | Query)
//!           │     └── text + annotations (starts/ends in code points)
//!           └── children: BlockNode[]
//!
//! Comment (author/tsid)
//!     └── target: account + path + version
//!     └── replyParent / threadRoot
//!     └── content: BlockNode[]
//! ```
//!
//! # Key Types
//!
//! |--------------------|-----------------------------------------------|
//! | Type               | Purpose                                       |
//! |--------------------|-----------------------------------------------|
//! | [`HmId`]           | `hm://uid/path?v=..#block[range]` identifier  |
//! | [`BlockFragment`]  | Block id plus optional expanded/exact range   |
//! | [`Block`]          | Canonical content block (tagged union)        |
//! | [`Annotation`]     | Standoff style/link/embed marker              |
//! | [`BlockNode`]      | Content tree node                             |
//! | [`Document`]       | Versioned document record                     |
//! | [`Comment`]        | Stored comment record                         |
//! |--------------------|-----------------------------------------------|

pub mod block;
pub mod document;
pub mod error;
pub mod ids;
pub mod time;

pub use block::{
    Annotation, AnnotationKind, BaseAttributes, Block, BlockKind, BlockNode, ButtonAlignment,
    ButtonAttributes, ButtonBlock, ChildrenType, CodeAttributes, CodeBlock, EmbedAttributes,
    EmbedBlock, EmbedView, FileAttributes, FileBlock, LinkBlock, LinkSpans, MediaAttributes,
    MediaBlock, Query, QueryAttributes, QueryBlock, QueryInclude, QueryIncludeMode, QuerySort,
    QuerySortTerm, QueryStyle, Spans, TextBlock,
};
pub use document::{Comment, Document, DocumentMetadata};
pub use error::ValidationError;
pub use ids::{
    BlockFragment, BlockRange, HmId, InvalidHmId, is_block_ref, parse_fragment,
    serialize_fragment,
};

pub type Result<T> = std::result::Result<T, ValidationError>;
