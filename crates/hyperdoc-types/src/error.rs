//! Schema validation errors for blocks and annotations.

use thiserror::Error;

use crate::block::{AnnotationKind, BlockKind};

/// A block or annotation that breaks its schema.
///
/// Always surfaced to the caller. Nothing in this crate coerces an invalid
/// block into a valid one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Every block needs a stable id.
    #[error("{kind} block has an empty id")]
    EmptyBlockId { kind: BlockKind },

    /// `starts` and `ends` must be parallel arrays.
    #[error("block {block_id}: {annotation} annotation has {starts} starts but {ends} ends")]
    MismatchedSpans {
        block_id: String,
        annotation: AnnotationKind,
        starts: usize,
        ends: usize,
    },

    /// A span must have `start < end`.
    #[error("block {block_id}: {annotation} span [{start}, {end}) is empty or inverted")]
    EmptySpan {
        block_id: String,
        annotation: AnnotationKind,
        start: u32,
        end: u32,
    },

    /// Spans of one annotation must be sorted and disjoint.
    #[error("block {block_id}: {annotation} spans overlap or are unsorted at offset {start}")]
    OverlappingSpans {
        block_id: String,
        annotation: AnnotationKind,
        start: u32,
    },

    /// Span ends are bounded by the text length in code points.
    #[error("block {block_id}: {annotation} span ends at {end} past text length {len}")]
    SpanOutOfBounds {
        block_id: String,
        annotation: AnnotationKind,
        end: u32,
        len: u32,
    },

    /// Link and Embed annotations must name a target.
    #[error("block {block_id}: {annotation} annotation is missing its link")]
    MissingAnnotationLink {
        block_id: String,
        annotation: AnnotationKind,
    },

    /// Link-bearing block without a link.
    #[error("{kind} block {block_id} is missing its link")]
    MissingLink { block_id: String, kind: BlockKind },

    /// Embed blocks must point at a hypermedia identifier.
    #[error("embed block {block_id} links to {link:?}, which is not a hypermedia id")]
    InvalidEmbedLink { block_id: String, link: String },
}
