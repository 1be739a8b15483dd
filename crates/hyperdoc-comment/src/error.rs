//! Error types for comment construction and signing.

use thiserror::Error;

use hyperdoc_types::{AnnotationKind, BlockKind};

/// Errors from the signer capability. Always fatal to a publish.
#[derive(Error, Debug)]
pub enum SignerError {
    #[error("signer unavailable: {0}")]
    Unavailable(String),

    #[error("signer rejected the request: {0}")]
    Rejected(String),

    #[error("invalid key material: {0}")]
    InvalidKey(String),

    #[error("signature has {len} bytes, expected {expected}")]
    BadSignature { len: usize, expected: usize },
}

#[derive(Error, Debug)]
pub enum CommentError {
    /// Only Bold/Italic/Underline/Strike/Code/Link/Embed are publishable.
    #[error("block {block_id}: {kind} annotations cannot be published in comments")]
    UnsupportedAnnotation {
        block_id: String,
        kind: AnnotationKind,
    },

    #[error("block {block_id}: {kind} blocks cannot be published in comments")]
    UnsupportedBlock { block_id: String, kind: BlockKind },

    /// Nesting beyond [`hyperdoc_codec::MAX_TREE_DEPTH`].
    #[error("comment body nested deeper than {0} levels")]
    TooDeep(usize),

    #[error("comment target version is empty")]
    EmptyVersion,

    #[error("invalid CID {value:?}: {source}")]
    InvalidCid {
        value: String,
        #[source]
        source: cid::Error,
    },

    #[error("account {uid:?} is not base58btc: {reason}")]
    InvalidAccount { uid: String, reason: String },

    #[error("encoding comment: {0}")]
    Cbor(#[from] crate::cbor::EncodeError),

    #[error("hashing blob: {0}")]
    Hash(#[from] cid::multihash::Error),

    #[error(transparent)]
    Signer(#[from] SignerError),
}

impl CommentError {
    pub fn invalid_cid(value: &str, source: cid::Error) -> Self {
        Self::InvalidCid {
            value: value.to_string(),
            source,
        }
    }
}
