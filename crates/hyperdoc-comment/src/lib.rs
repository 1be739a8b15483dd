//! Signed comments for hyperdoc.
//!
//! A comment is an immutable, content-addressed record attached to one
//! version of a document. Its bytes are deterministic DAG-CBOR so that the
//! signature (and any CID computed over it) is reproducible.
//!
//! # Comment Record
//!
//! ```text
//! {
//!   type:        "Comment"
//!   body:        PublishableBlock[]
//!   space:       bytes    (target account)
//!   path:        "/a/b"
//!   version:     CID[]    (tag 42 links)
//!   replyParent: CID      (absent unless replying)
//!   threadRoot:  CID      (absent unless replying)
//!   signer:      bytes    (0xed01 + ed25519 public key)
//!   ts:          u64      (unix ms)
//!   sig:         bytes    (64, zeroed while signing)
//! }
//! ```
//!
//! # Key Types
//!
//! |---------------------|--------------------------------------------|
//! | Type                | Purpose                                    |
//! |---------------------|--------------------------------------------|
//! | [`CommentBuilder`]  | Target, version, content, reply links      |
//! | [`UnsignedComment`] | Record awaiting a signature                |
//! | [`SignedComment`]   | Record + signature, encodes to the blob    |
//! | [`Signer`]          | Async signing capability                   |
//! | [`Ed25519Signer`]   | In-process key                             |
//! | [`CommentPayload`]  | Encoded comment + attachment blobs         |
//! |---------------------|--------------------------------------------|

pub mod cbor;
pub mod comment;
pub mod error;
pub mod publishable;
pub mod signer;

pub use cbor::{DAG_CBOR_CODEC, RAW_CODEC, blob_cid};
pub use comment::{
    AttachmentBlob, CommentBuilder, CommentPayload, PublishBlob, SignedComment, UnsignedComment,
    decode_account, parse_version, prepare_comment, sign,
};
pub use error::{CommentError, SignerError};
pub use publishable::{PublishableAnnotation, PublishableBlock, to_publishable};
pub use signer::{Ed25519Signer, Signer, principal_to_uid, verify};

pub type Result<T> = std::result::Result<T, CommentError>;

pub(crate) fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
