//! Comment construction, signing and publish preparation.
//!
//! ```text
//! BlockNode[] ──CommentBuilder::build(signer key)──▶ UnsignedComment (sig = 64 zero bytes)
//!                                                       │ encode() → DAG-CBOR bytes
//!                                  sign(&dyn Signer) ◀──┘
//!                                        │
//!                                        ▼
//!                                  SignedComment ──encode()──▶ comment blob
//! ```
//!
//! `replyParent` and `threadRoot` are omitted from the record when unset,
//! never encoded as null: their presence changes the content address.

use cid::Cid;
use rand::Rng;
use rand::distributions::Alphanumeric;

use hyperdoc_codec::trim_trailing_empty_blocks;
use hyperdoc_types::{
    Block, BlockNode, ChildrenType, EmbedAttributes, EmbedBlock, EmbedView, HmId,
};

use crate::cbor::{DAG_CBOR_CODEC, Value, blob_cid};
use crate::error::{CommentError, SignerError};
use crate::publishable::{PublishableBlock, to_publishable};
use crate::signer::{SIGNATURE_LEN, Signer, verify};
use crate::{Result, now_millis};

const QUOTE_BLOCK_ID_LEN: usize = 8;

/// Decode an account uid (`z` + base58btc) into its raw bytes.
pub fn decode_account(uid: &str) -> Result<Vec<u8>> {
    let invalid = |reason: String| CommentError::InvalidAccount {
        uid: uid.to_string(),
        reason,
    };
    let body = uid
        .strip_prefix('z')
        .ok_or_else(|| invalid("missing 'z' multibase prefix".to_string()))?;
    bs58::decode(body).into_vec().map_err(|e| invalid(e.to_string()))
}

fn parse_cid(value: &str) -> Result<Cid> {
    value
        .parse::<Cid>()
        .map_err(|e| CommentError::invalid_cid(value, e))
}

/// Parse a `.`-joined version string into its head CIDs.
pub fn parse_version(version: &str) -> Result<Vec<Cid>> {
    if version.trim().is_empty() {
        return Err(CommentError::EmptyVersion);
    }
    version.split('.').map(parse_cid).collect()
}

fn optional_cid(value: Option<&str>) -> Result<Option<Cid>> {
    value.filter(|v| !v.is_empty()).map(parse_cid).transpose()
}

fn random_block_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(QUOTE_BLOCK_ID_LEN)
        .map(char::from)
        .collect()
}

/// A comment record before signing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnsignedComment {
    pub body: Vec<PublishableBlock>,
    /// Raw bytes of the target account.
    pub space: Vec<u8>,
    /// `"/a/b"` form, `""` for the account root.
    pub path: String,
    pub version: Vec<Cid>,
    pub reply_parent: Option<Cid>,
    pub thread_root: Option<Cid>,
    /// Signer principal.
    pub signer: Vec<u8>,
    /// Unix milliseconds.
    pub ts: u64,
}

impl UnsignedComment {
    fn to_cbor(&self, sig: &[u8]) -> Value {
        let mut entries = vec![
            ("type", Value::text("Comment")),
            ("body", Value::Array(self.body.iter().map(PublishableBlock::to_cbor).collect())),
            ("space", Value::Bytes(self.space.clone())),
            ("path", Value::text(self.path.as_str())),
            ("version", Value::Array(self.version.iter().copied().map(Value::Link).collect())),
            ("signer", Value::Bytes(self.signer.clone())),
            ("ts", Value::Unsigned(self.ts)),
            ("sig", Value::Bytes(sig.to_vec())),
        ];
        if let Some(cid) = self.reply_parent {
            entries.push(("replyParent", Value::Link(cid)));
        }
        if let Some(cid) = self.thread_root {
            entries.push(("threadRoot", Value::Link(cid)));
        }
        Value::map(entries)
    }

    /// The bytes that get signed: the full record with a zeroed signature.
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(self.to_cbor(&[0; SIGNATURE_LEN]).encode()?)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedComment {
    pub comment: UnsignedComment,
    pub sig: Vec<u8>,
}

impl SignedComment {
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(self.comment.to_cbor(&self.sig).encode()?)
    }

    /// Content address of the encoded comment blob.
    pub fn cid(&self) -> Result<Cid> {
        Ok(blob_cid(DAG_CBOR_CODEC, &self.encode()?)?)
    }

    /// Check the signature against the embedded signer principal.
    pub fn verify(&self) -> bool {
        self.comment
            .encode()
            .is_ok_and(|data| verify(&self.comment.signer, &data, &self.sig))
    }
}

/// Sign an unsigned comment. A failing signer aborts the publish.
pub async fn sign(unsigned: UnsignedComment, signer: &dyn Signer) -> Result<SignedComment> {
    let data = unsigned.encode()?;
    let sig = signer.sign(&data).await?;
    if sig.len() != SIGNATURE_LEN {
        return Err(SignerError::BadSignature {
            len: sig.len(),
            expected: SIGNATURE_LEN,
        }
        .into());
    }
    tracing::debug!(bytes = data.len(), "signed comment");
    Ok(SignedComment {
        comment: unsigned,
        sig,
    })
}

/// Assembles an [`UnsignedComment`] for a target document version.
#[derive(Clone, Debug)]
pub struct CommentBuilder {
    target: HmId,
    version: String,
    content: Vec<BlockNode>,
    reply_parent: Option<String>,
    thread_root: Option<String>,
    quoting_block_id: Option<String>,
    timestamp: Option<u64>,
}

impl CommentBuilder {
    pub fn new(target: HmId, version: impl Into<String>) -> Self {
        Self {
            target,
            version: version.into(),
            content: Vec::new(),
            reply_parent: None,
            thread_root: None,
            quoting_block_id: None,
            timestamp: None,
        }
    }

    pub fn content(mut self, content: Vec<BlockNode>) -> Self {
        self.content = content;
        self
    }

    /// Version (CID) of the comment being replied to.
    pub fn reply_parent(mut self, cid: impl Into<String>) -> Self {
        self.reply_parent = Some(cid.into());
        self
    }

    /// Version (CID) of the first comment of the thread.
    pub fn thread_root(mut self, cid: impl Into<String>) -> Self {
        self.thread_root = Some(cid.into());
        self
    }

    /// Quote a block of the target: the body gets wrapped in an Embed of it.
    pub fn quoting_block(mut self, block_id: impl Into<String>) -> Self {
        self.quoting_block_id = Some(block_id.into());
        self
    }

    /// Fixed timestamp instead of the current time.
    pub fn timestamp(mut self, ts: u64) -> Self {
        self.timestamp = Some(ts);
        self
    }

    fn quote_link(&self, block_id: &str) -> String {
        HmId::new(self.target.uid.clone())
            .with_path(self.target.path.iter().cloned())
            .with_version(self.version.clone())
            .with_block(block_id, None)
            .to_url()
    }

    /// Trailing empty blocks trimmed, then wrapped in the quote embed if
    /// quoting.
    pub fn publish_content(&self) -> Vec<BlockNode> {
        let content = trim_trailing_empty_blocks(&self.content);
        let Some(block_id) = &self.quoting_block_id else {
            return content;
        };
        let quote = Block::Embed(EmbedBlock {
            id: random_block_id(),
            revision: None,
            link: self.quote_link(block_id),
            attributes: EmbedAttributes {
                children_type: Some(ChildrenType::Group),
                view: Some(EmbedView::Content),
            },
        });
        vec![BlockNode::new(quote).with_children(content)]
    }

    pub fn build(&self, signer_key: &[u8]) -> Result<UnsignedComment> {
        let version = parse_version(&self.version)?;
        let body = to_publishable(&self.publish_content())?;
        Ok(UnsignedComment {
            body,
            space: decode_account(&self.target.uid)?,
            path: self.target.entity_query_path(),
            version,
            reply_parent: optional_cid(self.reply_parent.as_deref())?,
            thread_root: optional_cid(self.thread_root.as_deref())?,
            signer: signer_key.to_vec(),
            ts: self.timestamp.unwrap_or_else(now_millis),
        })
    }
}

/// A binary attachment (image, file) published alongside a comment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttachmentBlob {
    pub cid: String,
    pub data: Vec<u8>,
}

/// One blob of a publish request. The comment itself has no precomputed CID.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishBlob {
    pub cid: Option<String>,
    pub data: Vec<u8>,
}

/// Encoded signed comment plus its attachments, ready for storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommentPayload {
    pub comment: Vec<u8>,
    pub blobs: Vec<AttachmentBlob>,
}

impl CommentPayload {
    /// Comment blob first, then attachments in order.
    pub fn to_publish_input(&self) -> Vec<PublishBlob> {
        std::iter::once(PublishBlob {
            cid: None,
            data: self.comment.clone(),
        })
        .chain(self.blobs.iter().map(|blob| PublishBlob {
            cid: Some(blob.cid.clone()),
            data: blob.data.clone(),
        }))
        .collect()
    }
}

/// Build, sign and encode a comment in one step.
pub async fn prepare_comment(
    builder: &CommentBuilder,
    signer: &dyn Signer,
    blobs: Vec<AttachmentBlob>,
) -> Result<CommentPayload> {
    let signer_key = signer.public_key().await?;
    let unsigned = builder.build(&signer_key)?;
    let signed = sign(unsigned, signer).await?;
    Ok(CommentPayload {
        comment: signed.encode()?,
        blobs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signer::Ed25519Signer;
    use async_trait::async_trait;
    use cid::multihash::Multihash;
    use hyperdoc_types::TextBlock;
    use pretty_assertions::assert_eq;

    fn test_cid(fill: u8) -> Cid {
        Cid::new_v1(0x71, Multihash::<64>::wrap(0x12, &[fill; 32]).unwrap())
    }

    fn para(id: &str, text: &str) -> BlockNode {
        BlockNode::new(Block::Paragraph(TextBlock {
            id: id.into(),
            text: text.into(),
            ..Default::default()
        }))
    }

    fn signer() -> Ed25519Signer {
        Ed25519Signer::from_seed(&[5; 32])
    }

    fn target(signer: &Ed25519Signer) -> HmId {
        HmId::new(signer.account_uid()).with_path(["notes", "today"])
    }

    fn builder(signer: &Ed25519Signer) -> CommentBuilder {
        CommentBuilder::new(target(signer), test_cid(1).to_string())
            .content(vec![para("p0000001", "first"), para("p0000002", "")])
            .timestamp(1_700_000_000_000)
    }

    // ── Construction ────────────────────────────────────────────────────

    #[test]
    fn test_build_fills_record() {
        let signer = signer();
        let unsigned = builder(&signer).build(&signer.principal()).unwrap();
        assert_eq!(unsigned.path, "/notes/today");
        assert_eq!(unsigned.space, signer.principal());
        assert_eq!(unsigned.version, vec![test_cid(1)]);
        assert_eq!(unsigned.body.len(), 1);
        assert_eq!(unsigned.ts, 1_700_000_000_000);
        assert!(unsigned.reply_parent.is_none());
    }

    #[test]
    fn test_multi_head_version() {
        let version = format!("{}.{}", test_cid(1), test_cid(2));
        assert_eq!(parse_version(&version).unwrap(), vec![test_cid(1), test_cid(2)]);
    }

    #[test]
    fn test_empty_version_fails() {
        let signer = signer();
        let err = CommentBuilder::new(target(&signer), "")
            .build(&signer.principal())
            .unwrap_err();
        assert!(matches!(err, CommentError::EmptyVersion));

        let err = CommentBuilder::new(target(&signer), "not-a-cid")
            .build(&signer.principal())
            .unwrap_err();
        assert!(matches!(err, CommentError::InvalidCid { .. }));
    }

    #[test]
    fn test_invalid_account_fails() {
        let signer = signer();
        let err = CommentBuilder::new(HmId::new("0OIl"), test_cid(1).to_string())
            .build(&signer.principal())
            .unwrap_err();
        assert!(matches!(err, CommentError::InvalidAccount { .. }));
    }

    #[test]
    fn test_quoting_wraps_body_in_embed() {
        let signer = signer();
        let b = builder(&signer).quoting_block("blk00001");
        let content = b.publish_content();
        assert_eq!(content.len(), 1);
        let Block::Embed(embed) = &content[0].block else {
            panic!("expected embed wrapper");
        };
        assert_eq!(embed.id.len(), 8);
        assert!(embed.id.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(
            embed.link,
            format!("hm://{}/notes/today?v={}#blk00001", signer.account_uid(), test_cid(1))
        );
        assert_eq!(embed.attributes.view, Some(EmbedView::Content));
        assert_eq!(embed.attributes.children_type, Some(ChildrenType::Group));
        assert_eq!(content[0].children.len(), 1);
    }

    // ── Encoding ────────────────────────────────────────────────────────

    #[test]
    fn test_encoding_is_deterministic() {
        let signer = signer();
        let a = builder(&signer).build(&signer.principal()).unwrap();
        let b = builder(&signer).build(&signer.principal()).unwrap();
        assert_eq!(a.encode().unwrap(), b.encode().unwrap());
    }

    #[test]
    fn test_optional_links_are_absent_not_null() {
        let signer = signer();
        let plain = builder(&signer).build(&signer.principal()).unwrap();
        let value = plain.to_cbor(&[0; SIGNATURE_LEN]);
        assert_eq!(value.get("replyParent"), None);
        assert_eq!(value.get("threadRoot"), None);

        let reply = builder(&signer)
            .reply_parent(test_cid(3).to_string())
            .thread_root(test_cid(4).to_string())
            .build(&signer.principal())
            .unwrap();
        let value = reply.to_cbor(&[0; SIGNATURE_LEN]);
        assert_eq!(value.get("replyParent"), Some(&Value::Link(test_cid(3))));
        assert_eq!(value.get("threadRoot"), Some(&Value::Link(test_cid(4))));
        assert!(reply.encode().unwrap().len() > plain.encode().unwrap().len());
    }

    #[test]
    fn test_record_keys_in_canonical_order() {
        let signer = signer();
        let bytes = builder(&signer).build(&signer.principal()).unwrap().encode().unwrap();
        // 8 entries; "ts" is the shortest key so it comes first.
        assert_eq!(&bytes[..4], &[0xa8, 0x62, b't', b's']);
        let sig_key = bytes.windows(4).position(|w| w == b"\x63sig".as_slice());
        let version_key = bytes.windows(8).position(|w| w == b"\x67version".as_slice());
        assert!(sig_key.unwrap() < version_key.unwrap());
    }

    #[test]
    fn test_unsigned_record_carries_zero_signature() {
        let signer = signer();
        let unsigned = builder(&signer).build(&signer.principal()).unwrap();
        let value = unsigned.to_cbor(&[0; SIGNATURE_LEN]);
        assert_eq!(value.get("sig"), Some(&Value::Bytes(vec![0; 64])));
        assert_eq!(value.get("type"), Some(&Value::text("Comment")));
    }

    // ── Signing ─────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_sign_and_verify() {
        let signer = signer();
        let unsigned = builder(&signer).build(&signer.principal()).unwrap();
        let signed = sign(unsigned.clone(), &signer).await.unwrap();
        assert!(signed.verify());
        assert_ne!(signed.encode().unwrap(), unsigned.encode().unwrap());
        assert_eq!(signed.cid().unwrap(), signed.clone().cid().unwrap());

        let mut tampered = signed.clone();
        tampered.comment.ts += 1;
        assert!(!tampered.verify());
    }

    struct BrokenSigner;

    #[async_trait]
    impl Signer for BrokenSigner {
        async fn public_key(&self) -> std::result::Result<Vec<u8>, SignerError> {
            Ok(vec![0xed, 0x01])
        }

        async fn sign(&self, _data: &[u8]) -> std::result::Result<Vec<u8>, SignerError> {
            Err(SignerError::Unavailable("keystore offline".into()))
        }
    }

    #[tokio::test]
    async fn test_signer_failure_aborts_publish() {
        let signer = signer();
        let err = prepare_comment(&builder(&signer), &BrokenSigner, vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, CommentError::Signer(SignerError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_prepare_comment_orders_comment_first() {
        let signer = signer();
        let attachment = AttachmentBlob {
            cid: test_cid(9).to_string(),
            data: vec![1, 2, 3],
        };
        let payload = prepare_comment(&builder(&signer), &signer, vec![attachment.clone()])
            .await
            .unwrap();
        let input = payload.to_publish_input();
        assert_eq!(input.len(), 2);
        assert_eq!(input[0].cid, None);
        assert_eq!(input[0].data, payload.comment);
        assert_eq!(input[1].cid, Some(attachment.cid));
    }
}
