//! Deterministic DAG-CBOR encoding.
//!
//! Only the subset the comment record needs. [`Value`] is built in memory
//! and written through a [`minicbor::Encoder`], which emits shortest-form
//! integer and length headers. On top of that:
//!
//! - map keys are text, sorted by encoded length first, then bytewise
//! - CIDs are tag 42 over a byte string of `0x00` + binary CID
//!
//! The same [`Value`] always encodes to the same bytes; signatures and
//! content addresses depend on it.

use std::convert::Infallible;

use cid::Cid;
use cid::multihash::Multihash;
use minicbor::Encoder;
use minicbor::data::Tag;
use minicbor::encode::Write;

/// DAG-CBOR tag for CID links.
pub const CID_TAG: u64 = 42;

/// Multicodec of DAG-CBOR blocks.
pub const DAG_CBOR_CODEC: u64 = 0x71;
/// Multicodec of opaque binary blocks (attachments).
pub const RAW_CODEC: u64 = 0x55;
/// Multihash code of BLAKE3-256.
pub const BLAKE3_256: u64 = 0x1e;

/// Encoding into a `Vec` never fails on I/O.
pub type EncodeError = minicbor::encode::Error<Infallible>;

/// CIDv1 of a blob, BLAKE3-256 over its bytes.
pub fn blob_cid(codec: u64, data: &[u8]) -> Result<Cid, cid::multihash::Error> {
    let digest = blake3::hash(data);
    Ok(Cid::new_v1(codec, Multihash::<64>::wrap(BLAKE3_256, digest.as_bytes())?))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Unsigned(u64),
    /// Encodes `-1 - n`.
    Negative(u64),
    Bytes(Vec<u8>),
    Text(String),
    Array(Vec<Value>),
    /// Entry order is irrelevant; the encoder sorts.
    Map(Vec<(String, Value)>),
    Bool(bool),
    Null,
    Link(Cid),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn int(n: i64) -> Self {
        if n >= 0 {
            Value::Unsigned(n as u64)
        } else {
            Value::Negative((-1 - n) as u64)
        }
    }

    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Look up a map entry. `None` for non-maps.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        let mut out = Vec::new();
        self.encode_into(&mut Encoder::new(&mut out))?;
        Ok(out)
    }

    pub fn encode_into<W: Write>(
        &self,
        enc: &mut Encoder<W>,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        match self {
            Value::Unsigned(n) => {
                enc.u64(*n)?;
            }
            Value::Negative(n) => {
                let n = i64::try_from(*n)
                    .map_err(|_| minicbor::encode::Error::message("negative integer out of range"))?;
                enc.i64(-1 - n)?;
            }
            Value::Bytes(bytes) => {
                enc.bytes(bytes)?;
            }
            Value::Text(s) => {
                enc.str(s)?;
            }
            Value::Array(items) => {
                enc.array(items.len() as u64)?;
                for item in items {
                    item.encode_into(enc)?;
                }
            }
            Value::Map(entries) => {
                let mut sorted: Vec<&(String, Value)> = entries.iter().collect();
                sorted.sort_by(|(a, _), (b, _)| {
                    a.len().cmp(&b.len()).then_with(|| a.as_bytes().cmp(b.as_bytes()))
                });
                enc.map(sorted.len() as u64)?;
                for (key, value) in sorted {
                    enc.str(key)?;
                    value.encode_into(enc)?;
                }
            }
            Value::Bool(b) => {
                enc.bool(*b)?;
            }
            Value::Null => {
                enc.null()?;
            }
            Value::Link(cid) => {
                let mut payload = vec![0x00];
                payload.extend_from_slice(&cid.to_bytes());
                enc.tag(Tag::new(CID_TAG))?.bytes(&payload)?;
            }
        }
        Ok(())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Unsigned(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Unsigned(n.into())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Cid> for Value {
    fn from(cid: Cid) -> Self {
        Value::Link(cid)
    }
}
