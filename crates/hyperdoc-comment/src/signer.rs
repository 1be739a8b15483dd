//! Signer capability and the in-process Ed25519 implementation.
//!
//! Public keys travel as *principals*: the Ed25519 multicodec varint
//! (`0xed 0x01`) followed by the 32 raw key bytes. An account uid is the
//! base58btc multibase form of a principal (`z` + base58).

use async_trait::async_trait;
use ed25519_dalek::{Signature, Signer as _, SigningKey, Verifier as _, VerifyingKey};

use crate::error::SignerError;

pub const ED25519_MULTICODEC: [u8; 2] = [0xed, 0x01];
pub const ED25519_PUBLIC_KEY_LEN: usize = 32;
pub const ED25519_PRINCIPAL_LEN: usize = ED25519_MULTICODEC.len() + ED25519_PUBLIC_KEY_LEN;
pub const SIGNATURE_LEN: usize = 64;

/// Signs comment bytes on behalf of an account.
///
/// Implementations may be remote (hardware key, keystore service), hence
/// async.
#[async_trait]
pub trait Signer: Send + Sync {
    /// Principal bytes of the signing key.
    async fn public_key(&self) -> Result<Vec<u8>, SignerError>;

    async fn sign(&self, data: &[u8]) -> Result<Vec<u8>, SignerError>;
}

/// Base58btc multibase string of a principal.
pub fn principal_to_uid(principal: &[u8]) -> String {
    format!("z{}", bs58::encode(principal).into_string())
}

/// Verify an Ed25519 signature made by `principal` over `data`.
pub fn verify(principal: &[u8], data: &[u8], sig: &[u8]) -> bool {
    let Some(raw) = principal.strip_prefix(ED25519_MULTICODEC.as_slice()) else {
        return false;
    };
    let Ok(raw) = <[u8; ED25519_PUBLIC_KEY_LEN]>::try_from(raw) else {
        return false;
    };
    let Ok(key) = VerifyingKey::from_bytes(&raw) else {
        return false;
    };
    let Ok(sig) = Signature::from_slice(sig) else {
        return false;
    };
    key.verify(data, &sig).is_ok()
}

/// Ed25519 key held in process memory.
pub struct Ed25519Signer {
    key: SigningKey,
}

impl Ed25519Signer {
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            key: SigningKey::from_bytes(seed),
        }
    }

    /// Seed given as 64 hex characters.
    pub fn from_seed_hex(seed: &str) -> Result<Self, SignerError> {
        let bytes = hex::decode(seed.trim()).map_err(|e| SignerError::InvalidKey(e.to_string()))?;
        let seed = <[u8; 32]>::try_from(bytes.as_slice()).map_err(|_| {
            SignerError::InvalidKey(format!("seed has {} bytes, expected 32", bytes.len()))
        })?;
        Ok(Self::from_seed(&seed))
    }

    pub fn generate() -> Self {
        Self::from_seed(&rand::random::<[u8; 32]>())
    }

    pub fn principal(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(ED25519_PRINCIPAL_LEN);
        out.extend_from_slice(&ED25519_MULTICODEC);
        out.extend_from_slice(self.key.verifying_key().as_bytes());
        out
    }

    pub fn account_uid(&self) -> String {
        principal_to_uid(&self.principal())
    }
}

impl std::fmt::Debug for Ed25519Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ed25519Signer")
            .field("account", &self.account_uid())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Signer for Ed25519Signer {
    async fn public_key(&self) -> Result<Vec<u8>, SignerError> {
        Ok(self.principal())
    }

    async fn sign(&self, data: &[u8]) -> Result<Vec<u8>, SignerError> {
        Ok(self.key.sign(data).to_bytes().to_vec())
    }
}
