//! Error types for storage access and activity resolution.

use std::sync::Arc;

use thiserror::Error;

/// Errors reported by a [`crate::HypermediaStore`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },

    #[error("invalid page token: {0}")]
    InvalidPageToken(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            key: key.into(),
        }
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Failure to resolve one event. Logged and dropped by the resolver.
#[derive(Error, Debug, Clone)]
pub enum ActivityError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A fetch shared through the request cache failed.
    #[error("{0}")]
    Fetch(Arc<StoreError>),

    #[error("event is missing {0}")]
    MissingField(&'static str),

    #[error("invalid hypermedia id: {0:?}")]
    InvalidId(String),
}

impl ActivityError {
    pub fn invalid_id(id: impl Into<String>) -> Self {
        Self::InvalidId(id.into())
    }
}

impl From<Arc<StoreError>> for ActivityError {
    fn from(err: Arc<StoreError>) -> Self {
        Self::Fetch(err)
    }
}
