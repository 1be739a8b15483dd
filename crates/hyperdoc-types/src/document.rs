//! Documents and comments as returned by the storage layer.

use serde::{Deserialize, Serialize};

use crate::block::BlockNode;
use crate::ids::HmId;
use crate::time::deserialize_millis;

/// Display metadata of a document (or of an account's root document).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
}

/// A document at one version.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Owning account uid.
    pub account: String,
    /// `"/a/b"` form; `""` for the account's root document.
    #[serde(default)]
    pub path: String,
    /// `.`-joined head CIDs.
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub metadata: DocumentMetadata,
    #[serde(default)]
    pub content: Vec<BlockNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genesis: Option<String>,
    /// Unix milliseconds.
    #[serde(default, deserialize_with = "deserialize_millis")]
    pub create_time: u64,
    #[serde(default, deserialize_with = "deserialize_millis")]
    pub update_time: u64,
}

impl Document {
    /// Identifier of this document pinned to its version.
    pub fn id(&self) -> HmId {
        HmId::from_entity_query_path(self.account.clone(), &self.path)
            .with_version(self.version.clone())
    }

    pub fn name(&self) -> Option<&str> {
        self.metadata.name.as_deref().filter(|n| !n.is_empty())
    }

    /// Owner or listed author.
    pub fn is_authored_by(&self, uid: &str) -> bool {
        self.account == uid || self.authors.iter().any(|a| a == uid)
    }
}

/// A stored comment.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// `author/tsid` record id.
    pub id: String,
    /// CID of the comment blob.
    #[serde(default)]
    pub version: String,
    pub author: String,
    pub target_account: String,
    #[serde(default)]
    pub target_path: String,
    #[serde(default)]
    pub target_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_parent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_root: Option<String>,
    #[serde(default)]
    pub content: Vec<BlockNode>,
    #[serde(default, deserialize_with = "deserialize_millis")]
    pub create_time: u64,
}

impl Comment {
    /// The document this comment is attached to.
    pub fn target_id(&self) -> HmId {
        HmId::from_entity_query_path(self.target_account.clone(), &self.target_path)
            .with_version(self.target_version.clone())
    }

    /// A comment that starts a thread rather than replying inside one.
    pub fn is_top_level(&self) -> bool {
        self.reply_parent.is_none() && self.thread_root.is_none()
    }
}
