//! Storage collaborator: the read/write surface the activity layer needs
//! from the daemon or network.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use hyperdoc_comment::PublishBlob;
use hyperdoc_types::time::deserialize_millis;
use hyperdoc_types::{Comment, Document, HmId};

use crate::error::StoreResult;

/// The blob a mention was extracted from.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceBlob {
    pub cid: String,
    #[serde(default)]
    pub author: String,
    #[serde(default, deserialize_with = "deserialize_millis")]
    pub create_time: u64,
}

/// A raw mention record: `source` links to `target`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mention {
    /// `hm://` id of the citing document or comment.
    pub source: String,
    /// `"Ref"` for documents, `"Comment"` for comments.
    #[serde(default)]
    pub source_type: String,
    /// Block of the source that holds the link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_blob: Option<SourceBlob>,
    /// For comment sources: the document the comment is attached to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_document: Option<String>,
    /// `hm://` id of the cited resource.
    #[serde(default)]
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_version: Option<String>,
    /// Serialized block fragment, e.g. `blockId+` or `blockId[2:9]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_fragment: Option<String>,
    #[serde(default)]
    pub is_exact_version: bool,
    /// `"Link"`, `"Embed"`, ...
    #[serde(default)]
    pub mention_type: String,
}

/// One change of a document's history.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Change {
    pub id: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub deps: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_millis")]
    pub create_time: u64,
}

/// A new blob observed by the node.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBlob {
    pub cid: String,
    /// `Comment`, `Ref`, `Capability`, `Contact`; anything else is ignored.
    pub blob_type: String,
    #[serde(default)]
    pub author: String,
    /// `hm://` id of the resource the blob belongs to.
    #[serde(default)]
    pub resource: String,
    /// Type-specific extras: `heads` for refs, `del`/`role` for
    /// capabilities, `subject`/`name` for contacts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_attrs: Option<serde_json::Value>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventData {
    NewBlob(NewBlob),
    NewMention(Mention),
}

/// An entry of the append-only activity log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    /// Account whose node recorded the event.
    #[serde(default)]
    pub account: String,
    pub data: EventData,
    #[serde(default, deserialize_with = "deserialize_millis")]
    pub event_time: u64,
    #[serde(default, deserialize_with = "deserialize_millis")]
    pub observe_time: u64,
}

impl RawEvent {
    /// Stable id used to merge and page through events.
    pub fn feed_event_id(&self) -> String {
        match &self.data {
            EventData::NewBlob(blob) => format!("blob-{}", blob.cid),
            EventData::NewMention(m) => {
                let cid = m.source_blob.as_ref().map(|b| b.cid.as_str()).unwrap_or_default();
                format!("mention-{cid}-{}-{}", m.mention_type, m.target)
            }
        }
    }

    /// The later of event and observe time, ignoring unset (zero) ones.
    pub fn event_at_ms(&self) -> u64 {
        self.event_time.max(self.observe_time)
    }
}

/// Filters for [`HypermediaStore::list_events`]. Empty fields match all.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventFilter {
    /// Only events about this resource (base id).
    pub resource: Option<String>,
    pub authors: Vec<String>,
    /// Blob types, plus `"Mention"` for mention events.
    pub event_types: Vec<String>,
    pub page_size: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventPage {
    pub events: Vec<RawEvent>,
    pub next_page_token: Option<String>,
}

/// Everything the activity layer reads from or writes to storage.
#[async_trait]
pub trait HypermediaStore: Send + Sync {
    // ========================================================================
    // Resources
    // ========================================================================

    /// A document at `version`, or its latest version when `None`.
    async fn get_document(&self, uid: &str, path: &str, version: Option<&str>) -> StoreResult<Document>;

    /// A comment by record id (`author/tsid`) or version CID.
    async fn get_comment(&self, id: &str) -> StoreResult<Comment>;

    // ========================================================================
    // Interactions
    // ========================================================================

    async fn list_mentions(&self, target: &HmId) -> StoreResult<Vec<Mention>>;

    /// Comments attached directly to `target`.
    async fn list_comments(&self, target: &HmId) -> StoreResult<Vec<Comment>>;

    async fn list_changes(&self, target: &HmId) -> StoreResult<Vec<Change>>;

    // ========================================================================
    // Activity log
    // ========================================================================

    async fn list_events(&self, filter: &EventFilter, page_token: Option<&str>) -> StoreResult<EventPage>;

    /// Store blobs, returning their CIDs in order.
    async fn store_blobs(&self, blobs: &[PublishBlob]) -> StoreResult<Vec<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_ids() {
        let blob = RawEvent {
            account: String::new(),
            data: EventData::NewBlob(NewBlob {
                cid: "bafyblob".into(),
                blob_type: "Comment".into(),
                ..Default::default()
            }),
            event_time: 10,
            observe_time: 25,
        };
        assert_eq!(blob.feed_event_id(), "blob-bafyblob");
        assert_eq!(blob.event_at_ms(), 25);

        let mention = RawEvent {
            account: String::new(),
            data: EventData::NewMention(Mention {
                source: "hm://z6Mkabc/doc".into(),
                source_blob: Some(SourceBlob {
                    cid: "bafysrc".into(),
                    ..Default::default()
                }),
                target: "hm://z6Mkdef".into(),
                mention_type: "Embed".into(),
                ..Default::default()
            }),
            event_time: 0,
            observe_time: 7,
        };
        assert_eq!(mention.feed_event_id(), "mention-bafysrc-Embed-hm://z6Mkdef");
        assert_eq!(mention.event_at_ms(), 7);
    }

    #[test]
    fn test_event_json_shape() {
        let raw = json!({
            "account": "z6Mkme",
            "data": {"newBlob": {
                "cid": "bafyx",
                "blobType": "Capability",
                "author": "z6Mkabc",
                "resource": "hm://z6Mkabc/doc",
                "extraAttrs": {"del": "z6Mkdel"}
            }},
            "eventTime": {"seconds": 2, "nanos": 0},
            "observeTime": null
        });
        let event: RawEvent = serde_json::from_value(raw).unwrap();
        assert_eq!(event.event_time, 2000);
        assert_eq!(event.observe_time, 0);
        let EventData::NewBlob(blob) = &event.data else {
            panic!("expected blob event");
        };
        assert_eq!(blob.extra_attrs.as_ref().unwrap()["del"], "z6Mkdel");
    }
}
