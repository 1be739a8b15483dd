//! In-memory hypermedia store.
//!
//! Backs tests and the CLI. Counts every resource fetch so callers can
//! check how often a resource was actually read.

use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;

use hyperdoc_comment::{DAG_CBOR_CODEC, PublishBlob, blob_cid};
use hyperdoc_types::{Comment, Document, HmId};

use crate::error::{StoreError, StoreResult};
use crate::store::{
    Change, EventData, EventFilter, EventPage, HypermediaStore, Mention, RawEvent,
};

/// Key of a document: its base id, plus `?v=` when pinned.
fn document_key(uid: &str, path: &str, version: Option<&str>) -> String {
    let id = HmId::from_entity_query_path(uid, path);
    match version.filter(|v| !v.is_empty()) {
        Some(version) => id.with_version(version).to_url(),
        None => id.base_id(),
    }
}

/// Base id of a raw `hm://` string, or the string itself if it won't parse.
fn base_key(raw: &str) -> String {
    HmId::parse(raw)
        .map(|id| id.base_id())
        .unwrap_or_else(|| raw.to_string())
}

/// Thread-safe in-memory store. All data is lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: DashMap<String, Document>,
    /// Comments by record id and by version CID.
    comments: DashMap<String, Comment>,
    /// Mentions by target base id.
    mentions: DashMap<String, Vec<Mention>>,
    /// Changes by document base id.
    changes: DashMap<String, Vec<Change>>,
    blobs: DashMap<String, Vec<u8>>,
    events: RwLock<Vec<RawEvent>>,
    fetches: DashMap<String, usize>,
    delay: Option<Duration>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long inside every resource fetch.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Store a document under its pinned version, and as the latest one.
    pub fn insert_document(&self, doc: Document) {
        let latest = document_key(&doc.account, &doc.path, None);
        if !doc.version.is_empty() {
            let pinned = document_key(&doc.account, &doc.path, Some(&doc.version));
            self.documents.insert(pinned, doc.clone());
        }
        self.documents.insert(latest, doc);
    }

    pub fn insert_comment(&self, comment: Comment) {
        if !comment.version.is_empty() {
            self.comments.insert(comment.version.clone(), comment.clone());
        }
        self.comments.insert(comment.id.clone(), comment);
    }

    pub fn insert_mention(&self, mention: Mention) {
        self.mentions
            .entry(base_key(&mention.target))
            .or_default()
            .push(mention);
    }

    pub fn insert_change(&self, target: &HmId, change: Change) {
        self.changes.entry(target.base_id()).or_default().push(change);
    }

    pub fn push_event(&self, event: RawEvent) {
        self.events.write().push(event);
    }

    pub fn blob(&self, cid: &str) -> Option<Vec<u8>> {
        self.blobs.get(cid).map(|b| b.clone())
    }

    /// How many times `key` was fetched: `document:<url>` or `comment:<id>`.
    pub fn fetch_count(&self, key: &str) -> usize {
        self.fetches.get(key).map(|n| *n).unwrap_or(0)
    }

    /// Total resource fetches so far.
    pub fn total_fetches(&self) -> usize {
        self.fetches.iter().map(|entry| *entry.value()).sum()
    }

    async fn record_fetch(&self, key: String) {
        *self.fetches.entry(key).or_insert(0) += 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn matches(filter: &EventFilter, event: &RawEvent) -> bool {
        let (event_type, author, resource) = match &event.data {
            EventData::NewBlob(blob) => (blob.blob_type.as_str(), blob.author.as_str(), &blob.resource),
            EventData::NewMention(m) => (
                "Mention",
                m.source_blob.as_ref().map(|b| b.author.as_str()).unwrap_or_default(),
                &m.target,
            ),
        };
        if !filter.event_types.is_empty() && !filter.event_types.iter().any(|t| t == event_type) {
            return false;
        }
        if !filter.authors.is_empty() && !filter.authors.iter().any(|a| a == author) {
            return false;
        }
        if let Some(wanted) = &filter.resource
            && base_key(wanted) != base_key(resource)
        {
            return false;
        }
        true
    }
}

#[async_trait]
impl HypermediaStore for MemoryStore {
    async fn get_document(&self, uid: &str, path: &str, version: Option<&str>) -> StoreResult<Document> {
        let key = document_key(uid, path, version);
        self.record_fetch(format!("document:{key}")).await;
        self.documents
            .get(&key)
            .map(|doc| doc.clone())
            .ok_or_else(|| StoreError::not_found("document", key))
    }

    async fn get_comment(&self, id: &str) -> StoreResult<Comment> {
        self.record_fetch(format!("comment:{id}")).await;
        self.comments
            .get(id)
            .map(|c| c.clone())
            .ok_or_else(|| StoreError::not_found("comment", id))
    }

    async fn list_mentions(&self, target: &HmId) -> StoreResult<Vec<Mention>> {
        Ok(self
            .mentions
            .get(&target.base_id())
            .map(|m| m.clone())
            .unwrap_or_default())
    }

    async fn list_comments(&self, target: &HmId) -> StoreResult<Vec<Comment>> {
        let mut seen = std::collections::HashSet::new();
        let mut out: Vec<Comment> = self
            .comments
            .iter()
            .filter(|entry| entry.value().target_id().path_matches(target))
            .filter(|entry| seen.insert(entry.value().id.clone()))
            .map(|entry| entry.value().clone())
            .collect();
        out.sort_by(|a, b| a.create_time.cmp(&b.create_time).then_with(|| a.id.cmp(&b.id)));
        Ok(out)
    }

    async fn list_changes(&self, target: &HmId) -> StoreResult<Vec<Change>> {
        Ok(self
            .changes
            .get(&target.base_id())
            .map(|c| c.clone())
            .unwrap_or_default())
    }

    async fn list_events(&self, filter: &EventFilter, page_token: Option<&str>) -> StoreResult<EventPage> {
        let offset = match page_token.filter(|t| !t.is_empty()) {
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| StoreError::InvalidPageToken(token.to_string()))?,
            None => 0,
        };

        let mut matching: Vec<RawEvent> = self
            .events
            .read()
            .iter()
            .filter(|e| Self::matches(filter, e))
            .cloned()
            .collect();
        // Newest first; insertion order among equal times.
        matching.sort_by_key(|e| std::cmp::Reverse(e.event_at_ms()));

        let page_size = if filter.page_size == 0 {
            matching.len().max(1)
        } else {
            filter.page_size as usize
        };
        let events: Vec<RawEvent> = matching.iter().skip(offset).take(page_size).cloned().collect();
        let end = offset + events.len();
        let next_page_token = (end < matching.len()).then(|| end.to_string());

        Ok(EventPage {
            events,
            next_page_token,
        })
    }

    async fn store_blobs(&self, blobs: &[PublishBlob]) -> StoreResult<Vec<String>> {
        let mut cids = Vec::with_capacity(blobs.len());
        for blob in blobs {
            let cid = match &blob.cid {
                Some(cid) => cid.clone(),
                None => blob_cid(DAG_CBOR_CODEC, &blob.data)
                    .map_err(|e| StoreError::backend(e.to_string()))?
                    .to_string(),
            };
            self.blobs.insert(cid.clone(), blob.data.clone());
            cids.push(cid);
        }
        Ok(cids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::NewBlob;
    use pretty_assertions::assert_eq;

    fn blob_event(cid: &str, blob_type: &str, author: &str, at: u64) -> RawEvent {
        RawEvent {
            account: String::new(),
            data: EventData::NewBlob(NewBlob {
                cid: cid.into(),
                blob_type: blob_type.into(),
                author: author.into(),
                resource: format!("hm://{author}/doc"),
                extra_attrs: None,
            }),
            event_time: at,
            observe_time: 0,
        }
    }

    // ── Documents ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_document_latest_and_pinned() {
        let store = MemoryStore::new();
        store.insert_document(Document {
            account: "z6Mkowner".into(),
            path: "/notes".into(),
            version: "bafyv1".into(),
            ..Default::default()
        });

        let latest = store.get_document("z6Mkowner", "/notes", None).await.unwrap();
        let pinned = store.get_document("z6Mkowner", "/notes", Some("bafyv1")).await.unwrap();
        assert_eq!(latest, pinned);
        assert_eq!(store.fetch_count("document:hm://z6Mkowner/notes"), 1);

        let missing = store.get_document("z6Mkowner", "/notes", Some("bafyv2")).await;
        assert!(matches!(missing, Err(StoreError::NotFound { kind: "document", .. })));
        assert_eq!(store.total_fetches(), 3);
    }

    // ── Events ──────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_events_filtered_and_paged() {
        let store = MemoryStore::new();
        store.push_event(blob_event("c1", "Comment", "z6Mka", 10));
        store.push_event(blob_event("c2", "Ref", "z6Mkb", 30));
        store.push_event(blob_event("c3", "Comment", "z6Mkb", 20));

        let filter = EventFilter {
            page_size: 1,
            ..Default::default()
        };
        let first = store.list_events(&filter, None).await.unwrap();
        assert_eq!(first.events[0].feed_event_id(), "blob-c2");
        assert_eq!(first.next_page_token.as_deref(), Some("1"));

        let second = store.list_events(&filter, first.next_page_token.as_deref()).await.unwrap();
        assert_eq!(second.events[0].feed_event_id(), "blob-c3");

        let comments_only = EventFilter {
            event_types: vec!["Comment".into()],
            authors: vec!["z6Mkb".into()],
            ..Default::default()
        };
        let page = store.list_events(&comments_only, None).await.unwrap();
        assert_eq!(page.events.len(), 1);
        assert_eq!(page.events[0].feed_event_id(), "blob-c3");
        assert_eq!(page.next_page_token, None);

        let bad = store.list_events(&filter, Some("nope")).await;
        assert!(matches!(bad, Err(StoreError::InvalidPageToken(_))));
    }

    // ── Blobs ───────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_store_blobs_keeps_given_cids() {
        let store = MemoryStore::new();
        let cids = store
            .store_blobs(&[
                PublishBlob {
                    cid: None,
                    data: b"comment".to_vec(),
                },
                PublishBlob {
                    cid: Some("bafyattachment".into()),
                    data: b"image".to_vec(),
                },
            ])
            .await
            .unwrap();
        assert_eq!(cids.len(), 2);
        assert_eq!(cids[0], blob_cid(DAG_CBOR_CODEC, b"comment").unwrap().to_string());
        assert_eq!(cids[1], "bafyattachment");
        assert_eq!(store.blob("bafyattachment"), Some(b"image".to_vec()));
    }
}
