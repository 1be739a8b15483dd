//! Activity event resolution.
//!
//! Turns raw log entries into typed events with the author, target and
//! related resources already loaded. A page is resolved concurrently
//! through one [`RequestCache`], so a resource shared by many events is
//! fetched once. An event that fails to resolve is logged and dropped;
//! the rest of the page still comes back.

use std::str::FromStr;
use std::sync::Arc;

use futures::{StreamExt, stream};
use serde_json::Value;
use strum::EnumString;
use tracing::{debug, warn};

use hyperdoc_types::{Comment, Document, HmId};

use crate::Result;
use crate::cache::RequestCache;
use crate::citations::Citation;
use crate::config::ResolverConfig;
use crate::error::ActivityError;
use crate::store::{EventData, EventFilter, HypermediaStore, Mention, NewBlob, RawEvent};

/// Blob types the resolver understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumString)]
pub enum BlobType {
    Comment,
    Ref,
    Capability,
    Contact,
}

impl BlobType {
    /// Exact (case-sensitive) blob type name.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        <Self as FromStr>::from_str(s).ok()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BlobType::Comment => "Comment",
            BlobType::Ref => "Ref",
            BlobType::Capability => "Capability",
            BlobType::Contact => "Contact",
        }
    }
}

/// Display data of an account, from its root document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccountSummary {
    pub uid: String,
    pub name: Option<String>,
    pub icon: Option<String>,
}

impl AccountSummary {
    fn from_root(uid: &str, root: Option<&Document>) -> Self {
        Self {
            uid: uid.to_string(),
            name: root.and_then(|d| d.name()).map(str::to_string),
            icon: root.and_then(|d| d.metadata.icon.clone()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CommentEvent {
    pub author: AccountSummary,
    pub comment_id: HmId,
    pub comment: Arc<Comment>,
    pub target_id: HmId,
    /// `None` when the commented document could not be loaded.
    pub target_document: Option<Arc<Document>>,
    /// Author of the comment being replied to, if any.
    pub reply_parent_author: Option<String>,
}

impl CommentEvent {
    pub fn target_name(&self) -> Option<&str> {
        self.target_document.as_deref().and_then(Document::name)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RefUpdateEvent {
    pub author: AccountSummary,
    /// The document pinned to the published version.
    pub doc_id: HmId,
    pub document: Arc<Document>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CapabilityEvent {
    pub author: AccountSummary,
    pub capability_id: HmId,
    pub delegate: Option<AccountSummary>,
    pub role: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ContactEvent {
    pub author: AccountSummary,
    pub contact_id: HmId,
    pub subject: AccountSummary,
    pub name: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CitationEvent {
    pub author: Option<AccountSummary>,
    pub citation: Citation,
    pub target_document: Option<Arc<Document>>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ResolvedEventKind {
    Comment(CommentEvent),
    RefUpdate(RefUpdateEvent),
    Capability(CapabilityEvent),
    Contact(ContactEvent),
    Citation(CitationEvent),
}

impl ResolvedEventKind {
    /// Account that caused the event.
    pub fn author_uid(&self) -> Option<&str> {
        match self {
            ResolvedEventKind::Comment(e) => Some(&e.author.uid),
            ResolvedEventKind::RefUpdate(e) => Some(&e.author.uid),
            ResolvedEventKind::Capability(e) => Some(&e.author.uid),
            ResolvedEventKind::Contact(e) => Some(&e.author.uid),
            ResolvedEventKind::Citation(e) => e.author.as_ref().map(|a| a.uid.as_str()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedEvent {
    pub feed_event_id: String,
    pub event_at_ms: u64,
    pub kind: ResolvedEventKind,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ActivityPage {
    pub events: Vec<ResolvedEvent>,
    pub next_page_token: Option<String>,
}

fn extra_str<'a>(extra: Option<&'a Value>, key: &str) -> Option<&'a str> {
    extra?.get(key)?.as_str().filter(|s| !s.is_empty())
}

/// `heads` as a `.`-joined version: either an array of CIDs or a string.
fn heads_version(extra: Option<&Value>) -> Option<String> {
    let heads = extra?.get("heads")?;
    let version = match heads {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join("."),
        _ => return None,
    };
    Some(version).filter(|v| !v.is_empty())
}

fn parse_resource(raw: &str) -> Result<HmId> {
    if raw.is_empty() {
        return Err(ActivityError::MissingField("resource"));
    }
    HmId::parse(raw).ok_or_else(|| ActivityError::invalid_id(raw))
}

fn require_author(blob: &NewBlob) -> Result<&str> {
    if blob.author.is_empty() {
        Err(ActivityError::MissingField("author"))
    } else {
        Ok(&blob.author)
    }
}

pub struct ActivityResolver {
    store: Arc<dyn HypermediaStore>,
    config: ResolverConfig,
}

impl ActivityResolver {
    pub fn new(store: Arc<dyn HypermediaStore>, config: ResolverConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// List one page of the log and resolve it.
    pub async fn resolve_page(
        &self,
        filter: &EventFilter,
        page_token: Option<&str>,
    ) -> Result<ActivityPage> {
        let mut filter = filter.clone();
        if filter.page_size == 0 {
            filter.page_size = self.config.page_size;
        }
        let page = self.store.list_events(&filter, page_token).await?;
        debug!(
            events = page.events.len(),
            next = ?page.next_page_token,
            "resolving activity page"
        );
        Ok(ActivityPage {
            events: self.resolve_events(page.events).await,
            next_page_token: page.next_page_token,
        })
    }

    /// Resolve a batch, keeping input order. Unknown and failed events are
    /// left out.
    pub async fn resolve_events(&self, events: Vec<RawEvent>) -> Vec<ResolvedEvent> {
        let cache = RequestCache::new(Arc::clone(&self.store));
        let cache = &cache;
        stream::iter(events)
            .map(|event| async move {
                let feed_event_id = event.feed_event_id();
                match self.resolve_one(cache, &event).await {
                    Ok(Some(kind)) => Some(ResolvedEvent {
                        feed_event_id,
                        event_at_ms: event.event_at_ms(),
                        kind,
                    }),
                    Ok(None) => None,
                    Err(err) => {
                        warn!(event = %feed_event_id, error = %err, "failed to resolve activity event");
                        None
                    }
                }
            })
            .buffered(self.config.max_concurrency.max(1))
            .filter_map(futures::future::ready)
            .collect::<Vec<_>>()
            .await
    }

    async fn resolve_one(
        &self,
        cache: &RequestCache,
        event: &RawEvent,
    ) -> Result<Option<ResolvedEventKind>> {
        let blob = match &event.data {
            EventData::NewBlob(blob) => blob,
            EventData::NewMention(mention) => {
                return self.resolve_citation(cache, mention).await.map(Some);
            }
        };
        let Some(blob_type) = BlobType::from_str(&blob.blob_type) else {
            debug!(blob_type = %blob.blob_type, cid = %blob.cid, "ignoring unknown blob type");
            return Ok(None);
        };
        let kind = match blob_type {
            BlobType::Comment => ResolvedEventKind::Comment(self.resolve_comment(cache, blob).await?),
            BlobType::Ref => ResolvedEventKind::RefUpdate(self.resolve_ref(cache, blob).await?),
            BlobType::Capability => {
                ResolvedEventKind::Capability(self.resolve_capability(cache, blob).await?)
            }
            BlobType::Contact => ResolvedEventKind::Contact(self.resolve_contact(cache, blob).await?),
        };
        Ok(Some(kind))
    }

    /// Account metadata are decoration: a missing root document still
    /// yields a summary with just the uid.
    async fn account(&self, cache: &RequestCache, uid: &str) -> AccountSummary {
        match cache.account(uid).await {
            Ok(root) => AccountSummary::from_root(uid, Some(&root)),
            Err(err) => {
                debug!(uid, error = %err, "account metadata unavailable");
                AccountSummary::from_root(uid, None)
            }
        }
    }

    async fn resolve_comment(&self, cache: &RequestCache, blob: &NewBlob) -> Result<CommentEvent> {
        let author = require_author(blob)?;
        let comment_id = parse_resource(&blob.resource)?;
        let record_id = comment_id.base_id();
        let record_id = record_id.strip_prefix("hm://").unwrap_or(record_id.as_str());

        let comment = cache.comment(record_id).await?;
        let target_id = comment.target_id();
        let target_document = cache
            .document(&target_id)
            .await
            .inspect_err(|err| debug!(doc = %target_id, error = %err, "commented document unavailable"))
            .ok();
        let reply_parent_author = match &comment.reply_parent {
            Some(parent) => cache
                .comment(parent)
                .await
                .inspect_err(|err| debug!(parent = %parent, error = %err, "reply parent unavailable"))
                .ok()
                .map(|c| c.author.clone()),
            None => None,
        };

        Ok(CommentEvent {
            author: self.account(cache, author).await,
            comment_id,
            comment,
            target_id,
            target_document,
            reply_parent_author,
        })
    }

    async fn resolve_ref(&self, cache: &RequestCache, blob: &NewBlob) -> Result<RefUpdateEvent> {
        let author = require_author(blob)?;
        let resource = parse_resource(&blob.resource)?;
        let doc_id = match heads_version(blob.extra_attrs.as_ref()).or(resource.version.clone()) {
            Some(version) => resource.latest_base().with_version(version),
            None => resource.latest_base(),
        };
        let document = cache.document(&doc_id).await?;
        Ok(RefUpdateEvent {
            author: self.account(cache, author).await,
            doc_id,
            document,
        })
    }

    async fn resolve_capability(
        &self,
        cache: &RequestCache,
        blob: &NewBlob,
    ) -> Result<CapabilityEvent> {
        let author = require_author(blob)?;
        let capability_id = parse_resource(&blob.resource)?;
        let extra = blob.extra_attrs.as_ref();
        let delegate = match extra_str(extra, "del") {
            Some(uid) => Some(self.account(cache, uid).await),
            None => None,
        };
        Ok(CapabilityEvent {
            author: self.account(cache, author).await,
            capability_id,
            delegate,
            role: extra_str(extra, "role").map(str::to_string),
        })
    }

    async fn resolve_contact(&self, cache: &RequestCache, blob: &NewBlob) -> Result<ContactEvent> {
        let author = require_author(blob)?;
        let contact_id = parse_resource(&blob.resource)?;
        let extra = blob.extra_attrs.as_ref();
        let subject_uid = extra_str(extra, "subject").unwrap_or(contact_id.uid.as_str());
        Ok(ContactEvent {
            author: self.account(cache, author).await,
            subject: self.account(cache, subject_uid).await,
            name: extra_str(extra, "name").map(str::to_string),
            contact_id,
        })
    }

    async fn resolve_citation(&self, cache: &RequestCache, mention: &Mention) -> Result<ResolvedEventKind> {
        let target = HmId::parse(&mention.target).ok_or_else(|| ActivityError::invalid_id(&mention.target))?;
        let citation = Citation::from_mention(mention, &target)
            .ok_or_else(|| ActivityError::invalid_id(&mention.source))?;
        let author = match citation.source.author.as_deref() {
            Some(uid) => Some(self.account(cache, uid).await),
            None => None,
        };
        let target_document = cache
            .document(&citation.target_id)
            .await
            .inspect_err(|err| {
                debug!(doc = %citation.target_id, error = %err, "cited document unavailable")
            })
            .ok();
        Ok(ResolvedEventKind::Citation(CitationEvent {
            author,
            citation,
            target_document,
        }))
    }
}
