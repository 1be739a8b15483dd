//! Citations, interaction summaries and the activity feed for hyperdoc.
//!
//! Everything here sits on top of a [`HypermediaStore`], the storage and
//! network collaborator. Summaries are pure functions over what the store
//! returns. Feed resolution is async and fans out over one page at a time.
//!
//! # Feed Resolution
//!
//! ```text
//! list_events(filter, token) ──▶ RawEvent[]
//!                                  │  NewBlob{Comment|Ref|Capability|Contact}
//!                                  │  NewMention
//!                                  ▼
//!               ActivityResolver (buffered, max_concurrency)
//!                                  │  RequestCache: one fetch per resource
//!                                  ▼
//!                          ResolvedEvent[]  (failed / unknown dropped)
//!                                  │
//!               classify_for_account ──▶ NotificationItem[] ──▶ merge_notifications
//! ```
//!
//! # Key Types
//!
//! |--------------------------|------------------------------------------|
//! | Type                     | Purpose                                  |
//! |--------------------------|------------------------------------------|
//! | [`HypermediaStore`]      | Async storage collaborator               |
//! | [`MemoryStore`]          | In-memory store with fetch counters      |
//! | [`Citation`]             | Unpacked mention of a document           |
//! | [`InteractionSummary`]   | Citation / comment / change counts       |
//! | [`RequestCache`]         | Per-batch shared-fetch cache             |
//! | [`ActivityResolver`]     | Raw events to resolved events            |
//! | [`NotificationReason`]   | mention / reply / discussion             |
//! |--------------------------|------------------------------------------|

pub mod cache;
pub mod citations;
pub mod classify;
pub mod config;
pub mod error;
pub mod memory;
pub mod resolver;
pub mod store;

pub use cache::{Fetched, RequestCache};
pub use citations::{
    BlockCounts, Citation, CitationSource, CitationSourceKind, InteractionSummary,
    blocks_from_citations, dedupe_citations, summarize_interactions,
};
pub use classify::{
    NotificationItem, NotificationReason, classify_for_account, merge_notifications,
    notifications_for_account,
};
pub use config::ResolverConfig;
pub use error::{ActivityError, StoreError, StoreResult};
pub use memory::MemoryStore;
pub use resolver::{
    AccountSummary, ActivityPage, ActivityResolver, BlobType, CapabilityEvent, CitationEvent,
    CommentEvent, ContactEvent, RefUpdateEvent, ResolvedEvent, ResolvedEventKind,
};
pub use store::{
    Change, EventData, EventFilter, EventPage, HypermediaStore, Mention, NewBlob, RawEvent,
    SourceBlob,
};

pub type Result<T> = std::result::Result<T, ActivityError>;
