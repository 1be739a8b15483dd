//! Request-scoped read-through cache.
//!
//! One [`RequestCache`] lives for one resolution batch. Every distinct
//! resource is fetched at most once, even when many events ask for it at
//! the same time: the first caller installs a shared future and later
//! callers await the same one. Failures are shared the same way.

use std::collections::HashMap;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;

use hyperdoc_types::{Comment, Document, HmId};

use crate::error::{StoreError, StoreResult};
use crate::store::HypermediaStore;

pub type Fetched<T> = Result<Arc<T>, Arc<StoreError>>;

type SharedFetch<T> = Shared<BoxFuture<'static, Fetched<T>>>;

/// In-flight or finished fetches of one resource type.
struct FetchMap<T> {
    entries: Mutex<HashMap<String, SharedFetch<T>>>,
}

impl<T: Send + Sync + 'static> FetchMap<T> {
    fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// The shared fetch for `key`, starting it with `fetch` if absent.
    /// The lock is released before anyone awaits.
    fn get_or_start<F>(&self, key: String, fetch: F) -> SharedFetch<T>
    where
        F: FnOnce() -> BoxFuture<'static, StoreResult<T>>,
    {
        let mut entries = self.entries.lock();
        entries
            .entry(key)
            .or_insert_with(|| {
                fetch()
                    .map(|result| result.map(Arc::new).map_err(Arc::new))
                    .boxed()
                    .shared()
            })
            .clone()
    }

    fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

pub struct RequestCache {
    store: Arc<dyn HypermediaStore>,
    documents: FetchMap<Document>,
    comments: FetchMap<Comment>,
}

impl RequestCache {
    pub fn new(store: Arc<dyn HypermediaStore>) -> Self {
        Self {
            store,
            documents: FetchMap::new(),
            comments: FetchMap::new(),
        }
    }

    /// Document at `id`'s version, or latest when unversioned.
    pub async fn document(&self, id: &HmId) -> Fetched<Document> {
        let uid = id.uid.clone();
        let path = id.entity_query_path();
        let version = id.version.clone();
        let key = match &version {
            Some(v) => id.latest_base().with_version(v.clone()).to_url(),
            None => id.base_id(),
        };
        let store = Arc::clone(&self.store);
        let fetch = self.documents.get_or_start(key, move || {
            async move { store.get_document(&uid, &path, version.as_deref()).await }.boxed()
        });
        fetch.await
    }

    /// An account's root document, latest version.
    pub async fn account(&self, uid: &str) -> Fetched<Document> {
        self.document(&HmId::new(uid)).await
    }

    pub async fn comment(&self, id: &str) -> Fetched<Comment> {
        let store = Arc::clone(&self.store);
        let owned = id.to_string();
        let fetch = self.comments.get_or_start(id.to_string(), move || {
            async move { store.get_comment(&owned).await }.boxed()
        });
        fetch.await
    }

    /// Distinct resources requested so far.
    pub fn len(&self) -> usize {
        self.documents.len() + self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use std::time::Duration;

    fn store_with_account(uid: &str) -> Arc<MemoryStore> {
        let store = MemoryStore::new().with_delay(Duration::from_millis(20));
        store.insert_document(Document {
            account: uid.into(),
            version: "bafyroot".into(),
            ..Default::default()
        });
        Arc::new(store)
    }

    // ── Deduplication ───────────────────────────────────────────────────

    #[tokio::test]
    async fn test_concurrent_requests_share_one_fetch() {
        let store = store_with_account("z6Mkalice");
        let cache = RequestCache::new(store.clone());

        let results = futures::future::join_all((0..6).map(|_| cache.account("z6Mkalice"))).await;
        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(store.fetch_count("document:hm://z6Mkalice"), 1);
        assert_eq!(cache.len(), 1);

        // Later sequential hits are served from the cache too.
        cache.account("z6Mkalice").await.unwrap();
        assert_eq!(store.fetch_count("document:hm://z6Mkalice"), 1);
    }

    #[tokio::test]
    async fn test_failures_are_shared() {
        let store = store_with_account("z6Mkalice");
        let cache = RequestCache::new(store.clone());

        let (a, b) = tokio::join!(cache.comment("z6Mkbob/missing"), cache.comment("z6Mkbob/missing"));
        assert_eq!(*a.unwrap_err(), StoreError::not_found("comment", "z6Mkbob/missing"));
        assert!(b.is_err());
        assert_eq!(store.fetch_count("comment:z6Mkbob/missing"), 1);
    }

    #[tokio::test]
    async fn test_versions_are_distinct_keys() {
        let store = store_with_account("z6Mkalice");
        let cache = RequestCache::new(store.clone());

        let latest = HmId::new("z6Mkalice");
        let pinned = HmId::new("z6Mkalice").with_version("bafyroot");
        cache.document(&latest).await.unwrap();
        cache.document(&pinned).await.unwrap();
        cache.document(&pinned).await.unwrap();
        assert_eq!(store.total_fetches(), 2);
    }

    #[tokio::test]
    async fn test_fresh_cache_per_batch() {
        let store = store_with_account("z6Mkalice");
        RequestCache::new(store.clone()).account("z6Mkalice").await.unwrap();
        RequestCache::new(store.clone()).account("z6Mkalice").await.unwrap();
        assert_eq!(store.fetch_count("document:hm://z6Mkalice"), 2);
    }
}
