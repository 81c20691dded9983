use std::{future::Future, num::NonZeroUsize, sync::Arc};

use lru::LruCache;
use parking_lot::Mutex;
use twilight_model::id::{marker::GuildMarker, Id};

use crate::document::GuildDocument;

/// `None` marks a guild that has no document.
pub type CachedDocument = Option<Arc<GuildDocument>>;

struct Inner {
    entries: LruCache<Id<GuildMarker>, CachedDocument>,
    // bumped on every invalidation, a fetch started before a bump can't insert
    generation: u64,
}

/// Small LRU of guild documents.
///
/// The lock is only taken for synchronous bookkeeping, never across the fetch
/// itself, so a slow backend doesn't block lookups for other guilds.
pub struct GuildCache {
    capacity: usize,
    inner: Mutex<Inner>,
}

pub(crate) enum Lookup {
    Hit(CachedDocument),
    Miss { generation: u64 },
}

impl GuildCache {
    pub fn new(capacity: usize) -> Self {
        // a zero capacity cache never stores, see `insert`
        let bound = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);

        Self {
            capacity,
            inner: Mutex::new(Inner {
                entries: LruCache::new(bound),
                generation: 0,
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks for an entry without touching its recency.
    pub fn contains(&self, guild_id: Id<GuildMarker>) -> bool {
        self.inner.lock().entries.contains(&guild_id)
    }

    /// Returns the cached document for `guild_id`, fetching it on a miss.
    pub async fn get_or_fetch<F, Fut, E>(
        &self,
        guild_id: Id<GuildMarker>,
        fetch: F,
    ) -> Result<CachedDocument, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<GuildDocument>, E>>,
    {
        let generation = match self.lookup(guild_id) {
            Lookup::Hit(doc) => {
                tracing::trace!(guild_id = guild_id.get(), "settings cache hit");
                metrics::counter!("settings_cache_hits_total").increment(1);
                return Ok(doc);
            }
            Lookup::Miss { generation } => generation,
        };

        tracing::trace!(guild_id = guild_id.get(), "settings cache miss");
        metrics::counter!("settings_cache_misses_total").increment(1);

        let doc = fetch().await?.map(Arc::new);
        self.insert(guild_id, doc.clone(), generation);

        Ok(doc)
    }

    /// Looks up a guild and promotes it on a hit.
    pub(crate) fn lookup(&self, guild_id: Id<GuildMarker>) -> Lookup {
        let mut inner = self.inner.lock();
        let generation = inner.generation;

        match inner.entries.get(&guild_id) {
            Some(doc) => Lookup::Hit(doc.clone()),
            None => Lookup::Miss { generation },
        }
    }

    /// Inserts a fetched document unless the cache was invalidated since the
    /// fetch started. Returns whether the document was stored.
    pub(crate) fn insert(
        &self,
        guild_id: Id<GuildMarker>,
        doc: CachedDocument,
        generation: u64,
    ) -> bool {
        if self.capacity == 0 {
            return false;
        }

        let mut inner = self.inner.lock();
        if inner.generation != generation {
            tracing::trace!(
                guild_id = guild_id.get(),
                "settings cache invalidated during fetch, not storing"
            );
            return false;
        }

        // `push` hands back the replaced value too, only a different key is an eviction
        if let Some((evicted, _)) = inner.entries.push(guild_id, doc) {
            if evicted != guild_id {
                metrics::counter!("settings_cache_evictions_total").increment(1);
                tracing::trace!(guild_id = evicted.get(), "evicted from settings cache");
            }
        }

        true
    }

    pub fn invalidate(&self, guild_id: Id<GuildMarker>) {
        let mut inner = self.inner.lock();
        inner.generation = inner.generation.wrapping_add(1);
        inner.entries.pop(&guild_id);
    }
}
