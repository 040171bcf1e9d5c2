//! Tag-keyed query cache.
//!
//! Reads are lock-free through `ArcSwapOption`. Writes (store, invalidate)
//! serialize on a small per-tag mutex that also owns the generation counter.
//! Every change is published on a per-tag `watch` channel.

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{MutexGuard as FetchGuard, watch};
use users_sdk::CacheTag;

/// Most recent successful result cached under a tag.
#[derive(Debug)]
pub struct CacheEntry<T> {
    pub data: Arc<T>,
    /// Set by invalidation; the next access re-fetches
    pub stale: bool,
    /// Invalidation count of the tag when `data` was stored
    pub generation: u64,
}

/// Snapshot of the tag generation taken before a fetch starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    tag: CacheTag,
    generation: u64,
}

struct Slot<T> {
    entry: ArcSwapOption<CacheEntry<T>>,
    generation: Mutex<u64>,
    fetch_lock: tokio::sync::Mutex<()>,
    changes: watch::Sender<u64>,
}

impl<T> Slot<T> {
    fn new() -> Self {
        Self {
            entry: ArcSwapOption::empty(),
            generation: Mutex::new(0),
            fetch_lock: tokio::sync::Mutex::new(()),
            changes: watch::Sender::new(0),
        }
    }

    fn publish(&self) {
        self.changes.send_modify(|version| *version += 1);
    }
}

/// Query cache owned by one client instance.
pub struct QueryCache<T> {
    slots: HashMap<CacheTag, Slot<T>>,
}

impl<T> Default for QueryCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> QueryCache<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: CacheTag::ALL.iter().map(|tag| (*tag, Slot::new())).collect(),
        }
    }

    fn slot(&self, tag: CacheTag) -> &Slot<T> {
        // Every tag gets a slot in `new`
        &self.slots[&tag]
    }

    /// Current entry for `tag`, fresh or stale.
    #[must_use]
    pub fn get(&self, tag: CacheTag) -> Option<Arc<CacheEntry<T>>> {
        self.slot(tag).entry.load_full()
    }

    /// Cached data, only while the entry is fresh.
    #[must_use]
    pub fn fresh(&self, tag: CacheTag) -> Option<Arc<T>> {
        self.get(tag)
            .filter(|entry| !entry.stale)
            .map(|entry| Arc::clone(&entry.data))
    }

    /// Mark the entry for `tag` stale and notify subscribers.
    ///
    /// The data stays available through [`get`](Self::get). Fetches that
    /// started before this call store their result as stale.
    pub fn invalidate(&self, tag: CacheTag) {
        let slot = self.slot(tag);
        {
            let mut generation = slot.generation.lock();
            *generation += 1;
            if let Some(entry) = slot.entry.load_full()
                && !entry.stale
            {
                slot.entry.store(Some(Arc::new(CacheEntry {
                    data: Arc::clone(&entry.data),
                    stale: true,
                    generation: entry.generation,
                })));
            }
            tracing::debug!(%tag, generation = *generation, "cache tag invalidated");
        }
        slot.publish();
    }

    /// Record the generation a fetch starts from.
    #[must_use]
    pub fn ticket(&self, tag: CacheTag) -> FetchTicket {
        FetchTicket {
            tag,
            generation: *self.slot(tag).generation.lock(),
        }
    }

    /// Store a fetch result. Last write wins; the entry is stale if the tag
    /// was invalidated after `ticket` was taken.
    pub fn store(&self, ticket: FetchTicket, data: T) -> Arc<T> {
        let slot = self.slot(ticket.tag);
        let data = Arc::new(data);
        {
            let generation = slot.generation.lock();
            let stale = *generation != ticket.generation;
            slot.entry.store(Some(Arc::new(CacheEntry {
                data: Arc::clone(&data),
                stale,
                generation: *generation,
            })));
            tracing::debug!(tag = %ticket.tag, stale, "cache entry stored");
        }
        slot.publish();
        data
    }

    /// Serialize fetches for `tag`. Hold the guard across the request.
    pub async fn lock_fetch(&self, tag: CacheTag) -> FetchGuard<'_, ()> {
        self.slot(tag).fetch_lock.lock().await
    }

    /// Change notifications for `tag`; the value is a change counter.
    #[must_use]
    pub fn watch(&self, tag: CacheTag) -> watch::Receiver<u64> {
        self.slot(tag).changes.subscribe()
    }

    #[must_use]
    pub fn subscriber_count(&self, tag: CacheTag) -> usize {
        self.slot(tag).changes.receiver_count()
    }
}
