use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;
use tracing::debug;

use crate::api::Payload;

use super::CacheKey;

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: Arc<Payload>,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// TTL-keyed store of previously fetched GET responses.
///
/// Expired entries are only removed when a read finds them; there is no sweeper.
/// Every [`clear`](Self::clear) bumps an epoch so writers that started before
/// the clear can be told apart from writers that started after it. The epoch
/// lock is held shared across a guarded write and exclusively across a
/// clear, so a guarded write lands either wholly before a clear or not at all.
#[derive(Debug, Default)]
pub struct CacheStore {
    entries: DashMap<CacheKey, CacheEntry>,
    epoch: RwLock<u64>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the payload if an unexpired entry exists.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<Payload>> {
        let now = Instant::now();
        match self.entries.get(key) {
            Some(entry) if entry.is_fresh(now) => return Some(Arc::clone(&entry.payload)),
            Some(_) => {}
            None => return None,
        }

        // The read guard is released above; remove only if still expired.
        if self.entries.remove_if(key, |_, entry| !entry.is_fresh(now)).is_some() {
            debug!(key = %key, "Expired cache entry purged");
        }
        None
    }

    /// Store `payload` until `now + ttl`, replacing any existing entry.
    pub fn set(&self, key: CacheKey, payload: Arc<Payload>, ttl: Duration) {
        let expires_at = Instant::now() + ttl;
        self.entries.insert(key, CacheEntry { payload, expires_at });
    }

    /// Like [`set`](Self::set), but skipped if the store was cleared since `epoch`.
    pub fn set_if_epoch(&self, key: CacheKey, payload: Arc<Payload>, ttl: Duration, epoch: u64) -> bool {
        let current = self.epoch.read().unwrap_or_else(PoisonError::into_inner);
        if *current != epoch {
            debug!(key = %key, "Cache cleared while request was in flight, not storing");
            return false;
        }
        self.set(key, payload, ttl);
        true
    }

    pub fn epoch(&self) -> u64 {
        *self.epoch.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn clear(&self) {
        let mut epoch = self.epoch.write().unwrap_or_else(PoisonError::into_inner);
        *epoch += 1;
        self.entries.clear();
    }

    /// Number of stored entries, expired ones included until they are read.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
