//! Shared response cache for GET requests.
//!
//! This module provides:
//! - `CacheStore`: TTL-keyed payload store with lazy expiry
//! - `RequestCoalescer`: registry of in-flight fetches so identical
//!   concurrent GETs hit the network once
//! - `ApiCache`: the pair of them, constructed once and shared by every
//!   `HttpClient` of a session
//!
//! Invalidation is whole-cache: any successful mutation or an expired
//! session drops everything.

pub mod coalescer;
pub mod key;
pub mod store;

use tracing::debug;

pub use coalescer::{FetchResult, RequestCoalescer, SharedResponse};
pub use key::CacheKey;
pub use store::CacheStore;

#[derive(Default)]
pub struct ApiCache {
    store: CacheStore,
    coalescer: RequestCoalescer,
}

impl ApiCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    pub fn coalescer(&self) -> &RequestCoalescer {
        &self.coalescer
    }

    /// Drop every cached entry and forget every pending coalesced request.
    pub fn invalidate_all(&self) {
        debug!(
            entries = self.store.len(),
            pending = self.coalescer.len(),
            "Invalidating response cache"
        );
        self.store.clear();
        self.coalescer.clear();
    }
}
