use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::debug;

use crate::api::{ApiError, Payload};

use super::CacheKey;

pub type FetchResult = Result<Arc<Payload>, ApiError>;

/// A response every joined caller awaits.
pub type SharedResponse = Shared<BoxFuture<'static, FetchResult>>;

struct Pending {
    id: u64,
    response: SharedResponse,
}

/// Registry of in-flight fetches, keyed like the cache.
///
/// The fetch runs on its own task, so it completes even if every caller
/// stops waiting. Its registration is removed before any caller sees the
/// result, which means a call made after settlement always starts fresh.
#[derive(Clone, Default)]
pub struct RequestCoalescer {
    pending: Arc<DashMap<CacheKey, Pending>>,
    next_id: Arc<AtomicU64>,
}

impl RequestCoalescer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the in-flight fetch for `key`, or start one with `start`.
    ///
    /// `on_settled` runs once, on the fetch task, after the registration is
    /// removed and before any caller is woken.
    ///
    /// Must be called from within a tokio runtime.
    pub fn join<S, Fut, F>(&self, key: CacheKey, start: S, on_settled: F) -> SharedResponse
    where
        S: FnOnce() -> Fut,
        Fut: Future<Output = FetchResult> + Send + 'static,
        F: FnOnce(&FetchResult) + Send + 'static,
    {
        match self.pending.entry(key.clone()) {
            Entry::Occupied(pending) => {
                debug!(key = %key, "Joining in-flight request");
                pending.get().response.clone()
            }
            Entry::Vacant(slot) => {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                let registry = Arc::clone(&self.pending);
                let fetch = start();

                let task = tokio::spawn(async move {
                    let result = fetch.await;
                    // A clear() or a newer registration may own the slot by now.
                    registry.remove_if(&key, |_, pending| pending.id == id);
                    on_settled(&result);
                    result
                });

                let response = async move {
                    task.await.unwrap_or_else(|e| {
                        Err(ApiError::Transport(format!("request task failed: {}", e)))
                    })
                }
                .boxed()
                .shared();

                slot.insert(Pending {
                    id,
                    response: response.clone(),
                });
                response
            }
        }
    }

    pub fn is_pending(&self, key: &CacheKey) -> bool {
        self.pending.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Forget every registration. Running fetches still finish for the
    /// callers already waiting on them; new calls start fresh.
    pub fn clear(&self) {
        self.pending.clear();
    }
}
