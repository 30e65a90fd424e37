//! Per-consumer async resource state machine.
//!
//! An [`AsyncResource`] owns a loader and the dependency value it was last
//! called with. Every dispatch bumps a sequence number and cancels the
//! previous call's token; a settled call commits only if its sequence is
//! still current and the resource is not disposed. The displayed state
//! therefore always reflects the most recently *requested* data, regardless
//! of the order responses arrive in.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use futures::future::{BoxFuture, FutureExt};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::api::ApiError;

pub type Loader<D, T> =
    Arc<dyn Fn(D, CancellationToken) -> BoxFuture<'static, Result<T, ApiError>> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourcePhase {
    Idle,
    Loading,
    Refreshing,
    Success,
    Error,
    Disposed,
}

/// What a consumer renders.
#[derive(Debug)]
pub struct ResourceState<T> {
    /// Last committed payload.
    pub data: Option<Arc<T>>,
    /// True while fetching with nothing to show meanwhile.
    pub loading: bool,
    /// True while fetching in the background with stale data visible.
    pub refreshing: bool,
    /// Last committed failure message.
    pub error: Option<String>,
    /// Sequence of the most recently dispatched call.
    pub sequence: u64,
    pub phase: ResourcePhase,
}

impl<T> Clone for ResourceState<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            loading: self.loading,
            refreshing: self.refreshing,
            error: self.error.clone(),
            sequence: self.sequence,
            phase: self.phase,
        }
    }
}

impl<T> Default for ResourceState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            refreshing: false,
            error: None,
            sequence: 0,
            phase: ResourcePhase::Idle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceOptions {
    /// Keep showing committed data while a refetch runs (stale-while-revalidate).
    pub keep_previous_data: bool,
}

impl Default for ResourceOptions {
    fn default() -> Self {
        Self {
            keep_previous_data: true,
        }
    }
}

struct Control<D> {
    deps: D,
    sequence: u64,
    in_flight: Option<CancellationToken>,
    disposed: bool,
}

struct Inner<D, T> {
    loader: Loader<D, T>,
    options: ResourceOptions,
    control: Mutex<Control<D>>,
    state: watch::Sender<ResourceState<T>>,
}

impl<D, T> Inner<D, T>
where
    D: PartialEq + Clone + Send + Sync + 'static,
    T: Send + Sync + 'static,
{
    fn control(&self) -> MutexGuard<'_, Control<D>> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a new call, superseding any outstanding one.
    fn dispatch(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let (sequence, token, deps) = {
            let mut control = self.control();
            if control.disposed {
                return None;
            }
            if let Some(previous) = control.in_flight.take() {
                previous.cancel();
            }
            control.sequence += 1;
            let token = CancellationToken::new();
            control.in_flight = Some(token.clone());

            let sequence = control.sequence;
            let keep_previous = self.options.keep_previous_data;
            self.state.send_modify(|state| {
                let keep = keep_previous && state.data.is_some();
                if !keep {
                    state.data = None;
                }
                state.loading = !keep;
                state.refreshing = keep;
                state.error = None;
                state.sequence = sequence;
                state.phase = if keep {
                    ResourcePhase::Refreshing
                } else {
                    ResourcePhase::Loading
                };
            });

            (sequence, token, control.deps.clone())
        };

        debug!(sequence, "Dispatching resource load");
        let call = (self.loader)(deps, token.clone());
        let weak: Weak<Self> = Arc::downgrade(self);

        Some(tokio::spawn(async move {
            let outcome = tokio::select! {
                biased;
                _ = token.cancelled() => Err(ApiError::Cancelled),
                outcome = call => outcome,
            };
            if let Some(inner) = weak.upgrade() {
                inner.commit(sequence, outcome);
            }
        }))
    }

    /// Apply a settled outcome iff it belongs to the current call.
    fn commit(&self, sequence: u64, outcome: Result<T, ApiError>) {
        let mut control = self.control();
        if control.disposed {
            debug!(sequence, "Resource disposed, dropping result");
            return;
        }
        if sequence != control.sequence {
            debug!(sequence, current = control.sequence, "Superseded result dropped");
            return;
        }

        let err = match outcome {
            Err(ApiError::Cancelled) => {
                debug!(sequence, "Load cancelled");
                return;
            }
            Ok(data) => {
                control.in_flight = None;
                self.state.send_modify(|state| {
                    state.data = Some(Arc::new(data));
                    state.loading = false;
                    state.refreshing = false;
                    state.error = None;
                    state.phase = ResourcePhase::Success;
                });
                return;
            }
            Err(err) => err,
        };

        control.in_flight = None;
        debug!(sequence, error = %err, "Load failed");
        self.state.send_modify(|state| {
            // A rejected credential makes whatever we showed untrustworthy.
            if err.is_unauthorized() {
                state.data = None;
            }
            state.loading = false;
            state.refreshing = false;
            state.error = Some(err.to_string());
            state.phase = ResourcePhase::Error;
        });
    }

    fn set_deps(self: &Arc<Self>, deps: D) -> Option<JoinHandle<()>> {
        {
            let mut control = self.control();
            if control.disposed || control.deps == deps {
                return None;
            }
            control.deps = deps;
        }
        self.dispatch()
    }

    fn dispose(&self) {
        let mut control = self.control();
        if control.disposed {
            return;
        }
        control.disposed = true;
        if let Some(token) = control.in_flight.take() {
            token.cancel();
        }
        self.state.send_modify(|state| {
            state.loading = false;
            state.refreshing = false;
            state.phase = ResourcePhase::Disposed;
        });
        debug!(sequence = control.sequence, "Resource disposed");
    }
}

/// Async data bound to a dependency value.
///
/// ```ignore
/// let resource = AsyncResource::new(org_id, move |org_id: String, cancel| {
///     let client = client.clone();
///     let token = token.clone();
///     async move {
///         DashboardApi::new(&client, &token)
///             .with_cancel(cancel)
///             .organization(&org_id)
///             .await
///     }
/// });
/// resource.set_deps(other_org_id);
/// ```
///
/// Dropping the resource disposes it.
pub struct AsyncResource<D, T> {
    inner: Arc<Inner<D, T>>,
}

impl<D, T> AsyncResource<D, T>
where
    D: PartialEq + Clone + Send + Sync + 'static,
    T: Send + Sync + 'static,
{
    /// Create the resource and dispatch its first load.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new<F, Fut>(deps: D, loader: F) -> Self
    where
        F: Fn(D, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        Self::with_options(deps, loader, ResourceOptions::default())
    }

    pub fn with_options<F, Fut>(deps: D, loader: F, options: ResourceOptions) -> Self
    where
        F: Fn(D, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let loader: Loader<D, T> = Arc::new(move |deps, cancel| loader(deps, cancel).boxed());
        let (state, _) = watch::channel(ResourceState::default());
        let inner = Arc::new(Inner {
            loader,
            options,
            control: Mutex::new(Control {
                deps,
                sequence: 0,
                in_flight: None,
                disposed: false,
            }),
            state,
        });
        inner.dispatch();
        Self { inner }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> ResourceState<T> {
        self.inner.state.borrow().clone()
    }

    /// Receive every state change.
    pub fn subscribe(&self) -> watch::Receiver<ResourceState<T>> {
        self.inner.state.subscribe()
    }

    /// Re-run the loader with the current dependencies. `None` once disposed.
    pub fn refetch(&self) -> Option<JoinHandle<()>> {
        self.inner.dispatch()
    }

    /// Refetch if `deps` differs from the current dependencies.
    pub fn set_deps(&self, deps: D) -> Option<JoinHandle<()>> {
        self.inner.set_deps(deps)
    }

    pub fn deps(&self) -> D {
        self.inner.control().deps.clone()
    }

    /// Weak handle for schedulers; it never keeps the resource alive.
    pub fn refetch_handle(&self) -> RefetchHandle {
        let weak: Weak<Inner<D, T>> = Arc::downgrade(&self.inner);
        RefetchHandle {
            refetch: Arc::new(move || weak.upgrade().and_then(|inner| inner.dispatch())),
        }
    }

    /// Cancel the outstanding call and freeze the state. Idempotent.
    pub fn dispose(&self) {
        self.inner.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.control().disposed
    }
}

impl<D, T> Drop for AsyncResource<D, T> {
    fn drop(&mut self) {
        let mut control = self.inner.control.lock().unwrap_or_else(PoisonError::into_inner);
        if control.disposed {
            return;
        }
        control.disposed = true;
        if let Some(token) = control.in_flight.take() {
            token.cancel();
        }
    }
}

/// Type-erased, cloneable trigger for [`AsyncResource::refetch`].
#[derive(Clone)]
pub struct RefetchHandle {
    refetch: Arc<dyn Fn() -> Option<JoinHandle<()>> + Send + Sync>,
}

impl RefetchHandle {
    /// `None` when the resource is gone or disposed.
    pub fn refetch(&self) -> Option<JoinHandle<()>> {
        (self.refetch)()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::{mpsc, oneshot};

    type Reply = oneshot::Sender<Result<String, ApiError>>;

    /// Loader whose calls are handed to the test to resolve in any order.
    fn gated_loader() -> (
        impl Fn(String, CancellationToken) -> BoxFuture<'static, Result<String, ApiError>> + Send + Sync + 'static,
        mpsc::UnboundedReceiver<(String, Reply)>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let loader = move |deps: String, _cancel: CancellationToken| {
            let tx = tx.clone();
            async move {
                let (reply_tx, reply_rx) = oneshot::channel();
                let _ = tx.send((deps, reply_tx));
                reply_rx.await.unwrap_or(Err(ApiError::Cancelled))
            }
            .boxed()
        };
        (loader, rx)
    }

    async fn next_call(rx: &mut mpsc::UnboundedReceiver<(String, Reply)>) -> (String, Reply) {
        rx.recv().await.expect("loader was called")
    }

    async fn settle() {
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_first_load_success() {
        let (loader, mut calls) = gated_loader();
        let resource = AsyncResource::new("org-1".to_string(), loader);

        let state = resource.state();
        assert!(state.loading);
        assert!(!state.refreshing);
        assert_eq!(state.phase, ResourcePhase::Loading);
        assert_eq!(state.sequence, 1);

        let (deps, reply) = next_call(&mut calls).await;
        assert_eq!(deps, "org-1");
        reply.send(Ok("detail org-1".into())).expect("loader waiting");
        settle().await;

        let state = resource.state();
        assert_eq!(state.data.as_deref().map(String::as_str), Some("detail org-1"));
        assert!(!state.loading);
        assert_eq!(state.error, None);
        assert_eq!(state.phase, ResourcePhase::Success);
    }

    #[tokio::test]
    async fn test_refetch_keeps_previous_data_visible() {
        let (loader, mut calls) = gated_loader();
        let resource = AsyncResource::new("org-1".to_string(), loader);
        let (_, reply) = next_call(&mut calls).await;
        reply.send(Ok("v1".into())).expect("loader waiting");
        settle().await;

        resource.refetch().expect("not disposed");
        let state = resource.state();
        assert!(state.refreshing);
        assert!(!state.loading);
        assert_eq!(state.phase, ResourcePhase::Refreshing);
        assert_eq!(state.data.as_deref().map(String::as_str), Some("v1"));

        let (_, reply) = next_call(&mut calls).await;
        reply.send(Ok("v2".into())).expect("loader waiting");
        settle().await;
        assert_eq!(resource.state().data.as_deref().map(String::as_str), Some("v2"));
        assert!(!resource.state().refreshing);
    }

    #[tokio::test]
    async fn test_without_keep_previous_data_shows_loading() {
        let (loader, mut calls) = gated_loader();
        let options = ResourceOptions {
            keep_previous_data: false,
        };
        let resource = AsyncResource::with_options("org-1".to_string(), loader, options);
        let (_, reply) = next_call(&mut calls).await;
        reply.send(Ok("v1".into())).expect("loader waiting");
        settle().await;

        resource.set_deps("org-2".to_string()).expect("deps changed");
        let state = resource.state();
        assert!(state.loading);
        assert!(!state.refreshing);
        assert!(state.data.is_none());
    }

    #[tokio::test]
    async fn test_latest_dispatched_wins_over_latest_resolved() {
        let (loader, mut calls) = gated_loader();
        let resource = AsyncResource::new("A".to_string(), loader);
        let (_, first_a) = next_call(&mut calls).await;

        resource.set_deps("B".to_string());
        let (_, b) = next_call(&mut calls).await;

        resource.set_deps("A".to_string());
        let (deps, second_a) = next_call(&mut calls).await;
        assert_eq!(deps, "A");
        assert_eq!(resource.state().sequence, 3);

        // B settles first, then the second A. The first A never settles usefully.
        let _ = b.send(Ok("B".into()));
        settle().await;
        assert_eq!(resource.state().data, None);

        second_a.send(Ok("A#3".into())).expect("current call waiting");
        settle().await;
        let _ = first_a.send(Ok("A#1".into()));
        settle().await;

        let state = resource.state();
        assert_eq!(state.data.as_deref().map(String::as_str), Some("A#3"));
        assert_eq!(state.phase, ResourcePhase::Success);
    }

    #[tokio::test]
    async fn test_stale_sequence_commit_ignored() {
        let (loader, mut calls) = gated_loader();
        let resource = AsyncResource::new("A".to_string(), loader);
        resource.refetch();
        resource.refetch();
        let (_, _current) = next_call(&mut calls).await;

        resource.inner.commit(2, Ok("stale".into()));
        assert!(resource.state().data.is_none());

        resource.inner.commit(3, Err(ApiError::Transport("offline".into())));
        let state = resource.state();
        assert_eq!(state.error.as_deref(), Some("Network error: offline"));
        assert_eq!(state.phase, ResourcePhase::Error);
    }

    #[tokio::test]
    async fn test_cancellation_never_surfaces_as_error() {
        let (loader, _calls) = gated_loader();
        let resource = AsyncResource::new("A".to_string(), loader);

        resource.inner.commit(1, Err(ApiError::Cancelled));
        let state = resource.state();
        assert_eq!(state.error, None);
        assert_eq!(state.phase, ResourcePhase::Loading);
    }

    #[tokio::test]
    async fn test_unauthorized_clears_data() {
        let (loader, mut calls) = gated_loader();
        let resource = AsyncResource::new("A".to_string(), loader);
        let (_, reply) = next_call(&mut calls).await;
        reply.send(Ok("v1".into())).expect("loader waiting");
        settle().await;

        resource.refetch();
        let (_, reply) = next_call(&mut calls).await;
        reply
            .send(Err(ApiError::Http {
                status: 401,
                message: "Token expirado".into(),
                detail: None,
            }))
            .expect("loader waiting");
        settle().await;

        let state = resource.state();
        assert_eq!(state.data, None);
        assert_eq!(state.error.as_deref(), Some("Token expirado"));
    }

    #[tokio::test]
    async fn test_other_errors_keep_stale_data() {
        let (loader, mut calls) = gated_loader();
        let resource = AsyncResource::new("A".to_string(), loader);
        let (_, reply) = next_call(&mut calls).await;
        reply.send(Ok("v1".into())).expect("loader waiting");
        settle().await;

        resource.refetch();
        let (_, reply) = next_call(&mut calls).await;
        reply
            .send(Err(ApiError::Transport("offline".into())))
            .expect("loader waiting");
        settle().await;

        let state = resource.state();
        assert_eq!(state.data.as_deref().map(String::as_str), Some("v1"));
        assert!(state.error.is_some());
    }

    #[tokio::test]
    async fn test_set_deps_same_value_is_noop() {
        let (loader, _calls) = gated_loader();
        let resource = AsyncResource::new("A".to_string(), loader);
        assert!(resource.set_deps("A".to_string()).is_none());
        assert_eq!(resource.state().sequence, 1);
        assert_eq!(resource.deps(), "A");
    }

    #[tokio::test]
    async fn test_dispose_freezes_state() {
        let (loader, mut calls) = gated_loader();
        let resource = AsyncResource::new("A".to_string(), loader);
        let (_, reply) = next_call(&mut calls).await;
        let mut rx = resource.subscribe();

        resource.dispose();
        assert!(resource.is_disposed());
        assert_eq!(rx.borrow_and_update().phase, ResourcePhase::Disposed);

        let _ = reply.send(Ok("late".into()));
        settle().await;

        assert!(!rx.has_changed().expect("sender alive"));
        assert!(resource.state().data.is_none());
        assert!(resource.refetch().is_none());
        assert!(resource.refetch_handle().refetch().is_none());
    }

    #[tokio::test]
    async fn test_refetch_handle_does_not_outlive_resource() {
        let (loader, _calls) = gated_loader();
        let resource = AsyncResource::new("A".to_string(), loader);
        let handle = resource.refetch_handle();

        assert!(handle.refetch().is_some());
        assert_eq!(resource.state().sequence, 2);

        drop(resource);
        assert!(handle.refetch().is_none());
    }
}
