//! Periodic refetch driver.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

use super::controller::RefetchHandle;
use super::visibility::Visibility;

/// Default refetch period.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingOptions {
    pub interval: Duration,
    pub enabled: bool,
    /// Skip ticks while the consumer is hidden.
    pub pause_when_hidden: bool,
}

impl Default for PollingOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            enabled: true,
            pause_when_hidden: true,
        }
    }
}

/// Calls a refetch action every `interval`.
///
/// The first tick fires one full interval after arming. Ticks that land
/// while hidden are skipped rather than queued, so becoming visible again
/// never produces a burst. Dropping the scheduler stops it.
pub struct PollingScheduler {
    /// Returns false once there is nothing left to refresh.
    refetch: Arc<dyn Fn() -> bool + Send + Sync>,
    visibility: watch::Receiver<Visibility>,
    options: PollingOptions,
    task: Option<JoinHandle<()>>,
}

impl PollingScheduler {
    /// Arm immediately. Must be called from within a tokio runtime.
    pub fn start(
        refetch: impl Fn() + Send + Sync + 'static,
        visibility: watch::Receiver<Visibility>,
        options: PollingOptions,
    ) -> Self {
        Self::arm_with(
            Arc::new(move || {
                refetch();
                true
            }),
            visibility,
            options,
        )
    }

    /// Poll an [`AsyncResource`](super::AsyncResource) through its refetch handle.
    /// Stops by itself once the resource is dropped or disposed.
    pub fn for_resource(
        handle: RefetchHandle,
        visibility: watch::Receiver<Visibility>,
        options: PollingOptions,
    ) -> Self {
        Self::arm_with(
            Arc::new(move || handle.refetch().is_some()),
            visibility,
            options,
        )
    }

    fn arm_with(
        refetch: Arc<dyn Fn() -> bool + Send + Sync>,
        visibility: watch::Receiver<Visibility>,
        options: PollingOptions,
    ) -> Self {
        let mut scheduler = Self {
            refetch,
            visibility,
            options,
            task: None,
        };
        scheduler.arm();
        scheduler
    }

    pub fn options(&self) -> PollingOptions {
        self.options
    }

    pub fn is_armed(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Re-arm with new options. Unchanged options keep the current timer.
    pub fn reconfigure(&mut self, options: PollingOptions) {
        if options == self.options {
            return;
        }
        self.options = options;
        self.disarm();
        self.arm();
    }

    pub fn stop(&mut self) {
        self.disarm();
    }

    fn arm(&mut self) {
        let options = self.options;
        if !options.enabled || options.interval.is_zero() {
            debug!(enabled = options.enabled, "Polling not armed");
            return;
        }

        let refetch = Arc::clone(&self.refetch);
        let visibility = self.visibility.clone();
        let period = options.interval;

        debug!(interval_ms = period.as_millis() as u64, "Polling armed");
        self.task = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if options.pause_when_hidden && !visibility.borrow().is_visible() {
                    debug!("Hidden, skipping poll tick");
                    continue;
                }
                if !refetch() {
                    debug!("Polled resource is gone, polling stopped");
                    break;
                }
            }
        }));
    }

    fn disarm(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for PollingScheduler {
    fn drop(&mut self) {
        self.disarm();
    }
}
