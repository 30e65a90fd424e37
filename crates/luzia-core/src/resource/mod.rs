//! Consumer-side resource lifecycle.
//!
//! - `AsyncResource`: loads data for a dependency value, discards
//!   superseded results, and exposes its state through a `watch` channel
//! - `PollingScheduler`: re-runs a resource on an interval while visible
//! - `VisibilitySignal`: the visible/hidden flag pollers consult

pub mod controller;
pub mod polling;
pub mod visibility;

pub use controller::{AsyncResource, Loader, RefetchHandle, ResourceOptions, ResourcePhase, ResourceState};
pub use polling::{PollingOptions, PollingScheduler, DEFAULT_POLL_INTERVAL};
pub use visibility::{Visibility, VisibilitySignal};
