//! Luzia dashboard data access layer.
//!
//! - `api`: the `HttpClient` plus typed endpoint wrappers
//! - `cache`: the shared TTL response cache and request coalescer
//! - `auth`: session persistence and expiry notifications
//! - `resource`: per-consumer async state with out-of-order protection, and polling
//! - `config`: user configuration on disk

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod models;
pub mod resource;

pub use api::{ApiError, HttpClient, RequestOptions};
pub use auth::{Session, SessionData, SessionEvent, SessionEvents, SessionStore};
pub use cache::ApiCache;
pub use config::Config;
pub use resource::{
    AsyncResource, PollingOptions, PollingScheduler, ResourceOptions, ResourcePhase, ResourceState,
    Visibility, VisibilitySignal,
};
