//! REST client module for the Luzia dashboard API.
//!
//! This module provides the `HttpClient` that every screen's data flows
//! through, plus typed wrappers for the endpoints the dashboard uses.
//!
//! The API uses bearer token authentication obtained from `/auth/login`.

pub mod auth;
pub mod client;
pub mod dashboard;
pub mod error;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;
pub mod organizations;
pub mod payload;
pub mod questionnaires;
pub mod request;
pub mod sectors;
pub mod transport;

pub use auth::AuthApi;
pub use client::{HttpClient, HttpClientBuilder};
pub use dashboard::DashboardApi;
pub use error::ApiError;
pub use organizations::OrganizationsApi;
pub use payload::Payload;
pub use questionnaires::QuestionnairesApi;
pub use request::{RequestBody, RequestOptions, DEFAULT_GET_CACHE_TTL};
pub use sectors::SectorsApi;
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
