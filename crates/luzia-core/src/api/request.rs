//! Request description and URL building.

use std::time::Duration;

use reqwest::{Method, Url};
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::ApiError;

/// Default time-to-live for cached GET responses.
pub const DEFAULT_GET_CACHE_TTL: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(Value),
    Text(String),
}

/// Everything one call through [`HttpClient`](super::HttpClient) needs.
///
/// ```ignore
/// let options = RequestOptions::get("/dashboard/setores")
///     .query_opt("org_id", org_id)
///     .token(token)
///     .cache_ttl(Duration::from_secs(45));
/// ```
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) body: Option<RequestBody>,
    pub(crate) token: Option<String>,
    pub(crate) cancel_token: Option<CancellationToken>,
    pub(crate) use_cache: bool,
    pub(crate) cache_ttl: Duration,
}

impl RequestOptions {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: normalize_path(&path.into()),
            query: Vec::new(),
            body: None,
            token: None,
            cancel_token: None,
            use_cache: true,
            cache_ttl: DEFAULT_GET_CACHE_TTL,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Set a query parameter, replacing an earlier value for the same key.
    /// Empty values are dropped.
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        let key = key.into();
        let value = value.to_string();
        self.query.retain(|(k, _)| *k != key);
        if !value.is_empty() {
            self.query.push((key, value));
        }
        self
    }

    pub fn query_opt<V: ToString>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    pub fn json_value(mut self, body: Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    /// Serialize `body` as the JSON request body.
    pub fn json<B: Serialize>(self, body: &B) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidRequest(format!("unserializable body: {}", e)))?;
        Ok(self.json_value(value))
    }

    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.body = Some(RequestBody::Text(body.into()));
        self
    }

    /// Bearer credential. An empty token counts as no credential.
    pub fn token(self, token: impl Into<String>) -> Self {
        self.token_opt(Some(token.into()))
    }

    pub fn token_opt(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    /// Make this call individually cancellable. Such calls never join
    /// another caller's in-flight request.
    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = Some(token);
        self
    }

    pub fn cancel_token_opt(mut self, token: Option<CancellationToken>) -> Self {
        self.cancel_token = token;
        self
    }

    pub fn use_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Only GETs with caching enabled and a non-zero TTL touch the cache.
    pub fn is_cacheable(&self) -> bool {
        self.method == Method::GET && self.use_cache && !self.cache_ttl.is_zero()
    }
}

fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

/// Canonical request URL: base + path + query string.
pub fn build_url(base_url: &str, path: &str, query: &[(String, String)]) -> Result<String, ApiError> {
    let base = base_url.trim_end_matches('/');
    let mut url = Url::parse(&format!("{}{}", base, normalize_path(path)))
        .map_err(|e| ApiError::InvalidRequest(format!("bad URL {}{}: {}", base, path, e)))?;

    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in query {
            pairs.append_pair(key, value);
        }
    }

    Ok(url.to_string())
}
