//! HTTP client for the Luzia dashboard API.
//!
//! Every call goes through [`HttpClient::send`], which consults the shared
//! [`ApiCache`] before touching the network, joins identical in-flight GETs,
//! normalizes error payloads, and invalidates the cache after mutations or
//! an expired session.

use std::sync::Arc;

use reqwest::{header, Method};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::auth::{SessionEvents, SessionStore};
use crate::cache::{ApiCache, CacheKey};

use super::payload::Payload;
use super::request::{build_url, RequestBody, RequestOptions};
use super::transport::{HttpRequest, ReqwestTransport, Transport};
use super::ApiError;

/// A request with its URL resolved and headers built. Owned, so it can move
/// onto a coalesced fetch task.
#[derive(Debug, Clone)]
struct PreparedRequest {
    method: Method,
    path: String,
    url: String,
    headers: header::HeaderMap,
    body: Option<Vec<u8>>,
    authenticated: bool,
}

impl PreparedRequest {
    fn to_http(&self) -> HttpRequest {
        HttpRequest {
            method: self.method.clone(),
            url: self.url.clone(),
            headers: self.headers.clone(),
            body: self.body.clone(),
        }
    }
}

/// Client for the dashboard API.
/// Clone is cheap - all state is behind `Arc`s and clones share the cache.
#[derive(Clone)]
pub struct HttpClient {
    base_url: Arc<str>,
    transport: Arc<dyn Transport>,
    cache: Arc<ApiCache>,
    session_store: Option<Arc<dyn SessionStore>>,
    session_events: SessionEvents,
}

pub struct HttpClientBuilder {
    base_url: String,
    transport: Option<Arc<dyn Transport>>,
    cache: Option<Arc<ApiCache>>,
    session_store: Option<Arc<dyn SessionStore>>,
    session_events: Option<SessionEvents>,
}

impl HttpClientBuilder {
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Share a cache with other clients. Without this each client gets its own.
    pub fn cache(mut self, cache: Arc<ApiCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.session_store = Some(store);
        self
    }

    pub fn session_events(mut self, events: SessionEvents) -> Self {
        self.session_events = Some(events);
        self
    }

    /// Build the client. Falls back to a `reqwest` transport when none was given.
    pub fn build(self) -> Result<HttpClient, ApiError> {
        let transport = match self.transport {
            Some(ref transport) => Arc::clone(transport),
            None => Arc::new(ReqwestTransport::new()?),
        };
        Ok(self.finish(transport))
    }

    fn finish(self, transport: Arc<dyn Transport>) -> HttpClient {
        HttpClient {
            base_url: Arc::from(self.base_url.trim_end_matches('/')),
            transport,
            cache: self.cache.unwrap_or_default(),
            session_store: self.session_store,
            session_events: self.session_events.unwrap_or_default(),
        }
    }
}

impl HttpClient {
    /// Create a client with the network transport and a fresh cache.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        Self::builder(base_url).build()
    }

    pub fn builder(base_url: impl Into<String>) -> HttpClientBuilder {
        HttpClientBuilder {
            base_url: base_url.into(),
            transport: None,
            cache: None,
            session_store: None,
            session_events: None,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn cache(&self) -> &Arc<ApiCache> {
        &self.cache
    }

    pub fn session_events(&self) -> &SessionEvents {
        &self.session_events
    }

    /// Drop all cached responses (logout, manual refresh).
    pub fn clear_cache(&self) {
        self.cache.invalidate_all();
    }

    /// Send a request and deserialize the response body into `T`.
    pub async fn request<T: DeserializeOwned>(&self, options: RequestOptions) -> Result<T, ApiError> {
        self.send(options).await?.decode()
    }

    /// Send a request and return the shared, parsed payload.
    pub async fn send(&self, options: RequestOptions) -> Result<Arc<Payload>, ApiError> {
        let prepared = self.prepare(&options)?;
        let cancel = options.cancel_token.clone();

        if !options.is_cacheable() {
            return self.execute(prepared, cancel).await;
        }

        let key = CacheKey::new(&prepared.method, &prepared.url, options.token.as_deref());
        let store = self.cache.store();
        if let Some(payload) = store.get(&key) {
            debug!(key = %key, "Cache hit");
            return Ok(payload);
        }

        let ttl = options.cache_ttl;
        let epoch = store.epoch();

        match cancel {
            Some(token) => {
                // Individually cancellable: never shared with other callers.
                debug!(key = %key, "Cache miss, fetching with caller cancellation");
                let result = self.execute(prepared, Some(token)).await;
                if let Ok(payload) = &result {
                    store.set_if_epoch(key, Arc::clone(payload), ttl, epoch);
                }
                result
            }
            None => {
                debug!(key = %key, "Cache miss");
                let client = self.clone();
                let cache = Arc::clone(&self.cache);
                let cache_key = key.clone();
                self.cache
                    .coalescer()
                    .join(
                        key,
                        move || async move { client.execute(prepared, None).await },
                        move |result| {
                            if let Ok(payload) = result {
                                cache.store().set_if_epoch(cache_key, Arc::clone(payload), ttl, epoch);
                            }
                        },
                    )
                    .await
            }
        }
    }

    fn prepare(&self, options: &RequestOptions) -> Result<PreparedRequest, ApiError> {
        let url = build_url(&self.base_url, &options.path, &options.query)?;

        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        if let Some(ref token) = options.token {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ApiError::InvalidRequest("bearer token is not a valid header value".into()))?;
            headers.insert(header::AUTHORIZATION, value);
        }

        let body = match &options.body {
            Some(RequestBody::Json(value)) => {
                headers.insert(
                    header::CONTENT_TYPE,
                    header::HeaderValue::from_static("application/json"),
                );
                Some(value.to_string().into_bytes())
            }
            Some(RequestBody::Text(text)) => Some(text.clone().into_bytes()),
            None => None,
        };

        Ok(PreparedRequest {
            method: options.method.clone(),
            path: options.path.clone(),
            url,
            headers,
            body,
            authenticated: options.token.is_some(),
        })
    }

    /// One network round trip plus response handling. The only suspension point.
    async fn execute(
        &self,
        request: PreparedRequest,
        cancel: Option<CancellationToken>,
    ) -> Result<Arc<Payload>, ApiError> {
        let call = self.transport.send(request.to_http());
        let response = match cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        debug!(method = %request.method, path = %request.path, "Request cancelled");
                        return Err(ApiError::Cancelled);
                    }
                    response = call => response?,
                }
            }
            None => call.await?,
        };

        let content_type = response.content_type.as_deref();
        if !response.status.is_success() {
            let payload = Payload::parse_lossy(content_type, &response.body);
            if response.status.as_u16() == 401 && request.authenticated {
                self.expire_session();
            }
            let err = ApiError::from_status(&request.method, &request.path, response.status, &payload);
            debug!(method = %request.method, path = %request.path, status = response.status.as_u16(), error = %err, "Request failed");
            return Err(err);
        }

        let payload = Payload::parse(content_type, &response.body)?;

        if request.method != Method::GET {
            self.cache.invalidate_all();
        }

        Ok(Arc::new(payload))
    }

    fn expire_session(&self) {
        warn!("Session expired - clearing stored credentials and response cache");
        if let Some(ref store) = self.session_store {
            if let Err(e) = store.clear_stored() {
                warn!(error = %e, "Failed to clear stored session");
            }
        }
        self.cache.invalidate_all();
        self.session_events.notify_expired();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{MockTransport, MOCK_BASE_URL};
    use serde_json::json;

    fn client() -> HttpClient {
        HttpClient::builder(MOCK_BASE_URL)
            .transport(MockTransport::new())
            .build()
            .expect("mock transport client")
    }

    #[test]
    fn test_prepare_sets_headers() {
        let options = RequestOptions::post("organizacoes/")
            .token("abc")
            .json_value(json!({"nome": "Acme", "cnpj": "00.000.000/0001-00"}));
        let prepared = client().prepare(&options).expect("valid request");

        assert_eq!(prepared.url, format!("{}/organizacoes/", MOCK_BASE_URL));
        assert_eq!(prepared.headers[header::ACCEPT], "application/json");
        assert_eq!(prepared.headers[header::AUTHORIZATION], "Bearer abc");
        assert_eq!(prepared.headers[header::CONTENT_TYPE], "application/json");
        assert!(prepared.authenticated);
        let body: serde_json::Value =
            serde_json::from_slice(prepared.body.as_deref().expect("json body")).expect("valid json");
        assert_eq!(body["nome"], "Acme");
    }

    #[test]
    fn test_prepare_anonymous_get() {
        let prepared = client()
            .prepare(&RequestOptions::get("/dashboard/overview"))
            .expect("valid request");
        assert!(prepared.headers.get(header::AUTHORIZATION).is_none());
        assert!(prepared.headers.get(header::CONTENT_TYPE).is_none());
        assert!(prepared.body.is_none());
        assert!(!prepared.authenticated);
    }

    #[test]
    fn test_prepare_empty_token_is_anonymous() {
        let prepared = client()
            .prepare(&RequestOptions::get("/dashboard/overview").token(""))
            .expect("valid request");
        assert!(prepared.headers.get(header::AUTHORIZATION).is_none());
        assert!(!prepared.authenticated);
    }

    #[test]
    fn test_prepare_rejects_bad_token() {
        let err = client()
            .prepare(&RequestOptions::get("/x").token("line\nbreak"))
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = HttpClient::builder("http://localhost:8000/api/v1/")
            .transport(MockTransport::new())
            .build()
            .expect("mock transport client");
        assert_eq!(client.base_url(), "http://localhost:8000/api/v1");
    }
}
