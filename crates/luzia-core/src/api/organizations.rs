//! Organization CRUD calls. Mutations invalidate the whole response cache.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::models::{MutationResult, Organization, OrganizationInput};

use super::{ApiError, HttpClient, RequestOptions};

const LIST_TTL: Duration = Duration::from_secs(60);
const BY_ID_TTL: Duration = Duration::from_secs(30);

/// Default page size for the organization list.
pub const DEFAULT_LIST_LIMIT: u32 = 100;

pub struct OrganizationsApi<'a> {
    client: &'a HttpClient,
    token: &'a str,
    cancel: Option<CancellationToken>,
}

impl<'a> OrganizationsApi<'a> {
    pub fn new(client: &'a HttpClient, token: &'a str) -> Self {
        Self {
            client,
            token,
            cancel: None,
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn authed(&self, options: RequestOptions) -> RequestOptions {
        options.token(self.token).cancel_token_opt(self.cancel.clone())
    }

    pub async fn list(&self, limit: u32) -> Result<Vec<Organization>, ApiError> {
        let options = self
            .authed(RequestOptions::get("/organizacoes"))
            .query("limit", limit)
            .cache_ttl(LIST_TTL);
        self.client.request(options).await
    }

    pub async fn get(&self, org_id: &str) -> Result<Organization, ApiError> {
        let options = self
            .authed(RequestOptions::get(format!("/organizacoes/{}", org_id)))
            .cache_ttl(BY_ID_TTL);
        self.client.request(options).await
    }

    pub async fn create(&self, input: &OrganizationInput) -> Result<MutationResult, ApiError> {
        let options = self.authed(RequestOptions::post("/organizacoes/")).json(input)?;
        self.client.request(options).await
    }

    pub async fn update(&self, org_id: &str, input: &OrganizationInput) -> Result<MutationResult, ApiError> {
        let options = self
            .authed(RequestOptions::put(format!("/organizacoes/{}", org_id)))
            .json(input)?;
        self.client.request(options).await
    }

    pub async fn remove(&self, org_id: &str) -> Result<MutationResult, ApiError> {
        let options = self.authed(RequestOptions::delete(format!("/organizacoes/{}", org_id)));
        self.client.request(options).await
    }
}
