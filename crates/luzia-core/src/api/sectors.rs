//! Sector mutations. Reads go through the dashboard endpoints.

use tokio_util::sync::CancellationToken;

use crate::models::{MutationResult, SectorInput};

use super::{ApiError, HttpClient, RequestOptions};

pub struct SectorsApi<'a> {
    client: &'a HttpClient,
    token: &'a str,
    cancel: Option<CancellationToken>,
}

impl<'a> SectorsApi<'a> {
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

    pub async fn create(&self, input: &SectorInput) -> Result<MutationResult, ApiError> {
        let options = self.authed(RequestOptions::post("/setores/")).json(input)?;
        self.client.request(options).await
    }

    pub async fn update(&self, sector_id: &str, input: &SectorInput) -> Result<MutationResult, ApiError> {
        let options = self
            .authed(RequestOptions::put(format!("/setores/{}", sector_id)))
            .json(input)?;
        self.client.request(options).await
    }

    pub async fn remove(&self, sector_id: &str) -> Result<MutationResult, ApiError> {
        let options = self.authed(RequestOptions::delete(format!("/setores/{}", sector_id)));
        self.client.request(options).await
    }
}
