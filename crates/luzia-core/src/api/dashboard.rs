//! Typed calls for the dashboard screens.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::models::{
    ActiveUser, DashboardOverview, OrganizationDetail, OrganizationSummary, QuestionnaireMetrics,
    QuestionnaireStatus, SectorDetail, SectorStats, UserProgress,
};

use super::{ApiError, HttpClient, RequestOptions};

/// Cache lifetimes per dashboard resource. Tunable without touching the
/// caching mechanism.
pub mod ttl {
    use std::time::Duration;

    pub const OVERVIEW: Duration = Duration::from_secs(10);
    pub const ORGANIZATIONS_LIST: Duration = Duration::from_secs(60);
    pub const ORGANIZATION_DETAIL: Duration = Duration::from_secs(30);
    pub const SECTORS_LIST: Duration = Duration::from_secs(45);
    pub const SECTOR_DETAIL: Duration = Duration::from_secs(30);
    pub const ACTIVE_USERS: Duration = Duration::from_secs(15);
    pub const USER_PROGRESS: Duration = Duration::from_secs(15);
    pub const QUESTIONNAIRE_STATUS: Duration = Duration::from_secs(60);
    pub const QUESTIONNAIRE_METRICS: Duration = Duration::from_secs(20);
}

pub struct DashboardApi<'a> {
    client: &'a HttpClient,
    token: &'a str,
    cancel: Option<CancellationToken>,
}

impl<'a> DashboardApi<'a> {
    pub fn new(client: &'a HttpClient, token: &'a str) -> Self {
        Self {
            client,
            token,
            cancel: None,
        }
    }

    /// Make every call from this handle individually cancellable.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn get(&self, path: impl Into<String>, ttl: Duration) -> RequestOptions {
        RequestOptions::get(path)
            .token(self.token)
            .cache_ttl(ttl)
            .cancel_token_opt(self.cancel.clone())
    }

    pub async fn overview(&self) -> Result<DashboardOverview, ApiError> {
        self.client
            .request(self.get("/dashboard/overview", ttl::OVERVIEW))
            .await
    }

    pub async fn organizations(&self) -> Result<Vec<OrganizationSummary>, ApiError> {
        self.client
            .request(self.get("/dashboard/organizacoes", ttl::ORGANIZATIONS_LIST))
            .await
    }

    pub async fn organization(&self, org_id: &str) -> Result<OrganizationDetail, ApiError> {
        self.client
            .request(self.get(format!("/dashboard/organizacoes/{}", org_id), ttl::ORGANIZATION_DETAIL))
            .await
    }

    pub async fn sectors(&self, org_id: Option<&str>) -> Result<Vec<SectorStats>, ApiError> {
        let options = self
            .get("/dashboard/setores", ttl::SECTORS_LIST)
            .query_opt("org_id", org_id);
        self.client.request(options).await
    }

    pub async fn sector(&self, sector_id: &str) -> Result<SectorDetail, ApiError> {
        self.client
            .request(self.get(format!("/dashboard/setores/{}", sector_id), ttl::SECTOR_DETAIL))
            .await
    }

    pub async fn active_users(
        &self,
        org_id: Option<&str>,
        sector_id: Option<&str>,
    ) -> Result<Vec<ActiveUser>, ApiError> {
        let options = self
            .get("/dashboard/usuarios/ativos", ttl::ACTIVE_USERS)
            .query_opt("org_id", org_id)
            .query_opt("setor_id", sector_id);
        self.client.request(options).await
    }

    pub async fn user_progress(&self, user_id: &str) -> Result<UserProgress, ApiError> {
        self.client
            .request(self.get(format!("/dashboard/usuarios/{}/progresso", user_id), ttl::USER_PROGRESS))
            .await
    }

    pub async fn questionnaire_status(&self) -> Result<Vec<QuestionnaireStatus>, ApiError> {
        self.client
            .request(self.get("/dashboard/questionarios/status", ttl::QUESTIONNAIRE_STATUS))
            .await
    }

    pub async fn questionnaire_metrics(&self, questionnaire_id: &str) -> Result<QuestionnaireMetrics, ApiError> {
        let path = format!("/dashboard/questionarios/{}/metricas", questionnaire_id);
        self.client
            .request(self.get(path, ttl::QUESTIONNAIRE_METRICS))
            .await
    }
}
