//! Data models for dashboard API responses.
//!
//! Field names are English; serde renames map them to the backend's JSON keys.
//!
//! - `AuthToken`, `LoginRequest`: authentication
//! - `DashboardOverview`, `Alert`: the landing screen
//! - Organization, sector, user and questionnaire views used by the dashboard
//! - `Questionnaire`, `Question`: the questionnaire catalog

pub mod auth;
pub mod dashboard;
pub mod organization;
pub mod questionnaire;

pub use auth::{AuthToken, LoginRequest};
pub use dashboard::{
    ActiveUser, Alert, CriticalDimension, DashboardOverview, QuestionnaireMetrics,
    QuestionnaireStatus, QuestionnaireSummary, UserProgress,
};
pub use organization::{
    Organization, OrganizationDetail, OrganizationInput, OrganizationRef, OrganizationSummary,
    MutationResult, SectorDetail, SectorInput, SectorSummary, SectorStats, UserSummary,
};
pub use questionnaire::{Question, Questionnaire};
