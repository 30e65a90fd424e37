use std::collections::HashMap;

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Alert {
    #[serde(rename = "tipo")]
    pub kind: String,
    #[serde(rename = "mensagem")]
    pub message: String,
    #[serde(rename = "severidade")]
    pub severity: String,
    #[serde(rename = "entidades_afetadas", default)]
    pub affected_entities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DashboardOverview {
    #[serde(rename = "total_organizacoes")]
    pub total_organizations: u64,
    #[serde(rename = "total_setores")]
    pub total_sectors: u64,
    #[serde(rename = "total_usuarios")]
    pub total_users: u64,
    #[serde(rename = "usuarios_ativos")]
    pub active_users: u64,
    #[serde(rename = "questionarios_em_andamento")]
    pub questionnaires_in_progress: u64,
    #[serde(rename = "taxa_conclusao_geral")]
    pub completion_rate: f64,
    #[serde(rename = "alertas", default)]
    pub alerts: Vec<Alert>,
    #[serde(rename = "ultima_atualizacao")]
    pub last_updated: String,
}

impl DashboardOverview {
    /// Alerts the backend marked as high severity.
    pub fn high_severity_alerts(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.iter().filter(|a| a.severity == "alta")
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ActiveUser {
    pub id: String,
    #[serde(rename = "telefone_mascarado")]
    pub masked_phone: String,
    pub status: String,
    #[serde(rename = "progresso_atual")]
    pub current_progress: f64,
    #[serde(rename = "questionario_em_andamento")]
    pub questionnaire_in_progress: Option<String>,
    #[serde(rename = "ultima_atividade")]
    pub last_activity: String,
    #[serde(rename = "organizacao")]
    pub organization: String,
    #[serde(rename = "setor")]
    pub sector: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserProgress {
    pub id: String,
    #[serde(rename = "questionario_nome")]
    pub questionnaire_name: String,
    #[serde(rename = "perguntas_respondidas")]
    pub answered: u32,
    #[serde(rename = "total_perguntas")]
    pub total_questions: u32,
    #[serde(rename = "percentual_conclusao")]
    pub completion_percent: f64,
    #[serde(rename = "tempo_estimado_restante")]
    pub estimated_time_left: Option<String>,
    #[serde(rename = "ultima_resposta")]
    pub last_answer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QuestionnaireSummary {
    pub id: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "versao")]
    pub version: String,
    #[serde(rename = "codigo")]
    pub code: Option<String>,
    #[serde(rename = "taxa_conclusao")]
    pub completion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QuestionnaireStatus {
    pub id: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "versao")]
    pub version: String,
    #[serde(rename = "codigo")]
    pub code: Option<String>,
    #[serde(rename = "total_usuarios_atribuidos")]
    pub assigned_users: u64,
    #[serde(rename = "total_respostas_completas")]
    pub completed_responses: u64,
    #[serde(rename = "taxa_conclusao")]
    pub completion_rate: f64,
    #[serde(rename = "tempo_medio_conclusao")]
    pub average_completion_time: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CriticalDimension {
    #[serde(rename = "dimensao")]
    pub dimension: String,
    #[serde(rename = "total_risco")]
    pub at_risk: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QuestionnaireMetrics {
    pub id: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "distribuicao_classificacoes", default)]
    pub classification_distribution: HashMap<String, u64>,
    #[serde(rename = "dimensoes_criticas", default)]
    pub critical_dimensions: Vec<CriticalDimension>,
    #[serde(rename = "organizacoes_participantes", default)]
    pub participating_organizations: Vec<String>,
    #[serde(rename = "setores_participantes", default)]
    pub participating_sectors: Vec<String>,
}
