use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::QuestionnaireSummary;

/// Organization as listed by the CRUD endpoints.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Organization {
    pub id: String,
    #[serde(rename = "nome")]
    pub name: String,
    pub cnpj: String,
    #[serde(rename = "codigo", default)]
    pub code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrganizationInput {
    #[serde(rename = "nome")]
    pub name: String,
    pub cnpj: String,
    #[serde(rename = "codigo", skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorInput {
    #[serde(rename = "idOrganizacao")]
    pub organization_id: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "descricao", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Response of create/update/delete endpoints.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MutationResult {
    pub id: String,
    pub message: String,
}

/// Organization row on the dashboard.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OrganizationSummary {
    pub id: String,
    pub cnpj: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "total_setores")]
    pub total_sectors: u64,
    #[serde(rename = "total_usuarios")]
    pub total_users: u64,
    #[serde(rename = "usuarios_ativos")]
    pub active_users: u64,
    #[serde(rename = "questionarios_em_andamento")]
    pub questionnaires_in_progress: u64,
    #[serde(rename = "taxa_conclusao")]
    pub completion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SectorSummary {
    pub id: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "total_usuarios")]
    pub total_users: u64,
    #[serde(rename = "usuarios_ativos")]
    pub active_users: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OrganizationDetail {
    pub id: String,
    pub cnpj: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "setores", default)]
    pub sectors: Vec<SectorSummary>,
    #[serde(rename = "usuarios_por_status", default)]
    pub users_by_status: HashMap<String, u64>,
    #[serde(rename = "questionarios_status", default)]
    pub questionnaires: Vec<QuestionnaireSummary>,
}

/// Sector row on the dashboard.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SectorStats {
    pub id: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "organizacao_nome")]
    pub organization_name: String,
    #[serde(rename = "total_usuarios")]
    pub total_users: u64,
    #[serde(rename = "usuarios_ativos")]
    pub active_users: u64,
    #[serde(rename = "taxa_resposta")]
    pub response_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OrganizationRef {
    pub id: String,
    #[serde(rename = "nome")]
    pub name: String,
    pub cnpj: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserSummary {
    pub id: String,
    pub anon_id: String,
    pub status: String,
    #[serde(rename = "respondido")]
    pub answered: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SectorDetail {
    pub id: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "descricao")]
    pub description: Option<String>,
    #[serde(rename = "organizacao")]
    pub organization: OrganizationRef,
    #[serde(rename = "usuarios", default)]
    pub users: Vec<UserSummary>,
    #[serde(rename = "progresso_questionarios", default)]
    pub questionnaire_progress: HashMap<String, f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_organization_detail() {
        let json = r#"{
            "id": "org-1",
            "cnpj": "12.345.678/0001-90",
            "nome": "Hospital Central",
            "setores": [{"id": "s1", "nome": "UTI", "total_usuarios": 30, "usuarios_ativos": 12}],
            "usuarios_por_status": {"finalizado": 10, "em_andamento": 2},
            "questionarios_status": [{"id": "q1", "nome": "COPSOQ II", "versao": "2.0", "codigo": null, "taxa_conclusao": 33.3}]
        }"#;

        let detail: OrganizationDetail = serde_json::from_str(json).expect("valid detail");
        assert_eq!(detail.name, "Hospital Central");
        assert_eq!(detail.sectors[0].name, "UTI");
        assert_eq!(detail.users_by_status["finalizado"], 10);
        assert_eq!(detail.questionnaires[0].code, None);
    }

    #[test]
    fn test_organization_input_omits_missing_code() {
        let input = OrganizationInput {
            name: "Acme".into(),
            cnpj: "00.000.000/0001-00".into(),
            code: None,
        };
        let value = serde_json::to_value(&input).expect("serializable");
        assert_eq!(value, serde_json::json!({"nome": "Acme", "cnpj": "00.000.000/0001-00"}));
    }

    #[test]
    fn test_sector_input_keys() {
        let input = SectorInput {
            organization_id: "org-1".into(),
            name: "UTI".into(),
            description: Some("Terapia intensiva".into()),
        };
        let value = serde_json::to_value(&input).expect("serializable");
        assert_eq!(
            value,
            serde_json::json!({"idOrganizacao": "org-1", "nome": "UTI", "descricao": "Terapia intensiva"})
        );
    }
}
