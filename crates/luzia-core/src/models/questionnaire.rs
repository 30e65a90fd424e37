use serde::Deserialize;

/// Questionnaire definition from the catalog endpoints.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Questionnaire {
    pub id: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "codigo", default)]
    pub code: Option<String>,
    #[serde(rename = "versao", default)]
    pub version: Option<String>,
    #[serde(rename = "totalPerguntas", default)]
    pub total_questions: Option<u32>,
    #[serde(rename = "ativo", default)]
    pub active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Question {
    pub id: String,
    #[serde(rename = "idQuestionario")]
    pub questionnaire_id: String,
    #[serde(rename = "idPergunta")]
    pub question_id: String,
    #[serde(rename = "texto")]
    pub text: String,
    #[serde(rename = "dominio", default)]
    pub domain: Option<String>,
    #[serde(rename = "dimensao", default)]
    pub dimension: Option<String>,
    #[serde(rename = "ordem", default)]
    pub order: Option<u32>,
}
