//! Questionnaire catalog calls.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::models::{Question, Questionnaire};

use super::{ApiError, HttpClient, RequestOptions};

/// Cache lifetimes for the questionnaire catalog.
pub mod ttl {
    use std::time::Duration;

    pub const LIST: Duration = Duration::from_secs(60);
    pub const BY_ID: Duration = Duration::from_secs(30);
    pub const QUESTIONS: Duration = Duration::from_secs(60);
}

pub struct QuestionnairesApi<'a> {
    client: &'a HttpClient,
    token: &'a str,
    cancel: Option<CancellationToken>,
}

impl<'a> QuestionnairesApi<'a> {
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

    fn get(&self, path: impl Into<String>, ttl: Duration) -> RequestOptions {
        RequestOptions::get(path)
            .token(self.token)
            .cache_ttl(ttl)
            .cancel_token_opt(self.cancel.clone())
    }

    pub async fn list(&self) -> Result<Vec<Questionnaire>, ApiError> {
        self.client.request(self.get("/questionarios", ttl::LIST)).await
    }

    pub async fn get_by_id(&self, questionnaire_id: &str) -> Result<Questionnaire, ApiError> {
        self.client
            .request(self.get(format!("/questionarios/{}", questionnaire_id), ttl::BY_ID))
            .await
    }

    pub async fn questions(&self, questionnaire_id: &str) -> Result<Vec<Question>, ApiError> {
        let path = format!("/questionarios/{}/perguntas", questionnaire_id);
        self.client.request(self.get(path, ttl::QUESTIONS)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{MockTransport, MOCK_BASE_URL};
    use reqwest::Method;
    use serde_json::json;

    #[tokio::test(start_paused = true)]
    async fn test_questions_cached_for_a_minute() {
        let mock = MockTransport::new();
        mock.respond_json(
            Method::GET,
            "/questionarios/q1/perguntas",
            200,
            json!([{"id": "p1", "idQuestionario": "q1", "idPergunta": "1", "texto": "Pergunta", "ordem": 1}]),
        );
        let client = HttpClient::builder(MOCK_BASE_URL)
            .transport(mock.clone())
            .build()
            .expect("client");
        let api = QuestionnairesApi::new(&client, "tok");

        let questions = api.questions("q1").await.expect("questions");
        assert_eq!(questions[0].order, Some(1));

        tokio::time::advance(Duration::from_secs(59)).await;
        api.questions("q1").await.expect("cached");
        assert_eq!(mock.total_calls(), 1);

        tokio::time::advance(Duration::from_secs(2)).await;
        api.questions("q1").await.expect("refetched");
        assert_eq!(mock.total_calls(), 2);
    }

    #[tokio::test]
    async fn test_list_and_get_by_id() {
        let mock = MockTransport::new();
        mock.respond_json(Method::GET, "/questionarios", 200, json!([{"id": "q1", "nome": "COPSOQ II"}]));
        mock.respond_json(Method::GET, "/questionarios/q1", 200, json!({"id": "q1", "nome": "COPSOQ II", "ativo": true}));
        let client = HttpClient::builder(MOCK_BASE_URL)
            .transport(mock)
            .build()
            .expect("client");
        let api = QuestionnairesApi::new(&client, "tok");

        assert_eq!(api.list().await.expect("list").len(), 1);
        assert_eq!(api.get_by_id("q1").await.expect("by id").active, Some(true));
    }
}
