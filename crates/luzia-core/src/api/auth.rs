use tokio_util::sync::CancellationToken;

use crate::models::{AuthToken, LoginRequest};

use super::{ApiError, HttpClient, RequestOptions};

pub struct AuthApi<'a> {
    client: &'a HttpClient,
    cancel: Option<CancellationToken>,
}

impl<'a> AuthApi<'a> {
    pub fn new(client: &'a HttpClient) -> Self {
        Self { client, cancel: None }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Exchange credentials for a bearer token. Unauthenticated, so a 401
    /// here is a plain wrong-password error with no session side effects.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthToken, ApiError> {
        let payload = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let options = RequestOptions::post("/auth/login")
            .json(&payload)?
            .cancel_token_opt(self.cancel.clone());
        self.client.request(options).await
    }
}
