use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use super::auth::CredentialSource;
use super::mime;
use super::GmailError;
use crate::send_email::EmailSender;

const GMAIL_API_BASE: &str = "https://gmail.googleapis.com";

/// Minimal Gmail REST client (send only)
pub struct GmailClient {
    http_client: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialSource>,
}

#[derive(Deserialize)]
struct SentMessage {
    #[serde(default)]
    id: String,
}

impl GmailClient {
    pub fn new(credentials: Arc<dyn CredentialSource>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: GMAIL_API_BASE.to_string(),
            credentials,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl EmailSender for GmailClient {
    async fn send_new_email(&self, to: &str, subject: &str, body: &str) -> Result<String, GmailError> {
        let access_token = self.credentials.access_token().await?;
        let raw = mime::encode_raw(&mime::build_message(to, subject, body));

        tracing::debug!(to = %to, "Sending Gmail message");

        let response = self
            .http_client
            .post(format!("{}/gmail/v1/users/me/messages/send", self.base_url))
            .bearer_auth(access_token)
            .json(&json!({ "raw": raw }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GmailError::Api { status, body });
        }

        let sent: SentMessage = response.json().await?;
        Ok(sent.id)
    }
}
