// Gmail notifier implementation
use crate::application::notifier::Notifier;
use crate::domain::alert::AqiReport;
use crate::infrastructure::oauth_token::TokenStore;
use crate::presentation::report::{alert_message, ALERT_SUBJECT};
use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use serde::{Deserialize, Serialize};

const GMAIL_SEND_URL: &str = "https://gmail.googleapis.com/gmail/v1/users/me/messages/send";

#[derive(Debug, Clone)]
pub struct GmailNotifier {
    client: reqwest::Client,
    tokens: TokenStore,
    from_email: String,
    to_email: String,
}

#[derive(Debug, Serialize)]
struct SendRequest {
    raw: String,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: String,
}

impl GmailNotifier {
    pub fn new(tokens: TokenStore, from_email: String, to_email: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            tokens,
            from_email,
            to_email,
        }
    }

    /// RFC 5322 plain text message, base64url encoded for the `raw` field
    fn encode_message(&self, body: &str) -> String {
        let message = format!(
            "To: {}\r\nFrom: {}\r\nSubject: {}\r\nMIME-Version: 1.0\r\n\
             Content-Type: text/plain; charset=\"utf-8\"\r\nContent-Transfer-Encoding: 8bit\r\n\r\n{}",
            self.to_email,
            self.from_email,
            ALERT_SUBJECT,
            body.replace('\n', "\r\n")
        );
        URL_SAFE.encode(message.as_bytes())
    }
}

#[async_trait]
impl Notifier for GmailNotifier {
    async fn notify(&self, alerts: &AqiReport) -> Result<()> {
        let access_token = self
            .tokens
            .access_token()
            .await
            .context("Failed to obtain Gmail credentials")?;

        let request = SendRequest {
            raw: self.encode_message(&alert_message(alerts)),
        };

        let response = self
            .client
            .post(GMAIL_SEND_URL)
            .bearer_auth(access_token)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Gmail")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Gmail send failed with status {}: {}", status, body);
        }

        let sent = response
            .json::<SendResponse>()
            .await
            .context("Failed to parse Gmail response")?;

        tracing::info!("Message Id: {}", sent.id);
        Ok(())
    }
}
