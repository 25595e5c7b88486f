// Stored OAuth token for the Gmail notifier
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Tokens this close to expiry are refreshed early
const EXPIRY_SKEW_SECS: i64 = 60;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("no OAuth token at {}; authorize the gmail.send scope and save the token there", .0.display())]
    Missing(PathBuf),
    #[error("OAuth token at {} is expired and has no refresh token", .0.display())]
    NotRefreshable(PathBuf),
}

/// Authorized-user token file (`token.json`)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredToken {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
    /// Fields we don't use, written back untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl StoredToken {
    /// Whether the access token can be used at `now`. A token without an
    /// expiry is treated as valid.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        if self.token.as_deref().map_or(true, str::is_empty) {
            return false;
        }
        match self.expiry {
            Some(expiry) => expiry - Duration::seconds(EXPIRY_SKEW_SECS) > now,
            None => true,
        }
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    fn apply_refresh(&mut self, refreshed: RefreshResponse, now: DateTime<Utc>) {
        self.token = Some(refreshed.access_token);
        self.expiry = refreshed.expires_in.map(|secs| now + Duration::seconds(secs));
    }
}

#[derive(Debug, Clone)]
pub struct TokenStore {
    client: reqwest::Client,
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: PathBuf) -> Self {
        Self::with_client(reqwest::Client::new(), path)
    }

    pub fn with_client(client: reqwest::Client, path: PathBuf) -> Self {
        Self { client, path }
    }

    /// Return a usable access token, refreshing and persisting it when expired
    pub async fn access_token(&self) -> Result<String> {
        let mut stored = self
            .load()
            .await?
            .ok_or_else(|| TokenError::Missing(self.path.clone()))?;

        let now = Utc::now();
        if !stored.is_valid_at(now) {
            if !stored.can_refresh() {
                return Err(TokenError::NotRefreshable(self.path.clone()).into());
            }
            tracing::info!("Refreshing expired OAuth token from {}", self.path.display());
            let refreshed = self.refresh(&stored).await?;
            stored.apply_refresh(refreshed, now);
            self.save(&stored).await?;
        }

        stored
            .token
            .ok_or_else(|| anyhow::Error::from(TokenError::NotRefreshable(self.path.clone())))
    }

    pub async fn load(&self) -> Result<Option<StoredToken>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", self.path.display()));
            }
        };
        let token = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse OAuth token {}", self.path.display()))?;
        Ok(Some(token))
    }

    /// Write the token beside the target, then rename it into place so the
    /// old file survives a failed write.
    pub async fn save(&self, token: &StoredToken) -> Result<()> {
        let json = serde_json::to_string(token).context("Failed to serialize OAuth token")?;
        let staging = self.staging_path();
        tokio::fs::write(&staging, json)
            .await
            .with_context(|| format!("Failed to write {}", staging.display()))?;
        tokio::fs::rename(&staging, &self.path)
            .await
            .with_context(|| format!("Failed to replace {}", self.path.display()))
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "token.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn refresh(&self, token: &StoredToken) -> Result<RefreshResponse> {
        let refresh_token = token.refresh_token.as_deref().unwrap_or_default();
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", token.client_id.as_str()),
            ("client_secret", token.client_secret.as_str()),
        ];

        let response = self
            .client
            .post(&token.token_uri)
            .form(&params)
            .send()
            .await
            .context("Failed to send OAuth refresh request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("OAuth refresh failed with status {}: {}", status, body);
        }

        response
            .json::<RefreshResponse>()
            .await
            .context("Failed to parse OAuth refresh response")
    }
}
