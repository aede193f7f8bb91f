use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use session_gate::{AuthSession, Identity, SessionError};

use crate::config::IdentityProviderConfig;

#[derive(Debug, thiserror::Error)]
pub enum SessionClientError {
    #[error("invalid identity provider url: {0}")]
    InvalidUrl(String),
    #[error("failed to build http client: {0}")]
    Client(reqwest::Error),
}

/// [`AuthSession`] over the managed identity provider's REST API.
///
/// The configured refresh credential stands in for the signed-in session:
/// without one there is no current identity, with one the provider's account
/// endpoint resolves the identity and the token endpoint issues credentials.
#[derive(Clone)]
pub struct HttpAuthSession {
    base_url: Url,
    refresh_credential: Option<String>,
    client: Client,
}

impl HttpAuthSession {
    pub fn new(config: &IdentityProviderConfig) -> Result<Self, SessionClientError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|err| SessionClientError::InvalidUrl(err.to_string()))?;
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(SessionClientError::Client)?;
        Ok(Self {
            base_url,
            refresh_credential: config.refresh_credential.clone(),
            client,
        })
    }
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    user_id: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    grant_type: &'static str,
    refresh_token: &'a str,
    force_refresh: bool,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: String,
}

#[async_trait]
impl AuthSession for HttpAuthSession {
    async fn current_identity(&self) -> Option<Identity> {
        let credential = self.refresh_credential.as_deref()?;
        let url = self.base_url.join("v1/account").ok()?;
        let response = self
            .client
            .get(url)
            .bearer_auth(credential)
            .send()
            .await
            .inspect_err(|error| tracing::debug!(%error, "account lookup failed"))
            .ok()?;

        if !response.status().is_success() {
            tracing::debug!(status = %response.status(), "account lookup rejected");
            return None;
        }

        let account = response
            .json::<AccountResponse>()
            .await
            .inspect_err(|error| tracing::debug!(%error, "account response unreadable"))
            .ok()?;
        Some(Identity {
            user_id: account.user_id,
            email: account.email,
        })
    }

    async fn refresh_token(&self, force: bool) -> Result<String, SessionError> {
        let credential = self
            .refresh_credential
            .as_deref()
            .ok_or_else(|| SessionError::Refresh("no refresh credential configured".to_string()))?;
        let url = self
            .base_url
            .join("v1/token")
            .map_err(|err| SessionError::Refresh(err.to_string()))?;

        let response = self
            .client
            .post(url)
            .json(&TokenRequest {
                grant_type: "refresh_token",
                refresh_token: credential,
                force_refresh: force,
            })
            .send()
            .await
            .map_err(|err| SessionError::Refresh(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SessionError::Refresh(format!(
                "token endpoint responded with status {status}"
            )));
        }

        let token = response
            .json::<TokenResponse>()
            .await
            .map_err(|err| SessionError::Refresh(err.to_string()))?;
        Ok(token.access_token)
    }
}
