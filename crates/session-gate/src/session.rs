use async_trait::async_trait;

/// The authenticated principal as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Stable unique identifier assigned by the identity provider.
    pub user_id: String,
    pub email: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The token endpoint rejected the request or could not be reached.
    #[error("token refresh failed: {0}")]
    Refresh(String),
}

/// Narrow seam over the identity provider's client SDK.
///
/// Implementations read ambient session state owned by the provider; the
/// only side effect this trait permits is the network round-trip performed
/// by [`refresh_token`](AuthSession::refresh_token).
#[async_trait]
pub trait AuthSession: Send + Sync {
    /// The currently signed-in identity, if any.
    async fn current_identity(&self) -> Option<Identity>;

    /// Obtain a credential token for the current identity.
    ///
    /// When `force` is set the provider must re-issue the token rather than
    /// serve a cached one.
    async fn refresh_token(&self, force: bool) -> Result<String, SessionError>;
}

/// Fixed-response session for tests and local wiring.
///
/// Returns the configured identity and token on every call; an unset token
/// refreshes to the empty string.
#[derive(Debug, Default)]
pub struct StaticSession {
    pub identity: Option<Identity>,
    pub token: Option<String>,
}

#[async_trait]
impl AuthSession for StaticSession {
    async fn current_identity(&self) -> Option<Identity> {
        self.identity.clone()
    }

    async fn refresh_token(&self, _force: bool) -> Result<String, SessionError> {
        Ok(self.token.clone().unwrap_or_default())
    }
}
