use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::sleep;

use crate::session::AuthSession;

/// Why a verification attempt did not produce a usable credential.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    #[error("No authenticated user")]
    NoAuthenticatedUser,
    #[error("Failed to get authentication token")]
    TokenUnavailable,
    #[error("{0}")]
    TokenRefreshFailed(String),
    #[error("Authentication not ready after {0} attempts")]
    RetriesExhausted(u32),
}

/// Outcome of a readiness check.
///
/// Constructed fresh per attempt, never mutated afterwards, and consumed
/// immediately by the caller. `is_authenticated` holds exactly when both
/// `user_id` and `token` are present; `error` is set exactly when it is not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthVerification {
    pub is_authenticated: bool,
    pub user_id: Option<String>,
    pub token: Option<String>,
    pub error: Option<String>,
}

impl AuthVerification {
    pub fn authenticated(user_id: String, token: String) -> Self {
        Self {
            is_authenticated: true,
            user_id: Some(user_id),
            token: Some(token),
            error: None,
        }
    }

    pub fn failed(reason: VerifyError) -> Self {
        Self {
            is_authenticated: false,
            user_id: None,
            token: None,
            error: Some(reason.to_string()),
        }
    }
}

/// Retry budget for [`SessionGate::wait_ready`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(1000),
        }
    }
}

/// Blocking precondition check run before issuing authenticated requests.
#[derive(Clone)]
pub struct SessionGate {
    session: Arc<dyn AuthSession>,
    policy: RetryPolicy,
}

impl SessionGate {
    pub fn new(session: Arc<dyn AuthSession>) -> Self {
        Self::with_policy(session, RetryPolicy::default())
    }

    pub fn with_policy(session: Arc<dyn AuthSession>, policy: RetryPolicy) -> Self {
        Self { session, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Check once whether a signed-in identity with a fresh token is
    /// available.
    ///
    /// The token is always re-issued by the provider, never read from a
    /// cache, so an identity whose credential subsystem has not finished
    /// initializing fails the check instead of returning stale state. All
    /// failure paths are captured in the returned value; this never
    /// propagates an error.
    pub async fn verify(&self) -> AuthVerification {
        let identity = match self.session.current_identity().await {
            Some(identity) => identity,
            None => return AuthVerification::failed(VerifyError::NoAuthenticatedUser),
        };

        match self.session.refresh_token(true).await {
            Ok(token) if token.is_empty() => {
                AuthVerification::failed(VerifyError::TokenUnavailable)
            }
            Ok(token) => AuthVerification::authenticated(identity.user_id, token),
            Err(err) => AuthVerification::failed(VerifyError::TokenRefreshFailed(err.to_string())),
        }
    }

    /// Retry [`verify`](SessionGate::verify) with the gate's own policy.
    pub async fn wait_ready(&self) -> AuthVerification {
        self.wait_ready_with(self.policy).await
    }

    /// Retry [`verify`](SessionGate::verify) until it succeeds or the retry
    /// budget is spent.
    ///
    /// Attempts run strictly one after another; the fixed delay elapses only
    /// between attempts, never after the last one. Exhaustion replaces the
    /// final failure's message with the standardized retries-exhausted text.
    /// A zero `max_attempts` is clamped to a single attempt.
    pub async fn wait_ready_with(&self, policy: RetryPolicy) -> AuthVerification {
        let max_attempts = policy.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            let result = self.verify().await;
            if result.is_authenticated {
                tracing::debug!(attempt, max_attempts, "session ready");
                return result;
            }

            tracing::debug!(
                attempt,
                max_attempts,
                error = result.error.as_deref().unwrap_or_default(),
                "session not ready"
            );
            if attempt < max_attempts {
                sleep(policy.delay).await;
            }
        }

        tracing::warn!(max_attempts, "session readiness retries exhausted");
        AuthVerification::failed(VerifyError::RetriesExhausted(max_attempts))
    }
}
