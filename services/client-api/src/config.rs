use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct ClientApiConfig {
    pub bind_address: String,
    pub port: u16,
    pub identity: IdentityProviderConfig,
    pub retry: RetrySettings,
}

#[derive(Debug, Clone)]
pub struct IdentityProviderConfig {
    pub base_url: String,
    /// Long-lived refresh credential standing in for the signed-in session.
    /// Absent means no user is signed in from this service's point of view.
    pub refresh_credential: Option<String>,
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub delay_ms: u64,
}

impl Default for ClientApiConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8010,
            identity: IdentityProviderConfig::default(),
            retry: RetrySettings::default(),
        }
    }
}

impl Default for IdentityProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:9099".to_string(),
            refresh_credential: None,
            request_timeout_ms: 5000,
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_ms: 1000,
        }
    }
}

impl ClientApiConfig {
    /// Build the config from environment overrides on top of the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_address: env_string("CLIENT_API_BIND_ADDRESS", defaults.bind_address),
            port: env_parse("CLIENT_API_PORT", defaults.port),
            identity: IdentityProviderConfig {
                base_url: env_string("CLIENT_API_IDENTITY_URL", defaults.identity.base_url),
                refresh_credential: env::var("CLIENT_API_REFRESH_CREDENTIAL").ok(),
                request_timeout_ms: env_parse(
                    "CLIENT_API_IDENTITY_TIMEOUT_MS",
                    defaults.identity.request_timeout_ms,
                ),
            },
            retry: RetrySettings {
                max_attempts: env_parse("CLIENT_API_RETRY_ATTEMPTS", defaults.retry.max_attempts),
                delay_ms: env_parse("CLIENT_API_RETRY_DELAY_MS", defaults.retry.delay_ms),
            },
        }
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.bind_address, self.port).parse()
    }
}

fn env_string(var: &str, default: String) -> String {
    env::var(var).unwrap_or(default)
}

fn env_parse<T: FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(value) => value
            .parse::<T>()
            .inspect_err(|error| {
                tracing::warn!(%var, %value, %error, "invalid override, using default");
            })
            .unwrap_or(default),
        Err(_) => default,
    }
}
