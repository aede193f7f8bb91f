use std::sync::Arc;
use std::time::Duration;

use client_api::config::ClientApiConfig;
use client_api::session::HttpAuthSession;
use client_api::{build_router, init_tracing, AppState, SERVICE_NAME};
use session_gate::{RetryPolicy, SessionGate};
use tokio::net::TcpListener;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn build_sha() -> &'static str {
    option_env!("BUILD_SHA").unwrap_or("unknown")
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = ClientApiConfig::from_env();
    let addr = config.socket_addr()?;
    tracing::info!(
        event = "service_start",
        service = SERVICE_NAME,
        version = VERSION,
        build_sha = build_sha(),
        listen_addr = %addr,
        "starting service"
    );

    let session = HttpAuthSession::new(&config.identity)
        .map_err(|err| -> Box<dyn std::error::Error> { Box::new(err) })?;
    let policy = RetryPolicy {
        max_attempts: config.retry.max_attempts,
        delay: Duration::from_millis(config.retry.delay_ms),
    };
    let gate = SessionGate::with_policy(Arc::new(session), policy);

    let state = Arc::new(AppState { gate });
    let router = build_router(state);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router.into_make_service()).await?;

    tracing::info!(event = "service_stop", service = SERVICE_NAME);
    Ok(())
}
