pub mod config;
pub mod error;
pub mod session;

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderValue, Request};
use axum::middleware::{from_fn, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use session_gate::{AuthVerification, RetryPolicy, SessionGate};
use tracing::info_span;
use tracing_subscriber::EnvFilter;
use triage_notes::TriageNote;
use uuid::Uuid;

use error::ApiError;

pub const SERVICE_NAME: &str = "client-api";
const REQUEST_ID_HEADER: &str = "x-request-id";

// Server-side bounds on a caller-supplied wait budget.
const MAX_WAIT_ATTEMPTS: u32 = 10;
const MAX_WAIT_DELAY_MS: u64 = 10_000;

#[derive(Clone)]
pub struct AppState {
    pub gate: SessionGate,
}

/// Install the global tracing subscriber. Safe to call more than once; later
/// calls are ignored.
pub fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_ansi(false)
        .try_init();
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/info", get(info))
        .route("/v1/session/verify", get(verify_session))
        .route("/v1/session/wait", post(wait_session))
        .route("/v1/triage/summary", post(triage_summary))
        .layer(from_fn(request_context))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "service": SERVICE_NAME }))
}

async fn info() -> Json<serde_json::Value> {
    Json(json!({
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Single readiness check against the identity provider.
async fn verify_session(State(state): State<Arc<AppState>>) -> Json<AuthVerification> {
    Json(state.gate.verify().await)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WaitRequest {
    pub max_retries: Option<u32>,
    pub delay_ms: Option<u64>,
}

/// Readiness check with a bounded retry budget, for callers that just
/// completed a sign-in and expect the backend to catch up shortly.
async fn wait_session(
    State(state): State<Arc<AppState>>,
    Json(request): Json<WaitRequest>,
) -> Result<Json<AuthVerification>, ApiError> {
    let defaults = state.gate.policy();
    let max_attempts = request.max_retries.unwrap_or(defaults.max_attempts);
    let delay_ms = request
        .delay_ms
        .unwrap_or(defaults.delay.as_millis() as u64);

    if max_attempts == 0 || max_attempts > MAX_WAIT_ATTEMPTS {
        return Err(ApiError::Validation {
            message: format!("max_retries must be between 1 and {MAX_WAIT_ATTEMPTS}"),
        });
    }
    if delay_ms > MAX_WAIT_DELAY_MS {
        return Err(ApiError::Validation {
            message: format!("delay_ms must be at most {MAX_WAIT_DELAY_MS}"),
        });
    }

    let policy = RetryPolicy {
        max_attempts,
        delay: Duration::from_millis(delay_ms),
    };
    Ok(Json(state.gate.wait_ready_with(policy).await))
}

/// Format a triage note for display. The session gate runs first: this is an
/// authenticated surface, and the gate is its precondition check.
async fn triage_summary(
    State(state): State<Arc<AppState>>,
    Json(note): Json<TriageNote>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let auth = state.gate.verify().await;
    if !auth.is_authenticated {
        return Err(ApiError::Unauthorized {
            reason: auth
                .error
                .unwrap_or_else(|| "session not ready".to_string()),
        });
    }

    Ok(Json(json!({
        "client_name": note.client_name,
        "summary": note.summary(),
        "lines": note.summary_lines(),
    })))
}

async fn request_context(mut req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
        .unwrap_or_else(|| {
            let id = Uuid::new_v4().to_string();
            if let Ok(value) = HeaderValue::from_str(&id) {
                req.headers_mut().insert(REQUEST_ID_HEADER, value);
            }
            id
        });

    let span = info_span!(
        "http.request",
        method = %method,
        path = %path,
        request_id = %request_id
    );

    let start = Instant::now();
    let mut response = {
        let _guard = span.enter();
        tracing::info!(event = "request_start", method = %method, path = %path);
        next.run(req).await
    };

    let status = response.status();
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    {
        let _guard = span.enter();
        tracing::info!(
            event = "request_end",
            method = %method,
            path = %path,
            status = status.as_u16(),
            latency_ms
        );
    }

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}
