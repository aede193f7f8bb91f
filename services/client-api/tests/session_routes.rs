use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use client_api::{build_router, AppState};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use session_gate::{AuthSession, Identity, RetryPolicy, SessionError, SessionGate};
use tokio::sync::Mutex;
use tower::ServiceExt;

struct MockSession {
    identity: Option<Identity>,
    tokens: Mutex<VecDeque<Result<String, String>>>,
}

impl MockSession {
    fn signed_in(tokens: Vec<Result<String, String>>) -> Self {
        Self {
            identity: Some(Identity {
                user_id: "uid-42".to_string(),
                email: Some("doula@example.com".to_string()),
            }),
            tokens: Mutex::new(tokens.into_iter().collect()),
        }
    }

    fn signed_out() -> Self {
        Self {
            identity: None,
            tokens: Mutex::new(VecDeque::new()),
        }
    }
}

#[async_trait]
impl AuthSession for MockSession {
    async fn current_identity(&self) -> Option<Identity> {
        self.identity.clone()
    }

    async fn refresh_token(&self, _force: bool) -> Result<String, SessionError> {
        match self.tokens.lock().await.pop_front() {
            Some(Ok(token)) => Ok(token),
            Some(Err(message)) => Err(SessionError::Refresh(message)),
            None => Err(SessionError::Refresh("script exhausted".to_string())),
        }
    }
}

fn router_with(session: MockSession) -> axum::Router {
    let gate = SessionGate::with_policy(
        Arc::new(session),
        RetryPolicy {
            max_attempts: 3,
            delay: Duration::from_millis(0),
        },
    );
    build_router(Arc::new(AppState { gate }))
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

#[tokio::test]
async fn health_reports_ok() {
    let app = router_with(MockSession::signed_out());
    let response = app
        .oneshot(Request::get("/v1/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "client-api");
}

#[tokio::test]
async fn verify_returns_the_gate_result() {
    let app = router_with(MockSession::signed_in(vec![Ok("tok-1".to_string())]));
    let response = app
        .oneshot(
            Request::get("/v1/session/verify")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["is_authenticated"], true);
    assert_eq!(body["user_id"], "uid-42");
    assert_eq!(body["token"], "tok-1");
    assert_eq!(body["error"], Value::Null);
}

#[tokio::test]
async fn verify_surfaces_failures_as_data() {
    let app = router_with(MockSession::signed_out());
    let response = app
        .oneshot(
            Request::get("/v1/session/verify")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["is_authenticated"], false);
    assert_eq!(body["error"], "No authenticated user");
}

#[tokio::test]
async fn wait_retries_until_the_session_is_ready() {
    let app = router_with(MockSession::signed_in(vec![
        Err("not ready".to_string()),
        Err("not ready".to_string()),
        Ok("tok-3".to_string()),
    ]));
    let response = app
        .oneshot(json_request(
            "POST",
            "/v1/session/wait",
            json!({ "max_retries": 3, "delay_ms": 0 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["is_authenticated"], true);
    assert_eq!(body["token"], "tok-3");
}

#[tokio::test]
async fn wait_reports_exhaustion_with_the_standard_message() {
    let app = router_with(MockSession::signed_in(vec![
        Err("not ready".to_string()),
        Err("not ready".to_string()),
    ]));
    let response = app
        .oneshot(json_request(
            "POST",
            "/v1/session/wait",
            json!({ "max_retries": 2, "delay_ms": 0 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["is_authenticated"], false);
    assert_eq!(body["error"], "Authentication not ready after 2 attempts");
}

#[tokio::test]
async fn wait_rejects_an_out_of_bounds_budget() {
    let app = router_with(MockSession::signed_out());
    let response = app
        .oneshot(json_request(
            "POST",
            "/v1/session/wait",
            json!({ "max_retries": 0 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "invalid_request");
}

#[tokio::test]
async fn triage_summary_requires_a_ready_session() {
    let app = router_with(MockSession::signed_out());
    let response = app
        .oneshot(json_request(
            "POST",
            "/v1/triage/summary",
            json!({
                "client_name": "Ana R.",
                "recorded_at": "2026-03-14T02:30:00Z",
                "disposition": "continue_monitoring",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "unauthorized");
    assert_eq!(body["error"]["message"], "No authenticated user");
}

#[tokio::test]
async fn triage_summary_formats_the_note() {
    let app = router_with(MockSession::signed_in(vec![Ok("tok-1".to_string())]));
    let response = app
        .oneshot(json_request(
            "POST",
            "/v1/triage/summary",
            json!({
                "client_name": "Ana R.",
                "recorded_at": "2026-03-14T02:30:00Z",
                "gestation_weeks": 39,
                "contractions": { "interval_minutes": 4.5, "duration_seconds": 70 },
                "disposition": "go_to_hospital",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["client_name"], "Ana R.");
    let lines = body["lines"].as_array().expect("lines array");
    assert_eq!(lines[0], "Triage note for Ana R. (2026-03-14 02:30 UTC)");
    assert_eq!(
        lines.last().unwrap(),
        &Value::from("Recommendation: Go to the hospital")
    );
    assert!(body["summary"]
        .as_str()
        .unwrap()
        .contains("active labor pattern"));
}
