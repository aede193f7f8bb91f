use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("session not ready: {reason}")]
    Unauthorized { reason: String },
    #[error("invalid request: {message}")]
    Validation { message: String },
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: ErrorDetails<'a>,
}

#[derive(Debug, Serialize)]
struct ErrorDetails<'a> {
    code: &'a str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Unauthorized { reason } => {
                (StatusCode::UNAUTHORIZED, "unauthorized", reason.clone())
            }
            ApiError::Validation { message } => {
                (StatusCode::BAD_REQUEST, "invalid_request", message.clone())
            }
        };

        let mut response = Json(ErrorBody {
            error: ErrorDetails { code, message },
        })
        .into_response();
        *response.status_mut() = status;
        response
    }
}
