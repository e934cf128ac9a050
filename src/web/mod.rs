//! HTTP surface over the record gateway.
//!
//! - `GET  /api/get?user=<name>` returns the visible record as a JSON object.
//! - `POST /api/set` with `{user, date, supplements}` stores one day.
//! - `GET  /api/plan` returns the supplement plan the server runs with.
//! - `GET  /healthz` liveness probe.

pub mod app;
pub mod handlers;
pub mod models;
pub mod state;

pub use app::build_router;
pub use state::AppState;

use crate::core::TrackerError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::error;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

#[derive(Debug)]
pub enum WebError {
    Input(String),
    MethodNotAllowed,
    /// Carries the detail for the server log only; callers see a generic message.
    Internal(String),
}

impl From<TrackerError> for WebError {
    fn from(err: TrackerError) -> Self {
        match err {
            TrackerError::Validation(message) => Self::Input(message),
            TrackerError::MethodNotAllowed => Self::MethodNotAllowed,
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, message, code) = match self {
            WebError::Input(msg) => (StatusCode::BAD_REQUEST, msg, "input_error"),
            WebError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                "Method Not Allowed".to_string(),
                "method_not_allowed",
            ),
            WebError::Internal(detail) => {
                error!(error = %detail, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    "internal_error",
                )
            }
        };

        let body = Json(ErrorResponse {
            error: message,
            code: code.to_string(),
        });

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, WebError>;
