//! Maps store errors and authorization failures onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use flowlock_store::StoreError;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    /// Message always contains the literal word "unauthorized" so
    /// callers can pattern-match on it regardless of transport.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for TransportError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::WorkflowNotFound(id) => Self::NotFound(format!("workflow {id} not found")),
            StoreError::StepNotFound(id) => Self::NotFound(format!("step {id} not found")),
            StoreError::NotOwned(id, worker) => {
                Self::Conflict(format!("workflow {id} is not claimed by {worker}"))
            }
            StoreError::Database(msg) => Self::Internal(msg),
            StoreError::Serialization(msg) => Self::BadRequest(msg),
        }
    }
}

impl IntoResponse for TransportError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if matches!(self, Self::Internal(_)) {
            tracing::error!(error = %self, "transport error");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
