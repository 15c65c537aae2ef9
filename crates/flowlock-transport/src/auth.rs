//! Worker-API authorization middleware.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::error::TransportError;
use crate::state::AppState;

pub async fn require_worker_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, TransportError> {
    (state.authorize_worker)(request.headers()).map_err(TransportError::Unauthorized)?;
    Ok(next.run(request).await)
}
