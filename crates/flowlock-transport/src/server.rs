//! Assembles the Public and Worker routers into one `axum::Router`.

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{public, worker};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(public::routes(state.clone()))
        .merge(worker::routes(state))
        .layer(TraceLayer::new_for_http())
}

/// Binds and serves the router until the process is interrupted.
pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> std::io::Result<()> {
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "flowlock transport listening");
    axum::serve(listener, router).await
}
