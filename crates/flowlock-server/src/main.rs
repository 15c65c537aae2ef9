// Flowlock orchestrator server: the HTTP composition root over an
// OrchestratorStore. Owns no workflow logic of its own — everything
// here is wiring.

mod config;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::get;
use axum::{Json, Router};
use flowlock_store::{InMemoryOrchestratorStore, OrchestratorStore, PostgresOrchestratorStore};
use flowlock_transport::{AppState, AuthorizeWorker};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use config::{ServerConfig, StoreKind};

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok", version: env!("CARGO_PKG_VERSION") })
}

fn authorize_worker_from(token: Option<String>) -> AuthorizeWorker {
    match token {
        Some(expected) => Arc::new(move |headers: &axum::http::HeaderMap| {
            let presented = headers
                .get(axum::http::header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "));
            if presented == Some(expected.as_str()) {
                Ok(())
            } else {
                Err("missing or invalid worker bearer token".to_string())
            }
        }),
        None => Arc::new(|_headers| Ok(())),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "flowlock_server=info,flowlock_worker=info,flowlock_transport=info,tower_http=debug".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("flowlock-server starting...");

    let config = ServerConfig::from_env().context("invalid configuration")?;

    let store: Arc<dyn OrchestratorStore> = match config.store {
        StoreKind::Memory => {
            tracing::info!("using in-memory orchestrator store (data is lost on restart)");
            Arc::new(InMemoryOrchestratorStore::new())
        }
        StoreKind::Postgres => {
            let database_url = config.database_url.as_deref().expect("checked in ServerConfig::from_env");
            tracing::info!("connecting to postgres orchestrator store");
            Arc::new(
                PostgresOrchestratorStore::connect(database_url)
                    .await
                    .context("failed to connect orchestrator store to postgres")?,
            )
        }
    };

    if config.worker_token.is_none() {
        tracing::warn!(
            "FLOWLOCK_WORKER_TOKEN is not set; the worker API is open to any caller. Set it before exposing this service beyond localhost."
        );
    }
    let state = AppState::new(store, authorize_worker_from(config.worker_token.clone()));

    let router = Router::new()
        .route("/healthz", get(health))
        .merge(flowlock_transport::build_router(state))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", flowlock_transport::ApiDoc::openapi()));

    let listener = tokio::net::TcpListener::bind(config.http_addr).await?;
    tracing::info!(addr = %config.http_addr, "flowlock-server listening");
    axum::serve(listener, router).await?;

    Ok(())
}
