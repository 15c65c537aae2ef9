//! Environment-derived configuration for the orchestrator HTTP service.

use std::net::SocketAddr;

use anyhow::{Context, Result};

/// Which [`flowlock_store::OrchestratorStore`] backend to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Memory,
    Postgres,
}

pub struct ServerConfig {
    pub http_addr: SocketAddr,
    pub store: StoreKind,
    pub database_url: Option<String>,
    pub worker_token: Option<String>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let http_addr = std::env::var("FLOWLOCK_HTTP_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .context("FLOWLOCK_HTTP_ADDR must be a valid socket address")?;

        let store = match std::env::var("FLOWLOCK_STORE").as_deref() {
            Ok("postgres") => StoreKind::Postgres,
            Ok("memory") | Err(_) => StoreKind::Memory,
            Ok(other) => anyhow::bail!("FLOWLOCK_STORE must be \"memory\" or \"postgres\", got {other:?}"),
        };

        let database_url = std::env::var("DATABASE_URL").ok();
        if store == StoreKind::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL is required when FLOWLOCK_STORE=postgres");
        }

        let worker_token = std::env::var("FLOWLOCK_WORKER_TOKEN").ok();

        Ok(Self { http_addr, store, database_url, worker_token })
    }
}
