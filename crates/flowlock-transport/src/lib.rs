//! # Transport
//!
//! HTTP surface over an [`flowlock_store::OrchestratorStore`]: a Public
//! API (`/v1/workflows/...`) for starting, signaling, and observing
//! workflows, and a Worker API (`/v1/worker/...`) for the claim loop and
//! replay engine in `flowlock-worker`. The Worker API sits behind
//! [`state::AuthorizeWorker`] — a predicate the embedder supplies, since
//! what counts as an authorized worker (a shared secret, mTLS terminated
//! upstream, a service-mesh identity header) is deployment-specific.

pub mod auth;
pub mod error;
pub mod openapi;
pub mod public;
pub mod server;
pub mod state;
pub mod worker;

pub mod prelude {
    pub use crate::error::TransportError;
    pub use crate::openapi::ApiDoc;
    pub use crate::server::{build_router, serve};
    pub use crate::state::{AppState, AuthorizeWorker};
}

pub use error::TransportError;
pub use openapi::ApiDoc;
pub use server::{build_router, serve};
pub use state::{AppState, AuthorizeWorker};

#[cfg(test)]
mod tests;
