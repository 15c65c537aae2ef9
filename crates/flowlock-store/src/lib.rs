//! # Orchestrator Store
//!
//! The transactional backend behind a pull-based durable workflow
//! runtime. Owns two tables, `workflows` and `steps`, and exposes the
//! operations a worker's claim loop and replay engine drive against
//! them: claiming work under a time-boxed lease, memoizing steps so a
//! replayed workflow body re-executes without re-running completed
//! work, and parking workflows that are asleep or waiting on a signal.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Worker Runtime                          │
//! │   (claim loop, replay engine, heartbeater — flowlock-worker) │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   OrchestratorStore                          │
//! │   workflows: status, lease, sleep_until, step_ids_by_name    │
//! │   steps:     memoized output/error per (workflow_id, name)   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Claims are never held indefinitely: a worker that stops heartbeating
//! loses its lease after [`model::CLAIM_TIMEOUT`] and another worker
//! picks the workflow back up, replaying it from its memoized steps.

pub mod error;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod schema;
pub mod store;

/// Common imports for callers of this crate.
pub mod prelude {
    pub use crate::error::{StoreError, StoreResult};
    pub use crate::memory::InMemoryOrchestratorStore;
    pub use crate::model::{synthetic, Step, StepStatus, Workflow, WorkflowStatus, CLAIM_TIMEOUT};
    pub use crate::postgres::PostgresOrchestratorStore;
    pub use crate::store::{
        ClaimedWorkflow, ListWorkflowsFilter, OrchestratorStore, SignalWaitOutcome, StepInfo,
    };
}

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryOrchestratorStore;
pub use model::{synthetic, Step, StepStatus, Workflow, WorkflowStatus, CLAIM_TIMEOUT};
pub use postgres::PostgresOrchestratorStore;
pub use store::{ClaimedWorkflow, ListWorkflowsFilter, OrchestratorStore, SignalWaitOutcome, StepInfo};
