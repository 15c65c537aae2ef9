//! Workflow-facing error type.
//!
//! `ctx.sleep`/`ctx.sleep_until`/`ctx.wait_for_signal` unwind the workflow
//! body the same way a real failure would — through `?` — but they are
//! not failures. [`SuspendReason`] rides inside [`WorkflowError`] so the
//! conversion happens through the normal `From` impl workflow authors
//! already use, while staying a distinct variant the runner checks for
//! and strips back out before it ever reaches `failWorkflow`. A workflow
//! author matching on their own error type sees `Suspended` as a regular
//! variant, not a value they're likely to swallow by accident, but the
//! runner is what actually decides what to do with it.

use chrono::{DateTime, Utc};

/// Why a workflow body is unwinding without having failed.
#[derive(Debug, Clone)]
pub enum SuspendReason {
    /// Parked until `sleep_until` elapses.
    Sleep { sleep_until: DateTime<Utc> },
    /// Parked until a signal named `signal_name` arrives.
    WaitForSignal { signal_name: String },
}

/// Error type threaded through a workflow body via `?`.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("{message}")]
    Failed { message: String, code: Option<String> },

    #[error("store error: {0}")]
    Store(#[from] flowlock_store::StoreError),

    #[error("step output failed to (de)serialize: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Not a failure — see [`SuspendReason`].
    #[error("workflow suspended")]
    Suspended(SuspendReason),

    /// The lease moved to another worker mid-execution. Not a failure —
    /// nothing from this point on gets written; the runner just stops.
    #[error("claim lost")]
    ClaimLost,
}

impl WorkflowError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed { message: message.into(), code: None }
    }

    pub fn with_code(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self::Failed { message: message.into(), code: Some(code.into()) }
    }

    pub(crate) fn suspended(reason: SuspendReason) -> Self {
        Self::Suspended(reason)
    }

    pub(crate) fn claim_lost() -> Self {
        Self::ClaimLost
    }

    pub(crate) fn is_claim_lost(&self) -> bool {
        matches!(self, Self::ClaimLost)
    }

    pub(crate) fn into_suspend(self) -> Result<SuspendReason, Self> {
        match self {
            Self::Suspended(r) => Ok(r),
            other => Err(other),
        }
    }
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;
