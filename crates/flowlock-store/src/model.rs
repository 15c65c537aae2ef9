//! Workflow and step data model
//!
//! Two persistent entities: a `Workflow` row (one per durable execution)
//! and a `Step` row (one per memoized unit of work inside a workflow,
//! including the synthetic sleep/signal markers `ctx` creates on the
//! worker side).

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Lease duration granted to a worker on claim, and extended on heartbeat.
pub const CLAIM_TIMEOUT: Duration = Duration::from_secs(30);

/// Workflow lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Pending,
    Running,
    Sleeping,
    Waiting,
    Completed,
    Failed,
}

impl std::fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Sleeping => "sleeping",
            Self::Waiting => "waiting",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

impl WorkflowStatus {
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "pending" => Self::Pending,
            "running" => Self::Running,
            "sleeping" => Self::Sleeping,
            "waiting" => Self::Waiting,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            _ => return None,
        })
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Step lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

impl StepStatus {
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "pending" => Self::Pending,
            "running" => Self::Running,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            _ => return None,
        })
    }
}

/// A durable workflow instance.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Workflow {
    pub id: Uuid,
    pub creation_time: DateTime<Utc>,
    pub name: String,
    pub status: WorkflowStatus,
    #[schema(value_type = Object)]
    pub input: serde_json::Value,
    #[schema(value_type = Option<Object>)]
    pub output: Option<serde_json::Value>,
    pub error: Option<String>,
    pub claimed_by: Option<String>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub lease_expires_at: Option<DateTime<Utc>>,
    pub sleep_until: Option<DateTime<Utc>>,
    #[schema(value_type = Object)]
    pub step_ids_by_name: HashMap<String, Uuid>,
    #[schema(value_type = Object)]
    pub pending_signals: HashMap<String, serde_json::Value>,
}

/// A memoized unit of work inside a workflow. `name` is either a
/// user-supplied step name or one of the synthetic sleep/signal marker
/// names reserved in [`crate::synthetic`].
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Step {
    pub id: Uuid,
    pub creation_time: DateTime<Utc>,
    pub workflow_id: Uuid,
    pub name: String,
    pub status: StepStatus,
    #[schema(value_type = Option<Object>)]
    pub output: Option<serde_json::Value>,
    pub error: Option<String>,
    pub sleep_until: Option<DateTime<Utc>>,
    pub awaiting_signal: Option<String>,
    pub attempts: i32,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Reserved synthetic step-name prefixes. User step names must never
/// collide with these.
pub mod synthetic {
    pub const SLEEP_PREFIX: &str = "__sleep:";
    pub const SIGNAL_PREFIX: &str = "__signal:";

    pub fn sleep_step_name(marker: &str) -> String {
        format!("{SLEEP_PREFIX}{marker}")
    }

    pub fn signal_step_name(signal_name: &str, marker: &str) -> String {
        format!("{SIGNAL_PREFIX}{signal_name}:{marker}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_strings() {
        for s in [
            WorkflowStatus::Pending,
            WorkflowStatus::Running,
            WorkflowStatus::Sleeping,
            WorkflowStatus::Waiting,
            WorkflowStatus::Completed,
            WorkflowStatus::Failed,
        ] {
            assert_eq!(WorkflowStatus::parse(&s.to_string()), Some(s));
        }
    }

    #[test]
    fn synthetic_names_are_namespaced() {
        assert_eq!(synthetic::sleep_step_name("d"), "__sleep:d");
        assert_eq!(synthetic::signal_step_name("approved", "d"), "__signal:approved:d");
    }
}
