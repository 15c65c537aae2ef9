//! Worker pool configuration.

use std::time::Duration;

use flowlock_store::CLAIM_TIMEOUT;
use uuid::Uuid;

/// Configuration for a [`crate::pool::WorkerPool`].
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Workflow type names this worker claims. `["*".to_string()]` claims
    /// across every registered name.
    pub workflow_names: Vec<String>,
    pub worker_id: String,
    /// How often to poll when there's no reactive wakeup. Default 1s.
    pub poll_interval: Duration,
    /// Upper bound on workflows this worker runs at once. Default 1.
    pub max_concurrent_workflows: usize,
    /// How often to renew a held lease. Default a third of the claim
    /// timeout, leaving margin for at least two missed beats before the
    /// lease actually expires.
    pub heartbeat_interval: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            workflow_names: vec!["*".to_string()],
            worker_id: format!("worker-{}", Uuid::now_v7()),
            poll_interval: Duration::from_millis(1000),
            max_concurrent_workflows: 1,
            heartbeat_interval: CLAIM_TIMEOUT / 3,
        }
    }
}

impl WorkerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claim_all(mut self) -> Self {
        self.workflow_names = vec!["*".to_string()];
        self
    }

    pub fn claim_only(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.workflow_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_worker_id(mut self, worker_id: impl Into<String>) -> Self {
        self.worker_id = worker_id.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_concurrent_workflows(mut self, max: usize) -> Self {
        self.max_concurrent_workflows = max.max(1);
        self
    }

    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }
}
