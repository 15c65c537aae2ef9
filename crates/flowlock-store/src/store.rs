//! The `OrchestratorStore` trait.
//!
//! Every mutation here is guarded by ownership (`claimedBy = workerId ∧
//! status = running`) where the workflow row is involved, and commits
//! atomically against both the `workflows` and `steps` tables. Guarded
//! mutations return `Ok(false)` rather than an error when the caller no
//! longer holds the claim — losing a lease is an expected race, not a
//! failure.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreResult;
use crate::model::{Step, Workflow, WorkflowStatus};

/// A workflow handed to a worker by [`OrchestratorStore::claim`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimedWorkflow {
    pub workflow_id: Uuid,
    pub name: String,
    pub input: serde_json::Value,
}

/// Result of [`OrchestratorStore::get_or_create_step`].
#[derive(Debug, Clone)]
pub struct StepInfo {
    pub step_id: Uuid,
    pub status: crate::model::StepStatus,
    pub output: Option<serde_json::Value>,
    pub error: Option<String>,
    pub sleep_until: Option<DateTime<Utc>>,
    /// `true` the first time this step name is seen for the workflow;
    /// `false` on every later call, which is what makes the step
    /// at-most-once regardless of how many times the workflow replays.
    pub is_new: bool,
}

/// Result of [`OrchestratorStore::wait_for_signal`].
#[derive(Debug, Clone)]
pub enum SignalWaitOutcome {
    /// No matching signal has arrived yet; the caller should sleep the
    /// workflow the way it would for an unelapsed `ctx.sleep`.
    Waiting,
    /// A signal with this name had already been recorded against the
    /// workflow (or arrived in this same call) and was consumed.
    Signaled { payload: serde_json::Value },
}

/// Optional filters for [`OrchestratorStore::list_workflows`].
#[derive(Debug, Clone, Default)]
pub struct ListWorkflowsFilter {
    pub name: Option<String>,
    pub status: Option<WorkflowStatus>,
    pub limit: i64,
    pub offset: i64,
}

impl ListWorkflowsFilter {
    pub fn new() -> Self {
        Self { name: None, status: None, limit: 50, offset: 0 }
    }
}

/// The transactional backend behind the worker runtime. Implementations
/// must provide the claim-selection policy exactly:
///
/// 1. oldest pending workflow matching `workflow_names` (FIFO by
///    `creation_time`)
/// 2. sleeping workflow whose `sleep_until` has elapsed, tie-broken by
///    `sleep_until` then `creation_time`
/// 3. running workflow whose `lease_expires_at` has passed, oldest
///    `creation_time` first
/// 4. running workflow with no `lease_expires_at` but a `claimed_at`
///    older than [`crate::model::CLAIM_TIMEOUT`] (legacy reclaim)
///
/// returning on the first tier that yields a match.
#[async_trait]
pub trait OrchestratorStore: Send + Sync + 'static {
    async fn start_workflow(&self, name: &str, input: serde_json::Value) -> StoreResult<Uuid>;

    /// `workflow_names == ["*"]` claims across every registered name.
    async fn claim(
        &self,
        workflow_names: &[String],
        worker_id: &str,
    ) -> StoreResult<Option<ClaimedWorkflow>>;

    /// Extends the lease by [`crate::model::CLAIM_TIMEOUT`] from now.
    /// Returns `false` if the caller no longer owns the claim.
    async fn heartbeat(&self, workflow_id: Uuid, worker_id: &str) -> StoreResult<bool>;

    async fn complete_workflow(
        &self,
        workflow_id: Uuid,
        worker_id: &str,
        output: serde_json::Value,
    ) -> StoreResult<bool>;

    async fn fail_workflow(
        &self,
        workflow_id: Uuid,
        worker_id: &str,
        error: &str,
    ) -> StoreResult<bool>;

    /// Releases the claim and parks the workflow until `sleep_until`
    /// without recording a step (used for the bare `ctx.sleep` marker
    /// once the underlying step itself has already been memoized via
    /// [`Self::schedule_sleep`]).
    async fn sleep_workflow(
        &self,
        workflow_id: Uuid,
        worker_id: &str,
        sleep_until: DateTime<Utc>,
    ) -> StoreResult<bool>;

    /// Idempotent: replays of an already-seen `step_name` return the
    /// memoized row with `is_new = false` instead of re-running it.
    /// Errors if the caller does not currently own `workflow_id`.
    async fn get_or_create_step(
        &self,
        workflow_id: Uuid,
        step_name: &str,
        worker_id: &str,
    ) -> StoreResult<StepInfo>;

    async fn complete_step(
        &self,
        workflow_id: Uuid,
        step_id: Uuid,
        worker_id: &str,
        output: serde_json::Value,
    ) -> StoreResult<bool>;

    async fn fail_step(
        &self,
        workflow_id: Uuid,
        step_id: Uuid,
        worker_id: &str,
        error: &str,
    ) -> StoreResult<bool>;

    /// Records the step's wake time and transitions the workflow to
    /// `sleeping` in one commit. Returns `false` on a lost claim.
    async fn schedule_sleep(
        &self,
        workflow_id: Uuid,
        step_id: Uuid,
        worker_id: &str,
        sleep_until: DateTime<Utc>,
    ) -> StoreResult<bool>;

    /// Consumes a pending signal of `signal_name` if one has already
    /// arrived; otherwise transitions the workflow to `waiting` and
    /// returns [`SignalWaitOutcome::Waiting`].
    async fn wait_for_signal(
        &self,
        workflow_id: Uuid,
        step_id: Uuid,
        worker_id: &str,
        signal_name: &str,
    ) -> StoreResult<SignalWaitOutcome>;

    /// Delivers a signal. If a workflow is currently `waiting` on this
    /// name it is moved back to `pending` (and any reactive subscribers
    /// are woken); otherwise the payload is buffered in
    /// `pending_signals` for the next `wait_for_signal` call.
    async fn signal_workflow(
        &self,
        workflow_id: Uuid,
        signal_name: &str,
        payload: serde_json::Value,
    ) -> StoreResult<bool>;

    async fn get_workflow(&self, workflow_id: Uuid) -> StoreResult<Workflow>;

    async fn list_workflows(&self, filter: ListWorkflowsFilter) -> StoreResult<Vec<Workflow>>;

    async fn get_workflow_steps(&self, workflow_id: Uuid) -> StoreResult<Vec<Step>>;

    /// A coarse wakeup channel: fires whenever a mutation to the
    /// `workflows` table *might* have made something claimable. It is a
    /// latency optimization only — [`Self::has_pending_work`] (or simply
    /// calling [`Self::claim`]) is what actually decides, and the
    /// worker's poll-interval timer is the correctness fallback if a
    /// notification is ever missed.
    fn subscribe_pending_workflows(&self) -> tokio::sync::watch::Receiver<u64>;

    /// True if `claim` would currently find a pending or due-sleeper
    /// workflow matching `workflow_names`. Does not consider expired
    /// leases.
    async fn has_pending_work(&self, workflow_names: &[String]) -> StoreResult<bool>;
}
