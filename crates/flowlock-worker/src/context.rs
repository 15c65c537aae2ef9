//! [`WorkflowContext`]: the `ctx.step` / `ctx.sleep` / `ctx.wait_for_signal`
//! surface a workflow body calls through.
//!
//! Every call here is a replay point: on a fresh execution it does real
//! work and commits a step, on a replayed execution (same workflow,
//! later claim) it returns the memoized result instead of repeating the
//! side effect. Workflow bodies are expected to be deterministic between
//! these calls — same steps, same order — the same assumption any
//! replay-based durable-execution runtime makes.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use flowlock_store::{synthetic, OrchestratorStore, SignalWaitOutcome, StepStatus};

use crate::error::{SuspendReason, WorkflowError, WorkflowResult};

/// Handed to a workflow body for the duration of one claim.
#[derive(Clone)]
pub struct WorkflowContext {
    store: Arc<dyn OrchestratorStore>,
    workflow_id: Uuid,
    worker_id: String,
    sleep_seq: Arc<AtomicU64>,
    signal_seq: Arc<AtomicU64>,
    in_step: Arc<AtomicBool>,
    /// Shared with this claim's [`crate::heartbeat::Heartbeat`]. Once set,
    /// every subsequent store-mutating call here is skipped in favor of
    /// an immediate [`WorkflowError::ClaimLost`] — the lease has moved,
    /// so running further activities would only be wasted (or unsafe,
    /// if they're not idempotent) work.
    claim_lost: Arc<AtomicBool>,
}

impl WorkflowContext {
    pub fn new(
        store: Arc<dyn OrchestratorStore>,
        workflow_id: Uuid,
        worker_id: String,
        claim_lost: Arc<AtomicBool>,
    ) -> Self {
        Self {
            store,
            workflow_id,
            worker_id,
            sleep_seq: Arc::new(AtomicU64::new(0)),
            signal_seq: Arc::new(AtomicU64::new(0)),
            in_step: Arc::new(AtomicBool::new(false)),
            claim_lost,
        }
    }

    pub fn workflow_id(&self) -> Uuid {
        self.workflow_id
    }

    fn check_claim_lost(&self) -> WorkflowResult<()> {
        if self.claim_lost.load(Ordering::SeqCst) {
            Err(WorkflowError::claim_lost())
        } else {
            Ok(())
        }
    }

    /// Runs `f` at most once per `name` for this workflow. On replay,
    /// returns the memoized output (or re-raises the memoized failure)
    /// instead of calling `f` again.
    pub async fn step<T, E, F, Fut>(&self, name: &str, f: F) -> WorkflowResult<T>
    where
        T: Serialize + DeserializeOwned,
        E: std::fmt::Display,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.check_claim_lost()?;
        if self.in_step.swap(true, Ordering::SeqCst) {
            return Err(WorkflowError::failed(format!(
                "step {name:?} called while another step is already running"
            )));
        }
        let result = self.run_step(name, f).await;
        self.in_step.store(false, Ordering::SeqCst);
        result
    }

    async fn run_step<T, E, F, Fut>(&self, name: &str, f: F) -> WorkflowResult<T>
    where
        T: Serialize + DeserializeOwned,
        E: std::fmt::Display,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let info = self.store.get_or_create_step(self.workflow_id, name, &self.worker_id).await?;

        if !info.is_new {
            match info.status {
                StepStatus::Completed => {
                    let output =
                        info.output.ok_or_else(|| WorkflowError::failed("completed step has no output"))?;
                    return Ok(serde_json::from_value(output)?);
                }
                StepStatus::Failed => {
                    return Err(WorkflowError::failed(info.error.unwrap_or_default()));
                }
                // Crashed between creating the step and committing a result;
                // nothing was ever observed from the prior attempt, so it's
                // safe to run again.
                StepStatus::Pending | StepStatus::Running => {}
            }
        }

        match f().await {
            Ok(value) => {
                let encoded = serde_json::to_value(&value)?;
                let committed = self
                    .store
                    .complete_step(self.workflow_id, info.step_id, &self.worker_id, encoded)
                    .await?;
                if committed {
                    Ok(value)
                } else {
                    self.claim_lost.store(true, Ordering::SeqCst);
                    Err(WorkflowError::claim_lost())
                }
            }
            Err(e) => {
                let message = e.to_string();
                let committed = self
                    .store
                    .fail_step(self.workflow_id, info.step_id, &self.worker_id, &message)
                    .await?;
                if committed {
                    Err(WorkflowError::failed(message))
                } else {
                    self.claim_lost.store(true, Ordering::SeqCst);
                    Err(WorkflowError::claim_lost())
                }
            }
        }
    }

    /// Suspends the workflow for `duration`, resuming on a later claim.
    pub async fn sleep(&self, duration: ChronoDuration) -> WorkflowResult<()> {
        self.sleep_until(Utc::now() + duration).await
    }

    /// Suspends the workflow until `at`. The first call for a given
    /// replay position records `at`; later calls at the same position
    /// (after the workflow is reclaimed) keep that original wake time
    /// rather than recomputing a new one from a relative duration.
    pub async fn sleep_until(&self, at: DateTime<Utc>) -> WorkflowResult<()> {
        self.check_claim_lost()?;
        if self.in_step.load(Ordering::SeqCst) {
            return Err(WorkflowError::failed("ctx.sleep cannot be called inside ctx.step"));
        }
        let marker = format!("m{}", self.sleep_seq.fetch_add(1, Ordering::SeqCst));
        let step_name = synthetic::sleep_step_name(&marker);
        let info = self.store.get_or_create_step(self.workflow_id, &step_name, &self.worker_id).await?;

        if info.is_new {
            let committed = self
                .store
                .schedule_sleep(self.workflow_id, info.step_id, &self.worker_id, at)
                .await?;
            return if committed {
                Err(WorkflowError::suspended(SuspendReason::Sleep { sleep_until: at }))
            } else {
                self.claim_lost.store(true, Ordering::SeqCst);
                Err(WorkflowError::claim_lost())
            };
        }

        let wake_at = info.sleep_until.unwrap_or(at);
        if wake_at <= Utc::now() {
            Ok(())
        } else {
            Err(WorkflowError::suspended(SuspendReason::Sleep { sleep_until: wake_at }))
        }
    }

    /// Suspends the workflow until a signal named `signal_name` arrives,
    /// returning its payload once delivered.
    pub async fn wait_for_signal<T: DeserializeOwned>(&self, signal_name: &str) -> WorkflowResult<T> {
        self.check_claim_lost()?;
        if self.in_step.load(Ordering::SeqCst) {
            return Err(WorkflowError::failed("ctx.wait_for_signal cannot be called inside ctx.step"));
        }
        let marker = format!("m{}", self.signal_seq.fetch_add(1, Ordering::SeqCst));
        let step_name = synthetic::signal_step_name(signal_name, &marker);
        let info = self.store.get_or_create_step(self.workflow_id, &step_name, &self.worker_id).await?;

        if !info.is_new {
            if let StepStatus::Completed = info.status {
                let output = info.output.ok_or_else(|| WorkflowError::failed("completed wait has no output"))?;
                return Ok(serde_json::from_value(output)?);
            }
        }

        match self
            .store
            .wait_for_signal(self.workflow_id, info.step_id, &self.worker_id, signal_name)
            .await?
        {
            SignalWaitOutcome::Signaled { payload } => Ok(serde_json::from_value(payload)?),
            SignalWaitOutcome::Waiting => Err(WorkflowError::suspended(SuspendReason::WaitForSignal {
                signal_name: signal_name.to_string(),
            })),
        }
    }
}
