//! Drives a single claimed workflow through its registered body to
//! completion, sleep, or a wait-for-signal suspension, then commits the
//! outcome back to the store.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use flowlock_store::{ClaimedWorkflow, OrchestratorStore};
use tracing::{info, instrument, warn};

use crate::context::WorkflowContext;
use crate::error::SuspendReason;
use crate::heartbeat::Heartbeat;
use crate::registry::WorkflowRegistry;

/// Executes one claimed workflow to its next suspension point.
#[instrument(skip(store, registry), fields(workflow_id = %claimed.workflow_id, name = %claimed.name))]
pub async fn run_claimed_workflow(
    store: Arc<dyn OrchestratorStore>,
    registry: Arc<WorkflowRegistry>,
    claimed: ClaimedWorkflow,
    worker_id: String,
    heartbeat_interval: Duration,
) {
    let workflow_id = claimed.workflow_id;
    let claim_lost = Arc::new(AtomicBool::new(false));
    let heartbeat =
        Heartbeat::spawn(store.clone(), workflow_id, worker_id.clone(), heartbeat_interval, claim_lost.clone());

    let Some(handler) = registry.get(&claimed.name).cloned() else {
        warn!(name = %claimed.name, "claimed workflow has no registered handler");
        let message = format!("no workflow registered for type {:?}", claimed.name);
        if let Err(e) = store.fail_workflow(workflow_id, &worker_id, &message).await {
            warn!(%workflow_id, error = %e, "failed to record missing-handler failure");
        }
        heartbeat.stop().await;
        return;
    };

    let ctx = WorkflowContext::new(store.clone(), workflow_id, worker_id.clone(), claim_lost.clone());
    let result = handler(ctx, claimed.input).await;

    if claim_lost.load(Ordering::SeqCst) {
        info!(%workflow_id, "claim lost during execution; not writing further state");
        heartbeat.stop().await;
        return;
    }

    match result {
        Ok(output) => {
            match store.complete_workflow(workflow_id, &worker_id, output).await {
                Ok(true) => info!(%workflow_id, "workflow completed"),
                Ok(false) => warn!(%workflow_id, "lost claim before completion could commit"),
                Err(e) => warn!(%workflow_id, error = %e, "failed to commit workflow completion"),
            }
        }
        Err(err) => {
            if err.is_claim_lost() {
                info!(%workflow_id, "claim lost during execution; not writing further state");
            } else {
                match err.into_suspend() {
                    // schedule_sleep already committed the sleep transition
                    // inside WorkflowContext::sleep_until; nothing left to do.
                    Ok(SuspendReason::Sleep { sleep_until }) => {
                        info!(%workflow_id, %sleep_until, "workflow sleeping");
                    }
                    // wait_for_signal already transitioned the workflow to
                    // `waiting` via the store call inside WorkflowContext;
                    // nothing left to do.
                    Ok(SuspendReason::WaitForSignal { signal_name }) => {
                        info!(%workflow_id, %signal_name, "workflow waiting for signal");
                    }
                    Err(real_error) => {
                        let message = real_error.to_string();
                        match store.fail_workflow(workflow_id, &worker_id, &message).await {
                            Ok(true) => warn!(%workflow_id, %message, "workflow failed"),
                            Ok(false) => warn!(%workflow_id, "lost claim before failure could commit"),
                            Err(e) => warn!(%workflow_id, error = %e, "failed to commit workflow failure"),
                        }
                    }
                }
            }
        }
    }

    heartbeat.stop().await;
}
