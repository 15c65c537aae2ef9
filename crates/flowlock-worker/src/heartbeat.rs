//! Per-claim heartbeater.
//!
//! Runs alongside a workflow execution, periodically renewing the lease.
//! If a heartbeat is ever rejected the lease is gone — another worker may
//! already be replaying this workflow — so the flag is latched and the
//! loop stops. The same flag is shared with the [`crate::context::WorkflowContext`]
//! driving the workflow body, so a lost claim halts further step/sleep/
//! signal mutations from inside the run, not just after it returns.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use flowlock_store::OrchestratorStore;
use tokio::sync::oneshot;
use tracing::warn;
use uuid::Uuid;

pub struct Heartbeat {
    claim_lost: Arc<AtomicBool>,
    cancel_tx: Option<oneshot::Sender<()>>,
    handle: tokio::task::JoinHandle<()>,
}

impl Heartbeat {
    /// `claim_lost` is shared with the [`crate::context::WorkflowContext`]
    /// running the same claim, so setting it here is immediately visible
    /// to the next store-mutating call the workflow body makes.
    pub fn spawn(
        store: Arc<dyn OrchestratorStore>,
        workflow_id: Uuid,
        worker_id: String,
        interval: Duration,
        claim_lost: Arc<AtomicBool>,
    ) -> Self {
        let (cancel_tx, mut cancel_rx) = oneshot::channel();
        let flag = claim_lost.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // consume the immediate first tick
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match store.heartbeat(workflow_id, &worker_id).await {
                            Ok(true) => {}
                            Ok(false) => {
                                warn!(%workflow_id, %worker_id, "lease lost during heartbeat");
                                flag.store(true, Ordering::SeqCst);
                                break;
                            }
                            Err(e) => {
                                warn!(%workflow_id, %worker_id, error = %e, "heartbeat failed");
                            }
                        }
                    }
                    _ = &mut cancel_rx => break,
                }
            }
        });

        Self { claim_lost, cancel_tx, handle }
    }

    pub fn claim_lost(&self) -> bool {
        self.claim_lost.load(Ordering::SeqCst)
    }

    /// Stops the heartbeat loop and waits for it to exit.
    pub async fn stop(mut self) {
        if let Some(tx) = self.cancel_tx.take() {
            let _ = tx.send(());
        }
        let _ = self.handle.await;
    }
}
