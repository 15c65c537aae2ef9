//! Claim loop: fills up to `max_concurrent_workflows` concurrent
//! executions, waiting on whichever comes first of a free slot, a
//! reactive pending-work notification, or the poll-interval timer.

use std::sync::Arc;

use flowlock_store::OrchestratorStore;
use tokio::sync::{watch, Semaphore};
use tracing::{debug, error, info};

use crate::config::WorkerConfig;
use crate::registry::WorkflowRegistry;
use crate::runner::run_claimed_workflow;

pub struct WorkerPool {
    config: WorkerConfig,
    store: Arc<dyn OrchestratorStore>,
    registry: Arc<WorkflowRegistry>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    semaphore: Arc<Semaphore>,
}

impl WorkerPool {
    pub fn new(config: WorkerConfig, store: Arc<dyn OrchestratorStore>, registry: WorkflowRegistry) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent_workflows));
        Self { config, store, registry: Arc::new(registry), shutdown_tx, shutdown_rx, semaphore }
    }

    /// Spawns the claim loop and returns a handle to its background task.
    pub fn start(&self) -> tokio::task::JoinHandle<()> {
        let config = self.config.clone();
        let store = self.store.clone();
        let registry = self.registry.clone();
        let semaphore = self.semaphore.clone();
        let mut shutdown_rx = self.shutdown_rx.clone();

        tokio::spawn(async move {
            info!(worker_id = %config.worker_id, names = ?config.workflow_names, "claim loop starting");
            let mut pending_rx = store.subscribe_pending_workflows();

            loop {
                if *shutdown_rx.borrow() {
                    break;
                }

                let permit = match semaphore.clone().acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => break, // semaphore closed, pool is shutting down
                };

                match store.claim(&config.workflow_names, &config.worker_id).await {
                    Ok(Some(claimed)) => {
                        debug!(workflow_id = %claimed.workflow_id, name = %claimed.name, "claimed workflow");
                        let store = store.clone();
                        let registry = registry.clone();
                        let worker_id = config.worker_id.clone();
                        let heartbeat_interval = config.heartbeat_interval;
                        tokio::spawn(async move {
                            run_claimed_workflow(store, registry, claimed, worker_id, heartbeat_interval).await;
                            drop(permit);
                        });
                        // Try again immediately: there may be more pending work.
                        continue;
                    }
                    Ok(None) => {
                        drop(permit);
                        tokio::select! {
                            _ = tokio::time::sleep(config.poll_interval) => {}
                            _ = pending_rx.changed() => {}
                            _ = shutdown_rx.changed() => { if *shutdown_rx.borrow() { break; } }
                        }
                    }
                    Err(e) => {
                        error!(error = %e, "claim failed");
                        drop(permit);
                        tokio::time::sleep(config.poll_interval).await;
                    }
                }
            }
            info!(worker_id = %config.worker_id, "claim loop stopped");
        })
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    pub fn registry(&self) -> &WorkflowRegistry {
        &self.registry
    }
}
