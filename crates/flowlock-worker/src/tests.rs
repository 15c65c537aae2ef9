//! End-to-end coverage driving a real `WorkerPool` against an in-memory
//! store: step memoization, sleep, signal wait, and step failure.

use std::sync::Arc;
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use flowlock_store::{InMemoryOrchestratorStore, OrchestratorStore, WorkflowStatus};
use serde_json::json;
use uuid::Uuid;

use crate::config::WorkerConfig;
use crate::pool::WorkerPool;
use crate::registry::WorkflowRegistry;

async fn wait_for_status(store: &Arc<dyn OrchestratorStore>, id: Uuid, status: WorkflowStatus, timeout: Duration) {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if store.get_workflow(id).await.unwrap().status == status {
            return;
        }
        if tokio::time::Instant::now() >= deadline {
            panic!("workflow {id} did not reach {status:?} within {timeout:?}");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

fn test_config() -> WorkerConfig {
    WorkerConfig::new()
        .with_poll_interval(Duration::from_millis(15))
        .with_heartbeat_interval(Duration::from_millis(200))
}

#[tokio::test]
async fn workflow_completes_through_two_memoized_steps() {
    let store: Arc<dyn OrchestratorStore> = Arc::new(InMemoryOrchestratorStore::new());
    let mut registry = WorkflowRegistry::new();
    registry.register("greet", |ctx, input: serde_json::Value| async move {
        let name = input["name"].as_str().unwrap_or("world").to_string();
        let greeting = ctx
            .step("build-greeting", || async move { Ok::<_, std::convert::Infallible>(format!("hello {name}")) })
            .await?;
        let shout = ctx
            .step("shout", || {
                let greeting = greeting.clone();
                async move { Ok::<_, std::convert::Infallible>(greeting.to_uppercase()) }
            })
            .await?;
        Ok::<_, crate::error::WorkflowError>(shout)
    });

    let workflow_id = store.start_workflow("greet", json!({"name": "ada"})).await.unwrap();

    let pool = WorkerPool::new(test_config(), store.clone(), registry);
    pool.start();

    wait_for_status(&store, workflow_id, WorkflowStatus::Completed, Duration::from_secs(2)).await;

    let workflow = store.get_workflow(workflow_id).await.unwrap();
    assert_eq!(workflow.output, Some(json!("HELLO ADA")));

    let steps = store.get_workflow_steps(workflow_id).await.unwrap();
    assert_eq!(steps.len(), 2);
}

#[tokio::test]
async fn workflow_sleeps_and_resumes_on_its_own() {
    let store: Arc<dyn OrchestratorStore> = Arc::new(InMemoryOrchestratorStore::new());
    let mut registry = WorkflowRegistry::new();
    registry.register("delayed", |ctx, _input: serde_json::Value| async move {
        ctx.sleep(ChronoDuration::milliseconds(60)).await?;
        Ok::<_, crate::error::WorkflowError>(json!("woke up"))
    });

    let workflow_id = store.start_workflow("delayed", json!({})).await.unwrap();
    let pool = WorkerPool::new(test_config(), store.clone(), registry);
    pool.start();

    wait_for_status(&store, workflow_id, WorkflowStatus::Sleeping, Duration::from_secs(1)).await;
    wait_for_status(&store, workflow_id, WorkflowStatus::Completed, Duration::from_secs(2)).await;

    let workflow = store.get_workflow(workflow_id).await.unwrap();
    assert_eq!(workflow.output, Some(json!("woke up")));
}

#[tokio::test]
async fn workflow_waits_for_a_signal_then_resumes() {
    let store: Arc<dyn OrchestratorStore> = Arc::new(InMemoryOrchestratorStore::new());
    let mut registry = WorkflowRegistry::new();
    registry.register("approval", |ctx, _input: serde_json::Value| async move {
        let payload: serde_json::Value = ctx.wait_for_signal("approved").await?;
        Ok::<_, crate::error::WorkflowError>(payload)
    });

    let workflow_id = store.start_workflow("approval", json!({})).await.unwrap();
    let pool = WorkerPool::new(test_config(), store.clone(), registry);
    pool.start();

    wait_for_status(&store, workflow_id, WorkflowStatus::Waiting, Duration::from_secs(1)).await;

    store.signal_workflow(workflow_id, "approved", json!({"ok": true})).await.unwrap();

    wait_for_status(&store, workflow_id, WorkflowStatus::Completed, Duration::from_secs(2)).await;

    let workflow = store.get_workflow(workflow_id).await.unwrap();
    assert_eq!(workflow.output, Some(json!({"ok": true})));
}

#[tokio::test]
async fn a_failed_step_fails_the_workflow() {
    let store: Arc<dyn OrchestratorStore> = Arc::new(InMemoryOrchestratorStore::new());
    let mut registry = WorkflowRegistry::new();
    registry.register("doomed", |ctx, _input: serde_json::Value| async move {
        ctx.step("boom", || async { Err::<(), _>("kaboom") }).await?;
        Ok::<_, crate::error::WorkflowError>(json!(null))
    });

    let workflow_id = store.start_workflow("doomed", json!({})).await.unwrap();
    let pool = WorkerPool::new(test_config(), store.clone(), registry);
    pool.start();

    wait_for_status(&store, workflow_id, WorkflowStatus::Failed, Duration::from_secs(2)).await;

    let workflow = store.get_workflow(workflow_id).await.unwrap();
    assert!(workflow.error.unwrap().contains("kaboom"));
}

#[tokio::test]
async fn sleep_inside_a_step_fails_the_step_and_workflow() {
    let store: Arc<dyn OrchestratorStore> = Arc::new(InMemoryOrchestratorStore::new());
    let mut registry = WorkflowRegistry::new();
    registry.register("bad", |ctx, _input: serde_json::Value| async move {
        ctx.step("bad", || {
            let ctx = ctx.clone();
            async move {
                ctx.sleep(ChronoDuration::milliseconds(1)).await?;
                Ok::<_, crate::error::WorkflowError>(())
            }
        })
        .await?;
        Ok::<_, crate::error::WorkflowError>(json!(null))
    });

    let workflow_id = store.start_workflow("bad", json!({})).await.unwrap();
    let pool = WorkerPool::new(test_config(), store.clone(), registry);
    pool.start();

    wait_for_status(&store, workflow_id, WorkflowStatus::Failed, Duration::from_secs(2)).await;

    let workflow = store.get_workflow(workflow_id).await.unwrap();
    assert!(workflow.error.unwrap().contains("cannot be called inside ctx.step"));

    let steps = store.get_workflow_steps(workflow_id).await.unwrap();
    let bad_step = steps.iter().find(|s| s.name == "bad").unwrap();
    assert_eq!(bad_step.status, flowlock_store::StepStatus::Failed);
}

#[tokio::test]
async fn two_pending_workflows_are_each_claimed_exactly_once() {
    let store: Arc<dyn OrchestratorStore> = Arc::new(InMemoryOrchestratorStore::new());
    let mut registry = WorkflowRegistry::new();
    registry.register("noop", |_ctx, _input: serde_json::Value| async move {
        Ok::<_, crate::error::WorkflowError>(json!("done"))
    });

    let a = store.start_workflow("noop", json!({})).await.unwrap();
    let b = store.start_workflow("noop", json!({})).await.unwrap();

    let pool = WorkerPool::new(test_config().with_max_concurrent_workflows(2), store.clone(), registry);
    pool.start();

    wait_for_status(&store, a, WorkflowStatus::Completed, Duration::from_secs(2)).await;
    wait_for_status(&store, b, WorkflowStatus::Completed, Duration::from_secs(2)).await;
}
