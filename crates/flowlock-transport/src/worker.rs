//! Worker API: claim, heartbeat, step, sleep, signal-wait, and finish a
//! workflow. Every route here is wrapped with [`crate::auth::require_worker_auth`].

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::middleware;
use axum::routing::{get, post};
use axum::{Json, Router};
use flowlock_store::{ClaimedWorkflow, SignalWaitOutcome, StepInfo};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::require_worker_auth;
use crate::error::TransportError;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/v1/worker/claim", post(claim))
        .route("/v1/worker/pending", get(has_pending_work))
        .route("/v1/worker/workflows/:workflow_id/heartbeat", post(heartbeat))
        .route("/v1/worker/workflows/:workflow_id/complete", post(complete_workflow))
        .route("/v1/worker/workflows/:workflow_id/fail", post(fail_workflow))
        .route("/v1/worker/workflows/:workflow_id/sleep", post(sleep_workflow))
        .route("/v1/worker/workflows/:workflow_id/steps", post(get_or_create_step))
        .route("/v1/worker/workflows/:workflow_id/steps/:step_id/complete", post(complete_step))
        .route("/v1/worker/workflows/:workflow_id/steps/:step_id/fail", post(fail_step))
        .route("/v1/worker/workflows/:workflow_id/steps/:step_id/sleep", post(schedule_sleep))
        .route("/v1/worker/workflows/:workflow_id/steps/:step_id/wait-signal", post(wait_for_signal))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_worker_auth))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct ClaimRequest {
    pub workflow_names: Vec<String>,
    pub worker_id: String,
}

#[derive(Debug, Serialize)]
pub struct ClaimResponse {
    pub claimed: Option<ClaimedWorkflow>,
}

async fn claim(State(state): State<AppState>, Json(req): Json<ClaimRequest>) -> Result<Json<ClaimResponse>, TransportError> {
    let claimed = state.store.claim(&req.workflow_names, &req.worker_id).await?;
    Ok(Json(ClaimResponse { claimed }))
}

#[derive(Debug, Deserialize)]
pub struct PendingQuery {
    pub workflow_names: String,
}

#[derive(Debug, Serialize)]
pub struct PendingResponse {
    pub pending: bool,
}

async fn has_pending_work(
    State(state): State<AppState>,
    Query(q): Query<PendingQuery>,
) -> Result<Json<PendingResponse>, TransportError> {
    let names: Vec<String> = q.workflow_names.split(',').map(str::to_string).collect();
    let pending = state.store.has_pending_work(&names).await?;
    Ok(Json(PendingResponse { pending }))
}

#[derive(Debug, Deserialize)]
pub struct WorkerIdQuery {
    pub worker_id: String,
}

async fn heartbeat(
    State(state): State<AppState>,
    Path(workflow_id): Path<Uuid>,
    Query(q): Query<WorkerIdQuery>,
) -> Result<StatusCode, TransportError> {
    ok_or_conflict(state.store.heartbeat(workflow_id, &q.worker_id).await?)
}

#[derive(Debug, Deserialize)]
pub struct CompleteWorkflowRequest {
    pub worker_id: String,
    #[serde(default)]
    pub output: serde_json::Value,
}

async fn complete_workflow(
    State(state): State<AppState>,
    Path(workflow_id): Path<Uuid>,
    Json(req): Json<CompleteWorkflowRequest>,
) -> Result<StatusCode, TransportError> {
    ok_or_conflict(state.store.complete_workflow(workflow_id, &req.worker_id, req.output).await?)
}

#[derive(Debug, Deserialize)]
pub struct FailWorkflowRequest {
    pub worker_id: String,
    pub error: String,
}

async fn fail_workflow(
    State(state): State<AppState>,
    Path(workflow_id): Path<Uuid>,
    Json(req): Json<FailWorkflowRequest>,
) -> Result<StatusCode, TransportError> {
    ok_or_conflict(state.store.fail_workflow(workflow_id, &req.worker_id, &req.error).await?)
}

#[derive(Debug, Deserialize)]
pub struct SleepWorkflowRequest {
    pub worker_id: String,
    pub sleep_until: chrono::DateTime<chrono::Utc>,
}

async fn sleep_workflow(
    State(state): State<AppState>,
    Path(workflow_id): Path<Uuid>,
    Json(req): Json<SleepWorkflowRequest>,
) -> Result<StatusCode, TransportError> {
    ok_or_conflict(state.store.sleep_workflow(workflow_id, &req.worker_id, req.sleep_until).await?)
}

#[derive(Debug, Deserialize)]
pub struct GetOrCreateStepRequest {
    pub step_name: String,
    pub worker_id: String,
}

#[derive(Debug, Serialize)]
pub struct StepInfoResponse {
    pub step_id: Uuid,
    pub status: flowlock_store::StepStatus,
    pub output: Option<serde_json::Value>,
    pub error: Option<String>,
    pub sleep_until: Option<chrono::DateTime<chrono::Utc>>,
    pub is_new: bool,
}

impl From<StepInfo> for StepInfoResponse {
    fn from(s: StepInfo) -> Self {
        Self { step_id: s.step_id, status: s.status, output: s.output, error: s.error, sleep_until: s.sleep_until, is_new: s.is_new }
    }
}

async fn get_or_create_step(
    State(state): State<AppState>,
    Path(workflow_id): Path<Uuid>,
    Json(req): Json<GetOrCreateStepRequest>,
) -> Result<Json<StepInfoResponse>, TransportError> {
    let info = state.store.get_or_create_step(workflow_id, &req.step_name, &req.worker_id).await?;
    Ok(Json(info.into()))
}

#[derive(Debug, Deserialize)]
pub struct CompleteStepRequest {
    pub worker_id: String,
    #[serde(default)]
    pub output: serde_json::Value,
}

async fn complete_step(
    State(state): State<AppState>,
    Path((workflow_id, step_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<CompleteStepRequest>,
) -> Result<StatusCode, TransportError> {
    ok_or_conflict(state.store.complete_step(workflow_id, step_id, &req.worker_id, req.output).await?)
}

#[derive(Debug, Deserialize)]
pub struct FailStepRequest {
    pub worker_id: String,
    pub error: String,
}

async fn fail_step(
    State(state): State<AppState>,
    Path((workflow_id, step_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<FailStepRequest>,
) -> Result<StatusCode, TransportError> {
    ok_or_conflict(state.store.fail_step(workflow_id, step_id, &req.worker_id, &req.error).await?)
}

#[derive(Debug, Deserialize)]
pub struct ScheduleSleepRequest {
    pub worker_id: String,
    pub sleep_until: chrono::DateTime<chrono::Utc>,
}

async fn schedule_sleep(
    State(state): State<AppState>,
    Path((workflow_id, step_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<ScheduleSleepRequest>,
) -> Result<StatusCode, TransportError> {
    ok_or_conflict(state.store.schedule_sleep(workflow_id, step_id, &req.worker_id, req.sleep_until).await?)
}

#[derive(Debug, Deserialize)]
pub struct WaitForSignalRequest {
    pub worker_id: String,
    pub signal_name: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WaitForSignalResponse {
    Waiting,
    Signaled { payload: serde_json::Value },
}

async fn wait_for_signal(
    State(state): State<AppState>,
    Path((workflow_id, step_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<WaitForSignalRequest>,
) -> Result<Json<WaitForSignalResponse>, TransportError> {
    let outcome = state.store.wait_for_signal(workflow_id, step_id, &req.worker_id, &req.signal_name).await?;
    Ok(Json(match outcome {
        SignalWaitOutcome::Waiting => WaitForSignalResponse::Waiting,
        SignalWaitOutcome::Signaled { payload } => WaitForSignalResponse::Signaled { payload },
    }))
}

fn ok_or_conflict(committed: bool) -> Result<StatusCode, TransportError> {
    Ok(if committed { StatusCode::OK } else { StatusCode::CONFLICT })
}
