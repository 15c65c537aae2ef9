//! Public API: start, signal, and observe workflows.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use flowlock_store::{ListWorkflowsFilter, Workflow, WorkflowStatus};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::TransportError;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/v1/workflows", post(start_workflow).get(list_workflows))
        .route("/v1/workflows/:workflow_id", get(get_workflow))
        .route("/v1/workflows/:workflow_id/steps", get(get_workflow_steps))
        .route("/v1/workflows/:workflow_id/signals/:signal_name", post(signal_workflow))
        .with_state(state)
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StartWorkflowRequest {
    pub name: String,
    #[serde(default)]
    pub input: serde_json::Value,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StartWorkflowResponse {
    pub workflow_id: Uuid,
}

/// POST /v1/workflows
#[utoipa::path(
    post,
    path = "/v1/workflows",
    request_body = StartWorkflowRequest,
    responses((status = 201, description = "Workflow started", body = StartWorkflowResponse)),
    tag = "workflows"
)]
pub async fn start_workflow(
    State(state): State<AppState>,
    Json(req): Json<StartWorkflowRequest>,
) -> Result<(StatusCode, Json<StartWorkflowResponse>), TransportError> {
    let workflow_id = state.store.start_workflow(&req.name, req.input).await?;
    Ok((StatusCode::CREATED, Json(StartWorkflowResponse { workflow_id })))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SignalWorkflowRequest {
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// POST /v1/workflows/:workflow_id/signals/:signal_name
#[utoipa::path(
    post,
    path = "/v1/workflows/{workflow_id}/signals/{signal_name}",
    responses((status = 200, description = "Signal delivered or buffered")),
    tag = "workflows"
)]
pub async fn signal_workflow(
    State(state): State<AppState>,
    Path((workflow_id, signal_name)): Path<(Uuid, String)>,
    Json(req): Json<SignalWorkflowRequest>,
) -> Result<StatusCode, TransportError> {
    let delivered = state.store.signal_workflow(workflow_id, &signal_name, req.payload).await?;
    Ok(if delivered { StatusCode::OK } else { StatusCode::CONFLICT })
}

/// GET /v1/workflows/:workflow_id
#[utoipa::path(
    get,
    path = "/v1/workflows/{workflow_id}",
    responses((status = 200, description = "Workflow", body = Workflow)),
    tag = "workflows"
)]
pub async fn get_workflow(
    State(state): State<AppState>,
    Path(workflow_id): Path<Uuid>,
) -> Result<Json<Workflow>, TransportError> {
    Ok(Json(state.store.get_workflow(workflow_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct ListWorkflowsQuery {
    pub name: Option<String>,
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /v1/workflows
#[utoipa::path(
    get,
    path = "/v1/workflows",
    responses((status = 200, description = "Workflows", body = Vec<Workflow>)),
    tag = "workflows"
)]
pub async fn list_workflows(
    State(state): State<AppState>,
    Query(q): Query<ListWorkflowsQuery>,
) -> Result<Json<Vec<Workflow>>, TransportError> {
    let status = match q.status {
        Some(s) => Some(
            WorkflowStatus::parse(&s)
                .ok_or_else(|| TransportError::BadRequest(format!("unknown status {s:?}")))?,
        ),
        None => None,
    };
    let filter = ListWorkflowsFilter { name: q.name, status, limit: q.limit.unwrap_or(50), offset: q.offset.unwrap_or(0) };
    Ok(Json(state.store.list_workflows(filter).await?))
}

/// GET /v1/workflows/:workflow_id/steps
#[utoipa::path(
    get,
    path = "/v1/workflows/{workflow_id}/steps",
    responses((status = 200, description = "Steps")),
    tag = "workflows"
)]
pub async fn get_workflow_steps(
    State(state): State<AppState>,
    Path(workflow_id): Path<Uuid>,
) -> Result<Json<Vec<flowlock_store::Step>>, TransportError> {
    Ok(Json(state.store.get_workflow_steps(workflow_id).await?))
}
