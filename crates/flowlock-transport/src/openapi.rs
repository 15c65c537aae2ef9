//! OpenAPI document for the Public API. The Worker API is deliberately
//! left out — it's an internal surface behind [`crate::auth::require_worker_auth`],
//! not something a dashboard or third-party client should discover.

use flowlock_store::{Step, StepStatus, Workflow, WorkflowStatus};
use utoipa::OpenApi;

use crate::public;

#[derive(OpenApi)]
#[openapi(
    paths(
        public::start_workflow,
        public::signal_workflow,
        public::get_workflow,
        public::list_workflows,
        public::get_workflow_steps,
    ),
    components(schemas(
        Workflow,
        Step,
        WorkflowStatus,
        StepStatus,
        public::StartWorkflowRequest,
        public::StartWorkflowResponse,
        public::SignalWorkflowRequest,
    )),
    tags((name = "workflows", description = "Start, signal, and observe durable workflows")),
    info(
        title = "Flowlock Orchestrator API",
        description = "Public surface of a durable workflow orchestrator with a pull-based worker model.",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    )
)]
pub struct ApiDoc;
