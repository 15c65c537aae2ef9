use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use flowlock_store::InMemoryOrchestratorStore;
use serde_json::json;
use tower::ServiceExt;

use crate::server::build_router;
use crate::state::AppState;

fn request(method: &str, uri: &str, auth: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri).header("content-type", "application/json");
    if let Some(token) = auth {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn denying_state(store: Arc<InMemoryOrchestratorStore>) -> AppState {
    AppState::new(
        store,
        Arc::new(|headers| {
            let ok = headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v == "Bearer secret");
            if ok {
                Ok(())
            } else {
                Err("missing or invalid worker credentials".to_string())
            }
        }),
    )
}

#[tokio::test]
async fn public_start_workflow_needs_no_auth() {
    let store = Arc::new(InMemoryOrchestratorStore::new());
    let app = build_router(denying_state(store));

    let req = request("POST", "/v1/workflows", None, json!({"name": "greet", "input": {}}));
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn worker_claim_without_credentials_is_rejected_with_unauthorized_message() {
    let store = Arc::new(InMemoryOrchestratorStore::new());
    let app = build_router(denying_state(store));

    let req = request("POST", "/v1/worker/claim", None, json!({"workflow_names": ["*"], "worker_id": "w1"}));
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["error"].as_str().unwrap().contains("unauthorized"));
}

#[tokio::test]
async fn worker_claim_with_credentials_succeeds() {
    let store = Arc::new(InMemoryOrchestratorStore::new());
    store.start_workflow("greet", json!({})).await.unwrap();
    let app = build_router(denying_state(store));

    let req = request("POST", "/v1/worker/claim", Some("secret"), json!({"workflow_names": ["*"], "worker_id": "w1"}));
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["claimed"]["workflow_id"].is_string());
}
