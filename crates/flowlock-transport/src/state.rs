//! Shared router state.

use std::sync::Arc;

use axum::http::HeaderMap;
use flowlock_store::OrchestratorStore;

/// Called on every Worker-API request. Returning `Err` rejects the
/// request with a 401 whose body contains the word "unauthorized";
/// what counts as authorized (a shared secret, mTLS already terminated
/// upstream, ...) is entirely up to the caller.
pub type AuthorizeWorker = Arc<dyn Fn(&HeaderMap) -> Result<(), String> + Send + Sync>;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn OrchestratorStore>,
    pub authorize_worker: AuthorizeWorker,
}

impl AppState {
    pub fn new(store: Arc<dyn OrchestratorStore>, authorize_worker: AuthorizeWorker) -> Self {
        Self { store, authorize_worker }
    }

    /// Accepts every request. Fine for local development; a production
    /// deployment should supply a real predicate.
    pub fn open(store: Arc<dyn OrchestratorStore>) -> Self {
        Self::new(store, Arc::new(|_headers| Ok(())))
    }
}
