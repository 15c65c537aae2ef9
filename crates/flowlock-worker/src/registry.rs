//! Maps workflow type names to handlers.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::context::WorkflowContext;
use crate::error::WorkflowResult;

pub type WorkflowHandler =
    Arc<dyn Fn(WorkflowContext, serde_json::Value) -> BoxFuture<'static, WorkflowResult<serde_json::Value>> + Send + Sync>;

/// Registered workflow bodies, keyed by workflow type name.
#[derive(Clone, Default)]
pub struct WorkflowRegistry {
    handlers: HashMap<String, WorkflowHandler>,
}

impl WorkflowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a typed workflow body. `f` receives the context and the
    /// deserialized input, and is driven to completion (or suspension)
    /// once per claim.
    pub fn register<In, Out, F, Fut>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        In: DeserializeOwned + Send + 'static,
        Out: Serialize + Send + 'static,
        F: Fn(WorkflowContext, In) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = WorkflowResult<Out>> + Send + 'static,
    {
        let f = Arc::new(f);
        let handler: WorkflowHandler = Arc::new(move |ctx, input| {
            let f = f.clone();
            Box::pin(async move {
                let typed_input: In = serde_json::from_value(input)?;
                let output = f(ctx, typed_input).await?;
                Ok(serde_json::to_value(output)?)
            })
        });
        self.handlers.insert(name.into(), handler);
        self
    }

    pub fn get(&self, name: &str) -> Option<&WorkflowHandler> {
        self.handlers.get(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.handlers.keys().cloned().collect()
    }
}
