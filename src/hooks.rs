//! Named lifecycle events and the handlers bound to them.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use tracing::debug;

use crate::exporter::{self, ExportReport, ResourceExporter};
use crate::resources::DescribeStackResources;

pub const BEFORE_FUNCTION_DEPLOY: &str = "before:deploy:function:deploy";
pub const BEFORE_CREATE_DEPLOYMENT_ARTIFACTS: &str = "before:deploy:createDeploymentArtifacts";

/// Events the exporter runs on.
pub const DEPLOY_EVENTS: [&str; 2] = [BEFORE_FUNCTION_DEPLOY, BEFORE_CREATE_DEPLOYMENT_ARTIFACTS];

pub type HookResult = Result<ExportReport, exporter::Error>;

type Handler = Box<dyn Fn() -> BoxFuture<'static, HookResult> + Send + Sync>;

#[derive(Default)]
pub struct HookRegistry {
    handlers: HashMap<String, Handler>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `handler` to `event`, replacing any previous binding.
    pub fn register<F>(&mut self, event: impl Into<String>, handler: F)
    where
        F: Fn() -> BoxFuture<'static, HookResult> + Send + Sync + 'static,
    {
        self.handlers.insert(event.into(), Box::new(handler));
    }

    pub fn events(&self) -> Vec<&str> {
        let mut events: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        events.sort_unstable();
        return events;
    }

    /// Runs the handler bound to `event` to completion. `None` when nothing
    /// listens on the event.
    pub async fn invoke(&self, event: &str) -> Option<HookResult> {
        let handler = match self.handlers.get(event) {
            Some(handler) => handler,
            None => {
                debug!(event, "No handler registered");
                return None;
            }
        };

        debug!(event, "Running hook");
        return Some(handler().await);
    }
}

/// Binds the exporter to the deploy events it runs on.
pub fn register_exporter<S>(exporter: Arc<ResourceExporter<S>>) -> HookRegistry
where
    S: DescribeStackResources + Send + Sync + 'static,
{
    let mut registry = HookRegistry::new();

    for event in DEPLOY_EVENTS {
        let exporter = Arc::clone(&exporter);
        registry.register(event, move || {
            let exporter = Arc::clone(&exporter);
            async move { exporter.export_resources().await }.boxed()
        });
    }

    return registry;
}
