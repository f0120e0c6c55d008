use crate::error::Result;
use crate::ipc::IpcConnector;
use crate::services::FadeScheduler;
use std::sync::Arc;

/// Trait for event listeners that can run in different modes
#[async_trait::async_trait]
pub trait EventListenerTrait {
    /// Run the event listener
    async fn run(self: Box<Self>) -> Result<()>;
}

/// Factory function: without a connector the dry-run listener is used
pub fn create_event_listener(
    scheduler: Arc<FadeScheduler>,
    connector: Option<Arc<dyn IpcConnector>>,
) -> Box<dyn EventListenerTrait + Send> {
    match connector {
        Some(connector) => Box::new(super::ipc_listener::IpcEventListener::new(scheduler, connector)),
        None => Box::new(super::dry_run_listener::DryRunListener::new(scheduler)),
    }
}
