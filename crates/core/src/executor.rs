use crate::types::ActionDescriptor;
use async_trait::async_trait;

/// Performs a resolved action on the device. The engine only produces
/// descriptors; whatever drives the touch layer lives behind this trait.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    async fn execute(&self, action: &ActionDescriptor) -> bool;
}

/// Logs the action instead of performing it.
#[derive(Debug, Default)]
pub struct SimulatedExecutor;

#[async_trait]
impl ActionExecutor for SimulatedExecutor {
    async fn execute(&self, action: &ActionDescriptor) -> bool {
        match action {
            ActionDescriptor::Tap { x, y } => {
                tracing::info!("[SIM] tap at ({}, {})", x, y);
                true
            }
            ActionDescriptor::LaunchApp { name } => {
                tracing::info!("[SIM] launch app: {}", name);
                true
            }
            ActionDescriptor::RunTask { name } => {
                tracing::info!("[SIM] run task: {}", name);
                true
            }
            ActionDescriptor::None => false,
        }
    }
}
