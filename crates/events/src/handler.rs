use async_trait::async_trait;

use crate::DomainEvent;

/// Reacts to published domain events.
///
/// Handlers may do IO. Returning `Err` (or panicking) is contained by the bus:
/// it is logged and reported, and sibling handlers still run.
///
/// The same handler instance may be subscribed to several event types.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Name used in logs and failure reports.
    fn name(&self) -> &str {
        core::any::type_name::<Self>()
    }

    async fn handle(&self, event: &DomainEvent) -> anyhow::Result<()>;
}
