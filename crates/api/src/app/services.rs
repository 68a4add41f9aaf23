//! Event bus and audit wiring owned by the application.

use std::sync::Arc;

use tracing::info;

use warden_audit::{AuditRecord, InMemoryAuditSink, TracingAuditSink, register_audit_trail};
use warden_events::{DomainEvent, EventBus, EventBusError, InMemoryEventBus, publish_detached};

use crate::config::{ApiConfig, DeliveryMode};

/// Process-wide services, created once at startup and shared by routes.
///
/// The bus is owned here and nowhere else; routes reach it through this
/// struct, never through a global.
pub struct AppServices {
    bus: Arc<InMemoryEventBus>,
    audit: Arc<InMemoryAuditSink>,
    delivery: DeliveryMode,
}

impl AppServices {
    /// Build the bus and subscribe the audit trail handlers.
    pub fn build(config: &ApiConfig) -> Result<Self, EventBusError> {
        let bus = Arc::new(InMemoryEventBus::with_policy(config.failure_policy));
        let audit = Arc::new(InMemoryAuditSink::new());

        register_audit_trail(bus.as_ref(), audit.clone())?;
        register_audit_trail(bus.as_ref(), Arc::new(TracingAuditSink))?;

        info!(
            delivery = ?config.delivery,
            failure_policy = ?config.failure_policy,
            "event bus ready"
        );

        Ok(Self {
            bus,
            audit,
            delivery: config.delivery,
        })
    }

    pub fn bus(&self) -> Arc<dyn EventBus> {
        self.bus.clone()
    }

    /// Hand an event to the bus according to the configured delivery mode.
    ///
    /// Under `Awaited` this returns once every subscriber has run; individual
    /// handler failures are logged by the bus and only surface here in
    /// fail-fast mode.
    pub async fn publish(&self, event: DomainEvent) -> Result<(), EventBusError> {
        match self.delivery {
            DeliveryMode::Awaited => {
                self.bus.publish(event).await?;
            }
            DeliveryMode::Detached => {
                publish_detached(self.bus(), event);
            }
        }
        Ok(())
    }

    pub fn audit_records(&self) -> Vec<AuditRecord> {
        self.audit.records()
    }

    pub fn shutdown(&self) {
        self.bus.shutdown();
    }
}
