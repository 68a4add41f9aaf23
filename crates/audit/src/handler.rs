use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use warden_events::{DomainEvent, EventBus, EventBusError, EventHandler};

use crate::{AuditRecord, AuditSink, ChangeAction, EntityChanged};

/// Event handler that writes an audit record for every entity change.
pub struct AuditTrailHandler {
    sink: Arc<dyn AuditSink>,
}

impl AuditTrailHandler {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl EventHandler for AuditTrailHandler {
    fn name(&self) -> &str {
        "audit-trail"
    }

    async fn handle(&self, event: &DomainEvent) -> anyhow::Result<()> {
        let change = EntityChanged::try_from(event)?;
        let record = AuditRecord::from_change(change, event);

        debug!(
            event_id = %record.event_id,
            entity = %record.entity,
            entity_id = %record.entity_id,
            "writing audit record"
        );
        self.sink.store(record).await
    }
}

/// Subscribe one audit handler to every entity-changed event type.
///
/// Returns the handler so the caller can unsubscribe it later.
pub fn register_audit_trail(
    bus: &dyn EventBus,
    sink: Arc<dyn AuditSink>,
) -> Result<Arc<dyn EventHandler>, EventBusError> {
    let handler: Arc<dyn EventHandler> = Arc::new(AuditTrailHandler::new(sink));
    for action in ChangeAction::ALL {
        bus.subscribe(action.event_type(), handler.clone())?;
    }
    Ok(handler)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use warden_events::InMemoryEventBus;

    use super::*;
    use crate::InMemoryAuditSink;

    struct BrokenSink;

    #[async_trait]
    impl AuditSink for BrokenSink {
        async fn store(&self, _record: AuditRecord) -> anyhow::Result<()> {
            anyhow::bail!("audit table is read-only")
        }
    }

    #[tokio::test]
    async fn entity_changes_become_audit_records() {
        let bus = InMemoryEventBus::new();
        let sink = Arc::new(InMemoryAuditSink::new());
        register_audit_trail(&bus, sink.clone()).unwrap();

        let event = EntityChanged::new("u-7", ChangeAction::Updated, "customer", "c-42")
            .with_metadata(json!({ "changed": ["email"] }))
            .into_event()
            .unwrap();
        let occurred_at = event.occurred_at();
        let event_id = event.event_id();

        let report = bus.publish(event).await.unwrap();
        assert!(report.is_clean());

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0],
            AuditRecord {
                actor_id: "u-7".into(),
                action: "updated".into(),
                entity: "customer".into(),
                entity_id: "c-42".into(),
                timestamp: occurred_at,
                metadata: json!({ "changed": ["email"] }),
                event_id,
            }
        );
    }

    #[tokio::test]
    async fn one_handler_covers_all_change_types() {
        let bus = InMemoryEventBus::new();
        let sink = Arc::new(InMemoryAuditSink::new());
        let handler = register_audit_trail(&bus, sink.clone()).unwrap();

        for action in ChangeAction::ALL {
            let ev = EntityChanged::new("u", action, "product", "p-1").into_event().unwrap();
            bus.publish(ev).await.unwrap();
        }
        assert_eq!(sink.len(), 3);

        bus.unsubscribe(ChangeAction::Deleted.event_type(), &handler);
        let ev = EntityChanged::new("u", ChangeAction::Deleted, "product", "p-1")
            .into_event()
            .unwrap();
        bus.publish(ev).await.unwrap();
        assert_eq!(sink.len(), 3);
    }

    #[tokio::test]
    async fn sink_failures_are_reported_not_raised() {
        let bus = InMemoryEventBus::new();
        let good = Arc::new(InMemoryAuditSink::new());
        register_audit_trail(&bus, Arc::new(BrokenSink)).unwrap();
        register_audit_trail(&bus, good.clone()).unwrap();

        let ev = EntityChanged::new("u", ChangeAction::Created, "order", "o-1")
            .into_event()
            .unwrap();
        let report = bus.publish(ev).await.unwrap();

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].handler, "audit-trail");
        assert!(report.failures[0].reason.contains("read-only"));
        assert_eq!(good.len(), 1);
    }
}
