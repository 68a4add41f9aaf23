use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use warden_events::DomainEvent;

use crate::EntityChanged;

/// One entry in the audit trail.
///
/// This is the shape handed to an [`AuditSink`](crate::AuditSink); how it is
/// stored is up to the sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub actor_id: String,
    pub action: String,
    pub entity: String,
    pub entity_id: String,
    pub timestamp: DateTime<Utc>,
    pub metadata: serde_json::Value,
    /// Event this record was derived from (for de-duplication downstream).
    pub event_id: Uuid,
}

impl AuditRecord {
    pub fn from_change(change: EntityChanged, event: &DomainEvent) -> Self {
        Self {
            actor_id: change.actor_id,
            action: change.action.as_str().to_string(),
            entity: change.entity,
            entity_id: change.entity_id,
            timestamp: event.occurred_at(),
            metadata: change.metadata,
            event_id: event.event_id(),
        }
    }
}
