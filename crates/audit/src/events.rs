use serde::{Deserialize, Serialize};
use thiserror::Error;

use warden_events::{DomainEvent, Event};

/// What happened to an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    Created,
    Updated,
    Deleted,
}

impl ChangeAction {
    pub const ALL: [ChangeAction; 3] = [Self::Created, Self::Updated, Self::Deleted];

    pub fn event_type(self) -> &'static str {
        match self {
            Self::Created => "entity.created",
            Self::Updated => "entity.updated",
            Self::Deleted => "entity.deleted",
        }
    }

    pub fn from_event_type(event_type: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.event_type() == event_type)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
        }
    }
}

impl core::fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An entity was created, updated or deleted by an actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityChanged {
    pub actor_id: String,
    pub action: ChangeAction,
    pub entity: String,
    pub entity_id: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

#[derive(Debug, Error)]
pub enum EntityChangedError {
    #[error("'{0}' is not an entity-changed event type")]
    UnknownEventType(String),

    #[error("event type says {expected} but payload says {found}")]
    ActionMismatch {
        expected: ChangeAction,
        found: ChangeAction,
    },

    #[error("malformed entity-changed payload: {0}")]
    Payload(#[from] serde_json::Error),
}

impl EntityChanged {
    pub fn new(
        actor_id: impl Into<String>,
        action: ChangeAction,
        entity: impl Into<String>,
        entity_id: impl Into<String>,
    ) -> Self {
        Self {
            actor_id: actor_id.into(),
            action,
            entity: entity.into(),
            entity_id: entity_id.into(),
            metadata: serde_json::Value::Null,
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn into_event(self) -> Result<DomainEvent, serde_json::Error> {
        DomainEvent::record(&self)
    }
}

impl Event for EntityChanged {
    fn event_type(&self) -> &'static str {
        self.action.event_type()
    }
}

impl TryFrom<&DomainEvent> for EntityChanged {
    type Error = EntityChangedError;

    fn try_from(event: &DomainEvent) -> Result<Self, Self::Error> {
        let expected = ChangeAction::from_event_type(event.event_type())
            .ok_or_else(|| EntityChangedError::UnknownEventType(event.event_type().to_string()))?;

        let changed: EntityChanged = event.payload_as()?;
        if changed.action != expected {
            return Err(EntityChangedError::ActionMismatch {
                expected,
                found: changed.action,
            });
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn action_picks_the_event_type() {
        let ev = EntityChanged::new("u1", ChangeAction::Deleted, "invoice", "inv-9")
            .into_event()
            .unwrap();
        assert_eq!(ev.event_type(), "entity.deleted");
        assert_eq!(ev.payload()["entityId"], "inv-9");
        assert_eq!(ev.payload()["action"], "deleted");
    }

    #[test]
    fn decodes_back_from_the_bus_event() {
        let original = EntityChanged::new("u1", ChangeAction::Updated, "customer", "c-1")
            .with_metadata(json!({ "field": "rfc" }));
        let ev = original.clone().into_event().unwrap();
        assert_eq!(EntityChanged::try_from(&ev).unwrap(), original);
    }

    #[test]
    fn foreign_event_types_are_refused() {
        let ev = DomainEvent::new("user.logged_in", json!({}));
        assert!(matches!(
            EntityChanged::try_from(&ev),
            Err(EntityChangedError::UnknownEventType(t)) if t == "user.logged_in"
        ));
    }

    #[test]
    fn type_and_payload_must_agree() {
        let payload = serde_json::to_value(EntityChanged::new(
            "u1",
            ChangeAction::Created,
            "customer",
            "c-1",
        ))
        .unwrap();
        let ev = DomainEvent::new("entity.deleted", payload);

        assert!(matches!(
            EntityChanged::try_from(&ev),
            Err(EntityChangedError::ActionMismatch {
                expected: ChangeAction::Deleted,
                found: ChangeAction::Created,
            })
        ));
    }
}
