use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A typed domain event.
///
/// Implement this on payload structs so they can be recorded as a
/// [`DomainEvent`] without repeating the type tag at every call site.
pub trait Event: Serialize {
    /// Stable event name (e.g. "entity.updated").
    fn event_type(&self) -> &'static str;
}

/// Immutable record of something that happened in the domain.
///
/// - **immutable**: no setters; subscribers only ever see `&DomainEvent`
/// - `payload` is free-form JSON so the bus stays domain-agnostic
/// - `occurred_at` is business time, stamped at creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEvent {
    event_id: Uuid,
    event_type: String,
    payload: serde_json::Value,
    occurred_at: DateTime<Utc>,
}

impl DomainEvent {
    pub fn new(event_type: impl Into<String>, payload: serde_json::Value) -> Self {
        Self::at(event_type, payload, Utc::now())
    }

    pub fn at(
        event_type: impl Into<String>,
        payload: serde_json::Value,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            event_type: event_type.into(),
            payload,
            occurred_at,
        }
    }

    /// Record a typed event, stamping it now.
    pub fn record<E: Event>(event: &E) -> Result<Self, serde_json::Error> {
        Ok(Self::new(event.event_type(), serde_json::to_value(event)?))
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    /// Decode the payload into a typed struct.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Renamed {
        from: String,
        to: String,
    }

    impl Event for Renamed {
        fn event_type(&self) -> &'static str {
            "thing.renamed"
        }
    }

    #[test]
    fn record_uses_the_type_tag_and_payload() {
        let ev = DomainEvent::record(&Renamed {
            from: "a".into(),
            to: "b".into(),
        })
        .unwrap();

        assert_eq!(ev.event_type(), "thing.renamed");
        assert_eq!(ev.payload(), &json!({ "from": "a", "to": "b" }));
        assert_eq!(
            ev.payload_as::<Renamed>().unwrap(),
            Renamed { from: "a".into(), to: "b".into() }
        );
    }

    #[test]
    fn each_event_gets_its_own_id() {
        let a = DomainEvent::new("x", json!(null));
        let b = DomainEvent::new("x", json!(null));
        assert_ne!(a.event_id(), b.event_id());
    }
}
