//! Event publishing/subscription contract.
//!
//! The bus maps an event type name to an ordered list of handlers and
//! delivers each published event to the handlers registered for its type.
//!
//! ## Delivery contract
//!
//! - `publish` resolves only after every handler subscribed to the event's
//!   type (at the moment of publishing) has been invoked and has finished
//! - handlers run **sequentially in subscription order**: the first handler
//!   completes before the second starts
//! - no ordering across event types, or across concurrent publishes
//! - the handler list is snapshotted when `publish` starts; subscribe and
//!   unsubscribe during a publish only affect later publishes
//!
//! Callers that must not wait on slow subscribers use [`publish_detached`].
//!
//! ## Failures
//!
//! A failing handler never stops its siblings under [`FailurePolicy::Isolate`].
//! [`FailurePolicy::FailFast`] stops at the first failure and returns it.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::{DomainEvent, EventHandler};

/// What to do when a handler fails during a publish.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log and record the failure, keep delivering.
    #[default]
    Isolate,
    /// Stop delivering and return the failure to the publisher.
    FailFast,
}

/// One handler failed while handling one event.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("handler '{handler}' failed on {event_type} ({event_id}): {reason}")]
pub struct HandlerExecutionError {
    pub handler: String,
    pub event_type: String,
    pub event_id: Uuid,
    pub reason: String,
    pub panicked: bool,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EventBusError {
    #[error("event bus is shut down")]
    Closed,

    #[error(transparent)]
    HandlerFailed(HandlerExecutionError),
}

/// Result of delivering one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub event_id: Uuid,
    pub event_type: String,
    /// Handlers invoked, including the ones that failed.
    pub invoked: usize,
    pub failures: Vec<HandlerExecutionError>,
}

impl PublishReport {
    pub fn new(event: &DomainEvent) -> Self {
        Self {
            event_id: event.event_id(),
            event_type: event.event_type().to_string(),
            invoked: 0,
            failures: Vec::new(),
        }
    }

    pub fn succeeded(&self) -> usize {
        self.invoked - self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// In-process publish/subscribe registry.
///
/// The bus is constructed once by the application's composition root and
/// passed to whoever publishes or subscribes; there is no global instance.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Append `handler` to the list for `event_type`.
    ///
    /// Subscribing the same handler twice makes it run twice per event.
    fn subscribe(
        &self,
        event_type: &str,
        handler: Arc<dyn EventHandler>,
    ) -> Result<(), EventBusError>;

    /// Remove every subscription of `handler` (by identity) to `event_type`.
    ///
    /// Other event types are untouched. Unknown handlers are a no-op.
    fn unsubscribe(&self, event_type: &str, handler: &Arc<dyn EventHandler>);

    async fn publish(&self, event: DomainEvent) -> Result<PublishReport, EventBusError>;
}

#[async_trait]
impl<B> EventBus for Arc<B>
where
    B: EventBus + ?Sized,
{
    fn subscribe(
        &self,
        event_type: &str,
        handler: Arc<dyn EventHandler>,
    ) -> Result<(), EventBusError> {
        (**self).subscribe(event_type, handler)
    }

    fn unsubscribe(&self, event_type: &str, handler: &Arc<dyn EventHandler>) {
        (**self).unsubscribe(event_type, handler)
    }

    async fn publish(&self, event: DomainEvent) -> Result<PublishReport, EventBusError> {
        (**self).publish(event).await
    }
}

/// Publish without making the caller wait for handlers.
///
/// Delivery still follows the bus's contract; it just happens on a spawned
/// task. Failures are logged here since nobody may await the handle.
pub fn publish_detached(
    bus: Arc<dyn EventBus>,
    event: DomainEvent,
) -> JoinHandle<Result<PublishReport, EventBusError>> {
    tokio::spawn(async move {
        let event_id = event.event_id();
        let outcome = bus.publish(event).await;
        if let Err(e) = &outcome {
            tracing::warn!(%event_id, error = %e, "detached publish failed");
        }
        outcome
    })
}
