//! Domain events and in-process delivery to subscribed handlers.

pub mod bus;
pub mod event;
pub mod handler;
pub mod in_memory_bus;

pub use bus::{
    EventBus, EventBusError, FailurePolicy, HandlerExecutionError, PublishReport, publish_detached,
};
pub use event::{DomainEvent, Event};
pub use handler::EventHandler;
pub use in_memory_bus::InMemoryEventBus;
