//! Audit trail: turns entity-changed events into audit records.
//!
//! Business code publishes [`EntityChanged`] events; the
//! [`AuditTrailHandler`] subscribed on the bus converts them into
//! [`AuditRecord`]s and hands them to an [`AuditSink`]. Storage is the sink's
//! concern.

pub mod events;
pub mod handler;
pub mod record;
pub mod sink;

pub use events::{ChangeAction, EntityChanged, EntityChangedError};
pub use handler::{AuditTrailHandler, register_audit_trail};
pub use record::AuditRecord;
pub use sink::{AuditSink, InMemoryAuditSink, TracingAuditSink};
