//! Audit record persistence contract and two simple sinks.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tracing::info;

use crate::AuditRecord;

/// Stores audit records.
///
/// Implementations own the storage schema; an `Err` is reported by the event
/// bus as a handler failure and never reaches the business operation.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn store(&self, record: AuditRecord) -> anyhow::Result<()>;
}

/// Keeps records in memory (dev server and tests).
#[derive(Debug, Default)]
pub struct InMemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything stored so far, oldest first.
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditSink {
    async fn store(&self, record: AuditRecord) -> anyhow::Result<()> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
        Ok(())
    }
}

/// Writes each record as a structured log line on the `audit` target.
///
/// Useful when a log pipeline is the system of record.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn store(&self, record: AuditRecord) -> anyhow::Result<()> {
        info!(
            target: "audit",
            actor_id = %record.actor_id,
            action = %record.action,
            entity = %record.entity,
            entity_id = %record.entity_id,
            timestamp = %record.timestamp,
            event_id = %record.event_id,
            metadata = %record.metadata,
            "audit record"
        );
        Ok(())
    }
}
