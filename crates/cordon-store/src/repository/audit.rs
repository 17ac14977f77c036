//! In-memory implementation of [`AuditLogRepository`].
//!
//! Append-only; there is no update or delete surface.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use uuid::Uuid;

use cordon_core::error::CordonResult;
use cordon_core::models::audit::{AuditLogEntry, CreateAuditEntry};
use cordon_core::repository::{AuditLogFilter, AuditLogRepository, Pagination};

#[derive(Clone, Default)]
pub struct MemoryAuditLogRepository {
    entries: Arc<Mutex<Vec<AuditLogEntry>>>,
}

impl MemoryAuditLogRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuditLogRepository for MemoryAuditLogRepository {
    async fn append(&self, input: CreateAuditEntry) -> CordonResult<AuditLogEntry> {
        let entry = AuditLogEntry {
            id: Uuid::new_v4(),
            actor_id: input.actor_id,
            action: input.action,
            resource: input.resource,
            tenant_id: input.tenant_id,
            outcome: input.outcome,
            metadata: input.metadata,
            timestamp: Utc::now(),
        };
        self.entries.lock().push(entry.clone());
        Ok(entry)
    }

    async fn list(
        &self,
        filter: AuditLogFilter,
        pagination: Pagination,
    ) -> CordonResult<Vec<AuditLogEntry>> {
        let entries = self.entries.lock();
        Ok(entries
            .iter()
            .filter(|e| filter.actor_id.is_none_or(|id| e.actor_id == Some(id)))
            .filter(|e| filter.action.as_deref().is_none_or(|a| e.action == a))
            .filter(|e| filter.tenant_id.is_none_or(|t| e.tenant_id == Some(t)))
            .filter(|e| filter.from.is_none_or(|from| e.timestamp >= from))
            .filter(|e| filter.to.is_none_or(|to| e.timestamp <= to))
            .skip(pagination.offset as usize)
            .take(pagination.limit as usize)
            .cloned()
            .collect())
    }
}
