//! Audit log domain model.
//!
//! Every state-changing authorization decision is appended here as a
//! first-class side effect of the operation, not best-effort logging.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AuditOutcome {
    Success,
    Denied,
    /// Adversarial input that was blocked (forged signature,
    /// open-redirect attempt).
    Incident,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: Uuid,
    /// Acting principal; absent for unauthenticated surfaces.
    pub actor_id: Option<Uuid>,
    /// Dotted action name, e.g. `user.list`, `webhook.reject`.
    pub action: String,
    /// The resource the action touched, e.g. `user:<id>`.
    pub resource: Option<String>,
    /// The tenant the decision resolved to, when one was resolved.
    pub tenant_id: Option<Uuid>,
    pub outcome: AuditOutcome,
    pub metadata: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAuditEntry {
    pub actor_id: Option<Uuid>,
    pub action: String,
    pub resource: Option<String>,
    pub tenant_id: Option<Uuid>,
    pub outcome: AuditOutcome,
    pub metadata: serde_json::Value,
}
