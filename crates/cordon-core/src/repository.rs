//! Repository trait definitions for the Credential Store.
//!
//! All operations are async. None of these traits filter by tenant on
//! their own — `list_by_tenant` is a plain indexed lookup, not an
//! authorization decision. Tenant correctness is enforced entirely by
//! the query guard layer in `cordon-auth`.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::CordonResult;
use crate::models::{
    audit::{AuditLogEntry, CreateAuditEntry},
    session::{CreateSession, Session},
    tenant::{CreateTenant, Tenant},
    user::{CreateUser, UpdateUser, User},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

impl<T> PaginatedResult<T> {
    /// The zero-row page callers must produce when no tenant has been
    /// selected under wildcard access.
    pub fn empty(pagination: &Pagination) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            offset: pagination.offset,
            limit: pagination.limit,
        }
    }
}

pub trait UserRepository: Send + Sync {
    fn create(&self, input: CreateUser) -> impl Future<Output = CordonResult<User>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = CordonResult<User>> + Send;
    fn get_by_email(&self, email: &str) -> impl Future<Output = CordonResult<User>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateUser,
    ) -> impl Future<Output = CordonResult<User>> + Send;
    /// Soft-delete: sets status to Inactive.
    fn delete(&self, id: Uuid) -> impl Future<Output = CordonResult<()>> + Send;
    fn list_by_tenant(
        &self,
        tenant_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = CordonResult<PaginatedResult<User>>> + Send;
}

pub trait SessionRepository: Send + Sync {
    fn create(&self, input: CreateSession) -> impl Future<Output = CordonResult<Session>> + Send;
    fn get_by_token_hash(
        &self,
        token_hash: &str,
    ) -> impl Future<Output = CordonResult<Session>> + Send;
    fn delete_by_token_hash(
        &self,
        token_hash: &str,
    ) -> impl Future<Output = CordonResult<()>> + Send;
    /// Delete all sessions for a user (e.g., on role or tenant change).
    fn delete_for_user(&self, user_id: Uuid) -> impl Future<Output = CordonResult<u64>> + Send;
    /// Remove all sessions past their expiry; returns the count swept.
    fn delete_expired(
        &self,
        now: DateTime<Utc>,
    ) -> impl Future<Output = CordonResult<u64>> + Send;
}

pub trait TenantRepository: Send + Sync {
    fn create(&self, input: CreateTenant) -> impl Future<Output = CordonResult<Tenant>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = CordonResult<Tenant>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = CordonResult<PaginatedResult<Tenant>>> + Send;
}

/// Query filters for audit log entries.
#[derive(Debug, Clone, Default)]
pub struct AuditLogFilter {
    pub actor_id: Option<Uuid>,
    pub action: Option<String>,
    pub tenant_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

pub trait AuditLogRepository: Send + Sync {
    /// Append a new entry. No update or delete operations exist.
    fn append(
        &self,
        input: CreateAuditEntry,
    ) -> impl Future<Output = CordonResult<AuditLogEntry>> + Send;
    fn list(
        &self,
        filter: AuditLogFilter,
        pagination: Pagination,
    ) -> impl Future<Output = CordonResult<Vec<AuditLogEntry>>> + Send;
}
