//! Tenant query guard — the only data-access surface exposed to
//! request handlers.
//!
//! A guard is built from a resolved context plus a validated
//! [`TenantSelection`]; the tenant is a constructor argument, never a
//! settable field. There is no unscoped read/write API: for tenants
//! A ≠ B, no guard holding selection A can observe or mutate rows
//! owned by B. Cross-tenant lookups answer `NotFound`, not
//! `Forbidden`, so a foreign resource id is indistinguishable from a
//! nonexistent one.

use std::time::Duration;

use serde_json::json;
use uuid::Uuid;

use cordon_core::error::{CordonError, CordonResult};
use cordon_core::models::audit::{AuditOutcome, CreateAuditEntry};
use cordon_core::models::principal::{Principal, Role};
use cordon_core::models::user::{CreateUser, UpdateUser, User};
use cordon_core::repository::{
    AuditLogRepository, PaginatedResult, Pagination, UserRepository,
};

use crate::context::TenantSelection;
use crate::timeout::bounded;

/// Guard-level creation input. The tenant is injected from the
/// guard's validated selection, not accepted from the caller.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub role: Role,
}

pub struct TenantQueryGuard<'a, U: UserRepository, A: AuditLogRepository> {
    users: &'a U,
    audit: &'a A,
    actor: Principal,
    selection: TenantSelection,
    store_timeout: Duration,
}

impl<'a, U: UserRepository, A: AuditLogRepository> TenantQueryGuard<'a, U, A> {
    pub fn new(
        users: &'a U,
        audit: &'a A,
        actor: Principal,
        selection: TenantSelection,
        store_timeout: Duration,
    ) -> Self {
        Self {
            users,
            audit,
            actor,
            selection,
            store_timeout,
        }
    }

    pub fn selection(&self) -> TenantSelection {
        self.selection
    }

    /// Reject a payload-supplied tenant id that differs from the
    /// validated selection. Equality passes; absence passes.
    pub fn reject_foreign_tenant(&self, body_tenant: Option<Uuid>) -> CordonResult<()> {
        match (body_tenant, self.selection.tenant_id()) {
            (Some(body), Some(selected)) if body != selected => Err(CordonError::Forbidden {
                reason: "payload tenant id differs from the validated tenant".into(),
            }),
            (Some(_), None) => Err(CordonError::Forbidden {
                reason: "payload tenant id supplied but no tenant selected".into(),
            }),
            _ => Ok(()),
        }
    }

    /// List users in the selected tenant. Wildcard access with no
    /// selection yields an empty page, never an unscoped scan.
    pub async fn list_users(&self, pagination: Pagination) -> CordonResult<PaginatedResult<User>> {
        let tenant_id = match self.selection {
            TenantSelection::NoneSelected => {
                return Ok(PaginatedResult::empty(&pagination));
            }
            TenantSelection::Tenant(id) => id,
        };

        let page = bounded(
            self.store_timeout,
            self.users.list_by_tenant(tenant_id, pagination),
        )
        .await?;

        self.record(
            "user.list",
            None,
            Some(tenant_id),
            AuditOutcome::Success,
            json!({ "count": page.items.len() }),
        )
        .await?;

        Ok(page)
    }

    /// Fetch a user owned by the selected tenant.
    pub async fn get_user(&self, id: Uuid) -> CordonResult<User> {
        let (user, tenant_id) = self.fetch_owned(id, "user.get").await?;

        self.record(
            "user.get",
            Some(format!("user:{id}")),
            Some(tenant_id),
            AuditOutcome::Success,
            json!({}),
        )
        .await?;

        Ok(user)
    }

    /// Update a user owned by the selected tenant. The input type
    /// carries no tenant field; client-supplied tenant identifiers are
    /// stripped at the DTO boundary before this call.
    pub async fn update_user(&self, id: Uuid, input: UpdateUser) -> CordonResult<User> {
        let (_, tenant_id) = self.fetch_owned(id, "user.update").await?;

        let updated = bounded(self.store_timeout, self.users.update(id, input)).await?;

        self.record(
            "user.update",
            Some(format!("user:{id}")),
            Some(tenant_id),
            AuditOutcome::Success,
            json!({}),
        )
        .await?;

        Ok(updated)
    }

    /// Create a user inside the selected tenant. A platform admin
    /// targeting a tenant other than its own is permitted — that is
    /// the one sanctioned cross-tenant path, and it is flagged in the
    /// audit entry.
    pub async fn create_user(&self, input: NewUser) -> CordonResult<User> {
        let tenant_id = match self.selection {
            TenantSelection::NoneSelected => {
                return Err(CordonError::Validation {
                    message: "no tenant selected; user creation needs an explicit tenant".into(),
                });
            }
            TenantSelection::Tenant(id) => id,
        };

        if input.role == Role::PlatformAdmin {
            return Err(CordonError::Validation {
                message: "platform admins cannot be created within a tenant".into(),
            });
        }

        let cross_tenant = self.actor.tenant_id != Some(tenant_id);
        if cross_tenant && self.actor.role != Role::PlatformAdmin {
            self.record(
                "user.create",
                None,
                Some(tenant_id),
                AuditOutcome::Denied,
                json!({ "reason": "cross-tenant creation by non-platform role" }),
            )
            .await?;
            return Err(CordonError::Forbidden {
                reason: "cross-tenant creation requires the platform admin role".into(),
            });
        }

        let created = bounded(
            self.store_timeout,
            self.users.create(CreateUser {
                tenant_id: Some(tenant_id),
                email: input.email,
                password: input.password,
                role: input.role,
            }),
        )
        .await?;

        self.record(
            "user.create",
            Some(format!("user:{}", created.id)),
            Some(tenant_id),
            AuditOutcome::Success,
            json!({ "cross_tenant": cross_tenant }),
        )
        .await?;

        Ok(created)
    }

    /// Fetch a user and require the selected tenant to own it. A
    /// mismatch is audited and surfaces as `NotFound`.
    async fn fetch_owned(&self, id: Uuid, action: &str) -> CordonResult<(User, Uuid)> {
        let tenant_id = match self.selection {
            TenantSelection::NoneSelected => return Err(Self::user_not_found(id)),
            TenantSelection::Tenant(t) => t,
        };

        let user = match bounded(self.store_timeout, self.users.get_by_id(id)).await {
            Ok(user) => user,
            Err(CordonError::NotFound { .. }) => return Err(Self::user_not_found(id)),
            Err(e) => return Err(e),
        };

        if user.tenant_id != Some(tenant_id) {
            tracing::warn!(
                actor = %self.actor.id,
                target = %id,
                tenant = %tenant_id,
                "cross-tenant access attempt blocked"
            );
            self.record(
                action,
                Some(format!("user:{id}")),
                Some(tenant_id),
                AuditOutcome::Denied,
                json!({ "reason": "row owned by another tenant" }),
            )
            .await?;
            return Err(Self::user_not_found(id));
        }

        Ok((user, tenant_id))
    }

    fn user_not_found(id: Uuid) -> CordonError {
        CordonError::NotFound {
            entity: "user".into(),
            id: id.to_string(),
        }
    }

    /// Audit appends are a first-class side effect: a failed append
    /// fails the guarded operation.
    async fn record(
        &self,
        action: &str,
        resource: Option<String>,
        tenant_id: Option<Uuid>,
        outcome: AuditOutcome,
        metadata: serde_json::Value,
    ) -> CordonResult<()> {
        bounded(
            self.store_timeout,
            self.audit.append(CreateAuditEntry {
                actor_id: Some(self.actor.id),
                action: action.to_string(),
                resource,
                tenant_id,
                outcome,
                metadata,
            }),
        )
        .await?;
        Ok(())
    }
}
