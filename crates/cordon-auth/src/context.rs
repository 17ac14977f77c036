//! Tenant context resolution.
//!
//! A [`TenantContext`] is derived from the authenticated principal on
//! every request and never cached across requests. Breadth of access
//! for platform admins requires an explicit tenant choice per call;
//! the absence of a choice yields zero rows, never all rows.

use std::time::Duration;

use uuid::Uuid;

use cordon_core::error::{CordonError, CordonResult};
use cordon_core::models::principal::{Principal, Role};
use cordon_core::repository::TenantRepository;

use crate::timeout::bounded;

/// Per-request view of which tenant's data may be touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantContext {
    role: Role,
    tenant_id: Option<Uuid>,
}

impl TenantContext {
    /// Derive the context for a principal.
    pub fn resolve(principal: &Principal) -> Self {
        Self {
            role: principal.role,
            tenant_id: principal.tenant_id,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn tenant_id(&self) -> Option<Uuid> {
        self.tenant_id
    }

    /// Whether this context may touch the named tenant's data.
    pub fn can_access(&self, tenant_id: Uuid) -> bool {
        match self.role {
            Role::PlatformAdmin => true,
            _ => self.tenant_id == Some(tenant_id),
        }
    }

    /// False only for platform admins, who instead name one tenant
    /// explicitly per call.
    pub fn must_filter_by_tenant(&self) -> bool {
        self.role.requires_tenant()
    }
}

/// The outcome of validating a requested tenant against a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantSelection {
    /// One tenant, validated. All queries filter on it.
    Tenant(Uuid),
    /// Wildcard access with no tenant chosen. Callers must treat this
    /// as zero rows.
    NoneSelected,
}

impl TenantSelection {
    pub fn tenant_id(&self) -> Option<Uuid> {
        match self {
            TenantSelection::Tenant(id) => Some(*id),
            TenantSelection::NoneSelected => None,
        }
    }
}

/// How a route treats the wildcard state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantAccessMode {
    /// A concrete tenant must result; platform admins must name one.
    Required,
    /// `NoneSelected` is acceptable and yields empty result sets.
    Wildcard,
}

/// Validates requested tenant ids against a resolved context.
pub struct TenantResolver<T: TenantRepository> {
    tenant_repo: T,
    store_timeout: Duration,
}

impl<T: TenantRepository> TenantResolver<T> {
    pub fn new(tenant_repo: T, store_timeout: Duration) -> Self {
        Self {
            tenant_repo,
            store_timeout,
        }
    }

    /// Validate a caller-requested tenant id against the context.
    ///
    /// - Platform admin, no request: [`TenantSelection::NoneSelected`].
    /// - Platform admin naming a tenant: the tenant must exist.
    /// - Tenant-scoped roles naming a tenant: it must equal the
    ///   context's own tenant exactly; anything else is rejected, never
    ///   silently substituted.
    pub async fn validate_requested_tenant(
        &self,
        context: &TenantContext,
        requested: Option<Uuid>,
    ) -> CordonResult<TenantSelection> {
        match (context.role(), requested) {
            (Role::PlatformAdmin, None) => Ok(TenantSelection::NoneSelected),
            (Role::PlatformAdmin, Some(id)) => {
                let tenant = bounded(self.store_timeout, self.tenant_repo.get_by_id(id)).await?;
                Ok(TenantSelection::Tenant(tenant.id))
            }
            (_, requested) => {
                // Invariant of Principal: tenant-scoped roles always
                // carry a tenant id.
                let own = context.tenant_id().ok_or_else(|| CordonError::Internal(
                    "tenant-scoped context without tenant id".into(),
                ))?;
                match requested {
                    None => Ok(TenantSelection::Tenant(own)),
                    Some(id) if id == own => Ok(TenantSelection::Tenant(own)),
                    Some(id) => Err(CordonError::Forbidden {
                        reason: format!("tenant {id} is outside this principal's scope"),
                    }),
                }
            }
        }
    }

    /// [`Self::validate_requested_tenant`] under a route's access mode.
    pub async fn require(
        &self,
        context: &TenantContext,
        requested: Option<Uuid>,
        mode: TenantAccessMode,
    ) -> CordonResult<TenantSelection> {
        let selection = self.validate_requested_tenant(context, requested).await?;
        match (mode, selection) {
            (TenantAccessMode::Required, TenantSelection::NoneSelected) => {
                Err(CordonError::Validation {
                    message: "no tenant selected; pass an explicit tenant_id".into(),
                })
            }
            (_, selection) => Ok(selection),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scoped(role: Role, tenant: Uuid) -> TenantContext {
        TenantContext::resolve(&Principal::new(Uuid::new_v4(), role, Some(tenant)).unwrap())
    }

    fn platform_admin() -> TenantContext {
        TenantContext::resolve(&Principal::new(Uuid::new_v4(), Role::PlatformAdmin, None).unwrap())
    }

    #[test]
    fn platform_admin_can_access_any_tenant_but_must_choose() {
        let ctx = platform_admin();
        assert!(ctx.can_access(Uuid::new_v4()));
        assert!(!ctx.must_filter_by_tenant());
        assert_eq!(ctx.tenant_id(), None);
    }

    #[test]
    fn member_is_pinned_to_its_tenant() {
        let tenant = Uuid::new_v4();
        let ctx = scoped(Role::Member, tenant);
        assert!(ctx.can_access(tenant));
        assert!(!ctx.can_access(Uuid::new_v4()));
        assert!(ctx.must_filter_by_tenant());
    }
}
