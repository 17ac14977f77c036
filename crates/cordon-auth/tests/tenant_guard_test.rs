//! Integration tests for tenant context resolution and the query
//! guard.

use std::time::Duration;

use cordon_auth::context::{TenantAccessMode, TenantContext, TenantResolver, TenantSelection};
use cordon_auth::guard::{NewUser, TenantQueryGuard};
use cordon_core::error::CordonError;
use cordon_core::models::audit::AuditOutcome;
use cordon_core::models::principal::{Principal, Role};
use cordon_core::models::tenant::CreateTenant;
use cordon_core::models::user::{CreateUser, UpdateUser};
use cordon_core::repository::{
    AuditLogFilter, AuditLogRepository, Pagination, TenantRepository, UserRepository,
};
use cordon_store::{MemoryAuditLogRepository, MemoryTenantRepository, MemoryUserRepository};
use uuid::Uuid;

const STORE_TIMEOUT: Duration = Duration::from_secs(2);

struct Fixture {
    users: MemoryUserRepository,
    tenants: MemoryTenantRepository,
    audit: MemoryAuditLogRepository,
    tenant_a: Uuid,
    tenant_b: Uuid,
    alice: Uuid, // member of tenant A
    bob: Uuid,   // member of tenant B
}

async fn setup() -> Fixture {
    let users = MemoryUserRepository::new();
    let tenants = MemoryTenantRepository::new();
    let audit = MemoryAuditLogRepository::new();

    let tenant_a = tenants
        .create(CreateTenant {
            name: "Tenant A".into(),
            slug: "tenant-a".into(),
        })
        .await
        .unwrap()
        .id;
    let tenant_b = tenants
        .create(CreateTenant {
            name: "Tenant B".into(),
            slug: "tenant-b".into(),
        })
        .await
        .unwrap()
        .id;

    let alice = users
        .create(CreateUser {
            tenant_id: Some(tenant_a),
            email: "alice@a.example".into(),
            password: "correct-horse-battery".into(),
            role: Role::Member,
        })
        .await
        .unwrap()
        .id;
    let bob = users
        .create(CreateUser {
            tenant_id: Some(tenant_b),
            email: "bob@b.example".into(),
            password: "correct-horse-battery".into(),
            role: Role::Member,
        })
        .await
        .unwrap()
        .id;

    Fixture {
        users,
        tenants,
        audit,
        tenant_a,
        tenant_b,
        alice,
        bob,
    }
}

fn admin_of(tenant: Uuid) -> Principal {
    Principal::new(Uuid::new_v4(), Role::TenantAdmin, Some(tenant)).unwrap()
}

fn platform_admin() -> Principal {
    Principal::new(Uuid::new_v4(), Role::PlatformAdmin, None).unwrap()
}

fn guard<'a>(
    fx: &'a Fixture,
    actor: &Principal,
    selection: TenantSelection,
) -> TenantQueryGuard<'a, MemoryUserRepository, MemoryAuditLogRepository> {
    TenantQueryGuard::new(&fx.users, &fx.audit, actor.clone(), selection, STORE_TIMEOUT)
}

// -----------------------------------------------------------------------
// Resolver
// -----------------------------------------------------------------------

#[tokio::test]
async fn platform_admin_without_request_gets_no_tenant() {
    let fx = setup().await;
    let resolver = TenantResolver::new(fx.tenants.clone(), STORE_TIMEOUT);
    let ctx = TenantContext::resolve(&platform_admin());

    let selection = resolver
        .validate_requested_tenant(&ctx, None)
        .await
        .unwrap();
    assert_eq!(selection, TenantSelection::NoneSelected);
}

#[tokio::test]
async fn platform_admin_naming_a_tenant_is_validated_against_existence() {
    let fx = setup().await;
    let resolver = TenantResolver::new(fx.tenants.clone(), STORE_TIMEOUT);
    let ctx = TenantContext::resolve(&platform_admin());

    let selection = resolver
        .validate_requested_tenant(&ctx, Some(fx.tenant_a))
        .await
        .unwrap();
    assert_eq!(selection, TenantSelection::Tenant(fx.tenant_a));

    let err = resolver
        .validate_requested_tenant(&ctx, Some(Uuid::new_v4()))
        .await
        .unwrap_err();
    assert!(matches!(err, CordonError::NotFound { .. }));
}

#[tokio::test]
async fn scoped_role_defaults_to_its_own_tenant() {
    let fx = setup().await;
    let resolver = TenantResolver::new(fx.tenants.clone(), STORE_TIMEOUT);
    let ctx = TenantContext::resolve(&admin_of(fx.tenant_a));

    let selection = resolver
        .validate_requested_tenant(&ctx, None)
        .await
        .unwrap();
    assert_eq!(selection, TenantSelection::Tenant(fx.tenant_a));
}

#[tokio::test]
async fn scoped_role_requesting_another_tenant_is_rejected() {
    let fx = setup().await;
    let resolver = TenantResolver::new(fx.tenants.clone(), STORE_TIMEOUT);
    let ctx = TenantContext::resolve(&admin_of(fx.tenant_a));

    let err = resolver
        .validate_requested_tenant(&ctx, Some(fx.tenant_b))
        .await
        .unwrap_err();
    assert!(matches!(err, CordonError::Forbidden { .. }));
}

#[tokio::test]
async fn required_mode_refuses_the_wildcard_state() {
    let fx = setup().await;
    let resolver = TenantResolver::new(fx.tenants.clone(), STORE_TIMEOUT);
    let ctx = TenantContext::resolve(&platform_admin());

    let err = resolver
        .require(&ctx, None, TenantAccessMode::Required)
        .await
        .unwrap_err();
    assert!(matches!(err, CordonError::Validation { .. }));

    let selection = resolver
        .require(&ctx, None, TenantAccessMode::Wildcard)
        .await
        .unwrap();
    assert_eq!(selection, TenantSelection::NoneSelected);
}

// -----------------------------------------------------------------------
// Query guard
// -----------------------------------------------------------------------

#[tokio::test]
async fn wildcard_with_no_selection_returns_zero_rows() {
    let fx = setup().await;
    let actor = platform_admin();
    let g = guard(&fx, &actor, TenantSelection::NoneSelected);

    let page = g.list_users(Pagination::default()).await.unwrap();
    assert_eq!(page.total, 0);
    assert!(page.items.is_empty());
}

#[tokio::test]
async fn list_is_filtered_to_the_selected_tenant() {
    let fx = setup().await;
    let actor = admin_of(fx.tenant_a);
    let g = guard(&fx, &actor, TenantSelection::Tenant(fx.tenant_a));

    let page = g.list_users(Pagination::default()).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].id, fx.alice);
}

#[tokio::test]
async fn cross_tenant_get_answers_not_found_and_is_audited() {
    let fx = setup().await;
    let actor = admin_of(fx.tenant_a);
    let g = guard(&fx, &actor, TenantSelection::Tenant(fx.tenant_a));

    let err = g.get_user(fx.bob).await.unwrap_err();
    assert!(
        matches!(err, CordonError::NotFound { .. }),
        "cross-tenant lookups must be indistinguishable from missing rows, got {err:?}"
    );

    let denied = fx
        .audit
        .list(
            AuditLogFilter {
                action: Some("user.get".into()),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(denied.len(), 1);
    assert_eq!(denied[0].outcome, AuditOutcome::Denied);
    assert_eq!(denied[0].actor_id, Some(actor.id));
    assert_eq!(denied[0].tenant_id, Some(fx.tenant_a));
}

#[tokio::test]
async fn cross_tenant_update_is_blocked_before_the_write() {
    let fx = setup().await;
    let actor = admin_of(fx.tenant_a);
    let g = guard(&fx, &actor, TenantSelection::Tenant(fx.tenant_a));

    let err = g
        .update_user(
            fx.bob,
            UpdateUser {
                email: Some("stolen@a.example".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CordonError::NotFound { .. }));

    // Bob is untouched.
    let bob = fx.users.get_by_id(fx.bob).await.unwrap();
    assert_eq!(bob.email, "bob@b.example");
}

#[tokio::test]
async fn update_within_tenant_succeeds() {
    let fx = setup().await;
    let actor = admin_of(fx.tenant_a);
    let g = guard(&fx, &actor, TenantSelection::Tenant(fx.tenant_a));

    let updated = g
        .update_user(
            fx.alice,
            UpdateUser {
                email: Some("alice+new@a.example".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.email, "alice+new@a.example");
    assert_eq!(updated.tenant_id, Some(fx.tenant_a));
}

#[tokio::test]
async fn payload_tenant_differing_from_selection_is_rejected() {
    let fx = setup().await;
    let actor = admin_of(fx.tenant_a);
    let g = guard(&fx, &actor, TenantSelection::Tenant(fx.tenant_a));

    assert!(g.reject_foreign_tenant(None).is_ok());
    assert!(g.reject_foreign_tenant(Some(fx.tenant_a)).is_ok());
    let err = g.reject_foreign_tenant(Some(fx.tenant_b)).unwrap_err();
    assert!(matches!(err, CordonError::Forbidden { .. }));
}

#[tokio::test]
async fn create_injects_the_validated_tenant() {
    let fx = setup().await;
    let actor = admin_of(fx.tenant_a);
    let g = guard(&fx, &actor, TenantSelection::Tenant(fx.tenant_a));

    let created = g
        .create_user(NewUser {
            email: "carol@a.example".into(),
            password: "correct-horse-battery".into(),
            role: Role::Member,
        })
        .await
        .unwrap();
    assert_eq!(created.tenant_id, Some(fx.tenant_a));
}

#[tokio::test]
async fn create_without_a_selection_is_a_validation_error() {
    let fx = setup().await;
    let actor = platform_admin();
    let g = guard(&fx, &actor, TenantSelection::NoneSelected);

    let err = g
        .create_user(NewUser {
            email: "carol@x.example".into(),
            password: "correct-horse-battery".into(),
            role: Role::Member,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CordonError::Validation { .. }));
}

#[tokio::test]
async fn platform_admin_cross_tenant_creation_is_audited() {
    let fx = setup().await;
    let actor = platform_admin();
    let g = guard(&fx, &actor, TenantSelection::Tenant(fx.tenant_b));

    let created = g
        .create_user(NewUser {
            email: "dave@b.example".into(),
            password: "correct-horse-battery".into(),
            role: Role::Member,
        })
        .await
        .unwrap();
    assert_eq!(created.tenant_id, Some(fx.tenant_b));

    let entries = fx
        .audit
        .list(
            AuditLogFilter {
                action: Some("user.create".into()),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].outcome, AuditOutcome::Success);
    assert_eq!(entries[0].metadata["cross_tenant"], true);
}

#[tokio::test]
async fn guard_cannot_create_platform_admins() {
    let fx = setup().await;
    let actor = platform_admin();
    let g = guard(&fx, &actor, TenantSelection::Tenant(fx.tenant_a));

    let err = g
        .create_user(NewUser {
            email: "root@a.example".into(),
            password: "correct-horse-battery".into(),
            role: Role::PlatformAdmin,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CordonError::Validation { .. }));
}
