//! Property test for the tenant-isolation invariant: for any two
//! tenants A ≠ B and any guarded operation, a guard resolved for A
//! never observes or mutates rows owned by B.

use std::time::Duration;

use cordon_auth::context::TenantSelection;
use cordon_auth::guard::TenantQueryGuard;
use cordon_core::error::CordonError;
use cordon_core::models::principal::{Principal, Role};
use cordon_core::models::user::{CreateUser, UpdateUser, User};
use cordon_core::repository::{Pagination, UserRepository};
use cordon_store::{MemoryAuditLogRepository, MemoryUserRepository};
use proptest::prelude::*;
use uuid::Uuid;

const STORE_TIMEOUT: Duration = Duration::from_secs(2);

/// Which guarded operation to attempt against a target row.
#[derive(Debug, Clone, Copy)]
enum Op {
    Get,
    Update,
    List,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![Just(Op::Get), Just(Op::Update), Just(Op::List)]
}

async fn seed_tenant(
    users: &MemoryUserRepository,
    tenant: Uuid,
    label: &str,
    count: usize,
) -> Vec<User> {
    let mut seeded = Vec::with_capacity(count);
    for i in 0..count {
        let user = users
            .create(CreateUser {
                tenant_id: Some(tenant),
                email: format!("{label}{i}@{label}.example"),
                password: "correct-horse-battery".into(),
                role: if i == 0 { Role::TenantAdmin } else { Role::Member },
            })
            .await
            .unwrap();
        seeded.push(user);
    }
    seeded
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn guard_for_tenant_a_never_touches_tenant_b(
        count_a in 1..4usize,
        count_b in 1..4usize,
        ops in proptest::collection::vec(op_strategy(), 1..8),
        actor_role in prop_oneof![Just(Role::TenantAdmin), Just(Role::Member)],
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();

        rt.block_on(async move {
            let users = MemoryUserRepository::new();
            let audit = MemoryAuditLogRepository::new();
            let tenant_a = Uuid::new_v4();
            let tenant_b = Uuid::new_v4();

            seed_tenant(&users, tenant_a, "a", count_a).await;
            let b_rows = seed_tenant(&users, tenant_b, "b", count_b).await;

            let actor = Principal::new(Uuid::new_v4(), actor_role, Some(tenant_a)).unwrap();
            let guard = TenantQueryGuard::new(
                &users,
                &audit,
                actor,
                TenantSelection::Tenant(tenant_a),
                STORE_TIMEOUT,
            );

            for (i, op) in ops.iter().enumerate() {
                let target = &b_rows[i % b_rows.len()];
                match op {
                    Op::Get => {
                        let err = guard.get_user(target.id).await.unwrap_err();
                        prop_assert!(
                            matches!(err, CordonError::NotFound { .. }),
                            "cross-tenant get leaked: {err:?}"
                        );
                    }
                    Op::Update => {
                        let err = guard
                            .update_user(
                                target.id,
                                UpdateUser {
                                    email: Some("hijacked@a.example".into()),
                                    ..Default::default()
                                },
                            )
                            .await
                            .unwrap_err();
                        prop_assert!(
                            matches!(err, CordonError::NotFound { .. }),
                            "cross-tenant update leaked: {err:?}"
                        );
                    }
                    Op::List => {
                        let page = guard
                            .list_users(Pagination { offset: 0, limit: 100 })
                            .await
                            .unwrap();
                        prop_assert!(
                            page.items.iter().all(|u| u.tenant_id == Some(tenant_a)),
                            "listing returned a foreign tenant's row"
                        );
                        prop_assert_eq!(page.total as usize, count_a);
                    }
                }
            }

            // No row of tenant B was mutated by any of the attempts.
            for original in &b_rows {
                let current = users.get_by_id(original.id).await.unwrap();
                prop_assert_eq!(&current.email, &original.email);
                prop_assert_eq!(current.tenant_id, Some(tenant_b));
            }

            Ok(())
        })?;
    }
}
