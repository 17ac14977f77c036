//! Tenant-scoped user administration routes.
//!
//! Every handler goes through `authenticate` and `resolve_tenant`
//! before touching data, and all data access happens through the
//! tenant query guard — there is no unscoped path from here to the
//! store.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cordon_auth::guard::{NewUser, TenantQueryGuard};
use cordon_auth::{TenantAccessMode, TenantSelection};
use cordon_core::models::principal::{Principal, Role};
use cordon_core::models::user::{UpdateUser, User, UserStatus};
use cordon_core::repository::Pagination;

use crate::auth::{authenticate_any, resolve_tenant};
use crate::error::ApiResult;
use crate::state::AppState;

const ADMIN_ROLES: &[Role] = &[Role::TenantAdmin, Role::PlatformAdmin];

/// Wire shape of a user; the password hash never leaves the store
/// layer.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub email: String,
    pub role: Role,
    pub status: UserStatus,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            tenant_id: user.tenant_id,
            email: user.email,
            role: user.role,
            status: user.status,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub tenant_id: Option<Uuid>,
    #[serde(default)]
    pub offset: u64,
    pub limit: Option<u64>,
}

fn guard_for<'a>(
    state: &'a AppState,
    principal: Principal,
    selection: TenantSelection,
) -> TenantQueryGuard<'a, cordon_store::MemoryUserRepository, cordon_store::MemoryAuditLogRepository>
{
    TenantQueryGuard::new(
        &state.users,
        &state.audit,
        principal,
        selection,
        state.auth_config.store_timeout(),
    )
}

pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<serde_json::Value>> {
    let principal = authenticate_any(&state, &headers, ADMIN_ROLES).await?;
    let selection = resolve_tenant(
        &state,
        &principal,
        query.tenant_id,
        TenantAccessMode::Wildcard,
    )
    .await?;

    let guard = guard_for(&state, principal, selection);
    let page = guard
        .list_users(Pagination {
            offset: query.offset,
            limit: query.limit.unwrap_or(50),
        })
        .await?;

    let items: Vec<UserView> = page.items.into_iter().map(UserView::from).collect();
    Ok(Json(serde_json::json!({
        "items": items,
        "total": page.total,
        "offset": page.offset,
        "limit": page.limit,
    })))
}

#[derive(Debug, Deserialize)]
pub struct TenantQueryParam {
    pub tenant_id: Option<Uuid>,
}

pub async fn get(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Query(query): Query<TenantQueryParam>,
) -> ApiResult<Json<UserView>> {
    let principal = authenticate_any(&state, &headers, ADMIN_ROLES).await?;
    let selection = resolve_tenant(
        &state,
        &principal,
        query.tenant_id,
        TenantAccessMode::Wildcard,
    )
    .await?;

    let guard = guard_for(&state, principal, selection);
    let user = guard.get_user(id).await?;
    Ok(Json(user.into()))
}

#[derive(Debug, Deserialize)]
pub struct CreateUserBody {
    pub email: String,
    pub password: String,
    pub role: Role,
    /// Explicit target tenant. Mandatory for platform admins; for
    /// tenant-scoped callers it must equal their own tenant.
    pub tenant_id: Option<Uuid>,
}

pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateUserBody>,
) -> ApiResult<Json<UserView>> {
    let principal = authenticate_any(&state, &headers, ADMIN_ROLES).await?;
    let selection = resolve_tenant(
        &state,
        &principal,
        body.tenant_id,
        TenantAccessMode::Required,
    )
    .await?;

    let guard = guard_for(&state, principal, selection);
    let created = guard
        .create_user(NewUser {
            email: body.email,
            password: body.password,
            role: body.role,
        })
        .await?;
    Ok(Json(created.into()))
}

/// Update payload as received from the client. The tenant id is
/// accepted syntactically only so it can be checked and stripped; it
/// never reaches the store.
#[derive(Debug, Deserialize)]
pub struct UpdateUserBody {
    pub email: Option<String>,
    pub role: Option<Role>,
    pub status: Option<UserStatus>,
    pub tenant_id: Option<Uuid>,
}

pub async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Query(query): Query<TenantQueryParam>,
    Json(body): Json<UpdateUserBody>,
) -> ApiResult<Json<UserView>> {
    let principal = authenticate_any(&state, &headers, ADMIN_ROLES).await?;
    let selection = resolve_tenant(
        &state,
        &principal,
        query.tenant_id,
        TenantAccessMode::Wildcard,
    )
    .await?;

    let guard = guard_for(&state, principal, selection);

    // A payload tenant that differs from the validated one is an
    // error; a matching one is stripped either way.
    guard.reject_foreign_tenant(body.tenant_id)?;
    let update = UpdateUser {
        email: body.email,
        role: body.role,
        status: body.status,
    };

    let updated = guard.update_user(id, update).await?;
    Ok(Json(updated.into()))
}
