//! Request guards: bearer authentication and tenant resolution.
//!
//! These compose in front of business handlers: `authenticate` turns
//! the Authorization header into a live [`Principal`] (401/403 on any
//! failure), and `resolve_tenant` validates the caller-requested
//! tenant against that principal's context, auditing denials.

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use serde_json::json;
use uuid::Uuid;

use cordon_auth::{TenantAccessMode, TenantContext, TenantSelection};
use cordon_core::error::CordonError;
use cordon_core::models::audit::{AuditOutcome, CreateAuditEntry};
use cordon_core::models::principal::{Principal, Role};
use cordon_core::repository::AuditLogRepository;

use crate::error::ApiResult;
use crate::state::AppState;

fn bearer_token(headers: &HeaderMap) -> ApiResult<&str> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| CordonError::Unauthenticated {
            reason: "missing bearer credential".into(),
        })?;
    value
        .strip_prefix("Bearer ")
        .ok_or_else(|| {
            CordonError::Unauthenticated {
                reason: "malformed authorization header".into(),
            }
            .into()
        })
}

/// Validate the bearer credential, optionally pinning an exact
/// audience.
pub async fn authenticate(
    state: &AppState,
    headers: &HeaderMap,
    expected_audience: Option<Role>,
) -> ApiResult<Principal> {
    let token = bearer_token(headers)?;
    let principal = state
        .tokens
        .validate_session(token, expected_audience)
        .await?;
    Ok(principal)
}

/// [`authenticate`] plus a role allow-list for routes shared by
/// several audiences. The token's audience has already been checked
/// against the live role; this is the route's scope policy on top.
pub async fn authenticate_any(
    state: &AppState,
    headers: &HeaderMap,
    allowed: &[Role],
) -> ApiResult<Principal> {
    let principal = authenticate(state, headers, None).await?;
    if !allowed.contains(&principal.role) {
        return Err(CordonError::Forbidden {
            reason: format!("role {} is not permitted on this route", principal.role),
        }
        .into());
    }
    Ok(principal)
}

/// Resolve and validate the tenant for this request. A rejected
/// cross-tenant request is audited before the 403 surfaces.
pub async fn resolve_tenant(
    state: &AppState,
    principal: &Principal,
    requested: Option<Uuid>,
    mode: TenantAccessMode,
) -> ApiResult<TenantSelection> {
    let context = TenantContext::resolve(principal);
    match state.tenants.require(&context, requested, mode).await {
        Ok(selection) => Ok(selection),
        Err(err @ CordonError::Forbidden { .. }) => {
            tracing::warn!(
                actor = %principal.id,
                requested = ?requested,
                "cross-tenant request rejected"
            );
            state
                .audit
                .append(CreateAuditEntry {
                    actor_id: Some(principal.id),
                    action: "tenant.access".into(),
                    resource: requested.map(|t| format!("tenant:{t}")),
                    tenant_id: principal.tenant_id,
                    outcome: AuditOutcome::Denied,
                    metadata: json!({ "requested_tenant": requested }),
                })
                .await?;
            Err(err.into())
        }
        Err(err) => Err(err.into()),
    }
}
