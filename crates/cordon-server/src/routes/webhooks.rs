//! Webhook ingestion.
//!
//! The raw body is handed to the verifier before any JSON parsing.
//! Verification failures are audited as incidents and answered with
//! the same 204 as accepted events, so a forger learns nothing from
//! the response. Tenant attribution comes from the internal user
//! record the event references, never from the payload's own claim.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use cordon_core::error::CordonError;
use cordon_core::models::audit::{AuditOutcome, CreateAuditEntry};
use cordon_core::repository::{AuditLogRepository, UserRepository};

use crate::error::ApiResult;
use crate::state::AppState;

pub const SIGNATURE_HEADER: &str = "x-webhook-signature";
pub const TIMESTAMP_HEADER: &str = "x-webhook-timestamp";

#[derive(Debug, Deserialize)]
struct WebhookEventBody {
    event_id: String,
    event_type: String,
    user_id: Uuid,
    /// The provider's idea of the tenant. Recorded for comparison,
    /// never used for attribution.
    tenant_id: Option<Uuid>,
}

pub async fn ingest(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<StatusCode> {
    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    let timestamp = headers.get(TIMESTAMP_HEADER).and_then(|v| v.to_str().ok());

    if let Err(reason) = state
        .webhooks
        .verify(signature, timestamp, &body, Utc::now())
    {
        tracing::warn!(%reason, "webhook rejected");
        state
            .audit
            .append(CreateAuditEntry {
                actor_id: None,
                action: "webhook.reject".into(),
                resource: None,
                tenant_id: None,
                outcome: AuditOutcome::Incident,
                metadata: json!({ "reason": reason.to_string() }),
            })
            .await?;
        // Same response as the success path.
        return Ok(StatusCode::NO_CONTENT);
    }

    let event: WebhookEventBody =
        serde_json::from_slice(&body).map_err(|e| CordonError::Validation {
            message: format!("malformed webhook payload: {e}"),
        })?;

    // The provider may redeliver; the event id is the dedupe key.
    if !state.deduper.observe(&event.event_id) {
        return Ok(StatusCode::NO_CONTENT);
    }

    let user = match tokio::time::timeout(
        state.auth_config.store_timeout(),
        state.users.get_by_id(event.user_id),
    )
    .await
    {
        Err(_) => return Err(CordonError::StoreTimeout.into()),
        Ok(Err(CordonError::NotFound { .. })) => {
            state
                .audit
                .append(CreateAuditEntry {
                    actor_id: None,
                    action: "webhook.event".into(),
                    resource: Some(format!("user:{}", event.user_id)),
                    tenant_id: None,
                    outcome: AuditOutcome::Denied,
                    metadata: json!({
                        "event_id": event.event_id,
                        "reason": "event references an unknown user",
                    }),
                })
                .await?;
            return Ok(StatusCode::NO_CONTENT);
        }
        Ok(Err(e)) => return Err(e.into()),
        Ok(Ok(user)) => user,
    };

    // Attribution: the live user record decides the tenant.
    let tenant_id = user.tenant_id;
    if event.tenant_id.is_some() && event.tenant_id != tenant_id {
        tracing::warn!(
            event_id = %event.event_id,
            claimed = ?event.tenant_id,
            derived = ?tenant_id,
            "webhook payload claimed a different tenant; claim ignored"
        );
    }

    state
        .audit
        .append(CreateAuditEntry {
            actor_id: Some(user.id),
            action: "webhook.event".into(),
            resource: Some(format!("user:{}", user.id)),
            tenant_id,
            outcome: AuditOutcome::Success,
            metadata: json!({
                "event_id": event.event_id,
                "event_type": event.event_type,
                "claimed_tenant": event.tenant_id,
            }),
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
