//! Public tracking endpoints: click redirects and open pixels.
//!
//! Both endpoints always serve their normal response. Throttled
//! requests and blocked redirects only lose their side effects — the
//! remote email client cannot tell the difference.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::{HeaderMap, header};
use axum::response::{IntoResponse, Redirect, Response};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use cordon_core::models::audit::{AuditOutcome, CreateAuditEntry};
use cordon_core::repository::AuditLogRepository;
use cordon_ingress::RateGate;
use cordon_ingress::redirect::validate_redirect_target;

use crate::error::ApiResult;
use crate::state::AppState;

/// 1×1 transparent GIF.
const PIXEL: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00,
    0x00, 0xff, 0xff, 0xff, 0x21, 0xf9, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00, 0x2c, 0x00, 0x00,
    0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x44, 0x01, 0x00, 0x3b,
];

fn client_ip(headers: &HeaderMap, connect_info: Option<&SocketAddr>) -> IpAddr {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|v| v.trim().parse().ok())
        .or_else(|| connect_info.map(|addr| addr.ip()))
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

#[derive(Debug, Deserialize)]
pub struct ClickQuery {
    pub redirect: Option<String>,
}

pub async fn click(
    State(state): State<AppState>,
    Path((campaign_id, user_id)): Path<(String, Uuid)>,
    Query(query): Query<ClickQuery>,
    headers: HeaderMap,
    connect_info: Option<ConnectInfo<SocketAddr>>,
) -> ApiResult<Response> {
    let ip = client_ip(&headers, connect_info.as_ref().map(|ci| &ci.0));
    let allowed = state.limiter.check(ip).is_allowed();

    let requested = query.redirect.as_deref().unwrap_or("/");
    let destination = match validate_redirect_target(requested) {
        Ok(()) => requested,
        Err(violation) => {
            tracing::warn!(target = %requested, %violation, "redirect target blocked");
            state
                .audit
                .append(CreateAuditEntry {
                    actor_id: None,
                    action: "redirect.block".into(),
                    resource: Some(format!("campaign:{campaign_id}")),
                    tenant_id: None,
                    outcome: AuditOutcome::Incident,
                    metadata: json!({
                        "target": requested,
                        "violation": violation.to_string(),
                    }),
                })
                .await?;
            "/"
        }
    };

    if allowed {
        state
            .audit
            .append(CreateAuditEntry {
                actor_id: None,
                action: "track.click".into(),
                resource: Some(format!("campaign:{campaign_id}")),
                tenant_id: None,
                outcome: AuditOutcome::Success,
                metadata: json!({ "user_id": user_id }),
            })
            .await?;
    }

    Ok(Redirect::temporary(destination).into_response())
}

pub async fn open(
    State(state): State<AppState>,
    Path((campaign_id, user_id)): Path<(String, Uuid)>,
    headers: HeaderMap,
    connect_info: Option<ConnectInfo<SocketAddr>>,
) -> ApiResult<Response> {
    let ip = client_ip(&headers, connect_info.as_ref().map(|ci| &ci.0));

    if state.limiter.check(ip).is_allowed() {
        state
            .audit
            .append(CreateAuditEntry {
                actor_id: None,
                action: "track.open".into(),
                resource: Some(format!("campaign:{campaign_id}")),
                tenant_id: None,
                outcome: AuditOutcome::Success,
                metadata: json!({ "user_id": user_id }),
            })
            .await?;
    }

    Ok(([(header::CONTENT_TYPE, "image/gif")], PIXEL).into_response())
}
