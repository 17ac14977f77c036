//! Shared application state.
//!
//! Every component is an injected value here — session registry, rate
//! limiter, and stores included — so swapping an implementation (for
//! example a distributed store) never touches call sites.

use std::sync::Arc;

use cordon_auth::{AuthConfig, TenantResolver, TokenService};
use cordon_ingress::{EventDeduper, SlidingWindowLimiter, WebhookVerifier};
use cordon_store::{
    MemoryAuditLogRepository, MemorySessionRepository, MemoryTenantRepository,
    MemoryUserRepository,
};

pub type Tokens = TokenService<MemoryUserRepository, MemorySessionRepository>;
pub type Tenants = TenantResolver<MemoryTenantRepository>;

#[derive(Clone)]
pub struct AppState {
    pub tokens: Arc<Tokens>,
    pub tenants: Arc<Tenants>,
    pub users: MemoryUserRepository,
    pub audit: MemoryAuditLogRepository,
    pub webhooks: Arc<WebhookVerifier>,
    pub deduper: Arc<EventDeduper>,
    pub limiter: Arc<SlidingWindowLimiter>,
    pub auth_config: AuthConfig,
}

impl AppState {
    pub fn new(
        users: MemoryUserRepository,
        sessions: MemorySessionRepository,
        tenants: MemoryTenantRepository,
        audit: MemoryAuditLogRepository,
        auth_config: AuthConfig,
        webhooks: WebhookVerifier,
        deduper: EventDeduper,
        limiter: SlidingWindowLimiter,
    ) -> Self {
        let tokens = TokenService::new(users.clone(), sessions, auth_config.clone());
        let resolver = TenantResolver::new(tenants, auth_config.store_timeout());
        Self {
            tokens: Arc::new(tokens),
            tenants: Arc::new(resolver),
            users,
            audit,
            webhooks: Arc::new(webhooks),
            deduper: Arc::new(deduper),
            limiter: Arc::new(limiter),
            auth_config,
        }
    }
}
