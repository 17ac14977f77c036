//! CORDON Server — Application entry point.

use std::net::SocketAddr;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use cordon_ingress::{EventDeduper, SlidingWindowLimiter, WebhookVerifier};
use cordon_server::{AppState, ServerConfig, build_router};
use cordon_store::{
    MemoryAuditLogRepository, MemorySessionRepository, MemoryTenantRepository,
    MemoryUserRepository,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("cordon=info".parse().unwrap()),
        )
        .json()
        .init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "configuration rejected");
            std::process::exit(1);
        }
    };

    let state = AppState::new(
        MemoryUserRepository::new(),
        MemorySessionRepository::new(),
        MemoryTenantRepository::new(),
        MemoryAuditLogRepository::new(),
        config.auth.clone(),
        WebhookVerifier::new(config.webhook.clone()),
        EventDeduper::new(Duration::from_secs(24 * 60 * 60)),
        SlidingWindowLimiter::new(config.rate_limit.clone()),
    );

    // Periodic expiry sweep for the session registry.
    let sweeper = state.tokens.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(15 * 60));
        loop {
            interval.tick().await;
            match sweeper.sweep_expired().await {
                Ok(0) => {}
                Ok(n) => tracing::info!(count = n, "swept expired sessions"),
                Err(e) => tracing::warn!(error = %e, "session sweep failed"),
            }
        }
    });

    let app = build_router(state);

    tracing::info!(addr = %config.bind_addr, "starting CORDON server");
    let listener = match tokio::net::TcpListener::bind(&config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, addr = %config.bind_addr, "failed to bind");
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    {
        tracing::error!(error = %e, "server stopped unexpectedly");
    }
}
