//! Environment configuration.
//!
//! Every knob has a documented default; the ones that guard trust
//! boundaries (signing secret, webhook key) are hard requirements in
//! production and only defaulted in development.

use std::time::Duration;

use cordon_auth::AuthConfig;
use cordon_core::error::CordonError;
use cordon_ingress::webhook::parse_verifying_key;
use cordon_ingress::{Environment, RateLimitConfig, WebhookConfig};

/// Signing secret used when `CORDON_SIGNING_SECRET` is unset in
/// development.
const DEV_SIGNING_SECRET: &str = "dev-only-signing-secret-do-not-deploy!!!";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub environment: Environment,
    pub bind_addr: String,
    pub auth: AuthConfig,
    pub webhook: WebhookConfig,
    pub rate_limit: RateLimitConfig,
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> Result<T, CordonError> {
    match env_var(name) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| CordonError::Validation {
            message: format!("{name} is not a valid value: {raw}"),
        }),
    }
}

impl ServerConfig {
    /// Load configuration from `CORDON_*` environment variables.
    pub fn from_env() -> Result<Self, CordonError> {
        let environment = match env_var("CORDON_ENV").as_deref() {
            None | Some("production") => Environment::Production,
            Some("development") => Environment::Development,
            Some(other) => {
                return Err(CordonError::Validation {
                    message: format!("CORDON_ENV must be production or development, got {other}"),
                });
            }
        };

        let signing_secret = match (env_var("CORDON_SIGNING_SECRET"), environment) {
            (Some(secret), _) => secret,
            (None, Environment::Development) => {
                tracing::warn!("CORDON_SIGNING_SECRET unset; using the development secret");
                DEV_SIGNING_SECRET.into()
            }
            (None, Environment::Production) => {
                return Err(CordonError::Validation {
                    message: "CORDON_SIGNING_SECRET is required in production".into(),
                });
            }
        };

        let auth = AuthConfig {
            signing_secret,
            token_lifetime_secs: env_parse("CORDON_TOKEN_LIFETIME_SECS", 604_800)?,
            issuer: env_var("CORDON_ISSUER").unwrap_or_else(|| "cordon".into()),
            store_timeout_ms: env_parse("CORDON_STORE_TIMEOUT_MS", 2_000)?,
        };
        auth.validate()
            .map_err(|e| CordonError::Validation { message: e.to_string() })?;

        let verifying_key = match (env_var("CORDON_WEBHOOK_PUBLIC_KEY"), environment) {
            (Some(encoded), _) => Some(parse_verifying_key(&encoded)?),
            (None, Environment::Development) => None,
            (None, Environment::Production) => {
                return Err(CordonError::Validation {
                    message: "CORDON_WEBHOOK_PUBLIC_KEY is required in production".into(),
                });
            }
        };
        let webhook = WebhookConfig {
            verifying_key,
            replay_window_secs: env_parse("CORDON_WEBHOOK_REPLAY_WINDOW_SECS", 600)?,
            environment,
        };

        let rate_limit = RateLimitConfig {
            max_requests: env_parse("CORDON_RATE_LIMIT_MAX", 60)?,
            window: Duration::from_secs(env_parse("CORDON_RATE_LIMIT_WINDOW_SECS", 60)?),
            ..Default::default()
        };

        Ok(Self {
            environment,
            bind_addr: env_var("CORDON_BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8080".into()),
            auth,
            webhook,
            rate_limit,
        })
    }
}
