//! Authentication configuration.

use crate::error::AuthError;

/// Minimum accepted signing secret length in bytes.
pub const MIN_SIGNING_SECRET_LEN: usize = 32;

/// Configuration for the token service.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC-SHA256 signing secret. At least
    /// [`MIN_SIGNING_SECRET_LEN`] bytes; enforced by [`AuthConfig::validate`].
    pub signing_secret: String,
    /// Token lifetime in seconds (default: 604_800 = 7 days).
    pub token_lifetime_secs: u64,
    /// JWT issuer (`iss` claim).
    pub issuer: String,
    /// Deadline for every Credential Store call, in milliseconds
    /// (default: 2_000). Timeout is a validation failure.
    pub store_timeout_ms: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            signing_secret: String::new(),
            token_lifetime_secs: 604_800,
            issuer: "cordon".into(),
            store_timeout_ms: 2_000,
        }
    }
}

impl AuthConfig {
    /// Reject configurations that cannot sign safely. Called at
    /// startup; a short or missing secret is a hard error, not a
    /// degraded mode.
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.signing_secret.len() < MIN_SIGNING_SECRET_LEN {
            return Err(AuthError::Crypto(format!(
                "signing secret must be at least {MIN_SIGNING_SECRET_LEN} bytes"
            )));
        }
        Ok(())
    }

    pub fn store_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.store_timeout_ms)
    }
}
