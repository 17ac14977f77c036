//! Authentication error types.

use cordon_core::error::CordonError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account is inactive")]
    AccountInactive,

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("audience mismatch: token is not valid for audience {expected}")]
    AudienceMismatch { expected: String },

    #[error("session not found or revoked")]
    SessionRevoked,

    #[error("session no longer matches the stored principal: {0}")]
    SessionMismatch(String),

    #[error("credential store call timed out")]
    StoreTimeout,

    #[error("credential store error: {0}")]
    Store(String),

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for CordonError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::AudienceMismatch { .. } => CordonError::Forbidden {
                reason: err.to_string(),
            },
            AuthError::Crypto(msg) => CordonError::Crypto(msg),
            // Everything else, store timeouts included, degrades to a
            // denial of authentication.
            other => CordonError::Unauthenticated {
                reason: other.to_string(),
            },
        }
    }
}
