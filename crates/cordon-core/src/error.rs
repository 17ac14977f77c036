//! Error types for the CORDON system.
//!
//! Authorization failures are fail-closed: any ambiguous check (store
//! timeout, parse failure, missing header) resolves to a denial
//! variant, never to a permissive default.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CordonError {
    /// No credential, or a credential that failed verification.
    #[error("Unauthenticated: {reason}")]
    Unauthenticated { reason: String },

    /// Valid credential, insufficient scope or tenant mismatch.
    #[error("Forbidden: {reason}")]
    Forbidden { reason: String },

    /// Also returned for tenant-scoped lookups that miss the caller's
    /// tenant, so a foreign resource id is indistinguishable from a
    /// nonexistent one.
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Actively adversarial input (redirect target, forged signature).
    /// Logged and audited, never acted upon.
    #[error("Security incident: {kind}: {detail}")]
    SecurityIncident { kind: String, detail: String },

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Store error: {0}")]
    Store(String),

    /// A Credential Store call exceeded its deadline. Treated as a
    /// validation failure by every authorization path.
    #[error("Store call timed out")]
    StoreTimeout,

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type CordonResult<T> = Result<T, CordonError>;
