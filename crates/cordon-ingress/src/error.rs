//! Ingress error types.

use cordon_core::error::CordonError;
use thiserror::Error;

/// Why an inbound webhook was rejected. Every variant is a denial;
/// none of them leak back to the sender.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WebhookError {
    #[error("no verification key configured")]
    KeyNotConfigured,

    #[error("missing signature header")]
    MissingSignature,

    #[error("missing timestamp header")]
    MissingTimestamp,

    #[error("malformed timestamp: {0}")]
    MalformedTimestamp(String),

    #[error("timestamp outside the replay window ({skew_secs}s skew, {window_secs}s allowed)")]
    StaleTimestamp { skew_secs: i64, window_secs: i64 },

    #[error("malformed signature: {0}")]
    MalformedSignature(String),

    #[error("signature verification failed")]
    BadSignature,
}

impl From<WebhookError> for CordonError {
    fn from(err: WebhookError) -> Self {
        CordonError::SecurityIncident {
            kind: "webhook".into(),
            detail: err.to_string(),
        }
    }
}

/// Why a redirect target was refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RedirectViolation {
    #[error("empty redirect target")]
    Empty,

    #[error("protocol-relative target")]
    ProtocolRelative,

    #[error("absolute or non-relative target")]
    NotRelative,

    #[error("path traversal segment in target")]
    Traversal,
}

impl From<RedirectViolation> for CordonError {
    fn from(err: RedirectViolation) -> Self {
        CordonError::SecurityIncident {
            kind: "redirect".into(),
            detail: err.to_string(),
        }
    }
}
