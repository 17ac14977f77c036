//! JWT issuance and verification.
//!
//! Tokens are HMAC-SHA256 signed and carry the principal's role as
//! their audience claim, so a token minted for one role can never be
//! replayed against a route expecting another — audience mismatch is
//! an independent, mandatory check on top of signature validity.

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use cordon_core::models::principal::{Principal, Role};

use crate::config::AuthConfig;
use crate::error::AuthError;

/// JWT claims embedded in every access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject — user ID (UUID string).
    pub sub: String,
    /// Audience — the principal's role.
    pub aud: String,
    /// Tenant ID (UUID string); absent for platform admins.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    /// Issuer.
    pub iss: String,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
    /// Unique token ID (UUID string).
    pub jti: String,
}

impl AccessTokenClaims {
    /// The role encoded in the audience claim.
    pub fn role(&self) -> Result<Role, AuthError> {
        self.aud
            .parse()
            .map_err(|_| AuthError::TokenInvalid(format!("unknown audience: {}", self.aud)))
    }

    pub fn subject(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.sub).map_err(|e| AuthError::TokenInvalid(format!("bad sub: {e}")))
    }

    pub fn tenant(&self) -> Result<Option<Uuid>, AuthError> {
        self.tenant_id
            .as_deref()
            .map(Uuid::parse_str)
            .transpose()
            .map_err(|e| AuthError::TokenInvalid(format!("bad tenant_id: {e}")))
    }
}

/// Issue a signed access token for a principal. Returns the token and
/// its expiry.
pub fn issue_token(
    principal: &Principal,
    config: &AuthConfig,
) -> Result<(String, DateTime<Utc>), AuthError> {
    let now = Utc::now().timestamp();
    let exp = now + config.token_lifetime_secs as i64;
    let claims = AccessTokenClaims {
        sub: principal.id.to_string(),
        aud: principal.role.as_str().to_string(),
        tenant_id: principal.tenant_id.map(|t| t.to_string()),
        iss: config.issuer.clone(),
        iat: now,
        exp,
        jti: Uuid::new_v4().to_string(),
    };

    let key = EncodingKey::from_secret(config.signing_secret.as_bytes());
    let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &key)
        .map_err(|e| AuthError::Crypto(format!("JWT encode: {e}")))?;

    let expires_at = Utc.timestamp_opt(exp, 0)
        .single()
        .ok_or_else(|| AuthError::Crypto("expiry out of range".into()))?;

    Ok((token, expires_at))
}

/// Decode and verify an access token: signature, issuer, expiry, and —
/// when `expected_audience` is supplied — exact audience equality.
///
/// All failures are typed values; nothing panics across this boundary.
pub fn verify_token(
    token: &str,
    expected_audience: Option<Role>,
    config: &AuthConfig,
) -> Result<AccessTokenClaims, AuthError> {
    let key = DecodingKey::from_secret(config.signing_secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&config.issuer]);
    validation.set_required_spec_claims(&["sub", "exp", "iat", "iss", "aud"]);
    match expected_audience {
        Some(role) => validation.set_audience(&[role.as_str()]),
        // The audience claim is still required and parsed; only the
        // equality check is deferred to the caller's policy.
        None => validation.validate_aud = false,
    }

    let claims = jsonwebtoken::decode::<AccessTokenClaims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            jsonwebtoken::errors::ErrorKind::InvalidAudience => AuthError::AudienceMismatch {
                expected: expected_audience
                    .map(|r| r.as_str().to_string())
                    .unwrap_or_default(),
            },
            _ => AuthError::TokenInvalid(e.to_string()),
        })?;

    // The audience must always name a known role, whatever the caller
    // expected.
    claims.role()?;
    Ok(claims)
}

/// SHA-256 hex digest of a raw token — the session registry key.
pub fn hash_token(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    hex::encode(hasher.finalize())
}
