//! Token service — issuance, stateless verification, and stateful
//! session validation.
//!
//! Generic over repository implementations so that the auth layer has
//! no dependency on the storage crate. Every store call runs under the
//! configured deadline; a slow store denies rather than hangs.

use chrono::Utc;
use uuid::Uuid;

use cordon_core::error::{CordonError, CordonResult};
use cordon_core::models::principal::{Principal, Role};
use cordon_core::models::session::CreateSession;
use cordon_core::models::user::UserStatus;
use cordon_core::repository::{SessionRepository, UserRepository};

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password;
use crate::timeout::bounded;
use crate::token;

/// A freshly issued token and its registry entry.
#[derive(Debug)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: chrono::DateTime<Utc>,
    pub session_id: Uuid,
}

pub struct TokenService<U: UserRepository, S: SessionRepository> {
    user_repo: U,
    session_repo: S,
    config: AuthConfig,
}

impl<U: UserRepository, S: SessionRepository> TokenService<U, S> {
    pub fn new(user_repo: U, session_repo: S, config: AuthConfig) -> Self {
        Self {
            user_repo,
            session_repo,
            config,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Authenticate with email + password and issue a token for the
    /// stored principal.
    pub async fn login(&self, email: &str, password_input: &str) -> CordonResult<IssuedToken> {
        let user = match bounded(
            self.config.store_timeout(),
            self.user_repo.get_by_email(email),
        )
        .await
        {
            Ok(user) => user,
            Err(CordonError::NotFound { .. }) => return Err(AuthError::InvalidCredentials.into()),
            Err(CordonError::StoreTimeout) => return Err(AuthError::StoreTimeout.into()),
            Err(e) => return Err(e),
        };

        let valid = password::verify_password(password_input, &user.password_hash)?;
        if !valid {
            return Err(AuthError::InvalidCredentials.into());
        }
        if user.status != UserStatus::Active {
            return Err(AuthError::AccountInactive.into());
        }

        let principal = user.principal()?;
        self.issue(&principal).await
    }

    /// Sign a token for the principal and create its session registry
    /// entry.
    pub async fn issue(&self, principal: &Principal) -> CordonResult<IssuedToken> {
        let (raw, expires_at) = token::issue_token(principal, &self.config)?;

        let session = bounded(
            self.config.store_timeout(),
            self.session_repo.create(CreateSession {
                user_id: principal.id,
                token_hash: token::hash_token(&raw),
                expires_at,
            }),
        )
        .await?;

        tracing::info!(
            subject = %principal.id,
            audience = %principal.role,
            session = %session.id,
            "token issued"
        );

        Ok(IssuedToken {
            token: raw,
            expires_at,
            session_id: session.id,
        })
    }

    /// Stateless verification: signature, issuer, expiry, audience.
    pub fn verify(
        &self,
        raw: &str,
        expected_audience: Option<Role>,
    ) -> Result<token::AccessTokenClaims, AuthError> {
        token::verify_token(raw, expected_audience, &self.config)
    }

    /// Full validation: [`Self::verify`] composed with the session
    /// registry and the live user record.
    ///
    /// The session must exist and be unexpired, reference the token's
    /// subject, and the stored user must still be active with the same
    /// role — and, for tenant-scoped roles, the same tenant — as the
    /// token claims. Any mismatch deletes the session and fails: the
    /// live principal record is the source of truth for membership,
    /// not the token.
    pub async fn validate_session(
        &self,
        raw: &str,
        expected_audience: Option<Role>,
    ) -> Result<Principal, AuthError> {
        let claims = self.verify(raw, expected_audience)?;
        let token_hash = token::hash_token(raw);

        let session = match bounded(
            self.config.store_timeout(),
            self.session_repo.get_by_token_hash(&token_hash),
        )
        .await
        {
            Ok(session) => session,
            Err(CordonError::NotFound { .. }) => return Err(AuthError::SessionRevoked),
            Err(CordonError::StoreTimeout) => return Err(AuthError::StoreTimeout),
            Err(e) => return Err(AuthError::Store(e.to_string())),
        };

        if session.expires_at <= Utc::now() {
            self.discard_session(&token_hash).await;
            return Err(AuthError::TokenExpired);
        }

        let subject = claims.subject()?;
        if session.user_id != subject {
            self.discard_session(&token_hash).await;
            return Err(AuthError::SessionMismatch(
                "session subject differs from token subject".into(),
            ));
        }

        let user = match bounded(
            self.config.store_timeout(),
            self.user_repo.get_by_id(subject),
        )
        .await
        {
            Ok(user) => user,
            Err(CordonError::NotFound { .. }) => {
                self.discard_session(&token_hash).await;
                return Err(AuthError::SessionMismatch("stored user no longer exists".into()));
            }
            Err(CordonError::StoreTimeout) => return Err(AuthError::StoreTimeout),
            Err(e) => return Err(AuthError::Store(e.to_string())),
        };

        if user.status != UserStatus::Active {
            self.discard_session(&token_hash).await;
            return Err(AuthError::AccountInactive);
        }

        // Role changes invalidate outstanding tokens.
        if user.role.as_str() != claims.aud {
            self.discard_session(&token_hash).await;
            tracing::warn!(
                subject = %subject,
                token_role = %claims.aud,
                stored_role = %user.role,
                "role changed since issuance; session invalidated"
            );
            return Err(AuthError::SessionMismatch("role changed since issuance".into()));
        }

        // Tenant reassignment invalidates outstanding tokens.
        if user.role.requires_tenant() && user.tenant_id != claims.tenant()? {
            self.discard_session(&token_hash).await;
            tracing::warn!(
                subject = %subject,
                "tenant changed since issuance; session invalidated"
            );
            return Err(AuthError::SessionMismatch(
                "tenant changed since issuance".into(),
            ));
        }

        user.principal().map_err(|e| AuthError::Store(e.to_string()))
    }

    /// Delete the session for a presented token (logout). Succeeds
    /// even if the session is already gone.
    pub async fn logout(&self, raw: &str) -> CordonResult<()> {
        let token_hash = token::hash_token(raw);
        bounded(
            self.config.store_timeout(),
            self.session_repo.delete_by_token_hash(&token_hash),
        )
        .await
    }

    /// Revoke every session for a user (e.g., on password change or
    /// tenant reassignment).
    pub async fn revoke_user_sessions(&self, user_id: Uuid) -> CordonResult<u64> {
        bounded(
            self.config.store_timeout(),
            self.session_repo.delete_for_user(user_id),
        )
        .await
    }

    /// Remove sessions past their expiry; returns the count swept.
    pub async fn sweep_expired(&self) -> CordonResult<u64> {
        bounded(
            self.config.store_timeout(),
            self.session_repo.delete_expired(Utc::now()),
        )
        .await
    }

    /// Best effort: the caller is already failing closed, so a delete
    /// error is logged rather than masking the validation outcome.
    async fn discard_session(&self, token_hash: &str) {
        if let Err(e) = bounded(
            self.config.store_timeout(),
            self.session_repo.delete_by_token_hash(token_hash),
        )
        .await
        {
            tracing::warn!(error = %e, "failed to delete invalidated session");
        }
    }
}
