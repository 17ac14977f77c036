//! In-memory implementation of [`SessionRepository`].
//!
//! Keyed by token hash. Removals are visible to any subsequent lookup
//! of the same hash, which is what session revocation relies on.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use cordon_core::error::CordonResult;
use cordon_core::models::session::{CreateSession, Session};
use cordon_core::repository::SessionRepository;

use super::not_found;

#[derive(Clone, Default)]
pub struct MemorySessionRepository {
    sessions: Arc<DashMap<String, Session>>,
}

impl MemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries, expired included until swept.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl SessionRepository for MemorySessionRepository {
    async fn create(&self, input: CreateSession) -> CordonResult<Session> {
        let session = Session {
            id: Uuid::new_v4(),
            user_id: input.user_id,
            token_hash: input.token_hash.clone(),
            expires_at: input.expires_at,
            created_at: Utc::now(),
        };
        self.sessions.insert(input.token_hash, session.clone());
        Ok(session)
    }

    async fn get_by_token_hash(&self, token_hash: &str) -> CordonResult<Session> {
        self.sessions
            .get(token_hash)
            .map(|entry| entry.clone())
            .ok_or_else(|| not_found("session", token_hash))
    }

    async fn delete_by_token_hash(&self, token_hash: &str) -> CordonResult<()> {
        self.sessions.remove(token_hash);
        Ok(())
    }

    async fn delete_for_user(&self, user_id: Uuid) -> CordonResult<u64> {
        let before = self.sessions.len();
        self.sessions.retain(|_, session| session.user_id != user_id);
        Ok((before - self.sessions.len()) as u64)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> CordonResult<u64> {
        let before = self.sessions.len();
        self.sessions.retain(|_, session| session.expires_at > now);
        Ok((before - self.sessions.len()) as u64)
    }
}
