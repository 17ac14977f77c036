//! In-memory implementation of [`UserRepository`].
//!
//! Password hashing uses Argon2id with default parameters and a
//! per-hash random salt, matching what the auth crate verifies
//! against.

use std::sync::Arc;

use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHasher};
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use cordon_core::error::{CordonError, CordonResult};
use cordon_core::models::user::{CreateUser, UpdateUser, User, UserStatus};
use cordon_core::repository::{PaginatedResult, Pagination, UserRepository};

use super::not_found;

#[derive(Clone, Default)]
pub struct MemoryUserRepository {
    users: Arc<DashMap<Uuid, User>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn hash_password(password: &str) -> CordonResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| CordonError::Crypto(format!("password hash: {e}")))
    }
}

impl UserRepository for MemoryUserRepository {
    async fn create(&self, input: CreateUser) -> CordonResult<User> {
        if input.role.requires_tenant() != input.tenant_id.is_some() {
            return Err(CordonError::Validation {
                message: format!("role {} and tenant id disagree", input.role),
            });
        }
        if self
            .users
            .iter()
            .any(|entry| entry.email.eq_ignore_ascii_case(&input.email))
        {
            return Err(CordonError::AlreadyExists {
                entity: format!("user with email {}", input.email),
            });
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            tenant_id: input.tenant_id,
            email: input.email,
            password_hash: Self::hash_password(&input.password)?,
            role: input.role,
            status: UserStatus::Active,
            created_at: now,
            updated_at: now,
        };
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_by_id(&self, id: Uuid) -> CordonResult<User> {
        self.users
            .get(&id)
            .map(|entry| entry.clone())
            .ok_or_else(|| not_found("user", id))
    }

    async fn get_by_email(&self, email: &str) -> CordonResult<User> {
        self.users
            .iter()
            .find(|entry| entry.email.eq_ignore_ascii_case(email))
            .map(|entry| entry.clone())
            .ok_or_else(|| not_found("user", email))
    }

    async fn update(&self, id: Uuid, input: UpdateUser) -> CordonResult<User> {
        let mut entry = self.users.get_mut(&id).ok_or_else(|| not_found("user", id))?;
        let user = entry.value_mut();

        if let Some(email) = input.email {
            user.email = email;
        }
        if let Some(role) = input.role {
            if role.requires_tenant() != user.tenant_id.is_some() {
                return Err(CordonError::Validation {
                    message: format!("role {role} and stored tenant id disagree"),
                });
            }
            user.role = role;
        }
        if let Some(status) = input.status {
            user.status = status;
        }
        user.updated_at = Utc::now();

        Ok(user.clone())
    }

    async fn delete(&self, id: Uuid) -> CordonResult<()> {
        let mut entry = self.users.get_mut(&id).ok_or_else(|| not_found("user", id))?;
        entry.value_mut().status = UserStatus::Inactive;
        entry.value_mut().updated_at = Utc::now();
        Ok(())
    }

    async fn list_by_tenant(
        &self,
        tenant_id: Uuid,
        pagination: Pagination,
    ) -> CordonResult<PaginatedResult<User>> {
        let mut matching: Vec<User> = self
            .users
            .iter()
            .filter(|entry| entry.tenant_id == Some(tenant_id))
            .map(|entry| entry.clone())
            .collect();
        matching.sort_by_key(|u| u.created_at);

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(pagination.offset as usize)
            .take(pagination.limit as usize)
            .collect();

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
