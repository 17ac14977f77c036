//! User domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CordonError;
use crate::models::principal::{Principal, Role};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum UserStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    /// Present for tenant-scoped roles, absent for platform admins.
    pub tenant_id: Option<Uuid>,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Build the request principal from this record. The stored user
    /// is the live source of truth for role and tenant membership.
    pub fn principal(&self) -> Result<Principal, CordonError> {
        Principal::new(self.id, self.role, self.tenant_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub tenant_id: Option<Uuid>,
    pub email: String,
    /// Raw password (hashed with Argon2id before storage).
    pub password: String,
    pub role: Role,
}

/// Fields that can be updated on an existing user.
///
/// There is deliberately no tenant field here: tenant membership is
/// never writable through an update payload.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateUser {
    pub email: Option<String>,
    pub role: Option<Role>,
    pub status: Option<UserStatus>,
}
