//! Authenticated principal and the closed role set.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CordonError;

/// The closed set of roles a principal can hold.
///
/// The string form doubles as the token audience claim, so the
/// round-trip through [`Role::as_str`] and [`FromStr`] is the only
/// place role names exist as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    PlatformAdmin,
    TenantAdmin,
    Member,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::PlatformAdmin => "platform_admin",
            Role::TenantAdmin => "tenant_admin",
            Role::Member => "member",
        }
    }

    /// Whether this role is bound to a single tenant.
    pub fn requires_tenant(&self) -> bool {
        !matches!(self, Role::PlatformAdmin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CordonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "platform_admin" => Ok(Role::PlatformAdmin),
            "tenant_admin" => Ok(Role::TenantAdmin),
            "member" => Ok(Role::Member),
            other => Err(CordonError::Validation {
                message: format!("unknown role: {other}"),
            }),
        }
    }
}

/// An authenticated identity, built from the stored user record at
/// authentication time and never mutated within a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: Uuid,
    pub role: Role,
    pub tenant_id: Option<Uuid>,
}

impl Principal {
    /// Construct a principal, enforcing the role/tenant invariant:
    /// tenant-scoped roles require a tenant id, `PlatformAdmin`
    /// forbids one.
    pub fn new(id: Uuid, role: Role, tenant_id: Option<Uuid>) -> Result<Self, CordonError> {
        match (role.requires_tenant(), tenant_id) {
            (true, None) => Err(CordonError::Validation {
                message: format!("role {role} requires a tenant id"),
            }),
            (false, Some(_)) => Err(CordonError::Validation {
                message: format!("role {role} must not carry a tenant id"),
            }),
            _ => Ok(Self {
                id,
                role,
                tenant_id,
            }),
        }
    }
}
