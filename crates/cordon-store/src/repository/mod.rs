//! In-memory repository implementations.

mod audit;
mod session;
mod tenant;
mod user;

pub use audit::MemoryAuditLogRepository;
pub use session::MemorySessionRepository;
pub use tenant::MemoryTenantRepository;
pub use user::MemoryUserRepository;

use cordon_core::error::CordonError;

fn not_found(entity: &str, id: impl ToString) -> CordonError {
    CordonError::NotFound {
        entity: entity.into(),
        id: id.to_string(),
    }
}
