//! CORDON Store — In-memory implementations of the Credential Store
//! traits.
//!
//! Backed by concurrent maps so deletions are immediately visible to
//! subsequent lookups of the same key (read-your-writes). Suitable
//! for tests and single-node deployments; a distributed store slots
//! in behind the same `cordon-core` traits without touching call
//! sites.

pub mod repository;

pub use repository::{
    MemoryAuditLogRepository, MemorySessionRepository, MemoryTenantRepository,
    MemoryUserRepository,
};
