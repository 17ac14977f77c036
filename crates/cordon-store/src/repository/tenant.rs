//! In-memory implementation of [`TenantRepository`].

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use cordon_core::error::{CordonError, CordonResult};
use cordon_core::models::tenant::{CreateTenant, Tenant};
use cordon_core::repository::{PaginatedResult, Pagination, TenantRepository};

use super::not_found;

#[derive(Clone, Default)]
pub struct MemoryTenantRepository {
    tenants: Arc<DashMap<Uuid, Tenant>>,
}

impl MemoryTenantRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TenantRepository for MemoryTenantRepository {
    async fn create(&self, input: CreateTenant) -> CordonResult<Tenant> {
        if self
            .tenants
            .iter()
            .any(|entry| entry.slug == input.slug)
        {
            return Err(CordonError::AlreadyExists {
                entity: format!("tenant with slug {}", input.slug),
            });
        }

        let tenant = Tenant {
            id: Uuid::new_v4(),
            name: input.name,
            slug: input.slug,
            created_at: Utc::now(),
        };
        self.tenants.insert(tenant.id, tenant.clone());
        Ok(tenant)
    }

    async fn get_by_id(&self, id: Uuid) -> CordonResult<Tenant> {
        self.tenants
            .get(&id)
            .map(|entry| entry.clone())
            .ok_or_else(|| not_found("tenant", id))
    }

    async fn list(&self, pagination: Pagination) -> CordonResult<PaginatedResult<Tenant>> {
        let mut all: Vec<Tenant> = self.tenants.iter().map(|entry| entry.clone()).collect();
        all.sort_by_key(|t| t.created_at);

        let total = all.len() as u64;
        let items = all
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
