//! Allocation record persistence

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::RwLock;

use crate::context::RequestContext;
use crate::error::StoreError;
use share_net_types::{
    AllocationRecord, AllocationUpdate, NetworkSpecUpdate, NetworkSpecification,
};

/// Persistence for allocation records and share network specifications.
///
/// Every call commits on its own; nothing spans the store and the provider.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait AllocationStore: Send + Sync {
    async fn get_allocations_for_server(
        &self,
        ctx: &RequestContext,
        server_id: &str,
    ) -> Result<Vec<AllocationRecord>, StoreError>;

    async fn create_allocation(
        &self,
        ctx: &RequestContext,
        record: AllocationRecord,
    ) -> Result<AllocationRecord, StoreError>;

    async fn update_allocation(
        &self,
        ctx: &RequestContext,
        id: &str,
        update: AllocationUpdate,
    ) -> Result<AllocationRecord, StoreError>;

    async fn delete_allocation(&self, ctx: &RequestContext, id: &str) -> Result<(), StoreError>;

    async fn update_network_spec(
        &self,
        ctx: &RequestContext,
        id: &str,
        update: NetworkSpecUpdate,
    ) -> Result<NetworkSpecification, StoreError>;
}

/// In-memory allocation store
///
/// Keeps allocations in insertion order so that per-server listings are
/// stable.
#[derive(Clone, Default)]
pub struct MemoryAllocationStore {
    allocations: Arc<RwLock<IndexMap<String, AllocationRecord>>>,
    networks: Arc<RwLock<HashMap<String, NetworkSpecification>>>,
}

impl MemoryAllocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a share network specification. Specifications without a
    /// record id cannot be stored.
    pub async fn insert_network_spec(&self, spec: NetworkSpecification) -> Result<(), StoreError> {
        let id = spec.id.clone().ok_or_else(|| StoreError::Backend {
            message: "network specification has no id".to_string(),
        })?;
        self.networks.write().await.insert(id, spec);
        Ok(())
    }

    pub async fn network_spec(&self, id: &str) -> Option<NetworkSpecification> {
        self.networks.read().await.get(id).cloned()
    }

    pub async fn allocation(&self, id: &str) -> Option<AllocationRecord> {
        self.allocations.read().await.get(id).cloned()
    }

    pub async fn allocation_count(&self) -> usize {
        self.allocations.read().await.len()
    }
}

#[async_trait]
impl AllocationStore for MemoryAllocationStore {
    async fn get_allocations_for_server(
        &self,
        _ctx: &RequestContext,
        server_id: &str,
    ) -> Result<Vec<AllocationRecord>, StoreError> {
        let allocations = self.allocations.read().await;
        Ok(allocations
            .values()
            .filter(|record| record.share_server_id == server_id)
            .cloned()
            .collect())
    }

    async fn create_allocation(
        &self,
        _ctx: &RequestContext,
        record: AllocationRecord,
    ) -> Result<AllocationRecord, StoreError> {
        let mut allocations = self.allocations.write().await;
        if allocations.contains_key(&record.id) {
            return Err(StoreError::Conflict {
                kind: "network allocation",
                id: record.id,
            });
        }

        allocations.insert(record.id.clone(), record.clone());
        log::debug!(
            "Stored network allocation {} for share server {}",
            record.id,
            record.share_server_id
        );
        Ok(record)
    }

    async fn update_allocation(
        &self,
        _ctx: &RequestContext,
        id: &str,
        update: AllocationUpdate,
    ) -> Result<AllocationRecord, StoreError> {
        let mut allocations = self.allocations.write().await;
        let record = allocations
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound {
                kind: "network allocation",
                id: id.to_string(),
            })?;

        if let Some(status) = update.status {
            record.status = status;
        }
        record.updated_at = Some(chrono::Utc::now());

        Ok(record.clone())
    }

    async fn delete_allocation(&self, _ctx: &RequestContext, id: &str) -> Result<(), StoreError> {
        let mut allocations = self.allocations.write().await;
        allocations
            .shift_remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound {
                kind: "network allocation",
                id: id.to_string(),
            })
    }

    async fn update_network_spec(
        &self,
        _ctx: &RequestContext,
        id: &str,
        update: NetworkSpecUpdate,
    ) -> Result<NetworkSpecification, StoreError> {
        let mut networks = self.networks.write().await;
        let spec = networks.get_mut(id).ok_or_else(|| StoreError::NotFound {
            kind: "share network",
            id: id.to_string(),
        })?;

        spec.apply(&update);
        Ok(spec.clone())
    }
}
