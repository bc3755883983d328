//! # Repositories
//!
//! Collection-style persistence contract consumed by the orchestration core.
//! Writes are version-checked: saving an entity whose version no longer
//! matches the stored one fails with [`RepositoryError::Conflict`], which the
//! caller is expected to resolve by re-reading and retrying.
//!
//! ```rust
//! use nfvo_core::models::ServiceRecord;
//! use nfvo_core::repository::{InMemoryRepository, Repository};
//!
//! # tokio_test::block_on(async {
//! let repository = InMemoryRepository::<ServiceRecord>::new();
//! let saved = repository.save(ServiceRecord::new("ns", "nsd-1")).await.unwrap();
//! assert_eq!(saved.version, 1);
//!
//! let stale = saved.clone();
//! repository.save(saved).await.unwrap();
//! assert!(repository.save(stale).await.unwrap_err().is_conflict());
//! # });
//! ```

pub mod memory;

pub use memory::InMemoryRepository;

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::RepositoryError;
use crate::models::{
    Entity, FunctionRecord, InfrastructureInstance, ServiceDescriptor, ServiceRecord,
};

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    async fn exists(&self, id: &str) -> RepositoryResult<bool>;

    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<T>>;

    async fn find_all(&self) -> RepositoryResult<Vec<T>>;

    /// Persist `entity`, returning it with its new version.
    async fn save(&self, entity: T) -> RepositoryResult<T>;

    /// Remove the entity; returns whether it existed.
    async fn delete(&self, id: &str) -> RepositoryResult<bool>;
}

/// The set of repositories the orchestration core reads and writes.
#[derive(Clone)]
pub struct Repositories {
    pub service_descriptors: Arc<dyn Repository<ServiceDescriptor>>,
    pub service_records: Arc<dyn Repository<ServiceRecord>>,
    pub function_records: Arc<dyn Repository<FunctionRecord>>,
    pub vim_instances: Arc<dyn Repository<InfrastructureInstance>>,
}

impl Repositories {
    /// Repositories backed by [`InMemoryRepository`].
    pub fn in_memory() -> Self {
        Self {
            service_descriptors: Arc::new(InMemoryRepository::new()),
            service_records: Arc::new(InMemoryRepository::new()),
            function_records: Arc::new(InMemoryRepository::new()),
            vim_instances: Arc::new(InMemoryRepository::new()),
        }
    }

    /// All function records owned by a service record.
    pub async fn functions_of(&self, service_record: &ServiceRecord) -> RepositoryResult<Vec<FunctionRecord>> {
        let mut records = Vec::with_capacity(service_record.function_record_ids.len());
        for id in &service_record.function_record_ids {
            if let Some(record) = self.function_records.find_by_id(id).await? {
                records.push(record);
            }
        }
        Ok(records)
    }
}

impl std::fmt::Debug for Repositories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repositories").finish_non_exhaustive()
    }
}
