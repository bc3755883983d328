use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

use super::{Repository, RepositoryResult};
use crate::error::RepositoryError;
use crate::models::Entity;

/// In-process repository with compare-and-set writes.
///
/// Saving a new entity (version 0) inserts it at version 1. Saving a present
/// entity requires the caller's version to equal the stored version and bumps
/// it. A versioned entity whose entry is gone was deleted after the caller
/// read it, so the save conflicts with `actual == 0` instead of reviving it.
#[derive(Debug)]
pub struct InMemoryRepository<T: Entity> {
    entries: Arc<DashMap<String, T>>,
}

impl<T: Entity> InMemoryRepository<T> {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Entity> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> Clone for InMemoryRepository<T> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

#[async_trait]
impl<T: Entity> Repository<T> for InMemoryRepository<T> {
    async fn exists(&self, id: &str) -> RepositoryResult<bool> {
        Ok(self.entries.contains_key(id))
    }

    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<T>> {
        Ok(self.entries.get(id).map(|entry| entry.value().clone()))
    }

    async fn find_all(&self) -> RepositoryResult<Vec<T>> {
        Ok(self
            .entries
            .iter()
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn save(&self, mut entity: T) -> RepositoryResult<T> {
        match self.entries.entry(entity.id().to_string()) {
            Entry::Vacant(_) if entity.version() > 0 => Err(RepositoryError::Conflict {
                entity: T::KIND,
                id: entity.id().to_string(),
                expected: entity.version(),
                actual: 0,
            }),
            Entry::Vacant(vacant) => {
                entity.set_version(1);
                vacant.insert(entity.clone());
                Ok(entity)
            }
            Entry::Occupied(mut occupied) => {
                let actual = occupied.get().version();
                if actual != entity.version() {
                    return Err(RepositoryError::Conflict {
                        entity: T::KIND,
                        id: entity.id().to_string(),
                        expected: entity.version(),
                        actual,
                    });
                }
                entity.set_version(actual + 1);
                occupied.insert(entity.clone());
                Ok(entity)
            }
        }
    }

    async fn delete(&self, id: &str) -> RepositoryResult<bool> {
        Ok(self.entries.remove(id).is_some())
    }
}
