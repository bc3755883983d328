//! # Orchestration Core
//!
//! Shared state of the orchestration engine: configuration, repositories,
//! messaging, infrastructure, events and the worker pool. Every task runs
//! against one [`OrchestrationCore`], and the helpers here are the only write
//! paths tasks use for function and service records.

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::deployment::DeploymentCoordinator;
use super::executor::TaskExecutor;
use super::reconciler::{ReconcileOutcome, StatusReconciler};
use crate::config::{ConfigLoader, NfvoConfig};
use crate::error::{NfvoResult, RepositoryError};
use crate::events::EventPublisher;
use crate::messaging::{Action, ManagerRegistry, MessagingGateway, VnfmSender};
use crate::models::{Entity, FunctionRecord, ServiceRecord};
use crate::repository::Repositories;
use crate::vim::VimBroker;

pub struct OrchestrationCore {
    pub config: Arc<NfvoConfig>,

    pub repositories: Repositories,

    /// Outbound path to the agents
    pub gateway: MessagingGateway,

    /// VIM implementations keyed by VIM type
    pub vims: VimBroker,

    pub events: EventPublisher,

    /// Serialized aggregation of service record status
    pub reconciler: StatusReconciler,

    /// Ordered deployment sessions
    pub deployments: DeploymentCoordinator,

    /// Worker pool running one task per dispatched message
    pub executor: TaskExecutor,
}

impl OrchestrationCore {
    /// Build the core with configuration loaded from `config/` and the
    /// environment. Must be called within a tokio runtime.
    pub fn new(vims: VimBroker, senders: Vec<Arc<dyn VnfmSender>>) -> NfvoResult<Self> {
        info!("🔧 Initializing OrchestrationCore with auto-detected environment configuration");
        let config = ConfigLoader::load()?;
        Ok(Self::from_config(
            config,
            Repositories::in_memory(),
            ManagerRegistry::new(),
            vims,
            senders,
        ))
    }

    /// Build the core from explicit collaborators.
    pub fn from_config(
        config: NfvoConfig,
        repositories: Repositories,
        managers: ManagerRegistry,
        vims: VimBroker,
        senders: Vec<Arc<dyn VnfmSender>>,
    ) -> Self {
        let config = Arc::new(config);
        let gateway = MessagingGateway::new(managers, senders);
        let events = EventPublisher::new(config.events.channel_capacity);
        let reconciler = StatusReconciler::new(repositories.clone(), events.clone());
        let deployments =
            DeploymentCoordinator::new(Arc::clone(&config), repositories.clone(), gateway.clone());
        let executor = TaskExecutor::new(config.orchestration.executor.clone());

        info!(
            ordered = config.orchestration.ordered,
            vim_types = ?vims.vim_types(),
            "✅ OrchestrationCore initialized"
        );

        Self {
            config,
            repositories,
            gateway,
            vims,
            events,
            reconciler,
            deployments,
            executor,
        }
    }

    /// Publish the event of `action` for `record`, then reconcile its service
    /// record unless the action leaves the aggregate untouched.
    pub async fn action_finished(
        &self,
        action: Action,
        record: &FunctionRecord,
    ) -> NfvoResult<Option<ReconcileOutcome>> {
        let context = serde_json::to_value(record).unwrap_or_else(|error| {
            warn!(
                action = %action,
                function_record_id = %record.id,
                error = %error,
                "🏁 FINISH: Function record not serializable, publishing without context"
            );
            Value::Null
        });
        self.events.publish(action, context).await;

        if action.skips_reconciliation() {
            debug!(action = %action, function_record_id = %record.id, "🏁 FINISH: Reconciliation skipped");
            return Ok(None);
        }
        if record.parent_id.is_none() {
            return Ok(None);
        }
        self.reconciler.reconcile(record).await.map(Some)
    }

    /// Persist a function record. Agents send copies with stale versions, so a
    /// conflict adopts the stored version and writes again.
    pub async fn persist_function(&self, mut record: FunctionRecord) -> NfvoResult<FunctionRecord> {
        loop {
            match self.repositories.function_records.save(record.clone()).await {
                Ok(saved) => return Ok(saved),
                Err(RepositoryError::Conflict { actual, .. }) => {
                    debug!(
                        function_record_id = %record.id,
                        stale = record.version(),
                        actual = actual,
                        "💾 PERSIST: Adopting stored version"
                    );
                    record.set_version(actual);
                }
                Err(error) => return Err(error.into()),
            }
        }
    }

    /// Add `record` to the records owned by its service record.
    ///
    /// A missing service record is not an error: it may already be released.
    /// That includes one deleted between the read and the write, which the
    /// repository reports as a conflict.
    pub async fn attach_to_service(&self, record: &FunctionRecord) -> NfvoResult<()> {
        let Some(parent_id) = record.parent_id.as_deref() else {
            return Ok(());
        };

        loop {
            let Some(mut service_record) = self.repositories.service_records.find_by_id(parent_id).await? else {
                warn!(
                    service_record_id = %parent_id,
                    function_record_id = %record.id,
                    "💾 PERSIST: Owning service record no longer exists"
                );
                return Ok(());
            };
            if !service_record.attach(&record.id) {
                return Ok(());
            }
            match self.repositories.service_records.save(service_record).await {
                Ok(_) => return Ok(()),
                Err(error) if error.is_conflict() => continue,
                Err(error) => return Err(error.into()),
            }
        }
    }

    /// The service record owning `record`, if it still exists.
    pub async fn parent_of(&self, record: &FunctionRecord) -> NfvoResult<Option<ServiceRecord>> {
        match record.parent_id.as_deref() {
            Some(parent_id) => Ok(self.repositories.service_records.find_by_id(parent_id).await?),
            None => Ok(None),
        }
    }

    /// Stop accepting new tasks.
    pub fn shutdown(&self) {
        self.executor.shutdown();
    }
}

impl std::fmt::Debug for OrchestrationCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrchestrationCore")
            .field("config", &self.config)
            .field("gateway", &self.gateway)
            .field("vims", &self.vims)
            .field("executor", &self.executor)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FunctionDescriptor, ServiceDescriptor, Status};
    use crate::repository::{InMemoryRepository, Repository, RepositoryResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Service record store whose first read races a release: the record is
    /// returned, then deleted before the caller can write it back.
    #[derive(Default)]
    struct ReleasedAfterRead {
        inner: InMemoryRepository<ServiceRecord>,
        released: AtomicBool,
    }

    #[async_trait]
    impl Repository<ServiceRecord> for ReleasedAfterRead {
        async fn exists(&self, id: &str) -> RepositoryResult<bool> {
            self.inner.exists(id).await
        }

        async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<ServiceRecord>> {
            let found = self.inner.find_by_id(id).await?;
            if !self.released.swap(true, Ordering::SeqCst) {
                self.inner.delete(id).await?;
            }
            Ok(found)
        }

        async fn find_all(&self) -> RepositoryResult<Vec<ServiceRecord>> {
            self.inner.find_all().await
        }

        async fn save(&self, entity: ServiceRecord) -> RepositoryResult<ServiceRecord> {
            self.inner.save(entity).await
        }

        async fn delete(&self, id: &str) -> RepositoryResult<bool> {
            self.inner.delete(id).await
        }
    }

    fn core() -> OrchestrationCore {
        OrchestrationCore::from_config(
            NfvoConfig::default(),
            Repositories::in_memory(),
            ManagerRegistry::new(),
            VimBroker::new(),
            Vec::new(),
        )
    }

    #[tokio::test]
    async fn test_persist_function_adopts_stored_version() {
        let core = core();
        let record = FunctionRecord::new("vnf", "generic");
        let first = core.persist_function(record.clone()).await.unwrap();
        assert_eq!(first.version, 1);

        // A copy coming back from an agent still carries version 0
        let mut stale = record;
        stale.status = Status::Active;
        let second = core.persist_function(stale).await.unwrap();
        assert_eq!(second.version, 2);
        assert_eq!(second.status, Status::Active);
    }

    #[tokio::test]
    async fn test_attach_to_service_is_idempotent() {
        let core = core();
        let service_record = core
            .repositories
            .service_records
            .save(ServiceRecord::new("ns", "nsd"))
            .await
            .unwrap();
        let record = FunctionRecord::new("vnf", "generic").with_parent(service_record.id.clone());

        core.attach_to_service(&record).await.unwrap();
        core.attach_to_service(&record).await.unwrap();

        let stored = core.parent_of(&record).await.unwrap().unwrap();
        assert_eq!(stored.function_record_ids, vec![record.id.clone()]);
    }

    #[tokio::test]
    async fn test_attach_without_parent_is_noop() {
        let core = core();
        let record = FunctionRecord::new("vnf", "generic").with_parent("gone");
        core.attach_to_service(&record).await.unwrap();
        assert!(core.parent_of(&record).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_attach_does_not_revive_released_service_record() {
        let store = Arc::new(ReleasedAfterRead::default());
        let service_record = store.inner.save(ServiceRecord::new("ns", "nsd")).await.unwrap();
        let repositories = Repositories {
            service_records: Arc::clone(&store) as Arc<dyn Repository<ServiceRecord>>,
            ..Repositories::in_memory()
        };
        let core = OrchestrationCore::from_config(
            NfvoConfig::default(),
            repositories,
            ManagerRegistry::new(),
            VimBroker::new(),
            Vec::new(),
        );

        let record = FunctionRecord::new("vnf", "generic").with_parent(service_record.id.clone());
        core.attach_to_service(&record).await.unwrap();

        assert!(!store.inner.exists(&service_record.id).await.unwrap());
        assert!(store.inner.is_empty());
    }

    #[tokio::test]
    async fn test_action_finished_reconciles_unless_skipped() {
        let core = core();
        let mut descriptor = ServiceDescriptor::new("ns");
        let function = FunctionDescriptor::new("vnf", "generic");
        let service_record = ServiceRecord::new("ns", descriptor.id.clone());
        let mut record = FunctionRecord::new("vnf", "generic")
            .with_parent(service_record.id.clone())
            .with_status(Status::Inactive);
        record.descriptor_reference = function.id.clone();
        descriptor.functions.push(function);

        core.repositories.service_descriptors.save(descriptor).await.unwrap();
        core.repositories.service_records.save(service_record).await.unwrap();
        let record = core.persist_function(record).await.unwrap();
        core.attach_to_service(&record).await.unwrap();

        let mut events = core.events.subscribe();
        let skipped = core.action_finished(Action::GrantOperation, &record).await.unwrap();
        assert!(skipped.is_none());
        assert_eq!(events.recv().await.unwrap().action, Action::GrantOperation);

        let outcome = core.action_finished(Action::Modify, &record).await.unwrap();
        assert_eq!(outcome, Some(ReconcileOutcome::Updated(Status::Inactive)));
    }
}
