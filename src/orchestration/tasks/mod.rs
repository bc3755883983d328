//! # Lifecycle Tasks
//!
//! One handler per inbound action. Handlers are stateless: everything an
//! invocation needs is in its [`TaskContext`], built from exactly one
//! [`LifecycleMessage`].
//!
//! ## Dispatch table
//!
//! ```text
//! INSTANTIATE        -> InstantiateTask
//! ERROR              -> ErrorTask
//! SCALED             -> ScaledTask
//! HEAL               -> HealTask
//! SCALING            -> ScalingTask          (returning)
//! ALLOCATE_RESOURCES -> AllocateResourcesTask (returning)
//! RELEASE_RESOURCES  -> ReleaseResourcesTask
//! GRANT_OPERATION    -> GrantOperationTask   (returning)
//! UPDATEVNFR         -> UpdateRecordTask     (returning)
//! MODIFY | START | STOP | CONFIGURE -> PersistTask
//! ```

pub mod allocate;
pub mod error;
pub mod generic;
pub mod grant;
pub mod heal;
pub mod instantiate;
pub mod release;
pub mod scaled;
pub mod scaling;
pub mod update;

pub use allocate::AllocateResourcesTask;
pub use error::ErrorTask;
pub use generic::PersistTask;
pub use grant::GrantOperationTask;
pub use heal::HealTask;
pub use instantiate::InstantiateTask;
pub use release::ReleaseResourcesTask;
pub use scaled::ScaledTask;
pub use scaling::ScalingTask;
pub use update::UpdateRecordTask;

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::info;

use super::core::OrchestrationCore;
use crate::error::{NfvoError, NfvoResult};
use crate::messaging::{Action, LifecycleMessage};
use crate::models::{ComponentInstance, FunctionRecord, InfrastructureInstance, Key, RecordDependency};

/// Action-specific fields extracted from a message.
#[derive(Debug, Clone, Default)]
pub enum TaskPayload {
    #[default]
    None,
    Error {
        cause: String,
    },
    Scaled {
        component_instance: Option<ComponentInstance>,
    },
    Healed {
        component_instance: Option<ComponentInstance>,
        cause: String,
    },
    Scaling {
        user_data: Option<String>,
    },
    AllocateResources {
        vims: BTreeMap<String, InfrastructureInstance>,
        user_data: Option<String>,
        keys: Vec<Key>,
    },
    Dependency(Option<RecordDependency>),
}

/// Everything one task invocation works on.
#[derive(Debug, Clone)]
pub struct TaskContext {
    pub action: Action,
    pub record: FunctionRecord,
    pub payload: TaskPayload,
}

impl TaskContext {
    /// Split an inbound message into its record and action-specific payload.
    pub fn from_message(message: LifecycleMessage) -> NfvoResult<Self> {
        let action = message.action();
        let (record, payload) = match message {
            LifecycleMessage::Instantiated { record } => (record, TaskPayload::None),
            LifecycleMessage::Error { record, cause, .. } => (record, TaskPayload::Error { cause }),
            LifecycleMessage::Scaled {
                record,
                component_instance,
            } => (record, TaskPayload::Scaled { component_instance }),
            LifecycleMessage::Healed {
                record,
                component_instance,
                cause,
            } => (
                record,
                TaskPayload::Healed {
                    component_instance,
                    cause,
                },
            ),
            LifecycleMessage::Scaling { record, user_data } => (record, TaskPayload::Scaling { user_data }),
            LifecycleMessage::AllocateResources {
                record,
                vims,
                user_data,
                keys,
            } => (
                record,
                TaskPayload::AllocateResources {
                    vims,
                    user_data,
                    keys,
                },
            ),
            LifecycleMessage::Generic {
                record, dependency, ..
            } => (record, TaskPayload::Dependency(dependency)),
            outbound @ (LifecycleMessage::InstantiateRequest(_)
            | LifecycleMessage::Granted { .. }
            | LifecycleMessage::ScaleOut(_)
            | LifecycleMessage::ScaleIn { .. }) => {
                return Err(NfvoError::InvalidMessage(format!(
                    "{} is sent by the orchestrator and cannot be dispatched",
                    outbound.action()
                )));
            }
        };

        Ok(Self {
            action,
            record,
            payload,
        })
    }
}

/// Handler of one lifecycle action.
#[async_trait]
pub trait LifecycleTask: Send + Sync {
    fn action(&self) -> Action;

    /// Task name recorded on the function record.
    fn name(&self) -> &'static str;

    /// Run the task. Returning actions produce the reply to send back.
    async fn execute(
        &self,
        core: Arc<OrchestrationCore>,
        context: TaskContext,
    ) -> NfvoResult<Option<LifecycleMessage>>;
}

/// Closed table of task handlers keyed by action.
#[derive(Clone, Default)]
pub struct TaskRegistry {
    tasks: HashMap<Action, Arc<dyn LifecycleTask>>,
}

impl TaskRegistry {
    /// Actions agents may send and the orchestrator must handle.
    pub const INBOUND_ACTIONS: [Action; 13] = [
        Action::Instantiate,
        Action::Error,
        Action::Scaled,
        Action::Heal,
        Action::Scaling,
        Action::AllocateResources,
        Action::ReleaseResources,
        Action::GrantOperation,
        Action::UpdateVnfr,
        Action::Modify,
        Action::Start,
        Action::Stop,
        Action::Configure,
    ];

    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with a handler for every inbound action.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(InstantiateTask));
        registry.register(Arc::new(ErrorTask));
        registry.register(Arc::new(ScaledTask));
        registry.register(Arc::new(HealTask));
        registry.register(Arc::new(ScalingTask));
        registry.register(Arc::new(AllocateResourcesTask));
        registry.register(Arc::new(ReleaseResourcesTask));
        registry.register(Arc::new(GrantOperationTask));
        registry.register(Arc::new(UpdateRecordTask));
        for action in [Action::Modify, Action::Start, Action::Stop, Action::Configure] {
            registry.register(Arc::new(PersistTask::new(action)));
        }
        registry
    }

    pub fn register(&mut self, task: Arc<dyn LifecycleTask>) {
        self.tasks.insert(task.action(), task);
    }

    pub fn get(&self, action: Action) -> NfvoResult<Arc<dyn LifecycleTask>> {
        self.tasks
            .get(&action)
            .cloned()
            .ok_or_else(|| NfvoError::not_found(format!("No task registered for action {action}")))
    }

    /// Fail unless every inbound action has a handler.
    pub fn validate_complete(&self) -> NfvoResult<()> {
        let missing: Vec<&str> = Self::INBOUND_ACTIONS
            .iter()
            .filter(|action| !self.tasks.contains_key(*action))
            .map(|action| action.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(NfvoError::Configuration(format!(
                "No task registered for actions: {}",
                missing.join(", ")
            )));
        }
        info!(tasks = self.tasks.len(), "📋 TASKS: Task registry complete");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl std::fmt::Debug for TaskRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut actions: Vec<&str> = self.tasks.keys().map(|action| action.as_str()).collect();
        actions.sort_unstable();
        f.debug_struct("TaskRegistry").field("actions", &actions).finish()
    }
}
