//! # VNF Manager Facade
//!
//! Entry point used by the layers above the engine: deploying services,
//! talking to the agents that own functions, and feeding inbound messages to
//! the dispatcher.

use std::sync::Arc;
use tracing::info;

use super::core::OrchestrationCore;
use super::dependency::{calculate_weights, Weights};
use super::deployment::build_extension;
use super::dispatcher::TaskDispatcher;
use super::executor::TaskHandle;
use super::reconciler::ReconcileOutcome;
use super::tasks::{LifecycleTask, ReleaseResourcesTask, TaskContext, TaskPayload, TaskRegistry};
use crate::error::NfvoResult;
use crate::messaging::{Action, LifecycleMessage, ScaleOutRequest};
use crate::models::{
    ComponentInstance, ComponentTemplate, FunctionRecord, Key, RecordDependency, ServiceDescriptor,
    ServiceRecord,
};

#[derive(Debug, Clone)]
pub struct VnfmManager {
    core: Arc<OrchestrationCore>,
    dispatcher: TaskDispatcher,
}

impl VnfmManager {
    /// Manager dispatching to the default task table.
    pub fn new(core: Arc<OrchestrationCore>) -> NfvoResult<Self> {
        Self::with_tasks(core, TaskRegistry::with_defaults())
    }

    pub fn with_tasks(core: Arc<OrchestrationCore>, tasks: TaskRegistry) -> NfvoResult<Self> {
        let dispatcher = TaskDispatcher::new(Arc::clone(&core), tasks)?;
        Ok(Self { core, dispatcher })
    }

    pub fn core(&self) -> &Arc<OrchestrationCore> {
        &self.core
    }

    pub fn dispatcher(&self) -> &TaskDispatcher {
        &self.dispatcher
    }

    /// Send one INSTANTIATE request per function of `descriptor`, in
    /// dependency waves when ordered deployment is enabled.
    pub async fn deploy(
        &self,
        descriptor: &ServiceDescriptor,
        service_record: &ServiceRecord,
        keys: &[Key],
    ) -> NfvoResult<usize> {
        info!(
            service_record_id = %service_record.id,
            descriptor = %descriptor.name,
            "🤝 MANAGER: Deploying network service"
        );
        self.core.deployments.deploy(descriptor, service_record, keys).await
    }

    /// Deliver `message` to the agent owning `record`.
    pub async fn send_message_to_function(
        &self,
        record: &FunctionRecord,
        message: &LifecycleMessage,
    ) -> NfvoResult<()> {
        self.core.gateway.send_to(message, &record.endpoint).await
    }

    /// Ask the agent owning `record` to release its resources.
    pub async fn release(&self, record: &FunctionRecord) -> NfvoResult<()> {
        let message = LifecycleMessage::generic(Action::ReleaseResources, record.clone());
        self.send_message_to_function(record, &message).await
    }

    /// Ask the agent owning `record` to add an instance of `component`.
    pub async fn add_component(
        &self,
        record: &FunctionRecord,
        component: ComponentTemplate,
        dependency: Option<RecordDependency>,
        mode: Option<String>,
    ) -> NfvoResult<()> {
        let service_record_id = record.parent_id.clone().unwrap_or_default();
        let message = LifecycleMessage::ScaleOut(ScaleOutRequest {
            record: record.clone(),
            component,
            dependency,
            mode,
            extension: build_extension(&self.core.config, &service_record_id),
        });
        self.send_message_to_function(record, &message).await
    }

    /// Ask the agent owning `record` to remove `instance`.
    pub async fn remove_component(&self, record: &FunctionRecord, instance: ComponentInstance) -> NfvoResult<()> {
        let message = LifecycleMessage::ScaleIn {
            record: record.clone(),
            component_instance: instance,
        };
        self.send_message_to_function(record, &message).await
    }

    /// Release the resources of `record` from the orchestrator itself,
    /// without involving its agent.
    pub async fn terminate(&self, record: FunctionRecord) -> NfvoResult<TaskHandle<Option<LifecycleMessage>>> {
        info!(function_record_id = %record.id, "🤝 MANAGER: Terminating function locally");
        let core = Arc::clone(&self.core);
        let context = TaskContext {
            action: Action::ReleaseResources,
            record,
            payload: TaskPayload::None,
        };
        let name = format!("terminate:{}", context.record.id);
        self.core
            .executor
            .submit(name, async move { ReleaseResourcesTask.execute(core, context).await })
            .await
    }

    /// Dispatch an inbound message.
    pub async fn execute_action(&self, message: LifecycleMessage) -> NfvoResult<Option<String>> {
        self.dispatcher.dispatch(message).await
    }

    pub async fn action_finished(
        &self,
        action: Action,
        record: &FunctionRecord,
    ) -> NfvoResult<Option<ReconcileOutcome>> {
        self.core.action_finished(action, record).await
    }

    pub fn deployment_weights(&self, descriptor: &ServiceDescriptor) -> NfvoResult<Weights> {
        calculate_weights(descriptor)
    }
}
