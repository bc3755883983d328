//! # Task Dispatcher
//!
//! Routes inbound lifecycle messages to their task and runs the task on the
//! worker pool.
//!
//! ## Flow
//!
//! 1. Look up the task for the message's action (`NotFound` if none)
//! 2. Drop the message if the service record it references no longer exists
//! 3. Resolve the agent endpoint of the record (`NotFound` if unregistered)
//! 4. Copy the service record's project onto the function record, if it has one
//! 5. Submit the task; returning actions wait for it and get the serialized
//!    reply, all others return as soon as the task is queued

use std::sync::Arc;
use tracing::{debug, info};

use super::core::OrchestrationCore;
use super::tasks::{TaskContext, TaskRegistry};
use crate::error::NfvoResult;
use crate::logging::log_task_operation;
use crate::messaging::LifecycleMessage;

#[derive(Debug, Clone)]
pub struct TaskDispatcher {
    core: Arc<OrchestrationCore>,
    tasks: Arc<TaskRegistry>,
}

impl TaskDispatcher {
    /// Dispatcher over a registry checked for completeness.
    pub fn new(core: Arc<OrchestrationCore>, tasks: TaskRegistry) -> NfvoResult<Self> {
        tasks.validate_complete()?;
        Ok(Self {
            core,
            tasks: Arc::new(tasks),
        })
    }

    pub fn core(&self) -> &Arc<OrchestrationCore> {
        &self.core
    }

    /// Run the task for `message`.
    ///
    /// Returns the serialized reply for returning actions and `None` for
    /// everything else, including messages about released service records.
    pub async fn dispatch(&self, message: LifecycleMessage) -> NfvoResult<Option<String>> {
        let action = message.action();
        let task = self.tasks.get(action)?;
        let mut context = TaskContext::from_message(message)?;

        let parent = match context.record.parent_id.as_deref() {
            Some(parent_id) => match self.core.parent_of(&context.record).await? {
                Some(parent) => Some(parent),
                None => {
                    info!(
                        action = %action,
                        function_record_id = %context.record.id,
                        service_record_id = %parent_id,
                        "📨 DISPATCH: Owning service record is gone, dropping message"
                    );
                    return Ok(None);
                }
            },
            None => None,
        };

        self.core.gateway.managers().resolve(&context.record.endpoint)?;

        if let Some(parent) = &parent {
            context.record.project_id = parent.project_id.clone();
        }
        context.record.task = Some(task.name().to_string());

        debug!(
            action = %action,
            function_record_id = %context.record.id,
            returning = action.is_returning(),
            "📨 DISPATCH: Submitting task"
        );
        log_task_operation(
            task.name(),
            Some(&context.record.id),
            Some(&context.record.name),
            parent.as_ref().map(|parent| parent.id.as_str()),
            "submitted",
            None,
        );

        let core = Arc::clone(&self.core);
        let task_name = format!("{}:{}", task.name(), context.record.id);
        let handle = self
            .core
            .executor
            .submit(task_name, async move { task.execute(core, context).await })
            .await?;

        if !action.is_returning() {
            return Ok(None);
        }

        match handle.join().await? {
            Some(reply) => Ok(Some(serde_json::to_string(&reply)?)),
            None => Ok(None),
        }
    }
}
