use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::{LifecycleTask, TaskContext, TaskPayload};
use crate::error::NfvoResult;
use crate::messaging::{Action, LifecycleMessage};
use crate::orchestration::core::OrchestrationCore;

/// Persist-and-finish handler shared by MODIFY, START, STOP and CONFIGURE.
#[derive(Debug, Clone, Copy)]
pub struct PersistTask {
    action: Action,
}

impl PersistTask {
    pub fn new(action: Action) -> Self {
        Self { action }
    }
}

#[async_trait]
impl LifecycleTask for PersistTask {
    fn action(&self) -> Action {
        self.action
    }

    fn name(&self) -> &'static str {
        match self.action {
            Action::Modify => "modify",
            Action::Start => "start",
            Action::Stop => "stop",
            Action::Configure => "configure",
            _ => "persist",
        }
    }

    async fn execute(
        &self,
        core: Arc<OrchestrationCore>,
        context: TaskContext,
    ) -> NfvoResult<Option<LifecycleMessage>> {
        if let TaskPayload::Dependency(Some(dependency)) = &context.payload {
            debug!(
                function_record_id = %context.record.id,
                target = %dependency.target,
                sources = dependency.parameters.len(),
                "📋 PERSIST: Dependency parameters received"
            );
        }

        let record = core.persist_function(context.record).await?;
        core.action_finished(self.action, &record).await?;
        Ok(None)
    }
}
