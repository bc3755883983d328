use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use super::{LifecycleTask, TaskContext};
use crate::error::NfvoResult;
use crate::logging::log_task_operation;
use crate::messaging::{Action, LifecycleMessage};
use crate::orchestration::core::OrchestrationCore;

/// An agent finished instantiating a function.
///
/// Persists the record, makes it part of its service record, finishes the
/// action and releases the next wave of an ordered deployment.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstantiateTask;

#[async_trait]
impl LifecycleTask for InstantiateTask {
    fn action(&self) -> Action {
        Action::Instantiate
    }

    fn name(&self) -> &'static str {
        "instantiate"
    }

    async fn execute(
        &self,
        core: Arc<OrchestrationCore>,
        context: TaskContext,
    ) -> NfvoResult<Option<LifecycleMessage>> {
        let record = core.persist_function(context.record).await?;
        core.attach_to_service(&record).await?;

        info!(
            function_record_id = %record.id,
            function_record_name = %record.name,
            status = %record.status,
            "📋 INSTANTIATE: Function record instantiated"
        );

        core.action_finished(Action::Instantiate, &record).await?;
        let sent = core.deployments.on_function_instantiated(&record).await?;

        log_task_operation(
            "instantiate",
            Some(&record.id),
            Some(&record.name),
            record.parent_id.as_deref(),
            "completed",
            (sent > 0).then(|| format!("released {sent} dependent functions")).as_deref(),
        );
        Ok(None)
    }
}
