use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

use super::{LifecycleTask, TaskContext, TaskPayload};
use crate::error::NfvoResult;
use crate::logging::log_error;
use crate::messaging::{Action, LifecycleMessage};
use crate::models::Status;
use crate::orchestration::core::OrchestrationCore;

/// An agent reported a function as failed.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorTask;

#[async_trait]
impl LifecycleTask for ErrorTask {
    fn action(&self) -> Action {
        Action::Error
    }

    fn name(&self) -> &'static str {
        "error"
    }

    async fn execute(
        &self,
        core: Arc<OrchestrationCore>,
        context: TaskContext,
    ) -> NfvoResult<Option<LifecycleMessage>> {
        let cause = match context.payload {
            TaskPayload::Error { cause } => cause,
            _ => String::new(),
        };

        let mut record = context.record;
        record.status = Status::Error;
        let record = core.persist_function(record).await?;
        core.attach_to_service(&record).await?;

        log_error(
            "error_task",
            "function_failed",
            &cause,
            Some(&format!("function_record={} name={}", record.id, record.name)),
        );

        if let Some(parent_id) = record.parent_id.as_deref() {
            if core.deployments.abort(parent_id) {
                warn!(service_record_id = %parent_id, "❌ ERROR: Ordered deployment stopped");
            }
        }

        core.action_finished(Action::Error, &record).await?;
        Ok(None)
    }
}
