use async_trait::async_trait;
use std::sync::Arc;

use super::{LifecycleTask, TaskContext, TaskPayload};
use crate::error::NfvoResult;
use crate::messaging::{Action, LifecycleMessage};
use crate::models::Status;
use crate::orchestration::core::OrchestrationCore;

/// A function started scaling; replies with the persisted record.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScalingTask;

#[async_trait]
impl LifecycleTask for ScalingTask {
    fn action(&self) -> Action {
        Action::Scaling
    }

    fn name(&self) -> &'static str {
        "scaling"
    }

    async fn execute(
        &self,
        core: Arc<OrchestrationCore>,
        context: TaskContext,
    ) -> NfvoResult<Option<LifecycleMessage>> {
        let user_data = match context.payload {
            TaskPayload::Scaling { user_data } => user_data,
            _ => None,
        };

        let mut record = context.record;
        record.status = Status::Scaling;
        let record = core.persist_function(record).await?;
        core.action_finished(Action::Scaling, &record).await?;

        Ok(Some(LifecycleMessage::Scaling { record, user_data }))
    }
}
