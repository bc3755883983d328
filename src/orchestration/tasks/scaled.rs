use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use super::{LifecycleTask, TaskContext, TaskPayload};
use crate::error::NfvoResult;
use crate::messaging::{Action, LifecycleMessage};
use crate::models::Status;
use crate::orchestration::core::OrchestrationCore;

#[derive(Debug, Clone, Copy, Default)]
pub struct ScaledTask;

#[async_trait]
impl LifecycleTask for ScaledTask {
    fn action(&self) -> Action {
        Action::Scaled
    }

    fn name(&self) -> &'static str {
        "scaled"
    }

    async fn execute(
        &self,
        core: Arc<OrchestrationCore>,
        context: TaskContext,
    ) -> NfvoResult<Option<LifecycleMessage>> {
        let mut record = context.record;
        record.status = Status::Active;
        let record = core.persist_function(record).await?;

        if let TaskPayload::Scaled {
            component_instance: Some(instance),
        } = &context.payload
        {
            info!(
                function_record_id = %record.id,
                hostname = %instance.hostname,
                "📋 SCALED: Function scaled"
            );
        }

        core.action_finished(Action::Scaled, &record).await?;
        Ok(None)
    }
}
