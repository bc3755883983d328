use async_trait::async_trait;
use std::sync::Arc;

use super::{LifecycleTask, TaskContext};
use crate::error::NfvoResult;
use crate::messaging::{Action, LifecycleMessage};
use crate::orchestration::core::OrchestrationCore;

/// An agent pushes a new version of a function record.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateRecordTask;

#[async_trait]
impl LifecycleTask for UpdateRecordTask {
    fn action(&self) -> Action {
        Action::UpdateVnfr
    }

    fn name(&self) -> &'static str {
        "update"
    }

    async fn execute(
        &self,
        core: Arc<OrchestrationCore>,
        context: TaskContext,
    ) -> NfvoResult<Option<LifecycleMessage>> {
        let record = core.persist_function(context.record).await?;
        core.action_finished(Action::UpdateVnfr, &record).await?;
        Ok(Some(LifecycleMessage::generic(Action::UpdateVnfr, record)))
    }
}
