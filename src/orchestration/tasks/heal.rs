use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use super::{LifecycleTask, TaskContext, TaskPayload};
use crate::error::NfvoResult;
use crate::messaging::{Action, LifecycleMessage};
use crate::orchestration::core::OrchestrationCore;

#[derive(Debug, Clone, Copy, Default)]
pub struct HealTask;

#[async_trait]
impl LifecycleTask for HealTask {
    fn action(&self) -> Action {
        Action::Heal
    }

    fn name(&self) -> &'static str {
        "heal"
    }

    async fn execute(
        &self,
        core: Arc<OrchestrationCore>,
        context: TaskContext,
    ) -> NfvoResult<Option<LifecycleMessage>> {
        if let TaskPayload::Healed {
            component_instance,
            cause,
        } = &context.payload
        {
            info!(
                function_record_id = %context.record.id,
                cause = %cause,
                hostname = component_instance.as_ref().map(|instance| instance.hostname.as_str()),
                "📋 HEAL: Component healed"
            );
        }

        let record = core.persist_function(context.record).await?;
        core.action_finished(Action::Heal, &record).await?;
        Ok(None)
    }
}
