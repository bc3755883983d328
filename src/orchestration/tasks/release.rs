use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info};

use super::{LifecycleTask, TaskContext};
use crate::error::{NfvoError, NfvoResult};
use crate::messaging::{Action, LifecycleMessage};
use crate::models::{ComponentInstance, Status};
use crate::orchestration::core::OrchestrationCore;

/// Releases every instance of a function record on its VIM.
///
/// The record ends TERMINATED when every release succeeded and ERROR
/// otherwise; instances that failed to release stay on the record.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReleaseResourcesTask;

impl ReleaseResourcesTask {
    async fn release(core: &OrchestrationCore, instance: &ComponentInstance) -> NfvoResult<()> {
        let vim_instance = core
            .repositories
            .vim_instances
            .find_by_id(&instance.vim_id)
            .await?
            .ok_or_else(|| NfvoError::not_found(format!("VimInstance {}", instance.vim_id)))?;
        let vim = core.vims.for_instance(&vim_instance)?;
        vim.release(&vim_instance, instance).await?;
        Ok(())
    }
}

#[async_trait]
impl LifecycleTask for ReleaseResourcesTask {
    fn action(&self) -> Action {
        Action::ReleaseResources
    }

    fn name(&self) -> &'static str {
        "release_resources"
    }

    async fn execute(
        &self,
        core: Arc<OrchestrationCore>,
        context: TaskContext,
    ) -> NfvoResult<Option<LifecycleMessage>> {
        let mut record = context.record;
        let mut failures = 0usize;

        for unit in &mut record.deployment_units {
            let mut kept = Vec::new();
            for instance in unit.instances.drain(..) {
                match Self::release(&core, &instance).await {
                    Ok(()) => {
                        info!(hostname = %instance.hostname, ext_id = %instance.ext_id, "☁️ RELEASE: Instance released");
                    }
                    Err(release_error) => {
                        error!(
                            hostname = %instance.hostname,
                            ext_id = %instance.ext_id,
                            error = %release_error,
                            "❌ RELEASE: Instance release failed"
                        );
                        failures += 1;
                        kept.push(instance);
                    }
                }
            }
            unit.instances = kept;
        }

        record.status = if failures == 0 {
            Status::Terminated
        } else {
            Status::Error
        };
        let record = core.persist_function(record).await?;
        core.action_finished(Action::ReleaseResources, &record).await?;
        Ok(None)
    }
}
