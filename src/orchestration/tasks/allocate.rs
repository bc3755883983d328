use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info};

use super::{LifecycleTask, TaskContext, TaskPayload};
use crate::error::{NfvoError, NfvoResult};
use crate::logging::log_task_operation;
use crate::messaging::{Action, LifecycleMessage};
use crate::orchestration::core::OrchestrationCore;
use crate::vim::{AllocationOutcome, LaunchOptions};

/// Allocates every component of a function record that has no instance yet.
///
/// A failed allocation keeps whatever instance could be recovered on its
/// unit, persists the record and replies with an ERROR message; success
/// replies ALLOCATE_RESOURCES with the updated record.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllocateResourcesTask;

#[async_trait]
impl LifecycleTask for AllocateResourcesTask {
    fn action(&self) -> Action {
        Action::AllocateResources
    }

    fn name(&self) -> &'static str {
        "allocate_resources"
    }

    async fn execute(
        &self,
        core: Arc<OrchestrationCore>,
        context: TaskContext,
    ) -> NfvoResult<Option<LifecycleMessage>> {
        let TaskPayload::AllocateResources { vims, user_data, keys } = context.payload else {
            return Err(NfvoError::InvalidMessage(
                "ALLOCATE_RESOURCES without chosen VIMs".to_string(),
            ));
        };
        let mut record = context.record;
        let check_integrity = core.config.orchestration.check_integrity;

        for index in 0..record.deployment_units.len() {
            let unit = record.deployment_units[index].clone();
            let vim_instance = vims.get(&unit.id).ok_or_else(|| {
                NfvoError::not_found(format!("No VIM chosen for deployment unit {}", unit.name))
            })?;
            let vim = core.vims.for_instance(vim_instance)?;

            for component in unit.unallocated_components() {
                let mut options = LaunchOptions::for_component(&component)
                    .with_keys(keys.clone())
                    .with_integrity_check(check_integrity);
                if let Some(user_data) = &user_data {
                    options = options.with_user_data(user_data.clone());
                }

                let result = vim
                    .allocate(vim_instance, &unit, &mut record, &component, &options)
                    .await;
                match AllocationOutcome::from(result) {
                    AllocationOutcome::Allocated(instance) => {
                        info!(
                            function_record_id = %record.id,
                            unit = %unit.name,
                            hostname = %instance.hostname,
                            ext_id = %instance.ext_id,
                            "🚀 ALLOCATE: Component allocated"
                        );
                        record.deployment_units[index].instances.push(instance);
                    }
                    AllocationOutcome::Failed { error, instance } => {
                        error!(
                            function_record_id = %record.id,
                            unit = %unit.name,
                            error = %error,
                            recovered = instance.is_some(),
                            "❌ ALLOCATE: Component allocation failed"
                        );
                        if let Some(instance) = instance {
                            record.deployment_units[index].instances.push(instance);
                        }
                        let record = core.persist_function(record).await?;
                        log_task_operation(
                            "allocate_resources",
                            Some(&record.id),
                            Some(&record.name),
                            record.parent_id.as_deref(),
                            "failed",
                            Some(&error.to_string()),
                        );
                        return Ok(Some(LifecycleMessage::error(record, error.to_string())));
                    }
                }
            }
        }

        let record = core.persist_function(record).await?;
        core.action_finished(Action::AllocateResources, &record).await?;
        log_task_operation(
            "allocate_resources",
            Some(&record.id),
            Some(&record.name),
            record.parent_id.as_deref(),
            "completed",
            None,
        );
        Ok(Some(LifecycleMessage::generic(Action::AllocateResources, record)))
    }
}
