use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

use super::{LifecycleTask, TaskContext};
use crate::error::{NfvoError, NfvoResult};
use crate::messaging::{Action, LifecycleMessage};
use crate::models::InfrastructureInstance;
use crate::orchestration::core::OrchestrationCore;

/// Chooses a VIM per deployment unit and checks its quota against the
/// instances still to be created there.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrantOperationTask;

#[async_trait]
impl LifecycleTask for GrantOperationTask {
    fn action(&self) -> Action {
        Action::GrantOperation
    }

    fn name(&self) -> &'static str {
        "grant_operation"
    }

    async fn execute(
        &self,
        core: Arc<OrchestrationCore>,
        context: TaskContext,
    ) -> NfvoResult<Option<LifecycleMessage>> {
        let record = context.record;
        let known = core.repositories.vim_instances.find_all().await?;

        let mut chosen: BTreeMap<String, InfrastructureInstance> = BTreeMap::new();
        let mut requested: BTreeMap<String, i64> = BTreeMap::new();
        for unit in &record.deployment_units {
            let vim = known
                .iter()
                .find(|vim| unit.vim_instance_names.is_empty() || unit.vim_instance_names.contains(&vim.name))
                .cloned()
                .ok_or_else(|| NfvoError::not_found(format!("No VimInstance for deployment unit {}", unit.name)))?;
            *requested.entry(vim.id.clone()).or_default() += unit.unallocated_components().len() as i64;
            chosen.insert(unit.id.clone(), vim);
        }

        for (vim_id, needed) in &requested {
            let Some(vim) = chosen.values().find(|vim| &vim.id == vim_id) else {
                continue;
            };
            let quota = core.vims.for_instance(vim)?.get_quota(vim).await?;
            if quota.instances < *needed {
                warn!(
                    function_record_id = %record.id,
                    vim = %vim.name,
                    available = quota.instances,
                    needed = needed,
                    "❌ GRANT: Not enough instances left on VIM"
                );
                let cause = format!(
                    "Not enough resources on VimInstance {}: {} instances requested, {} available",
                    vim.name, needed, quota.instances
                );
                return Ok(Some(LifecycleMessage::error(record, cause)));
            }
        }

        let record = core.persist_function(record).await?;
        core.action_finished(Action::GrantOperation, &record).await?;
        info!(function_record_id = %record.id, vims = chosen.len(), "✅ GRANT: Operation granted");

        Ok(Some(LifecycleMessage::Granted {
            record,
            vims: chosen,
            allowed: true,
        }))
    }
}
