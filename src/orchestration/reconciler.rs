//! # Status Reconciler
//!
//! Aggregates the status of a service record from its function records.
//! Nothing is written until every function descriptor has a record, unless
//! the descriptor itself is gone, in which case the records present decide.
//!
//! Reconciliations are serialized by a single process-wide lock held for the
//! read-modify-write of the service record. The write itself is version
//! checked; on a conflict the aggregate is recomputed from fresh reads and the
//! write retried until it succeeds. There is no retry cap and no backoff:
//! sustained contention from writers outside the lock can keep a
//! reconciliation spinning.

use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{NfvoError, NfvoResult};
use crate::events::EventPublisher;
use crate::messaging::Action;
use crate::models::{FunctionRecord, ServiceDescriptor, ServiceRecord, Status};
use crate::repository::Repositories;

/// What a reconciliation did to the owning service record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Some function descriptor has no record yet; nothing was written.
    Premature,
    /// The owning service record no longer exists.
    ParentMissing,
    /// The aggregate status was persisted.
    Updated(Status),
    /// Every function terminated; the service record was deleted.
    Released,
}

#[derive(Debug)]
pub struct StatusReconciler {
    repositories: Repositories,
    events: EventPublisher,
    lock: Mutex<()>,
}

impl StatusReconciler {
    pub fn new(repositories: Repositories, events: EventPublisher) -> Self {
        Self {
            repositories,
            events,
            lock: Mutex::new(()),
        }
    }

    /// Recompute and persist the status of the service record owning `record`.
    pub async fn reconcile(&self, record: &FunctionRecord) -> NfvoResult<ReconcileOutcome> {
        let parent_id = record.parent_id.as_deref().ok_or_else(|| {
            NfvoError::not_found(format!("Function record {} has no owning service record", record.id))
        })?;

        let _guard = self.lock.lock().await;
        let mut attempts: u64 = 0;

        let saved = loop {
            attempts += 1;
            let Some(mut service_record) = self.repositories.service_records.find_by_id(parent_id).await? else {
                debug!(
                    service_record_id = %parent_id,
                    function_record_id = %record.id,
                    "🔄 RECONCILER: Service record already removed"
                );
                return Ok(ReconcileOutcome::ParentMissing);
            };

            let functions = self.repositories.functions_of(&service_record).await?;

            match self.descriptor_of(&service_record).await? {
                Some(descriptor) => {
                    if let Some(missing) = first_unrepresented(&descriptor, &functions) {
                        debug!(
                            service_record_id = %service_record.id,
                            missing_function = %missing,
                            "🔄 RECONCILER: Not every function has a record yet"
                        );
                        return Ok(ReconcileOutcome::Premature);
                    }
                }
                None => warn!(
                    service_record_id = %service_record.id,
                    descriptor_id = %service_record.descriptor_reference,
                    "🔄 RECONCILER: Service descriptor already removed, aggregating the records anyway"
                ),
            }

            service_record.status = Status::aggregate(functions.iter().map(|f| f.status));

            match self.repositories.service_records.save(service_record).await {
                Ok(saved) => break saved,
                Err(error) if error.is_conflict() => {
                    warn!(
                        service_record_id = %parent_id,
                        attempt = attempts,
                        error = %error,
                        "🔄 RECONCILER: Write conflict, recomputing"
                    );
                }
                Err(error) => return Err(error.into()),
            }
        };

        info!(
            service_record_id = %saved.id,
            status = %saved.status,
            attempts = attempts,
            "🔄 RECONCILER: Service record status updated"
        );

        match saved.status {
            Status::Active => {
                self.events.publish(Action::InstantiateFinish, to_context(&saved)).await;
                Ok(ReconcileOutcome::Updated(Status::Active))
            }
            Status::Terminated => {
                self.events
                    .publish(Action::ReleaseResourcesFinish, to_context(&saved))
                    .await;
                self.repositories.service_records.delete(&saved.id).await?;
                info!(service_record_id = %saved.id, "✅ RECONCILER: Service record released");
                Ok(ReconcileOutcome::Released)
            }
            status => Ok(ReconcileOutcome::Updated(status)),
        }
    }

    async fn descriptor_of(&self, service_record: &ServiceRecord) -> NfvoResult<Option<ServiceDescriptor>> {
        Ok(self
            .repositories
            .service_descriptors
            .find_by_id(&service_record.descriptor_reference)
            .await?)
    }
}

/// Name of the first function descriptor without a function record.
fn first_unrepresented<'a>(
    descriptor: &'a ServiceDescriptor,
    functions: &[FunctionRecord],
) -> Option<&'a str> {
    descriptor
        .functions
        .iter()
        .find(|function| {
            !functions
                .iter()
                .any(|record| record.descriptor_reference == function.id)
        })
        .map(|function| function.name.as_str())
}

fn to_context(service_record: &ServiceRecord) -> Value {
    serde_json::to_value(service_record).unwrap_or_else(|error| {
        warn!(
            service_record_id = %service_record.id,
            error = %error,
            "🔄 RECONCILER: Service record not serializable, publishing its id only"
        );
        serde_json::json!({ "id": service_record.id })
    })
}
