//! Dispatch of inbound lifecycle messages to their tasks.

mod common;

use async_trait::async_trait;
use common::*;
use std::sync::Arc;
use std::time::Duration;

use nfvo_core::error::{NfvoError, NfvoResult};
use nfvo_core::messaging::{Action, LifecycleMessage};
use nfvo_core::models::{ComponentInstance, FunctionRecord, ServiceRecord, Status};
use nfvo_core::orchestration::{
    LifecycleTask, OrchestrationCore, TaskContext, TaskDispatcher, TaskRegistry,
};

/// Wait until the stored copy of `id` satisfies `predicate`.
async fn eventually<F>(harness: &Harness, id: &str, predicate: F) -> FunctionRecord
where
    F: Fn(&FunctionRecord) -> bool,
{
    for _ in 0..200 {
        if let Some(record) = harness
            .core
            .repositories
            .function_records
            .find_by_id(id)
            .await
            .unwrap()
        {
            if predicate(&record) {
                return record;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("function record {id} never reached the expected state");
}

async fn seeded(harness: &Harness) -> (ServiceRecord, FunctionRecord) {
    let descriptor = service_descriptor(&["fw"], &[]);
    let service_record = harness.seed_service(&descriptor).await;
    let record = function_record(&descriptor.functions[0], &service_record);
    (service_record, record)
}

struct PanickingTask;

#[async_trait]
impl LifecycleTask for PanickingTask {
    fn action(&self) -> Action {
        Action::UpdateVnfr
    }

    fn name(&self) -> &'static str {
        "panicking"
    }

    #[allow(unreachable_code)]
    async fn execute(
        &self,
        _core: Arc<OrchestrationCore>,
        _context: TaskContext,
    ) -> NfvoResult<Option<LifecycleMessage>> {
        panic!("malformed record from agent");
    }
}

#[tokio::test]
async fn test_fire_and_forget_instantiate_persists_with_project() {
    let harness = Harness::new();
    let (service_record, record) = seeded(&harness).await;
    let id = record.id.clone();

    let reply = harness
        .manager
        .execute_action(LifecycleMessage::Instantiated { record })
        .await
        .unwrap();
    assert!(reply.is_none());

    let stored = eventually(&harness, &id, |record| record.project_id == "project-1").await;
    assert_eq!(stored.task.as_deref(), Some("instantiate"));

    let service_record = harness.service_record(&service_record.id).await.unwrap();
    assert!(service_record.owns(&id));
}

#[tokio::test]
async fn test_returning_action_replies_with_task_result() {
    let harness = Harness::new();
    let vim = harness.seed_vim(openstack_vim("vim-1")).await;
    let (_, record) = seeded(&harness).await;
    let unit_id = record.deployment_units[0].id.clone();

    let reply = harness
        .manager
        .execute_action(LifecycleMessage::generic(Action::GrantOperation, record))
        .await
        .unwrap()
        .expect("grant replies");

    match serde_json::from_str::<LifecycleMessage>(&reply).unwrap() {
        LifecycleMessage::Granted { record, vims, allowed } => {
            assert!(allowed);
            assert_eq!(vims[&unit_id].id, vim.id);
            assert_eq!(record.project_id, "project-1");
        }
        other => panic!("unexpected reply {other:?}"),
    }
}

#[tokio::test]
async fn test_unregistered_agent_endpoint_is_not_found() {
    let harness = HarnessBuilder::new().without_agent().build();
    let (_, record) = seeded(&harness).await;
    let id = record.id.clone();

    let error = harness
        .manager
        .execute_action(LifecycleMessage::Instantiated { record })
        .await
        .unwrap_err();
    assert!(error.is_not_found(), "{error:?}");
    assert!(harness
        .core
        .repositories
        .function_records
        .find_by_id(&id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_released_service_record_drops_message() {
    let harness = Harness::new();
    let descriptor = service_descriptor(&["fw"], &[]);
    let orphan_parent = ServiceRecord::new("gone", descriptor.id.clone());
    let record = function_record(&descriptor.functions[0], &orphan_parent);
    let id = record.id.clone();

    let reply = harness
        .manager
        .execute_action(LifecycleMessage::generic(Action::UpdateVnfr, record))
        .await
        .unwrap();
    assert!(reply.is_none());

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(harness
        .core
        .repositories
        .function_records
        .find_by_id(&id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_action_without_task_is_not_found() {
    let harness = Harness::new();
    let (_, record) = seeded(&harness).await;
    let id = record.id.clone();

    let error = harness
        .manager
        .execute_action(LifecycleMessage::ScaleIn {
            record,
            component_instance: ComponentInstance::default(),
        })
        .await
        .unwrap_err();
    assert!(error.is_not_found(), "{error:?}");
    assert!(harness
        .core
        .repositories
        .function_records
        .find_by_id(&id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_granted_reply_is_not_an_inbound_message() {
    let harness = Harness::new();
    let (_, record) = seeded(&harness).await;

    let error = harness
        .manager
        .execute_action(LifecycleMessage::Granted {
            record,
            vims: Default::default(),
            allowed: true,
        })
        .await
        .unwrap_err();
    assert!(matches!(error, NfvoError::InvalidMessage(_)), "{error:?}");
}

#[tokio::test]
async fn test_record_without_service_record_still_runs_task() {
    let harness = Harness::new();
    let descriptor = service_descriptor(&["fw"], &[]);
    let mut record = function_record(&descriptor.functions[0], &ServiceRecord::new("ns", descriptor.id.clone()));
    record.parent_id = None;
    let id = record.id.clone();

    let reply = harness
        .manager
        .execute_action(LifecycleMessage::generic(Action::UpdateVnfr, record))
        .await
        .unwrap()
        .expect("update replies");

    match serde_json::from_str::<LifecycleMessage>(&reply).unwrap() {
        LifecycleMessage::Generic { action, record, .. } => {
            assert_eq!(action, Action::UpdateVnfr);
            assert!(record.parent_id.is_none());
            assert!(record.project_id.is_empty());
        }
        other => panic!("unexpected reply {other:?}"),
    }
    let stored = harness.stored_function(&id).await;
    assert_eq!(stored.task.as_deref(), Some("update"));
}

#[tokio::test]
async fn test_heal_persists_record_and_reconciles() {
    let harness = Harness::new();
    let (service_record, record) = seeded(&harness).await;
    let record = harness.seed_function(record.with_status(Status::Initializing)).await;
    let id = record.id.clone();
    let mut events = harness.core.events.subscribe();

    let reply = harness
        .manager
        .execute_action(LifecycleMessage::Healed {
            record: record.with_status(Status::Active),
            component_instance: Some(ComponentInstance::default()),
            cause: "vm unreachable".to_string(),
        })
        .await
        .unwrap();
    assert!(reply.is_none());

    let stored = eventually(&harness, &id, |record| record.task.as_deref() == Some("heal")).await;
    assert_eq!(stored.status, Status::Active);
    assert_eq!(stored.project_id, "project-1");

    let heal = tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .expect("heal event published")
        .unwrap();
    assert_eq!(heal.action, Action::Heal);
    let finished = tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .expect("deployment finished")
        .unwrap();
    assert_eq!(finished.action, Action::InstantiateFinish);
    assert_eq!(
        harness.service_record(&service_record.id).await.unwrap().status,
        Status::Active
    );
}

#[tokio::test]
async fn test_persisting_actions_record_task_and_reconcile() {
    let cases = [
        (Action::Modify, "modify", Status::Inactive),
        (Action::Start, "start", Status::Active),
        (Action::Stop, "stop", Status::Inactive),
        (Action::Configure, "configure", Status::Initializing),
    ];

    for (action, task, status) in cases {
        let harness = Harness::new();
        let (service_record, record) = seeded(&harness).await;
        let record = harness.seed_function(record.with_status(Status::Null)).await;
        let id = record.id.clone();

        let reply = harness
            .manager
            .execute_action(LifecycleMessage::generic(action, record.with_status(status)))
            .await
            .unwrap();
        assert!(reply.is_none());

        let stored = eventually(&harness, &id, |record| record.task.as_deref() == Some(task)).await;
        assert_eq!(stored.status, status, "{action}");

        let mut reconciled = false;
        for _ in 0..200 {
            let current = harness.service_record(&service_record.id).await.unwrap();
            if current.status == status {
                reconciled = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(reconciled, "{action} never reconciled the service record to {status}");
    }
}

#[tokio::test]
async fn test_incomplete_task_table_is_rejected() {
    let harness = Harness::new();
    let mut tasks = TaskRegistry::new();
    tasks.register(Arc::new(PanickingTask));

    let error = TaskDispatcher::new(Arc::clone(&harness.core), tasks).unwrap_err();
    assert!(matches!(error, NfvoError::Configuration(_)));
}

#[tokio::test]
async fn test_panicking_task_is_isolated() {
    let harness = Harness::new();
    let mut tasks = TaskRegistry::with_defaults();
    tasks.register(Arc::new(PanickingTask));
    let dispatcher = TaskDispatcher::new(Arc::clone(&harness.core), tasks).unwrap();

    let (_, record) = seeded(&harness).await;
    let error = dispatcher
        .dispatch(LifecycleMessage::generic(Action::UpdateVnfr, record.clone()))
        .await
        .unwrap_err();
    assert!(matches!(error, NfvoError::TaskPanicked(_)), "{error:?}");

    // The pool keeps serving after the panic
    let scaled = LifecycleMessage::Scaled {
        record: record.with_status(Status::Scaling),
        component_instance: None,
    };
    let id = scaled.record().map(|record| record.id.clone()).unwrap();
    dispatcher.dispatch(scaled).await.unwrap();
    let stored = eventually(&harness, &id, |record| record.status == Status::Active).await;
    assert_eq!(stored.task.as_deref(), Some("scaled"));
}
