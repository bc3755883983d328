//! Lifecycle messages exchanged with VNF-manager agents.
//!
//! One closed, tagged enum covers both directions. Inbound variants always
//! carry the function record they are about; outbound-only variants
//! (requests the orchestrator issues) are rejected by the dispatcher.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::action::Action;
use crate::models::{
    ComponentInstance, ComponentTemplate, DeploymentFlavour, FunctionDescriptor, FunctionRecord,
    InfrastructureInstance, Key, RecordDependency, VirtualLinkRecord,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LifecycleMessage {
    /// Orchestrator asks an agent to instantiate a function.
    InstantiateRequest(InstantiateRequest),
    /// Agent reports a function as instantiated.
    Instantiated { record: FunctionRecord },
    Error {
        record: FunctionRecord,
        service_record_id: Option<String>,
        cause: String,
    },
    Scaled {
        record: FunctionRecord,
        component_instance: Option<ComponentInstance>,
    },
    Healed {
        record: FunctionRecord,
        component_instance: Option<ComponentInstance>,
        cause: String,
    },
    Scaling {
        record: FunctionRecord,
        user_data: Option<String>,
    },
    /// Agent asks the orchestrator to allocate compute for the record.
    AllocateResources {
        record: FunctionRecord,
        /// Deployment unit id -> VIM chosen for it
        vims: BTreeMap<String, InfrastructureInstance>,
        user_data: Option<String>,
        keys: Vec<Key>,
    },
    /// Reply to a grant request.
    Granted {
        record: FunctionRecord,
        vims: BTreeMap<String, InfrastructureInstance>,
        allowed: bool,
    },
    ScaleOut(ScaleOutRequest),
    ScaleIn {
        record: FunctionRecord,
        component_instance: ComponentInstance,
    },
    /// Any action whose payload is only the record (and maybe a dependency).
    Generic {
        action: Action,
        record: FunctionRecord,
        dependency: Option<RecordDependency>,
    },
}

impl LifecycleMessage {
    pub fn generic(action: Action, record: FunctionRecord) -> Self {
        Self::Generic {
            action,
            record,
            dependency: None,
        }
    }

    pub fn error(record: FunctionRecord, cause: impl Into<String>) -> Self {
        let service_record_id = record.parent_id.clone();
        Self::Error {
            record,
            service_record_id,
            cause: cause.into(),
        }
    }

    /// The action this message is keyed by.
    pub fn action(&self) -> Action {
        match self {
            Self::InstantiateRequest(_) | Self::Instantiated { .. } => Action::Instantiate,
            Self::Error { .. } => Action::Error,
            Self::Scaled { .. } => Action::Scaled,
            Self::Healed { .. } => Action::Heal,
            Self::Scaling { .. } => Action::Scaling,
            Self::AllocateResources { .. } => Action::AllocateResources,
            Self::Granted { .. } => Action::GrantOperation,
            Self::ScaleOut(_) => Action::ScaleOut,
            Self::ScaleIn { .. } => Action::ScaleIn,
            Self::Generic { action, .. } => *action,
        }
    }

    pub fn record(&self) -> Option<&FunctionRecord> {
        match self {
            Self::InstantiateRequest(_) => None,
            Self::Instantiated { record }
            | Self::Error { record, .. }
            | Self::Scaled { record, .. }
            | Self::Healed { record, .. }
            | Self::Scaling { record, .. }
            | Self::AllocateResources { record, .. }
            | Self::Granted { record, .. }
            | Self::ScaleIn { record, .. }
            | Self::Generic { record, .. } => Some(record),
            Self::ScaleOut(request) => Some(&request.record),
        }
    }
}

/// Everything an agent needs to instantiate one function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstantiateRequest {
    pub descriptor: FunctionDescriptor,
    pub deployment_flavour: DeploymentFlavour,
    pub instance_name: String,
    pub virtual_links: Vec<VirtualLinkRecord>,
    pub extension: BTreeMap<String, String>,
    /// Deployment unit id -> candidate VIMs
    pub vims: BTreeMap<String, Vec<InfrastructureInstance>>,
    pub keys: Vec<Key>,
    pub package_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScaleOutRequest {
    pub record: FunctionRecord,
    pub component: ComponentTemplate,
    pub dependency: Option<RecordDependency>,
    pub mode: Option<String>,
    pub extension: BTreeMap<String, String>,
}
