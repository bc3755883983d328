//! Running instances of descriptors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::descriptor::{ConnectionPoint, DeploymentUnit};
use super::status::Status;
use super::Entity;

/// One running instantiation of a service descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub id: String,
    pub name: String,
    pub descriptor_reference: String,
    pub project_id: String,
    pub status: Status,
    /// Identities of the owned function records.
    pub function_record_ids: Vec<String>,
    pub virtual_links: Vec<VirtualLinkRecord>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub version: u64,
}

impl ServiceRecord {
    pub fn new(name: impl Into<String>, descriptor_reference: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            descriptor_reference: descriptor_reference.into(),
            project_id: String::new(),
            status: Status::Null,
            function_record_ids: Vec::new(),
            virtual_links: Vec::new(),
            created_at: Utc::now(),
            version: 0,
        }
    }

    /// Add a function record identity; returns false if it was already owned.
    pub fn attach(&mut self, function_record_id: &str) -> bool {
        if self.owns(function_record_id) {
            return false;
        }
        self.function_record_ids.push(function_record_id.to_string());
        true
    }

    pub fn owns(&self, function_record_id: &str) -> bool {
        self.function_record_ids
            .iter()
            .any(|id| id == function_record_id)
    }
}

impl Entity for ServiceRecord {
    const KIND: &'static str = "service_record";

    fn id(&self) -> &str {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct VirtualLinkRecord {
    pub id: String,
    pub name: String,
}

/// One running instantiation of a function descriptor.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FunctionRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub function_type: String,
    pub descriptor_reference: String,
    /// Owning service record.
    pub parent_id: Option<String>,
    pub project_id: String,
    pub status: Status,
    /// Name of the agent endpoint that owns this record.
    pub endpoint: String,
    pub deployment_flavour_key: String,
    pub deployment_units: Vec<DeploymentUnit>,
    pub addresses: Vec<String>,
    pub package_id: Option<String>,
    /// Last task that handled this record.
    pub task: Option<String>,
    #[serde(default)]
    pub version: u64,
}

impl FunctionRecord {
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    pub fn instances(&self) -> impl Iterator<Item = &ComponentInstance> {
        self.deployment_units
            .iter()
            .flat_map(|unit| unit.instances.iter())
    }
}

impl Entity for FunctionRecord {
    const KIND: &'static str = "function_record";

    fn id(&self) -> &str {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}

/// One allocated compute instance on a VIM.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ComponentInstance {
    pub id: String,
    pub hostname: String,
    /// Identifier of the server on the VIM (`"unknown"` when unconfirmed).
    pub ext_id: String,
    pub vim_id: String,
    pub component_id: String,
    /// VIM-reported state; `ERROR` when the allocation could not be confirmed.
    pub state: Option<String>,
    pub connection_points: Vec<ConnectionPoint>,
    pub ips: Vec<Ip>,
    pub floating_ips: Vec<Ip>,
}

impl ComponentInstance {
    pub fn is_error(&self) -> bool {
        self.state
            .as_deref()
            .is_some_and(|state| state.eq_ignore_ascii_case("ERROR"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Ip {
    pub net_name: String,
    pub ip: String,
}

/// Parameters a function receives from the functions it depends on.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RecordDependency {
    pub target: String,
    /// Source function name -> parameter name -> value.
    pub parameters: BTreeMap<String, BTreeMap<String, String>>,
}
