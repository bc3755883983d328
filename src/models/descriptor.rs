//! Service and function templates.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::record::ComponentInstance;
use super::Entity;

/// Template of a multi-function network service.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServiceDescriptor {
    pub id: String,
    pub name: String,
    pub vendor: String,
    pub version: String,
    pub project_id: String,
    pub functions: Vec<FunctionDescriptor>,
    /// `source` provides what `target` needs; the target is deployed later.
    pub dependencies: Vec<Dependency>,
    #[serde(default)]
    pub entity_version: u64,
}

impl ServiceDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn function(&self, name: &str) -> Option<&FunctionDescriptor> {
        self.functions.iter().find(|f| f.name == name)
    }
}

impl Entity for ServiceDescriptor {
    const KIND: &'static str = "service_descriptor";

    fn id(&self) -> &str {
        &self.id
    }

    fn version(&self) -> u64 {
        self.entity_version
    }

    fn set_version(&mut self, version: u64) {
        self.entity_version = version;
    }
}

/// Template of a single network function.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FunctionDescriptor {
    pub id: String,
    pub name: String,
    pub vendor: String,
    pub version: String,
    #[serde(rename = "type")]
    pub function_type: String,
    /// Name of the agent endpoint responsible for this function.
    pub endpoint: String,
    pub deployment_flavours: Vec<DeploymentFlavour>,
    pub deployment_units: Vec<DeploymentUnit>,
    pub package_id: Option<String>,
}

impl FunctionDescriptor {
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }
}

/// Dependency edge between two functions of a service descriptor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Dependency {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub parameters: Vec<String>,
}

impl Dependency {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            parameters: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DeploymentFlavour {
    pub id: String,
    pub flavour_key: String,
    pub ext_id: String,
    pub ram: u32,
    pub vcpus: u32,
    pub disk: u32,
}

impl DeploymentFlavour {
    pub fn new(flavour_key: impl Into<String>, ext_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            flavour_key: flavour_key.into(),
            ext_id: ext_id.into(),
            ..Default::default()
        }
    }

    /// True if `key` names this flavour by key, external id or id.
    pub fn matches(&self, key: &str) -> bool {
        self.flavour_key == key || self.ext_id == key || self.id == key
    }
}

/// Deployment unit: the set of compute instances realizing part of a
/// function, with the images they may boot from.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DeploymentUnit {
    pub id: String,
    pub name: String,
    /// Candidate image names, in order of preference.
    pub vm_images: Vec<String>,
    pub computation_requirement: Option<String>,
    pub vim_instance_names: Vec<String>,
    pub components: Vec<ComponentTemplate>,
    pub instances: Vec<ComponentInstance>,
    pub metadata: BTreeMap<String, String>,
    pub hostname: Option<String>,
}

impl DeploymentUnit {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Component templates that have no instance yet.
    pub fn unallocated_components(&self) -> Vec<ComponentTemplate> {
        self.components
            .iter()
            .filter(|component| {
                !self
                    .instances
                    .iter()
                    .any(|instance| instance.component_id == component.id)
            })
            .cloned()
            .collect()
    }
}

/// Template of a single compute instance and its network attachments.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ComponentTemplate {
    pub id: String,
    pub connection_points: Vec<ConnectionPoint>,
}

impl ComponentTemplate {
    pub fn new(connection_points: Vec<ConnectionPoint>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            connection_points,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ConnectionPoint {
    pub virtual_link_reference: String,
    #[serde(rename = "type")]
    pub cp_type: Option<String>,
    /// Requested floating IP (`"random"` or an address); `None` for none.
    pub floating_ip: Option<String>,
}

impl ConnectionPoint {
    pub fn new(virtual_link_reference: impl Into<String>) -> Self {
        Self {
            virtual_link_reference: virtual_link_reference.into(),
            ..Default::default()
        }
    }

    pub fn with_floating_ip(mut self, floating_ip: impl Into<String>) -> Self {
        self.floating_ip = Some(floating_ip.into());
        self
    }

    pub fn requests_floating_ip(&self) -> bool {
        self.floating_ip.as_deref().is_some_and(|ip| !ip.is_empty())
    }
}
