//! Virtual infrastructure entities.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

use super::descriptor::DeploymentFlavour;
use super::Entity;

/// Provider-specific settings of a VIM.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProviderExtras {
    OpenStack {
        key_pair: Option<String>,
        security_groups: BTreeSet<String>,
    },
    #[default]
    Generic,
}

/// Configuration and credentials of a reachable VIM.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct InfrastructureInstance {
    pub id: String,
    pub name: String,
    /// Driver family used to talk to this VIM, e.g. `openstack`.
    pub vim_type: String,
    pub auth_url: String,
    pub tenant: String,
    pub username: String,
    pub password: String,
    pub project_id: String,
    pub flavours: Vec<DeploymentFlavour>,
    pub images: Vec<Image>,
    pub networks: Vec<Network>,
    pub metadata: BTreeMap<String, String>,
    pub provider: ProviderExtras,
    #[serde(default)]
    pub version: u64,
}

impl InfrastructureInstance {
    pub fn new(name: impl Into<String>, vim_type: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            vim_type: vim_type.into(),
            ..Default::default()
        }
    }

    pub fn is_openstack(&self) -> bool {
        matches!(self.provider, ProviderExtras::OpenStack { .. })
    }

    /// Images with the given name (or id) that are ready to boot.
    pub fn active_images_named(&self, name: &str) -> Vec<&Image> {
        self.images
            .iter()
            .filter(|image| (image.name == name || image.id == name) && image.is_active())
            .collect()
    }
}

impl Entity for InfrastructureInstance {
    const KIND: &'static str = "vim_instance";

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

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Image {
    pub id: String,
    pub ext_id: String,
    pub name: String,
    pub status: String,
    pub min_disk: u64,
    pub min_ram: u64,
    pub container_format: Option<String>,
    pub disk_format: Option<String>,
    pub is_public: bool,
}

impl Image {
    pub fn new(name: impl Into<String>, ext_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            ext_id: ext_id.into(),
            name: name.into(),
            status: "ACTIVE".to_string(),
            ..Default::default()
        }
    }

    pub fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case("ACTIVE")
    }
}

/// Where the content of a new image comes from.
#[derive(Debug, Clone)]
pub enum ImageSource {
    Bytes(Vec<u8>),
    Url(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Network {
    pub id: String,
    pub ext_id: Option<String>,
    pub name: String,
    pub external: bool,
    pub shared: bool,
    pub subnets: Vec<Subnet>,
}

impl Network {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Subnet {
    pub id: String,
    /// Identifier on the VIM; `None` until the subnet has been created.
    pub ext_id: Option<String>,
    pub name: String,
    pub cidr: String,
    pub network_id: Option<String>,
}

impl Subnet {
    pub fn new(name: impl Into<String>, cidr: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            cidr: cidr.into(),
            ..Default::default()
        }
    }
}

/// A server as reported by the VIM.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Server {
    pub id: String,
    pub ext_id: Option<String>,
    pub name: String,
    pub hostname: String,
    pub status: Option<String>,
    pub image: Option<Image>,
    pub flavor: Option<DeploymentFlavour>,
    /// Network name -> addresses on that network.
    pub ips: BTreeMap<String, Vec<String>>,
    /// Network name -> floating address.
    pub floating_ips: BTreeMap<String, String>,
}

/// Tenant limits on a VIM.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Quota {
    pub tenant: String,
    pub instances: i64,
    pub cores: i64,
    pub ram: i64,
    pub floating_ips: i64,
    pub key_pairs: i64,
}

/// Public key injected into launched instances.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Key {
    pub name: String,
    pub public_key: String,
    pub fingerprint: String,
}
