//! # Infrastructure Abstraction
//!
//! A uniform capability surface over virtual infrastructure managers. Each
//! VIM kind is a [`Vim`] implementation composed with a [`VimDriver`]
//! client; [`GenericVim`] covers every provider whose differences are
//! expressed through [`ProviderExtras`](crate::models::ProviderExtras).
//!
//! All operations fail with [`VimError`]. Allocation failures carry the
//! recovered instance whenever the VIM may have created something, so the
//! caller can persist it instead of losing it.

pub mod allocation;
pub mod broker;
pub mod driver;
pub mod generic;
pub mod network;

pub use broker::VimBroker;
pub use driver::{DriverResult, LaunchRequest, VimDriver};
pub use generic::GenericVim;

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::error::{VimError, VimResult};
use crate::models::{
    ComponentInstance, ComponentTemplate, DeploymentFlavour, DeploymentUnit, FunctionRecord, Image,
    ImageSource, InfrastructureInstance, Key, Network, Quota, Server,
};

/// Per-allocation inputs that do not come from the records themselves.
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    pub user_data: String,
    /// Virtual link reference -> requested floating IP
    pub floating_ips: BTreeMap<String, String>,
    pub keys: Vec<Key>,
    /// Validate the launched instance against the request
    pub check_integrity: bool,
}

impl LaunchOptions {
    /// Floating IPs requested by the component's connection points.
    pub fn for_component(component: &ComponentTemplate) -> Self {
        let floating_ips = component
            .connection_points
            .iter()
            .filter(|cp| cp.requests_floating_ip())
            .filter_map(|cp| {
                cp.floating_ip
                    .clone()
                    .map(|ip| (cp.virtual_link_reference.clone(), ip))
            })
            .collect();
        Self {
            floating_ips,
            ..Default::default()
        }
    }

    pub fn with_user_data(mut self, user_data: impl Into<String>) -> Self {
        self.user_data = user_data.into();
        self
    }

    pub fn with_keys(mut self, keys: Vec<Key>) -> Self {
        self.keys = keys;
        self
    }

    pub fn with_integrity_check(mut self, enabled: bool) -> Self {
        self.check_integrity = enabled;
        self
    }
}

/// Capability set of a VIM kind.
#[async_trait]
pub trait Vim: Send + Sync {
    async fn add_flavor(&self, vim: &InfrastructureInstance, flavor: &DeploymentFlavour) -> VimResult<DeploymentFlavour>;
    async fn update_flavor(&self, vim: &InfrastructureInstance, flavor: &DeploymentFlavour) -> VimResult<DeploymentFlavour>;
    async fn delete_flavor(&self, vim: &InfrastructureInstance, flavor: &DeploymentFlavour) -> VimResult<()>;
    async fn query_flavors(&self, vim: &InfrastructureInstance) -> VimResult<Vec<DeploymentFlavour>>;

    async fn add_image(&self, vim: &InfrastructureInstance, image: &Image, source: &ImageSource) -> VimResult<Image>;
    async fn update_image(&self, vim: &InfrastructureInstance, image: &Image) -> VimResult<Image>;
    async fn delete_image(&self, vim: &InfrastructureInstance, image: &Image) -> VimResult<()>;
    async fn query_images(&self, vim: &InfrastructureInstance) -> VimResult<Vec<Image>>;
    async fn copy_image(&self, vim: &InfrastructureInstance, image: &Image, content: &[u8]) -> VimResult<Image>;

    async fn add_network(&self, vim: &InfrastructureInstance, network: &Network) -> VimResult<Network>;
    /// Update a network and converge its subnets to exactly `network.subnets`.
    async fn update_network(&self, vim: &InfrastructureInstance, network: &Network) -> VimResult<Network>;
    async fn delete_network(&self, vim: &InfrastructureInstance, network: &Network) -> VimResult<()>;
    async fn query_networks(&self, vim: &InfrastructureInstance) -> VimResult<Vec<Network>>;
    async fn query_network(&self, vim: &InfrastructureInstance, ext_id: &str) -> VimResult<Network>;

    async fn query_resources(&self, vim: &InfrastructureInstance) -> VimResult<Vec<Server>>;

    /// Launch one instance of `component` for `record`.
    ///
    /// On success the record's address list is extended with the instance's
    /// internal IPs.
    async fn allocate(
        &self,
        vim: &InfrastructureInstance,
        unit: &DeploymentUnit,
        record: &mut FunctionRecord,
        component: &ComponentTemplate,
        options: &LaunchOptions,
    ) -> VimResult<ComponentInstance>;

    async fn release(&self, vim: &InfrastructureInstance, instance: &ComponentInstance) -> VimResult<()>;

    async fn get_quota(&self, vim: &InfrastructureInstance) -> VimResult<Quota>;
    async fn refresh(&self, vim: &InfrastructureInstance) -> VimResult<InfrastructureInstance>;
}

/// Outcome of an allocation, split for callers that keep partial state.
#[derive(Debug)]
pub enum AllocationOutcome {
    Allocated(ComponentInstance),
    /// The allocation failed; `instance` is what could be recovered, if anything.
    Failed {
        error: VimError,
        instance: Option<ComponentInstance>,
    },
}

impl From<VimResult<ComponentInstance>> for AllocationOutcome {
    fn from(result: VimResult<ComponentInstance>) -> Self {
        match result {
            Ok(instance) => Self::Allocated(instance),
            Err(error) => {
                let instance = error.partial_instance().cloned();
                Self::Failed { error, instance }
            }
        }
    }
}
