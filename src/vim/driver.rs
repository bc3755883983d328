//! Contract of the per-provider VIM driver client.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::DriverError;
use crate::models::{
    ConnectionPoint, DeploymentFlavour, Image, InfrastructureInstance, Key, Network, Quota,
    Server, Subnet,
};

pub type DriverResult<T> = Result<T, DriverError>;

/// Parameters of a single instance launch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaunchRequest {
    pub hostname: String,
    pub image_ext_id: String,
    /// Empty for providers that do not resolve flavors to external ids.
    pub flavor_ext_id: String,
    pub key_pair: String,
    pub connection_points: Vec<ConnectionPoint>,
    pub security_groups: BTreeSet<String>,
    pub user_data: String,
    /// Virtual link reference -> requested floating IP
    pub floating_ips: BTreeMap<String, String>,
    pub keys: Vec<Key>,
}

/// Provider client. Every call is independent and stateless; timeouts are
/// the driver's concern.
#[async_trait]
pub trait VimDriver: Send + Sync {
    async fn list_images(&self, vim: &InfrastructureInstance) -> DriverResult<Vec<Image>>;
    async fn add_image(&self, vim: &InfrastructureInstance, image: &Image, content: &[u8]) -> DriverResult<Image>;
    async fn add_image_from_url(&self, vim: &InfrastructureInstance, image: &Image, url: &str) -> DriverResult<Image>;
    async fn update_image(&self, vim: &InfrastructureInstance, image: &Image) -> DriverResult<Image>;
    async fn delete_image(&self, vim: &InfrastructureInstance, image: &Image) -> DriverResult<bool>;
    async fn copy_image(&self, vim: &InfrastructureInstance, image: &Image, content: &[u8]) -> DriverResult<Image>;

    async fn list_flavors(&self, vim: &InfrastructureInstance) -> DriverResult<Vec<DeploymentFlavour>>;
    async fn add_flavor(&self, vim: &InfrastructureInstance, flavor: &DeploymentFlavour) -> DriverResult<DeploymentFlavour>;
    async fn update_flavor(&self, vim: &InfrastructureInstance, flavor: &DeploymentFlavour) -> DriverResult<DeploymentFlavour>;
    async fn delete_flavor(&self, vim: &InfrastructureInstance, ext_id: &str) -> DriverResult<bool>;

    async fn list_networks(&self, vim: &InfrastructureInstance) -> DriverResult<Vec<Network>>;
    async fn get_network(&self, vim: &InfrastructureInstance, ext_id: &str) -> DriverResult<Network>;
    async fn create_network(&self, vim: &InfrastructureInstance, network: &Network) -> DriverResult<Network>;
    async fn update_network(&self, vim: &InfrastructureInstance, network: &Network) -> DriverResult<Network>;
    async fn delete_network(&self, vim: &InfrastructureInstance, ext_id: &str) -> DriverResult<bool>;

    async fn create_subnet(&self, vim: &InfrastructureInstance, network: &Network, subnet: &Subnet) -> DriverResult<Subnet>;
    async fn update_subnet(&self, vim: &InfrastructureInstance, network: &Network, subnet: &Subnet) -> DriverResult<Subnet>;
    async fn delete_subnet(&self, vim: &InfrastructureInstance, ext_id: &str) -> DriverResult<bool>;
    async fn subnet_ext_ids(&self, vim: &InfrastructureInstance, network_ext_id: &str) -> DriverResult<Vec<String>>;

    /// Launch an instance and wait until the VIM reports it.
    ///
    /// On failure the error may still carry the server the VIM created.
    async fn launch_instance_and_wait(&self, vim: &InfrastructureInstance, request: &LaunchRequest) -> DriverResult<Server>;
    async fn list_servers(&self, vim: &InfrastructureInstance) -> DriverResult<Vec<Server>>;
    async fn delete_server_and_wait(&self, vim: &InfrastructureInstance, ext_id: &str) -> DriverResult<()>;

    async fn get_quota(&self, vim: &InfrastructureInstance) -> DriverResult<Quota>;
    async fn refresh(&self, vim: &InfrastructureInstance) -> DriverResult<InfrastructureInstance>;
}
