//! Scriptable in-memory VIM driver.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use nfvo_core::error::DriverError;
use nfvo_core::models::{
    DeploymentFlavour, Image, InfrastructureInstance, Network, Quota, Server, Subnet,
};
use nfvo_core::vim::{DriverResult, LaunchRequest, VimDriver};

/// How the next launches behave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LaunchScript {
    #[default]
    Succeed,
    /// The launch fails but the error carries the created server.
    FailWithServer,
    /// The launch fails without a server, yet the server shows up in listings.
    FailAfterCreating,
    /// The launch fails and nothing was created.
    FailClean,
}

type ServerTamper = Box<dyn Fn(&mut Server) + Send + Sync>;

#[derive(Default)]
struct FakeState {
    launch_script: LaunchScript,
    tamper: Option<ServerTamper>,
    servers: Vec<Server>,
    networks: Vec<Network>,
    /// Subnet ext id -> network ext id
    subnets: BTreeMap<String, String>,
    undeletable: HashSet<String>,
    quota: Quota,
}

#[derive(Default)]
pub struct FakeDriver {
    state: Mutex<FakeState>,
    sequence: AtomicUsize,
    pub launches: AtomicUsize,
    pub created_subnets: AtomicUsize,
    pub updated_subnets: AtomicUsize,
    pub deleted_subnets: AtomicUsize,
    pub deleted_servers: AtomicUsize,
}

impl FakeDriver {
    pub fn new() -> Self {
        let driver = Self::default();
        driver.state.lock().quota = Quota {
            tenant: "tenant".to_string(),
            instances: 10,
            cores: 20,
            ram: 40_960,
            floating_ips: 10,
            key_pairs: 10,
        };
        driver
    }

    pub fn with_launch_script(self, script: LaunchScript) -> Self {
        self.state.lock().launch_script = script;
        self
    }

    /// Modify every launched server before it is reported.
    pub fn with_tamper(self, tamper: impl Fn(&mut Server) + Send + Sync + 'static) -> Self {
        self.state.lock().tamper = Some(Box::new(tamper));
        self
    }

    pub fn with_instance_quota(self, instances: i64) -> Self {
        self.state.lock().quota.instances = instances;
        self
    }

    /// Deleting the server with `ext_id` will fail.
    pub fn refuse_delete(&self, ext_id: &str) {
        self.state.lock().undeletable.insert(ext_id.to_string());
    }

    /// Pre-existing subnet on the VIM, outside of any request.
    pub fn seed_subnet(&self, network_ext_id: &str) -> String {
        let ext_id = format!("subnet-{}", self.next_id());
        self.state
            .lock()
            .subnets
            .insert(ext_id.clone(), network_ext_id.to_string());
        ext_id
    }

    pub fn servers(&self) -> Vec<Server> {
        self.state.lock().servers.clone()
    }

    pub fn subnet_count(&self, network_ext_id: &str) -> usize {
        self.state
            .lock()
            .subnets
            .values()
            .filter(|network| network.as_str() == network_ext_id)
            .count()
    }

    fn next_id(&self) -> usize {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn build_server(&self, vim: &InfrastructureInstance, request: &LaunchRequest) -> Server {
        let n = self.next_id();
        let image = vim
            .images
            .iter()
            .find(|image| image.ext_id == request.image_ext_id)
            .cloned();
        let flavor = vim
            .flavours
            .iter()
            .find(|flavor| flavor.ext_id == request.flavor_ext_id)
            .or_else(|| vim.flavours.first())
            .cloned();

        let ips = request
            .connection_points
            .iter()
            .enumerate()
            .map(|(i, cp)| (cp.virtual_link_reference.clone(), vec![format!("10.0.{i}.{n}")]))
            .collect();
        let floating_ips = request
            .floating_ips
            .keys()
            .map(|network| (network.clone(), format!("172.24.4.{n}")))
            .collect();

        let mut server = Server {
            id: format!("server-{n}"),
            ext_id: Some(format!("ext-{n}")),
            name: request.hostname.clone(),
            hostname: request.hostname.clone(),
            status: Some("ACTIVE".to_string()),
            image,
            flavor,
            ips,
            floating_ips,
        };
        if let Some(tamper) = &self.state.lock().tamper {
            tamper(&mut server);
        }
        server
    }
}

#[async_trait]
impl VimDriver for FakeDriver {
    async fn list_images(&self, vim: &InfrastructureInstance) -> DriverResult<Vec<Image>> {
        Ok(vim.images.clone())
    }

    async fn add_image(&self, _vim: &InfrastructureInstance, image: &Image, _content: &[u8]) -> DriverResult<Image> {
        let mut added = image.clone();
        added.ext_id = format!("image-{}", self.next_id());
        Ok(added)
    }

    async fn add_image_from_url(&self, _vim: &InfrastructureInstance, image: &Image, _url: &str) -> DriverResult<Image> {
        let mut added = image.clone();
        added.ext_id = format!("image-{}", self.next_id());
        Ok(added)
    }

    async fn update_image(&self, _vim: &InfrastructureInstance, image: &Image) -> DriverResult<Image> {
        Ok(image.clone())
    }

    async fn delete_image(&self, _vim: &InfrastructureInstance, _image: &Image) -> DriverResult<bool> {
        Ok(true)
    }

    async fn copy_image(&self, _vim: &InfrastructureInstance, image: &Image, _content: &[u8]) -> DriverResult<Image> {
        let mut copied = image.clone();
        copied.ext_id = format!("image-{}", self.next_id());
        Ok(copied)
    }

    async fn list_flavors(&self, vim: &InfrastructureInstance) -> DriverResult<Vec<DeploymentFlavour>> {
        Ok(vim.flavours.clone())
    }

    async fn add_flavor(&self, _vim: &InfrastructureInstance, flavor: &DeploymentFlavour) -> DriverResult<DeploymentFlavour> {
        let mut added = flavor.clone();
        added.ext_id = format!("flavor-{}", self.next_id());
        Ok(added)
    }

    async fn update_flavor(&self, _vim: &InfrastructureInstance, flavor: &DeploymentFlavour) -> DriverResult<DeploymentFlavour> {
        Ok(flavor.clone())
    }

    async fn delete_flavor(&self, _vim: &InfrastructureInstance, _ext_id: &str) -> DriverResult<bool> {
        Ok(true)
    }

    async fn list_networks(&self, _vim: &InfrastructureInstance) -> DriverResult<Vec<Network>> {
        Ok(self.state.lock().networks.clone())
    }

    async fn get_network(&self, _vim: &InfrastructureInstance, ext_id: &str) -> DriverResult<Network> {
        self.state
            .lock()
            .networks
            .iter()
            .find(|network| network.ext_id.as_deref() == Some(ext_id))
            .cloned()
            .ok_or_else(|| DriverError::new(format!("network {ext_id} not found")))
    }

    async fn create_network(&self, _vim: &InfrastructureInstance, network: &Network) -> DriverResult<Network> {
        let mut created = network.clone();
        created.ext_id = Some(format!("net-{}", self.next_id()));
        created.subnets.clear();
        self.state.lock().networks.push(created.clone());
        Ok(created)
    }

    async fn update_network(&self, _vim: &InfrastructureInstance, network: &Network) -> DriverResult<Network> {
        let mut state = self.state.lock();
        match state
            .networks
            .iter_mut()
            .find(|existing| existing.ext_id == network.ext_id)
        {
            Some(existing) => {
                existing.name = network.name.clone();
                Ok(network.clone())
            }
            None => Err(DriverError::new(format!("network {:?} not found", network.ext_id))),
        }
    }

    async fn delete_network(&self, _vim: &InfrastructureInstance, ext_id: &str) -> DriverResult<bool> {
        let mut state = self.state.lock();
        let before = state.networks.len();
        state
            .networks
            .retain(|network| network.ext_id.as_deref() != Some(ext_id));
        state.subnets.retain(|_, network| network.as_str() != ext_id);
        Ok(state.networks.len() < before)
    }

    async fn create_subnet(&self, _vim: &InfrastructureInstance, network: &Network, subnet: &Subnet) -> DriverResult<Subnet> {
        let network_ext_id = network
            .ext_id
            .clone()
            .ok_or_else(|| DriverError::new("network has no external id"))?;
        let ext_id = format!("subnet-{}", self.next_id());
        self.state.lock().subnets.insert(ext_id.clone(), network_ext_id);
        self.created_subnets.fetch_add(1, Ordering::SeqCst);

        let mut created = subnet.clone();
        created.ext_id = Some(ext_id);
        Ok(created)
    }

    async fn update_subnet(&self, _vim: &InfrastructureInstance, _network: &Network, subnet: &Subnet) -> DriverResult<Subnet> {
        self.updated_subnets.fetch_add(1, Ordering::SeqCst);
        Ok(subnet.clone())
    }

    async fn delete_subnet(&self, _vim: &InfrastructureInstance, ext_id: &str) -> DriverResult<bool> {
        self.deleted_subnets.fetch_add(1, Ordering::SeqCst);
        Ok(self.state.lock().subnets.remove(ext_id).is_some())
    }

    async fn subnet_ext_ids(&self, _vim: &InfrastructureInstance, network_ext_id: &str) -> DriverResult<Vec<String>> {
        Ok(self
            .state
            .lock()
            .subnets
            .iter()
            .filter(|(_, network)| network.as_str() == network_ext_id)
            .map(|(ext_id, _)| ext_id.clone())
            .collect())
    }

    async fn launch_instance_and_wait(&self, vim: &InfrastructureInstance, request: &LaunchRequest) -> DriverResult<Server> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        let script = self.state.lock().launch_script;
        match script {
            LaunchScript::Succeed => {
                let server = self.build_server(vim, request);
                self.state.lock().servers.push(server.clone());
                Ok(server)
            }
            LaunchScript::FailWithServer => {
                let server = self.build_server(vim, request);
                self.state.lock().servers.push(server.clone());
                Err(DriverError::with_server("server went to ERROR while booting", server))
            }
            LaunchScript::FailAfterCreating => {
                let server = self.build_server(vim, request);
                self.state.lock().servers.push(server);
                Err(DriverError::new("timed out waiting for the server"))
            }
            LaunchScript::FailClean => Err(DriverError::new("no valid host was found")),
        }
    }

    async fn list_servers(&self, _vim: &InfrastructureInstance) -> DriverResult<Vec<Server>> {
        Ok(self.state.lock().servers.clone())
    }

    async fn delete_server_and_wait(&self, _vim: &InfrastructureInstance, ext_id: &str) -> DriverResult<()> {
        let mut state = self.state.lock();
        if state.undeletable.contains(ext_id) {
            return Err(DriverError::new(format!("server {ext_id} is locked")));
        }
        state
            .servers
            .retain(|server| server.ext_id.as_deref() != Some(ext_id));
        self.deleted_servers.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get_quota(&self, _vim: &InfrastructureInstance) -> DriverResult<Quota> {
        Ok(self.state.lock().quota.clone())
    }

    async fn refresh(&self, vim: &InfrastructureInstance) -> DriverResult<InfrastructureInstance> {
        let mut refreshed = vim.clone();
        refreshed.networks = self.state.lock().networks.clone();
        Ok(refreshed)
    }
}
