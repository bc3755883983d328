//! Fixture builders for integration tests.
//! A [`Harness`] wires a full orchestration core over in-memory repositories,
//! a [`FakeDriver`] and an in-process outbound channel.

#![allow(dead_code)]

use std::sync::Arc;
use tokio::sync::mpsc;

use nfvo_core::config::NfvoConfig;
use nfvo_core::messaging::{ChannelSender, ManagerRegistry, OutboundMessage, VnfmSender};
use nfvo_core::models::{
    ComponentTemplate, ConnectionPoint, Dependency, DeploymentFlavour, DeploymentUnit, EndpointType,
    FunctionDescriptor, FunctionRecord, Image, InfrastructureInstance, ManagerEndpoint,
    ProviderExtras, ServiceDescriptor, ServiceRecord,
};
use nfvo_core::orchestration::{OrchestrationCore, VnfmManager};
use nfvo_core::repository::Repositories;
use nfvo_core::vim::{GenericVim, VimBroker};

use super::fake_driver::FakeDriver;

pub const AGENT_ENDPOINT: &str = "generic";
pub const VIM_TYPE: &str = "openstack";
pub const FLAVOUR_KEY: &str = "m1.small";

/// An OpenStack-flavoured VIM with two images and one flavour.
pub fn openstack_vim(name: &str) -> InfrastructureInstance {
    let mut vim = InfrastructureInstance::new(name, VIM_TYPE);
    vim.provider = ProviderExtras::OpenStack {
        key_pair: Some("nfvo".to_string()),
        security_groups: ["default".to_string()].into_iter().collect(),
    };
    vim.images = vec![Image::new("ubuntu", "img-ubuntu"), Image::new("cirros", "img-cirros")];
    vim.flavours = vec![DeploymentFlavour::new(FLAVOUR_KEY, "flv-small")];
    vim
}

/// A component connected to each of `links`; the first link requests a
/// floating IP when `floating` is set.
pub fn component(links: &[&str], floating: bool) -> ComponentTemplate {
    let connection_points = links
        .iter()
        .enumerate()
        .map(|(i, link)| {
            let cp = ConnectionPoint::new(*link);
            if floating && i == 0 {
                cp.with_floating_ip("random")
            } else {
                cp
            }
        })
        .collect();
    ComponentTemplate::new(connection_points)
}

pub fn deployment_unit(name: &str, components: Vec<ComponentTemplate>) -> DeploymentUnit {
    let mut unit = DeploymentUnit::new(name);
    unit.vm_images = vec!["ubuntu".to_string()];
    unit.components = components;
    unit
}

pub fn function_descriptor(name: &str) -> FunctionDescriptor {
    let mut function = FunctionDescriptor::new(name, AGENT_ENDPOINT);
    function
        .deployment_flavours
        .push(DeploymentFlavour::new(FLAVOUR_KEY, "flv-small"));
    function.deployment_units.push(deployment_unit(
        &format!("{name}-vdu"),
        vec![component(&["mgmt"], false)],
    ));
    function
}

/// A service descriptor over `names`, with dependencies as `(source, target)` pairs.
pub fn service_descriptor(names: &[&str], dependencies: &[(&str, &str)]) -> ServiceDescriptor {
    let mut descriptor = ServiceDescriptor::new("test-ns");
    descriptor.functions = names.iter().map(|name| function_descriptor(name)).collect();
    descriptor.dependencies = dependencies
        .iter()
        .map(|(source, target)| Dependency::new(*source, *target))
        .collect();
    descriptor
}

/// The function record an agent would report for `function`.
pub fn function_record(function: &FunctionDescriptor, service_record: &ServiceRecord) -> FunctionRecord {
    let mut record = FunctionRecord::new(function.name.clone(), function.endpoint.clone())
        .with_parent(service_record.id.clone());
    record.descriptor_reference = function.id.clone();
    record.deployment_flavour_key = FLAVOUR_KEY.to_string();
    record.deployment_units = function.deployment_units.clone();
    record
}

pub struct HarnessBuilder {
    config: NfvoConfig,
    driver: FakeDriver,
    register_agent: bool,
}

impl HarnessBuilder {
    pub fn new() -> Self {
        let mut config = NfvoConfig::default();
        config.orchestration.executor.core_pool_size = 2;
        config.orchestration.executor.max_pool_size = 4;
        config.orchestration.executor.queue_capacity = 32;
        Self {
            config,
            driver: FakeDriver::new(),
            register_agent: true,
        }
    }

    /// Replace the whole configuration, e.g. one read by [`nfvo_core::ConfigLoader`].
    pub fn config(mut self, config: NfvoConfig) -> Self {
        self.config = config;
        self
    }

    pub fn ordered(mut self, ordered: bool) -> Self {
        self.config.orchestration.ordered = ordered;
        self
    }

    pub fn check_integrity(mut self, enabled: bool) -> Self {
        self.config.orchestration.check_integrity = enabled;
        self
    }

    pub fn driver(mut self, driver: FakeDriver) -> Self {
        self.driver = driver;
        self
    }

    pub fn without_agent(mut self) -> Self {
        self.register_agent = false;
        self
    }

    pub fn build(self) -> Harness {
        let managers = ManagerRegistry::new();
        if self.register_agent {
            managers.register(ManagerEndpoint::new(
                AGENT_ENDPOINT,
                AGENT_ENDPOINT,
                EndpointType::Rabbit,
            ));
        }

        let (sender, outbound) = ChannelSender::new(EndpointType::Rabbit, 64);
        let driver = Arc::new(self.driver);
        let vim = GenericVim::new(Arc::clone(&driver) as Arc<dyn nfvo_core::vim::VimDriver>);
        let vims = VimBroker::new().with_vim(VIM_TYPE, Arc::new(vim));

        let core = Arc::new(OrchestrationCore::from_config(
            self.config,
            Repositories::in_memory(),
            managers,
            vims,
            vec![Arc::new(sender) as Arc<dyn VnfmSender>],
        ));
        let manager = VnfmManager::new(Arc::clone(&core)).expect("default task table is complete");

        Harness {
            core,
            manager,
            driver,
            outbound,
        }
    }
}

impl Default for HarnessBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Harness {
    pub core: Arc<OrchestrationCore>,
    pub manager: VnfmManager,
    pub driver: Arc<FakeDriver>,
    pub outbound: mpsc::Receiver<OutboundMessage>,
}

impl Harness {
    pub fn new() -> Self {
        HarnessBuilder::new().build()
    }

    /// Store `descriptor` and a fresh service record for it.
    pub async fn seed_service(&self, descriptor: &ServiceDescriptor) -> ServiceRecord {
        let repositories = &self.core.repositories;
        repositories
            .service_descriptors
            .save(descriptor.clone())
            .await
            .expect("descriptor saved");

        let mut service_record = ServiceRecord::new(descriptor.name.clone(), descriptor.id.clone());
        service_record.project_id = "project-1".to_string();
        repositories
            .service_records
            .save(service_record)
            .await
            .expect("service record saved")
    }

    /// Store a function record and attach it to its service record.
    pub async fn seed_function(&self, record: FunctionRecord) -> FunctionRecord {
        let saved = self.core.persist_function(record).await.expect("record saved");
        self.core.attach_to_service(&saved).await.expect("record attached");
        saved
    }

    pub async fn seed_vim(&self, vim: InfrastructureInstance) -> InfrastructureInstance {
        self.core
            .repositories
            .vim_instances
            .save(vim)
            .await
            .expect("vim saved")
    }

    pub async fn service_record(&self, id: &str) -> Option<ServiceRecord> {
        self.core
            .repositories
            .service_records
            .find_by_id(id)
            .await
            .expect("repository readable")
    }

    pub async fn stored_function(&self, id: &str) -> FunctionRecord {
        self.core
            .repositories
            .function_records
            .find_by_id(id)
            .await
            .expect("repository readable")
            .expect("function record stored")
    }

    /// Everything sent to agents so far.
    pub fn drain_outbound(&mut self) -> Vec<OutboundMessage> {
        let mut messages = Vec::new();
        while let Ok(message) = self.outbound.try_recv() {
            messages.push(message);
        }
        messages
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
