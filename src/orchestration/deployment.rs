//! # Deployment Coordinator
//!
//! Turns a service descriptor into one INSTANTIATE request per function and
//! sends them to the agents owning those functions.
//!
//! In ordered mode functions are grouped into waves of equal dependency
//! weight. The first wave is sent immediately; the rest are kept in a
//! [`DeploymentSession`] owned by the coordinator and released one wave at a
//! time, once every function of the previous wave reported INSTANTIATE. The
//! session is dropped when its last wave is sent or the deployment fails.

use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::dependency::deployment_waves;
use crate::config::NfvoConfig;
use crate::constants::extension;
use crate::error::{NfvoError, NfvoResult};
use crate::messaging::{InstantiateRequest, LifecycleMessage, MessagingGateway};
use crate::models::{
    FunctionDescriptor, FunctionRecord, InfrastructureInstance, Key, ServiceDescriptor, ServiceRecord,
};
use crate::repository::Repositories;

/// State of one ordered deployment between two waves.
#[derive(Debug)]
pub struct DeploymentSession {
    service_record: ServiceRecord,
    keys: Vec<Key>,
    /// Descriptor ids of the in-flight wave that have not reported yet
    awaiting: HashSet<String>,
    waves: VecDeque<Vec<FunctionDescriptor>>,
}

impl DeploymentSession {
    pub fn remaining_waves(&self) -> usize {
        self.waves.len()
    }

    pub fn awaiting(&self) -> usize {
        self.awaiting.len()
    }
}

#[derive(Debug)]
pub struct DeploymentCoordinator {
    config: Arc<NfvoConfig>,
    repositories: Repositories,
    gateway: MessagingGateway,
    sessions: Mutex<HashMap<String, DeploymentSession>>,
}

impl DeploymentCoordinator {
    pub fn new(config: Arc<NfvoConfig>, repositories: Repositories, gateway: MessagingGateway) -> Self {
        Self {
            config,
            repositories,
            gateway,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Send the INSTANTIATE requests of `descriptor` for `service_record`.
    ///
    /// Returns the number of requests sent now. Cyclic dependency graphs are
    /// rejected in ordered mode before anything is sent.
    pub async fn deploy(
        &self,
        descriptor: &ServiceDescriptor,
        service_record: &ServiceRecord,
        keys: &[Key],
    ) -> NfvoResult<usize> {
        if !self.config.orchestration.ordered {
            info!(
                service_record_id = %service_record.id,
                functions = descriptor.functions.len(),
                "🚀 DEPLOY: Deploying all functions at once"
            );
            return self.send_wave(&descriptor.functions, service_record, keys).await;
        }

        let mut waves: VecDeque<Vec<FunctionDescriptor>> = deployment_waves(descriptor)?.into();
        let Some(first) = waves.pop_front() else {
            return Ok(0);
        };

        info!(
            service_record_id = %service_record.id,
            waves = waves.len() + 1,
            "🚀 DEPLOY: Deploying functions in dependency order"
        );

        if !waves.is_empty() {
            let session = DeploymentSession {
                service_record: service_record.clone(),
                keys: keys.to_vec(),
                awaiting: first.iter().map(|function| function.id.clone()).collect(),
                waves,
            };
            self.sessions.lock().insert(service_record.id.clone(), session);
        }

        match self.send_wave(&first, service_record, keys).await {
            Ok(sent) => Ok(sent),
            Err(error) => {
                self.abort(&service_record.id);
                Err(error)
            }
        }
    }

    /// Record that `record` was instantiated and send the next wave when the
    /// current one is complete. Returns the number of requests sent.
    pub async fn on_function_instantiated(&self, record: &FunctionRecord) -> NfvoResult<usize> {
        let Some(service_record_id) = record.parent_id.as_deref() else {
            return Ok(0);
        };

        let next = {
            let mut sessions = self.sessions.lock();
            let Some(session) = sessions.get_mut(service_record_id) else {
                return Ok(0);
            };
            session.awaiting.remove(&record.descriptor_reference);
            if !session.awaiting.is_empty() {
                debug!(
                    service_record_id = %service_record_id,
                    awaiting = session.awaiting.len(),
                    "🚀 DEPLOY: Waiting for the rest of the wave"
                );
                return Ok(0);
            }

            let Some(wave) = session.waves.pop_front() else {
                sessions.remove(service_record_id);
                return Ok(0);
            };
            session.awaiting = wave.iter().map(|function| function.id.clone()).collect();
            let context = (session.service_record.clone(), session.keys.clone());
            if session.waves.is_empty() {
                sessions.remove(service_record_id);
            }
            (wave, context)
        };

        let (wave, (service_record, keys)) = next;
        info!(
            service_record_id = %service_record.id,
            functions = wave.len(),
            "🚀 DEPLOY: Previous wave instantiated, sending next wave"
        );
        match self.send_wave(&wave, &service_record, &keys).await {
            Ok(sent) => Ok(sent),
            Err(error) => {
                self.abort(&service_record.id);
                Err(error)
            }
        }
    }

    /// Drop the ordered deployment of `service_record_id`, if any.
    pub fn abort(&self, service_record_id: &str) -> bool {
        let removed = self.sessions.lock().remove(service_record_id).is_some();
        if removed {
            warn!(service_record_id = %service_record_id, "🚀 DEPLOY: Ordered deployment aborted");
        }
        removed
    }

    /// Waves not yet sent for `service_record_id`, if it has a session.
    pub fn pending_waves(&self, service_record_id: &str) -> Option<usize> {
        self.sessions
            .lock()
            .get(service_record_id)
            .map(DeploymentSession::remaining_waves)
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Extension map sent with every INSTANTIATE request.
    pub fn build_extension(&self, service_record_id: &str) -> BTreeMap<String, String> {
        build_extension(&self.config, service_record_id)
    }

    async fn send_wave(
        &self,
        functions: &[FunctionDescriptor],
        service_record: &ServiceRecord,
        keys: &[Key],
    ) -> NfvoResult<usize> {
        let vims = self.repositories.vim_instances.find_all().await?;
        for function in functions {
            let request = self.instantiate_request(function, service_record, keys, &vims)?;
            self.gateway
                .send_to(&LifecycleMessage::InstantiateRequest(request), &function.endpoint)
                .await?;
            debug!(
                service_record_id = %service_record.id,
                function = %function.name,
                endpoint = %function.endpoint,
                "🚀 DEPLOY: INSTANTIATE sent"
            );
        }
        Ok(functions.len())
    }

    fn instantiate_request(
        &self,
        function: &FunctionDescriptor,
        service_record: &ServiceRecord,
        keys: &[Key],
        vims: &[InfrastructureInstance],
    ) -> NfvoResult<InstantiateRequest> {
        let deployment_flavour = function.deployment_flavours.first().cloned().ok_or_else(|| {
            NfvoError::not_found(format!("Function {} has no deployment flavour", function.name))
        })?;

        let mut unit_vims = BTreeMap::new();
        for unit in &function.deployment_units {
            unit_vims.insert(unit.id.clone(), select_vims(&unit.vim_instance_names, vims)?);
        }

        Ok(InstantiateRequest {
            descriptor: function.clone(),
            deployment_flavour,
            instance_name: function.name.clone(),
            virtual_links: service_record.virtual_links.clone(),
            extension: self.build_extension(&service_record.id),
            vims: unit_vims,
            keys: keys.to_vec(),
            package_id: function.package_id.clone(),
        })
    }
}

/// Extension map carrying broker, monitoring and EMS settings plus the
/// owning service record id.
pub fn build_extension(config: &NfvoConfig, service_record_id: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        (extension::BROKER_IP.to_string(), config.broker.ip.clone()),
        (extension::MONITORING_IP.to_string(), config.monitoring.ip.clone()),
        (extension::TIMEZONE.to_string(), config.timezone.clone()),
        (extension::EMS_VERSION.to_string(), config.ems.version.clone()),
        (extension::USERNAME.to_string(), config.broker.username.clone()),
        (extension::PASSWORD.to_string(), config.broker.password.clone()),
        (extension::EXCHANGE_NAME.to_string(), config.broker.exchange.clone()),
        (extension::EMS_HEARTBEAT.to_string(), config.ems.heartbeat.clone()),
        (extension::EMS_AUTODELETE.to_string(), config.ems.autodelete.clone()),
        (extension::NSR_ID.to_string(), service_record_id.to_string()),
    ])
}

/// VIMs named by a deployment unit; every known VIM when it names none.
fn select_vims(names: &[String], vims: &[InfrastructureInstance]) -> NfvoResult<Vec<InfrastructureInstance>> {
    if names.is_empty() {
        return Ok(vims.to_vec());
    }
    names
        .iter()
        .map(|name| {
            vims.iter()
                .find(|vim| &vim.name == name)
                .cloned()
                .ok_or_else(|| NfvoError::not_found(format!("VimInstance {name}")))
        })
        .collect()
}
