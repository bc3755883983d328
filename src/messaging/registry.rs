use dashmap::DashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{NfvoError, NfvoResult};
use crate::models::ManagerEndpoint;

/// Registered VNF-manager agents, keyed by endpoint name.
#[derive(Debug, Clone, Default)]
pub struct ManagerRegistry {
    endpoints: Arc<DashMap<String, ManagerEndpoint>>,
}

impl ManagerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an agent, replacing any previous registration under the same name
    pub fn register(&self, endpoint: ManagerEndpoint) {
        let name = endpoint.endpoint.clone();
        if self.endpoints.insert(name.clone(), endpoint).is_some() {
            warn!(endpoint = %name, "🤝 MANAGERS: Replacing existing agent registration");
        } else {
            info!(endpoint = %name, "🤝 MANAGERS: Agent registered");
        }
    }

    pub fn unregister(&self, endpoint_name: &str) -> Option<ManagerEndpoint> {
        let removed = self.endpoints.remove(endpoint_name).map(|(_, endpoint)| endpoint);
        match &removed {
            Some(_) => info!(endpoint = %endpoint_name, "🤝 MANAGERS: Agent unregistered"),
            None => warn!(
                endpoint = %endpoint_name,
                "🤝 MANAGERS: Attempted to unregister unknown agent"
            ),
        }
        removed
    }

    pub fn get(&self, endpoint_name: &str) -> Option<ManagerEndpoint> {
        self.endpoints
            .get(endpoint_name)
            .map(|entry| entry.value().clone())
    }

    /// The enabled and active agent registered under `endpoint_name`
    pub fn resolve(&self, endpoint_name: &str) -> NfvoResult<ManagerEndpoint> {
        self.get(endpoint_name)
            .filter(ManagerEndpoint::is_available)
            .ok_or_else(|| {
                NfvoError::not_found(format!(
                    "No active VNF manager registered for endpoint '{endpoint_name}'"
                ))
            })
    }

    pub fn endpoints(&self) -> Vec<ManagerEndpoint> {
        self.endpoints
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}
