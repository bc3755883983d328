use dashmap::DashMap;
use tracing::info;

use crate::models::EventEndpoint;

/// External listeners subscribed to orchestrator events.
#[derive(Debug, Default)]
pub struct EventEndpointRegistry {
    endpoints: DashMap<String, EventEndpoint>,
}

impl EventEndpointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, endpoint: EventEndpoint) -> String {
        let id = endpoint.id.clone();
        info!(
            endpoint_id = %id,
            event = %endpoint.event,
            "📣 EVENTS: Event endpoint registered"
        );
        self.endpoints.insert(id.clone(), endpoint);
        id
    }

    pub fn unregister(&self, id: &str) -> Option<EventEndpoint> {
        let removed = self.endpoints.remove(id).map(|(_, endpoint)| endpoint);
        if removed.is_some() {
            info!(endpoint_id = %id, "📣 EVENTS: Event endpoint unregistered");
        }
        removed
    }

    /// Endpoints subscribed to `event` for the given service record.
    pub fn matching(&self, event: &str, service_record_id: Option<&str>) -> Vec<EventEndpoint> {
        self.endpoints
            .iter()
            .filter(|entry| entry.value().matches(event, service_record_id))
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
