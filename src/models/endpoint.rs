//! Registrations of remote agents and event subscribers.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Transport kind declared by an agent endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EndpointType {
    #[default]
    Rabbit,
    Rest,
}

impl fmt::Display for EndpointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rabbit => write!(f, "RABBIT"),
            Self::Rest => write!(f, "REST"),
        }
    }
}

/// Registration record of a remote VNF-manager agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManagerEndpoint {
    pub id: String,
    /// Logical endpoint name referenced by function records.
    pub endpoint: String,
    /// Function type handled by this agent.
    #[serde(rename = "type")]
    pub function_type: String,
    pub endpoint_type: EndpointType,
    pub description: Option<String>,
    pub enabled: bool,
    pub active: bool,
}

impl ManagerEndpoint {
    pub fn new(
        endpoint: impl Into<String>,
        function_type: impl Into<String>,
        endpoint_type: EndpointType,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            endpoint: endpoint.into(),
            function_type: function_type.into(),
            endpoint_type,
            description: None,
            enabled: true,
            active: true,
        }
    }

    pub fn is_available(&self) -> bool {
        self.enabled && self.active
    }
}

/// Subscription of an external listener to orchestrator events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventEndpoint {
    pub id: String,
    pub name: String,
    /// Event name the listener wants, e.g. `INSTANTIATE_FINISH`.
    pub event: String,
    /// Restrict to one service record; `None` for all.
    pub network_service_id: Option<String>,
    pub endpoint: String,
    #[serde(rename = "type")]
    pub endpoint_type: EndpointType,
}

impl EventEndpoint {
    pub fn new(name: impl Into<String>, event: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            event: event.into(),
            network_service_id: None,
            endpoint: endpoint.into(),
            endpoint_type: EndpointType::Rabbit,
        }
    }

    /// True if this subscription wants `event` about `service_record_id`.
    pub fn matches(&self, event: &str, service_record_id: Option<&str>) -> bool {
        if self.event != event {
            return false;
        }
        match (&self.network_service_id, service_record_id) {
            (None, _) => true,
            (Some(wanted), Some(actual)) => wanted == actual,
            (Some(_), None) => false,
        }
    }
}
