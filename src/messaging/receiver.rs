//! Inbound side of the agent protocol.
//!
//! [`VnfmReceiver`] takes envelopes read from the orchestrator's channels and
//! routes them: lifecycle actions to the dispatcher, agent registrations to
//! the [`ManagerRegistry`], event subscriptions to the
//! [`EventEndpointRegistry`]. Transport adapters only need to hand over the
//! channel name and the decoded JSON payload.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use super::message::LifecycleMessage;
use super::registry::ManagerRegistry;
use crate::constants::channels;
use crate::error::{NfvoError, NfvoResult};
use crate::events::EventEndpointRegistry;
use crate::models::{EventEndpoint, ManagerEndpoint};
use crate::orchestration::TaskDispatcher;

/// A payload read from one of the orchestrator's channels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub channel: String,
    pub payload: Value,
}

impl Envelope {
    pub fn new(channel: impl Into<String>, payload: Value) -> Self {
        Self {
            channel: channel.into(),
            payload,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationAction {
    Register,
    Unregister,
}

/// Payload of the manager handling channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagerRegistration {
    pub action: RegistrationAction,
    pub endpoint: ManagerEndpoint,
}

#[derive(Debug, Clone, Deserialize)]
struct EventUnregistration {
    id: String,
}

#[derive(Debug, Clone)]
pub struct VnfmReceiver {
    dispatcher: TaskDispatcher,
    managers: ManagerRegistry,
    event_endpoints: Arc<EventEndpointRegistry>,
}

impl VnfmReceiver {
    pub fn new(dispatcher: TaskDispatcher) -> Self {
        let core = dispatcher.core();
        let managers = core.gateway.managers().clone();
        let event_endpoints = Arc::clone(core.events.endpoints());
        Self {
            dispatcher,
            managers,
            event_endpoints,
        }
    }

    /// Route one envelope.
    ///
    /// Returns the reply to publish on the reply path, if the channel has one:
    /// the serialized task result for `vnfm.nfvo.actions.reply` and the new
    /// endpoint id for `nfvo.event.register`.
    pub async fn receive(&self, envelope: Envelope) -> NfvoResult<Option<String>> {
        debug!(channel = %envelope.channel, "📨 RECEIVER: Envelope received");

        match envelope.channel.as_str() {
            channels::VNFM_ACTIONS => {
                let message: LifecycleMessage = serde_json::from_value(envelope.payload)?;
                self.dispatcher.dispatch(message).await?;
                Ok(None)
            }
            channels::VNFM_ACTIONS_REPLY => {
                let message: LifecycleMessage = serde_json::from_value(envelope.payload)?;
                self.dispatcher.dispatch(message).await
            }
            channels::MANAGER_HANDLING => {
                let registration: ManagerRegistration = serde_json::from_value(envelope.payload)?;
                match registration.action {
                    RegistrationAction::Register => self.managers.register(registration.endpoint),
                    RegistrationAction::Unregister => {
                        self.managers.unregister(&registration.endpoint.endpoint);
                    }
                }
                Ok(None)
            }
            channels::EVENT_REGISTER => {
                let endpoint: EventEndpoint = serde_json::from_value(envelope.payload)?;
                Ok(Some(self.event_endpoints.register(endpoint)))
            }
            channels::EVENT_UNREGISTER => {
                let request: EventUnregistration = serde_json::from_value(envelope.payload)?;
                if self.event_endpoints.unregister(&request.id).is_none() {
                    info!(endpoint_id = %request.id, "📨 RECEIVER: Unknown event endpoint");
                }
                Ok(None)
            }
            other => Err(NfvoError::InvalidMessage(format!("Unknown channel '{other}'"))),
        }
    }
}
