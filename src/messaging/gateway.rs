//! # Messaging Gateway
//!
//! Delivers lifecycle messages to remote agents. The transport is chosen by
//! the endpoint's declared [`EndpointType`] from a closed table of senders
//! built at startup.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use super::message::LifecycleMessage;
use super::registry::ManagerRegistry;
use crate::error::{NfvoError, NfvoResult};
use crate::logging::log_message_operation;
use crate::models::{EndpointType, ManagerEndpoint};

/// One transport able to deliver messages to agents of a given kind.
#[async_trait]
pub trait VnfmSender: Send + Sync {
    fn endpoint_type(&self) -> EndpointType;

    /// Deliver `message` to `endpoint`. Must not wait for a reply.
    async fn send(&self, message: &LifecycleMessage, endpoint: &ManagerEndpoint) -> NfvoResult<()>;
}

#[derive(Clone)]
pub struct MessagingGateway {
    senders: Arc<HashMap<EndpointType, Arc<dyn VnfmSender>>>,
    managers: ManagerRegistry,
}

impl MessagingGateway {
    pub fn new(managers: ManagerRegistry, senders: Vec<Arc<dyn VnfmSender>>) -> Self {
        let mut table: HashMap<EndpointType, Arc<dyn VnfmSender>> = HashMap::new();
        for sender in senders {
            let kind = sender.endpoint_type();
            if table.insert(kind, sender).is_some() {
                warn!(endpoint_type = %kind, "📨 GATEWAY: Replacing sender for endpoint type");
            }
        }
        Self {
            senders: Arc::new(table),
            managers,
        }
    }

    pub fn managers(&self) -> &ManagerRegistry {
        &self.managers
    }

    pub fn supports(&self, endpoint_type: EndpointType) -> bool {
        self.senders.contains_key(&endpoint_type)
    }

    /// Deliver `message` through the sender registered for the endpoint's kind
    pub async fn send(&self, message: &LifecycleMessage, endpoint: &ManagerEndpoint) -> NfvoResult<()> {
        let action = message.action();
        let sender = self.senders.get(&endpoint.endpoint_type).ok_or_else(|| {
            NfvoError::not_found(format!(
                "No sender registered for endpoint type {}",
                endpoint.endpoint_type
            ))
        })?;

        debug!(
            action = %action,
            endpoint = %endpoint.endpoint,
            endpoint_type = %endpoint.endpoint_type,
            "📨 GATEWAY: Sending message"
        );

        sender.send(message, endpoint).await?;

        log_message_operation(
            "send",
            action.as_str(),
            Some(&endpoint.endpoint),
            message.record().map(|record| record.id.as_str()),
            "sent",
        );
        Ok(())
    }

    /// Resolve the agent registered under `endpoint_name`, then send
    pub async fn send_to(&self, message: &LifecycleMessage, endpoint_name: &str) -> NfvoResult<()> {
        let endpoint = self.managers.resolve(endpoint_name)?;
        self.send(message, &endpoint).await
    }
}

impl std::fmt::Debug for MessagingGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessagingGateway")
            .field("endpoint_types", &self.senders.keys().collect::<Vec<_>>())
            .field("managers", &self.managers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::channel::ChannelSender;
    use crate::messaging::Action;
    use crate::models::FunctionRecord;

    #[tokio::test]
    async fn test_send_routes_by_endpoint_type() {
        let managers = ManagerRegistry::new();
        managers.register(ManagerEndpoint::new("generic", "fw", EndpointType::Rabbit));
        let (sender, mut outbox) = ChannelSender::new(EndpointType::Rabbit, 8);
        let gateway = MessagingGateway::new(managers, vec![Arc::new(sender)]);

        let message = LifecycleMessage::generic(Action::Start, FunctionRecord::new("fw", "generic"));
        gateway.send_to(&message, "generic").await.unwrap();

        let delivered = outbox.recv().await.unwrap();
        assert_eq!(delivered.endpoint, "generic");
        assert_eq!(delivered.message.action(), Action::Start);
    }

    #[tokio::test]
    async fn test_unknown_transport_is_not_found() {
        let managers = ManagerRegistry::new();
        managers.register(ManagerEndpoint::new("rest-agent", "fw", EndpointType::Rest));
        let (sender, _outbox) = ChannelSender::new(EndpointType::Rabbit, 8);
        let gateway = MessagingGateway::new(managers, vec![Arc::new(sender)]);

        let message = LifecycleMessage::generic(Action::Stop, FunctionRecord::new("fw", "rest-agent"));
        let error = gateway.send_to(&message, "rest-agent").await.unwrap_err();
        assert!(error.is_not_found());

        let error = gateway.send_to(&message, "missing").await.unwrap_err();
        assert!(error.is_not_found());
    }
}
