use async_trait::async_trait;
use tokio::sync::mpsc;

use super::gateway::VnfmSender;
use super::message::LifecycleMessage;
use crate::error::{NfvoError, NfvoResult};
use crate::models::{EndpointType, ManagerEndpoint};

/// A message handed to an in-process transport.
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    pub endpoint: String,
    pub message: LifecycleMessage,
}

/// In-process transport over a bounded tokio channel.
///
/// Embedders bridge the receiving half to a real broker; tests read it
/// directly.
#[derive(Debug, Clone)]
pub struct ChannelSender {
    endpoint_type: EndpointType,
    sender: mpsc::Sender<OutboundMessage>,
}

impl ChannelSender {
    pub fn new(endpoint_type: EndpointType, capacity: usize) -> (Self, mpsc::Receiver<OutboundMessage>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (
            Self {
                endpoint_type,
                sender,
            },
            receiver,
        )
    }
}

#[async_trait]
impl VnfmSender for ChannelSender {
    fn endpoint_type(&self) -> EndpointType {
        self.endpoint_type
    }

    async fn send(&self, message: &LifecycleMessage, endpoint: &ManagerEndpoint) -> NfvoResult<()> {
        self.sender
            .send(OutboundMessage {
                endpoint: endpoint.endpoint.clone(),
                message: message.clone(),
            })
            .await
            .map_err(|_| {
                NfvoError::messaging(format!(
                    "Outbound channel for endpoint type {} is closed",
                    self.endpoint_type
                ))
            })
    }
}
