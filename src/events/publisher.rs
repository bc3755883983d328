use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

use super::registry::EventEndpointRegistry;
use crate::messaging::Action;

/// Broadcast publisher for lifecycle events
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<PublishedEvent>,
    endpoints: Arc<EventEndpointRegistry>,
}

/// Event that has been published
#[derive(Debug, Clone)]
pub struct PublishedEvent {
    pub action: Action,
    pub context: Value,
    /// Names of the registered event endpoints interested in this event
    pub recipients: Vec<String>,
    pub published_at: chrono::DateTime<chrono::Utc>,
}

impl EventPublisher {
    /// Create a new event publisher with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        Self::with_endpoints(capacity, Arc::new(EventEndpointRegistry::new()))
    }

    pub fn with_endpoints(capacity: usize, endpoints: Arc<EventEndpointRegistry>) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender, endpoints }
    }

    pub fn endpoints(&self) -> &Arc<EventEndpointRegistry> {
        &self.endpoints
    }

    /// Publish an event for `action`.
    ///
    /// Fire-and-forget: publishing with no live subscriber is not an error.
    /// Endpoints registered for a single service record are selected by the
    /// `parent_id` field of `context` (function records) or else its `id`.
    pub async fn publish(&self, action: Action, context: Value) {
        let service_record_id = context
            .get("parent_id")
            .and_then(Value::as_str)
            .or_else(|| context.get("id").and_then(Value::as_str));
        let recipients = self
            .endpoints
            .matching(action.as_str(), service_record_id)
            .into_iter()
            .map(|endpoint| endpoint.name)
            .collect::<Vec<_>>();

        debug!(
            action = %action,
            service_record_id = service_record_id,
            recipients = recipients.len(),
            "📣 EVENTS: Publishing event"
        );

        let event = PublishedEvent {
            action,
            context,
            recipients,
            published_at: chrono::Utc::now(),
        };

        // No receivers is acceptable for event publishing
        let _ = self.sender.send(event);
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(1000)
    }
}
