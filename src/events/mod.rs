pub mod publisher;
pub mod registry;

pub use publisher::{EventPublisher, PublishedEvent};
pub use registry::EventEndpointRegistry;
