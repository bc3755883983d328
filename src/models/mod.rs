//! # Domain Models
//!
//! Descriptors (templates), records (running instances), infrastructure
//! entities and agent endpoints.

pub mod descriptor;
pub mod endpoint;
pub mod infrastructure;
pub mod record;
pub mod status;

pub use descriptor::{
    ComponentTemplate, ConnectionPoint, Dependency, DeploymentFlavour, DeploymentUnit,
    FunctionDescriptor, ServiceDescriptor,
};
pub use endpoint::{EndpointType, EventEndpoint, ManagerEndpoint};
pub use infrastructure::{
    Image, ImageSource, InfrastructureInstance, Key, Network, ProviderExtras, Quota, Server,
    Subnet,
};
pub use record::{
    ComponentInstance, FunctionRecord, Ip, RecordDependency, ServiceRecord, VirtualLinkRecord,
};
pub use status::Status;

/// A versioned, identifiable entity held by a repository.
///
/// The version is owned by the repository: it is bumped on every successful
/// save and compared against the stored one to detect stale writes.
pub trait Entity: Clone + Send + Sync + 'static {
    /// Entity kind used in conflict errors and logs
    const KIND: &'static str;

    fn id(&self) -> &str;
    fn version(&self) -> u64;
    fn set_version(&mut self, version: u64);
}
