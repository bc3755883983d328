//! # Orchestration Engine
//!
//! Lifecycle orchestration of network functions across VIMs and agents.
//!
//! ## Core Components
//!
//! - **TaskExecutor**: bounded worker pool running one task per inbound message
//! - **TaskDispatcher**: routes inbound messages to their task through a closed dispatch table
//! - **StatusReconciler**: aggregates function record status into the owning service record
//! - **DeploymentCoordinator**: INSTANTIATE requests per function, in dependency waves when ordered
//! - **VnfmManager**: facade over the engine for the layers above it
//!
//! ## Control Flow
//!
//! ```text
//! deploy -> DeploymentCoordinator -> MessagingGateway -> agent
//! agent -> VnfmReceiver -> TaskDispatcher -> TaskExecutor -> task
//!       task -> Vim / MessagingGateway -> action_finished -> StatusReconciler
//! ```

pub mod core;
pub mod dependency;
pub mod deployment;
pub mod dispatcher;
pub mod executor;
pub mod manager;
pub mod reconciler;
pub mod tasks;

pub use self::core::OrchestrationCore;
pub use dependency::{calculate_weights, deployment_order, deployment_waves, Weights};
pub use deployment::{build_extension, DeploymentCoordinator, DeploymentSession};
pub use dispatcher::TaskDispatcher;
pub use executor::{TaskExecutor, TaskHandle};
pub use manager::VnfmManager;
pub use reconciler::{ReconcileOutcome, StatusReconciler};
pub use tasks::{LifecycleTask, TaskContext, TaskPayload, TaskRegistry};
