#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # NFVO Core
//!
//! Orchestration core of a Network Function Virtualization Orchestrator: it
//! drives the lifecycle of virtual network functions spread across virtual
//! infrastructure managers (VIMs), coordinating remote VNF-manager agents
//! over an asynchronous messaging channel.
//!
//! ## Module Organization
//!
//! - [`models`] - Descriptors, records, infrastructure entities and [`Status`]
//! - [`repository`] - Version-checked repository contract and in-memory store
//! - [`vim`] - Infrastructure abstraction with compensating allocation recovery
//! - [`messaging`] - Lifecycle messages, gateway, agent registry and receiver
//! - [`events`] - Event publication and event endpoint subscriptions
//! - [`orchestration`] - Worker pool, dispatcher, reconciler, deployment and tasks
//! - [`config`] - Layered configuration
//! - [`logging`] - Structured logging bootstrap
//! - [`error`] - Error taxonomy
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use nfvo_core::config::NfvoConfig;
//! use nfvo_core::messaging::ManagerRegistry;
//! use nfvo_core::orchestration::{OrchestrationCore, VnfmManager};
//! use nfvo_core::repository::Repositories;
//! use nfvo_core::vim::VimBroker;
//! use std::sync::Arc;
//!
//! # async fn example() -> nfvo_core::NfvoResult<()> {
//! nfvo_core::logging::init_structured_logging();
//!
//! let core = Arc::new(OrchestrationCore::from_config(
//!     NfvoConfig::default(),
//!     Repositories::in_memory(),
//!     ManagerRegistry::new(),
//!     VimBroker::new(),
//!     Vec::new(),
//! ));
//! let manager = VnfmManager::new(core)?;
//! # let _ = manager;
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # Unit and integration tests
//! cargo bench --features benchmarks
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod logging;
pub mod messaging;
pub mod models;
pub mod orchestration;
pub mod repository;
pub mod vim;

pub use config::{ConfigLoader, NfvoConfig};
pub use error::{NfvoError, NfvoResult, RepositoryError, VimError, VimResult};
pub use events::EventPublisher;
pub use messaging::{Action, LifecycleMessage, MessagingGateway, VnfmReceiver};
pub use models::Status;
pub use orchestration::{OrchestrationCore, TaskDispatcher, VnfmManager};
pub use vim::{GenericVim, Vim, VimBroker, VimDriver};
