//! Error types for the orchestration core.
//!

use crate::models::{ComponentInstance, DeploymentUnit, Server};
use thiserror::Error;

/// Crate-wide error type.
#[derive(Debug, Clone, Error)]
pub enum NfvoError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Vim(#[from] VimError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Messaging error: {0}")]
    Messaging(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Cyclic dependency in descriptor {descriptor}: {function} depends on itself")]
    CyclicDependency { descriptor: String, function: String },
    #[error("Executor error: {0}")]
    Executor(String),
    #[error("Task panicked: {0}")]
    TaskPanicked(String),
    #[error("Invalid message: {0}")]
    InvalidMessage(String),
}

impl NfvoError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn messaging(message: impl Into<String>) -> Self {
        Self::Messaging(message.into())
    }

    pub fn executor(message: impl Into<String>) -> Self {
        Self::Executor(message.into())
    }

    /// True when the error is a [`NfvoError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<serde_json::Error> for NfvoError {
    fn from(error: serde_json::Error) -> Self {
        NfvoError::Serialization(format!("JSON serialization error: {error}"))
    }
}

impl From<crate::config::ConfigurationError> for NfvoError {
    fn from(error: crate::config::ConfigurationError) -> Self {
        NfvoError::Configuration(error.to_string())
    }
}

pub type NfvoResult<T> = anyhow::Result<T, NfvoError>;
pub type VimResult<T> = anyhow::Result<T, VimError>;

/// Write-path failures reported by a repository.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// The stored version moved on since the entity was read.
    #[error("Write conflict on {entity} {id}: expected version {expected}, found {actual}")]
    Conflict {
        entity: &'static str,
        id: String,
        expected: u64,
        actual: u64,
    },
    #[error("Repository backend error: {0}")]
    Backend(String),
}

impl RepositoryError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

/// Error raised by a VIM driver client.
///
/// A driver may report a failure even though the VIM created the server; in
/// that case the server it got back is attached so callers can recover it.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct DriverError {
    pub message: String,
    pub server: Option<Box<Server>>,
}

impl DriverError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            server: None,
        }
    }

    pub fn with_server(message: impl Into<String>, server: Server) -> Self {
        Self {
            message: message.into(),
            server: Some(Box::new(server)),
        }
    }
}

/// State recovered from an allocation whose outcome could not be confirmed.
#[derive(Debug, Clone)]
pub struct PartialAllocation {
    pub unit: DeploymentUnit,
    pub instance: ComponentInstance,
}

/// Failure of any operation of the infrastructure abstraction.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct VimError {
    pub message: String,
    #[source]
    pub cause: Option<DriverError>,
    pub partial: Option<Box<PartialAllocation>>,
}

impl VimError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
            partial: None,
        }
    }

    pub fn caused_by(message: impl Into<String>, cause: DriverError) -> Self {
        Self {
            message: message.into(),
            cause: Some(cause),
            partial: None,
        }
    }

    /// Attach the unit and the recovered instance to this error.
    pub fn with_partial(mut self, unit: DeploymentUnit, instance: ComponentInstance) -> Self {
        self.partial = Some(Box::new(PartialAllocation { unit, instance }));
        self
    }

    pub fn partial_instance(&self) -> Option<&ComponentInstance> {
        self.partial.as_ref().map(|partial| &partial.instance)
    }
}
