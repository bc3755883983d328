//! # Messaging Module
//!
//! Typed lifecycle messages exchanged with remote VNF-manager agents, the
//! outbound [`MessagingGateway`] and the inbound [`VnfmReceiver`].
//!
//! Transports are pluggable per endpoint kind through [`VnfmSender`];
//! [`ChannelSender`] is the in-process implementation.

pub mod action;
pub mod channel;
pub mod gateway;
pub mod message;
pub mod receiver;
pub mod registry;

pub use action::Action;
pub use channel::{ChannelSender, OutboundMessage};
pub use gateway::{MessagingGateway, VnfmSender};
pub use message::{InstantiateRequest, LifecycleMessage, ScaleOutRequest};
pub use receiver::{Envelope, ManagerRegistration, RegistrationAction, VnfmReceiver};
pub use registry::ManagerRegistry;
