//! Broker connectivity: inbound message delivery and outbound publishing.
//!
//! The [`MqttTransport`] owns the network connection. Every publish it
//! receives is wrapped in an [`InboundMessage`] and handed to each callback in
//! its [`CallbackSet`]. Handlers publish replies through the [`Publish`]
//! capability, which [`MqttPublisher`] implements on top of the same client.

mod callbacks;
mod errors;
mod message;
mod mqtt;
mod publish;

pub use callbacks::{CallbackId, CallbackSet, MessageCallback};
pub use errors::TransportError;
pub use message::{InboundMessage, RawPayload};
pub use mqtt::{MqttPublisher, MqttTransport, StopHandle};
pub use publish::{Publish, SharedPublisher};

pub(crate) const TRANSPORT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
