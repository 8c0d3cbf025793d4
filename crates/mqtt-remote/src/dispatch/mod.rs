//! The command dispatch core.
//!
//! Inbound messages flow through three stages:
//!
//! 1. a [`Normalizer`] turns the raw message into an [`Envelope`], or into
//!    nothing when the payload is not a well-formed command;
//! 2. the [`Forwarder`] hands whatever came out to the dispatcher;
//! 3. the [`HandlerRegistry`] looks up the command name and runs the matching
//!    handler.
//!
//! Every per-message failure is logged and the message dropped. The only
//! error surfaced to callers is [`DispatchError::NotFound`] from
//! [`HandlerRegistry::unregister`].

mod envelope;
mod errors;
mod forwarder;
mod handler;
mod normalize;
mod registry;
mod reply;
mod validate;

pub use envelope::{ATTRIBUTES_KEY, COMMAND_KEY, Envelope, Payload};
pub use errors::{DispatchError, EnvelopeError, NormalizeError};
pub use forwarder::{DispatchFn, Forwarder};
pub use handler::{CommandHandler, DiscoveryReport, HandlerConstructor, WantsConfig, WantsPublish};
pub use normalize::{JsonNormalizer, Normalizer, WIRE_FORMAT, standardise_quotes};
pub use registry::{EntryPoint, HandlerRegistry, Registrations};
pub use reply::ReturnMessage;
pub use validate::{ValueKind, log_wrong_command_form, payload_value, valid_payload_value};

pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");
