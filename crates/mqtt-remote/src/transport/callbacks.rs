//! Fan-out of inbound messages to registered callbacks.

use std::fmt;
use std::sync::Arc;

use tracing::warn;

use super::TRANSPORT_TARGET;
use super::errors::TransportError;
use super::message::InboundMessage;

/// Callback invoked for every inbound message.
pub type MessageCallback = Arc<dyn Fn(&InboundMessage) + Send + Sync>;

/// Token identifying a registered callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallbackId(u64);

impl fmt::Display for CallbackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Ordered set of message callbacks.
///
/// Every callback receives every message, in registration order.
#[derive(Default)]
pub struct CallbackSet {
    next_id: u64,
    callbacks: Vec<(CallbackId, MessageCallback)>,
}

impl CallbackSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` and returns the token needed to remove it.
    pub fn add<F>(&mut self, callback: F) -> CallbackId
    where
        F: Fn(&InboundMessage) + Send + Sync + 'static,
    {
        let id = CallbackId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.callbacks.push((id, Arc::new(callback)));
        id
    }

    /// Removes the callback registered under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::UnknownCallback`] when `id` is not registered.
    pub fn remove(&mut self, id: CallbackId) -> Result<(), TransportError> {
        let position = self
            .callbacks
            .iter()
            .position(|(candidate, _)| *candidate == id)
            .ok_or(TransportError::UnknownCallback { id })?;
        self.callbacks.remove(position);
        Ok(())
    }

    /// Number of registered callbacks.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.callbacks.len()
    }

    /// Returns `true` when no callback is registered.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Hands `message` to every callback and returns how many were called.
    pub fn deliver(&self, message: &InboundMessage) -> usize {
        if self.callbacks.is_empty() {
            warn!(
                target: TRANSPORT_TARGET,
                topic = %message.topic,
                "no message callbacks registered, message dropped"
            );
            return 0;
        }
        for (_, callback) in &self.callbacks {
            callback(message);
        }
        self.callbacks.len()
    }
}

impl fmt::Debug for CallbackSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackSet")
            .field("next_id", &self.next_id)
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}
