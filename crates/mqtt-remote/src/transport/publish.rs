//! Outbound publishing capability handed to handlers.

use std::sync::Arc;

/// Something that can publish a text payload to a topic.
///
/// Implementations must not block waiting on the connection that delivers
/// inbound messages, because handlers run on that connection's thread.
pub trait Publish: Send + Sync {
    /// Publishes `payload` on `topic`.
    fn publish(&self, topic: &str, payload: &str, qos: u8, retain: bool);
}

impl<F> Publish for F
where
    F: Fn(&str, &str, u8, bool) + Send + Sync,
{
    fn publish(&self, topic: &str, payload: &str, qos: u8, retain: bool) {
        self(topic, payload, qos, retain);
    }
}

/// Shared handle to a publisher.
pub type SharedPublisher = Arc<dyn Publish>;
