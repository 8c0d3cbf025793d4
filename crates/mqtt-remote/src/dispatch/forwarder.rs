//! Glue from raw transport messages to the registry.

use std::fmt;
use std::sync::Arc;

use super::envelope::Envelope;
use super::normalize::Normalizer;
use super::registry::HandlerRegistry;
use crate::transport::InboundMessage;

/// Receives the envelope produced for each message, absent when the message
/// could not be normalized.
pub type DispatchFn = Arc<dyn Fn(Option<&Envelope>) + Send + Sync>;

/// Normalizes each inbound message and hands the result to a dispatcher.
pub struct Forwarder<N> {
    normalizer: N,
    dispatch: DispatchFn,
}

impl<N: Normalizer> Forwarder<N> {
    /// Builds a forwarder from its two halves.
    pub fn new<F>(normalizer: N, dispatch: F) -> Self
    where
        F: Fn(Option<&Envelope>) + Send + Sync + 'static,
    {
        Self {
            normalizer,
            dispatch: Arc::new(dispatch),
        }
    }

    /// Builds a forwarder that dispatches through `registry`.
    pub fn for_registry(normalizer: N, registry: Arc<HandlerRegistry>) -> Self {
        Self::new(normalizer, move |envelope: Option<&Envelope>| {
            registry.dispatch(envelope);
        })
    }

    /// Normalizes `raw` and dispatches the result, including the absent case.
    pub fn forward(&self, raw: &InboundMessage) {
        self.forward_with(raw, None);
    }

    /// Dispatches `envelope` when one is supplied, skipping normalization;
    /// otherwise behaves like [`Forwarder::forward`].
    pub fn forward_with(&self, raw: &InboundMessage, envelope: Option<Envelope>) {
        let envelope = envelope.or_else(|| self.normalizer.normalize(raw));
        (self.dispatch)(envelope.as_ref());
    }
}

impl<N: fmt::Debug> fmt::Debug for Forwarder<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Forwarder")
            .field("normalizer", &self.normalizer)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use mockall::mock;
    use mockall::predicate::always;
    use serde_json::json;

    use super::*;

    mock! {
        Normalizer {}
        impl Normalizer for Normalizer {
            fn normalize(&self, raw: &InboundMessage) -> Option<Envelope>;
        }
    }

    fn raw() -> InboundMessage {
        InboundMessage::new("t", "{}", 0, false)
    }

    fn envelope() -> Envelope {
        Envelope::new("t", json!({"command": "c", "attributes": {}}), 0, false)
            .expect("valid envelope")
    }

    fn recording(seen: &Arc<Mutex<Vec<Option<Envelope>>>>) -> impl Fn(Option<&Envelope>) + Send + Sync + 'static {
        let seen = Arc::clone(seen);
        move |envelope: Option<&Envelope>| {
            if let Ok(mut seen) = seen.lock() {
                seen.push(envelope.cloned());
            }
        }
    }

    #[test]
    fn normalizes_then_dispatches() {
        let mut normalizer = MockNormalizer::new();
        normalizer
            .expect_normalize()
            .with(always())
            .times(1)
            .returning(|_| Some(envelope()));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let forwarder = Forwarder::new(normalizer, recording(&seen));

        forwarder.forward(&raw());
        assert_eq!(*seen.lock().expect("lock"), vec![Some(envelope())]);
    }

    #[test]
    fn dispatches_absent_envelope_when_normalization_fails() {
        let mut normalizer = MockNormalizer::new();
        normalizer.expect_normalize().times(1).returning(|_| None);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let forwarder = Forwarder::new(normalizer, recording(&seen));

        forwarder.forward(&raw());
        assert_eq!(*seen.lock().expect("lock"), vec![None]);
    }

    #[test]
    fn supplied_envelope_skips_normalization() {
        let mut normalizer = MockNormalizer::new();
        normalizer.expect_normalize().never();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let forwarder = Forwarder::new(normalizer, recording(&seen));

        forwarder.forward_with(&raw(), Some(envelope()));
        assert_eq!(*seen.lock().expect("lock"), vec![Some(envelope())]);
    }
}
