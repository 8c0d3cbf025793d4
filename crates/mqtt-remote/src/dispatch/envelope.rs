//! The normalized command envelope.

use serde_json::{Map, Value};

use super::errors::EnvelopeError;

/// Payload key holding the dispatch key.
pub const COMMAND_KEY: &str = "command";

/// Payload key holding handler-specific data.
pub const ATTRIBUTES_KEY: &str = "attributes";

/// JSON object backing an envelope payload.
pub type Payload = Map<String, Value>;

/// A command received from the broker.
///
/// The payload always holds a string `command` and an object `attributes`.
/// Construction and [`Envelope::set_payload`] reject anything else, so
/// handlers never see a malformed command. The only way to break the
/// invariant is [`Envelope::clear`], which empties the payload for teardown.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    topic: String,
    payload: Payload,
    qos: u8,
    retain: bool,
}

impl Envelope {
    /// Builds an envelope after validating `payload`.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError`] when the payload is not an object, lacks
    /// `command` or `attributes`, or holds the wrong type under either key.
    pub fn new(
        topic: impl Into<String>,
        payload: Value,
        qos: u8,
        retain: bool,
    ) -> Result<Self, EnvelopeError> {
        Ok(Self {
            topic: topic.into(),
            payload: checked_payload(payload)?,
            qos,
            retain,
        })
    }

    /// Topic the message arrived on.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Full payload object.
    #[must_use]
    pub const fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Quality of service the transport delivered the message with.
    #[must_use]
    pub const fn qos(&self) -> u8 {
        self.qos
    }

    /// Transport retention flag.
    #[must_use]
    pub const fn retain(&self) -> bool {
        self.retain
    }

    /// Command name used as the dispatch key. `None` only after [`Envelope::clear`].
    #[must_use]
    pub fn command(&self) -> Option<&str> {
        self.payload.get(COMMAND_KEY).and_then(Value::as_str)
    }

    /// Handler-specific attributes. `None` only after [`Envelope::clear`].
    #[must_use]
    pub fn attributes(&self) -> Option<&Payload> {
        self.payload.get(ATTRIBUTES_KEY).and_then(Value::as_object)
    }

    /// Replaces the payload after validating it. The previous payload is kept
    /// when validation fails.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`Envelope::new`].
    pub fn set_payload(&mut self, payload: Value) -> Result<(), EnvelopeError> {
        self.payload = checked_payload(payload)?;
        Ok(())
    }

    /// Resets the payload to an empty object.
    pub fn clear(&mut self) {
        self.payload = Payload::new();
    }
}

fn checked_payload(payload: Value) -> Result<Payload, EnvelopeError> {
    let Value::Object(map) = payload else {
        return Err(EnvelopeError::NotAnObject);
    };
    for key in [COMMAND_KEY, ATTRIBUTES_KEY] {
        if !map.contains_key(key) {
            return Err(EnvelopeError::MissingKey { key });
        }
    }
    if !map.get(COMMAND_KEY).is_some_and(Value::is_string) {
        return Err(EnvelopeError::WrongType {
            key: COMMAND_KEY,
            expected: "a string",
        });
    }
    if !map.get(ATTRIBUTES_KEY).is_some_and(Value::is_object) {
        return Err(EnvelopeError::WrongType {
            key: ATTRIBUTES_KEY,
            expected: "an object",
        });
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn command(payload: Value) -> Result<Envelope, EnvelopeError> {
        Envelope::new("topic", payload, 0, false)
    }

    #[test]
    fn keeps_transport_metadata() {
        let envelope = Envelope::new("lounge", json!({"command": "x", "attributes": {}}), 1, true)
            .expect("valid payload");
        assert_eq!(envelope.topic(), "lounge");
        assert_eq!(envelope.qos(), 1);
        assert!(envelope.retain());
        assert_eq!(envelope.command(), Some("x"));
        assert!(envelope.attributes().is_some_and(Map::is_empty));
    }

    #[test]
    fn keeps_extra_top_level_keys() {
        let payload = json!({"command": "x", "attributes": {}, "sender": "phone"});
        let envelope = command(payload.clone()).expect("valid payload");
        assert_eq!(Value::Object(envelope.payload().clone()), payload);
    }

    #[rstest]
    #[case::string(json!("payload"), EnvelopeError::NotAnObject)]
    #[case::array(json!([1, 2]), EnvelopeError::NotAnObject)]
    #[case::empty(json!({}), EnvelopeError::MissingKey { key: COMMAND_KEY })]
    #[case::no_attributes(
        json!({"command": "x", "attr": {}}),
        EnvelopeError::MissingKey { key: ATTRIBUTES_KEY }
    )]
    #[case::command_object(
        json!({"command": {}, "attributes": {}}),
        EnvelopeError::WrongType { key: COMMAND_KEY, expected: "a string" }
    )]
    #[case::attributes_string(
        json!({"command": "x", "attributes": ""}),
        EnvelopeError::WrongType { key: ATTRIBUTES_KEY, expected: "an object" }
    )]
    #[case::attributes_null(
        json!({"command": "x", "attributes": null}),
        EnvelopeError::WrongType { key: ATTRIBUTES_KEY, expected: "an object" }
    )]
    fn rejects_non_conforming_payloads(#[case] payload: Value, #[case] expected: EnvelopeError) {
        assert_eq!(command(payload), Err(expected));
    }

    #[test]
    fn set_payload_validates_and_keeps_previous_on_failure() {
        let mut envelope = command(json!({"command": "x", "attributes": {}})).expect("valid");
        let error = envelope
            .set_payload(json!({"command": 7, "attributes": {}}))
            .expect_err("number command is rejected");
        assert!(matches!(error, EnvelopeError::WrongType { .. }));
        assert_eq!(envelope.command(), Some("x"));

        envelope
            .set_payload(json!({"command": "y", "attributes": {"a": 1}}))
            .expect("valid replacement");
        assert_eq!(envelope.command(), Some("y"));
    }

    #[test]
    fn clear_empties_the_payload() {
        let mut envelope = command(json!({"command": "x", "attributes": {}})).expect("valid");
        envelope.clear();
        assert!(envelope.payload().is_empty());
        assert_eq!(envelope.command(), None);
        assert_eq!(envelope.attributes(), None);
    }
}
