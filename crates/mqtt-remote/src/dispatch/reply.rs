//! Reply routing carried inside command attributes.

use serde_json::Value;
use tracing::{debug, warn};

use super::DISPATCH_TARGET;
use super::envelope::Envelope;
use super::validate::{ValueKind, payload_value, valid_payload_value};
use crate::transport::Publish;

const TOPIC_PATH: [&str; 3] = ["attributes", "return_message", "topic"];
const QOS_PATH: [&str; 3] = ["attributes", "return_message", "qos"];
const RETAIN_PATH: [&str; 3] = ["attributes", "return_message", "retain"];

/// Where a handler should publish its result.
///
/// Commands that expect an answer carry a `return_message` object inside
/// their attributes:
///
/// ```json
/// {"return_message": {"topic": "replies", "qos": 1, "retain": false}}
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnMessage {
    /// Topic to publish the reply on.
    pub topic: String,
    /// QoS to publish the reply with.
    pub qos: u8,
    /// Whether the broker should retain the reply.
    pub retain: bool,
}

impl ReturnMessage {
    /// Text describing the `return_message` attribute, for use in
    /// wrong-form diagnostics.
    pub const FORM: &'static str =
        r#""return_message": {"topic": <string>, "qos": <integer 0-2>, "retain": <boolean>}"#;

    /// Extracts the reply routing from `envelope`.
    ///
    /// Returns `None` when any of the three fields is missing, mistyped, or
    /// when the QoS is not a valid MQTT level.
    #[must_use]
    pub fn from_envelope(envelope: &Envelope) -> Option<Self> {
        if !valid_payload_value(envelope, &TOPIC_PATH, ValueKind::String)
            || !valid_payload_value(envelope, &QOS_PATH, ValueKind::Integer)
            || !valid_payload_value(envelope, &RETAIN_PATH, ValueKind::Boolean)
        {
            return None;
        }
        let payload = envelope.payload();
        let topic = payload_value(payload, &TOPIC_PATH).and_then(Value::as_str)?;
        let qos = payload_value(payload, &QOS_PATH)
            .and_then(Value::as_u64)
            .and_then(|qos| u8::try_from(qos).ok())
            .filter(|qos| *qos <= mqtt_remote_config::MAX_QOS)?;
        let retain = payload_value(payload, &RETAIN_PATH).and_then(Value::as_bool)?;
        Some(Self {
            topic: topic.to_owned(),
            qos,
            retain,
        })
    }

    /// Publishes `payload` to the reply topic.
    ///
    /// Logs a warning and drops the reply when no publisher is available.
    pub fn send(&self, publisher: Option<&dyn Publish>, payload: &str) {
        let Some(publisher) = publisher else {
            warn!(
                target: DISPATCH_TARGET,
                topic = %self.topic,
                "no publisher available, reply dropped"
            );
            return;
        };
        debug!(
            target: DISPATCH_TARGET,
            topic = %self.topic,
            qos = self.qos,
            retain = self.retain,
            "publishing reply"
        );
        publisher.publish(&self.topic, payload, self.qos, self.retain);
    }
}
