use serde_json::Value;
use tracing::warn;

use super::Slots;
use crate::dispatch::{
    CommandHandler, DISPATCH_TARGET, Envelope, ReturnMessage, ValueKind, WantsConfig,
    WantsPublish, log_wrong_command_form, payload_value, valid_payload_value,
};

const NAME: &str = "sum_positive_ints";

const FORM: &str = concat!(
    r#"{"command": "sum_positive_ints", "attributes": {"integer_one": <integer>, "#,
    r#""integer_two": <integer>, "return_message": {"topic": <string>, "#,
    r#""qos": <integer 0-2>, "retain": <boolean>}}}"#
);

const FIRST: [&str; 2] = ["attributes", "integer_one"];
const SECOND: [&str; 2] = ["attributes", "integer_two"];

/// Adds two integers and publishes the sum as text.
#[derive(Debug, Default)]
pub struct SumPositiveInts {
    slots: Slots,
}

impl SumPositiveInts {
    /// Manifest constructor.
    #[must_use]
    pub fn boxed() -> Box<dyn CommandHandler> {
        Box::new(Self::default())
    }
}

fn operand(envelope: &Envelope, keys: &[&str]) -> Option<i64> {
    if !valid_payload_value(envelope, keys, ValueKind::Integer) {
        return None;
    }
    payload_value(envelope.payload(), keys).and_then(Value::as_i64)
}

impl CommandHandler for SumPositiveInts {
    fn name(&self) -> &str {
        NAME
    }

    fn execute(&self, envelope: &Envelope) {
        let (Some(first), Some(second), Some(reply)) = (
            operand(envelope, &FIRST),
            operand(envelope, &SECOND),
            ReturnMessage::from_envelope(envelope),
        ) else {
            log_wrong_command_form(NAME, FORM);
            return;
        };
        let Some(sum) = first.checked_add(second) else {
            warn!(target: DISPATCH_TARGET, first, second, "sum overflows, no reply sent");
            return;
        };
        reply.send(self.slots.publisher(), &sum.to_string());
    }

    fn is_disabled(&self) -> bool {
        self.slots.disables(NAME)
    }

    fn publish_slot(&mut self) -> Option<&mut dyn WantsPublish> {
        Some(&mut self.slots)
    }

    fn config_slot(&mut self) -> Option<&mut dyn WantsConfig> {
        Some(&mut self.slots)
    }
}
