use serde_json::Value;

use super::Slots;
use crate::dispatch::{
    CommandHandler, Envelope, ReturnMessage, ValueKind, WantsConfig, WantsPublish,
    log_wrong_command_form, payload_value, valid_payload_value,
};

const NAME: &str = "reverse_string";

const FORM: &str = concat!(
    r#"{"command": "reverse_string", "attributes": {"string_to_reverse": <string>, "#,
    r#""return_message": {"topic": <string>, "qos": <integer 0-2>, "retain": <boolean>}}}"#
);

const INPUT: [&str; 2] = ["attributes", "string_to_reverse"];

/// Publishes its input string reversed.
#[derive(Debug, Default)]
pub struct ReverseString {
    slots: Slots,
}

impl ReverseString {
    /// Manifest constructor.
    #[must_use]
    pub fn boxed() -> Box<dyn CommandHandler> {
        Box::new(Self::default())
    }
}

impl CommandHandler for ReverseString {
    fn name(&self) -> &str {
        NAME
    }

    fn execute(&self, envelope: &Envelope) {
        let input = valid_payload_value(envelope, &INPUT, ValueKind::String)
            .then(|| payload_value(envelope.payload(), &INPUT).and_then(Value::as_str))
            .flatten();
        let (Some(input), Some(reply)) = (input, ReturnMessage::from_envelope(envelope)) else {
            log_wrong_command_form(NAME, FORM);
            return;
        };
        let reversed: String = input.chars().rev().collect();
        reply.send(self.slots.publisher(), &reversed);
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

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use serde_json::json;

    use super::*;

    #[test]
    fn publishes_reversed_input() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&sent);
        let mut handler = ReverseString::default();
        handler.slots.set_publisher(Arc::new(
            move |topic: &str, payload: &str, _qos: u8, retain: bool| {
                if let Ok(mut sent) = sink.lock() {
                    sent.push((topic.to_owned(), payload.to_owned(), retain));
                }
            },
        ));
        let envelope = Envelope::new(
            "pc",
            json!({
                "command": NAME,
                "attributes": {
                    "string_to_reverse": "héllo",
                    "return_message": {"topic": "out", "qos": 0, "retain": true}
                }
            }),
            0,
            false,
        )
        .expect("valid envelope");

        handler.execute(&envelope);
        assert_eq!(
            *sent.lock().expect("lock"),
            vec![("out".to_owned(), "olléh".to_owned(), true)]
        );
    }

    #[test]
    fn numbers_are_not_reversed() {
        let handler = ReverseString::default();
        let envelope = Envelope::new(
            "pc",
            json!({
                "command": NAME,
                "attributes": {
                    "string_to_reverse": 123,
                    "return_message": {"topic": "out", "qos": 0, "retain": false}
                }
            }),
            0,
            false,
        )
        .expect("valid envelope");
        handler.execute(&envelope);
    }
}
