//! Conversion of raw transport messages into envelopes.

use std::borrow::Cow;

use serde_json::Value;
use tracing::{debug, warn};

use super::DISPATCH_TARGET;
use super::envelope::Envelope;
use super::errors::NormalizeError;
use crate::transport::InboundMessage;

/// Wire format every command must follow.
pub const WIRE_FORMAT: &str =
    r#"{"command": "<command>", "attributes": {<attributes in key: value pairs>}}"#;

const SMART_QUOTES: [char; 2] = ['\u{201C}', '\u{201D}'];

/// Turns transport messages into envelopes.
pub trait Normalizer: Send + Sync {
    /// Returns the envelope carried by `raw`, or `None` when the message is
    /// not a well-formed command. Failures are logged, never raised.
    fn normalize(&self, raw: &InboundMessage) -> Option<Envelope>;
}

/// Normalizer for JSON command payloads.
///
/// Typographic double quotes (U+201C and U+201D), which phone keyboards
/// insert automatically, are replaced by ASCII quotes before parsing.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonNormalizer;

impl JsonNormalizer {
    /// Converts `raw`, reporting why conversion failed.
    ///
    /// # Errors
    ///
    /// Returns [`NormalizeError`] when the payload is not UTF-8, not JSON, or
    /// not a command object.
    pub fn convert(self, raw: &InboundMessage) -> Result<Envelope, NormalizeError> {
        let text = raw.payload.to_text()?;
        let document: Value = serde_json::from_str(&standardise_quotes(&text))?;
        Ok(Envelope::new(
            raw.topic.as_str(),
            document,
            raw.qos,
            raw.retain,
        )?)
    }
}

impl Normalizer for JsonNormalizer {
    fn normalize(&self, raw: &InboundMessage) -> Option<Envelope> {
        match self.convert(raw) {
            Ok(envelope) => {
                debug!(
                    target: DISPATCH_TARGET,
                    topic = %raw.topic,
                    command = envelope.command().unwrap_or_default(),
                    "message converted to command"
                );
                Some(envelope)
            }
            Err(error) => {
                warn!(
                    target: DISPATCH_TARGET,
                    topic = %raw.topic,
                    %error,
                    "unable to convert message: payload must be of the form {WIRE_FORMAT}"
                );
                None
            }
        }
    }
}

/// Replaces typographic double quotes with ASCII double quotes.
#[must_use]
pub fn standardise_quotes(text: &str) -> Cow<'_, str> {
    if text.contains(SMART_QUOTES) {
        Cow::Owned(text.replace(SMART_QUOTES, "\""))
    } else {
        Cow::Borrowed(text)
    }
}
