//! Type checks for nested payload values.
//!
//! Handlers receive envelopes whose attributes are arbitrary JSON. Before
//! using a value they check it with [`valid_payload_value`], and when any check
//! fails they report the shape they expected with [`log_wrong_command_form`].

use serde_json::Value;
use strum::Display;
use tracing::error;

use super::DISPATCH_TARGET;
use super::envelope::{Envelope, Payload};

/// JSON value categories a handler can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ValueKind {
    /// A JSON string.
    String,
    /// A JSON number without a fractional part or exponent.
    Integer,
    /// `true` or `false`.
    Boolean,
    /// A JSON number stored as a float.
    Float,
    /// A JSON object.
    Mapping,
}

impl ValueKind {
    /// Returns `true` when `value` belongs to this category.
    ///
    /// Booleans are never integers, and integers are never floats.
    #[must_use]
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Boolean => value.is_boolean(),
            Self::Float => value.is_f64(),
            Self::Mapping => value.is_object(),
        }
    }
}

/// Returns the value found by following `keys` from the payload root.
///
/// Each key except the last must resolve to an object. An empty path
/// resolves to nothing.
#[must_use]
pub fn payload_value<'a>(payload: &'a Payload, keys: &[&str]) -> Option<&'a Value> {
    let (first, rest) = keys.split_first()?;
    rest.iter()
        .try_fold(payload.get(*first)?, |value, key| value.as_object()?.get(*key))
}

/// Reports whether the value at `keys` exists and is of `kind`.
///
/// Missing keys, intermediate values that are not objects, and type
/// mismatches all yield `false`. The envelope is never modified.
#[must_use]
pub fn valid_payload_value(envelope: &Envelope, keys: &[&str], kind: ValueKind) -> bool {
    payload_value(envelope.payload(), keys).is_some_and(|value| kind.matches(value))
}

/// Logs that a command reached `handler` in the wrong shape.
///
/// `expected_form` should describe the full payload the handler accepts.
pub fn log_wrong_command_form(handler: &str, expected_form: &str) {
    error!(
        target: DISPATCH_TARGET,
        handler,
        expected_form,
        "unable to run handler: command must be of the form {expected_form}"
    );
}
