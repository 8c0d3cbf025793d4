//! Raw messages as they arrive from the broker.

use std::borrow::Cow;
use std::str::{self, Utf8Error};

/// Message body in the form the transport delivered it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawPayload {
    /// Undecoded bytes, as delivered by the network client.
    Bytes(Vec<u8>),
    /// Text that has already been decoded.
    Text(String),
}

impl RawPayload {
    /// Returns the payload as text, decoding bytes as UTF-8.
    ///
    /// # Errors
    ///
    /// Returns [`Utf8Error`] when the bytes are not valid UTF-8.
    pub fn to_text(&self) -> Result<Cow<'_, str>, Utf8Error> {
        match self {
            Self::Bytes(bytes) => str::from_utf8(bytes).map(Cow::Borrowed),
            Self::Text(text) => Ok(Cow::Borrowed(text.as_str())),
        }
    }

    /// Number of bytes in the payload.
    #[must_use]
    pub const fn len(&self) -> usize {
        match self {
            Self::Bytes(bytes) => bytes.len(),
            Self::Text(text) => text.len(),
        }
    }

    /// Returns `true` when the payload carries no data.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Vec<u8>> for RawPayload {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<&[u8]> for RawPayload {
    fn from(bytes: &[u8]) -> Self {
        Self::Bytes(bytes.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for RawPayload {
    fn from(bytes: &[u8; N]) -> Self {
        Self::Bytes(bytes.to_vec())
    }
}

impl From<String> for RawPayload {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for RawPayload {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

/// A message received on a subscribed topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Topic the message was published to.
    pub topic: String,
    /// Message body.
    pub payload: RawPayload,
    /// Delivery QoS.
    pub qos: u8,
    /// Whether the broker delivered a retained message.
    pub retain: bool,
}

impl InboundMessage {
    /// Builds a message.
    pub fn new(
        topic: impl Into<String>,
        payload: impl Into<RawPayload>,
        qos: u8,
        retain: bool,
    ) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            qos,
            retain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_bytes_as_utf8() {
        let payload = RawPayload::from("héllo".as_bytes());
        assert_eq!(payload.to_text().expect("valid utf-8"), "héllo");
        assert_eq!(payload.len(), 6);
    }

    #[test]
    fn rejects_invalid_utf8() {
        let payload = RawPayload::from(vec![0xff, 0xfe]);
        assert!(payload.to_text().is_err());
    }

    #[test]
    fn text_passes_through() {
        let payload = RawPayload::from(String::new());
        assert!(payload.is_empty());
        assert_eq!(payload.to_text().expect("text"), "");
    }
}
