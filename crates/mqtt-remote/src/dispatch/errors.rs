//! Error types for envelope construction, normalization, and dispatch.
//!
//! Only [`DispatchError`] ever reaches a caller of the registry: every
//! per-message failure is logged and dropped at the boundary where it occurs.

use std::str::Utf8Error;

use thiserror::Error;

/// A payload that violates the envelope's two-key contract.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    /// The payload is not a JSON object.
    #[error("payload must be a JSON object")]
    NotAnObject,

    /// A required top-level key is absent.
    #[error("payload is missing the '{key}' key")]
    MissingKey {
        /// Name of the missing key.
        key: &'static str,
    },

    /// A required top-level key holds a value of the wrong type.
    #[error("payload '{key}' must be {expected}")]
    WrongType {
        /// Name of the offending key.
        key: &'static str,
        /// Human-readable description of the expected type.
        expected: &'static str,
    },
}

/// Reasons a raw transport message could not become an envelope.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// The payload bytes are not valid UTF-8.
    #[error("payload is not valid UTF-8: {0}")]
    Utf8(#[from] Utf8Error),

    /// The payload text is not a JSON document.
    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The JSON document does not satisfy the envelope contract.
    #[error("payload does not form a command: {0}")]
    Envelope(#[from] EnvelopeError),
}

/// Errors surfaced by registry administration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// No handler is registered under the requested command name.
    #[error("no handler registered for command '{name}'")]
    NotFound {
        /// Command name that was looked up.
        name: String,
    },
}

impl DispatchError {
    /// Creates a not found error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }
}
