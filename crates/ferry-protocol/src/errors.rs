//! Error types for protocol decoding.
//!
//! Decode failures are always recoverable for the process: the dispatch loop
//! reports them and continues with the next line. The error therefore carries
//! enough context for a structured report but no exit-status mapping.

use thiserror::Error;

/// Errors surfaced while decoding an inbound protocol line.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Line could not be parsed as a JSON command envelope.
    #[error("malformed envelope: {message}")]
    Malformed {
        /// Human-readable description of the parse failure.
        message: String,
        /// Underlying serde error, when one exists.
        #[source]
        source: Option<serde_json::Error>,
    },
}

impl CodecError {
    /// Creates a malformed-envelope error from a serde error.
    #[must_use]
    pub fn from_json_error(source: serde_json::Error) -> Self {
        Self::Malformed {
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Creates a malformed-envelope error with a custom message.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
            source: None,
        }
    }
}
