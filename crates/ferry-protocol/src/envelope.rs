//! Inbound command envelope parsing.
//!
//! Each inbound protocol line carries a single JSON object identifying the
//! command to invoke, plus optional registration, argument, streaming, and
//! case-selection fields. Lines are framed by the transport (one envelope per
//! newline-delimited line); this module only handles the object itself.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::errors::CodecError;

/// Reserved command that terminates the dispatch loop.
pub const END_COMMAND: &str = "done";

/// Reserved `args` key under which a live data stream is delivered.
pub const DATASTREAM_KEY: &str = "datastream";

/// Parsed command envelope from the controlling peer.
#[derive(Debug, Deserialize)]
pub struct CommandEnvelope {
    /// Name of the command to invoke. Always present.
    pub cmd: String,
    /// Arguments forwarded to the handler, if any.
    #[serde(default)]
    pub args: Option<Map<String, Value>>,
    /// Handler selection key; a non-empty value (re)registers the command.
    #[serde(default)]
    pub def: Option<String>,
    /// Whether a data stream follows this envelope on the input.
    #[serde(default)]
    pub isstream: bool,
    /// Path of the case the command operates on, if any.
    #[serde(default)]
    pub casepath: Option<String>,
}

impl CommandEnvelope {
    /// Parses one protocol line into a command envelope.
    ///
    /// Trailing whitespace (including the newline delimiter) is trimmed
    /// before parsing.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Malformed`] when the line is empty, is not valid
    /// JSON, or does not match the envelope schema (including a missing
    /// `cmd` field).
    pub fn parse(line: &str) -> Result<Self, CodecError> {
        let trimmed = line.trim_end();
        if trimmed.is_empty() {
            return Err(CodecError::malformed("empty request line"));
        }
        serde_json::from_str(trimmed).map_err(CodecError::from_json_error)
    }

    /// Whether this envelope carries the loop-terminating sentinel command.
    #[must_use]
    pub fn is_end(&self) -> bool {
        self.cmd == END_COMMAND
    }

    /// Returns the handler selection key when a non-empty one was supplied.
    #[must_use]
    pub fn definition(&self) -> Option<&str> {
        self.def
            .as_deref()
            .map(str::trim)
            .filter(|def| !def.is_empty())
    }
}
