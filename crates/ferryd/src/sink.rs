//! Protocol envelope emission.
//!
//! The sink is the single writer for both protocol channels: log, result,
//! and entity envelopes go to the output channel (stdout in production),
//! error envelopes to the error channel (stderr). Log emission is filtered
//! by the configured severity threshold; error envelopes always reach the
//! error channel regardless of it.
//!
//! Termination is never a sink side effect. Fatal conditions are expressed
//! as [`crate::FatalError`] values and handled at the dispatch loop
//! boundary.

use std::io::{self, Write};

use ferry_protocol::{OutboundEnvelope, Severity};
use serde_json::{Map, Value};
use thiserror::Error;
use time::OffsetDateTime;

/// Errors surfaced while emitting envelopes.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Envelope serialization failed.
    #[error("failed to serialize envelope: {0}")]
    Serialize(#[from] serde_json::Error),

    /// IO error on one of the protocol channels.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Emission surface handed to handlers and dispatch alike.
///
/// Object safe so that handler bodies can log and emit entities without
/// knowing the concrete writer types.
pub trait ProtocolSink {
    /// Emits a log envelope when `severity` passes the threshold.
    fn log(&mut self, severity: Severity, message: &str) -> Result<(), SinkError> {
        self.log_with_stack(severity, message, "")
    }

    /// Emits a log envelope with attached stack text.
    fn log_with_stack(
        &mut self,
        severity: Severity,
        message: &str,
        stack: &str,
    ) -> Result<(), SinkError>;

    /// Emits a result envelope wrapping a handler return value.
    fn write_result(&mut self, data: Value) -> Result<(), SinkError>;

    /// Emits an entity envelope from caller-supplied properties.
    fn write_entity(&mut self, properties: Map<String, Value>) -> Result<(), SinkError>;

    /// Reports an error: logs at error severity (subject to filtering) and
    /// always writes an error envelope to the error channel, flushing both.
    fn write_error(&mut self, message: &str, location: &str, stack: &str)
    -> Result<(), SinkError>;
}

/// Sink writing envelopes to a pair of byte streams.
#[derive(Debug)]
pub struct EnvelopeWriter<O, E> {
    out: O,
    err: E,
    threshold: Severity,
}

impl<O: Write, E: Write> EnvelopeWriter<O, E> {
    /// Creates a sink over the given output and error channels.
    #[must_use]
    pub fn new(out: O, err: E, threshold: Severity) -> Self {
        Self {
            out,
            err,
            threshold,
        }
    }

    /// Consumes the sink, returning the underlying channels.
    #[must_use]
    pub fn into_parts(self) -> (O, E) {
        (self.out, self.err)
    }

    fn emit(&mut self, envelope: &OutboundEnvelope) -> Result<(), SinkError> {
        serde_json::to_writer(&mut self.out, envelope)?;
        self.out.write_all(b"\n")?;
        // The peer reads interactively; a buffered line must not linger.
        self.out.flush()?;
        Ok(())
    }
}

impl<O: Write, E: Write> ProtocolSink for EnvelopeWriter<O, E> {
    fn log_with_stack(
        &mut self,
        severity: Severity,
        message: &str,
        stack: &str,
    ) -> Result<(), SinkError> {
        if !severity.enabled_at(self.threshold) {
            return Ok(());
        }
        self.emit(&OutboundEnvelope::log(
            severity,
            message,
            OffsetDateTime::now_utc(),
            stack,
        ))
    }

    fn write_result(&mut self, data: Value) -> Result<(), SinkError> {
        self.emit(&OutboundEnvelope::result(data))
    }

    fn write_entity(&mut self, properties: Map<String, Value>) -> Result<(), SinkError> {
        self.emit(&OutboundEnvelope::entity(properties))
    }

    fn write_error(
        &mut self,
        message: &str,
        location: &str,
        stack: &str,
    ) -> Result<(), SinkError> {
        self.log_with_stack(Severity::Error, message, stack)?;
        let envelope = OutboundEnvelope::error(message, OffsetDateTime::now_utc(), location, stack);
        serde_json::to_writer(&mut self.err, &envelope)?;
        self.err.write_all(b"\n")?;
        self.err.flush()?;
        self.out.flush()?;
        Ok(())
    }
}
