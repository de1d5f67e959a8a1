//! The handler seam: named units of behaviour invoked by the dispatch loop.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::sink::ProtocolSink;
use crate::stream::DataStream;

/// Arguments forwarded to a handler from the command envelope.
pub type HandlerArgs = Map<String, Value>;

/// Everything a handler receives for one invocation.
///
/// The data stream, when present, is owned by the invocation: the handler is
/// its only consumer. The sink lets handler bodies emit log and entity
/// envelopes mid-invocation.
pub struct Invocation<'a> {
    /// Envelope arguments, if any were supplied.
    pub args: Option<HandlerArgs>,
    /// Live data stream for stream-enabled invocations.
    pub stream: Option<DataStream>,
    /// Protocol emission surface.
    pub sink: &'a mut dyn ProtocolSink,
}

/// Failure raised by a handler body.
///
/// Always fatal for the process; the dispatch loop reports it with the
/// captured stack text and terminates.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
    stack: String,
}

impl HandlerError {
    /// Creates a handler error with no stack text.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack: String::new(),
        }
    }

    /// Creates a handler error carrying stack text.
    #[must_use]
    pub fn with_stack(message: impl Into<String>, stack: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack: stack.into(),
        }
    }

    /// Error description.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Captured stack text, empty when none was supplied.
    #[must_use]
    pub fn stack(&self) -> &str {
        &self.stack
    }
}

/// A named, invocable unit of behaviour.
pub trait Handler: Send + Sync {
    /// Runs the handler to completion on the dispatch thread.
    fn invoke(&self, invocation: Invocation<'_>) -> Result<Value, HandlerError>;
}

impl<F> Handler for F
where
    F: Fn(Invocation<'_>) -> Result<Value, HandlerError> + Send + Sync,
{
    fn invoke(&self, invocation: Invocation<'_>) -> Result<Value, HandlerError> {
        self(invocation)
    }
}
