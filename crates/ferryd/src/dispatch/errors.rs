//! Fatal error taxonomy for the dispatch loop.
//!
//! Nothing in the loop calls `process::exit`; every unrecoverable condition
//! is a [`FatalError`] value propagated to the loop boundary, which reports
//! it once and maps it to an exit status. Decode errors are deliberately
//! absent: malformed input is recovered locally and never terminates the
//! process.

use std::io;

use thiserror::Error;

use crate::cases::{CaseError, CaseLifecycleError};
use crate::handler::HandlerError;
use crate::sink::SinkError;
use crate::stream::StreamError;

/// Unrecoverable dispatch failures.
#[derive(Debug, Error)]
pub enum FatalError {
    /// `def` named a handler the catalogue does not provide.
    #[error("Could not register function for '{cmd}': no handler named '{key}'")]
    Registration {
        /// Command the registration was for.
        cmd: String,
        /// Unresolved catalogue key.
        key: String,
    },

    /// Command has no registered handler.
    #[error("Function definition for '{cmd}' not found")]
    NotFound {
        /// The unregistered command.
        cmd: String,
    },

    /// Stream requested for a handler without stream capability.
    #[error("The function '{cmd}' does not support data streaming")]
    StreamUnsupported {
        /// The incapable command.
        cmd: String,
    },

    /// Handler raised during execution.
    #[error("Could not execute {cmd}: {message}")]
    Invocation {
        /// The failing command.
        cmd: String,
        /// Handler error description.
        message: String,
        /// Captured stack text.
        stack: String,
    },

    /// Case factory or handle failed.
    #[error("case lifecycle failed: {0}")]
    Case(#[source] CaseError),

    /// Input ended before the termination command.
    #[error("input closed before the termination command")]
    InputClosed,

    /// IO error while reading input.
    #[error("could not read input: {0}")]
    Io(#[from] io::Error),

    /// Envelope emission failed.
    #[error("could not emit envelope: {0}")]
    Sink(#[from] SinkError),

    /// The stream bridge failed.
    #[error("data stream failed: {0}")]
    Stream(#[from] StreamError),
}

impl FatalError {
    /// Exit status for this error.
    ///
    /// Protocol and handler faults map to 1; infrastructure failures (IO,
    /// serialisation, stream plumbing) map to 2.
    #[must_use]
    pub fn exit_status(&self) -> i32 {
        match self {
            Self::Registration { .. }
            | Self::NotFound { .. }
            | Self::StreamUnsupported { .. }
            | Self::Invocation { .. }
            | Self::Case(_) => 1,
            Self::InputClosed | Self::Io(_) | Self::Sink(_) | Self::Stream(_) => 2,
        }
    }

    /// Stack text to attach to the error report, empty when none applies.
    #[must_use]
    pub fn stack(&self) -> &str {
        match self {
            Self::Invocation { stack, .. } => stack,
            _ => "",
        }
    }

    /// Creates a registration error.
    #[must_use]
    pub fn registration(cmd: impl Into<String>, key: impl Into<String>) -> Self {
        Self::Registration {
            cmd: cmd.into(),
            key: key.into(),
        }
    }

    /// Creates a lookup error.
    #[must_use]
    pub fn not_found(cmd: impl Into<String>) -> Self {
        Self::NotFound { cmd: cmd.into() }
    }

    /// Creates a stream capability error.
    #[must_use]
    pub fn stream_unsupported(cmd: impl Into<String>) -> Self {
        Self::StreamUnsupported { cmd: cmd.into() }
    }

    /// Creates an invocation error from a handler failure.
    #[must_use]
    pub fn invocation(cmd: impl Into<String>, error: &HandlerError) -> Self {
        Self::Invocation {
            cmd: cmd.into(),
            message: error.message().to_owned(),
            stack: error.stack().to_owned(),
        }
    }
}

impl From<CaseLifecycleError> for FatalError {
    fn from(error: CaseLifecycleError) -> Self {
        match error {
            CaseLifecycleError::Case(case) => Self::Case(case),
            CaseLifecycleError::Sink(sink) => Self::Sink(sink),
        }
    }
}
