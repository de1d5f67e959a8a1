//! Outbound protocol envelopes.
//!
//! Every message written back to the controlling peer is one of four
//! externally tagged envelope kinds: `log`, `result`, `entity`, and `error`.
//! Field order within each kind is fixed by struct declaration order, so the
//! wire encoding is deterministic. Timestamps are serialised as RFC 3339 UTC.

use serde::Serialize;
use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::severity::Severity;

/// A single outbound protocol message.
///
/// Serialises to a one-key object wrapping the envelope body, for example
/// `{"log":{"severity":"info","message":"Starting","time":"…","stackTrace":""}}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutboundEnvelope {
    /// Severity-filtered log message.
    Log(LogBody),
    /// Return value of a completed invocation.
    Result(ResultBody),
    /// Caller-supplied entity properties.
    Entity(Map<String, Value>),
    /// Structured error report.
    Error(ErrorBody),
}

/// Body of a `log` envelope.
#[derive(Debug, Serialize)]
pub struct LogBody {
    /// Message severity.
    pub severity: Severity,
    /// Log text.
    pub message: String,
    /// Emission time.
    #[serde(with = "time::serde::rfc3339")]
    pub time: OffsetDateTime,
    /// Captured stack text, empty when none applies.
    #[serde(rename = "stackTrace")]
    pub stack_trace: String,
}

/// Body of a `result` envelope.
#[derive(Debug, Serialize)]
pub struct ResultBody {
    /// Handler return value; may be any JSON value including null.
    pub data: Value,
}

/// Body of an `error` envelope.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Error description.
    pub message: String,
    /// Emission time.
    #[serde(with = "time::serde::rfc3339")]
    pub time: OffsetDateTime,
    /// Origin of the error, empty when unknown.
    pub location: String,
    /// Captured stack text, empty when none applies.
    #[serde(rename = "stackTrace")]
    pub stack_trace: String,
}

impl OutboundEnvelope {
    /// Creates a `log` envelope.
    #[must_use]
    pub fn log(
        severity: Severity,
        message: impl Into<String>,
        time: OffsetDateTime,
        stack_trace: impl Into<String>,
    ) -> Self {
        Self::Log(LogBody {
            severity,
            message: message.into(),
            time,
            stack_trace: stack_trace.into(),
        })
    }

    /// Creates a `result` envelope wrapping a handler return value.
    #[must_use]
    pub fn result(data: Value) -> Self {
        Self::Result(ResultBody { data })
    }

    /// Creates an `entity` envelope from caller-supplied properties.
    #[must_use]
    pub fn entity(properties: Map<String, Value>) -> Self {
        Self::Entity(properties)
    }

    /// Creates an `error` envelope.
    #[must_use]
    pub fn error(
        message: impl Into<String>,
        time: OffsetDateTime,
        location: impl Into<String>,
        stack_trace: impl Into<String>,
    ) -> Self {
        Self::Error(ErrorBody {
            message: message.into(),
            time,
            location: location.into(),
            stack_trace: stack_trace.into(),
        })
    }
}
