//! Wire types for the ferry stdio protocol.
//!
//! The protocol is newline-delimited UTF-8 JSON exchanged with a single
//! controlling peer. Inbound lines are [`CommandEnvelope`] objects; outbound
//! lines are [`OutboundEnvelope`] messages (`log`, `result`, `entity`, and
//! `error`). This crate is pure data: framing, IO, and dispatch live in
//! `ferryd`.

mod envelope;
mod errors;
mod outbound;
mod severity;

pub use envelope::{CommandEnvelope, DATASTREAM_KEY, END_COMMAND};
pub use errors::CodecError;
pub use outbound::{ErrorBody, LogBody, OutboundEnvelope, ResultBody};
pub use severity::{Severity, SeverityParseError};
