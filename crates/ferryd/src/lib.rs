//! Stdio command dispatch daemon.
//!
//! `ferryd` is a long-lived process speaking a line-delimited JSON protocol
//! over standard input/output. A single controlling peer registers named
//! command handlers (selected from a statically compiled catalogue) and
//! invokes them, optionally streaming sentinel-delimited data into a running
//! invocation. Log, result, and entity envelopes flow back on stdout;
//! structured error envelopes on stderr.
//!
//! The crate is usable as a library: embedders assemble a
//! [`HandlerCatalogue`] and a [`CaseFactory`], wire a [`Listener`] over
//! their own IO, and run it. The shipped binary does exactly that over the
//! process's stdio with the built-in catalogue.

mod cases;
mod catalogue;
mod dispatch;
mod handler;
mod input;
mod registry;
mod sink;
mod stream;
mod telemetry;

pub use cases::{
    CaseContext, CaseError, CaseFactory, CaseHandle, CaseLifecycleError, PlaceholderCaseFactory,
};
pub use catalogue::HandlerCatalogue;
pub use dispatch::{FatalError, Listener};
pub use handler::{Handler, HandlerArgs, HandlerError, Invocation};
pub use input::LineInput;
pub use registry::{FunctionRegistry, RegisteredHandler, RegistrationKind};
pub use sink::{EnvelopeWriter, ProtocolSink, SinkError};
pub use stream::{DataStream, StreamBridge, StreamError};
pub use telemetry::{TelemetryError, TelemetryHandle, initialise as initialise_telemetry};
