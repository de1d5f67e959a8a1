//! The dispatch loop state machine.
//!
//! One iteration moves through: read a line, decode it, optionally
//! (re)register a handler, optionally ensure a case is open, optionally
//! attach a data stream, invoke the handler, join the stream bridge, emit
//! the result. The sentinel command ends the loop; any open case is released
//! before the final log.
//!
//! Malformed lines are reported and dropped. Every other failure is a
//! [`FatalError`] propagated to [`Listener::run`], which reports it once on
//! both channels and returns the exit status.

use std::io::Write;

use tracing::{debug, warn};

use ferry_protocol::{CommandEnvelope, DATASTREAM_KEY, Severity};

use crate::cases::{CaseContext, CaseFactory};
use crate::catalogue::HandlerCatalogue;
use crate::handler::Invocation;
use crate::input::LineInput;
use crate::registry::FunctionRegistry;
use crate::sink::{EnvelopeWriter, ProtocolSink};
use crate::stream::StreamBridge;

use super::errors::FatalError;

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Outcome of one loop iteration.
enum LoopControl {
    /// Keep reading.
    Continue,
    /// The sentinel command was received.
    Finished,
}

/// The protocol dispatch loop.
pub struct Listener<O, E> {
    input: LineInput,
    sink: EnvelopeWriter<O, E>,
    registry: FunctionRegistry,
    catalogue: HandlerCatalogue,
    cases: CaseContext,
}

impl<O: Write, E: Write> Listener<O, E> {
    /// Creates a listener over the given input, sink, catalogue, and case
    /// factory.
    #[must_use]
    pub fn new(
        input: LineInput,
        sink: EnvelopeWriter<O, E>,
        catalogue: HandlerCatalogue,
        case_factory: Box<dyn CaseFactory>,
    ) -> Self {
        Self {
            input,
            sink,
            registry: FunctionRegistry::new(),
            catalogue,
            cases: CaseContext::new(case_factory),
        }
    }

    /// Runs the loop to completion and returns the process exit status.
    ///
    /// Fatal errors are reported here, once, on both protocol channels.
    pub fn run(&mut self) -> i32 {
        match self.listen() {
            Ok(()) => 0,
            Err(error) => {
                warn!(target: DISPATCH_TARGET, %error, "terminating on fatal error");
                if let Err(report_error) =
                    self.sink.write_error(&error.to_string(), "", error.stack())
                {
                    warn!(
                        target: DISPATCH_TARGET,
                        error = %report_error,
                        "failed to report fatal error"
                    );
                }
                error.exit_status()
            }
        }
    }

    /// Consumes the listener, returning its sink for inspection.
    #[must_use]
    pub fn into_sink(self) -> EnvelopeWriter<O, E> {
        self.sink
    }

    fn listen(&mut self) -> Result<(), FatalError> {
        self.sink.log(Severity::Info, "Starting")?;
        loop {
            match self.iteration()? {
                LoopControl::Continue => {}
                LoopControl::Finished => break,
            }
        }
        self.cases.close(&mut self.sink)?;
        self.sink.log(Severity::Info, "Finished")?;
        Ok(())
    }

    fn iteration(&mut self) -> Result<LoopControl, FatalError> {
        self.sink.log(Severity::Debug, "reader: waiting for input")?;
        let Some(line) = self.input.read_line()? else {
            return Err(FatalError::InputClosed);
        };
        self.sink.log(Severity::Debug, "reader: received input")?;

        let envelope = match CommandEnvelope::parse(&line) {
            Ok(envelope) => envelope,
            Err(error) => {
                debug!(target: DISPATCH_TARGET, %error, "dropping malformed line");
                self.sink
                    .write_error(&format!("Could not parse JSON: {line}"), "", "")?;
                return Ok(LoopControl::Continue);
            }
        };

        if envelope.is_end() {
            return Ok(LoopControl::Finished);
        }

        self.register_if_defined(&envelope)?;

        let Some(registered) = self.registry.lookup(&envelope.cmd) else {
            return Err(FatalError::not_found(&envelope.cmd));
        };
        let registered = registered.clone();

        if let Some(path) = envelope.casepath.as_deref() {
            self.cases.ensure_open(path, &mut self.sink)?;
        }

        let mut args = envelope.args;
        let mut stream = None;
        let mut bridge = None;
        if envelope.isstream {
            if !registered.accepts_stream {
                return Err(FatalError::stream_unsupported(&envelope.cmd));
            }
            // The live stream supersedes any caller-supplied value at the
            // reserved key.
            if let Some(map) = args.as_mut() {
                map.remove(DATASTREAM_KEY);
            }
            let (data_stream, worker) = StreamBridge::start(self.input.clone())?;
            stream = Some(data_stream);
            bridge = Some(worker);
        }

        debug!(
            target: DISPATCH_TARGET,
            cmd = %envelope.cmd,
            streaming = envelope.isstream,
            "invoking handler"
        );
        let outcome = registered.handler.invoke(Invocation {
            args,
            stream,
            sink: &mut self.sink,
        });
        let value = match outcome {
            Ok(value) => value,
            // The bridge thread, if any, dies with the process; joining it
            // here could block forever on an unterminated stream.
            Err(error) => return Err(FatalError::invocation(&envelope.cmd, &error)),
        };

        if let Some(worker) = bridge {
            worker.wait()?;
        }

        self.sink.write_result(value)?;
        Ok(LoopControl::Continue)
    }

    fn register_if_defined(&mut self, envelope: &CommandEnvelope) -> Result<(), FatalError> {
        let Some(key) = envelope.definition() else {
            return Ok(());
        };
        let Some(entry) = self.catalogue.resolve(key) else {
            return Err(FatalError::registration(&envelope.cmd, key));
        };
        let kind = self.registry.register(&envelope.cmd, entry);
        debug!(target: DISPATCH_TARGET, cmd = %envelope.cmd, %key, "handler registered");
        self.sink.log(
            Severity::Debug,
            &format!("{} function for '{}'", kind.verb(), envelope.cmd),
        )?;
        Ok(())
    }
}
