//! Sentinel-delimited data streaming.
//!
//! While a stream-enabled invocation runs, a bridge thread takes over the
//! shared input: the first line it reads becomes the end token, every
//! following line is pushed verbatim onto a closable queue until the token
//! repeats. The dispatch loop joins the bridge before emitting the result,
//! so the two readers never overlap on the input.
//!
//! The queue is a single-producer/single-consumer channel. Closing is
//! expressed by dropping the sender; a blocking pop on a closed, drained
//! queue yields `None` instead of blocking forever.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use thiserror::Error;
use tracing::debug;

use crate::input::LineInput;

const STREAM_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::stream");

/// Errors surfaced by the stream bridge.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Input ended before the end token repeated.
    #[error("input closed before the stream end token")]
    InputExhausted,

    /// IO error while reading stream data.
    #[error("IO error while bridging stream data: {0}")]
    Io(#[from] std::io::Error),

    /// The bridge thread panicked.
    #[error("stream bridge thread panicked")]
    BridgePanicked,
}

/// Consumer half of a data stream, handed to the invoked handler.
#[derive(Debug)]
pub struct DataStream {
    receiver: Receiver<String>,
}

impl DataStream {
    /// Pops the next data line, blocking until one arrives.
    ///
    /// Returns `None` once the stream is closed and drained.
    #[must_use]
    pub fn pop(&self) -> Option<String> {
        self.receiver.recv().ok()
    }
}

/// Producer half: a background thread bridging input lines into the queue.
#[derive(Debug)]
pub struct StreamBridge {
    worker: JoinHandle<Result<(), StreamError>>,
}

impl StreamBridge {
    /// Starts a bridge over the shared input.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the bridge thread cannot be spawned.
    pub fn start(input: LineInput) -> Result<(DataStream, Self), StreamError> {
        let (sender, receiver) = mpsc::channel();
        let worker = thread::Builder::new()
            .name("ferry-stream-bridge".into())
            .spawn(move || bridge(&input, &sender))?;
        Ok((DataStream { receiver }, Self { worker }))
    }

    /// Blocks until the bridge has consumed its end token.
    ///
    /// # Errors
    ///
    /// Returns the bridge's own failure, or [`StreamError::BridgePanicked`]
    /// if the thread did not complete normally.
    pub fn wait(self) -> Result<(), StreamError> {
        self.worker
            .join()
            .map_err(|_| StreamError::BridgePanicked)?
    }
}

fn bridge(input: &LineInput, sender: &Sender<String>) -> Result<(), StreamError> {
    let mut end_token: Option<String> = None;
    loop {
        let Some(line) = input.read_line()? else {
            return Err(StreamError::InputExhausted);
        };
        match end_token.as_deref() {
            None => {
                debug!(target: STREAM_TARGET, "stream end token captured");
                end_token = Some(line);
            }
            Some(token) if token == line => {
                debug!(target: STREAM_TARGET, "stream closed");
                // Dropping the sender closes the queue for the consumer.
                return Ok(());
            }
            Some(_) => {
                // The consumer may have stopped popping; input is still
                // drained to the end token so later commands are not
                // misread as stream data.
                drop(sender.send(line));
            }
        }
    }
}
