//! Shared line-oriented input source.
//!
//! The dispatch loop and the stream bridge read from the same input. The
//! source is shared behind a mutex; the two never contend in practice because
//! the loop joins the bridge before its next read, but the lock makes the
//! hand-off explicit and keeps the reader `Send` for the bridge thread.

use std::fmt;
use std::io::{self, BufRead};
use std::sync::{Arc, Mutex};

/// Cloneable handle over a line-delimited input source.
#[derive(Clone)]
pub struct LineInput {
    inner: Arc<Mutex<Box<dyn BufRead + Send>>>,
}

impl LineInput {
    /// Wraps a buffered reader as a shared input source.
    #[must_use]
    pub fn new(reader: impl BufRead + Send + 'static) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Box::new(reader))),
        }
    }

    /// Reads one line, stripping the trailing newline (and any carriage
    /// return).
    ///
    /// Returns `Ok(None)` once the input is exhausted.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails or the shared lock was poisoned by
    /// a panicking reader.
    pub fn read_line(&self) -> io::Result<Option<String>> {
        let mut reader = self
            .inner
            .lock()
            .map_err(|_| io::Error::other("input lock poisoned"))?;
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(Some(line))
    }
}

impl fmt::Debug for LineInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineInput").finish_non_exhaustive()
    }
}
