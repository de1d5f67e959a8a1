//! Case lifecycle management.
//!
//! A case is an opaque external resource a command may operate on. At most
//! one is open at a time; the handle is owned by a [`CaseContext`] which the
//! dispatch loop carries explicitly (no process-wide state). Cases are
//! obtained through an injected [`CaseFactory`], keyed by a
//! separator-normalised path so Windows and Unix spellings of the same
//! location compare equal.

use thiserror::Error;
use tracing::debug;

use ferry_protocol::Severity;

use crate::sink::{ProtocolSink, SinkError};

const CASE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::cases");

/// Failure reported by a case factory or handle.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct CaseError {
    message: String,
}

impl CaseError {
    /// Creates a case error with the given description.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors surfaced while driving the case lifecycle.
#[derive(Debug, Error)]
pub enum CaseLifecycleError {
    /// The factory or handle failed.
    #[error(transparent)]
    Case(#[from] CaseError),

    /// A lifecycle transition log could not be emitted.
    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// An open case handle.
pub trait CaseHandle: Send {
    /// Path of the location backing this case.
    fn location_path(&self) -> String;

    /// Releases the case.
    ///
    /// # Errors
    ///
    /// Returns a [`CaseError`] when the underlying resource fails to close.
    fn close(self: Box<Self>) -> Result<(), CaseError>;
}

/// Factory collaborator producing case handles.
pub trait CaseFactory: Send {
    /// Opens the case at `path`.
    ///
    /// # Errors
    ///
    /// Returns a [`CaseError`] when the case cannot be opened.
    fn open(&self, path: &str) -> Result<Box<dyn CaseHandle>, CaseError>;
}

/// Loop-owned context tracking the currently open case.
pub struct CaseContext {
    factory: Box<dyn CaseFactory>,
    current: Option<Box<dyn CaseHandle>>,
}

impl CaseContext {
    /// Creates a context with no case open.
    #[must_use]
    pub fn new(factory: Box<dyn CaseFactory>) -> Self {
        Self {
            factory,
            current: None,
        }
    }

    /// Whether a case is currently open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    /// Ensures the case at `path` is the open one.
    ///
    /// A no-op when the same case (after separator normalisation) is already
    /// open. A different open case is closed first; both transitions are
    /// logged.
    ///
    /// # Errors
    ///
    /// Returns a [`CaseLifecycleError`] when the factory fails or a
    /// transition log cannot be emitted.
    pub fn ensure_open(
        &mut self,
        path: &str,
        sink: &mut dyn ProtocolSink,
    ) -> Result<(), CaseLifecycleError> {
        if let Some(current) = &self.current {
            if normalise_path(&current.location_path()) == normalise_path(path) {
                debug!(target: CASE_TARGET, %path, "case already open");
                return Ok(());
            }
            sink.log(Severity::Info, "Another Case is open")?;
            self.close(sink)?;
        }
        sink.log(Severity::Info, &format!("Opening case: {path}"))?;
        self.current = Some(self.factory.open(path)?);
        Ok(())
    }

    /// Closes the open case, if any.
    ///
    /// # Errors
    ///
    /// Returns a [`CaseLifecycleError`] when the handle fails to close or a
    /// transition log cannot be emitted.
    pub fn close(&mut self, sink: &mut dyn ProtocolSink) -> Result<(), CaseLifecycleError> {
        let Some(case) = self.current.take() else {
            return Ok(());
        };
        sink.log(
            Severity::Info,
            &format!("Closing case: {}", case.location_path()),
        )?;
        case.close()?;
        sink.log(Severity::Debug, "Success: true")?;
        Ok(())
    }
}

/// Normalises path separators so the same location compares equal across
/// platform spellings.
fn normalise_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// Case factory that hands out placeholder handles without touching any
/// external engine.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderCaseFactory;

impl CaseFactory for PlaceholderCaseFactory {
    fn open(&self, path: &str) -> Result<Box<dyn CaseHandle>, CaseError> {
        debug!(target: CASE_TARGET, %path, "placeholder case handle opened");
        Ok(Box::new(PlaceholderCase {
            path: path.to_owned(),
        }))
    }
}

struct PlaceholderCase {
    path: String,
}

impl CaseHandle for PlaceholderCase {
    fn location_path(&self) -> String {
        self.path.clone()
    }

    fn close(self: Box<Self>) -> Result<(), CaseError> {
        Ok(())
    }
}
