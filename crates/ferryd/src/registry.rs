//! Function registry: command name to registered handler.
//!
//! Handlers are keyed solely by command name. There is no versioning; the
//! most recent registration wins, and entries are never removed except by
//! replacement. The registry is owned exclusively by the dispatch loop and
//! mutated only on its thread, so no locking is needed.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::handler::Handler;

/// A handler stored under a command name.
#[derive(Clone)]
pub struct RegisteredHandler {
    /// Whether the handler consumes a data stream.
    pub accepts_stream: bool,
    /// The invocable body.
    pub handler: Arc<dyn Handler>,
}

impl fmt::Debug for RegisteredHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredHandler")
            .field("accepts_stream", &self.accepts_stream)
            .finish_non_exhaustive()
    }
}

/// Outcome of a registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationKind {
    /// The command name was not registered before.
    Added,
    /// An existing registration was replaced.
    Replaced,
}

impl RegistrationKind {
    /// Verb used in the registration debug log.
    #[must_use]
    pub fn verb(self) -> &'static str {
        match self {
            Self::Added => "Adding new",
            Self::Replaced => "Replacing",
        }
    }
}

/// Mapping from command name to registered handler.
#[derive(Debug, Default)]
pub struct FunctionRegistry {
    handlers: HashMap<String, RegisteredHandler>,
}

impl FunctionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores or replaces the handler under `name`; last write wins.
    pub fn register(&mut self, name: &str, entry: RegisteredHandler) -> RegistrationKind {
        if self.handlers.insert(name.to_owned(), entry).is_some() {
            RegistrationKind::Replaced
        } else {
            RegistrationKind::Added
        }
    }

    /// Looks up the handler registered under `name`.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&RegisteredHandler> {
        self.handlers.get(name)
    }

    /// Whether a handler is registered under `name`.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }
}
