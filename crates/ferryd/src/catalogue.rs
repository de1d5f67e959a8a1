//! The statically compiled handler catalogue.
//!
//! The protocol's `def` field selects an entry from this table rather than
//! carrying executable source: the peer chooses behaviour by name, the host
//! decides what behaviour exists. An unknown key is a fatal registration
//! error in the dispatch loop.
//!
//! The built-in entries cover the common controller interactions (argument
//! echo and joining, entity emission, stream logging and collection); hosts
//! embedding `ferryd` as a library assemble their own catalogue.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::handler::{Handler, HandlerError, Invocation};
use crate::registry::RegisteredHandler;

/// Named table of available handler implementations.
#[derive(Default)]
pub struct HandlerCatalogue {
    entries: HashMap<String, RegisteredHandler>,
}

impl HandlerCatalogue {
    /// Creates an empty catalogue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry under `key` with the given stream capability.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        accepts_stream: bool,
        handler: impl Handler + 'static,
    ) {
        self.entries.insert(
            key.into(),
            RegisteredHandler {
                accepts_stream,
                handler: Arc::new(handler),
            },
        );
    }

    /// Resolves a selection key to a registrable handler.
    #[must_use]
    pub fn resolve(&self, key: &str) -> Option<RegisteredHandler> {
        self.entries.get(key).cloned()
    }

    /// Whether the catalogue contains `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Catalogue with the built-in handlers.
    #[must_use]
    pub fn builtin() -> Self {
        let mut catalogue = Self::new();
        catalogue.insert("echo", false, echo);
        catalogue.insert("concat", false, concat);
        catalogue.insert("emit_entity", false, emit_entity);
        catalogue.insert("log_stream", true, log_stream);
        catalogue.insert("collect_stream", true, collect_stream);
        catalogue
    }
}

impl fmt::Debug for HandlerCatalogue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        keys.sort_unstable();
        f.debug_struct("HandlerCatalogue")
            .field("keys", &keys)
            .finish()
    }
}

/// Returns the supplied arguments unchanged, or null without arguments.
fn echo(invocation: Invocation<'_>) -> Result<Value, HandlerError> {
    Ok(invocation
        .args
        .map_or(Value::Null, Value::Object))
}

/// Joins the string renderings of all argument values with single spaces,
/// in key order.
fn concat(invocation: Invocation<'_>) -> Result<Value, HandlerError> {
    let joined = invocation
        .args
        .unwrap_or_default()
        .values()
        .map(render)
        .collect::<Vec<_>>()
        .join(" ");
    Ok(Value::String(joined))
}

/// Emits the supplied arguments as an entity envelope and returns null.
fn emit_entity(invocation: Invocation<'_>) -> Result<Value, HandlerError> {
    let properties = invocation.args.unwrap_or_default();
    invocation
        .sink
        .write_entity(properties)
        .map_err(|error| HandlerError::new(format!("entity emission failed: {error}")))?;
    Ok(Value::Null)
}

/// Logs each streamed line as `Received: <line>` at info severity.
///
/// Tolerates a missing stream (non-stream invocation) by returning null
/// immediately.
fn log_stream(invocation: Invocation<'_>) -> Result<Value, HandlerError> {
    let Some(stream) = invocation.stream else {
        return Ok(Value::Null);
    };
    let sink = invocation.sink;
    while let Some(line) = stream.pop() {
        sink.log(ferry_protocol::Severity::Info, &format!("Received: {line}"))
            .map_err(|error| HandlerError::new(format!("log emission failed: {error}")))?;
    }
    Ok(Value::Null)
}

/// Drains the stream and returns the lines as a JSON array, in order.
fn collect_stream(invocation: Invocation<'_>) -> Result<Value, HandlerError> {
    let Some(stream) = invocation.stream else {
        return Ok(Value::Array(Vec::new()));
    };
    let mut lines = Vec::new();
    while let Some(line) = stream.pop() {
        lines.push(Value::String(line));
    }
    Ok(Value::Array(lines))
}

fn render(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
