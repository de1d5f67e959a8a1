//! Command dispatch for the stdio protocol.
//!
//! The dispatcher reads one command envelope per input line, routes it
//! through registration, case selection, and stream attachment, invokes the
//! registered handler, and emits the result. See [`Listener`] for the loop
//! itself and [`FatalError`] for the failure taxonomy.

mod errors;
mod listener;

pub use errors::FatalError;
pub use listener::Listener;
