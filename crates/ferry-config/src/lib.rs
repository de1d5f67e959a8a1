//! Runtime configuration for the ferry daemon.
//!
//! Settings are layered command line over environment over built-in
//! defaults. The surface is deliberately small: the protocol log threshold
//! and the operator telemetry filter and format. Everything else about the
//! daemon's behaviour is driven by the protocol itself.

mod defaults;
mod logging;

use clap::Parser;
use ferry_protocol::Severity;
use thiserror::Error;

pub use defaults::{
    DEFAULT_LOG_FILTER, default_log_filter, default_log_format, default_severity_threshold,
};
pub use logging::{LogFormat, LogFormatParseError};

/// Resolved daemon configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "ferryd", about = "stdio command dispatch daemon", version)]
pub struct Config {
    /// Telemetry filter expression (tracing `EnvFilter` syntax).
    #[arg(long, env = "FERRYD_LOG_FILTER", default_value = DEFAULT_LOG_FILTER)]
    log_filter: String,

    /// Telemetry output format.
    #[arg(long, env = "FERRYD_LOG_FORMAT", default_value_t)]
    log_format: LogFormat,

    /// Minimum severity emitted as protocol log envelopes.
    #[arg(long, env = "FERRYD_SEVERITY", default_value_t = defaults::default_severity_threshold())]
    severity_threshold: Severity,
}

/// Errors surfaced while resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Command line or environment values failed to parse.
    #[error("invalid configuration: {source}")]
    Invalid {
        /// Underlying parser error.
        #[source]
        source: clap::Error,
    },
}

impl Config {
    /// Loads configuration from the process arguments and environment.
    ///
    /// Exits the process with clap's standard diagnostics on `--help`,
    /// `--version`, or invalid input.
    #[must_use]
    pub fn load() -> Self {
        Self::parse()
    }

    /// Non-exiting variant of [`Config::load`] for embedding and tests.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the supplied values fail to
    /// parse.
    pub fn try_load_from<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::try_parse_from(args).map_err(|source| ConfigError::Invalid { source })
    }

    /// Telemetry filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Telemetry output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Minimum severity emitted as protocol log envelopes.
    #[must_use]
    pub fn severity_threshold(&self) -> Severity {
        self.severity_threshold
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: defaults::default_log_filter().to_owned(),
            log_format: defaults::default_log_format(),
            severity_threshold: defaults::default_severity_threshold(),
        }
    }
}
